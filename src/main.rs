use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notestats::analyzer::report::{FeatureReport, InstrumentReport};
use notestats::config::AppConfig;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notestats", version, about = "Symbolic music feature extractor")]
struct Cli {
    /// Config file (defaults to the XDG config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute features for corpus files and write them as JSON
    Analyze {
        /// Corpus files or directories to walk
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Number of parallel workers (0 = auto-detect from config)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print a per-instrument summary table for one corpus file
    Show {
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Analyze { paths, jobs, output, pretty } => {
            let files = notestats::analyzer::find_corpus_files(&paths);
            if files.is_empty() {
                anyhow::bail!("No corpus files found under the given paths.");
            }

            let workers = if jobs > 0 { jobs } else { config.resolve_workers() };
            let batch = notestats::analyzer::analyze_files(&files, &config.stats, workers, true)
                .context("Analysis failed")?;

            let json = if pretty {
                serde_json::to_string_pretty(&batch.reports)
            } else {
                serde_json::to_string(&batch.reports)
            }
            .context("Failed to serialize reports")?;

            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    writeln!(stdout, "{json}").context("Failed to write to stdout")?;
                }
            }

            eprintln!(
                "Analysis complete: {} analyzed, {} failed",
                batch.reports.len(),
                batch.failed.len()
            );
            for (path, err) in &batch.failed {
                eprintln!("  {}: {}", path.display(), err);
            }
        }

        Commands::Show { file } => {
            config.stats.validate().context("Invalid stats config")?;
            let report = notestats::analyzer::analyze_file(&file, &config.stats)
                .with_context(|| format!("Failed to analyze {}", file.display()))?;
            print_report(&report);
        }
    }

    Ok(())
}

/// Print a piece summary followed by one row per instrument.
fn print_report(report: &FeatureReport) {
    println!(
        "{} instruments, {} notes, prevalence std {:.3}, total density {:.1}",
        report.instrument_count,
        report.note_count,
        report.note_prevalence_std,
        report.note_density.get("total").copied().unwrap_or(0.0),
    );
    println!();
    println!(
        "{:<32} {:>5} {:>5} {:>4} {:>4} {:>8} {:>5} {:>5} {:>5} {:>7} {:>6}",
        "Instrument", "Notes", "Prev", "Rng", "Var", "Top", "AvgI", "Down", "Up", "Density", "DurMu"
    );
    println!("{}", "-".repeat(100));

    for inst in &report.instruments {
        print_instrument_row(report, inst);
    }

    println!();
    println!("Prev=note prevalence  Rng=pitch range  Var=pitch variety  Top=most common pitch");
    println!("AvgI=mean melodic interval  Down/Up=melodic direction  DurMu=mean note duration (s)");
}

fn print_instrument_row(report: &FeatureReport, inst: &InstrumentReport) {
    let id: String = if inst.id.chars().count() > 32 {
        format!("{}...", inst.id.chars().take(29).collect::<String>())
    } else {
        inst.id.clone()
    };
    let prevalence = report.note_prevalence.get(&inst.id).copied().unwrap_or(0.0);
    let dash = || "-".to_string();

    let (range, variety, top) = match &inst.pitch {
        Some(p) => (
            p.pitch_range.to_string(),
            p.pitch_variety.to_string(),
            p.most_common_pitch
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
        ),
        None => (dash(), dash(), dash()),
    };
    let (avg, down, up) = match &inst.melody {
        Some(m) => (
            format!("{:.2}", m.average_interval),
            format!("{:.2}", m.direction_down),
            format!("{:.2}", m.direction_up),
        ),
        None => (dash(), dash(), dash()),
    };
    let density = inst.note_density.map(|d| format!("{:.1}", d)).unwrap_or_else(dash);
    let duration = report
        .note_durations
        .as_ref()
        .and_then(|d| d.get(&inst.id))
        .map(|d| format!("{:.2}", d.mean))
        .unwrap_or_else(dash);

    println!(
        "{:<32} {:>5} {:>5.2} {:>4} {:>4} {:>8} {:>5} {:>5} {:>5} {:>7} {:>6}",
        id, inst.note_count, prevalence, range, variety, top, avg, down, up, density, duration,
    );
}
