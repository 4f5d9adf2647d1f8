pub mod report;

use crate::config::StatsConfig;
use crate::corpus::load::{self, CORPUS_EXTENSIONS};
use indicatif::{ProgressBar, ProgressStyle};
use report::FeatureReport;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Load error: {0}")]
    Load(#[from] load::LoadError),
    #[error("Feature error: {0}")]
    Stats(#[from] crate::stats::StatsError),
    #[error("Thread pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub struct BatchResult {
    pub reports: Vec<FeatureReport>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Collect corpus files under the given paths. Plain files are taken as-is;
/// directories are walked for supported extensions. Sorted for stable output.
pub fn find_corpus_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let ext = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            if CORPUS_EXTENSIONS.contains(&ext.as_str()) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files
}

/// Load one corpus file and compute its full report.
pub fn analyze_file(path: &Path, cfg: &StatsConfig) -> Result<FeatureReport, AnalyzeError> {
    log::debug!(
        "Analyzing: {}",
        path.file_name().and_then(|f| f.to_str()).unwrap_or("?")
    );
    let corpus = load::load_corpus(path)?;
    let report = FeatureReport::compute(&corpus, cfg)?;
    Ok(report.with_source(path.display().to_string()))
}

/// Analyze files in parallel, one rayon task per file.
///
/// A file that fails to load or analyze is logged and recorded in
/// `failed`; it never aborts the batch. Reports keep input order.
/// An invalid `cfg` fails before any file is read.
pub fn analyze_files(
    files: &[PathBuf],
    cfg: &StatsConfig,
    jobs: usize,
    show_progress: bool,
) -> Result<BatchResult, AnalyzeError> {
    cfg.validate()?;

    if files.is_empty() {
        log::info!("No corpus files to analyze");
        return Ok(BatchResult {
            reports: Vec::new(),
            failed: Vec::new(),
        });
    }

    log::info!("Analyzing {} files with {} workers", files.len(), jobs);

    let pb = if show_progress {
        ProgressBar::new(files.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let results: Vec<_> = pool.install(|| {
        use rayon::prelude::*;
        files
            .par_iter()
            .map(|path| {
                let result = analyze_file(path, cfg);
                pb.inc(1);
                (path, result)
            })
            .collect()
    });

    let mut reports = Vec::new();
    let mut failed = Vec::new();
    for (path, result) in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                log::warn!("Analysis failed for {}: {}", path.display(), e);
                failed.push((path.clone(), e.to_string()));
            }
        }
    }

    pb.finish_with_message(format!("Done: {} analyzed, {} failed", reports.len(), failed.len()));

    Ok(BatchResult { reports, failed })
}
