use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::corpus::roll::DEFAULT_FS;
use crate::stats::melody::{IntervalOptions, IntervalOverflow, DEFAULT_MAX_GAP_SECS};
use crate::stats::pitch::{COMMON_PITCH_FRACTION, PITCH_BINS};
use crate::stats::{DuplicatePolicy, StatsError};

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Number of parallel workers. 0 = auto-detect (cores / 2, min 1).
    pub workers: usize,
    /// Feature computation settings.
    pub stats: StatsConfig,
}

/// Knobs of the feature computations.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// Piano-roll frames per second for the rhythm features.
    pub roll_fs: f64,
    /// Silence (seconds) beyond which consecutive notes are not a melodic step.
    pub max_gap_secs: f64,
    /// Budget share for the common-pitches walk.
    pub common_pitch_fraction: f64,
    /// How many most-common pitches to report (ties extend the list).
    pub top_n: usize,
    pub interval_overflow: IntervalOverflow,
    /// What to do when two instruments share program and name.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            roll_fs: DEFAULT_FS,
            max_gap_secs: DEFAULT_MAX_GAP_SECS,
            common_pitch_fraction: COMMON_PITCH_FRACTION,
            top_n: 1,
            interval_overflow: IntervalOverflow::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl StatsConfig {
    /// Reject settings no feature can be computed with.
    pub fn validate(&self) -> Result<(), StatsError> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(StatsError::InvalidArgument(format!("{name} must be a positive number, got {v}")))
            }
        };
        positive("roll_fs", self.roll_fs)?;
        positive("max_gap_secs", self.max_gap_secs)?;
        if !(1..=PITCH_BINS).contains(&self.top_n) {
            return Err(StatsError::InvalidArgument(format!(
                "top_n must be in 1..={PITCH_BINS}, got {}",
                self.top_n
            )));
        }
        let fraction = self.common_pitch_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(StatsError::InvalidArgument(format!(
                "common_pitch_fraction must be in (0, 1], got {fraction}"
            )));
        }
        Ok(())
    }

    pub fn interval_options(&self) -> IntervalOptions {
        IntervalOptions {
            max_gap_secs: self.max_gap_secs,
            overflow: self.interval_overflow,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/notestats/config.toml`.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    /// Logs a warning if the file can't be read or parsed.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Resolve worker count: 0 → auto-detect (cores / 2, min 1).
    pub fn resolve_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2);
            (cores / 2).max(1)
        }
    }

    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
