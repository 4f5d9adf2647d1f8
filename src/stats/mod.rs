pub mod identity;
pub mod instrumentation;
pub mod melody;
pub mod pitch;
pub mod rhythm;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Corpus has no notes")]
    EmptyCorpus,
    #[error("Instrument {0} has no usable notes")]
    EmptyInstrument(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// Fixed-length counts (or fractions) indexed by a semantic axis.
pub type Histogram = Vec<f64>;

/// What to do when two instruments map to the same identity key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later instrument replaces the earlier entry.
    #[default]
    Overwrite,
    /// Entries are combined (fractions and densities summed, durations pooled).
    Aggregate,
}

/// Divide every bin by the histogram total. Returns false (and leaves the
/// histogram untouched) when the total is zero.
pub(crate) fn normalize(hist: &mut [f64]) -> bool {
    let total: f64 = hist.iter().sum();
    if total <= 0.0 {
        return false;
    }
    for bin in hist.iter_mut() {
        *bin /= total;
    }
    true
}

/// Population mean and standard deviation. Callers guarantee `values` is non-empty.
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

/// Bin indices ordered by descending value; equal values keep ascending index order.
pub(crate) fn rank_descending(hist: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..hist.len()).collect();
    order.sort_by(|&a, &b| {
        hist[b]
            .partial_cmp(&hist[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// The `top_n` highest bins, extended with every further bin whose value
/// equals the `top_n`-th value. Zero bins take part in the tie like any other.
pub(crate) fn top_with_ties(hist: &[f64], top_n: usize) -> Result<Vec<usize>> {
    if top_n == 0 || top_n > hist.len() {
        return Err(StatsError::InvalidArgument(format!(
            "top_n must be in 1..={}, got {top_n}",
            hist.len()
        )));
    }
    let order = rank_descending(hist);
    let boundary = hist[order[top_n - 1]];
    let mut top: Vec<usize> = order[..top_n].to_vec();
    top.extend(order[top_n..].iter().copied().filter(|&idx| hist[idx] == boundary));
    Ok(top)
}
