use super::identity::make_id;
use super::{normalize, rank_descending, top_with_ties, Histogram, Result, StatsError};
use crate::corpus::Instrument;

pub const PITCH_BINS: usize = 128;
pub const PITCH_CLASS_BINS: usize = 12;

/// Histogram bin `b` holds pitch `b + PITCH_BIN_OFFSET`. Pitch 0 wraps to the
/// last bin, so every u8 pitch in 0..=127 has a bin.
pub const PITCH_BIN_OFFSET: i32 = 1;

/// Share of all notes that [`number_of_common_pitches`] may spend.
pub const COMMON_PITCH_FRACTION: f64 = 0.1;

fn pitch_bin(pitch: u8) -> usize {
    (pitch as i32 - PITCH_BIN_OFFSET).rem_euclid(PITCH_BINS as i32) as usize
}

fn pitch_class_bin(pitch: u8) -> usize {
    (pitch as i32 - PITCH_BIN_OFFSET).rem_euclid(PITCH_CLASS_BINS as i32) as usize
}

/// Undo the bin offset. Bin 127 reports as 128.
fn bin_value(bin: usize) -> u8 {
    (bin as i32 + PITCH_BIN_OFFSET) as u8
}

fn hist_by(inst: &Instrument, bins: usize, bin_of: fn(u8) -> usize, normalized: bool) -> Result<Histogram> {
    let mut hist = vec![0.0; bins];
    for note in &inst.notes {
        hist[bin_of(note.pitch)] += 1.0;
    }
    if normalized && !normalize(&mut hist) {
        return Err(StatsError::EmptyInstrument(make_id(inst)));
    }
    Ok(hist)
}

/// 128-bin note-on count per pitch.
pub fn pitch_histogram(inst: &Instrument, normalized: bool) -> Result<Histogram> {
    hist_by(inst, PITCH_BINS, pitch_bin, normalized)
}

/// 12-bin note-on count per pitch class.
pub fn pitch_class_histogram(inst: &Instrument, normalized: bool) -> Result<Histogram> {
    hist_by(inst, PITCH_CLASS_BINS, pitch_class_bin, normalized)
}

/// The `top_n` most frequent pitches, plus any pitch tied with the last of them.
pub fn most_common_pitch(inst: &Instrument, top_n: usize) -> Result<Vec<u8>> {
    let hist = pitch_histogram(inst, true)?;
    Ok(top_with_ties(&hist, top_n)?.into_iter().map(bin_value).collect())
}

/// Pitch-class counterpart of [`most_common_pitch`]; classes are reported 1..=12.
pub fn most_common_pitch_class(inst: &Instrument, top_n: usize) -> Result<Vec<u8>> {
    let hist = pitch_class_histogram(inst, true)?;
    Ok(top_with_ties(&hist, top_n)?.into_iter().map(bin_value).collect())
}

/// Most frequent pitches whose counts fit into 10% of all notes.
///
/// Only played pitches are returned: with 20 equally frequent pitches the
/// budget ends at exactly 0, and counting unplayed bins would return all 128.
pub fn number_of_common_pitches(inst: &Instrument) -> Result<Vec<u8>> {
    common_pitches_with_fraction(inst, COMMON_PITCH_FRACTION)
}

/// Walk pitches from most to least frequent, spending a budget of
/// `fraction * total` notes.
///
/// A pitch is taken while its count fits the remaining budget, and its count
/// is deducted. The first pitch is always taken. The walk stops at the first
/// pitch that doesn't fit, unless its count equals the previously taken count,
/// in which case it is taken without touching the budget. Pitches that were
/// never played are not candidates.
pub fn common_pitches_with_fraction(inst: &Instrument, fraction: f64) -> Result<Vec<u8>> {
    let hist = pitch_histogram(inst, false)?;
    let total: f64 = hist.iter().sum();
    if total <= 0.0 {
        return Err(StatsError::EmptyInstrument(make_id(inst)));
    }

    let mut budget = total * fraction;
    let mut prev = -1.0;
    let mut common = Vec::new();
    for (i, bin) in rank_descending(&hist).into_iter().enumerate() {
        let count = hist[bin];
        if count == 0.0 {
            break;
        }
        if count <= budget || i == 0 {
            common.push(bin_value(bin));
            prev = count;
            budget -= count;
        } else if count == prev {
            common.push(bin_value(bin));
        } else {
            break;
        }
    }
    Ok(common)
}

fn nonzero(hist: &[f64]) -> usize {
    hist.iter().filter(|&&v| v != 0.0).count()
}

/// Number of distinct pitches played.
pub fn pitch_variety(inst: &Instrument) -> Result<usize> {
    Ok(nonzero(&pitch_histogram(inst, true)?))
}

/// Number of distinct pitch classes played.
pub fn pitch_class_variety(inst: &Instrument) -> Result<usize> {
    Ok(nonzero(&pitch_class_histogram(inst, true)?))
}

/// Span in semitones between the lowest and highest occupied bins.
pub fn pitch_range(inst: &Instrument) -> Result<u8> {
    let hist = pitch_histogram(inst, true)?;
    let lowest = hist.iter().position(|&v| v > 0.0);
    let highest = hist.iter().rposition(|&v| v > 0.0);
    match (lowest, highest) {
        (Some(lo), Some(hi)) => Ok((hi - lo) as u8),
        _ => Err(StatsError::EmptyInstrument(make_id(inst))),
    }
}

/// The two strongest bins of a histogram; needs at least two occupied bins.
fn strongest_two(inst: &Instrument, hist: &[f64]) -> Result<(usize, usize)> {
    let order = rank_descending(hist);
    if nonzero(hist) < 2 {
        return Err(StatsError::EmptyInstrument(make_id(inst)));
    }
    Ok((order[0], order[1]))
}

/// Count of the second most common pitch over the count of the most common.
pub fn relative_strength_of_top_pitches(inst: &Instrument) -> Result<f64> {
    let hist = pitch_histogram(inst, false)?;
    let (first, second) = strongest_two(inst, &hist)?;
    Ok(hist[second] / hist[first])
}

pub fn relative_strength_of_top_pitch_classes(inst: &Instrument) -> Result<f64> {
    let hist = pitch_class_histogram(inst, false)?;
    let (first, second) = strongest_two(inst, &hist)?;
    Ok(hist[second] / hist[first])
}

/// Semitones between the two most common pitches.
pub fn interval_between_strongest_pitches(inst: &Instrument) -> Result<u8> {
    let hist = pitch_histogram(inst, false)?;
    let (first, second) = strongest_two(inst, &hist)?;
    Ok(first.abs_diff(second) as u8)
}

pub fn interval_between_strongest_pitch_classes(inst: &Instrument) -> Result<u8> {
    let hist = pitch_class_histogram(inst, false)?;
    let (first, second) = strongest_two(inst, &hist)?;
    Ok(first.abs_diff(second) as u8)
}
