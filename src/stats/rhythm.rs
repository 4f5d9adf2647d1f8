use super::identity::make_id;
use super::{mean_std, DuplicatePolicy, Result, StatsError};
use crate::corpus::roll::PianoRoll;
use crate::corpus::{Corpus, Instrument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the corpus-wide entry in [`note_density_per_second`].
pub const TOTAL_KEY: &str = "total";

/// Population mean and standard deviation of note durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub mean: f64,
    pub std: f64,
}

/// Active cells per frame, times 100.
fn density(cells: u64, frames: usize) -> Option<f64> {
    if frames == 0 {
        return None;
    }
    Some(cells as f64 / frames as f64 * 100.0)
}

/// Note activity per unit time: sounding (pitch, frame) cells over frame count, times 100.
/// Drum instruments are rendered like any other.
pub fn instrument_note_density_per_second(inst: &Instrument, fs: f64) -> Result<f64> {
    let roll = PianoRoll::render(inst, fs);
    density(roll.active_cells(), roll.frames())
        .ok_or_else(|| StatsError::EmptyInstrument(make_id(inst)))
}

/// Per-instrument density plus a [`TOTAL_KEY`] entry over all instruments stacked.
///
/// Each instrument is measured against its own length; the total is measured
/// against the length of the whole piece. An instrument too short to fill a
/// single frame reports 0.0.
pub fn note_density_per_second(
    corpus: &Corpus,
    fs: f64,
    policy: DuplicatePolicy,
) -> Result<BTreeMap<String, f64>> {
    let frames = PianoRoll::corpus_frames(corpus, fs);
    let cells = corpus
        .instruments
        .iter()
        .map(|inst| PianoRoll::render_with_frames(inst, fs, frames).active_cells())
        .sum();
    let total = density(cells, frames).ok_or(StatsError::EmptyCorpus)?;

    let mut densities = BTreeMap::new();
    for inst in &corpus.instruments {
        let roll = PianoRoll::render(inst, fs);
        let value = density(roll.active_cells(), roll.frames()).unwrap_or(0.0);
        let id = make_id(inst);
        match policy {
            DuplicatePolicy::Overwrite => {
                densities.insert(id, value);
            }
            DuplicatePolicy::Aggregate => {
                *densities.entry(id).or_insert(0.0) += value;
            }
        }
    }
    densities.insert(TOTAL_KEY.to_string(), total);
    Ok(densities)
}

/// Mean and standard deviation of `end - start` per instrument.
///
/// Fails as a whole if any instrument has no notes.
pub fn note_duration_mean_and_std(
    corpus: &Corpus,
    policy: DuplicatePolicy,
) -> Result<BTreeMap<String, DurationStats>> {
    let mut durations: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for inst in &corpus.instruments {
        if inst.notes.is_empty() {
            return Err(StatsError::EmptyInstrument(make_id(inst)));
        }
        let values = inst.notes.iter().map(|n| n.duration());
        let id = make_id(inst);
        match policy {
            DuplicatePolicy::Overwrite => {
                durations.insert(id, values.collect());
            }
            DuplicatePolicy::Aggregate => {
                durations.entry(id).or_default().extend(values);
            }
        }
    }

    Ok(durations
        .into_iter()
        .map(|(id, values)| {
            let (mean, std) = mean_std(&values);
            (id, DurationStats { mean, std })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::roll::DEFAULT_FS;
    use crate::corpus::Note;

    #[test]
    fn test_single_sustained_note() {
        // one pitch sounding for the whole instrument: 1 cell per frame
        let inst = Instrument::new(0, "Organ", false, vec![Note::new(48, 0.0, 2.0)]);
        let d = instrument_note_density_per_second(&inst, DEFAULT_FS).unwrap();
        assert!((d - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_chord_density_counts_every_pitch() {
        let inst = Instrument::new(
            0,
            "Piano",
            false,
            vec![Note::new(60, 0.0, 1.0), Note::new(64, 0.0, 1.0), Note::new(67, 0.0, 0.5)],
        );
        // (100 + 100 + 50) cells over 100 frames
        let d = instrument_note_density_per_second(&inst, DEFAULT_FS).unwrap();
        assert!((d - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_drums_are_rendered() {
        let kit = Instrument::new(0, "Kit", true, vec![Note::new(36, 0.0, 0.5), Note::new(38, 0.5, 1.0)]);
        let d = instrument_note_density_per_second(&kit, DEFAULT_FS).unwrap();
        assert!((d - 100.0).abs() < 1e-9);
        assert!(kit.is_drum);
    }

    #[test]
    fn test_empty_instrument_density() {
        let inst = Instrument::new(5, "", false, vec![]);
        assert_eq!(
            instrument_note_density_per_second(&inst, DEFAULT_FS),
            Err(StatsError::EmptyInstrument("program_5_name_unknown".to_string()))
        );
    }

    #[test]
    fn test_corpus_density_with_total() {
        let corpus = Corpus::new(vec![
            Instrument::new(0, "Piano", false, vec![Note::new(60, 0.0, 1.0)]),
            Instrument::new(33, "Bass", false, vec![Note::new(36, 0.0, 2.0), Note::new(40, 0.0, 2.0)]),
            Instrument::new(1, "Silent", false, vec![]),
        ]);
        let d = note_density_per_second(&corpus, DEFAULT_FS, DuplicatePolicy::Overwrite).unwrap();
        assert_eq!(d.len(), 4);
        assert!((d["program_0_name_Piano"] - 100.0).abs() < 1e-9);
        assert!((d["program_33_name_Bass"] - 200.0).abs() < 1e-9);
        assert_eq!(d["program_1_name_Silent"], 0.0);
        // 100 + 400 cells over 200 frames
        assert!((d[TOTAL_KEY] - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_counts_duplicate_pitches_across_instruments() {
        let corpus = Corpus::new(vec![
            Instrument::new(0, "A", false, vec![Note::new(60, 0.0, 1.0)]),
            Instrument::new(0, "B", false, vec![Note::new(60, 0.0, 1.0)]),
        ]);
        let d = note_density_per_second(&corpus, DEFAULT_FS, DuplicatePolicy::Overwrite).unwrap();
        assert!((d[TOTAL_KEY] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_density_duplicate_policy() {
        let corpus = Corpus::new(vec![
            Instrument::new(0, "", false, vec![Note::new(60, 0.0, 1.0)]),
            Instrument::new(0, "", false, vec![Note::new(60, 0.0, 1.0), Note::new(62, 0.0, 1.0)]),
        ]);
        let over = note_density_per_second(&corpus, DEFAULT_FS, DuplicatePolicy::Overwrite).unwrap();
        assert!((over["program_0_name_unknown"] - 200.0).abs() < 1e-9);
        let agg = note_density_per_second(&corpus, DEFAULT_FS, DuplicatePolicy::Aggregate).unwrap();
        assert!((agg["program_0_name_unknown"] - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_density_of_very_long_piece() {
        // 1e11 frames: the roll must never be allocated densely
        let corpus = Corpus::new(vec![
            Instrument::new(0, "Drone", false, vec![Note::new(60, 0.0, 1e9)]),
            Instrument::new(1, "Blip", false, vec![Note::new(72, 0.0, 1.0)]),
        ]);
        let d = note_density_per_second(&corpus, DEFAULT_FS, DuplicatePolicy::Overwrite).unwrap();
        assert!((d["program_0_name_Drone"] - 100.0).abs() < 1e-9);
        assert!((d["program_1_name_Blip"] - 100.0).abs() < 1e-9);
        assert!((d[TOTAL_KEY] - (1e11 + 100.0) / 1e11 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_silent_notes_add_no_density() {
        let mut ghost = Note::new(64, 0.0, 1.0);
        ghost.velocity = 0;
        let inst = Instrument::new(0, "", false, vec![Note::new(60, 0.0, 1.0), ghost]);
        let d = instrument_note_density_per_second(&inst, DEFAULT_FS).unwrap();
        assert!((d - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_corpus_density() {
        let corpus = Corpus::new(vec![Instrument::new(0, "", false, vec![])]);
        assert_eq!(
            note_density_per_second(&corpus, DEFAULT_FS, DuplicatePolicy::Overwrite),
            Err(StatsError::EmptyCorpus)
        );
    }

    #[test]
    fn test_duration_mean_std() {
        let corpus = Corpus::new(vec![Instrument::new(
            0,
            "Piano",
            false,
            vec![Note::new(60, 0.0, 1.0), Note::new(62, 1.0, 3.0), Note::new(64, 3.0, 6.0)],
        )]);
        let stats = note_duration_mean_and_std(&corpus, DuplicatePolicy::Overwrite).unwrap();
        let s = stats["program_0_name_Piano"];
        assert!((s.mean - 2.0).abs() < 1e-12);
        assert!((s.std - 0.816496580927726).abs() < 1e-9);
    }

    #[test]
    fn test_duration_keeps_negative_values() {
        let corpus = Corpus::new(vec![Instrument::new(0, "", false, vec![Note::new(60, 2.0, 1.0)])]);
        let stats = note_duration_mean_and_std(&corpus, DuplicatePolicy::Overwrite).unwrap();
        assert_eq!(stats["program_0_name_unknown"], DurationStats { mean: -1.0, std: 0.0 });
    }

    #[test]
    fn test_duration_empty_instrument_fails() {
        let corpus = Corpus::new(vec![
            Instrument::new(0, "Piano", false, vec![Note::new(60, 0.0, 1.0)]),
            Instrument::new(9, "", false, vec![]),
        ]);
        assert_eq!(
            note_duration_mean_and_std(&corpus, DuplicatePolicy::Overwrite),
            Err(StatsError::EmptyInstrument("program_9_name_unknown".to_string()))
        );
    }

    #[test]
    fn test_duration_aggregate_pools() {
        let corpus = Corpus::new(vec![
            Instrument::new(0, "", false, vec![Note::new(60, 0.0, 1.0)]),
            Instrument::new(0, "", false, vec![Note::new(60, 0.0, 3.0)]),
        ]);
        let over = note_duration_mean_and_std(&corpus, DuplicatePolicy::Overwrite).unwrap();
        assert_eq!(over["program_0_name_unknown"].mean, 3.0);
        let agg = note_duration_mean_and_std(&corpus, DuplicatePolicy::Aggregate).unwrap();
        assert_eq!(agg["program_0_name_unknown"], DurationStats { mean: 2.0, std: 1.0 });
    }
}
