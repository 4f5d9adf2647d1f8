use crate::config::StatsConfig;
use crate::corpus::{Corpus, Instrument, InstrumentFilter};
use crate::stats::identity::make_id;
use crate::stats::melody::{self, IntervalKind, IntervalOptions};
use crate::stats::rhythm::{self, DurationStats};
use crate::stats::{instrumentation, pitch, Histogram, StatsError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Every feature of one piece, ready for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub instrument_count: usize,
    pub note_count: usize,
    pub note_prevalence: BTreeMap<String, f64>,
    pub note_prevalence_std: f64,
    pub pitched_note_prevalence: BTreeMap<String, f64>,
    pub drum_note_prevalence: BTreeMap<String, f64>,
    pub note_density: BTreeMap<String, f64>,
    /// Absent when some instrument has no notes.
    pub note_durations: Option<BTreeMap<String, DurationStats>>,
    pub instruments: Vec<InstrumentReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstrumentReport {
    pub id: String,
    pub program: u8,
    pub name: String,
    pub is_drum: bool,
    pub note_count: usize,
    pub pitch: Option<PitchFeatures>,
    pub melody: Option<MelodyFeatures>,
    pub note_density: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PitchFeatures {
    pub histogram: Histogram,
    pub pitch_class_histogram: Histogram,
    pub most_common_pitch: Vec<u8>,
    pub most_common_pitch_class: Vec<u8>,
    pub common_pitches: Vec<u8>,
    pub pitch_variety: usize,
    pub pitch_class_variety: usize,
    pub pitch_range: u8,
    pub relative_strength_of_top_pitches: Option<f64>,
    pub relative_strength_of_top_pitch_classes: Option<f64>,
    pub interval_between_strongest_pitches: Option<u8>,
    pub interval_between_strongest_pitch_classes: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MelodyFeatures {
    pub interval_histogram: Histogram,
    pub average_interval: f64,
    pub most_common_interval: Vec<i32>,
    pub interval_fractions: BTreeMap<&'static str, f64>,
    pub direction_down: f64,
    pub direction_up: f64,
}

/// Turn "not enough notes" into `None`; every other failure still propagates.
fn optional<T>(result: Result<T, StatsError>) -> Result<Option<T>, StatsError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(StatsError::EmptyInstrument(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

impl FeatureReport {
    pub fn compute(corpus: &Corpus, cfg: &StatsConfig) -> Result<Self, StatsError> {
        let policy = cfg.duplicate_policy;
        let note_durations = optional(rhythm::note_duration_mean_and_std(corpus, policy))?;
        if note_durations.is_none() {
            log::debug!("Skipping duration stats: corpus has an instrument without notes");
        }

        let instruments = corpus
            .instruments
            .iter()
            .map(|inst| InstrumentReport::compute(inst, cfg))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: None,
            instrument_count: corpus.instruments.len(),
            note_count: corpus.total_notes(),
            note_prevalence: instrumentation::note_prevalence(corpus, InstrumentFilter::All, policy)?,
            note_prevalence_std: instrumentation::note_prevalence_variance(
                corpus,
                InstrumentFilter::All,
                policy,
            )?,
            pitched_note_prevalence: instrumentation::note_prevalence(
                corpus,
                InstrumentFilter::PitchedOnly,
                policy,
            )?,
            drum_note_prevalence: instrumentation::note_prevalence(
                corpus,
                InstrumentFilter::DrumOnly,
                policy,
            )?,
            note_density: rhythm::note_density_per_second(corpus, cfg.roll_fs, policy)?,
            note_durations,
            instruments,
        })
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl InstrumentReport {
    pub fn compute(inst: &Instrument, cfg: &StatsConfig) -> Result<Self, StatsError> {
        let opts = cfg.interval_options();
        Ok(Self {
            id: make_id(inst),
            program: inst.program,
            name: inst.name.clone(),
            is_drum: inst.is_drum,
            note_count: inst.notes.len(),
            pitch: optional(PitchFeatures::compute(inst, cfg))?,
            melody: optional(MelodyFeatures::compute(inst, &opts))?,
            note_density: optional(rhythm::instrument_note_density_per_second(inst, cfg.roll_fs))?,
        })
    }
}

impl PitchFeatures {
    pub fn compute(inst: &Instrument, cfg: &StatsConfig) -> Result<Self, StatsError> {
        Ok(Self {
            histogram: pitch::pitch_histogram(inst, true)?,
            pitch_class_histogram: pitch::pitch_class_histogram(inst, true)?,
            most_common_pitch: pitch::most_common_pitch(inst, cfg.top_n)?,
            most_common_pitch_class: pitch::most_common_pitch_class(
                inst,
                cfg.top_n.min(pitch::PITCH_CLASS_BINS),
            )?,
            common_pitches: pitch::common_pitches_with_fraction(inst, cfg.common_pitch_fraction)?,
            pitch_variety: pitch::pitch_variety(inst)?,
            pitch_class_variety: pitch::pitch_class_variety(inst)?,
            pitch_range: pitch::pitch_range(inst)?,
            relative_strength_of_top_pitches: optional(pitch::relative_strength_of_top_pitches(inst))?,
            relative_strength_of_top_pitch_classes: optional(
                pitch::relative_strength_of_top_pitch_classes(inst),
            )?,
            interval_between_strongest_pitches: optional(
                pitch::interval_between_strongest_pitches(inst),
            )?,
            interval_between_strongest_pitch_classes: optional(
                pitch::interval_between_strongest_pitch_classes(inst),
            )?,
        })
    }
}

impl MelodyFeatures {
    pub fn compute(inst: &Instrument, opts: &IntervalOptions) -> Result<Self, StatsError> {
        let mut interval_fractions = BTreeMap::new();
        for kind in IntervalKind::ALL {
            interval_fractions.insert(kind.name(), melody::melodic_interval_fractions(inst, kind, opts)?);
        }
        let (direction_down, direction_up) = melody::direction_of_melody(inst, opts)?;
        Ok(Self {
            interval_histogram: melody::melodic_interval_histogram(inst, true, opts)?,
            average_interval: melody::average_melodic_interval(inst, opts)?,
            most_common_interval: melody::most_common_melodic_interval(inst, opts)?,
            interval_fractions,
            direction_down,
            direction_up,
        })
    }
}
