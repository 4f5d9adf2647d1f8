use super::identity::make_id;
use super::{mean_std, DuplicatePolicy, Result, StatsError};
use crate::corpus::{Corpus, InstrumentFilter};
use std::collections::BTreeMap;

/// Fraction of all note events in the piece played by each instrument.
///
/// Instruments rejected by `filter` get no entry but still count toward the
/// denominator, which is always the note total of the whole corpus.
pub fn note_prevalence(
    corpus: &Corpus,
    filter: InstrumentFilter,
    policy: DuplicatePolicy,
) -> Result<BTreeMap<String, f64>> {
    let total = corpus.total_notes();
    if total == 0 {
        return Err(StatsError::EmptyCorpus);
    }

    let mut prevalence = BTreeMap::new();
    for inst in corpus.instruments.iter().filter(|i| filter.includes(i)) {
        let fraction = inst.notes.len() as f64 / total as f64;
        let id = make_id(inst);
        match policy {
            DuplicatePolicy::Overwrite => {
                prevalence.insert(id, fraction);
            }
            DuplicatePolicy::Aggregate => {
                *prevalence.entry(id).or_insert(0.0) += fraction;
            }
        }
    }
    Ok(prevalence)
}

/// Population standard deviation of the [`note_prevalence`] fractions.
pub fn note_prevalence_variance(
    corpus: &Corpus,
    filter: InstrumentFilter,
    policy: DuplicatePolicy,
) -> Result<f64> {
    let prevalence = note_prevalence(corpus, filter, policy)?;
    if prevalence.is_empty() {
        return Err(StatsError::EmptyCorpus);
    }
    let values: Vec<f64> = prevalence.into_values().collect();
    Ok(mean_std(&values).1)
}
