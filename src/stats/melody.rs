use super::identity::make_id;
use super::{normalize, Histogram, Result, StatsError};
use crate::corpus::Instrument;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Widest interval with its own bin, in semitones (three octaves).
pub const MAX_INTERVAL: i32 = 36;

/// Bins from -36 to +36 semitones.
pub const INTERVAL_BINS: usize = (2 * MAX_INTERVAL + 1) as usize;

/// Bin of the unison interval.
pub const UNISON_BIN: usize = MAX_INTERVAL as usize;

/// Default silence, in seconds, after which two notes no longer form a melodic step.
pub const DEFAULT_MAX_GAP_SECS: f64 = 1.0;

/// Handling of steps wider than [`MAX_INTERVAL`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalOverflow {
    /// Count the step in the outermost bin on its side.
    #[default]
    Clamp,
    /// Fail with `InvalidArgument`.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalOptions {
    /// A pair whose gap (next start minus previous end) exceeds this is skipped.
    pub max_gap_secs: f64,
    pub overflow: IntervalOverflow,
}

impl Default for IntervalOptions {
    fn default() -> Self {
        Self {
            max_gap_secs: DEFAULT_MAX_GAP_SECS,
            overflow: IntervalOverflow::default(),
        }
    }
}

/// Named interval families for [`melodic_interval_fractions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// ±1
    Semitones,
    /// ±3 and ±4
    Thirds,
    /// ±7
    Fifths,
    /// ±6
    Tritones,
    /// ±12, ±24 and the outermost bins
    Octaves,
}

impl IntervalKind {
    pub const ALL: [IntervalKind; 5] = [
        Self::Semitones,
        Self::Thirds,
        Self::Fifths,
        Self::Tritones,
        Self::Octaves,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Semitones => "semitones",
            Self::Thirds => "thirds",
            Self::Fifths => "fifths",
            Self::Tritones => "tritones",
            Self::Octaves => "octaves",
        }
    }

    fn bins(self) -> &'static [usize] {
        match self {
            Self::Semitones => &SEMITONE_BINS,
            Self::Thirds => &THIRD_BINS,
            Self::Fifths => &FIFTH_BINS,
            Self::Tritones => &TRITONE_BINS,
            Self::Octaves => &OCTAVE_BINS,
        }
    }
}

static SEMITONE_BINS: [usize; 2] = [UNISON_BIN - 1, UNISON_BIN + 1];
static THIRD_BINS: [usize; 4] = [UNISON_BIN - 4, UNISON_BIN - 3, UNISON_BIN + 3, UNISON_BIN + 4];
static FIFTH_BINS: [usize; 2] = [UNISON_BIN - 7, UNISON_BIN + 7];
static TRITONE_BINS: [usize; 2] = [UNISON_BIN - 6, UNISON_BIN + 6];
static OCTAVE_BINS: [usize; 6] = [
    UNISON_BIN - 24,
    UNISON_BIN - 12,
    UNISON_BIN + 12,
    UNISON_BIN + 24,
    0,
    INTERVAL_BINS - 1,
];

impl FromStr for IntervalKind {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| {
                StatsError::InvalidArgument(format!(
                    "unknown interval kind '{s}', expected one of semitones, thirds, fifths, tritones, octaves"
                ))
            })
    }
}

/// Signed semitone steps between consecutive notes, 73 bins, index 36 = unison.
///
/// Pairs separated by more than `opts.max_gap_secs` of silence are skipped.
/// Needs at least two notes.
pub fn melodic_interval_histogram(
    inst: &Instrument,
    normalized: bool,
    opts: &IntervalOptions,
) -> Result<Histogram> {
    if inst.notes.len() < 2 {
        return Err(StatsError::EmptyInstrument(make_id(inst)));
    }

    let mut hist = vec![0.0; INTERVAL_BINS];
    for pair in inst.notes.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.start - prev.end > opts.max_gap_secs {
            continue;
        }
        let step = curr.pitch as i32 - prev.pitch as i32;
        if step.abs() > MAX_INTERVAL && opts.overflow == IntervalOverflow::Reject {
            return Err(StatsError::InvalidArgument(format!(
                "{}: melodic step of {step} semitones exceeds ±{MAX_INTERVAL}",
                make_id(inst)
            )));
        }
        hist[(step.clamp(-MAX_INTERVAL, MAX_INTERVAL) + MAX_INTERVAL) as usize] += 1.0;
    }

    if normalized && !normalize(&mut hist) {
        return Err(StatsError::EmptyInstrument(make_id(inst)));
    }
    Ok(hist)
}

/// Raw interval counts and their total, failing when no pair was counted.
fn interval_counts(inst: &Instrument, opts: &IntervalOptions) -> Result<(Histogram, f64)> {
    let hist = melodic_interval_histogram(inst, false, opts)?;
    let total: f64 = hist.iter().sum();
    if total <= 0.0 {
        return Err(StatsError::EmptyInstrument(make_id(inst)));
    }
    Ok((hist, total))
}

fn bin_interval(bin: usize) -> i32 {
    bin as i32 - MAX_INTERVAL
}

/// Mean absolute step size in semitones.
pub fn average_melodic_interval(inst: &Instrument, opts: &IntervalOptions) -> Result<f64> {
    let (hist, total) = interval_counts(inst, opts)?;
    let weighted: f64 = hist
        .iter()
        .enumerate()
        .map(|(bin, &count)| bin_interval(bin).abs() as f64 * count)
        .sum();
    Ok(weighted / total)
}

/// Every signed interval tied for the highest count, ascending.
pub fn most_common_melodic_interval(inst: &Instrument, opts: &IntervalOptions) -> Result<Vec<i32>> {
    let (hist, _) = interval_counts(inst, opts)?;
    let max = hist.iter().cloned().fold(0.0, f64::max);
    Ok(hist
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count == max)
        .map(|(bin, _)| bin_interval(bin))
        .collect())
}

/// Share of counted steps that belong to `kind`.
pub fn melodic_interval_fractions(
    inst: &Instrument,
    kind: IntervalKind,
    opts: &IntervalOptions,
) -> Result<f64> {
    let (hist, total) = interval_counts(inst, opts)?;
    let n: f64 = kind.bins().iter().map(|&bin| hist[bin]).sum();
    Ok(n / total)
}

/// `(down, up)`: shares of descending and ascending steps. Unisons count in
/// neither, so the two need not sum to 1.
pub fn direction_of_melody(inst: &Instrument, opts: &IntervalOptions) -> Result<(f64, f64)> {
    let (hist, total) = interval_counts(inst, opts)?;
    let down: f64 = hist[..UNISON_BIN].iter().sum();
    let up: f64 = hist[UNISON_BIN + 1..].iter().sum();
    Ok((down / total, up / total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Note;

    /// Back-to-back one-second notes.
    fn legato(pitches: &[u8]) -> Instrument {
        let notes = pitches
            .iter()
            .enumerate()
            .map(|(i, &p)| Note::new(p, i as f64, i as f64 + 1.0))
            .collect();
        Instrument::new(73, "Flute", false, notes)
    }

    fn opts() -> IntervalOptions {
        IntervalOptions::default()
    }

    #[test]
    fn test_zero_gap_pair_counted() {
        let inst = Instrument::new(0, "", false, vec![Note::new(60, 0.0, 1.0), Note::new(62, 1.0, 2.0)]);
        let hist = melodic_interval_histogram(&inst, false, &opts()).unwrap();
        assert_eq!(hist.len(), INTERVAL_BINS);
        assert_eq!(hist[38], 1.0);
        assert_eq!(hist.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_long_silence_skips_pair() {
        let inst = Instrument::new(
            0,
            "",
            false,
            vec![Note::new(60, 0.0, 1.0), Note::new(62, 1.0, 2.0), Note::new(67, 5.0, 6.0)],
        );
        let hist = melodic_interval_histogram(&inst, false, &opts()).unwrap();
        assert_eq!(hist[38], 1.0);
        assert_eq!(hist[41], 0.0);
        assert_eq!(hist.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_gap_of_exactly_threshold_counts() {
        let inst = Instrument::new(0, "", false, vec![Note::new(60, 0.0, 1.0), Note::new(59, 2.0, 3.0)]);
        let hist = melodic_interval_histogram(&inst, false, &opts()).unwrap();
        assert_eq!(hist[35], 1.0);

        let tight = IntervalOptions { max_gap_secs: 0.5, ..opts() };
        assert!(melodic_interval_histogram(&inst, true, &tight).is_err());
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let inst = legato(&[60, 62, 64, 62, 60, 60, 67]);
        let hist = melodic_interval_histogram(&inst, true, &opts()).unwrap();
        assert!((hist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_notes() {
        let single = legato(&[60]);
        let expected = Err(StatsError::EmptyInstrument("program_73_name_Flute".to_string()));
        assert_eq!(melodic_interval_histogram(&single, false, &opts()), expected);
        assert!(average_melodic_interval(&single, &opts()).is_err());
        assert!(most_common_melodic_interval(&single, &opts()).is_err());
        assert!(direction_of_melody(&single, &opts()).is_err());
        assert!(melodic_interval_fractions(&single, IntervalKind::Thirds, &opts()).is_err());
    }

    #[test]
    fn test_all_pairs_skipped_is_empty() {
        let inst = Instrument::new(0, "", false, vec![Note::new(60, 0.0, 1.0), Note::new(62, 3.0, 4.0)]);
        assert!(melodic_interval_histogram(&inst, false, &opts()).is_ok());
        assert!(matches!(
            average_melodic_interval(&inst, &opts()),
            Err(StatsError::EmptyInstrument(_))
        ));
    }

    #[test]
    fn test_overflow_policy() {
        let inst = legato(&[20, 80]);
        let hist = melodic_interval_histogram(&inst, false, &opts()).unwrap();
        assert_eq!(hist[INTERVAL_BINS - 1], 1.0);
        assert!((melodic_interval_fractions(&inst, IntervalKind::Octaves, &opts()).unwrap() - 1.0).abs() < 1e-12);

        let down = legato(&[90, 10]);
        assert_eq!(melodic_interval_histogram(&down, false, &opts()).unwrap()[0], 1.0);

        let strict = IntervalOptions { overflow: IntervalOverflow::Reject, ..opts() };
        assert!(matches!(
            melodic_interval_histogram(&inst, false, &strict),
            Err(StatsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_average_interval() {
        // steps +2, +2, -4, 0
        let inst = legato(&[60, 62, 64, 60, 60]);
        assert!((average_melodic_interval(&inst, &opts()).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_most_common_interval_ties() {
        // steps +2, -2, +2, -2, +5
        let inst = legato(&[60, 62, 60, 62, 60, 65]);
        assert_eq!(most_common_melodic_interval(&inst, &opts()).unwrap(), vec![-2, 2]);
    }

    #[test]
    fn test_interval_fractions() {
        // steps +1, -1, +4, -3, +7, -6, +12, 0
        let inst = legato(&[60, 61, 60, 64, 61, 68, 62, 74, 74]);
        let f = |k| melodic_interval_fractions(&inst, k, &opts()).unwrap();
        assert!((f(IntervalKind::Semitones) - 2.0 / 8.0).abs() < 1e-12);
        assert!((f(IntervalKind::Thirds) - 2.0 / 8.0).abs() < 1e-12);
        assert!((f(IntervalKind::Fifths) - 1.0 / 8.0).abs() < 1e-12);
        assert!((f(IntervalKind::Tritones) - 1.0 / 8.0).abs() < 1e-12);
        assert!((f(IntervalKind::Octaves) - 1.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("fifths".parse::<IntervalKind>().unwrap(), IntervalKind::Fifths);
        assert!(matches!(
            "sevenths".parse::<IntervalKind>(),
            Err(StatsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_direction_ascending() {
        let inst = legato(&[60, 62, 64, 65, 67]);
        assert_eq!(direction_of_melody(&inst, &opts()).unwrap(), (0.0, 1.0));
    }

    #[test]
    fn test_direction_excludes_unison() {
        // steps -2, 0, 0, +3
        let inst = legato(&[62, 60, 60, 60, 63]);
        let (down, up) = direction_of_melody(&inst, &opts()).unwrap();
        assert!((down - 0.25).abs() < 1e-12);
        assert!((up - 0.25).abs() < 1e-12);
    }
}
