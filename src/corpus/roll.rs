use super::{Corpus, Instrument};

/// Rows per instrument: one per MIDI pitch.
pub const PITCH_ROWS: usize = 128;

/// Default sampling rate of the activity matrix, in frames per second.
pub const DEFAULT_FS: f64 = 100.0;

/// Binarized time-quantized activity matrix of one instrument: 128 pitch rows
/// by `frames` time frames.
///
/// Each row holds the sorted, disjoint `[from, to)` frame spans where that pitch
/// sounds, so memory grows with the number of notes and never with the length
/// of the piece. Drum instruments render like any other.
#[derive(Debug, Clone, PartialEq)]
pub struct PianoRoll {
    frames: usize,
    rows: Vec<Vec<(usize, usize)>>,
}

/// Frame index of a time point: truncated `t * fs`, never negative.
fn frame_of(t: f64, fs: f64) -> usize {
    let f = (t * fs).trunc();
    if f <= 0.0 { 0 } else { f as usize }
}

/// Sort spans by start and merge the overlapping or touching ones.
fn merge_spans(spans: &mut Vec<(usize, usize)>) {
    spans.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for &(from, to) in spans.iter() {
        match merged.last_mut() {
            Some(last) if from <= last.1 => last.1 = last.1.max(to),
            _ => merged.push((from, to)),
        }
    }
    *spans = merged;
}

impl PianoRoll {
    /// Render one instrument with as many frames as its own end time needs.
    pub fn render(inst: &Instrument, fs: f64) -> Self {
        Self::render_with_frames(inst, fs, frame_of(inst.end_time(), fs))
    }

    /// Render one instrument into a roll of exactly `frames` frames.
    /// Notes extending past the last frame are cut off; silent (velocity 0)
    /// and negative-duration notes cover nothing.
    pub fn render_with_frames(inst: &Instrument, fs: f64, frames: usize) -> Self {
        let mut rows = vec![Vec::new(); PITCH_ROWS];
        for note in inst.notes.iter().filter(|n| n.velocity > 0) {
            let row = note.pitch as usize;
            if row >= PITCH_ROWS {
                continue;
            }
            let from = frame_of(note.start, fs).min(frames);
            let to = frame_of(note.end, fs).min(frames);
            if to > from {
                rows[row].push((from, to));
            }
        }
        for spans in &mut rows {
            merge_spans(spans);
        }
        Self { frames, rows }
    }

    /// Number of frames covering the whole corpus.
    pub fn corpus_frames(corpus: &Corpus, fs: f64) -> usize {
        frame_of(corpus.end_time(), fs)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of (pitch, frame) cells with activity.
    pub fn active_cells(&self) -> u64 {
        self.rows
            .iter()
            .flatten()
            .map(|&(from, to)| (to - from) as u64)
            .sum()
    }
}
