//! Time-frequency grid built from a capture's total-magnitude signal.
//!
//! The grid is a display artifact: it is rebuilt on demand after an
//! acquisition or when a stored record is loaded, and never persisted.

use super::{detrended_windowed, hamming, FftProcessor, ProcessingError};

/// Samples per spectrogram segment.
pub const SEGMENT_LEN: usize = 128;

/// Stride between consecutive segment starts (50% overlap).
pub const SEGMENT_HOP: usize = SEGMENT_LEN / 2;

/// Upper bound on segments per spectrogram.
pub const MAX_SEGMENTS: usize = 17;

/// Frequency bins kept per segment.
pub const SEGMENT_BINS: usize = SEGMENT_LEN / 2;

/// Floor applied to magnitudes before taking log10.
const MAGNITUDE_FLOOR: f64 = 1e-9;

/// Displayed dynamic range is capped at this many decades from the top.
const MAX_SPAN_DECADES: f64 = 3.0;

/// Below this span the range is considered degenerate and widened.
const MIN_SPAN: f64 = 1e-6;

/// Span substituted when the observed range is degenerate.
const WIDENED_SPAN: f64 = 1.0;

/// Normalized time-frequency grid of log10 magnitudes.
///
/// Always holds at least one segment; a signal too short for a single
/// window yields one all-zero segment with range `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    segments: Vec<Vec<f32>>,
    min_level: f64,
    max_level: f64,
}

impl Spectrogram {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Raw log10 magnitude of one cell.
    pub fn level(&self, segment: usize, bin: usize) -> f32 {
        self.segments[segment][bin]
    }

    /// Clamped display range `(min, max)` in decades.
    pub fn range(&self) -> (f64, f64) {
        (self.min_level, self.max_level)
    }

    /// Displayed span in decades; always in `(0, 3]`.
    pub fn span_decades(&self) -> f64 {
        self.max_level - self.min_level
    }

    /// Cell value normalized into `[0, 1]` against the clamped range.
    pub fn normalized(&self, segment: usize, bin: usize) -> f32 {
        let v = f64::from(self.segments[segment][bin]);
        (((v - self.min_level) / (self.max_level - self.min_level)).clamp(0.0, 1.0)) as f32
    }
}

/// Builds spectrograms from a total-magnitude signal.
pub struct SpectrogramBuilder {
    fft: FftProcessor,
    window: Vec<f64>,
}

impl SpectrogramBuilder {
    pub fn new() -> Result<Self, ProcessingError> {
        Ok(Self {
            fft: FftProcessor::new(SEGMENT_LEN)?,
            window: hamming(SEGMENT_LEN),
        })
    }

    /// Build the grid: fixed windows of `SEGMENT_LEN` at 50% overlap, up to
    /// `MAX_SEGMENTS`, each DC-removed, Hamming-windowed, transformed, and
    /// log10'd with a floor. The running range is widened when degenerate
    /// and clamped so only the top three decades are shown.
    pub fn build(&self, signal: &[f64]) -> Result<Spectrogram, ProcessingError> {
        let mut segments: Vec<Vec<f32>> = Vec::new();
        let mut min_level = f64::INFINITY;
        let mut max_level = f64::NEG_INFINITY;

        let mut pos = 0;
        while pos + SEGMENT_LEN <= signal.len() && segments.len() < MAX_SEGMENTS {
            let frame = detrended_windowed(&signal[pos..pos + SEGMENT_LEN], &self.window);
            let magnitudes = self.fft.magnitudes(&frame)?;

            let levels: Vec<f32> = magnitudes
                .iter()
                .take(SEGMENT_BINS)
                .map(|&m| {
                    let level = m.max(MAGNITUDE_FLOOR).log10();
                    min_level = min_level.min(level);
                    max_level = max_level.max(level);
                    level as f32
                })
                .collect();

            segments.push(levels);
            pos += SEGMENT_HOP;
        }

        if segments.is_empty() {
            // Too few samples for a single window: synthesize one degenerate
            // all-zero segment instead of failing.
            tracing::debug!(
                available = signal.len(),
                needed = SEGMENT_LEN,
                "signal too short for spectrogram, using degenerate segment"
            );
            return Ok(Spectrogram {
                segments: vec![vec![0.0; SEGMENT_BINS]],
                min_level: 0.0,
                max_level: 1.0,
            });
        }

        if max_level - min_level < MIN_SPAN {
            max_level = min_level + WIDENED_SPAN;
        }
        if max_level - min_level > MAX_SPAN_DECADES {
            min_level = max_level - MAX_SPAN_DECADES;
        }

        Ok(Spectrogram {
            segments,
            min_level,
            max_level,
        })
    }
}
