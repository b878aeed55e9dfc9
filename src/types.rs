//! Core value types shared across acquisition, processing, and storage.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of samples in one acquisition run. Power of two for the FFT.
pub const SAMPLES_PER_CAPTURE: usize = 1024;

/// One-sided spectrum length kept per axis (up to Nyquist).
pub const SPECTRUM_BINS: usize = SAMPLES_PER_CAPTURE / 2;

/// Number of acceleration axes.
pub const AXES: usize = 3;

/// Axis index aliases for readability at call sites.
pub const AXIS_X: usize = 0;
pub const AXIS_Y: usize = 1;
pub const AXIS_Z: usize = 2;

// ============================================================================
// Raw Capture
// ============================================================================

/// One acquisition run's timestamped tri-axial samples.
///
/// Stored column-wise so per-axis analysis and the on-disk layout can take
/// contiguous slices. Invariant: `elapsed_us` is non-decreasing and the
/// first entry is 0 (the controller timestamps relative to the first
/// accepted sample).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCapture {
    /// Elapsed microseconds since the first sample of the run.
    pub elapsed_us: Vec<u32>,
    /// Acceleration per axis, one vector per axis, same length as `elapsed_us`.
    pub axes: [Vec<f32>; AXES],
}

impl RawCapture {
    /// Create an empty capture with room for a full run.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            elapsed_us: Vec::with_capacity(n),
            axes: [
                Vec::with_capacity(n),
                Vec::with_capacity(n),
                Vec::with_capacity(n),
            ],
        }
    }

    /// Number of samples collected so far.
    pub fn len(&self) -> usize {
        self.elapsed_us.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elapsed_us.is_empty()
    }

    /// Append one tri-axial sample.
    pub fn push(&mut self, elapsed_us: u32, sample: [f32; AXES]) {
        self.elapsed_us.push(elapsed_us);
        for (axis, value) in self.axes.iter_mut().zip(sample) {
            axis.push(value);
        }
    }

    /// Drop all samples, keeping the allocations for the next run.
    pub fn clear(&mut self) {
        self.elapsed_us.clear();
        for axis in &mut self.axes {
            axis.clear();
        }
    }

    /// Per-sample total magnitude `sqrt(x² + y² + z²)`.
    pub fn total_magnitude(&self) -> Vec<f64> {
        total_magnitude(&self.axes)
    }
}

/// Per-sample total magnitude of a tri-axial series, `sqrt(x² + y² + z²)`.
///
/// Shared by the live capture path and record loads, which both feed the
/// spectrogram builder.
pub fn total_magnitude(axes: &[Vec<f32>; AXES]) -> Vec<f64> {
    (0..axes[AXIS_X].len())
        .map(|i| {
            let x = f64::from(axes[AXIS_X][i]);
            let y = f64::from(axes[AXIS_Y][i]);
            let z = f64::from(axes[AXIS_Z][i]);
            (x * x + y * y + z * z).sqrt()
        })
        .collect()
}

// ============================================================================
// Statistics
// ============================================================================

/// Summary statistics for one axis of a capture.
///
/// `sd` is the population standard deviation (divide by N, not N−1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub sd: f32,
}

// ============================================================================
// Record
// ============================================================================

/// A persisted, immutable bundle of one capture: metadata, raw samples, and
/// per-axis magnitude spectra.
///
/// Created once at acquisition completion and never mutated; destroyed only
/// by ring eviction or an explicit wipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Wall-clock time of the first sample of the run.
    pub started_at: NaiveDateTime,
    /// Sampling frequency measured from the run's timestamps (Hz).
    pub sampling_hz: f32,
    /// Interpolated peak frequency per axis (Hz).
    pub peak_hz: [f32; AXES],
    /// Summary statistics per axis, computed once at acquisition time.
    pub stats: [AxisStats; AXES],
    /// Raw acceleration samples, `SAMPLES_PER_CAPTURE` per axis.
    pub samples: [Vec<f32>; AXES],
    /// One-sided magnitude spectra, `SPECTRUM_BINS` per axis.
    pub spectra: [Vec<f32>; AXES],
}

impl Record {
    /// Frequency of spectrum bin `i` in Hz: `i · Fs / N`.
    pub fn bin_frequency(&self, i: usize) -> f32 {
        i as f32 * self.sampling_hz / SAMPLES_PER_CAPTURE as f32
    }
}
