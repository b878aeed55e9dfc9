//! Per-axis spectral analysis of a completed capture.
//!
//! Each axis is processed independently: DC removal, Hamming window,
//! forward FFT, one-sided magnitudes, then peak extraction refined with
//! parabolic interpolation against the neighboring bins. Frequencies are
//! converted to Hz using the sampling rate measured from the capture's own
//! timestamps, not the nominal rate.

use super::{detrended_windowed, hamming, FftProcessor, ProcessingError};
use crate::types::{RawCapture, AXES, SAMPLES_PER_CAPTURE, SPECTRUM_BINS};

/// Magnitude spectrum and interpolated peak frequency for one axis.
#[derive(Debug, Clone)]
pub struct AxisSpectrum {
    /// One-sided magnitudes, `SPECTRUM_BINS` entries.
    pub magnitudes: Vec<f32>,
    /// Interpolated peak frequency in `[0, Fs/2]` Hz.
    pub peak_hz: f32,
}

/// Full spectral analysis of one capture.
#[derive(Debug, Clone)]
pub struct SpectralAnalysis {
    /// Sampling frequency measured from inter-sample deltas (Hz).
    pub sampling_hz: f64,
    /// Per-axis spectrum, X/Y/Z order.
    pub axes: [AxisSpectrum; AXES],
}

/// Measure the true sampling frequency from the capture timestamps:
/// `(N−1) / Σ(inter-sample deltas in seconds)`. Shared across axes.
pub fn measured_sampling_hz(capture: &RawCapture) -> Result<f64, ProcessingError> {
    if capture.len() < 2 {
        return Err(ProcessingError::InsufficientData {
            needed: 2,
            available: capture.len(),
        });
    }

    let total_us: u64 = capture
        .elapsed_us
        .windows(2)
        .map(|pair| u64::from(pair[1] - pair[0]))
        .sum();
    if total_us == 0 {
        return Err(ProcessingError::InvalidSamplingRate(f64::INFINITY));
    }

    Ok((capture.len() - 1) as f64 / (total_us as f64 * 1e-6))
}

/// Spectral analyzer with a pre-planned FFT and window for full captures.
pub struct SpectralAnalyzer {
    fft: FftProcessor,
    window: Vec<f64>,
}

impl SpectralAnalyzer {
    pub fn new() -> Result<Self, ProcessingError> {
        Ok(Self {
            fft: FftProcessor::new(SAMPLES_PER_CAPTURE)?,
            window: hamming(SAMPLES_PER_CAPTURE),
        })
    }

    /// Analyze a completed capture: measured Fs plus per-axis spectra and
    /// peak frequencies. The capture must hold exactly `SAMPLES_PER_CAPTURE`
    /// samples.
    pub fn analyze(&self, capture: &RawCapture) -> Result<SpectralAnalysis, ProcessingError> {
        if capture.len() != SAMPLES_PER_CAPTURE {
            return Err(ProcessingError::InsufficientData {
                needed: SAMPLES_PER_CAPTURE,
                available: capture.len(),
            });
        }

        let sampling_hz = measured_sampling_hz(capture)?;
        let x = self.analyze_axis(&capture.axes[0], sampling_hz)?;
        let y = self.analyze_axis(&capture.axes[1], sampling_hz)?;
        let z = self.analyze_axis(&capture.axes[2], sampling_hz)?;

        Ok(SpectralAnalysis {
            sampling_hz,
            axes: [x, y, z],
        })
    }

    fn analyze_axis(&self, samples: &[f32], sampling_hz: f64) -> Result<AxisSpectrum, ProcessingError> {
        let frame: Vec<f64> = samples.iter().map(|&v| f64::from(v)).collect();
        let windowed = detrended_windowed(&frame, &self.window);
        let magnitudes = self.fft.magnitudes(&windowed)?;

        let peak_hz = interpolated_peak_hz(&magnitudes, sampling_hz);

        Ok(AxisSpectrum {
            magnitudes: magnitudes.iter().map(|&m| m as f32).collect(),
            peak_hz: peak_hz as f32,
        })
    }
}

/// Locate the largest magnitude bin (DC excluded), refine it with parabolic
/// interpolation against its neighbors, and convert to Hz.
fn interpolated_peak_hz(magnitudes: &[f64], sampling_hz: f64) -> f64 {
    debug_assert_eq!(magnitudes.len(), SPECTRUM_BINS);

    let mut peak_idx = 1;
    let mut peak_mag = f64::NEG_INFINITY;
    for (i, &m) in magnitudes.iter().enumerate().skip(1) {
        if m > peak_mag {
            peak_mag = m;
            peak_idx = i;
        }
    }

    // Parabolic refinement needs both neighbors; at the edges the bin
    // center is the best estimate available.
    let offset = if peak_idx > 0 && peak_idx < magnitudes.len() - 1 {
        let a = magnitudes[peak_idx - 1];
        let b = magnitudes[peak_idx];
        let c = magnitudes[peak_idx + 1];
        let denom = a - 2.0 * b + c;
        if denom.abs() > f64::EPSILON {
            (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        }
    } else {
        0.0
    };

    let bin_width = sampling_hz / SAMPLES_PER_CAPTURE as f64;
    ((peak_idx as f64 + offset) * bin_width).clamp(0.0, sampling_hz / 2.0)
}
