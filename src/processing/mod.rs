//! Signal processing — spectral analysis, spectrogram construction, and
//! summary statistics for captured acceleration bursts.

mod spectrogram;
mod spectrum;
mod statistics;

pub use spectrogram::{
    Spectrogram, SpectrogramBuilder, MAX_SEGMENTS, SEGMENT_BINS, SEGMENT_HOP, SEGMENT_LEN,
};
pub use spectrum::{
    measured_sampling_hz, AxisSpectrum, SpectralAnalysis, SpectralAnalyzer,
};
pub use statistics::{axis_statistics, capture_statistics};

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;
use thiserror::Error;

/// Errors in signal processing
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Insufficient data: need {needed}, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("FFT size must be a power of two, got {0}")]
    NonPowerOfTwo(usize),

    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),
}

// ============================================================================
// FFT Processor (pre-planned for repeated use)
// ============================================================================

/// FFT processor with a pre-planned forward transform of fixed size.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftProcessor {
    /// Plan a forward FFT of the given power-of-two size.
    pub fn new(size: usize) -> Result<Self, ProcessingError> {
        if !size.is_power_of_two() {
            return Err(ProcessingError::NonPowerOfTwo(size));
        }
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Ok(Self { fft, size })
    }

    /// Planned transform size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Transform a real-valued frame and return the one-sided magnitude
    /// spectrum (first `size/2` bins, up to Nyquist).
    pub fn magnitudes(&self, frame: &[f64]) -> Result<Vec<f64>, ProcessingError> {
        if frame.len() != self.size {
            return Err(ProcessingError::InsufficientData {
                needed: self.size,
                available: frame.len(),
            });
        }

        let mut buffer: Vec<Complex<f64>> =
            frame.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.fft.process(&mut buffer);

        Ok(buffer
            .iter()
            .take(self.size / 2)
            .map(|c| c.norm())
            .collect())
    }
}

/// Generate Hamming window coefficients.
pub(crate) fn hamming(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}

/// Subtract the frame mean, then apply the window.
pub(crate) fn detrended_windowed(frame: &[f64], window: &[f64]) -> Vec<f64> {
    let mean = frame.iter().sum::<f64>() / frame.len() as f64;
    frame
        .iter()
        .zip(window)
        .map(|(&v, &w)| (v - mean) * w)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_rejects_non_power_of_two() {
        assert!(matches!(
            FftProcessor::new(1000),
            Err(ProcessingError::NonPowerOfTwo(1000))
        ));
    }

    #[test]
    fn fft_rejects_short_frame() {
        let fft = FftProcessor::new(64).unwrap();
        assert!(matches!(
            fft.magnitudes(&[0.0; 32]),
            Err(ProcessingError::InsufficientData {
                needed: 64,
                available: 32
            })
        ));
    }

    #[test]
    fn hamming_endpoints_and_center() {
        let w = hamming(64);
        assert!((w[0] - 0.08).abs() < 0.01);
        assert!(w[32] > 0.99);
    }

    #[test]
    fn detrend_removes_dc() {
        let window = vec![1.0; 8];
        let out = detrended_windowed(&[5.0; 8], &window);
        assert!(out.iter().all(|&v| v.abs() < 1e-12));
    }
}
