//! Sensor seam: where samples and the external trigger level come from.

use crate::types::AXES;
use std::f64::consts::PI;

/// Full-scale reading of the external trigger ADC.
pub const TRIGGER_SCALE_MAX: u16 = 4095;

/// Synchronous access to the accelerometer and the trigger input.
///
/// Implementations are polled from the tick loop; reads are expected to be
/// fast and non-blocking.
pub trait SampleSource {
    /// Read one tri-axial acceleration sample (g).
    fn read_acceleration(&mut self) -> [f32; AXES];

    /// Current external trigger level on the 0–4095 ADC scale.
    fn trigger_level(&mut self) -> u16;
}

/// Deterministic signal generator for tests and the simulation binary.
///
/// Each axis produces `offset + amplitude · sin(2π · freq · t)`, with `t`
/// advanced by the nominal sample period on every read.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    amplitude: [f64; AXES],
    freq_hz: [f64; AXES],
    offset: [f64; AXES],
    sample_period_s: f64,
    t: f64,
    trigger_level: u16,
}

impl SyntheticSource {
    /// Same sine on all three axes.
    pub fn sine(amplitude: f64, freq_hz: f64, sample_rate_hz: f64) -> Self {
        Self {
            amplitude: [amplitude; AXES],
            freq_hz: [freq_hz; AXES],
            offset: [0.0; AXES],
            sample_period_s: 1.0 / sample_rate_hz,
            t: 0.0,
            trigger_level: 0,
        }
    }

    /// Independent tone per axis.
    pub fn tones(
        amplitude: [f64; AXES],
        freq_hz: [f64; AXES],
        offset: [f64; AXES],
        sample_rate_hz: f64,
    ) -> Self {
        Self {
            amplitude,
            freq_hz,
            offset,
            sample_period_s: 1.0 / sample_rate_hz,
            t: 0.0,
            trigger_level: 0,
        }
    }

    /// Set the level reported to external-trigger polls.
    pub fn set_trigger_level(&mut self, level: u16) {
        self.trigger_level = level.min(TRIGGER_SCALE_MAX);
    }
}

impl SampleSource for SyntheticSource {
    fn read_acceleration(&mut self) -> [f32; AXES] {
        let mut sample = [0.0_f32; AXES];
        for axis in 0..AXES {
            let v = self.offset[axis]
                + self.amplitude[axis] * (2.0 * PI * self.freq_hz[axis] * self.t).sin();
            sample[axis] = v as f32;
        }
        self.t += self.sample_period_s;
        sample
    }

    fn trigger_level(&mut self) -> u16 {
        self.trigger_level
    }
}
