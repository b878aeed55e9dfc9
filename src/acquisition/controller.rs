//! Acquisition controller: a four-state trigger/sampling machine.
//!
//! IDLE → ARMED → SAMPLING → DONE → IDLE. Arming is explicit; the trigger
//! condition depends on the mode (immediate in self-trigger, an analog
//! threshold crossing in external-trigger). Sampling is rate-limited by a
//! minimum inter-sample interval and always terminates after exactly
//! `SAMPLES_PER_CAPTURE` accepted samples — there is no internal timeout
//! and no mid-run cancellation.

use super::{AcquisitionError, SampleSource};
use crate::clock::WallClock;
use crate::types::{RawCapture, SAMPLES_PER_CAPTURE};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureState {
    /// Nothing armed; the live buffer holds the previous run, if any.
    Idle,
    /// Waiting for the trigger condition.
    Armed,
    /// Collecting samples into the live buffer.
    Sampling,
    /// A full run is available via [`Controller::capture`].
    Done,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Armed => write!(f, "Armed"),
            CaptureState::Sampling => write!(f, "Sampling"),
            CaptureState::Done => write!(f, "Done"),
        }
    }
}

/// How a run starts once armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Trigger satisfied immediately on arming.
    #[default]
    SelfTrigger,
    /// Trigger satisfied when the external analog level exceeds the
    /// configured threshold while armed.
    External,
}

/// The acquisition state machine. One instance owns the live capture
/// buffer; it is the buffer's only writer, and only while SAMPLING.
pub struct Controller {
    state: CaptureState,
    mode: TriggerMode,
    min_interval_us: u64,
    trigger_threshold: u16,
    capture: RawCapture,
    /// Monotonic µs of the first accepted sample of the current run.
    run_start_us: u64,
    /// Monotonic µs of the last accepted sample.
    last_sample_us: u64,
    started_at: Option<NaiveDateTime>,
}

impl Controller {
    pub fn new(mode: TriggerMode, min_interval_us: u64, trigger_threshold: u16) -> Self {
        Self {
            state: CaptureState::Idle,
            mode,
            min_interval_us,
            trigger_threshold,
            capture: RawCapture::with_capacity(SAMPLES_PER_CAPTURE),
            run_start_us: 0,
            last_sample_us: 0,
            started_at: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Change the trigger mode. Rejected mid-run.
    pub fn set_mode(&mut self, mode: TriggerMode) -> Result<(), AcquisitionError> {
        if self.state == CaptureState::Sampling {
            return Err(AcquisitionError::ModeChangeWhileSampling);
        }
        self.mode = mode;
        Ok(())
    }

    /// Arm the controller. Legal from IDLE and DONE; re-arming while ARMED
    /// restarts the trigger wait. Rejected while SAMPLING.
    pub fn arm(&mut self) -> Result<(), AcquisitionError> {
        if self.state == CaptureState::Sampling {
            return Err(AcquisitionError::ArmWhileSampling);
        }
        self.state = CaptureState::Armed;
        info!(mode = ?self.mode, "acquisition armed");
        Ok(())
    }

    /// Advance the machine by one cooperative tick.
    ///
    /// `now_us` is a monotonic microsecond timestamp supplied by the tick
    /// loop. At most one sample is accepted per tick; the wall-clock start
    /// time is read exactly once, at the first accepted sample.
    pub fn tick<S: SampleSource>(
        &mut self,
        source: &mut S,
        clock: &dyn WallClock,
        now_us: u64,
    ) -> CaptureState {
        match self.state {
            CaptureState::Idle | CaptureState::Done => {}
            CaptureState::Armed => {
                if self.trigger_satisfied(source) {
                    self.capture.clear();
                    self.started_at = None;
                    self.state = CaptureState::Sampling;
                    debug!("trigger satisfied, sampling");
                    // First sample may be accepted on the same tick.
                    self.sample(source, clock, now_us);
                }
            }
            CaptureState::Sampling => self.sample(source, clock, now_us),
        }
        self.state
    }

    /// The live capture buffer. Holds a complete run while DONE.
    pub fn capture(&self) -> &RawCapture {
        &self.capture
    }

    /// Wall-clock time of the current run's first sample.
    pub fn started_at(&self) -> Option<NaiveDateTime> {
        self.started_at
    }

    /// Acknowledge a completed run: DONE → IDLE. The capture contents stay
    /// readable until the next run overwrites them.
    pub fn acknowledge(&mut self) {
        if self.state == CaptureState::Done {
            self.state = CaptureState::Idle;
        }
    }

    fn trigger_satisfied<S: SampleSource>(&self, source: &mut S) -> bool {
        match self.mode {
            TriggerMode::SelfTrigger => true,
            TriggerMode::External => source.trigger_level() > self.trigger_threshold,
        }
    }

    fn sample<S: SampleSource>(&mut self, source: &mut S, clock: &dyn WallClock, now_us: u64) {
        let first = self.capture.is_empty();
        if !first && now_us.saturating_sub(self.last_sample_us) < self.min_interval_us {
            return;
        }

        let accel = source.read_acceleration();
        if first {
            self.run_start_us = now_us;
            self.started_at = Some(clock.now());
        }
        let elapsed = now_us - self.run_start_us;
        self.capture
            .push(u32::try_from(elapsed).unwrap_or(u32::MAX), accel);
        self.last_sample_us = now_us;

        if self.capture.len() == SAMPLES_PER_CAPTURE {
            self.state = CaptureState::Done;
            info!(
                samples = SAMPLES_PER_CAPTURE,
                elapsed_us = elapsed,
                "capture complete"
            );
        }
    }
}
