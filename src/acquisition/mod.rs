//! Acceleration acquisition: the trigger/sampling state machine and the
//! sensor seam it reads from.

mod controller;
mod sources;

pub use controller::{CaptureState, Controller, TriggerMode};
pub use sources::{SampleSource, SyntheticSource, TRIGGER_SCALE_MAX};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// `arm` is only legal from IDLE, ARMED (re-arm), or DONE.
    #[error("Cannot arm while sampling")]
    ArmWhileSampling,

    /// The trigger mode cannot change mid-run.
    #[error("Cannot change trigger mode while sampling")]
    ModeChangeWhileSampling,
}
