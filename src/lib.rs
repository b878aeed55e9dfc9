//! Vibrelog: tri-axial vibration capture and analysis.
//!
//! Captures fixed-length bursts of acceleration, turns each burst into
//! per-axis magnitude spectra and a time-frequency grid, and keeps a
//! bounded, durable history of captures across power cycles.
//!
//! ## Architecture
//!
//! - **Acquisition**: trigger/sampling state machine over a pluggable
//!   sensor source
//! - **Processing**: spectral analyzer, spectrogram builder, statistics
//! - **Storage**: fixed-capacity ring of records with a persisted cursor
//! - **Session**: the one object owning live state and the command surface

pub mod acquisition;
pub mod clock;
pub mod config;
pub mod export;
pub mod processing;
pub mod session;
pub mod storage;
pub mod stream;
pub mod types;

// Re-export the command surface and commonly used types
pub use acquisition::{CaptureState, SampleSource, SyntheticSource, TriggerMode};
pub use clock::{SimulatedRtc, WallClock};
pub use config::CaptureConfig;
pub use session::{CaptureView, Session, SessionError};
pub use storage::{RecordStore, StorageError, StoreStats, STORE_CAPACITY};
pub use types::{AxisStats, RawCapture, Record, SAMPLES_PER_CAPTURE, SPECTRUM_BINS};
