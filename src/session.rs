//! The logger session: one explicit object owning the live capture state,
//! the store handle, the clock, and the current view.
//!
//! Everything the external command channel may invoke is a method here:
//! request-capture, get/set wall clock, bulk export, store stats, and
//! record browsing. The session is single-threaded and advanced by
//! [`Session::tick`] from the host's cooperative loop.
//!
//! Mutual exclusion between the live buffer's writer and record browsing
//! is enforced by the state machine: SAMPLING is the only state that
//! writes the live buffer, and [`Session::load_record`] refuses to run in
//! that state.

use crate::acquisition::{AcquisitionError, CaptureState, Controller, SampleSource};
use crate::clock::{datetime_from_fields, ClockError, WallClock};
use crate::config::CaptureConfig;
use crate::export;
use crate::processing::{
    capture_statistics, ProcessingError, SpectralAnalyzer, Spectrogram, SpectrogramBuilder,
};
use crate::storage::{RecordStore, StorageError, StoreStats, RECORD_BYTES, STORE_CAPACITY};
use crate::stream::{self, FrameSink};
use crate::types::{total_magnitude, Record};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum SessionError {
    /// Record browsing is not available while the live buffer is being
    /// written.
    #[error("Capture in progress")]
    CaptureInProgress,

    /// No capture has completed or been loaded yet.
    #[error("No capture available")]
    NoCapture,

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// A record together with its display spectrogram.
///
/// The spectrogram is rebuilt on every view change and never persisted;
/// the statistics inside the record are the ones computed at acquisition
/// time and are never recomputed on load.
pub struct CaptureView {
    pub record: Record,
    pub spectrogram: Spectrogram,
}

/// One logger session.
pub struct Session<S: SampleSource, C: WallClock> {
    controller: Controller,
    source: S,
    clock: C,
    analyzer: SpectralAnalyzer,
    spectrogram_builder: SpectrogramBuilder,
    /// `None` after a failed mount: the store degrades to a no-op sink.
    store: Option<RecordStore>,
    current: Option<CaptureView>,
}

impl<S: SampleSource, C: WallClock> Session<S, C> {
    /// Build a session from config, a sensor source, and a wall clock.
    ///
    /// A storage mount failure is reported here, once, and the session
    /// continues with the store as a no-op sink — captures still run and
    /// analyze, they just are not persisted.
    pub fn new(config: &CaptureConfig, source: S, clock: C) -> Result<Self, SessionError> {
        let controller = Controller::new(
            config.acquisition.trigger_mode,
            config.acquisition.min_sample_interval_us,
            config.acquisition.trigger_threshold,
        );

        let store = match RecordStore::open(&config.storage.data_dir) {
            Ok(store) => Some(store),
            Err(e) => {
                error!(error = %e, "storage unavailable, records will not be persisted");
                None
            }
        };

        Ok(Self {
            controller,
            source,
            clock,
            analyzer: SpectralAnalyzer::new()?,
            spectrogram_builder: SpectrogramBuilder::new()?,
            store,
            current: None,
        })
    }

    // ========================================================================
    // Command surface
    // ========================================================================

    /// Arm the controller for the next capture.
    pub fn request_capture(&mut self) -> Result<(), SessionError> {
        self.controller.arm()?;
        Ok(())
    }

    /// Current wall-clock time.
    pub fn current_time(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Set the wall clock from externally supplied fields. Out-of-range
    /// values are rejected and the clock is left unchanged.
    pub fn set_time(
        &mut self,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<(), SessionError> {
        let value = datetime_from_fields(year, month, day, hour, minute, second)?;
        self.clock.set(value);
        info!(%value, "wall clock set");
        Ok(())
    }

    /// Render the bulk export of every stored record, oldest first.
    pub fn export_all(&self) -> Result<String, SessionError> {
        let records = match &self.store {
            Some(store) => {
                let mut records = Vec::with_capacity(store.count());
                for index in 0..store.count() {
                    records.push(store.read_by_logical_index(index)?);
                }
                records
            }
            None => Vec::new(),
        };
        Ok(export::render_export(&records, self.clock.now()))
    }

    /// Store occupancy. A no-op-sink store reports zero records.
    pub fn store_stats(&self) -> StoreStats {
        match &self.store {
            Some(store) => store.stats(),
            None => StoreStats {
                count: 0,
                capacity: STORE_CAPACITY,
                used_bytes: 0,
                total_bytes: STORE_CAPACITY * RECORD_BYTES,
            },
        }
    }

    /// Number of stored records.
    pub fn record_count(&self) -> usize {
        self.store.as_ref().map_or(0, RecordStore::count)
    }

    /// Remove every stored record.
    pub fn delete_all_records(&mut self) -> Result<(), SessionError> {
        if let Some(store) = &mut self.store {
            store.delete_all()?;
        }
        Ok(())
    }

    /// Load a stored record by logical index into the current view,
    /// rebuilding its spectrogram. Refused while sampling — the state
    /// machine keeps the live buffer single-writer.
    pub fn load_record(&mut self, index: usize) -> Result<&CaptureView, SessionError> {
        if self.controller.state() == CaptureState::Sampling {
            return Err(SessionError::CaptureInProgress);
        }
        let store = self.store.as_ref().ok_or(StorageError::NotFound {
            index,
            count: 0,
        })?;

        let record = store.read_by_logical_index(index)?;
        let spectrogram = self
            .spectrogram_builder
            .build(&total_magnitude(&record.samples))?;

        debug!(index, "stored record loaded");
        self.current = Some(CaptureView {
            record,
            spectrogram,
        });
        Ok(self.current.as_ref().ok_or(SessionError::NoCapture)?)
    }

    /// Stream the current view's record through a frame sink.
    pub fn stream_current(&self, sink: &mut dyn FrameSink) -> Result<(), SessionError> {
        let view = self.current.as_ref().ok_or(SessionError::NoCapture)?;
        stream::stream_record(&view.record, sink);
        Ok(())
    }

    // ========================================================================
    // Tick loop
    // ========================================================================

    /// Advance the session by one cooperative tick. `now_us` is a
    /// monotonic microsecond timestamp from the host loop.
    ///
    /// When a capture completes, the session analyzes it, makes it the
    /// current view, and appends it to the store; the append error, if
    /// any, is surfaced after the view is already updated so a storage
    /// fault cannot lose the analysis.
    pub fn tick(&mut self, now_us: u64) -> Result<CaptureState, SessionError> {
        let state = self
            .controller
            .tick(&mut self.source, &self.clock, now_us);
        if state == CaptureState::Done {
            self.finish_capture()?;
        }
        Ok(self.controller.state())
    }

    /// Current capture/browse view, if any.
    pub fn current(&self) -> Option<&CaptureView> {
        self.current.as_ref()
    }

    /// Acquisition state, for the host shell.
    pub fn capture_state(&self) -> CaptureState {
        self.controller.state()
    }

    /// Mutable access to the sensor source (trigger simulation, tests).
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn finish_capture(&mut self) -> Result<(), SessionError> {
        let capture = self.controller.capture();
        let started_at = self
            .controller
            .started_at()
            .unwrap_or_else(|| self.clock.now());

        let analysis = self.analyzer.analyze(capture)?;
        let stats = capture_statistics(&capture.axes);
        let spectrogram = self.spectrogram_builder.build(&capture.total_magnitude())?;

        let record = Record {
            started_at,
            sampling_hz: analysis.sampling_hz as f32,
            peak_hz: [
                analysis.axes[0].peak_hz,
                analysis.axes[1].peak_hz,
                analysis.axes[2].peak_hz,
            ],
            stats,
            samples: capture.axes.clone(),
            spectra: [
                analysis.axes[0].magnitudes.clone(),
                analysis.axes[1].magnitudes.clone(),
                analysis.axes[2].magnitudes.clone(),
            ],
        };

        self.current = Some(CaptureView {
            record: record.clone(),
            spectrogram,
        });
        self.controller.acknowledge();

        if let Some(store) = &mut self.store {
            let slot = store.append(&record)?;
            info!(slot, sampling_hz = record.sampling_hz, "capture persisted");
        } else {
            debug!("store unavailable, capture not persisted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{SyntheticSource, TriggerMode};
    use crate::clock::SimulatedRtc;
    use crate::types::SAMPLES_PER_CAPTURE;
    use chrono::NaiveDate;

    fn test_clock() -> SimulatedRtc {
        SimulatedRtc::new(
            NaiveDate::from_ymd_opt(2024, 5, 10)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        )
    }

    fn test_config(dir: &std::path::Path) -> CaptureConfig {
        let mut config = CaptureConfig::default();
        config.storage.data_dir = dir.to_path_buf();
        config
    }

    fn run_one_capture(session: &mut Session<SyntheticSource, SimulatedRtc>) {
        session.request_capture().unwrap();
        let mut now_us = 0;
        for _ in 0..SAMPLES_PER_CAPTURE + 8 {
            session.tick(now_us).unwrap();
            now_us += 5000;
        }
        assert_eq!(session.capture_state(), CaptureState::Idle);
    }

    #[test]
    fn capture_cycle_persists_and_views() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(
            &test_config(dir.path()),
            SyntheticSource::sine(1.0, 20.0, 200.0),
            test_clock(),
        )
        .unwrap();

        run_one_capture(&mut session);

        assert_eq!(session.record_count(), 1);
        let view = session.current().unwrap();
        assert!((view.record.sampling_hz - 200.0).abs() < 0.1);
        assert!((view.record.peak_hz[0] - 20.0).abs() < 0.2);
        assert!(view.spectrogram.segment_count() >= 1);
    }

    #[test]
    fn set_time_validates_and_applies() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(
            &test_config(dir.path()),
            SyntheticSource::sine(1.0, 20.0, 200.0),
            test_clock(),
        )
        .unwrap();

        let before = session.current_time();
        assert!(session.set_time(2024, 13, 1, 0, 0, 0).is_err());
        assert_eq!(session.current_time(), before, "rejected set leaves clock unchanged");

        session.set_time(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(session.current_time().to_string(), "2025-01-02 03:04:05");
    }

    #[test]
    fn load_is_refused_while_sampling() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(
            &test_config(dir.path()),
            SyntheticSource::sine(1.0, 20.0, 200.0),
            test_clock(),
        )
        .unwrap();

        run_one_capture(&mut session);

        session.request_capture().unwrap();
        session.tick(0).unwrap();
        assert_eq!(session.capture_state(), CaptureState::Sampling);
        assert!(matches!(
            session.load_record(0),
            Err(SessionError::CaptureInProgress)
        ));
    }

    #[test]
    fn loaded_record_keeps_persisted_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(
            &test_config(dir.path()),
            SyntheticSource::tones([0.0; 3], [0.0; 3], [0.5, 0.0, 0.0], 200.0),
            test_clock(),
        )
        .unwrap();

        run_one_capture(&mut session);
        let saved_stats = session.current().unwrap().record.stats;
        assert_eq!(saved_stats[0].mean, 0.5);
        assert_eq!(saved_stats[0].sd, 0.0);

        let view = session.load_record(0).unwrap();
        assert_eq!(view.record.stats, saved_stats);
    }

    #[test]
    fn export_covers_all_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(
            &test_config(dir.path()),
            SyntheticSource::sine(1.0, 20.0, 200.0),
            test_clock(),
        )
        .unwrap();

        run_one_capture(&mut session);
        run_one_capture(&mut session);

        let text = session.export_all().unwrap();
        assert!(text.contains("RECORD_COUNT:2\n"));
        assert_eq!(text.matches("=== RECORD ").count(), 2);
    }

    #[test]
    fn external_trigger_flows_through_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.acquisition.trigger_mode = TriggerMode::External;
        let mut session = Session::new(
            &config,
            SyntheticSource::sine(1.0, 20.0, 200.0),
            test_clock(),
        )
        .unwrap();

        session.request_capture().unwrap();
        session.tick(0).unwrap();
        assert_eq!(session.capture_state(), CaptureState::Armed);

        session.source_mut().set_trigger_level(4095);
        session.tick(5000).unwrap();
        assert_eq!(session.capture_state(), CaptureState::Sampling);
    }

    #[test]
    fn stream_current_requires_a_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(
            &test_config(dir.path()),
            SyntheticSource::sine(1.0, 20.0, 200.0),
            test_clock(),
        )
        .unwrap();

        let mut frames: Vec<String> = Vec::new();
        assert!(matches!(
            session.stream_current(&mut frames),
            Err(SessionError::NoCapture)
        ));

        run_one_capture(&mut session);
        session.stream_current(&mut frames).unwrap();
        assert!(!frames.is_empty());
    }
}
