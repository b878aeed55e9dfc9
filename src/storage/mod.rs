//! Durable record store: a fixed-capacity ring of capture records.
//!
//! Each record occupies one slot file in the store directory; a small
//! cursor file carries the ring bookkeeping {count, oldest, newest} and is
//! rewritten after every append or wipe. A missing, truncated, or
//! inconsistent cursor resets the store to empty on open — stale slot
//! files are then simply overwritten as the ring refills.

pub mod layout;
pub mod ring;

pub use layout::{CURSOR_BYTES, RECORD_BYTES, RECORD_HEADER_BYTES};
pub use ring::{Advance, SlotRing};

use crate::types::Record;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of physical record slots.
pub const STORE_CAPACITY: usize = 30;

/// File carrying the persisted ring cursors.
const CURSOR_FILE: &str = "cursor.bin";

/// Errors raised by the record store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The store directory could not be prepared or its cursor read at
    /// startup. Reported once; the session then treats the store as a
    /// no-op sink.
    #[error("Storage mount failed: {0}")]
    Mount(String),

    /// Logical index outside `[0, count)`.
    #[error("No record at logical index {index} (store holds {count})")]
    NotFound { index: usize, count: usize },

    /// A single read or write failed. Ring bookkeeping is unaffected: the
    /// cursor is only rewritten after a successful data write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Slot file contents do not match the fixed record layout.
    #[error("Record data corrupt: {0}")]
    Corrupt(String),
}

/// Occupancy report for the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub count: usize,
    pub capacity: usize,
    pub used_bytes: usize,
    pub total_bytes: usize,
}

/// Fixed-capacity durable ring of capture records.
pub struct RecordStore {
    dir: PathBuf,
    ring: SlotRing,
}

impl RecordStore {
    /// Open the store in `dir`, creating the directory if needed and
    /// restoring the ring cursors from the cursor file.
    ///
    /// Fail-safe: an unreadable or invalid cursor empties the store rather
    /// than guessing at its contents.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::Mount(format!("{}: {e}", dir.display())))?;

        let ring = match fs::read(dir.join(CURSOR_FILE)) {
            Ok(bytes) => match layout::decode_cursor(&bytes)
                .and_then(|(count, oldest, newest)| {
                    SlotRing::restore(STORE_CAPACITY, count, oldest, newest)
                }) {
                Some(ring) => ring,
                None => {
                    warn!("cursor record invalid, resetting store to empty");
                    SlotRing::new(STORE_CAPACITY)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => SlotRing::new(STORE_CAPACITY),
            Err(e) => {
                return Err(StorageError::Mount(format!(
                    "failed to read cursor record: {e}"
                )))
            }
        };

        info!(
            dir = %dir.display(),
            count = ring.count(),
            capacity = STORE_CAPACITY,
            "record store opened"
        );
        Ok(Self { dir, ring })
    }

    /// Number of records currently stored.
    pub fn count(&self) -> usize {
        self.ring.count()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Append a record, evicting the oldest when the ring is full.
    /// Returns the physical slot written.
    ///
    /// The slot file is written first; the ring advances and the cursor is
    /// rewritten only after that write succeeds.
    pub fn append(&mut self, record: &Record) -> Result<usize, StorageError> {
        let slot = self.ring.next_slot();
        fs::write(self.slot_path(slot), layout::encode_record(record))?;

        let advance = self.ring.advance();
        debug_assert_eq!(advance.slot, slot);
        if let Some(evicted) = advance.evicted {
            debug!(slot = evicted, "evicted oldest record");
        }
        self.write_cursor()?;

        debug!(slot, count = self.ring.count(), "record appended");
        Ok(slot)
    }

    /// Read by logical index: 0 is the oldest record, `count − 1` the
    /// newest.
    pub fn read_by_logical_index(&self, index: usize) -> Result<Record, StorageError> {
        let slot = self
            .ring
            .slot_for_logical(index)
            .ok_or(StorageError::NotFound {
                index,
                count: self.ring.count(),
            })?;
        let bytes = fs::read(self.slot_path(slot))?;
        layout::decode_record(&bytes)
    }

    /// Remove every record and reset the ring cursors. Idempotent.
    pub fn delete_all(&mut self) -> Result<(), StorageError> {
        for slot in 0..STORE_CAPACITY {
            match fs::remove_file(self.slot_path(slot)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::Io(e)),
            }
        }
        self.ring.clear();
        self.write_cursor()?;
        info!("record store wiped");
        Ok(())
    }

    /// Occupancy derived from the compile-time record size.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            count: self.ring.count(),
            capacity: STORE_CAPACITY,
            used_bytes: self.ring.count() * RECORD_BYTES,
            total_bytes: STORE_CAPACITY * RECORD_BYTES,
        }
    }

    fn slot_path(&self, slot: usize) -> PathBuf {
        self.dir.join(format!("slot_{slot:02}.bin"))
    }

    fn write_cursor(&self) -> Result<(), StorageError> {
        let cursor = layout::encode_cursor(
            self.ring.count(),
            self.ring.oldest_slot(),
            self.ring.newest_slot(),
        );
        fs::write(self.dir.join(CURSOR_FILE), cursor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AxisStats, SAMPLES_PER_CAPTURE, SPECTRUM_BINS};
    use chrono::NaiveDate;

    fn make_record(seq: u32) -> Record {
        let started_at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, seq.min(59))
            .unwrap();
        Record {
            started_at,
            sampling_hz: 200.0,
            peak_hz: [seq as f32, 2.0 * seq as f32, 3.0 * seq as f32],
            stats: [AxisStats { min: -1.0, max: 1.0, mean: 0.0, sd: 0.5 }; 3],
            samples: std::array::from_fn(|_| vec![seq as f32 * 0.1; SAMPLES_PER_CAPTURE]),
            spectra: std::array::from_fn(|_| vec![seq as f32 * 0.01; SPECTRUM_BINS]),
        }
    }

    #[test]
    fn append_then_read_newest_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::open(dir.path()).unwrap();

        let record = make_record(7);
        store.append(&record).unwrap();

        let loaded = store.read_by_logical_index(store.count() - 1).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn read_out_of_range_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.read_by_logical_index(0),
            Err(StorageError::NotFound { index: 0, count: 0 })
        ));

        store.append(&make_record(1)).unwrap();
        assert!(matches!(
            store.read_by_logical_index(1),
            Err(StorageError::NotFound { index: 1, count: 1 })
        ));
    }

    #[test]
    fn overflow_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::open(dir.path()).unwrap();

        for seq in 0..=STORE_CAPACITY as u32 {
            store.append(&make_record(seq)).unwrap();
        }

        assert_eq!(store.count(), STORE_CAPACITY);
        // The first append was evicted; logical 0 is now the second one.
        let oldest = store.read_by_logical_index(0).unwrap();
        assert_eq!(oldest.peak_hz[0], 1.0);
    }

    #[test]
    fn delete_all_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::open(dir.path()).unwrap();
        store.append(&make_record(1)).unwrap();
        store.append(&make_record(2)).unwrap();

        store.delete_all().unwrap();
        assert_eq!(store.count(), 0);
        store.delete_all().unwrap();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn cursors_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = RecordStore::open(dir.path()).unwrap();
            store.append(&make_record(1)).unwrap();
            store.append(&make_record(2)).unwrap();
        }

        let store = RecordStore::open(dir.path()).unwrap();
        assert_eq!(store.count(), 2);
        assert_eq!(store.read_by_logical_index(1).unwrap().peak_hz[0], 2.0);
    }

    #[test]
    fn truncated_cursor_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = RecordStore::open(dir.path()).unwrap();
            store.append(&make_record(1)).unwrap();
        }

        fs::write(dir.path().join(CURSOR_FILE), [1, 0, 0]).unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn out_of_range_cursor_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cursor = layout::encode_cursor(STORE_CAPACITY + 5, 0, 0);
        fs::write(dir.path().join(CURSOR_FILE), cursor).unwrap();

        let store = RecordStore::open(dir.path()).unwrap();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn stats_report_fixed_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::open(dir.path()).unwrap();
        store.append(&make_record(1)).unwrap();

        let stats = store.stats();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.capacity, STORE_CAPACITY);
        assert_eq!(stats.used_bytes, RECORD_BYTES);
        assert_eq!(stats.total_bytes, STORE_CAPACITY * RECORD_BYTES);
    }

    #[test]
    fn corrupt_slot_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::open(dir.path()).unwrap();
        store.append(&make_record(1)).unwrap();

        fs::write(dir.path().join("slot_00.bin"), [0_u8; 16]).unwrap();
        assert!(matches!(
            store.read_by_logical_index(0),
            Err(StorageError::Corrupt(_))
        ));
    }
}
