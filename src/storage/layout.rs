//! Fixed binary layout for persisted records and the ring cursor.
//!
//! A record is a fixed-size metadata header immediately followed by the raw
//! samples and then the spectra, all little-endian with no length framing —
//! every size is a compile-time constant.
//!
//! ```text
//! header (72 bytes):
//!   i64  start time, Unix seconds
//!   f32  measured sampling frequency (Hz)
//!   f32  peak frequency × 3 (X, Y, Z)
//!   f32  {min, max, mean, sd} × 3 axes
//! raw samples: f32 × SAMPLES_PER_CAPTURE × 3 axes
//! spectra:     f32 × SPECTRUM_BINS × 3 axes
//! ```

use super::StorageError;
use crate::types::{AxisStats, Record, AXES, SAMPLES_PER_CAPTURE, SPECTRUM_BINS};
use chrono::DateTime;

/// Metadata header size in bytes.
pub const RECORD_HEADER_BYTES: usize = 8 + 4 + AXES * 4 + AXES * 4 * 4;

/// Raw sample block size in bytes.
pub const RAW_DATA_BYTES: usize = AXES * SAMPLES_PER_CAPTURE * 4;

/// Spectra block size in bytes.
pub const SPECTRA_BYTES: usize = AXES * SPECTRUM_BINS * 4;

/// Total size of one persisted record.
pub const RECORD_BYTES: usize = RECORD_HEADER_BYTES + RAW_DATA_BYTES + SPECTRA_BYTES;

/// Cursor record size: three little-endian u32 {count, oldest, newest}.
pub const CURSOR_BYTES: usize = 12;

// ============================================================================
// Record codec
// ============================================================================

/// Serialize a record into its fixed on-disk form.
pub fn encode_record(record: &Record) -> Vec<u8> {
    debug_assert!(record.samples.iter().all(|a| a.len() == SAMPLES_PER_CAPTURE));
    debug_assert!(record.spectra.iter().all(|a| a.len() == SPECTRUM_BINS));

    let mut buf = Vec::with_capacity(RECORD_BYTES);
    buf.extend_from_slice(&record.started_at.and_utc().timestamp().to_le_bytes());
    buf.extend_from_slice(&record.sampling_hz.to_le_bytes());
    for hz in record.peak_hz {
        buf.extend_from_slice(&hz.to_le_bytes());
    }
    for stats in record.stats {
        buf.extend_from_slice(&stats.min.to_le_bytes());
        buf.extend_from_slice(&stats.max.to_le_bytes());
        buf.extend_from_slice(&stats.mean.to_le_bytes());
        buf.extend_from_slice(&stats.sd.to_le_bytes());
    }
    for axis in &record.samples {
        for value in axis {
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
    for axis in &record.spectra {
        for value in axis {
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }

    debug_assert_eq!(buf.len(), RECORD_BYTES);
    buf
}

/// Deserialize a record from its fixed on-disk form.
pub fn decode_record(buf: &[u8]) -> Result<Record, StorageError> {
    if buf.len() != RECORD_BYTES {
        return Err(StorageError::Corrupt(format!(
            "record is {} bytes, expected {}",
            buf.len(),
            RECORD_BYTES
        )));
    }

    let mut pos = 0;
    let start_secs = read_i64(buf, &mut pos);
    let started_at = DateTime::from_timestamp(start_secs, 0)
        .ok_or_else(|| StorageError::Corrupt(format!("start time {start_secs} out of range")))?
        .naive_utc();

    let sampling_hz = read_f32(buf, &mut pos);
    let mut peak_hz = [0.0_f32; AXES];
    for hz in &mut peak_hz {
        *hz = read_f32(buf, &mut pos);
    }

    let mut stats = [AxisStats::default(); AXES];
    for axis in &mut stats {
        axis.min = read_f32(buf, &mut pos);
        axis.max = read_f32(buf, &mut pos);
        axis.mean = read_f32(buf, &mut pos);
        axis.sd = read_f32(buf, &mut pos);
    }

    let samples = std::array::from_fn(|_| read_f32_block(buf, &mut pos, SAMPLES_PER_CAPTURE));
    let spectra = std::array::from_fn(|_| read_f32_block(buf, &mut pos, SPECTRUM_BINS));

    Ok(Record {
        started_at,
        sampling_hz,
        peak_hz,
        stats,
        samples,
        spectra,
    })
}

// ============================================================================
// Cursor codec
// ============================================================================

/// Serialize ring cursors {count, oldest, newest}.
pub fn encode_cursor(count: usize, oldest: usize, newest: usize) -> [u8; CURSOR_BYTES] {
    let mut buf = [0_u8; CURSOR_BYTES];
    buf[0..4].copy_from_slice(&(count as u32).to_le_bytes());
    buf[4..8].copy_from_slice(&(oldest as u32).to_le_bytes());
    buf[8..12].copy_from_slice(&(newest as u32).to_le_bytes());
    buf
}

/// Parse ring cursors. Returns `None` when the buffer is truncated; range
/// validation is the caller's job (it knows the capacity).
pub fn decode_cursor(buf: &[u8]) -> Option<(usize, usize, usize)> {
    if buf.len() < CURSOR_BYTES {
        return None;
    }
    let count = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let oldest = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
    let newest = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
    Some((count, oldest, newest))
}

fn read_i64(buf: &[u8], pos: &mut usize) -> i64 {
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&buf[*pos..*pos + 8]);
    *pos += 8;
    i64::from_le_bytes(bytes)
}

fn read_f32(buf: &[u8], pos: &mut usize) -> f32 {
    let mut bytes = [0_u8; 4];
    bytes.copy_from_slice(&buf[*pos..*pos + 4]);
    *pos += 4;
    f32::from_le_bytes(bytes)
}

fn read_f32_block(buf: &[u8], pos: &mut usize, len: usize) -> Vec<f32> {
    (0..len).map(|_| read_f32(buf, pos)).collect()
}
