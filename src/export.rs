//! Bulk textual export of stored records.
//!
//! The export collaborator consumes this as a single text blob; the core
//! only renders it. Line format:
//!
//! ```text
//! === BEGIN EXPORT ===
//! RECORD_COUNT:<n>
//! EXPORT_TIME:<yyyy-MM-dd HH:mm:ss>
//! === RECORD <i> ===
//! TIMESTAMP:<yyyy-MM-dd HH:mm:ss>
//! SAMPLING_FREQ:<float>
//! PEAK_FREQ:<x>,<y>,<z>
//! TIME_DATA:
//! <ax>,<ay>,<az>            × N
//! SPECTRUM:
//! <freq>,<magX>,<magY>,<magZ> × N/2
//! === END EXPORT ===
//! ```

use crate::types::{Record, SAMPLES_PER_CAPTURE, SPECTRUM_BINS};
use chrono::NaiveDateTime;

/// Date-time rendering shared by export and streaming.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the bulk export for the given records, oldest first. `<i>` in
/// each record block is the 0-based logical index.
pub fn render_export(records: &[Record], exported_at: NaiveDateTime) -> String {
    // Pre-size for the dominant per-record data lines.
    let mut out =
        String::with_capacity(64 + records.len() * (SAMPLES_PER_CAPTURE + SPECTRUM_BINS) * 30);

    out.push_str("=== BEGIN EXPORT ===\n");
    out.push_str(&format!("RECORD_COUNT:{}\n", records.len()));
    out.push_str(&format!(
        "EXPORT_TIME:{}\n",
        exported_at.format(DATETIME_FORMAT)
    ));

    for (index, record) in records.iter().enumerate() {
        out.push_str(&format!("=== RECORD {index} ===\n"));
        out.push_str(&format!(
            "TIMESTAMP:{}\n",
            record.started_at.format(DATETIME_FORMAT)
        ));
        out.push_str(&format!("SAMPLING_FREQ:{:.2}\n", record.sampling_hz));
        out.push_str(&format!(
            "PEAK_FREQ:{:.2},{:.2},{:.2}\n",
            record.peak_hz[0], record.peak_hz[1], record.peak_hz[2]
        ));

        out.push_str("TIME_DATA:\n");
        for i in 0..record.samples[0].len() {
            out.push_str(&format!(
                "{:.5},{:.5},{:.5}\n",
                record.samples[0][i], record.samples[1][i], record.samples[2][i]
            ));
        }

        out.push_str("SPECTRUM:\n");
        for i in 0..record.spectra[0].len() {
            out.push_str(&format!(
                "{:.2},{:.5},{:.5},{:.5}\n",
                record.bin_frequency(i),
                record.spectra[0][i],
                record.spectra[1][i],
                record.spectra[2][i]
            ));
        }
    }

    out.push_str("=== END EXPORT ===\n");
    out
}
