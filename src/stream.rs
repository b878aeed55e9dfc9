//! Streaming transport frames.
//!
//! The continuous link to a listener is abstract here: the core encodes
//! `*…*` frames and hands them to a [`FrameSink`]; transport and framing
//! recovery belong to the collaborator behind the sink.
//!
//! A full record streams as: one timestamp frame, a sample-clear marker,
//! one frame per sample, a spectrum-clear marker, one frame per bin, then
//! three peak frames (X, Y, Z).

use crate::export::DATETIME_FORMAT;
use crate::types::{Record, AXES};
use chrono::NaiveDateTime;

/// Receives encoded frames, one at a time.
pub trait FrameSink {
    fn send(&mut self, frame: &str);
}

/// Collecting sink for tests and buffered transports.
impl FrameSink for Vec<String> {
    fn send(&mut self, frame: &str) {
        self.push(frame.to_string());
    }
}

/// `*T<yyyy-MM-dd HH:mm:ss>*`
pub fn timestamp_frame(at: NaiveDateTime) -> String {
    format!("*T{}*", at.format(DATETIME_FORMAT))
}

/// Marker telling the listener to drop its sample series.
pub const SAMPLE_CLEAR_FRAME: &str = "*KC*";

/// Marker telling the listener to drop its spectrum series.
pub const SPECTRUM_CLEAR_FRAME: &str = "*HC*";

/// `*KX<t>Y<ax>,X<t>Y<ay>,X<t>Y<az>*` — one tri-axial sample at elapsed
/// microseconds `t`.
pub fn sample_frame(elapsed_us: u32, accel: [f32; AXES]) -> String {
    format!(
        "*KX{t}Y{:.5},X{t}Y{:.5},X{t}Y{:.5}*",
        accel[0],
        accel[1],
        accel[2],
        t = elapsed_us
    )
}

/// `*HX<freq>Y<magX>,X<freq>Y<magY>,X<freq>Y<magZ>*` — one spectrum bin.
pub fn spectrum_frame(freq_hz: f32, magnitudes: [f32; AXES]) -> String {
    format!(
        "*HX{f:.2}Y{:.5},X{f:.2}Y{:.5},X{f:.2}Y{:.5}*",
        magnitudes[0],
        magnitudes[1],
        magnitudes[2],
        f = freq_hz
    )
}

/// `*X<peak>*`, `*Y<peak>*`, `*Z<peak>*` — per-axis peak frequencies.
pub fn peak_frames(peak_hz: [f32; AXES]) -> [String; AXES] {
    [
        format!("*X{:.2}*", peak_hz[0]),
        format!("*Y{:.2}*", peak_hz[1]),
        format!("*Z{:.2}*", peak_hz[2]),
    ]
}

/// Stream one record through the sink.
///
/// Stored records carry no per-sample timestamps, so elapsed times are
/// reconstructed from the measured sampling frequency.
pub fn stream_record(record: &Record, sink: &mut dyn FrameSink) {
    sink.send(&timestamp_frame(record.started_at));

    sink.send(SAMPLE_CLEAR_FRAME);
    let period_us = 1e6 / f64::from(record.sampling_hz);
    for i in 0..record.samples[0].len() {
        let elapsed_us = (i as f64 * period_us).round() as u32;
        sink.send(&sample_frame(
            elapsed_us,
            [
                record.samples[0][i],
                record.samples[1][i],
                record.samples[2][i],
            ],
        ));
    }

    sink.send(SPECTRUM_CLEAR_FRAME);
    for i in 0..record.spectra[0].len() {
        sink.send(&spectrum_frame(
            record.bin_frequency(i),
            [
                record.spectra[0][i],
                record.spectra[1][i],
                record.spectra[2][i],
            ],
        ));
    }

    for frame in peak_frames(record.peak_hz) {
        sink.send(&frame);
    }
}
