//! Wall-clock seam.
//!
//! The real-time-clock chip lives outside the core; it surfaces here only
//! as get/set of the current date-time. Validation of externally supplied
//! values happens on this side of the seam so a bad set request leaves the
//! clock untouched.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Years the clock hardware accepts.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2099;

#[derive(Error, Debug)]
pub enum ClockError {
    #[error("Date-time field out of range: {field} = {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// Get/set access to the wall clock.
pub trait WallClock {
    fn now(&self) -> NaiveDateTime;
    fn set(&mut self, value: NaiveDateTime);
}

/// Validate externally supplied date-time fields and build the value to
/// hand to [`WallClock::set`]. Rejection leaves the clock unchanged by
/// construction — no `set` happens without a valid value.
pub fn datetime_from_fields(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<NaiveDateTime, ClockError> {
    if !YEAR_RANGE.contains(&year) {
        return Err(ClockError::OutOfRange {
            field: "year",
            value: i64::from(year),
        });
    }
    if !(1..=12).contains(&month) {
        return Err(ClockError::OutOfRange {
            field: "month",
            value: i64::from(month),
        });
    }
    if hour > 23 {
        return Err(ClockError::OutOfRange {
            field: "hour",
            value: i64::from(hour),
        });
    }
    if minute > 59 {
        return Err(ClockError::OutOfRange {
            field: "minute",
            value: i64::from(minute),
        });
    }
    if second > 59 {
        return Err(ClockError::OutOfRange {
            field: "second",
            value: i64::from(second),
        });
    }

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ClockError::OutOfRange {
        field: "day",
        value: i64::from(day),
    })?;

    // Hour/minute/second were range-checked above, so this cannot fail;
    // keep the fallible form anyway to avoid a panic path.
    date.and_hms_opt(hour, minute, second)
        .ok_or(ClockError::OutOfRange {
            field: "time",
            value: i64::from(hour),
        })
}

/// In-memory clock for tests and the simulation binary. Advances only when
/// told to.
#[derive(Debug, Clone)]
pub struct SimulatedRtc {
    now: NaiveDateTime,
}

impl SimulatedRtc {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Move the clock forward.
    pub fn advance(&mut self, duration: chrono::Duration) {
        self.now = self.now + duration;
    }
}

impl WallClock for SimulatedRtc {
    fn now(&self) -> NaiveDateTime {
        self.now
    }

    fn set(&mut self, value: NaiveDateTime) {
        self.now = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_fields_build_a_datetime() {
        let dt = datetime_from_fields(2024, 2, 29, 23, 59, 59).unwrap();
        assert_eq!(dt.to_string(), "2024-02-29 23:59:59");
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        assert!(datetime_from_fields(1999, 1, 1, 0, 0, 0).is_err());
        assert!(datetime_from_fields(2024, 13, 1, 0, 0, 0).is_err());
        assert!(datetime_from_fields(2024, 2, 30, 0, 0, 0).is_err());
        assert!(datetime_from_fields(2024, 1, 1, 24, 0, 0).is_err());
        assert!(datetime_from_fields(2024, 1, 1, 0, 60, 0).is_err());
        assert!(datetime_from_fields(2024, 1, 1, 0, 0, 60).is_err());
    }

    #[test]
    fn simulated_rtc_set_and_advance() {
        let start = datetime_from_fields(2024, 6, 1, 8, 0, 0).unwrap();
        let mut rtc = SimulatedRtc::new(start);
        rtc.advance(chrono::Duration::seconds(90));
        assert_eq!(rtc.now().to_string(), "2024-06-01 08:01:30");

        let later = datetime_from_fields(2025, 1, 1, 0, 0, 0).unwrap();
        rtc.set(later);
        assert_eq!(rtc.now(), later);
    }
}
