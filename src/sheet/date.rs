//! Workbook date serial conversions.
//!
//! Workbook dates are stored as day counts from the 1900 epoch with the
//! time of day in the fractional part. Serial 1 is 1900-01-01, so the
//! effective epoch for arithmetic is 1899-12-30 (the epoch carries the
//! fictitious 1900-02-29 of the original Lotus format; serials below 61
//! are one day off from a proleptic calendar and are accepted as-is).

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

const SECONDS_PER_DAY: f64 = 86_400.0;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch date")
}

/// Convert a calendar date to its workbook serial number.
pub fn date_to_serial(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}

/// Convert a date-time to its workbook serial number.
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    let days = (dt.date() - epoch()).num_days() as f64;
    let secs = dt.num_seconds_from_midnight() as f64;
    days + secs / SECONDS_PER_DAY
}

/// Decode a workbook serial number to a date-time.
///
/// Returns `None` for serials outside chrono's representable range.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }

    let days = serial.floor();
    let frac = serial - days;
    // Round to whole seconds; workbook UIs do not show sub-second time
    let secs = (frac * SECONDS_PER_DAY).round() as i64;

    let date = epoch().checked_add_signed(Duration::days(days as i64))?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    midnight.checked_add_signed(Duration::seconds(secs))
}

/// Decode a workbook serial number to a calendar date.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    serial_to_datetime(serial).map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let serial = date_to_serial(date);
        assert_eq!(serial_to_date(serial), Some(date));
    }

    #[test]
    fn test_known_serial() {
        // 2020-01-01 is serial 43831 in the 1900 date system
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(date_to_serial(date), 43831.0);
    }

    #[test]
    fn test_datetime_round_trip() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(13, 45, 30)
            .unwrap();
        let serial = datetime_to_serial(dt);
        assert_eq!(serial_to_datetime(serial), Some(dt));
    }

    #[test]
    fn test_midnight_fraction() {
        let dt = serial_to_datetime(43831.5).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2020-01-01 12:00:00");
    }
}
