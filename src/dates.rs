//! Date parsing helpers shared by both decoders.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Serial of 9999-12-31, the last day Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Parses `raw` with a `strftime`-style `format`.
///
/// Formats that include a time of day are accepted; the time is dropped.
pub fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, format)
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, format).ok().map(|dt| dt.date()))
}

/// Converts an Excel serial day number to a date.
///
/// Returns `None` for serials outside Excel's calendar (below 1 or past
/// 9999-12-31) and for NaN or infinite values.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(TimeDelta::try_days(serial.trunc() as i64)?)
}
