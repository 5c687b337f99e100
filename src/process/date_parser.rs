use crate::decode::Cell;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Spreadsheet serial of 1970-01-01 (serial epoch is 1899-12-30).
const SERIAL_UNIX_EPOCH: f64 = 25569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;
/// Roughly chrono's ±262,000-year range, in milliseconds. Keeps the `as i64` cast meaningful.
const MAX_ABS_MILLIS: f64 = 8.2e15;

// `[0-9]` rather than `\d`: the latter also matches non-ASCII digits.
static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{1,2})[/-]([0-9]{1,2})[/-]([0-9]{4,})").expect("day-first regex is valid")
});
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("iso date regex is valid"));

/// A `YYYY-MM-DD` string as written to the `date`/`completion_date` columns.
///
/// Day-first input is reshuffled without range checks, so a value like
/// `2024-13-45` can exist; the backend rejects those rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalDate(String);

impl CanonicalDate {
    pub fn from_naive(date: NaiveDate) -> Self {
        CanonicalDate(date.format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalise a raw cell into a canonical date, or `None` if it is not a recognised date.
pub fn parse_date(raw: Option<&Cell>) -> Option<CanonicalDate> {
    match raw? {
        Cell::Number(serial) => serial_to_date(*serial),
        Cell::Text(s) => parse_date_str(s),
        Cell::Empty => None,
    }
}

/// Spreadsheet serial → UTC calendar day. Zero counts as "no value".
pub fn serial_to_date(serial: f64) -> Option<CanonicalDate> {
    if serial == 0.0 || !serial.is_finite() {
        return None;
    }
    let millis = ((serial - SERIAL_UNIX_EPOCH) * MILLIS_PER_DAY).round();
    if millis.abs() > MAX_ABS_MILLIS {
        return None;
    }
    let dt = DateTime::<Utc>::from_timestamp_millis(millis as i64)?;
    Some(CanonicalDate::from_naive(dt.date_naive()))
}

/// `D[D]/M[M]/YYYY` or `D[D]-M[M]-YYYY` (day first), or `YYYY-MM-DD…` truncated to the date.
/// Anything after the matched date (a time, say) is ignored.
pub fn parse_date_str(raw: &str) -> Option<CanonicalDate> {
    let s = raw.trim();

    if let Some(caps) = DAY_FIRST.captures(s) {
        return Some(CanonicalDate(format!(
            "{}-{:0>2}-{:0>2}",
            &caps[3], &caps[2], &caps[1]
        )));
    }

    if ISO_DATE.is_match(s) {
        return Some(CanonicalDate(s[..10].to_string()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn serials_count_days_from_unix_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        for serial in [1i64, 25569, 36526, 45000, 45352, 60000] {
            let expected = epoch + Duration::days(serial - 25569);
            assert_eq!(
                parse_date(Some(&Cell::Number(serial as f64))),
                Some(CanonicalDate::from_naive(expected)),
                "serial {}",
                serial
            );
        }
        assert_eq!(serial_to_date(45352.0).unwrap().as_str(), "2024-03-01");
    }

    #[test]
    fn fractional_serial_keeps_the_day() {
        // 2024-03-01 18:00
        assert_eq!(serial_to_date(45352.75).unwrap().as_str(), "2024-03-01");
    }

    #[test]
    fn zero_and_non_finite_serials_are_empty() {
        assert_eq!(serial_to_date(0.0), None);
        assert_eq!(serial_to_date(f64::NAN), None);
        assert_eq!(serial_to_date(f64::INFINITY), None);
        assert_eq!(serial_to_date(1e300), None);
        // past chrono's range but well inside i64 millis
        assert_eq!(serial_to_date(1e11), None);
        assert!(serial_to_date(2_958_465.0).is_some()); // 9999-12-31
    }

    #[test]
    fn day_first_strings() {
        assert_eq!(parse_date_str("05/03/2024").unwrap().as_str(), "2024-03-05");
        assert_eq!(parse_date_str("5-3-2024").unwrap().as_str(), "2024-03-05");
        assert_eq!(parse_date_str(" 1/12/2023 ").unwrap().as_str(), "2023-12-01");
        assert_eq!(
            parse_date_str("05/03/2024 14:30").unwrap().as_str(),
            "2024-03-05"
        );
    }

    #[test]
    fn day_first_does_not_range_check() {
        assert_eq!(parse_date_str("45/13/2024").unwrap().as_str(), "2024-13-45");
    }

    #[test]
    fn overlong_year_is_kept_whole() {
        // a mistyped year must not be cut down to a plausible one
        assert_eq!(parse_date_str("05/03/20245").unwrap().as_str(), "20245-03-05");
        assert_eq!(
            parse_date_str("05/03/20245 10:00").unwrap().as_str(),
            "20245-03-05"
        );
    }

    #[test]
    fn iso_strings_are_truncated() {
        assert_eq!(parse_date_str("2024-02-29").unwrap().as_str(), "2024-02-29");
        assert_eq!(
            parse_date_str("2024-02-29T13:45:00.000Z").unwrap().as_str(),
            "2024-02-29"
        );
    }

    #[test]
    fn unrecognised_inputs_are_none() {
        assert_eq!(parse_date(None), None);
        assert_eq!(parse_date(Some(&Cell::Empty)), None);
        assert_eq!(parse_date(Some(&text(""))), None);
        assert_eq!(parse_date(Some(&text("ontem"))), None);
        assert_eq!(parse_date(Some(&text("2024/02/01"))), None);
        assert_eq!(parse_date(Some(&text("01.02.2024"))), None);
        assert_eq!(parse_date(Some(&text("٠١/٠٢/٢٠٢٤"))), None);
    }

    #[test]
    fn serializes_as_plain_string() {
        let date = parse_date_str("01/02/2024").unwrap();
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-02-01\"");
    }
}
