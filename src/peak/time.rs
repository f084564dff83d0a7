//! Time zone helpers and the two-tier date parser for peak records.
//!
//! Every instant handled by the engine lives in America/Toronto. Naive
//! input is localized there (never read as UTC) and offset-carrying input is
//! converted.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::America::Toronto;
use chrono_tz::Tz;

use super::error::PeakError;

/// Zone every peak instant is expressed in.
pub const PEAK_TZ: Tz = Toronto;

/// Fallback format the upstream feed has historically emitted.
pub const SIMPLE_FORMAT: &str = "%Y-%m-%d %H:%M";

const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const ISO_NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Current instant in the peak zone.
pub fn now_local() -> DateTime<Tz> {
    Utc::now().with_timezone(&PEAK_TZ)
}

/// Converts an instant from any zone into the peak zone.
pub fn to_peak_tz<Z: TimeZone>(instant: &DateTime<Z>) -> DateTime<Tz> {
    instant.with_timezone(&PEAK_TZ)
}

/// Attaches the peak zone to a naive local date-time.
///
/// A local time repeated by the autumn change resolves to the earlier
/// instant. A local time skipped by the spring change keeps the offset that
/// was in force just before the gap, so `02:30` on a spring-forward night
/// lands on `03:30` daylight time.
pub fn localize(naive: NaiveDateTime) -> DateTime<Tz> {
    match PEAK_TZ.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before_gap = naive - Duration::hours(1);
            let offset_secs = PEAK_TZ
                .offset_from_local_datetime(&before_gap)
                .earliest()
                .map_or_else(
                    || PEAK_TZ.offset_from_utc_datetime(&naive).fix(),
                    |offset| offset.fix(),
                )
                .local_minus_utc();
            let utc = naive - Duration::seconds(i64::from(offset_secs));
            PEAK_TZ.from_utc_datetime(&utc)
        }
    }
}

/// Local instant at `hour:00` on `date` in the peak zone.
pub fn local_instant(date: NaiveDate, hour: u32) -> DateTime<Tz> {
    localize(date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour)))
}

/// Parses a peak record date.
///
/// Strict ISO-8601 is tried first (offset or `Z` suffix, `T` or space
/// separator with seconds, `T` separator without seconds, or a bare date).
/// If that fails the simple `YYYY-MM-DD HH:MM` form is read as local
/// America/Toronto time.
///
/// # Errors
///
/// Returns [`PeakError::DateParse`] carrying both underlying parse errors
/// when neither form matches.
///
/// # Examples
///
/// ```
/// use winter_peaks::peak::time::parse_peak_datetime;
///
/// let iso = parse_peak_datetime("2024-12-15T13:00:00").expect("iso form");
/// let simple = parse_peak_datetime("2024-12-15 13:00").expect("simple form");
/// assert_eq!(iso, simple);
/// ```
pub fn parse_peak_datetime(value: &str) -> Result<DateTime<Tz>, PeakError> {
    let value = value.trim();
    let iso = match parse_iso(value) {
        Ok(dt) => return Ok(dt),
        Err(err) => err,
    };

    match NaiveDateTime::parse_from_str(value, SIMPLE_FORMAT) {
        Ok(naive) => Ok(localize(naive)),
        Err(simple) => Err(PeakError::DateParse {
            value: value.to_owned(),
            iso,
            simple,
        }),
    }
}

fn parse_iso(value: &str) -> Result<DateTime<Tz>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(to_peak_tz(&dt));
    }
    for fmt in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Ok(to_peak_tz(&dt));
        }
    }
    for fmt in ISO_NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(localize(naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|date| localize(date.and_time(NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    fn naive(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("test literal")
    }

    #[test]
    fn naive_iso_is_local_not_utc() {
        let dt = parse_peak_datetime("2024-12-15T13:00:00").expect("parses");
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.offset().fix().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn offset_iso_is_converted_to_toronto() {
        let dt = parse_peak_datetime("2024-12-15T18:00:00+00:00").expect("parses");
        assert_eq!(dt.timezone(), PEAK_TZ);
        assert_eq!(dt.hour(), 13);
    }

    #[test]
    fn zulu_suffix_is_accepted() {
        let dt = parse_peak_datetime("2024-12-15T18:00:00Z").expect("parses");
        assert_eq!(dt.hour(), 13);
    }

    #[test]
    fn space_separated_iso_with_seconds_parses() {
        let a = parse_peak_datetime("2024-12-15 13:00:00").expect("parses");
        let b = parse_peak_datetime("2024-12-15 13:00").expect("parses");
        assert_eq!(a, b);
    }

    #[test]
    fn bare_date_is_local_midnight() {
        let dt = parse_peak_datetime("2024-12-15").expect("parses");
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 15).expect("date"));
    }

    #[test]
    fn garbage_reports_both_errors() {
        let err = parse_peak_datetime("15/12/2024 1pm").expect_err("must fail");
        match err {
            PeakError::DateParse { value, .. } => assert_eq!(value, "15/12/2024 1pm"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ambiguous_local_time_takes_earlier_instant() {
        // 2024-11-03 01:30 happens twice in Toronto.
        let dt = localize(naive("2024-11-03 01:30"));
        assert_eq!(dt.offset().fix().local_minus_utc(), -4 * 3600);
    }

    #[test]
    fn skipped_local_time_keeps_pre_gap_offset() {
        // 2024-03-10 02:30 does not exist in Toronto.
        let dt = localize(naive("2024-03-10 02:30"));
        assert_eq!(dt.hour(), 3);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.offset().fix().local_minus_utc(), -4 * 3600);
    }

    #[test]
    fn local_instant_builds_probe_hours() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).expect("date");
        assert_eq!(local_instant(date, 6).hour(), 6);
        assert_eq!(local_instant(date, 16).hour(), 16);
    }
}
