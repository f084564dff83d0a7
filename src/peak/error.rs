//! Errors raised while turning raw records into peak events.

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;

/// Construction-time failure for a single peak record.
///
/// Query methods never produce these; they only surface from
/// [`PeakEvent::from_record`](super::event::PeakEvent::from_record) and are
/// collected per record by the handler's load step.
#[derive(Debug, Error)]
pub enum PeakError {
    /// A required field is absent under every accepted key.
    #[error("missing field `{field}` in peak record")]
    MissingField { field: &'static str },

    /// Neither the ISO-8601 nor the simple `YYYY-MM-DD HH:MM` parse succeeded.
    #[error("cannot parse date {value:?} (ISO error: {iso}, simple format error: {simple})")]
    DateParse {
        value: String,
        iso: chrono::ParseError,
        simple: chrono::ParseError,
    },

    /// The record's end does not come after its start.
    #[error("empty peak window: start {start} is not before end {end}")]
    EmptyWindow { start: DateTime<Tz>, end: DateTime<Tz> },
}
