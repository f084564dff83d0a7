//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use winter_peaks::peak::time::parse_peak_datetime;
use winter_peaks::peak::{Criticality, FixedClock, PeakHandler, PeakRecord, RateCodeMap};

/// Parses a local `YYYY-MM-DD HH:MM` (or ISO) instant.
pub fn at(s: &str) -> DateTime<Tz> {
    parse_peak_datetime(s).expect("fixture date should parse")
}

/// Empty residential handler for `rate`, frozen at `now`.
pub fn handler(rate: &str, preheat_minutes: u32, now: &str) -> PeakHandler<FixedClock> {
    PeakHandler::with_clock(
        rate,
        preheat_minutes,
        Arc::new(RateCodeMap::residential()),
        FixedClock::new(at(now)),
    )
}

/// Announced (critical) record.
pub fn critical(offer: &str, start: &str, end: &str, slot: &str) -> PeakRecord {
    PeakRecord::new(offer, start, end)
        .with_time_slot(slot)
        .with_sector("Résidentiel")
        .with_criticality(Criticality::Forced(true))
}

/// Regular (non-critical) record.
pub fn regular(offer: &str, start: &str, end: &str, slot: &str) -> PeakRecord {
    PeakRecord::new(offer, start, end)
        .with_time_slot(slot)
        .with_sector("Résidentiel")
        .with_criticality(Criticality::Forced(false))
}

/// The afternoon critical peak `[2024-12-15 13:00, 2024-12-15 17:00]`.
pub fn afternoon_critical_peak() -> PeakRecord {
    critical("TPC-DPC", "2024-12-15 13:00", "2024-12-15 17:00", "PM")
}

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// The open data response stored in `tests/fixtures/peak_events.json`.
pub fn fixture_response() -> serde_json::Value {
    let content = std::fs::read_to_string(fixture_path("peak_events.json"))
        .expect("fixture file should be readable");
    serde_json::from_str(&content).expect("fixture file should be valid JSON")
}
