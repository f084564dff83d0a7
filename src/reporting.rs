use std::fmt::Write;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::peak::{PeakEvent, PeakSnapshot};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M %Z";

/// Human-readable report of a snapshot.
pub fn format_state_report(s: &PeakSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Peak State Report ---");
    let _ = writeln!(out, "At: {}", s.at.format(TIME_FORMAT));
    let _ = writeln!(out, "Rate: {} ({} peaks loaded)", s.rate_code, s.event_count);
    let _ = writeln!(out, "State: {}", s.state);
    let _ = writeln!(out, "Pre-heat in progress: {}", yes_no(s.preheat_in_progress));
    let _ = writeln!(out, "Critical peak coming: {}", yes_no(s.critical_peak_coming));
    let _ = writeln!(out, "Current peak: {}", peak_line(s.current_peak.as_ref()));
    let _ = writeln!(out, "Next peak: {}", peak_line(s.next_peak.as_ref()));
    let _ = writeln!(
        out,
        "Next critical peak: {}",
        peak_line(s.next_critical_peak.as_ref())
    );
    if let Some(preheat) = &s.next_preheat {
        let _ = writeln!(
            out,
            "Next pre-heat: {} to {}",
            fmt_time(preheat.start_date),
            fmt_time(preheat.end_date)
        );
    }
    if let Some(anchor) = &s.next_anchor {
        let _ = writeln!(
            out,
            "Next anchor: {} to {}{}",
            fmt_time(anchor.start_date),
            fmt_time(anchor.end_date),
            if anchor.is_critical { " (critical)" } else { "" }
        );
    }
    let _ = writeln!(out, "Today AM: {}", peak_line(s.today_morning_peak.as_ref()));
    let _ = writeln!(out, "Today PM: {}", peak_line(s.today_evening_peak.as_ref()));
    let _ = writeln!(out, "Tomorrow AM: {}", peak_line(s.tomorrow_morning_peak.as_ref()));
    let _ = write!(out, "Tomorrow PM: {}", peak_line(s.tomorrow_evening_peak.as_ref()));
    out
}

pub fn print_state_report(snapshot: &PeakSnapshot) {
    println!("\n{}", format_state_report(snapshot));
}

fn peak_line(peak: Option<&PeakEvent>) -> String {
    match peak {
        Some(p) => format!(
            "{} {} to {}{}",
            p.offer(),
            fmt_time(p.start_date()),
            fmt_time(p.end_date()),
            if p.is_critical() { " (critical)" } else { "" }
        ),
        None => "none".to_string(),
    }
}

fn fmt_time(t: DateTime<Tz>) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::peak::time::parse_peak_datetime;
    use crate::peak::{Criticality, FixedClock, PeakHandler, PeakRecord, RateCodeMap};

    #[test]
    fn report_lists_state_and_next_peak() {
        let now = parse_peak_datetime("2024-12-15 15:00").expect("test date");
        let mut h = PeakHandler::with_clock(
            "DPC",
            120,
            Arc::new(RateCodeMap::residential()),
            FixedClock::new(now),
        );
        h.load_events(&[PeakRecord::new("TPC-DPC", "2024-12-15 16:00", "2024-12-15 20:00")
            .with_time_slot("PM")
            .with_criticality(Criticality::Forced(true))]);

        let report = format_state_report(&h.snapshot());
        assert!(report.contains("State: pre-heat in progress"));
        assert!(report.contains("Next peak: TPC-DPC 2024-12-15 16:00 EST to 2024-12-15 20:00 EST (critical)"));
        assert!(report.contains("Current peak: none"));
        assert!(report.contains("Next anchor: 2024-12-15 12:00 EST to 2024-12-15 14:00 EST (critical)"));
    }

    #[test]
    fn empty_handler_reports_off_season() {
        let now = parse_peak_datetime("2024-07-01 12:00").expect("test date");
        let h = PeakHandler::with_clock(
            "D",
            0,
            Arc::new(RateCodeMap::residential()),
            FixedClock::new(now),
        );
        let report = format_state_report(&h.snapshot());
        assert!(report.contains("State: off-season"));
        assert!(report.contains("Rate: D (0 peaks loaded)"));
        assert!(!report.contains("Next pre-heat"));
    }
}
