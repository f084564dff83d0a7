//! API response and query types.
//!
//! Instants are RFC 3339 strings carrying their America/Toronto offset.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::peak::{AnchorPeriod, PeakEvent, PeakSnapshot, PeakState, PreHeatPeriod};

/// Every derived value at one instant.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub at: String,
    pub rate_code: String,
    pub event_count: usize,
    pub state: PeakState,
    pub preheat_in_progress: bool,
    pub critical_peak_coming: bool,
    pub current_peak: Option<PeakView>,
    pub next_peak: Option<PeakView>,
    pub next_critical_peak: Option<PeakView>,
    pub next_preheat: Option<WindowView>,
    pub next_anchor: Option<AnchorView>,
    pub today_morning_peak: Option<PeakView>,
    pub today_evening_peak: Option<PeakView>,
    pub tomorrow_morning_peak: Option<PeakView>,
    pub tomorrow_evening_peak: Option<PeakView>,
}

impl From<&PeakSnapshot> for StateResponse {
    fn from(s: &PeakSnapshot) -> Self {
        Self {
            at: s.at.to_rfc3339(),
            rate_code: s.rate_code.clone(),
            event_count: s.event_count,
            state: s.state,
            preheat_in_progress: s.preheat_in_progress,
            critical_peak_coming: s.critical_peak_coming,
            current_peak: s.current_peak.as_ref().map(PeakView::from),
            next_peak: s.next_peak.as_ref().map(PeakView::from),
            next_critical_peak: s.next_critical_peak.as_ref().map(PeakView::from),
            next_preheat: s.next_preheat.as_ref().map(WindowView::from),
            next_anchor: s.next_anchor.as_ref().map(AnchorView::from),
            today_morning_peak: s.today_morning_peak.as_ref().map(PeakView::from),
            today_evening_peak: s.today_evening_peak.as_ref().map(PeakView::from),
            tomorrow_morning_peak: s.tomorrow_morning_peak.as_ref().map(PeakView::from),
            tomorrow_evening_peak: s.tomorrow_evening_peak.as_ref().map(PeakView::from),
        }
    }
}

/// Public view of one peak.
///
/// `time_slot` and `sector` use the feed labels (`AM`, `Résidentiel`, ...),
/// empty when unknown.
#[derive(Debug, Serialize)]
pub struct PeakView {
    pub offer: String,
    pub start: String,
    pub end: String,
    pub time_slot: String,
    pub sector: String,
    pub duration: Option<String>,
    pub critical: bool,
    pub preheat: WindowView,
    pub anchor: AnchorView,
}

impl From<&PeakEvent> for PeakView {
    fn from(e: &PeakEvent) -> Self {
        Self {
            offer: e.offer().to_string(),
            start: e.start_date().to_rfc3339(),
            end: e.end_date().to_rfc3339(),
            time_slot: e.time_slot().label().to_string(),
            sector: e.sector().label().to_string(),
            duration: e.duration().map(str::to_string),
            critical: e.is_critical(),
            preheat: WindowView::from(&e.preheat()),
            anchor: AnchorView::from(&e.anchor()),
        }
    }
}

/// A `[start, end)` window.
#[derive(Debug, Serialize)]
pub struct WindowView {
    pub start: String,
    pub end: String,
}

impl From<&PreHeatPeriod> for WindowView {
    fn from(p: &PreHeatPeriod) -> Self {
        Self {
            start: p.start_date.to_rfc3339(),
            end: p.end_date.to_rfc3339(),
        }
    }
}

/// An anchor window and the criticality of its peak.
#[derive(Debug, Serialize)]
pub struct AnchorView {
    pub start: String,
    pub end: String,
    pub critical: bool,
}

impl From<&AnchorPeriod> for AnchorView {
    fn from(a: &AnchorPeriod) -> Self {
        Self {
            start: a.start_date.to_rfc3339(),
            end: a.end_date.to_rfc3339(),
            critical: a.is_critical,
        }
    }
}

/// Optional local date range for the peaks endpoint, inclusive.
#[derive(Debug, Deserialize)]
pub struct PeaksQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
