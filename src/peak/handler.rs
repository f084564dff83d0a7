//! Query engine over the peak events loaded for one rate.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::error::PeakError;
use super::event::PeakEvent;
use super::period::{AnchorPeriod, PreHeatPeriod};
use super::rates::RateCodeMap;
use super::record::PeakRecord;
use super::state::{PeakState, StateSample};
use super::time::{local_instant, localize, to_peak_tz};

/// Local hour probed for the morning peak of a day.
pub const MORNING_PROBE_HOUR: u32 = 6;
/// Local hour probed for the evening peak of a day.
pub const EVENING_PROBE_HOUR: u32 = 16;

/// A record that could not be turned into a peak during a load.
#[derive(Debug)]
pub struct RecordFailure {
    /// Position of the record in the loaded batch.
    pub index: usize,
    pub error: PeakError,
}

/// Outcome of [`PeakHandler::load_events`].
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Number of peaks now held by the handler.
    pub loaded: usize,
    /// Records skipped, in batch order.
    pub failures: Vec<RecordFailure>,
}

impl LoadSummary {
    pub fn skipped(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` when every record was loaded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Every derived value at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSnapshot {
    pub at: DateTime<Tz>,
    pub rate_code: String,
    pub event_count: usize,
    pub state: PeakState,
    pub preheat_in_progress: bool,
    pub critical_peak_coming: bool,
    pub current_peak: Option<PeakEvent>,
    pub next_peak: Option<PeakEvent>,
    pub next_critical_peak: Option<PeakEvent>,
    pub next_preheat: Option<PreHeatPeriod>,
    pub next_anchor: Option<AnchorPeriod>,
    pub today_morning_peak: Option<PeakEvent>,
    pub today_evening_peak: Option<PeakEvent>,
    pub tomorrow_morning_peak: Option<PeakEvent>,
    pub tomorrow_evening_peak: Option<PeakEvent>,
}

/// Holds the peaks of one rate and answers time-relative questions.
///
/// Generic over `C: Clock` for static dispatch. Every query exists as a
/// pure `*_at(now)` form and as a convenience form reading the clock.
///
/// Peaks are kept in load order behind a single `Arc`. A reload installs a
/// new collection in one assignment and never edits the old one, so a reader
/// holding [`events_snapshot`](Self::events_snapshot) keeps a consistent set.
///
/// Loaded peaks are not assumed disjoint. When several contain the same
/// instant, the first in load order wins.
#[derive(Debug, Clone)]
pub struct PeakHandler<C: Clock = SystemClock> {
    rate_code: String,
    preheat_duration_minutes: u32,
    rate_map: Arc<RateCodeMap>,
    events: Arc<[PeakEvent]>,
    clock: C,
}

impl PeakHandler<SystemClock> {
    /// Creates a handler reading the system clock.
    ///
    /// # Arguments
    ///
    /// * `rate_code` - Internal rate identifier, e.g. `"DPC"` or `"DCPC"`
    /// * `preheat_duration_minutes` - Pre-heat window length
    /// * `rate_map` - Offer code table of this deployment
    pub fn new(
        rate_code: impl Into<String>,
        preheat_duration_minutes: u32,
        rate_map: Arc<RateCodeMap>,
    ) -> Self {
        Self::with_clock(rate_code, preheat_duration_minutes, rate_map, SystemClock)
    }
}

impl<C: Clock> PeakHandler<C> {
    /// Creates a handler with an explicit clock.
    pub fn with_clock(
        rate_code: impl Into<String>,
        preheat_duration_minutes: u32,
        rate_map: Arc<RateCodeMap>,
        clock: C,
    ) -> Self {
        Self {
            rate_code: rate_code.into(),
            preheat_duration_minutes,
            rate_map,
            events: Arc::from(Vec::new()),
            clock,
        }
    }

    pub fn rate_code(&self) -> &str {
        &self.rate_code
    }

    pub fn rate_map(&self) -> &RateCodeMap {
        &self.rate_map
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn preheat_duration_minutes(&self) -> u32 {
        self.preheat_duration_minutes
    }

    /// Changes the pre-heat length.
    ///
    /// Loaded peaks are rebuilt with the new length and swapped in, so
    /// `event.preheat()` and [`preheat_in_progress`](Self::preheat_in_progress)
    /// always agree.
    pub fn set_preheat_duration_minutes(&mut self, minutes: u32) {
        self.preheat_duration_minutes = minutes;
        let rebuilt: Vec<PeakEvent> = self
            .events
            .iter()
            .map(|e| e.with_preheat_duration(minutes))
            .collect();
        self.events = Arc::from(rebuilt);
    }

    /// Loaded peaks in load order.
    pub fn events(&self) -> &[PeakEvent] {
        &self.events
    }

    /// Shared handle on the current collection.
    pub fn events_snapshot(&self) -> Arc<[PeakEvent]> {
        Arc::clone(&self.events)
    }

    /// Offer codes mapped to this handler's rate, in table order.
    ///
    /// An empty list means the rate has no demand-response program and no
    /// fetch should be attempted.
    pub fn offers_for_rate(&self) -> Vec<&str> {
        let offers = self.rate_map.offers_for_rate(&self.rate_code);
        if offers.is_empty() {
            info!(
                rate = %self.rate_code,
                "no peak events available for this rate"
            );
        }
        offers
    }

    /// The offer used for fetching: the first one in table order.
    ///
    /// Logs a warning when the rate maps to several offers.
    pub fn primary_offer(&self) -> Option<&str> {
        let offers = self.offers_for_rate();
        if offers.len() > 1 {
            warn!(
                rate = %self.rate_code,
                offers = ?offers,
                "multiple offers map to this rate, using the first"
            );
        }
        offers.first().copied()
    }

    /// Replaces every loaded peak with the peaks built from `records`.
    ///
    /// Records that fail construction are skipped with a warning and
    /// reported in the summary; they never abort the batch. An empty batch
    /// leaves the handler in the off-season state.
    pub fn load_events(&mut self, records: &[PeakRecord]) -> LoadSummary {
        let mut events = Vec::with_capacity(records.len());
        let mut failures = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match PeakEvent::from_record(record, self.preheat_duration_minutes) {
                Ok(event) => events.push(event),
                Err(error) => {
                    warn!(
                        rate = %self.rate_code,
                        index,
                        %error,
                        "skipping malformed peak record"
                    );
                    failures.push(RecordFailure { index, error });
                }
            }
        }

        let loaded = events.len();
        self.events = Arc::from(events);
        info!(
            rate = %self.rate_code,
            loaded,
            skipped = failures.len(),
            "peak events loaded"
        );

        LoadSummary { loaded, failures }
    }

    /// Normalizes raw JSON objects and loads them.
    pub fn load_json_records(&mut self, values: &[serde_json::Value]) -> LoadSummary {
        let records: Vec<PeakRecord> = values.iter().map(PeakRecord::from_json).collect();
        self.load_events(&records)
    }

    /// Drops every loaded peak.
    pub fn clear_events(&mut self) {
        debug!(rate = %self.rate_code, "clearing peak events");
        self.events = Arc::from(Vec::new());
    }

    /// The peak whose `[start, end]` contains `now`, first in load order.
    pub fn current_peak_at(&self, now: DateTime<Tz>) -> Option<&PeakEvent> {
        self.events.iter().find(|e| e.is_active(now))
    }

    /// Among peaks not yet over, the one starting first.
    pub fn next_peak_at(&self, now: DateTime<Tz>) -> Option<&PeakEvent> {
        self.events
            .iter()
            .filter(|e| e.end_date() > now)
            .min_by_key(|e| e.start_date())
    }

    /// Like [`next_peak_at`](Self::next_peak_at), restricted to critical peaks.
    pub fn next_critical_peak_at(&self, now: DateTime<Tz>) -> Option<&PeakEvent> {
        self.events
            .iter()
            .filter(|e| e.end_date() > now && e.is_critical())
            .min_by_key(|e| e.start_date())
    }

    /// Peaks not yet over, sorted by start (ties keep load order).
    pub fn upcoming_peaks_at(&self, now: DateTime<Tz>) -> Vec<&PeakEvent> {
        let mut upcoming: Vec<&PeakEvent> =
            self.events.iter().filter(|e| e.end_date() > now).collect();
        upcoming.sort_by_key(|e| e.start_date());
        upcoming
    }

    /// Pre-heat window of the next peak.
    ///
    /// Single source for the pre-heat test shared by
    /// [`current_state_at`](Self::current_state_at) and
    /// [`preheat_in_progress_at`](Self::preheat_in_progress_at).
    pub fn next_preheat_at(&self, now: DateTime<Tz>) -> Option<PreHeatPeriod> {
        self.next_peak_at(now).map(PeakEvent::preheat)
    }

    pub fn preheat_in_progress_at(&self, now: DateTime<Tz>) -> bool {
        self.next_preheat_at(now)
            .is_some_and(|window| window.contains(now))
    }

    /// Classifies `now`. Re-derived on every call.
    pub fn current_state_at(&self, now: DateTime<Tz>) -> PeakState {
        if self.events.is_empty() {
            return PeakState::OffSeason;
        }
        if let Some(peak) = self.current_peak_at(now) {
            return if peak.is_critical() {
                PeakState::CriticalPeak
            } else {
                PeakState::Peak
            };
        }
        if self.preheat_in_progress_at(now) {
            return PeakState::PreHeat;
        }
        PeakState::Regular
    }

    pub fn is_any_critical_peak_coming_at(&self, now: DateTime<Tz>) -> bool {
        self.next_critical_peak_at(now).is_some()
    }

    /// Anchor window of the next peak.
    pub fn next_anchor_at(&self, now: DateTime<Tz>) -> Option<AnchorPeriod> {
        self.next_peak_at(now).map(PeakEvent::anchor)
    }

    /// The peak whose `[start, end)` contains `probe`, first in load order.
    ///
    /// `probe` may be in any zone; it is converted to America/Toronto first.
    pub fn peak_for_period<Z: TimeZone>(&self, probe: &DateTime<Z>) -> Option<&PeakEvent> {
        let probe = to_peak_tz(probe);
        self.events.iter().find(|e| e.covers(probe))
    }

    /// Like [`peak_for_period`](Self::peak_for_period) for a naive local time.
    pub fn peak_for_local_period(&self, probe: NaiveDateTime) -> Option<&PeakEvent> {
        self.peak_for_period(&localize(probe))
    }

    pub fn today_morning_peak_at(&self, now: DateTime<Tz>) -> Option<&PeakEvent> {
        self.peak_for_day_hour(now, false, MORNING_PROBE_HOUR)
    }

    pub fn today_evening_peak_at(&self, now: DateTime<Tz>) -> Option<&PeakEvent> {
        self.peak_for_day_hour(now, false, EVENING_PROBE_HOUR)
    }

    pub fn tomorrow_morning_peak_at(&self, now: DateTime<Tz>) -> Option<&PeakEvent> {
        self.peak_for_day_hour(now, true, MORNING_PROBE_HOUR)
    }

    pub fn tomorrow_evening_peak_at(&self, now: DateTime<Tz>) -> Option<&PeakEvent> {
        self.peak_for_day_hour(now, true, EVENING_PROBE_HOUR)
    }

    fn peak_for_day_hour(&self, now: DateTime<Tz>, tomorrow: bool, hour: u32) -> Option<&PeakEvent> {
        let today = to_peak_tz(&now).date_naive();
        let date = if tomorrow { today.succ_opt()? } else { today };
        self.peak_for_period(&local_instant(date, hour))
    }

    /// Every derived value at `now`.
    pub fn snapshot_at(&self, now: DateTime<Tz>) -> PeakSnapshot {
        let now = to_peak_tz(&now);
        PeakSnapshot {
            at: now,
            rate_code: self.rate_code.clone(),
            event_count: self.events.len(),
            state: self.current_state_at(now),
            preheat_in_progress: self.preheat_in_progress_at(now),
            critical_peak_coming: self.is_any_critical_peak_coming_at(now),
            current_peak: self.current_peak_at(now).cloned(),
            next_peak: self.next_peak_at(now).cloned(),
            next_critical_peak: self.next_critical_peak_at(now).cloned(),
            next_preheat: self.next_preheat_at(now),
            next_anchor: self.next_anchor_at(now),
            today_morning_peak: self.today_morning_peak_at(now).cloned(),
            today_evening_peak: self.today_evening_peak_at(now).cloned(),
            tomorrow_morning_peak: self.tomorrow_morning_peak_at(now).cloned(),
            tomorrow_evening_peak: self.tomorrow_evening_peak_at(now).cloned(),
        }
    }

    /// Samples the state every `step` from `from` through `to` inclusive.
    ///
    /// A non-positive `step` or `from > to` yields no samples.
    pub fn state_timeline(
        &self,
        from: DateTime<Tz>,
        to: DateTime<Tz>,
        step: Duration,
    ) -> Vec<StateSample> {
        let mut samples = Vec::new();
        if step <= Duration::zero() {
            return samples;
        }
        let mut at = from;
        while at <= to {
            samples.push(StateSample {
                at,
                state: self.current_state_at(at),
                preheat_in_progress: self.preheat_in_progress_at(at),
                critical_peak_coming: self.is_any_critical_peak_coming_at(at),
                current_offer: self.current_peak_at(at).map(|e| e.offer().to_owned()),
                next_peak_start: self.next_peak_at(at).map(PeakEvent::start_date),
            });
            at += step;
        }
        samples
    }

    pub fn current_peak(&self) -> Option<&PeakEvent> {
        self.current_peak_at(self.clock.now())
    }

    pub fn next_peak(&self) -> Option<&PeakEvent> {
        self.next_peak_at(self.clock.now())
    }

    pub fn next_critical_peak(&self) -> Option<&PeakEvent> {
        self.next_critical_peak_at(self.clock.now())
    }

    pub fn current_state(&self) -> PeakState {
        self.current_state_at(self.clock.now())
    }

    pub fn preheat_in_progress(&self) -> bool {
        self.preheat_in_progress_at(self.clock.now())
    }

    pub fn is_any_critical_peak_coming(&self) -> bool {
        self.is_any_critical_peak_coming_at(self.clock.now())
    }

    pub fn next_preheat(&self) -> Option<PreHeatPeriod> {
        self.next_preheat_at(self.clock.now())
    }

    pub fn next_anchor(&self) -> Option<AnchorPeriod> {
        self.next_anchor_at(self.clock.now())
    }

    pub fn today_morning_peak(&self) -> Option<&PeakEvent> {
        self.today_morning_peak_at(self.clock.now())
    }

    pub fn today_evening_peak(&self) -> Option<&PeakEvent> {
        self.today_evening_peak_at(self.clock.now())
    }

    pub fn tomorrow_morning_peak(&self) -> Option<&PeakEvent> {
        self.tomorrow_morning_peak_at(self.clock.now())
    }

    pub fn tomorrow_evening_peak(&self) -> Option<&PeakEvent> {
        self.tomorrow_evening_peak_at(self.clock.now())
    }

    pub fn snapshot(&self) -> PeakSnapshot {
        self.snapshot_at(self.clock.now())
    }
}
