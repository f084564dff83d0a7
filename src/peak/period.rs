use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use super::event::TimeSlot;

/// Hours between the anchor start and a morning peak start.
pub const MORNING_ANCHOR_OFFSET_HOURS: i64 = 5;
/// Anchor length before a morning peak.
pub const MORNING_ANCHOR_DURATION_HOURS: i64 = 3;
/// Hours between the anchor start and an evening (or unknown slot) peak start.
pub const EVENING_ANCHOR_OFFSET_HOURS: i64 = 4;
/// Anchor length before an evening peak.
pub const EVENING_ANCHOR_DURATION_HOURS: i64 = 2;

/// Pre-conditioning window ending when the peak starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreHeatPeriod {
    pub start_date: DateTime<Tz>,
    pub end_date: DateTime<Tz>,
}

impl PreHeatPeriod {
    /// Window of `duration_minutes` ending at `peak_start`.
    pub fn new(peak_start: DateTime<Tz>, duration_minutes: u32) -> Self {
        Self {
            start_date: peak_start - Duration::minutes(i64::from(duration_minutes)),
            end_date: peak_start,
        }
    }

    /// Returns `true` when `now` lies in `[start, end)`.
    ///
    /// A zero-length window contains nothing.
    pub fn contains(&self, now: DateTime<Tz>) -> bool {
        self.start_date <= now && now < self.end_date
    }
}

/// Notification window preceding a peak.
///
/// Morning peaks: starts 5 hours before the peak and lasts 3 hours.
/// Evening peaks (and peaks of unknown slot): starts 4 hours before and
/// lasts 2 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorPeriod {
    pub start_date: DateTime<Tz>,
    pub end_date: DateTime<Tz>,
    /// Criticality of the peak this anchor announces.
    pub is_critical: bool,
}

impl AnchorPeriod {
    pub fn new(peak_start: DateTime<Tz>, time_slot: TimeSlot, is_critical: bool) -> Self {
        let (offset_hours, duration_hours) = match time_slot {
            TimeSlot::Am => (MORNING_ANCHOR_OFFSET_HOURS, MORNING_ANCHOR_DURATION_HOURS),
            TimeSlot::Pm | TimeSlot::Unknown => {
                (EVENING_ANCHOR_OFFSET_HOURS, EVENING_ANCHOR_DURATION_HOURS)
            }
        };
        let start_date = peak_start - Duration::hours(offset_hours);
        Self {
            start_date,
            end_date: start_date + Duration::hours(duration_hours),
            is_critical,
        }
    }

    /// Returns `true` when `now` lies in `[start, end)`.
    pub fn contains(&self, now: DateTime<Tz>) -> bool {
        self.start_date <= now && now < self.end_date
    }
}
