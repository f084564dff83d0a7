use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::event::{Criticality, Sector, TimeSlot};
use super::record::PeakRecord;
use super::time::SIMPLE_FORMAT;

/// Regular winter peak schedule.
///
/// Produces non-critical placeholder peaks for every in-season day: one
/// morning window and one evening window. Announced critical peaks are
/// loaded ahead of these so they win first-match lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinterSchedule {
    /// Morning window `(start_hour, end_hour)` in local time.
    pub morning: (u32, u32),
    /// Evening window `(start_hour, end_hour)` in local time.
    pub evening: (u32, u32),
    /// First in-season day as `(month, day)`.
    pub season_start: (u32, u32),
    /// Last in-season day as `(month, day)`, inclusive.
    pub season_end: (u32, u32),
}

impl Default for WinterSchedule {
    fn default() -> Self {
        Self {
            morning: (6, 9),
            evening: (16, 20),
            season_start: (12, 1),
            season_end: (3, 31),
        }
    }
}

impl WinterSchedule {
    /// Returns `true` when `date` falls inside the season.
    ///
    /// Seasons may wrap the year end (December to March).
    pub fn in_season(&self, date: NaiveDate) -> bool {
        let md = (date.month(), date.day());
        if self.season_start <= self.season_end {
            self.season_start <= md && md <= self.season_end
        } else {
            md >= self.season_start || md <= self.season_end
        }
    }

    /// Placeholder records for `days` consecutive days starting at `from`.
    ///
    /// # Arguments
    ///
    /// * `offer` - Offer code stamped on each record
    /// * `sector` - Sector stamped on each record
    /// * `from` - First local date
    /// * `days` - Number of days to cover
    pub fn records(&self, offer: &str, sector: Sector, from: NaiveDate, days: u32) -> Vec<PeakRecord> {
        (0..u64::from(days))
            .filter_map(|offset| from.checked_add_days(Days::new(offset)))
            .filter(|date| self.in_season(*date))
            .flat_map(|date| {
                [
                    placeholder(offer, sector, date, self.morning, TimeSlot::Am),
                    placeholder(offer, sector, date, self.evening, TimeSlot::Pm),
                ]
            })
            .collect()
    }
}

fn placeholder(
    offer: &str,
    sector: Sector,
    date: NaiveDate,
    (start_hour, end_hour): (u32, u32),
    slot: TimeSlot,
) -> PeakRecord {
    let start = at_hour(date, start_hour);
    let end = at_hour(date, end_hour);
    PeakRecord::new(
        offer,
        start.format(SIMPLE_FORMAT).to_string(),
        end.format(SIMPLE_FORMAT).to_string(),
    )
    .with_time_slot(slot.label())
    .with_sector(sector.label())
    .with_duration(end_hour.saturating_sub(start_hour).to_string())
    .with_criticality(Criticality::Forced(false))
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour))
}
