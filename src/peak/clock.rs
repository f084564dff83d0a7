use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use super::time::{now_local, to_peak_tz};

/// Source of "now" for peak queries.
///
/// The handler never reads the system clock directly; production code holds
/// a [`SystemClock`] and tests hold a [`FixedClock`] they can move by hand.
pub trait Clock {
    /// Current instant in the peak zone.
    fn now(&self) -> DateTime<Tz>;
}

/// Wall clock in America/Toronto.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        now_local()
    }
}

/// A clock that only moves when told to.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use winter_peaks::peak::clock::{Clock, FixedClock};
/// use winter_peaks::peak::time::parse_peak_datetime;
///
/// let at = parse_peak_datetime("2024-12-15 14:00").expect("valid date");
/// let mut clock = FixedClock::new(at);
/// clock.advance(Duration::minutes(30));
/// assert_eq!(clock.now(), at + Duration::minutes(30));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Tz>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`, converted to America/Toronto.
    pub fn new(now: DateTime<Tz>) -> Self {
        Self {
            now: to_peak_tz(&now),
        }
    }

    /// Moves the clock to `now`, converted to America/Toronto.
    pub fn set(&mut self, now: DateTime<Tz>) {
        self.now = to_peak_tz(&now);
    }

    /// Moves the clock forward (or backward for a negative `by`).
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::peak::time::parse_peak_datetime;

    #[test]
    fn fixed_clock_stays_put() {
        let at = parse_peak_datetime("2024-12-15 08:00").expect("date");
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn fixed_clock_set_and_advance() {
        let at = parse_peak_datetime("2024-12-15 08:00").expect("date");
        let mut clock = FixedClock::new(at);
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), at + Duration::hours(2));
        clock.set(at);
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn fixed_clock_reports_in_toronto() {
        let paris = chrono_tz::Europe::Paris
            .with_ymd_and_hms(2024, 12, 16, 2, 30, 0)
            .single()
            .expect("unambiguous");
        let mut clock = FixedClock::new(paris);
        assert_eq!(clock.now().timezone(), chrono_tz::America::Toronto);
        assert_eq!(clock.now(), paris);
        assert_eq!(
            clock.now().date_naive(),
            chrono::NaiveDate::from_ymd_opt(2024, 12, 15).expect("date")
        );

        clock.set(paris);
        assert_eq!(clock.now().timezone(), chrono_tz::America::Toronto);
    }

    #[test]
    fn system_clock_is_in_toronto() {
        assert_eq!(SystemClock.now().timezone(), chrono_tz::America::Toronto);
    }
}
