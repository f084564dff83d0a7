use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Serialize;

use super::error::PeakError;
use super::period::{AnchorPeriod, PreHeatPeriod};
use super::record::PeakRecord;
use super::time::parse_peak_datetime;

/// Offer code prefixes that denote a critical peak when criticality is inferred.
pub const CRITICAL_OFFER_PREFIXES: &[&str] = &["TPC", "ENG"];

/// How a peak's criticality is decided.
///
/// `Forced` is the preferred path: API announcements are critical and
/// locally generated schedule peaks are not. `InferFromOfferCode` is the
/// legacy fallback for records whose origin is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Forced(bool),
    #[default]
    InferFromOfferCode,
}

impl Criticality {
    /// Resolves the policy for a given offer code.
    pub fn resolve(self, offer: &str) -> bool {
        match self {
            Self::Forced(critical) => critical,
            Self::InferFromOfferCode => CRITICAL_OFFER_PREFIXES
                .iter()
                .any(|prefix| offer.starts_with(prefix)),
        }
    }
}

/// Time-of-day slot of a peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Am,
    Pm,
    Unknown,
}

impl TimeSlot {
    /// Reads the feed's `plageHoraire` label.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some(l) if l.eq_ignore_ascii_case("AM") => Self::Am,
            Some(l) if l.eq_ignore_ascii_case("PM") => Self::Pm,
            _ => Self::Unknown,
        }
    }

    /// Feed label for this slot.
    pub fn label(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
            Self::Unknown => "",
        }
    }
}

/// Customer sector a peak applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Residential,
    Commercial,
    Unknown,
}

impl Sector {
    /// Reads the feed's `secteurClient` label (`Résidentiel` or `Affaires`).
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("Résidentiel" | "Residentiel") => Self::Residential,
            Some("Affaires") => Self::Commercial,
            _ => Self::Unknown,
        }
    }

    /// Feed label for this sector.
    pub fn label(self) -> &'static str {
        match self {
            Self::Residential => "Résidentiel",
            Self::Commercial => "Affaires",
            Self::Unknown => "",
        }
    }
}

/// One demand-response window.
///
/// Immutable once built. The pre-heat and anchor windows are derived on
/// every call to [`preheat`](Self::preheat) and [`anchor`](Self::anchor).
#[derive(Debug, Clone, PartialEq)]
pub struct PeakEvent {
    offer: String,
    start_date: DateTime<Tz>,
    end_date: DateTime<Tz>,
    time_slot: TimeSlot,
    duration: Option<String>,
    sector: Sector,
    preheat_duration_minutes: u32,
    criticality: Criticality,
}

impl PeakEvent {
    /// Builds a peak from a normalized record.
    ///
    /// # Arguments
    ///
    /// * `record` - Normalized raw record
    /// * `preheat_duration_minutes` - Length of the pre-heat window before the peak
    ///
    /// # Errors
    ///
    /// Returns [`PeakError::MissingField`] when the start date, end date or
    /// offer is absent, [`PeakError::DateParse`] when a date matches neither
    /// accepted format, and [`PeakError::EmptyWindow`] when the end is not
    /// after the start.
    pub fn from_record(record: &PeakRecord, preheat_duration_minutes: u32) -> Result<Self, PeakError> {
        let start = record
            .start
            .as_deref()
            .ok_or(PeakError::MissingField { field: "dateDebut" })?;
        let end = record
            .end
            .as_deref()
            .ok_or(PeakError::MissingField { field: "dateFin" })?;
        let offer = record
            .offer
            .clone()
            .ok_or(PeakError::MissingField { field: "offre" })?;

        let start_date = parse_peak_datetime(start)?;
        let end_date = parse_peak_datetime(end)?;
        if start_date >= end_date {
            return Err(PeakError::EmptyWindow {
                start: start_date,
                end: end_date,
            });
        }

        Ok(Self {
            offer,
            start_date,
            end_date,
            time_slot: TimeSlot::from_label(record.time_slot.as_deref()),
            duration: record.duration.clone(),
            sector: Sector::from_label(record.sector.as_deref()),
            preheat_duration_minutes,
            criticality: record.criticality,
        })
    }

    pub fn offer(&self) -> &str {
        &self.offer
    }

    pub fn start_date(&self) -> DateTime<Tz> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Tz> {
        self.end_date
    }

    pub fn time_slot(&self) -> TimeSlot {
        self.time_slot
    }

    /// Opaque duration string as published, if any.
    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn preheat_duration_minutes(&self) -> u32 {
        self.preheat_duration_minutes
    }

    pub fn criticality(&self) -> Criticality {
        self.criticality
    }

    /// Length of the peak window.
    pub fn length(&self) -> Duration {
        self.end_date - self.start_date
    }

    /// Forced criticality when set, otherwise inferred from the offer code.
    pub fn is_critical(&self) -> bool {
        self.criticality.resolve(&self.offer)
    }

    pub fn is_morning(&self) -> bool {
        self.time_slot == TimeSlot::Am
    }

    pub fn is_residential(&self) -> bool {
        self.sector == Sector::Residential
    }

    pub fn is_commercial(&self) -> bool {
        self.sector == Sector::Commercial
    }

    /// Pre-heat window ending at the peak start.
    pub fn preheat(&self) -> PreHeatPeriod {
        PreHeatPeriod::new(self.start_date, self.preheat_duration_minutes)
    }

    /// Anchor (notification) window for this peak.
    pub fn anchor(&self) -> AnchorPeriod {
        AnchorPeriod::new(self.start_date, self.time_slot, self.is_critical())
    }

    /// Returns `true` when `now` lies in `[start, end]`.
    pub fn is_active(&self, now: DateTime<Tz>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    /// Returns `true` when `probe` lies in `[start, end)`.
    pub fn covers(&self, probe: DateTime<Tz>) -> bool {
        self.start_date <= probe && probe < self.end_date
    }

    /// Copy of this peak with another pre-heat length.
    pub(crate) fn with_preheat_duration(&self, minutes: u32) -> Self {
        Self {
            preheat_duration_minutes: minutes,
            ..self.clone()
        }
    }
}
