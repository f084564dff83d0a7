//! Canonical raw peak record.
//!
//! Records reach the engine in two key conventions: the internal camel-case
//! names (`dateDebut`, `plageHoraire`, ...) and the lower-case names used by
//! the open data API (`datedebut`, `plagehoraire`, ...). They are folded
//! into a single [`PeakRecord`] here so the model never sees either.

use serde_json::{Map, Value};

use super::event::Criticality;

pub const OFFER_KEY: &str = "offre";
pub const DURATION_KEY: &str = "duree";
pub const START_KEYS: [&str; 2] = ["dateDebut", "datedebut"];
pub const END_KEYS: [&str; 2] = ["dateFin", "datefin"];
pub const TIME_SLOT_KEYS: [&str; 2] = ["plageHoraire", "plagehoraire"];
pub const SECTOR_KEYS: [&str; 2] = ["secteurClient", "secteurclient"];

/// One raw peak event, normalized but not yet parsed.
///
/// Empty strings are treated as absent. Criticality is attached by whoever
/// produced the record: announcements from the API are forced critical,
/// locally generated schedule peaks are forced non-critical, anything else
/// falls back to offer code inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeakRecord {
    pub offer: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub time_slot: Option<String>,
    pub duration: Option<String>,
    pub sector: Option<String>,
    pub criticality: Criticality,
}

impl PeakRecord {
    /// Creates a record with the required fields set.
    pub fn new(offer: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            offer: Some(offer.into()),
            start: Some(start.into()),
            end: Some(end.into()),
            ..Self::default()
        }
    }

    /// Normalizes a JSON object, preferring internal key names over API ones.
    ///
    /// Non-object values yield an empty record, which later fails
    /// construction with a missing field.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        Self {
            offer: field(map, &[OFFER_KEY]),
            start: field(map, &START_KEYS),
            end: field(map, &END_KEYS),
            time_slot: field(map, &TIME_SLOT_KEYS),
            duration: field(map, &[DURATION_KEY]),
            sector: field(map, &SECTOR_KEYS),
            criticality: Criticality::default(),
        }
    }

    pub fn with_time_slot(mut self, time_slot: impl Into<String>) -> Self {
        self.time_slot = Some(time_slot.into());
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = criticality;
        self
    }
}

fn field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
