//! TOML-based engine configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::opendata::SectorFilter;
use crate::peak::{Clock, PeakHandler, RateCodeMap, RateTable, SystemClock, WinterSchedule};

/// Longest accepted pre-heat window: one day.
pub const MAX_PREHEAT_MINUTES: u32 = 24 * 60;

/// Top-level configuration parsed from TOML.
///
/// All fields have defaults matching the `flex_d` preset. Load from TOML
/// with [`EngineConfig::from_toml_file`] or pick a preset with
/// [`EngineConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Rate selection and offer table.
    #[serde(default)]
    pub rate: RateConfig,
    /// Pre-heat window.
    #[serde(default)]
    pub preheat: PreheatConfig,
    /// Regular winter peak schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Open data query parameters.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Rate selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateConfig {
    /// Rate, e.g. `"D"`, `"DPC"`, `"G"`.
    pub rate: String,
    /// Rate option, e.g. `"CPC"`, or empty.
    pub rate_option: String,
    /// Offer table: `"residential"` or `"full"`.
    pub table: String,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            rate: "DPC".to_string(),
            rate_option: String::new(),
            table: "residential".to_string(),
        }
    }
}

/// Pre-heat window parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreheatConfig {
    /// Minutes before each peak start (0 to 1440).
    pub duration_minutes: u32,
}

impl Default for PreheatConfig {
    fn default() -> Self {
        Self {
            duration_minutes: 120,
        }
    }
}

/// Regular winter peak schedule parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Whether placeholder peaks are added behind announcements.
    pub enabled: bool,
    pub morning_start_hour: u32,
    pub morning_end_hour: u32,
    pub evening_start_hour: u32,
    pub evening_end_hour: u32,
    /// First in-season day as `[month, day]`.
    pub season_start: [u32; 2],
    /// Last in-season day as `[month, day]`, inclusive.
    pub season_end: [u32; 2],
    /// Number of days covered, starting today.
    pub days_ahead: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let schedule = WinterSchedule::default();
        Self {
            enabled: false,
            morning_start_hour: schedule.morning.0,
            morning_end_hour: schedule.morning.1,
            evening_start_hour: schedule.evening.0,
            evening_end_hour: schedule.evening.1,
            season_start: [schedule.season_start.0, schedule.season_start.1],
            season_end: [schedule.season_end.0, schedule.season_end.1],
            days_ahead: 2,
        }
    }
}

/// Open data query parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Page size of a records query (must be > 0).
    pub limit: u32,
    /// Sector kept from responses: `"residential"`, `"commercial"` or `"any"`.
    pub sector: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            limit: crate::opendata::DEFAULT_FETCH_LIMIT,
            sector: "residential".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"preheat.duration_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl EngineConfig {
    /// Flex-D: dynamic pricing, every announced peak is critical.
    pub fn flex_d() -> Self {
        Self::default()
    }

    /// Rate D with the Winter Credits option.
    pub fn winter_credits() -> Self {
        Self {
            rate: RateConfig {
                rate: "D".to_string(),
                rate_option: "CPC".to_string(),
                ..RateConfig::default()
            },
            preheat: PreheatConfig {
                duration_minutes: 180,
            },
            schedule: ScheduleConfig {
                enabled: true,
                ..ScheduleConfig::default()
            },
            fetch: FetchConfig::default(),
        }
    }

    /// Rate G with Winter Credits, on the full offer table.
    pub fn commercial_g() -> Self {
        Self {
            rate: RateConfig {
                rate: "G".to_string(),
                rate_option: "CPC".to_string(),
                table: "full".to_string(),
            },
            preheat: PreheatConfig {
                duration_minutes: 60,
            },
            schedule: ScheduleConfig::default(),
            fetch: FetchConfig {
                sector: "commercial".to_string(),
                ..FetchConfig::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["flex_d", "winter_credits", "commercial_g"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "flex_d" => Ok(Self::flex_d()),
            "winter_credits" => Ok(Self::winter_credits()),
            "commercial_g" => Ok(Self::commercial_g()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Internal rate identifier, e.g. `"DCPC"`.
    pub fn rate_code(&self) -> String {
        format!("{}{}", self.rate.rate, self.rate.rate_option)
    }

    /// Offer table named by `rate.table`, residential when unknown.
    pub fn rate_map(&self) -> RateCodeMap {
        RateCodeMap::for_table(RateTable::from_name(&self.rate.table).unwrap_or_default())
    }

    /// Sector filter named by `fetch.sector`, residential when unknown.
    pub fn sector_filter(&self) -> SectorFilter {
        SectorFilter::from_name(&self.fetch.sector).unwrap_or_default()
    }

    pub fn schedule(&self) -> WinterSchedule {
        let s = &self.schedule;
        WinterSchedule {
            morning: (s.morning_start_hour, s.morning_end_hour),
            evening: (s.evening_start_hour, s.evening_end_hour),
            season_start: (s.season_start[0], s.season_start[1]),
            season_end: (s.season_end[0], s.season_end[1]),
        }
    }

    /// Builds an empty handler reading the system clock.
    pub fn build_handler(&self) -> PeakHandler<SystemClock> {
        self.build_handler_with_clock(SystemClock)
    }

    /// Builds an empty handler reading `clock`.
    pub fn build_handler_with_clock<C: Clock>(&self, clock: C) -> PeakHandler<C> {
        PeakHandler::with_clock(
            self.rate_code(),
            self.preheat.duration_minutes,
            Arc::new(self.rate_map()),
            clock,
        )
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.rate.rate.trim().is_empty() {
            errors.push(ConfigError::new("rate.rate", "must not be empty"));
        }
        if RateTable::from_name(&self.rate.table).is_none() {
            errors.push(ConfigError::new(
                "rate.table",
                format!(
                    "must be one of {}, got \"{}\"",
                    RateTable::NAMES.join(", "),
                    self.rate.table
                ),
            ));
        }

        if self.preheat.duration_minutes > MAX_PREHEAT_MINUTES {
            errors.push(ConfigError::new(
                "preheat.duration_minutes",
                format!("must be <= {MAX_PREHEAT_MINUTES}"),
            ));
        }

        let s = &self.schedule;
        for (name, start, end) in [
            ("morning", s.morning_start_hour, s.morning_end_hour),
            ("evening", s.evening_start_hour, s.evening_end_hour),
        ] {
            if end > 24 {
                errors.push(ConfigError::new(
                    format!("schedule.{name}_end_hour"),
                    "must be <= 24",
                ));
            }
            if start >= end {
                errors.push(ConfigError::new(
                    format!("schedule.{name}_start_hour"),
                    format!("must be < schedule.{name}_end_hour"),
                ));
            }
        }
        if s.morning_end_hour > s.evening_start_hour {
            errors.push(ConfigError::new(
                "schedule.morning_end_hour",
                "must be <= schedule.evening_start_hour",
            ));
        }
        for (name, [month, day]) in [("season_start", s.season_start), ("season_end", s.season_end)]
        {
            // Leap year so that February 29 is accepted.
            if chrono::NaiveDate::from_ymd_opt(2024, month, day).is_none() {
                errors.push(ConfigError::new(
                    format!("schedule.{name}"),
                    format!("[{month}, {day}] is not a calendar day"),
                ));
            }
        }

        if self.fetch.limit == 0 {
            errors.push(ConfigError::new("fetch.limit", "must be > 0"));
        }
        if SectorFilter::from_name(&self.fetch.sector).is_none() {
            errors.push(ConfigError::new(
                "fetch.sector",
                format!(
                    "must be one of {}, got \"{}\"",
                    SectorFilter::NAMES.join(", "),
                    self.fetch.sector
                ),
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_valid() {
        let cfg = EngineConfig::flex_d();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "flex_d should be valid: {errors:?}");
        assert_eq!(cfg.rate_code(), "DPC");
    }

    #[test]
    fn from_preset_unknown() {
        let err = EngineConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let message = err.err().map(|e| e.message).unwrap_or_default();
        assert!(message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in EngineConfig::PRESETS {
            let cfg = EngineConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn presets_resolve_to_an_offer() {
        for name in EngineConfig::PRESETS {
            let cfg = EngineConfig::from_preset(name).ok();
            let offers = cfg
                .as_ref()
                .map(|c| c.rate_map().offers_for_rate(&c.rate_code()).len());
            assert_eq!(offers, Some(1), "preset \"{name}\"");
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[rate]
rate = "D"
rate_option = "CPC"
table = "full"

[preheat]
duration_minutes = 90

[schedule]
enabled = true
morning_start_hour = 6
morning_end_hour = 9
evening_start_hour = 16
evening_end_hour = 20
season_start = [12, 1]
season_end = [3, 31]
days_ahead = 3

[fetch]
limit = 50
sector = "any"
"#;
        let cfg = EngineConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(EngineConfig::rate_code).as_deref(), Some("DCPC"));
        assert_eq!(cfg.as_ref().map(|c| c.preheat.duration_minutes), Some(90));
        assert_eq!(cfg.as_ref().map(EngineConfig::sector_filter), Some(SectorFilter::Any));
        assert_eq!(cfg.as_ref().map(|c| c.validate().len()), Some(0));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[preheat]
duration_minutes = 60
bogus_field = true
"#;
        assert!(EngineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[preheat]
duration_minutes = 30
"#;
        let cfg = EngineConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.preheat.duration_minutes), Some(30));
        assert_eq!(cfg.as_ref().map(|c| c.rate.rate.as_str()), Some("DPC"));
        assert_eq!(cfg.as_ref().map(|c| c.schedule.days_ahead), Some(2));
    }

    #[test]
    fn validation_catches_long_preheat() {
        let mut cfg = EngineConfig::flex_d();
        cfg.preheat.duration_minutes = MAX_PREHEAT_MINUTES + 1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "preheat.duration_minutes"));
    }

    #[test]
    fn validation_catches_inverted_hours() {
        let mut cfg = EngineConfig::flex_d();
        cfg.schedule.evening_start_hour = 21;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "schedule.evening_start_hour"));
    }

    #[test]
    fn validation_catches_bad_season_day() {
        let mut cfg = EngineConfig::flex_d();
        cfg.schedule.season_end = [2, 30];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "schedule.season_end"));
    }

    #[test]
    fn validation_catches_bad_names() {
        let mut cfg = EngineConfig::flex_d();
        cfg.rate.table = "industrial".to_string();
        cfg.fetch.sector = "industrial".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "rate.table"));
        assert!(errors.iter().any(|e| e.field == "fetch.sector"));
    }

    #[test]
    fn schedule_follows_config() {
        let mut cfg = EngineConfig::winter_credits();
        cfg.schedule.morning_start_hour = 5;
        let schedule = cfg.schedule();
        assert_eq!(schedule.morning, (5, 9));
        assert_eq!(schedule.season_start, (12, 1));
    }

    #[test]
    fn handler_carries_rate_and_preheat() {
        let handler = EngineConfig::commercial_g().build_handler();
        assert_eq!(handler.rate_code(), "GCPC");
        assert_eq!(handler.preheat_duration_minutes(), 60);
        assert_eq!(handler.primary_offer(), Some("CPC-G"));
    }
}
