//! Textual program state derived from the loaded peaks.

use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

/// What the demand-response program is doing at one instant.
///
/// Precedence when classifying: no peaks loaded, then an active peak, then
/// the pre-heat window of the next peak, then the regular period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeakState {
    #[serde(rename = "off-season")]
    OffSeason,
    #[serde(rename = "critical peak in progress")]
    CriticalPeak,
    #[serde(rename = "peak in progress")]
    Peak,
    #[serde(rename = "pre-heat in progress")]
    PreHeat,
    #[serde(rename = "regular period")]
    Regular,
}

impl PeakState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffSeason => "off-season",
            Self::CriticalPeak => "critical peak in progress",
            Self::Peak => "peak in progress",
            Self::PreHeat => "pre-heat in progress",
            Self::Regular => "regular period",
        }
    }

    /// Returns `true` for either kind of active peak.
    pub fn is_peak(self) -> bool {
        matches!(self, Self::CriticalPeak | Self::Peak)
    }
}

impl fmt::Display for PeakState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived state sampled at one instant, used for timeline export.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSample {
    pub at: DateTime<Tz>,
    pub state: PeakState,
    pub preheat_in_progress: bool,
    pub critical_peak_coming: bool,
    /// Offer of the active peak, if any.
    pub current_offer: Option<String>,
    /// Start of the next peak, if any.
    pub next_peak_start: Option<DateTime<Tz>>,
}
