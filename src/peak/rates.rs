//! Mapping between the program's external offer codes and internal rates.
//!
//! The table is a plain value passed to whoever needs it. Residential-only
//! and full (residential + commercial) deployments each build their own
//! [`RateCodeMap`] and can coexist in one process.

use std::collections::BTreeMap;

use serde::Serialize;

/// `(offer, rate, rate_option, label)` rows for residential customers.
const RESIDENTIAL_ENTRIES: &[(&str, &str, &str, &str)] = &[
    ("CPC-D", "D", "CPC", "Rate D + Winter Credits (CPC)"),
    ("TPC-DPC", "DPC", "", "Flex-D (Dynamic Pricing)"),
];

/// Rows added by the full table for business customers.
const COMMERCIAL_ENTRIES: &[(&str, &str, &str, &str)] = &[
    ("CPC-G", "G", "CPC", "Rate G + Winter Credits (CPC)"),
    ("TPC-GPC", "G", "GPC", "Flex-G (Dynamic Pricing)"),
    ("ENG01", "M", "ENG", "Rate M + Demand Response (ENG)"),
    ("ENG02", "M", "ENG", "Rate M + Demand Response (ENG)"),
];

/// One offer code and the internal rate it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateCodeEntry {
    /// External offer code as published by the data source.
    pub offer: String,
    /// Internal rate, e.g. `"D"`.
    pub rate: String,
    /// Rate option, e.g. `"CPC"`, or empty for none.
    pub rate_option: String,
    /// Human-readable label.
    pub label: String,
}

impl RateCodeEntry {
    fn from_row(&(offer, rate, rate_option, label): &(&str, &str, &str, &str)) -> Self {
        Self {
            offer: offer.to_owned(),
            rate: rate.to_owned(),
            rate_option: rate_option.to_owned(),
            label: label.to_owned(),
        }
    }

    /// Internal rate identifier: rate followed by its option (`"DCPC"`, `"DPC"`).
    pub fn internal_rate(&self) -> String {
        format!("{}{}", self.rate, self.rate_option)
    }

    /// Selectable option built from this entry.
    pub fn option(&self) -> RateOption {
        RateOption {
            value: format!("{}|{}", self.rate, self.rate_option),
            label: self.label.clone(),
            rate: self.rate.clone(),
            rate_option: self.rate_option.clone(),
        }
    }
}

/// Which historical table a deployment uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateTable {
    #[default]
    Residential,
    Full,
}

impl RateTable {
    /// Names accepted in configuration.
    pub const NAMES: &[&str] = &["residential", "full"];

    /// Parses a configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "residential" => Some(Self::Residential),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// A rate choice offered to the user, e.g. `D|CPC`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateOption {
    /// `"<rate>|<rate_option>"`.
    pub value: String,
    pub label: String,
    pub rate: String,
    pub rate_option: String,
}

/// Ordered offer code table.
///
/// Entry order is significant: when several offers map to one internal
/// rate, the first one in table order is the one used for fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateCodeMap {
    entries: Vec<RateCodeEntry>,
}

impl RateCodeMap {
    /// Builds a map from explicit entries, keeping their order.
    pub fn new(entries: Vec<RateCodeEntry>) -> Self {
        Self { entries }
    }

    /// Residential-only table.
    pub fn residential() -> Self {
        Self::new(RESIDENTIAL_ENTRIES.iter().map(RateCodeEntry::from_row).collect())
    }

    /// Residential and commercial table.
    pub fn full() -> Self {
        Self::new(
            RESIDENTIAL_ENTRIES
                .iter()
                .chain(COMMERCIAL_ENTRIES)
                .map(RateCodeEntry::from_row)
                .collect(),
        )
    }

    /// Table for a deployment variant.
    pub fn for_table(table: RateTable) -> Self {
        match table {
            RateTable::Residential => Self::residential(),
            RateTable::Full => Self::full(),
        }
    }

    /// All entries in table order.
    pub fn entries(&self) -> &[RateCodeEntry] {
        &self.entries
    }

    /// Looks up an offer code.
    pub fn get(&self, offer: &str) -> Option<&RateCodeEntry> {
        self.entries.iter().find(|e| e.offer == offer)
    }

    /// Every offer code whose internal rate equals `rate_code`, in table order.
    ///
    /// An empty result is normal for plain rates without a demand-response
    /// program.
    pub fn offers_for_rate(&self, rate_code: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.internal_rate() == rate_code)
            .map(|e| e.offer.as_str())
            .collect()
    }

    /// Rate options for the known offers among `offers`, sorted by label.
    ///
    /// Unknown offers are ignored and options sharing a value are collapsed.
    pub fn rate_options<'a>(&self, offers: impl IntoIterator<Item = &'a str>) -> Vec<RateOption> {
        let mut by_value: BTreeMap<String, RateOption> = BTreeMap::new();
        for offer in offers {
            if let Some(entry) = self.get(offer) {
                let option = entry.option();
                by_value.entry(option.value.clone()).or_insert(option);
            }
        }
        let mut options: Vec<RateOption> = by_value.into_values().collect();
        options.sort_by(|a, b| a.label.cmp(&b.label));
        options
    }

    /// Options for every entry of the table, used when the offer list
    /// cannot be retrieved.
    pub fn fallback_rate_options(&self) -> Vec<RateOption> {
        self.rate_options(self.entries.iter().map(|e| e.offer.as_str()))
    }
}
