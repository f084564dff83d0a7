use chrono::DateTime;
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::peak::time::{PEAK_TZ, to_peak_tz};
use crate::peak::{Clock, Criticality, LoadSummary, PeakHandler, PeakRecord, Sector};

/// Opendatasoft v2.1 explore API root.
pub const OPENDATA_API_BASE: &str = "https://donnees.hydroquebec.com/api/explore/v2.1";
/// Dataset publishing winter peak announcements.
pub const PEAK_EVENTS_DATASET: &str = "evenements-pointe";
/// Default page size of a records query.
pub const DEFAULT_FETCH_LIMIT: u32 = 100;

/// Records URL of a dataset.
///
/// ```
/// use winter_peaks::opendata::{dataset_url, PEAK_EVENTS_DATASET};
///
/// assert_eq!(
///     dataset_url(PEAK_EVENTS_DATASET),
///     "https://donnees.hydroquebec.com/api/explore/v2.1/catalog/datasets/evenements-pointe/records"
/// );
/// ```
pub fn dataset_url(dataset: &str) -> String {
    format!("{OPENDATA_API_BASE}/catalog/datasets/{dataset}/records")
}

/// Query parameters of one records request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub limit: u32,
    pub timezone: String,
    /// Column projection, e.g. `offre`.
    pub select: Option<String>,
    /// Facet refinement, e.g. `offre:"TPC-DPC"`.
    pub refine: Option<String>,
    /// ODSQL filter, e.g. `datedebut>='2024-12-15'`.
    pub where_clause: Option<String>,
}

impl FetchParams {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            timezone: PEAK_TZ.name().to_owned(),
            select: None,
            refine: None,
            where_clause: None,
        }
    }

    /// Key/value pairs ready for URL encoding, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(select) = &self.select {
            pairs.push(("select", select.clone()));
        }
        if let Some(refine) = &self.refine {
            pairs.push(("refine", refine.clone()));
        }
        if let Some(where_clause) = &self.where_clause {
            pairs.push(("where", where_clause.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("timezone", self.timezone.clone()));
        pairs
    }
}

/// Which customer sector a processor keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectorFilter {
    #[default]
    Residential,
    Commercial,
    Any,
}

impl SectorFilter {
    pub const NAMES: &[&str] = &["residential", "commercial", "any"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "residential" => Some(Self::Residential),
            "commercial" => Some(Self::Commercial),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    /// Returns `true` when a record of `sector` passes the filter.
    pub fn accepts(self, sector: Sector) -> bool {
        match self {
            Self::Residential => sector == Sector::Residential,
            Self::Commercial => sector == Sector::Commercial,
            Self::Any => true,
        }
    }
}

/// Dataset-specific fetch and response handling.
///
/// Implementations hold no connection; they describe the request and
/// interpret the reply.
pub trait DatasetProcessor {
    /// Dataset identifier in the catalog.
    fn dataset_name(&self) -> &str;

    /// Parameters of the next request, or `None` when nothing should be fetched.
    fn build_fetch_params(&self, now: DateTime<Tz>) -> Option<FetchParams>;

    /// Records extracted from a raw response body.
    fn process_response(&self, response: &Value) -> Vec<PeakRecord>;
}

/// Processor for the `evenements-pointe` dataset.
///
/// Every record it emits is an announcement and is therefore forced
/// critical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakEventsProcessor {
    rate_code: String,
    offers: Vec<String>,
    sector: SectorFilter,
    limit: u32,
    /// Offer kept locally, mirroring the server-side `refine`.
    offer_filter: Option<String>,
}

impl PeakEventsProcessor {
    /// Builds a processor for the rate and offer table of `handler`.
    pub fn for_handler<C: Clock>(handler: &PeakHandler<C>) -> Self {
        Self {
            rate_code: handler.rate_code().to_owned(),
            offers: handler
                .rate_map()
                .offers_for_rate(handler.rate_code())
                .into_iter()
                .map(str::to_owned)
                .collect(),
            sector: SectorFilter::default(),
            limit: DEFAULT_FETCH_LIMIT,
            offer_filter: None,
        }
    }

    pub fn with_sector(mut self, sector: SectorFilter) -> Self {
        self.sector = sector;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Keeps only records of the offer the fetch refines on.
    ///
    /// Needed when the response did not come from the refined query, such
    /// as a stored feed covering every offer. A rate without offers then
    /// keeps nothing.
    pub fn with_offer_filter(mut self) -> Self {
        self.offer_filter = Some(self.offers.first().cloned().unwrap_or_default());
        self
    }

    pub fn sector(&self) -> SectorFilter {
        self.sector
    }

    /// Processes `response` and replaces the events of `handler` with the
    /// kept records followed by `extra` (typically schedule placeholders).
    pub fn load_into<C: Clock>(
        &self,
        response: &Value,
        extra: Vec<PeakRecord>,
        handler: &mut PeakHandler<C>,
    ) -> LoadSummary {
        let mut records = self.process_response(response);
        records.extend(extra);
        handler.load_events(&records)
    }
}

impl DatasetProcessor for PeakEventsProcessor {
    fn dataset_name(&self) -> &str {
        PEAK_EVENTS_DATASET
    }

    fn build_fetch_params(&self, now: DateTime<Tz>) -> Option<FetchParams> {
        let Some(offer) = self.offers.first() else {
            debug!(rate = %self.rate_code, "no peak offer for rate, skipping fetch");
            return None;
        };
        if self.offers.len() > 1 {
            warn!(
                rate = %self.rate_code,
                offer = %offer,
                "multiple offers for rate, filtering by the first only"
            );
        }

        let today = to_peak_tz(&now).date_naive().format("%Y-%m-%d");
        let mut params = FetchParams::new(self.limit);
        params.refine = Some(format!("offre:\"{offer}\""));
        params.where_clause = Some(format!("datedebut>='{today}'"));
        debug!(rate = %self.rate_code, offer = %offer, "built peak events query");
        Some(params)
    }

    fn process_response(&self, response: &Value) -> Vec<PeakRecord> {
        let results = response
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        debug!(
            rate = %self.rate_code,
            received = results.len(),
            "peak events response received"
        );

        let mut kept = Vec::with_capacity(results.len());
        for raw in results {
            let mut record = PeakRecord::from_json(raw);
            let sector = Sector::from_label(record.sector.as_deref());
            if !self.sector.accepts(sector) {
                debug!(
                    sector = record.sector.as_deref().unwrap_or(""),
                    offer = record.offer.as_deref().unwrap_or(""),
                    "ignoring event outside sector filter"
                );
                continue;
            }
            let offer = record.offer.get_or_insert_with(String::new);
            if let Some(wanted) = &self.offer_filter {
                if offer.as_str() != wanted.as_str() {
                    debug!(offer = %offer, wanted = %wanted, "ignoring event of another offer");
                    continue;
                }
            }
            record.criticality = Criticality::Forced(true);
            kept.push(record);
        }

        info!(
            rate = %self.rate_code,
            kept = kept.len(),
            ignored = results.len() - kept.len(),
            "filtered peak events"
        );
        kept
    }
}
