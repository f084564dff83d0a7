//! Open data feed plumbing, without transport.
//!
//! Builds the query parameters for the Opendatasoft records endpoint and
//! turns its JSON responses into [`PeakRecord`](crate::peak::PeakRecord)s.
//! Fetching the bytes is left to the caller.

mod offers;
mod processor;

pub use offers::{offers_fetch_params, offers_in_response};
pub use processor::{
    DEFAULT_FETCH_LIMIT, DatasetProcessor, FetchParams, OPENDATA_API_BASE, PEAK_EVENTS_DATASET,
    PeakEventsProcessor, SectorFilter, dataset_url,
};
