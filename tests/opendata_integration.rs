//! Feed processing from a stored open data response into handler state.

mod common;

use std::sync::Arc;

use winter_peaks::config::EngineConfig;
use winter_peaks::opendata::{
    DatasetProcessor, PeakEventsProcessor, SectorFilter, dataset_url, offers_in_response,
};
use winter_peaks::peak::{Clock, FixedClock, PeakError, PeakHandler, PeakState, RateCodeMap};

use common::{at, fixture_response, handler};

#[test]
fn residential_feed_loads_for_flex_d() {
    let mut h = handler("DPC", 120, "2024-12-15 15:00");
    let processor = PeakEventsProcessor::for_handler(&h);
    let summary = processor.load_into(&fixture_response(), Vec::new(), &mut h);

    // Four residential records, one of them without an end date.
    assert_eq!(summary.loaded, 3);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.failures[0].index, 3);
    assert!(matches!(
        summary.failures[0].error,
        PeakError::MissingField { field: "dateFin" }
    ));

    assert_eq!(h.current_state(), PeakState::PreHeat);
    assert!(h.events().iter().all(|e| e.is_critical()));
    assert!(h.events().iter().all(|e| e.is_residential()));
}

#[test]
fn stored_feed_keeps_only_the_rate_offer() {
    let mut h = handler("DPC", 120, "2024-12-16 10:00");
    let processor = PeakEventsProcessor::for_handler(&h).with_offer_filter();
    let summary = processor.load_into(&fixture_response(), Vec::new(), &mut h);

    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.skipped(), 1);
    assert!(h.events().iter().all(|e| e.offer() == "TPC-DPC"));
    assert!(h.next_critical_peak().is_none());
    assert!(!h.is_any_critical_peak_coming());
}

#[test]
fn commercial_filter_keeps_business_events() {
    let now = at("2024-12-16 07:00");
    let mut h = PeakHandler::with_clock(
        "GCPC",
        60,
        Arc::new(RateCodeMap::full()),
        FixedClock::new(now),
    );
    let processor = PeakEventsProcessor::for_handler(&h).with_sector(SectorFilter::Commercial);
    let summary = processor.load_into(&fixture_response(), Vec::new(), &mut h);

    assert_eq!(summary.loaded, 2);
    assert!(h.events().iter().all(|e| e.is_commercial()));
    assert_eq!(h.current_state(), PeakState::CriticalPeak);
    assert_eq!(h.current_peak().map(|p| p.offer()), Some("CPC-G"));
}

#[test]
fn fetch_params_follow_clock_date() {
    let h = EngineConfig::winter_credits()
        .build_handler_with_clock(FixedClock::new(at("2024-12-20 23:30")));
    let params = PeakEventsProcessor::for_handler(&h)
        .build_fetch_params(h.clock().now())
        .expect("winter credits has an offer");

    let pairs = params.query_pairs();
    assert!(pairs.contains(&("refine", "offre:\"CPC-D\"".to_string())));
    assert!(pairs.contains(&("where", "datedebut>='2024-12-20'".to_string())));
    assert!(pairs.contains(&("timezone", "America/Toronto".to_string())));
}

#[test]
fn fixture_offers_map_to_rate_options() {
    let offers = offers_in_response(&fixture_response());
    assert_eq!(offers, vec!["TPC-DPC", "CPC-D", "CPC-G", "TPC-GPC"]);

    let residential = RateCodeMap::residential().rate_options(offers.iter().map(String::as_str));
    assert_eq!(residential.len(), 2);

    let full = RateCodeMap::full().rate_options(offers.iter().map(String::as_str));
    let values: Vec<&str> = full.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values.len(), 4);
    assert!(values.contains(&"G|GPC"));
}

#[test]
fn dataset_url_targets_peak_events() {
    let h = handler("DPC", 0, "2024-12-15 15:00");
    let processor = PeakEventsProcessor::for_handler(&h);
    assert!(dataset_url(processor.dataset_name()).ends_with("/datasets/evenements-pointe/records"));
}
