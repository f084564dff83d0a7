use serde_json::Value;

use super::processor::{DEFAULT_FETCH_LIMIT, FetchParams, SectorFilter};
use crate::peak::record::OFFER_KEY;

/// Query listing the offers published for a sector.
pub fn offers_fetch_params(sector: SectorFilter) -> FetchParams {
    let mut params = FetchParams::new(DEFAULT_FETCH_LIMIT);
    params.select = Some(OFFER_KEY.to_owned());
    params.refine = match sector {
        SectorFilter::Residential => Some("secteurclient:\"Residentiel\"".to_owned()),
        SectorFilter::Commercial => Some("secteurclient:\"Affaires\"".to_owned()),
        SectorFilter::Any => None,
    };
    params
}

/// Distinct non-empty offer codes of a response, in first-seen order.
pub fn offers_in_response(response: &Value) -> Vec<String> {
    let mut offers: Vec<String> = Vec::new();
    let results = response.get("results").and_then(Value::as_array);
    for record in results.into_iter().flatten() {
        let Some(offer) = record.get(OFFER_KEY).and_then(Value::as_str) else {
            continue;
        };
        if !offer.is_empty() && !offers.iter().any(|o| o == offer) {
            offers.push(offer.to_owned());
        }
    }
    offers
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::peak::RateCodeMap;

    #[test]
    fn distinct_offers_in_order() {
        let response = json!({
            "results": [
                { "offre": "TPC-DPC" },
                { "offre": "" },
                { "offre": "CPC-D" },
                { "offre": "TPC-DPC" },
                { "secteurclient": "Résidentiel" }
            ]
        });
        assert_eq!(offers_in_response(&response), vec!["TPC-DPC", "CPC-D"]);
    }

    #[test]
    fn offers_become_sorted_rate_options() {
        let response = json!({
            "results": [{ "offre": "TPC-DPC" }, { "offre": "CPC-D" }, { "offre": "XYZ" }]
        });
        let offers = offers_in_response(&response);
        let options = RateCodeMap::residential().rate_options(offers.iter().map(String::as_str));
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["DPC|", "D|CPC"]);
    }

    #[test]
    fn residential_offers_query() {
        let params = offers_fetch_params(SectorFilter::Residential);
        assert_eq!(params.select.as_deref(), Some("offre"));
        assert_eq!(
            params.refine.as_deref(),
            Some("secteurclient:\"Residentiel\"")
        );
        assert!(offers_fetch_params(SectorFilter::Any).refine.is_none());
    }
}
