//! Feed payload shape and per-feed normalization into [`StationRecord`]s.

use serde_json::Value;

use fuelmap_core::{FeedSource, StationRecord};

use crate::location::normalize_location;

/// The parts of a retailer feed the pipeline reads.
///
/// Feeds publish `{"last_updated": "...", "stations": [...]}`. A missing or
/// non-array `stations` is zero stations, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPayload {
    /// Feed-level timestamp, kept only when the feed sent a string.
    pub last_updated: Option<String>,
    pub stations: Vec<Value>,
}

impl FeedPayload {
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            return Self::default();
        };
        let last_updated = match root.remove("last_updated") {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        let stations = match root.remove("stations") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        Self {
            last_updated,
            stations,
        }
    }
}

/// Stations kept from one feed, plus how many raw entries were discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFeed {
    pub stations: Vec<StationRecord>,
    pub dropped: usize,
}

/// Turns one feed's payload into station records, in feed order.
///
/// Entries that are not JSON objects, or whose location cannot be resolved
/// or is degenerate, are dropped.
#[must_use]
pub fn normalize_feed(payload: FeedPayload, source: &FeedSource) -> NormalizedFeed {
    let mut feed = NormalizedFeed {
        stations: Vec::with_capacity(payload.stations.len()),
        dropped: 0,
    };

    for (index, raw) in payload.stations.into_iter().enumerate() {
        let Value::Object(fields) = raw else {
            tracing::debug!(source = %source.name, index, "dropping non-object station entry");
            feed.dropped += 1;
            continue;
        };

        let location = normalize_location(fields.get("location"), source.location_parser)
            .filter(fuelmap_core::Location::is_usable);
        let Some(location) = location else {
            tracing::debug!(
                source = %source.name,
                index,
                site_id = ?fields.get("site_id"),
                "dropping station without a usable location"
            );
            feed.dropped += 1;
            continue;
        };

        feed.stations.push(StationRecord::from_raw(
            fields,
            &source.name,
            location,
            payload.last_updated.clone(),
        ));
    }

    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuelmap_core::LocationStrategy;
    use serde_json::json;

    #[test]
    fn missing_or_wrong_typed_stations_is_empty() {
        assert!(FeedPayload::from_value(json!({"last_updated": "x"}))
            .stations
            .is_empty());
        assert!(FeedPayload::from_value(json!({"stations": {"a": 1}}))
            .stations
            .is_empty());
        assert_eq!(FeedPayload::from_value(json!([1, 2])), FeedPayload::default());
    }

    #[test]
    fn non_string_last_updated_is_ignored() {
        let payload = FeedPayload::from_value(json!({"last_updated": 1_717_236_000, "stations": []}));
        assert_eq!(payload.last_updated, None);
    }

    #[test]
    fn drops_invalid_entries_and_keeps_order() {
        let payload = FeedPayload::from_value(json!({
            "last_updated": "01/06/2025 09:00:00",
            "stations": [
                {"site_id": "a", "brand": "ASDA", "location": {"latitude": 53.1, "longitude": -1.1}},
                {"site_id": "zero", "location": {"latitude": 0, "longitude": 0}},
                "not an object",
                {"site_id": "missing"},
                {"site_id": "b", "location": {"latitude": "53.2", "longitude": "-1.2"}}
            ]
        }));
        let source = FeedSource::new("Asda", "https://storelocator.asda.com/fuel_prices_data.json");
        let feed = normalize_feed(payload, &source);

        assert_eq!(feed.dropped, 3);
        let ids: Vec<_> = feed.stations.iter().filter_map(StationRecord::site_id).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(feed
            .stations
            .iter()
            .all(|s| s.last_updated.as_deref() == Some("01/06/2025 09:00:00")));
        assert_eq!(feed.stations[1].display_brand, "Asda");
    }

    #[test]
    fn uses_source_location_parser() {
        let payload = FeedPayload::from_value(json!({
            "stations": [
                {"site_id": "mixed", "location": {"latitude": "52.1", "longitude": -1.2}},
                {"site_id": "ok", "location": {"latitude": 52.1, "longitude": -1.2}}
            ]
        }));
        let source = FeedSource::new("Morrisons", "https://www.morrisons.com/fuel-prices/fuel.json")
            .with_parser(LocationStrategy::Paired);
        let feed = normalize_feed(payload, &source);
        assert_eq!(feed.dropped, 1);
        assert_eq!(feed.stations[0].site_id().as_deref(), Some("ok"));
    }
}
