//! Normalized station records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN_BRAND: &str = "Unknown Brand";

/// Keys derived during normalization; they replace raw keys of the same name.
const DERIVED_KEYS: [&str; 5] = ["sourceName", "lat", "lon", "lastUpdated", "displayBrand"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both coordinates finite and not the `{0, 0}` "unset" sentinel.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_usable(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

/// One station from one feed, with its raw fields preserved.
///
/// Serializes as the raw object plus the derived camelCase keys, which is
/// the shape stored in the cache slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    pub source_name: String,
    pub lat: f64,
    pub lon: f64,
    pub last_updated: Option<String>,
    pub display_brand: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Every station from every feed, in registry order then feed order.
pub type AggregateResult = Vec<StationRecord>;

impl StationRecord {
    #[must_use]
    pub fn from_raw(
        mut fields: Map<String, Value>,
        source_name: &str,
        location: Location,
        last_updated: Option<String>,
    ) -> Self {
        for key in DERIVED_KEYS {
            fields.remove(key);
        }
        let display_brand = display_brand(&fields, source_name);
        Self {
            source_name: source_name.to_string(),
            lat: location.latitude,
            lon: location.longitude,
            last_updated,
            display_brand,
            fields,
        }
    }

    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.lat, self.lon)
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.fields.get("address").and_then(Value::as_str)
    }

    #[must_use]
    pub fn postcode(&self) -> Option<&str> {
        self.fields.get("postcode").and_then(Value::as_str)
    }

    /// Feed-assigned site id, rendered as text. Unique only within one feed.
    #[must_use]
    pub fn site_id(&self) -> Option<String> {
        match self.fields.get("site_id")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Raw `prices` mapping, when the feed supplied an object.
    #[must_use]
    pub fn prices(&self) -> Option<&Map<String, Value>> {
        self.fields.get("prices").and_then(Value::as_object)
    }
}

/// Brand group a station is filed under.
///
/// A non-empty `brand` string wins (trimmed), then the source name, then
/// [`UNKNOWN_BRAND`]. A brand that trims to nothing is also unknown.
fn display_brand(fields: &Map<String, Value>, source_name: &str) -> String {
    let chosen = match fields.get("brand").and_then(Value::as_str) {
        Some(brand) if !brand.is_empty() => brand,
        _ if !source_name.is_empty() => source_name,
        _ => UNKNOWN_BRAND,
    };
    let trimmed = chosen.trim();
    if trimmed.is_empty() {
        UNKNOWN_BRAND.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("fixture must be an object")
    }

    #[test]
    fn zero_zero_is_not_usable() {
        assert!(!Location::new(0.0, 0.0).is_usable());
        assert!(Location::new(0.0, -1.5).is_usable());
        assert!(!Location::new(f64::NAN, 51.0).is_usable());
        assert!(!Location::new(51.0, f64::INFINITY).is_usable());
    }

    #[test]
    fn display_brand_prefers_trimmed_brand() {
        let rec = StationRecord::from_raw(
            raw(json!({"brand": "  ESSO "})),
            "Esso",
            Location::new(51.5, -0.1),
            None,
        );
        assert_eq!(rec.display_brand, "ESSO");
    }

    #[test]
    fn display_brand_falls_back_to_source_name() {
        let rec = StationRecord::from_raw(
            raw(json!({"brand": ""})),
            "Tesco",
            Location::new(51.5, -0.1),
            None,
        );
        assert_eq!(rec.display_brand, "Tesco");
    }

    #[test]
    fn whitespace_brand_is_unknown() {
        let rec = StationRecord::from_raw(
            raw(json!({"brand": "   "})),
            "Tesco",
            Location::new(51.5, -0.1),
            None,
        );
        assert_eq!(rec.display_brand, UNKNOWN_BRAND);
    }

    #[test]
    fn derived_keys_replace_raw_keys() {
        let rec = StationRecord::from_raw(
            raw(json!({"lat": "bogus", "sourceName": "spoofed", "site_id": 42})),
            "BP",
            Location::new(52.0, -1.0),
            Some("01/06/2025 10:00:00".to_string()),
        );
        assert_eq!(rec.source_name, "BP");
        assert!(!rec.fields.contains_key("lat"));
        assert_eq!(rec.site_id().as_deref(), Some("42"));

        let encoded = serde_json::to_value(&rec).unwrap();
        assert_eq!(encoded["sourceName"], "BP");
        assert_eq!(encoded["lat"], 52.0);
        assert_eq!(encoded["lastUpdated"], "01/06/2025 10:00:00");
        assert_eq!(encoded["displayBrand"], "BP");
    }

    #[test]
    fn serde_round_trip_preserves_raw_fields() {
        let rec = StationRecord::from_raw(
            raw(json!({"brand": "Asda", "prices": {"E10": 139.9}, "postcode": "LS1 1AA"})),
            "Asda",
            Location::new(53.8, -1.5),
            None,
        );
        let text = serde_json::to_string(&rec).unwrap();
        let back: StationRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.postcode(), Some("LS1 1AA"));
    }
}
