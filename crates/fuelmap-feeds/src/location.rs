//! Location normalization for heterogeneous feed payloads.
//!
//! Malformed input never errors: every parser returns `None`, which the
//! pipeline treats as "drop this station". Degenerate but well-formed
//! coordinates (NaN, `{0, 0}`) are rejected separately via
//! [`Location::is_usable`].

use fuelmap_core::numeric::lenient_f64;
use fuelmap_core::{Location, LocationParser, LocationStrategy};
use serde_json::Value;

type ParseFn = fn(&Value) -> Option<Location>;

/// Parser registered for a named strategy.
fn strategy_parser(strategy: LocationStrategy) -> ParseFn {
    match strategy {
        LocationStrategy::Paired => parse_paired,
        LocationStrategy::Swapped => parse_swapped,
        LocationStrategy::Geojson => parse_geojson,
    }
}

/// Normalize a station's raw `location` value using the feed's parser.
///
/// Returns `None` when the location is absent or not in a recognised shape.
#[must_use]
pub fn normalize_location(raw: Option<&Value>, parser: LocationParser) -> Option<Location> {
    let raw = raw?;
    match parser {
        LocationParser::Default => parse_default(raw),
        LocationParser::Custom(strategy) => strategy_parser(strategy)(raw),
    }
}

/// `{latitude, longitude}`, each a number or a numeric string.
fn parse_default(raw: &Value) -> Option<Location> {
    let latitude = lenient_f64(raw.get("latitude")?)?;
    let longitude = lenient_f64(raw.get("longitude")?)?;
    Some(Location::new(latitude, longitude))
}

/// Both coordinates numbers, or both strings.
fn parse_paired(raw: &Value) -> Option<Location> {
    let latitude = raw.get("latitude")?;
    let longitude = raw.get("longitude")?;
    match (latitude, longitude) {
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => Some(
            Location::new(lenient_f64(latitude)?, lenient_f64(longitude)?),
        ),
        _ => None,
    }
}

fn parse_swapped(raw: &Value) -> Option<Location> {
    parse_default(raw).map(|loc| Location::new(loc.longitude, loc.latitude))
}

/// `{"coordinates": [lon, lat]}` or a bare `[lon, lat]` array.
fn parse_geojson(raw: &Value) -> Option<Location> {
    let coords = match raw {
        Value::Array(items) => items,
        Value::Object(map) => map.get("coordinates")?.as_array()?,
        _ => return None,
    };
    match coords.as_slice() {
        [lon, lat, ..] => Some(Location::new(lenient_f64(lat)?, lenient_f64(lon)?)),
        _ => None,
    }
}
