//! Price lookup with canonical-code aliasing.
//!
//! Prices are returned exactly as published, in pence; no unit conversion
//! happens here.

use serde_json::Value;

use crate::fuel::{normalize_code, FuelCatalog};
use crate::numeric::parse_leading_float;
use crate::station::StationRecord;

/// Resolve the price of `fuel_code` at `station`.
///
/// The code is normalized (trimmed, upper-case) and looked up directly. For
/// the canonical petrol and diesel codes the registered aliases are tried in
/// order when the direct entry is absent or `null`.
///
/// Returns `None` when nothing matches. A matching value that is not numeric
/// yields `Some(f64::NAN)`; callers must treat NaN as "no valid price".
#[must_use]
pub fn resolve_price(station: &StationRecord, fuel_code: &str, catalog: &FuelCatalog) -> Option<f64> {
    let prices = station.prices()?;
    let code = normalize_code(fuel_code);

    if let Some(value) = prices.get(&code).filter(|v| !v.is_null()) {
        return Some(price_value(value));
    }

    catalog
        .aliases_for(&code)
        .iter()
        .map(|alias| normalize_code(alias))
        .find_map(|alias| prices.get(&alias).filter(|v| !v.is_null()).map(price_value))
}

/// Numeric value of one `prices` entry; non-numeric entries are NaN.
#[must_use]
pub fn price_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_leading_float(s).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
