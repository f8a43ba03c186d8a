//! Lenient number parsing for feed values.
//!
//! Retailer feeds publish prices and coordinates either as JSON numbers or as
//! strings, sometimes with trailing units or whitespace (`"142.9"`,
//! `" 51.5 "`, `"139.9p"`). Parsing follows the browser `parseFloat` rule:
//! the longest leading decimal literal wins and anything after it is ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
});

/// Parse the leading decimal literal of `raw`, ignoring leading whitespace.
///
/// Returns `None` when the string does not start with a number.
#[must_use]
pub fn parse_leading_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let m = LEADING_FLOAT.find(trimmed)?;
    m.as_str().parse::<f64>().ok()
}

/// Read a JSON number, or a string holding a leading decimal literal.
///
/// Any other JSON type yields `None`.
#[must_use]
pub fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_decimal() {
        assert_eq!(parse_leading_float("142.9"), Some(142.9));
    }

    #[test]
    fn ignores_surrounding_noise() {
        assert_eq!(parse_leading_float("  139.9p"), Some(139.9));
        assert_eq!(parse_leading_float("-0.1276 "), Some(-0.1276));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("1e2x"), Some(100.0));
    }

    #[test]
    fn rejects_non_numeric_prefix() {
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("p142.9"), None);
        assert_eq!(parse_leading_float("Infinity"), None);
    }

    #[test]
    fn lenient_f64_accepts_numbers_and_strings_only() {
        assert_eq!(lenient_f64(&json!(51.5)), Some(51.5));
        assert_eq!(lenient_f64(&json!("51.5")), Some(51.5));
        assert_eq!(lenient_f64(&json!(true)), None);
        assert_eq!(lenient_f64(&json!(null)), None);
        assert_eq!(lenient_f64(&json!([1.0])), None);
    }
}
