use chrono::{NaiveDate, NaiveDateTime};

/// Parse a feed's `last_updated` text.
///
/// UK retailer feeds publish `DD/MM/YYYY HH:MM:SS`; some publish the date
/// alone, which is read as midnight. Anything else yields `None` and the raw
/// string is kept as-is on the station records.
#[must_use]
pub fn parse_feed_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%d/%m/%Y %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%d/%m/%Y")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
