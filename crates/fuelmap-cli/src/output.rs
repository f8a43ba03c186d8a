//! Text rendering for command output. Prices stay in pence everywhere else;
//! conversion to pounds happens only here.

use fuelmap_classify::{BrandDirectory, BrandFilter, Classification, PricePick, DEFAULT_TANK_LITRES};
use fuelmap_core::{FuelCatalog, FuelSelection, LocationParser, Registry, StationRecord};
use fuelmap_feeds::{parse_feed_timestamp, SourceOutcome, SourceStatus};

pub(crate) fn format_pounds(pence: f64) -> String {
    if pence.is_finite() {
        format!("£{:.3}", pence / 100.0)
    } else {
        "N/A".to_string()
    }
}

/// Feed timestamp as `DD/MM HH:MM`, or the raw text when it does not parse.
pub(crate) fn format_feed_time(raw: Option<&str>) -> String {
    match raw {
        Some(text) => parse_feed_timestamp(text)
            .map_or_else(|| text.trim().to_string(), |t| t.format("%d/%m %H:%M").to_string()),
        None => String::new(),
    }
}

pub(crate) fn format_cached_at(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |t| t.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

pub(crate) fn render_sources(registry: &Registry) -> String {
    let mut lines = Vec::with_capacity(registry.sources.len() + 1);
    lines.push(format!("{} feed sources:", registry.sources.len()));
    for source in &registry.sources {
        let parser = match source.location_parser {
            LocationParser::Default => String::new(),
            LocationParser::Custom(strategy) => format!(" [{strategy}]"),
        };
        lines.push(format!("  {:<16} {}{parser}", source.name, source.url));
    }
    lines.join("\n")
}

pub(crate) fn render_report(outcomes: &[SourceOutcome], total: usize) -> String {
    let mut lines = Vec::with_capacity(outcomes.len() + 1);
    for outcome in outcomes {
        lines.push(match &outcome.status {
            SourceStatus::Succeeded { stations, dropped } => format!(
                "  ok     {:<16} {stations} stations, {dropped} dropped",
                outcome.source_name
            ),
            SourceStatus::Failed { reason } => {
                format!("  failed {:<16} {reason}", outcome.source_name)
            }
        });
    }
    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    lines.push(format!(
        "{total} stations from {} of {} sources",
        outcomes.len() - failed,
        outcomes.len()
    ));
    lines.join("\n")
}

pub(crate) fn render_brands(directory: &BrandDirectory, filter: &BrandFilter) -> String {
    let mut lines = Vec::with_capacity(directory.len() + 1);
    lines.push(format!("{} brands:", directory.len()));
    for group in directory.sorted() {
        let mark = if filter.is_enabled(&group.name) { "x" } else { " " };
        lines.push(format!("  [{mark}] {} ({})", group.name, group.stations));
    }
    lines.join("\n")
}

fn describe_station(station: &StationRecord) -> String {
    let mut parts = vec![station.display_brand.clone()];
    parts.extend(station.address().map(str::to_string));
    parts.extend(station.postcode().map(str::to_string));
    let updated = format_feed_time(station.last_updated.as_deref());
    if !updated.is_empty() {
        parts.push(format!("updated {updated}"));
    }
    parts.join(", ")
}

fn pick_line(label: &str, pick: Option<PricePick<'_>>) -> String {
    match pick {
        Some(pick) => format!(
            "{label:<16} {}  {}",
            format_pounds(pick.price),
            describe_station(pick.station)
        ),
        None => format!("{label:<16} N/A"),
    }
}

pub(crate) fn render_classification(
    classification: &Classification<'_>,
    selection: &FuelSelection,
    catalog: &FuelCatalog,
) -> String {
    let mut lines = vec![
        format!("{} stations visible", classification.visible_stations.len()),
        pick_line("Cheapest petrol", classification.cheapest_petrol),
        pick_line("Cheapest diesel", classification.cheapest_diesel),
        pick_line("Highest petrol", classification.highest_petrol),
        pick_line("Highest diesel", classification.highest_diesel),
    ];

    if let Some(code) = selection.code() {
        let legend = classification.scale.legend();
        if legend.is_empty() {
            lines.push(format!("No visible prices for {}", catalog.describe(code)));
        } else {
            lines.push(format!("Price scale for {}:", catalog.describe(code)));
            for entry in legend {
                let range = match entry.lower {
                    Some(lower) => format!(
                        "{} - {}",
                        format_pounds(lower),
                        format_pounds(entry.upper)
                    ),
                    None => format!("<= {}", format_pounds(entry.upper)),
                };
                lines.push(format!("  {}  {range}", entry.color.hex()));
            }
        }
    }

    if let Some(spread) = classification.spread_for(selection, catalog) {
        lines.push(format!(
            "Visible {} spread {}; save up to £{:.2} on a {DEFAULT_TANK_LITRES}L tank",
            spread.class,
            format_pounds(spread.spread()),
            spread.savings_for_tank(DEFAULT_TANK_LITRES)
        ));
    }

    lines.join("\n")
}

/// Marker state for every visible station as a JSON array.
pub(crate) fn markers_json(classification: &Classification<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&classification.markers())
}
