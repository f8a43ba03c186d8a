use fuelmap_core::FeedSource;
use fuelmap_feeds::{AggregationObserver, FeedError};

/// Prints per-source progress lines to stderr while an aggregation runs.
pub(crate) struct ProgressPrinter;

impl AggregationObserver for ProgressPrinter {
    fn source_started(&self, source: &FeedSource) {
        eprintln!("Fetching {}...", source.name);
    }

    fn source_succeeded(&self, source: &FeedSource, stations: usize, dropped: usize) {
        if dropped > 0 {
            eprintln!(
                "Loaded {stations} stations from {} ({dropped} without a usable location)",
                source.name
            );
        } else {
            eprintln!("Loaded {stations} stations from {}", source.name);
        }
    }

    fn source_failed(&self, source: &FeedSource, _error: &FeedError) {
        eprintln!("Failed to fetch {}, trying next...", source.name);
    }
}
