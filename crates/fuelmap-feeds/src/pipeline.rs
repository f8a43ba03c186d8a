//! Aggregation pipeline: fetch → parse → normalize → merge, per source.
//!
//! Sources are fetched with at most `max_concurrent_sources` in flight, and
//! their records are concatenated in registry order regardless of which
//! fetch finishes first. A source that fails is recorded and skipped; it
//! never aborts the batch.

use std::time::Duration;

use futures::stream::{self, StreamExt};

use fuelmap_core::{AggregateResult, AppConfig, FeedSource};

use crate::error::FeedError;
use crate::fetch::FetchFeed;
use crate::payload::{normalize_feed, FeedPayload, NormalizedFeed};

/// Progress notifications for presentation. Every method defaults to a no-op.
///
/// Notifications for different sources may interleave when fetches run
/// concurrently; the merged result is ordered regardless.
pub trait AggregationObserver: Send + Sync {
    fn source_started(&self, _source: &FeedSource) {}

    fn source_succeeded(&self, _source: &FeedSource, _stations: usize, _dropped: usize) {}

    fn source_failed(&self, _source: &FeedSource, _error: &FeedError) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl AggregationObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationOptions {
    pub max_concurrent_sources: usize,
    /// Pause before each source after the first; only applied when
    /// `max_concurrent_sources` is 1.
    pub inter_request_delay: Duration,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 4,
            inter_request_delay: Duration::from_millis(250),
        }
    }
}

impl AggregationOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_concurrent_sources: config.max_concurrent_sources,
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Succeeded { stations: usize, dropped: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source_name: String,
    pub status: SourceStatus,
}

impl SourceOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.status, SourceStatus::Succeeded { .. })
    }
}

/// Merged stations plus one outcome per source, both in registry order.
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    pub stations: AggregateResult,
    pub outcomes: Vec<SourceOutcome>,
}

impl AggregationReport {
    #[must_use]
    pub fn total_stations(&self) -> usize {
        self.stations.len()
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded())
    }
}

/// Fetch and normalize every source, merging the results in registry order.
///
/// Never fails: per-source failures are logged, reported to `observer`, and
/// recorded as [`SourceStatus::Failed`] in the returned report.
pub async fn aggregate<F>(
    sources: &[FeedSource],
    fetcher: &F,
    options: AggregationOptions,
    observer: &dyn AggregationObserver,
) -> AggregationReport
where
    F: FetchFeed + Sync,
{
    let concurrency = options.max_concurrent_sources.max(1);
    let delay = if concurrency == 1 {
        options.inter_request_delay
    } else {
        Duration::ZERO
    };

    let results: Vec<(&FeedSource, Result<NormalizedFeed, FeedError>)> =
        stream::iter(sources.iter().enumerate())
            .map(move |(index, source)| async move {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                (source, process_source(source, fetcher, observer).await)
            })
            .buffered(concurrency)
            .collect()
            .await;

    let mut report = AggregationReport {
        stations: Vec::new(),
        outcomes: Vec::with_capacity(results.len()),
    };

    for (source, result) in results {
        let status = match result {
            Ok(feed) => {
                let status = SourceStatus::Succeeded {
                    stations: feed.stations.len(),
                    dropped: feed.dropped,
                };
                report.stations.extend(feed.stations);
                status
            }
            Err(err) => SourceStatus::Failed {
                reason: err.to_string(),
            },
        };
        report.outcomes.push(SourceOutcome {
            source_name: source.name.clone(),
            status,
        });
    }

    let failed = report.failed_sources().count();
    if failed > 0 {
        tracing::warn!(
            failed_sources = failed,
            total_sources = sources.len(),
            "some sources failed during aggregation"
        );
    }
    tracing::info!(
        stations = report.total_stations(),
        sources = sources.len(),
        "aggregation complete"
    );

    report
}

async fn process_source<F>(
    source: &FeedSource,
    fetcher: &F,
    observer: &dyn AggregationObserver,
) -> Result<NormalizedFeed, FeedError>
where
    F: FetchFeed + Sync,
{
    observer.source_started(source);
    tracing::debug!(source = %source.name, url = %source.url, "fetching feed");

    match fetcher.fetch_feed(&source.url).await {
        Ok(value) => {
            let feed = normalize_feed(FeedPayload::from_value(value), source);
            tracing::info!(
                source = %source.name,
                stations = feed.stations.len(),
                dropped = feed.dropped,
                "feed normalized"
            );
            observer.source_succeeded(source, feed.stations.len(), feed.dropped);
            Ok(feed)
        }
        Err(err) => {
            tracing::error!(source = %source.name, error = %err, "giving up on source");
            observer.source_failed(source, &err);
            Err(err)
        }
    }
}
