//! Feed retrieval and normalization.
//!
//! Fetches each registered retailer feed through an ordered list of delivery
//! strategies, normalizes station locations, and merges every feed into one
//! [`fuelmap_core::AggregateResult`] without letting one bad source abort
//! the batch.

pub mod error;
pub mod fetch;
pub mod location;
pub mod payload;
pub mod pipeline;
mod retry;
pub mod timestamp;

pub use error::FeedError;
pub use fetch::{DeliveryStrategy, FeedFetcher, FetchFeed};
pub use location::normalize_location;
pub use payload::{normalize_feed, FeedPayload, NormalizedFeed};
pub use pipeline::{
    aggregate, AggregationObserver, AggregationOptions, AggregationReport, NoopObserver,
    SourceOutcome, SourceStatus,
};
pub use timestamp::parse_feed_timestamp;
