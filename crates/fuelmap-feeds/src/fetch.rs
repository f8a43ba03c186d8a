//! Resilient feed retrieval.
//!
//! Retailer endpoints are third-party and unreliable, and some are only
//! reachable through a relay. [`FeedFetcher`] tries each
//! [`DeliveryStrategy`] in order and returns the first body that arrives
//! with a success status and parses as JSON.

use std::future::Future;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use serde_json::Value;

use fuelmap_core::AppConfig;

use crate::error::FeedError;
use crate::retry::retry_with_backoff;

/// Characters left unescaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One transport path to a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStrategy {
    /// Request the feed URL itself.
    Direct,
    /// Request `prefix` followed by the percent-encoded feed URL.
    Relay { prefix: String },
}

impl DeliveryStrategy {
    #[must_use]
    pub fn request_url(&self, feed_url: &str) -> String {
        match self {
            DeliveryStrategy::Direct => feed_url.to_string(),
            DeliveryStrategy::Relay { prefix } => {
                format!("{prefix}{}", utf8_percent_encode(feed_url, URI_COMPONENT))
            }
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            DeliveryStrategy::Direct => "direct".to_string(),
            DeliveryStrategy::Relay { prefix } => {
                let short: String = prefix.chars().take(24).collect();
                format!("relay {short}")
            }
        }
    }
}

/// Retrieves one feed's raw JSON.
///
/// The aggregation pipeline depends on this trait rather than on
/// [`FeedFetcher`] so the transport can be swapped out.
pub trait FetchFeed {
    /// Fetch and parse the feed at `url`.
    ///
    /// # Errors
    ///
    /// Implementations return [`FeedError::FetchFailure`] once every
    /// transport path has been exhausted.
    fn fetch_feed(&self, url: &str) -> impl Future<Output = Result<Value, FeedError>> + Send;
}

/// HTTP fetcher with ordered strategy fallback.
pub struct FeedFetcher {
    client: Client,
    strategies: Vec<DeliveryStrategy>,
    /// Extra attempts per strategy on transient errors.
    max_retries: u32,
    backoff_base_ms: u64,
}

impl FeedFetcher {
    /// Creates a fetcher with the given timeout, `User-Agent` and strategies.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        strategies: Vec<DeliveryStrategy>,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            strategies,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Builds a fetcher from application config: direct first when enabled,
    /// then each relay in configured order.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, FeedError> {
        let mut strategies = Vec::with_capacity(config.relays.len() + 1);
        if config.direct_fetch {
            strategies.push(DeliveryStrategy::Direct);
        }
        strategies.extend(
            config
                .relays
                .iter()
                .map(|prefix| DeliveryStrategy::Relay {
                    prefix: prefix.clone(),
                }),
        );
        Self::new(
            config.fetch_timeout_secs,
            &config.user_agent,
            strategies,
            config.fetch_max_retries,
            config.fetch_retry_backoff_ms,
        )
    }

    #[must_use]
    pub fn strategies(&self) -> &[DeliveryStrategy] {
        &self.strategies
    }

    async fn fetch_via(&self, strategy: &DeliveryStrategy, url: &str) -> Result<Value, FeedError> {
        let request_url = strategy.request_url(url);
        reqwest::Url::parse(&request_url).map_err(|e| FeedError::InvalidUrl {
            url: request_url.clone(),
            reason: e.to_string(),
        })?;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request_url = request_url.clone();
            async move { self.get_json(&request_url, url).await }
        })
        .await
    }

    async fn get_json(&self, request_url: &str, feed_url: &str) -> Result<Value, FeedError> {
        let response = self
            .client
            .get(request_url)
            .header(
                reqwest::header::ACCEPT,
                "application/json,text/plain;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited {
                url: request_url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: request_url.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<Value>(&body).map_err(|e| FeedError::Deserialize {
            context: format!("feed {feed_url}"),
            source: e,
        })
    }
}

impl FetchFeed for FeedFetcher {
    fn fetch_feed(&self, url: &str) -> impl Future<Output = Result<Value, FeedError>> + Send {
        async move {
            for strategy in &self.strategies {
                match self.fetch_via(strategy, url).await {
                    Ok(value) => {
                        tracing::debug!(url, strategy = %strategy.label(), "feed fetched");
                        return Ok(value);
                    }
                    Err(err) => {
                        tracing::warn!(
                            url,
                            strategy = %strategy.label(),
                            error = %err,
                            "delivery strategy failed, trying next"
                        );
                    }
                }
            }
            Err(FeedError::FetchFailure {
                url: url.to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_url_encodes_like_encode_uri_component() {
        let strategy = DeliveryStrategy::Relay {
            prefix: "https://api.allorigins.win/raw?url=".to_string(),
        };
        assert_eq!(
            strategy.request_url("https://www.tesco.com/fuel_prices/fuel_prices_data.json"),
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fwww.tesco.com%2Ffuel_prices%2Ffuel_prices_data.json"
        );
    }

    #[test]
    fn relay_url_keeps_unreserved_marks() {
        let strategy = DeliveryStrategy::Relay {
            prefix: "https://cors.eu.org/".to_string(),
        };
        assert_eq!(
            strategy.request_url("https://x.example/a-b_c.d!~*'()?q=1 2"),
            "https://cors.eu.org/https%3A%2F%2Fx.example%2Fa-b_c.d!~*'()%3Fq%3D1%202"
        );
    }

    #[test]
    fn direct_url_is_unchanged() {
        assert_eq!(
            DeliveryStrategy::Direct.request_url("https://jetlocal.co.uk/fuel_prices_data.json"),
            "https://jetlocal.co.uk/fuel_prices_data.json"
        );
    }

    #[test]
    fn from_config_orders_direct_before_relays() {
        let config = AppConfig {
            env: fuelmap_core::Environment::Test,
            log_level: "info".to_string(),
            registry_path: None,
            cache_path: "stations.json".into(),
            cache_duration_secs: 43_200,
            fetch_timeout_secs: 5,
            user_agent: "fuelmap-test/0.1".to_string(),
            direct_fetch: true,
            relays: vec!["https://relay-a.example/?u=".to_string()],
            max_concurrent_sources: 1,
            inter_request_delay_ms: 0,
            fetch_max_retries: 0,
            fetch_retry_backoff_ms: 0,
        };
        let fetcher = FeedFetcher::from_config(&config).unwrap();
        assert_eq!(
            fetcher.strategies(),
            [
                DeliveryStrategy::Direct,
                DeliveryStrategy::Relay {
                    prefix: "https://relay-a.example/?u=".to_string()
                }
            ]
        );
    }
}
