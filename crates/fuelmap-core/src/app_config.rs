use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// YAML registry file; `None` selects the built-in UK registry.
    pub registry_path: Option<PathBuf>,
    pub cache_path: PathBuf,
    pub cache_duration_secs: u64,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    /// Try the feed URL itself before any relay.
    pub direct_fetch: bool,
    /// Relay prefixes, tried in order after the direct strategy.
    pub relays: Vec<String>,
    pub max_concurrent_sources: usize,
    pub inter_request_delay_ms: u64,
    pub fetch_max_retries: u32,
    pub fetch_retry_backoff_ms: u64,
}

impl AppConfig {
    /// Staleness threshold in milliseconds, as compared against cache timestamps.
    #[must_use]
    pub fn cache_duration_ms(&self) -> i64 {
        i64::try_from(self.cache_duration_secs.saturating_mul(1_000)).unwrap_or(i64::MAX)
    }
}
