pub mod app_config;
pub mod config;
pub mod fuel;
pub mod numeric;
pub mod price;
pub mod registry;
pub mod station;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use fuel::{FuelCatalog, FuelClass, FuelClassCodes, FuelCodeEntry, FuelSelection};
pub use price::{price_value, resolve_price};
pub use registry::{
    default_registry, load_registry, FeedSource, LocationParser, LocationStrategy, Registry,
};
pub use station::{AggregateResult, Location, StationRecord, UNKNOWN_BRAND};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read registry file {path}: {source}")]
    RegistryFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry file: {0}")]
    RegistryFileParse(#[from] serde_yaml::Error),

    #[error("registry validation failed: {0}")]
    Validation(String),
}
