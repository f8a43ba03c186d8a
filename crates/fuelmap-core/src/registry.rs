use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fuel::FuelCatalog;
use crate::ConfigError;

/// Named location-parsing strategy for feeds whose coordinates do not follow
/// the default `{latitude, longitude}` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStrategy {
    /// Both coordinates numbers, or both strings; mixed types are rejected.
    Paired,
    /// The feed's `latitude` field carries the longitude and vice versa.
    Swapped,
    /// `{"coordinates": [lon, lat]}` or a bare `[lon, lat]` array.
    Geojson,
}

impl std::fmt::Display for LocationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationStrategy::Paired => write!(f, "paired"),
            LocationStrategy::Swapped => write!(f, "swapped"),
            LocationStrategy::Geojson => write!(f, "geojson"),
        }
    }
}

/// How a feed's station locations are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationParser {
    #[default]
    Default,
    Custom(LocationStrategy),
}

impl From<Option<LocationStrategy>> for LocationParser {
    fn from(strategy: Option<LocationStrategy>) -> Self {
        strategy.map_or(LocationParser::Default, LocationParser::Custom)
    }
}

impl From<LocationParser> for Option<LocationStrategy> {
    fn from(parser: LocationParser) -> Self {
        match parser {
            LocationParser::Default => None,
            LocationParser::Custom(strategy) => Some(strategy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(
        default,
        with = "location_parser_serde",
        skip_serializing_if = "is_default_parser"
    )]
    pub location_parser: LocationParser,
}

impl FeedSource {
    #[must_use]
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            location_parser: LocationParser::Default,
        }
    }

    #[must_use]
    pub fn with_parser(mut self, strategy: LocationStrategy) -> Self {
        self.location_parser = LocationParser::Custom(strategy);
        self
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_default_parser(parser: &LocationParser) -> bool {
    *parser == LocationParser::Default
}

mod location_parser_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{LocationParser, LocationStrategy};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub(super) fn serialize<S: Serializer>(
        parser: &LocationParser,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        Option::<LocationStrategy>::from(*parser).serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<LocationParser, D::Error> {
        Ok(Option::<LocationStrategy>::deserialize(deserializer)?.into())
    }
}

/// Feed list plus the fuel vocabulary, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub sources: Vec<FeedSource>,
    #[serde(default)]
    pub fuel: FuelCatalog,
}

/// Load and validate a registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_registry(path: &Path) -> Result<Registry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegistryFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let registry: Registry = serde_yaml::from_str(&content)?;
    validate_registry(&registry)?;

    Ok(registry)
}

/// The UK retailer feeds published under the CMA fuel-price transparency
/// scheme.
#[must_use]
pub fn default_registry() -> Registry {
    let sources = vec![
        FeedSource::new("Shell", "https://www.shell.co.uk/fuel-prices-data.html"),
        FeedSource::new(
            "AppleGreen",
            "https://applegreenstores.com/fuel-prices/data.json",
        ),
        FeedSource::new(
            "AsconaGroup",
            "https://fuelprices.asconagroup.co.uk/newfuel.json",
        ),
        FeedSource::new(
            "Asda",
            "https://storelocator.asda.com/fuel_prices_data.json",
        ),
        FeedSource::new(
            "BP",
            "https://www.bp.com/en_gb/united-kingdom/home/fuelprices/fuel_prices_data.json",
        ),
        FeedSource::new("Esso", "https://fuelprices.esso.co.uk/latestdata.json"),
        FeedSource::new("JET", "https://jetlocal.co.uk/fuel_prices_data.json"),
        FeedSource::new("Morrisons", "https://www.morrisons.com/fuel-prices/fuel.json")
            .with_parser(LocationStrategy::Paired),
        FeedSource::new("MotoWay", "https://moto-way.com/fuel-price/fuel_prices.json"),
        FeedSource::new(
            "MotorFuelGroup",
            "https://fuel.motorfuelgroup.com/fuel_prices_data.json",
        ),
        FeedSource::new(
            "Rontec",
            "https://www.rontec-servicestations.co.uk/fuel-prices/data/fuel_prices_data.json",
        )
        .with_parser(LocationStrategy::Paired),
        FeedSource::new(
            "Sainsbury's",
            "https://api.sainsburys.co.uk/v1/exports/latest/fuel_prices_data.json",
        ),
        FeedSource::new(
            "SGN Retail",
            "https://www.sgnretail.uk/files/data/SGN_daily_fuel_prices.json",
        )
        .with_parser(LocationStrategy::Paired),
        FeedSource::new(
            "Tesco",
            "https://www.tesco.com/fuel_prices/fuel_prices_data.json",
        ),
    ];

    Registry {
        sources,
        fuel: FuelCatalog::default(),
    }
}

fn validate_registry(registry: &Registry) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for source in &registry.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name must be non-empty".to_string(),
            ));
        }

        let url = source.url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "source '{}' has invalid url '{}'; must be http(s)",
                source.name, source.url
            )));
        }

        if !seen_names.insert(source.name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name: '{}'",
                source.name
            )));
        }
    }

    registry.fuel.validate().map_err(ConfigError::Validation)
}
