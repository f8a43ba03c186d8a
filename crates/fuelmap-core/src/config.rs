use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_RELAYS: &str = "https://api.allorigins.win/raw?url=,https://cors.eu.org/";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or no delivery strategy is left.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid or no delivery strategy is left.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("FUELMAP_ENV", "development"));
    let log_level = or_default("FUELMAP_LOG_LEVEL", "info");
    let registry_path = lookup("FUELMAP_REGISTRY_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let cache_path = PathBuf::from(or_default(
        "FUELMAP_CACHE_PATH",
        "./.cache/fuelmap/stations.json",
    ));
    let cache_duration_secs = parse_u64("FUELMAP_CACHE_DURATION_SECS", "43200")?;
    let fetch_timeout_secs = parse_u64("FUELMAP_FETCH_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("FUELMAP_USER_AGENT", "fuelmap/0.1 (fuel-price-aggregator)");
    let direct_fetch = parse_bool("FUELMAP_DIRECT_FETCH", "true")?;
    let relays = parse_relays(&or_default("FUELMAP_RELAYS", DEFAULT_RELAYS));
    let max_concurrent_sources = parse_usize("FUELMAP_MAX_CONCURRENT_SOURCES", "4")?;
    let inter_request_delay_ms = parse_u64("FUELMAP_INTER_REQUEST_DELAY_MS", "250")?;
    let fetch_max_retries = parse_u32("FUELMAP_FETCH_MAX_RETRIES", "0")?;
    let fetch_retry_backoff_ms = parse_u64("FUELMAP_FETCH_RETRY_BACKOFF_MS", "500")?;

    if !direct_fetch && relays.is_empty() {
        return Err(ConfigError::Validation(
            "no delivery strategy: FUELMAP_DIRECT_FETCH is off and FUELMAP_RELAYS is empty"
                .to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        registry_path,
        cache_path,
        cache_duration_secs,
        fetch_timeout_secs,
        user_agent,
        direct_fetch,
        relays,
        max_concurrent_sources,
        inter_request_delay_ms,
        fetch_max_retries,
        fetch_retry_backoff_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_relays(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_production() {
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_test() {
        assert_eq!(parse_environment("test"), Environment::Test);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn build_app_config_uses_defaults_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");

        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.registry_path.is_none());
        assert_eq!(
            cfg.cache_path.to_string_lossy(),
            "./.cache/fuelmap/stations.json"
        );
        assert_eq!(cfg.cache_duration_secs, 43_200);
        assert_eq!(cfg.cache_duration_ms(), 43_200_000);
        assert_eq!(cfg.fetch_timeout_secs, 30);
        assert!(cfg.direct_fetch);
        assert_eq!(
            cfg.relays,
            vec![
                "https://api.allorigins.win/raw?url=".to_string(),
                "https://cors.eu.org/".to_string()
            ]
        );
        assert_eq!(cfg.max_concurrent_sources, 4);
        assert_eq!(cfg.inter_request_delay_ms, 250);
        assert_eq!(cfg.fetch_max_retries, 0);
        assert_eq!(cfg.fetch_retry_backoff_ms, 500);
    }

    #[test]
    fn build_app_config_reads_overrides() {
        let mut map = HashMap::new();
        map.insert("FUELMAP_ENV", "production");
        map.insert("FUELMAP_REGISTRY_PATH", "/etc/fuelmap/registry.yaml");
        map.insert("FUELMAP_CACHE_DURATION_SECS", "60");
        map.insert("FUELMAP_DIRECT_FETCH", "no");
        map.insert("FUELMAP_RELAYS", " https://relay.example/?u= , ");
        map.insert("FUELMAP_MAX_CONCURRENT_SOURCES", "1");

        let cfg = build_app_config(lookup_from_map(&map)).expect("overrides should be valid");
        assert_eq!(cfg.env, Environment::Production);
        assert_eq!(
            cfg.registry_path.as_deref().map(|p| p.to_string_lossy().to_string()),
            Some("/etc/fuelmap/registry.yaml".to_string())
        );
        assert_eq!(cfg.cache_duration_secs, 60);
        assert!(!cfg.direct_fetch);
        assert_eq!(cfg.relays, vec!["https://relay.example/?u=".to_string()]);
        assert_eq!(cfg.max_concurrent_sources, 1);
    }

    #[test]
    fn build_app_config_rejects_non_numeric_duration() {
        let mut map = HashMap::new();
        map.insert("FUELMAP_CACHE_DURATION_SECS", "twelve hours");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FUELMAP_CACHE_DURATION_SECS"),
            "expected InvalidEnvVar(FUELMAP_CACHE_DURATION_SECS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_bad_boolean() {
        let mut map = HashMap::new();
        map.insert("FUELMAP_DIRECT_FETCH", "maybe");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "FUELMAP_DIRECT_FETCH"),
            "expected InvalidEnvVar(FUELMAP_DIRECT_FETCH), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_requires_at_least_one_strategy() {
        let mut map = HashMap::new();
        map.insert("FUELMAP_DIRECT_FETCH", "false");
        map.insert("FUELMAP_RELAYS", "");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::Validation(_))),
            "expected Validation error, got: {result:?}"
        );
    }
}
