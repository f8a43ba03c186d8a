mod output;
mod progress;
mod session;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use fuelmap_cache::CacheStore;
use fuelmap_classify::ViewportBounds;
use fuelmap_core::{default_registry, load_registry, AppConfig, FuelSelection, Registry};
use fuelmap_feeds::{AggregationOptions, FeedFetcher};

use crate::progress::ProgressPrinter;
use crate::session::{FuelMapSession, RefreshOutcome};

#[derive(Debug, Parser)]
#[command(name = "fuelmap")]
#[command(about = "Aggregate UK fuel-price feeds and classify the stations in view")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the registered feed sources
    Sources,
    /// Fetch every feed now, ignoring the cache, and rewrite the cache
    Refresh,
    /// List brand groups with station counts
    Brands,
    /// Classify the stations inside a viewport
    Classify {
        /// Viewport as south,west,north,east (defaults to the UK)
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: Option<ViewportBounds>,
        /// Fuel code driving the price scale, or "none"
        #[arg(long, default_value = "none")]
        fuel: String,
        /// Exclude a display brand; may be repeated
        #[arg(long = "disable-brand")]
        disable_brand: Vec<String>,
        /// Re-include a display brand after the disables; may be repeated
        #[arg(long = "enable-brand")]
        enable_brand: Vec<String>,
        /// Flip a display brand on or off, applied last; may be repeated
        #[arg(long = "toggle-brand")]
        toggle_brand: Vec<String>,
        /// Fetch fresh data instead of using the cache
        #[arg(long)]
        refresh: bool,
        /// Print per-station marker state as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse `south,west,north,east` into viewport bounds.
fn parse_bbox(raw: &str) -> Result<ViewportBounds, String> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid coordinate '{}': {e}", p.trim()))
        })
        .collect::<Result<_, _>>()?;
    let &[south, west, north, east] = parts.as_slice() else {
        return Err(format!(
            "expected 4 comma-separated values (south,west,north,east), got {}",
            parts.len()
        ));
    };
    if parts.iter().any(|v| !v.is_finite()) {
        return Err("coordinates must be finite".to_string());
    }
    if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
        return Err("latitudes must be within -90..=90".to_string());
    }
    if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
        return Err("longitudes must be within -180..=180".to_string());
    }
    if south > north || west > east {
        return Err("south must not exceed north, nor west exceed east".to_string());
    }
    Ok(ViewportBounds::new(south, west, north, east))
}

fn resolve_registry(config: &AppConfig) -> anyhow::Result<Registry> {
    match &config.registry_path {
        Some(path) => {
            let registry = load_registry(path)?;
            tracing::info!(
                path = %path.display(),
                sources = registry.sources.len(),
                "loaded feed registry"
            );
            Ok(registry)
        }
        None => Ok(default_registry()),
    }
}

fn build_session(config: &AppConfig) -> anyhow::Result<FuelMapSession<FeedFetcher>> {
    let registry = resolve_registry(config)?;
    let fetcher = FeedFetcher::from_config(config)?;
    let cache = CacheStore::new(config.cache_path.clone(), config.cache_duration_ms());
    Ok(FuelMapSession::new(
        registry,
        fetcher,
        AggregationOptions::from_config(config),
        cache,
        Arc::new(Mutex::new(())),
    ))
}

fn report_load(outcome: RefreshOutcome, session: &FuelMapSession<FeedFetcher>) {
    match outcome {
        RefreshOutcome::Loaded {
            total,
            from_cache: true,
        } => {
            let saved = session
                .state()
                .cached_at_ms
                .map(output::format_cached_at)
                .unwrap_or_default();
            eprintln!("Loaded {total} stations from cache (saved {saved})");
        }
        RefreshOutcome::Loaded {
            total,
            from_cache: false,
        } => {
            eprintln!("{}", output::render_report(session.outcomes(), total));
        }
        RefreshOutcome::AlreadyRunning => eprintln!("A refresh is already running"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = fuelmap_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, cache = %config.cache_path.display(), "config loaded");

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("fuelmap: run `fuelmap --help` for commands");
        return Ok(());
    };

    match command {
        Commands::Sources => {
            let registry = resolve_registry(&config)?;
            println!("{}", output::render_sources(&registry));
        }
        Commands::Refresh => {
            let mut session = build_session(&config)?;
            let outcome = session.refresh(&ProgressPrinter).await;
            report_load(outcome, &session);
        }
        Commands::Brands => {
            let mut session = build_session(&config)?;
            let outcome = session.load(&ProgressPrinter).await;
            report_load(outcome, &session);
            println!(
                "{}",
                output::render_brands(&session.brands(), &session.state().filter)
            );
        }
        Commands::Classify {
            bbox,
            fuel,
            disable_brand,
            enable_brand,
            toggle_brand,
            refresh,
            json,
        } => {
            let mut session = build_session(&config)?;
            let outcome = if refresh {
                session.refresh(&ProgressPrinter).await
            } else {
                session.load(&ProgressPrinter).await
            };
            report_load(outcome, &session);

            let mut changes = session.subscribe();
            session.set_viewport(bbox.unwrap_or_else(ViewportBounds::uk));
            session.set_fuel(FuelSelection::parse(&fuel));
            let brands = session.brands();
            for brand in disable_brand.iter().chain(&enable_brand).chain(&toggle_brand) {
                if !brands.contains(brand) {
                    tracing::warn!(brand = %brand, "no stations carry this brand");
                }
            }
            for brand in &disable_brand {
                session.disable_brand(brand);
            }
            for brand in &enable_brand {
                session.enable_brand(brand);
            }
            for brand in &toggle_brand {
                let enabled = session.toggle_brand(brand);
                tracing::debug!(brand = %brand, enabled, "brand toggled");
            }

            while let Ok(change) = changes.try_recv() {
                tracing::debug!(?change, "state changed");
            }

            let classification = session.classify();
            if json {
                println!("{}", output::markers_json(&classification)?);
            } else {
                println!(
                    "{}",
                    output::render_classification(
                        &classification,
                        &session.state().selection,
                        &session.registry().fuel,
                    )
                );
            }
        }
    }

    Ok(())
}
