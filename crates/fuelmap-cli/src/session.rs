//! Application state owner.
//!
//! `FuelMapSession` holds the station collection and the user's view state
//! (viewport, fuel selection, brand filter). It is the only path that mutates
//! them, and it announces every change on a broadcast channel so a presenter
//! can re-run [`FuelMapSession::classify`].

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use fuelmap_cache::CacheStore;
use fuelmap_classify::{classify, BrandDirectory, BrandFilter, Classification, ViewportBounds};
use fuelmap_core::{AggregateResult, FuelSelection, Registry};
use fuelmap_feeds::{aggregate, AggregationObserver, AggregationOptions, FetchFeed, SourceOutcome};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StateChange {
    StationsLoaded { total: usize, from_cache: bool },
    ViewportChanged(ViewportBounds),
    FuelChanged(FuelSelection),
    FilterChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefreshOutcome {
    Loaded { total: usize, from_cache: bool },
    /// Another refresh holding the same guard was in flight; nothing changed.
    AlreadyRunning,
}

#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub stations: AggregateResult,
    pub filter: BrandFilter,
    pub selection: FuelSelection,
    pub viewport: ViewportBounds,
    /// Epoch-ms stamp of the cache slot the stations came from, if any.
    pub cached_at_ms: Option<i64>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            filter: BrandFilter::default(),
            selection: FuelSelection::None,
            viewport: ViewportBounds::uk(),
            cached_at_ms: None,
        }
    }
}

/// Owns the session state. Sessions writing the same cache slot should share
/// one refresh guard so only one aggregation runs at a time.
pub(crate) struct FuelMapSession<F> {
    registry: Registry,
    fetcher: F,
    options: AggregationOptions,
    cache: CacheStore,
    state: AppState,
    outcomes: Vec<SourceOutcome>,
    events: broadcast::Sender<StateChange>,
    refresh_guard: Arc<Mutex<()>>,
}

impl<F> FuelMapSession<F>
where
    F: FetchFeed + Sync,
{
    pub(crate) fn new(
        registry: Registry,
        fetcher: F,
        options: AggregationOptions,
        cache: CacheStore,
        refresh_guard: Arc<Mutex<()>>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            registry,
            fetcher,
            options,
            cache,
            state: AppState::default(),
            outcomes: Vec::new(),
            events,
            refresh_guard,
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.events.subscribe()
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn state(&self) -> &AppState {
        &self.state
    }

    /// Per-source outcomes of the last aggregation run; empty after a cache hit.
    pub(crate) fn outcomes(&self) -> &[SourceOutcome] {
        &self.outcomes
    }

    /// Startup load: a fresh cache slot skips aggregation entirely.
    pub(crate) async fn load(&mut self, observer: &dyn AggregationObserver) -> RefreshOutcome {
        if let Some(envelope) = self.cache.load() {
            let total = envelope.data.len();
            self.state.stations = envelope.data;
            self.state.cached_at_ms = Some(envelope.timestamp);
            self.outcomes.clear();
            self.notify(StateChange::StationsLoaded {
                total,
                from_cache: true,
            });
            return RefreshOutcome::Loaded {
                total,
                from_cache: true,
            };
        }
        self.refresh(observer).await
    }

    /// Run a full aggregation, replace the station collection and rewrite the
    /// cache slot with whatever was aggregated, even an empty result.
    ///
    /// Returns [`RefreshOutcome::AlreadyRunning`] without fetching when the
    /// refresh guard is held elsewhere.
    pub(crate) async fn refresh(&mut self, observer: &dyn AggregationObserver) -> RefreshOutcome {
        let guard = Arc::clone(&self.refresh_guard);
        let Ok(_running) = guard.try_lock() else {
            tracing::warn!("aggregation already in progress, ignoring refresh");
            return RefreshOutcome::AlreadyRunning;
        };

        let report = aggregate(
            &self.registry.sources,
            &self.fetcher,
            self.options,
            observer,
        )
        .await;

        if let Err(err) = self.cache.save(&report.stations) {
            tracing::error!(
                path = %self.cache.path().display(),
                error = %err,
                "failed to write station cache"
            );
        }

        let total = report.total_stations();
        self.state.stations = report.stations;
        self.state.cached_at_ms = None;
        self.outcomes = report.outcomes;
        self.notify(StateChange::StationsLoaded {
            total,
            from_cache: false,
        });
        RefreshOutcome::Loaded {
            total,
            from_cache: false,
        }
    }

    pub(crate) fn set_viewport(&mut self, viewport: ViewportBounds) {
        self.state.viewport = viewport;
        self.notify(StateChange::ViewportChanged(viewport));
    }

    pub(crate) fn set_fuel(&mut self, selection: FuelSelection) {
        self.state.selection = selection.clone();
        self.notify(StateChange::FuelChanged(selection));
    }

    pub(crate) fn disable_brand(&mut self, brand: &str) {
        self.state.filter.disable(brand);
        self.notify(StateChange::FilterChanged);
    }

    pub(crate) fn enable_brand(&mut self, brand: &str) {
        self.state.filter.enable(brand);
        self.notify(StateChange::FilterChanged);
    }

    /// Flip a brand's visibility; returns whether it is now enabled.
    pub(crate) fn toggle_brand(&mut self, brand: &str) -> bool {
        let enabled = self.state.filter.toggle(brand);
        self.notify(StateChange::FilterChanged);
        enabled
    }

    pub(crate) fn brands(&self) -> BrandDirectory {
        BrandDirectory::from_stations(&self.state.stations)
    }

    pub(crate) fn classify(&self) -> Classification<'_> {
        classify(
            &self.state.viewport,
            &self.state.stations,
            &self.state.filter,
            &self.state.selection,
            &self.registry.fuel,
        )
    }

    fn notify(&self, change: StateChange) {
        // No subscribers is not an error.
        let _ = self.events.send(change);
    }
}
