use serde::Serialize;

use fuelmap_core::{resolve_price, FuelCatalog, FuelClass, FuelSelection, StationRecord};

use crate::brands::BrandFilter;
use crate::scale::{PriceColor, PriceScale};
use crate::viewport::ViewportBounds;

/// Tank size used for the headline savings figure.
pub const DEFAULT_TANK_LITRES: f64 = 50.0;

/// A station together with the price that selected it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePick<'a> {
    pub station: &'a StationRecord,
    pub price: f64,
}

/// Classifier output for one (viewport, stations, filter, selection) tuple.
///
/// Borrows the station collection; a new viewport or selection means a new
/// call to [`classify`], never an update of this value.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub scale: PriceScale,
    pub cheapest_petrol: Option<PricePick<'a>>,
    pub cheapest_diesel: Option<PricePick<'a>>,
    pub highest_petrol: Option<PricePick<'a>>,
    pub highest_diesel: Option<PricePick<'a>>,
    pub visible_stations: Vec<&'a StationRecord>,
    /// Selected-fuel price per visible station, parallel to `visible_stations`.
    selected_prices: Vec<Option<f64>>,
}

/// Per-station marker state for the presentation adapter.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker<'a> {
    pub station: &'a StationRecord,
    pub price: Option<f64>,
    pub color: Option<PriceColor>,
    pub cheapest_petrol: bool,
    pub cheapest_diesel: bool,
}

/// Visible price spread for one fuel class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSpread {
    pub class: FuelClass,
    pub cheapest: f64,
    pub highest: f64,
}

impl PriceSpread {
    /// Highest minus cheapest, in pence.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.highest - self.cheapest
    }

    /// Saving in pounds from filling `litres` at the cheapest rather than
    /// the dearest visible station.
    #[must_use]
    pub fn savings_for_tank(&self, litres: f64) -> f64 {
        self.spread() * litres / 100.0
    }
}

/// Running cheapest/highest for one fuel class.
///
/// Cheapest starts at +∞ and only moves on a strictly lower price, so the
/// first station seen at the minimum wins. Highest starts at 0. NaN
/// compares false both ways and is never picked.
struct Extremes<'a> {
    cheapest: Option<PricePick<'a>>,
    highest: Option<PricePick<'a>>,
}

impl<'a> Extremes<'a> {
    fn new() -> Self {
        Self {
            cheapest: None,
            highest: None,
        }
    }

    fn observe(&mut self, station: &'a StationRecord, price: Option<f64>) {
        let Some(price) = price else {
            return;
        };
        let cheapest = self.cheapest.map_or(f64::INFINITY, |p| p.price);
        if price < cheapest {
            self.cheapest = Some(PricePick { station, price });
        }
        let highest = self.highest.map_or(0.0, |p| p.price);
        if price > highest {
            self.highest = Some(PricePick { station, price });
        }
    }
}

/// Classify the visible set.
///
/// A station is visible when its display brand is enabled in `filter` and
/// its coordinates lie inside `viewport` (edges inclusive). Cheapest and
/// highest petrol/diesel use the catalog's canonical codes with alias
/// fallback. The colour scale is built from valid visible prices of the
/// selected fuel, and is empty when the selection is `None`.
#[must_use]
pub fn classify<'a>(
    viewport: &ViewportBounds,
    stations: &'a [StationRecord],
    filter: &BrandFilter,
    selection: &FuelSelection,
    catalog: &FuelCatalog,
) -> Classification<'a> {
    let petrol_code = &catalog.petrol.canonical;
    let diesel_code = &catalog.diesel.canonical;
    let selected_code = selection.code();

    let mut petrol = Extremes::new();
    let mut diesel = Extremes::new();
    let mut visible_stations = Vec::new();
    let mut selected_prices = Vec::new();
    let mut samples = Vec::new();

    for station in stations
        .iter()
        .filter(|s| filter.admits(s) && viewport.contains(s.location()))
    {
        visible_stations.push(station);
        petrol.observe(station, resolve_price(station, petrol_code, catalog));
        diesel.observe(station, resolve_price(station, diesel_code, catalog));

        let selected = selected_code.and_then(|code| resolve_price(station, code, catalog));
        if let Some(price) = selected.filter(|p| !p.is_nan()) {
            samples.push(price);
        }
        selected_prices.push(selected);
    }

    let scale = if selected_code.is_some() {
        PriceScale::from_samples(&samples)
    } else {
        PriceScale::default()
    };

    tracing::debug!(
        visible = visible_stations.len(),
        total = stations.len(),
        selection = %selection,
        bins = scale.bins().len(),
        "classified visible set"
    );

    Classification {
        scale,
        cheapest_petrol: petrol.cheapest,
        cheapest_diesel: diesel.cheapest,
        highest_petrol: petrol.highest,
        highest_diesel: diesel.highest,
        visible_stations,
        selected_prices,
    }
}

fn is_same(pick: Option<PricePick<'_>>, station: &StationRecord) -> bool {
    pick.is_some_and(|p| std::ptr::eq(p.station, station))
}

impl<'a> Classification<'a> {
    /// Marker state for each visible station, in visible order.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker<'a>> {
        self.visible_stations
            .iter()
            .zip(&self.selected_prices)
            .map(|(&station, &price)| Marker {
                station,
                price,
                color: price.and_then(|p| self.scale.color_for(p)),
                cheapest_petrol: is_same(self.cheapest_petrol, station),
                cheapest_diesel: is_same(self.cheapest_diesel, station),
            })
            .collect()
    }

    #[must_use]
    pub fn cheapest(&self, class: FuelClass) -> Option<PricePick<'a>> {
        match class {
            FuelClass::Petrol => self.cheapest_petrol,
            FuelClass::Diesel => self.cheapest_diesel,
        }
    }

    #[must_use]
    pub fn highest(&self, class: FuelClass) -> Option<PricePick<'a>> {
        match class {
            FuelClass::Petrol => self.highest_petrol,
            FuelClass::Diesel => self.highest_diesel,
        }
    }

    /// Visible spread for the class the selected fuel belongs to.
    ///
    /// `None` when nothing is selected, the code has no class, no price is
    /// visible, or the spread is not positive.
    #[must_use]
    pub fn spread_for(
        &self,
        selection: &FuelSelection,
        catalog: &FuelCatalog,
    ) -> Option<PriceSpread> {
        let class = catalog.class_of(selection.code()?)?;
        let spread = PriceSpread {
            class,
            cheapest: self.cheapest(class)?.price,
            highest: self.highest(class)?.price,
        };
        (spread.spread() > 0.0).then_some(spread)
    }
}
