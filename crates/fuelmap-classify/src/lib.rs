//! Visible-set classification: which stations are on screen, which are
//! cheapest, and how the selected fuel's prices map onto a colour scale.
//!
//! Everything here is a pure function of (viewport, stations, brand filter,
//! fuel selection); results are rebuilt from scratch on every call.

pub mod brands;
pub mod classifier;
pub mod scale;
pub mod viewport;

pub use brands::{BrandDirectory, BrandFilter, BrandGroup};
pub use classifier::{classify, Classification, Marker, PricePick, PriceSpread, DEFAULT_TANK_LITRES};
pub use scale::{LegendEntry, PriceColor, PriceScale, PriceScaleBin, N_BINS};
pub use viewport::ViewportBounds;
