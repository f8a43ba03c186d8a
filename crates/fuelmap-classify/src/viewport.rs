use geo_types::{coord, Rect};

use fuelmap_core::Location;

/// Geographic viewport; x is longitude, y is latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds(Rect<f64>);

impl ViewportBounds {
    /// Bounds from edge coordinates. Swapped edges are normalized.
    #[must_use]
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self(Rect::new(
            coord! { x: west, y: south },
            coord! { x: east, y: north },
        ))
    }

    /// Great Britain and Northern Ireland.
    #[must_use]
    pub fn uk() -> Self {
        Self::new(49.8, -8.7, 60.9, 1.8)
    }

    #[must_use]
    pub fn south(&self) -> f64 {
        self.0.min().y
    }

    #[must_use]
    pub fn west(&self) -> f64 {
        self.0.min().x
    }

    #[must_use]
    pub fn north(&self) -> f64 {
        self.0.max().y
    }

    #[must_use]
    pub fn east(&self) -> f64 {
        self.0.max().x
    }

    /// Inclusive on every edge; NaN coordinates are never contained.
    #[must_use]
    pub fn contains(&self, location: Location) -> bool {
        let (min, max) = (self.0.min(), self.0.max());
        (min.x..=max.x).contains(&location.longitude) && (min.y..=max.y).contains(&location.latitude)
    }
}

impl std::fmt::Display for ViewportBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.south(),
            self.west(),
            self.north(),
            self.east()
        )
    }
}
