//! Dynamic price colour scale over the selected fuel's visible prices.

use serde::Serialize;

/// Number of bins in a scale whose samples are not all equal.
pub const N_BINS: usize = 5;

/// Bin palette, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceColor {
    Green,
    Aqua,
    Yellow,
    Orange,
    Red,
}

impl PriceColor {
    pub const PALETTE: [PriceColor; N_BINS] = [
        PriceColor::Green,
        PriceColor::Aqua,
        PriceColor::Yellow,
        PriceColor::Orange,
        PriceColor::Red,
    ];

    #[must_use]
    pub fn hex(self) -> &'static str {
        match self {
            PriceColor::Green => "#2ECC40",
            PriceColor::Aqua => "#7FDBFF",
            PriceColor::Yellow => "#FFDC00",
            PriceColor::Orange => "#FFA500",
            PriceColor::Red => "#FF4136",
        }
    }
}

impl std::fmt::Display for PriceColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceScaleBin {
    pub upper_limit: f64,
    pub color: PriceColor,
}

/// One legend row; the first bin (and a single-bin scale) has no lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendEntry {
    pub lower: Option<f64>,
    pub upper: f64,
    pub color: PriceColor,
}

/// Zero, one or [`N_BINS`] bins with ascending upper limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceScale {
    bins: Vec<PriceScaleBin>,
}

impl PriceScale {
    /// Build a scale from visible prices. Non-finite samples are ignored;
    /// no usable samples gives an empty scale.
    ///
    /// Equal min and max yields a single middle-colour bin. Otherwise
    /// `[min, max]` is split into [`N_BINS`] equal-width bins and the last
    /// upper limit is pinned to `max`.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut usable = samples.iter().copied().filter(|p| p.is_finite());
        let Some(first) = usable.next() else {
            return Self::default();
        };
        let (min, max) = usable.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));

        if min == max {
            return Self {
                bins: vec![PriceScaleBin {
                    upper_limit: min,
                    color: PriceColor::PALETTE[N_BINS / 2],
                }],
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let step = (max - min) / N_BINS as f64;
        let bins = PriceColor::PALETTE
            .iter()
            .enumerate()
            .map(|(i, &color)| {
                #[allow(clippy::cast_precision_loss)]
                let upper_limit = if i == N_BINS - 1 {
                    max
                } else {
                    min + step * (i + 1) as f64
                };
                PriceScaleBin { upper_limit, color }
            })
            .collect();
        Self { bins }
    }

    #[must_use]
    pub fn bins(&self) -> &[PriceScaleBin] {
        &self.bins
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// First bin whose upper limit is at or above `price`; prices above every
    /// limit land in the last bin. `None` for an empty scale or a NaN price.
    #[must_use]
    pub fn bin_for(&self, price: f64) -> Option<&PriceScaleBin> {
        if price.is_nan() {
            return None;
        }
        self.bins
            .iter()
            .find(|bin| bin.upper_limit >= price)
            .or_else(|| self.bins.last())
    }

    #[must_use]
    pub fn color_for(&self, price: f64) -> Option<PriceColor> {
        self.bin_for(price).map(|bin| bin.color)
    }

    #[must_use]
    pub fn legend(&self) -> Vec<LegendEntry> {
        let mut lower = None;
        self.bins
            .iter()
            .map(|bin| {
                let entry = LegendEntry {
                    lower,
                    upper: bin.upper_limit,
                    color: bin.color,
                };
                lower = Some(bin.upper_limit);
                entry
            })
            .collect()
    }
}
