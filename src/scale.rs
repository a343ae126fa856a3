//! Scale Model: the two color scales (sequential absolute, diverging relative).
//!
//! Domains are fitted once over the whole dataset, never per year, so a country's
//! color stays comparable across time.

use crate::color::{Color, NO_DATA, interpolate_cold_hot};
use crate::index::DataIndex;
use crate::models::MetricMode;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Half-width of the relative domain when the data has no usable relative changes.
pub const DEFAULT_RELATIVE_EXTENT: f64 = 5.0;

/// Number of legend intervals (the legend has `n + 1` stops).
pub const DEFAULT_LEGEND_STEPS: usize = 10;

/// One sample of a legend gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegendStop {
    /// Position along the gradient, `0.0..=1.0`.
    pub offset: f64,
    pub value: f64,
    pub color: Color,
}

/// A color scale over a fixed numeric domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scale {
    /// `[min, max]`, low → blue, high → red.
    Sequential { domain: [f64; 2] },
    /// `[-m, 0, +m]`, negative → blue, center → neutral, positive → red.
    Diverging { domain: [f64; 3] },
}

impl Scale {
    /// Sequential scale over the extent of `values`; non-finite values are ignored.
    pub fn sequential<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if lo > hi {
            warn!("no absolute values in dataset, sequential scale falls back to [0, 1]");
            return Scale::Sequential { domain: [0.0, 1.0] };
        }
        Scale::Sequential { domain: [lo, hi] }
    }

    /// Diverging scale symmetric around zero, as wide as the largest |change|.
    pub fn diverging<I: IntoIterator<Item = f64>>(changes: I) -> Self {
        let max_abs = changes
            .into_iter()
            .filter(|v| v.is_finite())
            .map(f64::abs)
            .fold(0.0f64, f64::max);
        let m = if max_abs > 0.0 {
            max_abs
        } else {
            warn!(
                "no relative changes in dataset, diverging scale falls back to \
                 ±{DEFAULT_RELATIVE_EXTENT}"
            );
            DEFAULT_RELATIVE_EXTENT
        };
        Scale::Diverging {
            domain: [-m, 0.0, m],
        }
    }

    /// Lowest and highest domain value (the center of a diverging domain is left out).
    pub fn extent(&self) -> (f64, f64) {
        match *self {
            Scale::Sequential { domain } => (domain[0], domain[1]),
            Scale::Diverging { domain } => (domain[0], domain[2]),
        }
    }

    /// Where `value` falls on the ramp, `0.0` (cold end) to `1.0` (hot end), clamped.
    ///
    /// A zero-width sequential domain puts every value at the midpoint.
    pub fn position(&self, value: f64) -> f64 {
        let t = match *self {
            Scale::Sequential { domain: [lo, hi] } => {
                if hi > lo {
                    (value - lo) / (hi - lo)
                } else {
                    0.5
                }
            }
            Scale::Diverging {
                domain: [lo, mid, hi],
            } => {
                if value < mid {
                    if mid > lo {
                        0.5 * (value - lo) / (mid - lo)
                    } else {
                        0.5
                    }
                } else if hi > mid {
                    0.5 + 0.5 * (value - mid) / (hi - mid)
                } else {
                    0.5
                }
            }
        };
        t.clamp(0.0, 1.0)
    }

    /// Color for a present, finite value.
    pub fn color(&self, value: f64) -> Color {
        interpolate_cold_hot(self.position(value))
    }

    /// Color for a possibly missing value; missing or NaN gives [`NO_DATA`].
    pub fn evaluate(&self, value: Option<f64>) -> Color {
        match value {
            Some(v) if v.is_finite() => self.color(v),
            _ => NO_DATA,
        }
    }

    /// `n + 1` evenly spaced samples across [`Scale::extent`].
    ///
    /// For the diverging scale the samples run from `-m` to `+m`, so the gradient's
    /// visual center lines up with zero.
    pub fn legend_stops(&self, n: usize) -> Vec<LegendStop> {
        let n = n.max(1);
        let (lo, hi) = self.extent();
        (0..=n)
            .map(|i| {
                let offset = i as f64 / n as f64;
                let value = lo + (hi - lo) * offset;
                LegendStop {
                    offset,
                    value,
                    color: self.color(value),
                }
            })
            .collect()
    }
}

/// The pair of scales shared by map and legend. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleModel {
    pub absolute: Scale,
    pub relative: Scale,
}

impl ScaleModel {
    pub fn build(index: &DataIndex) -> Self {
        let absolute = Scale::sequential(index.all_absolute_values());
        let relative = Scale::diverging(index.all_relative_changes());
        debug!(
            "scales fitted: absolute {:?}, relative {:?}",
            absolute.extent(),
            relative.extent()
        );
        Self { absolute, relative }
    }

    pub fn scale(&self, mode: MetricMode) -> &Scale {
        match mode {
            MetricMode::Absolute => &self.absolute,
            MetricMode::Relative => &self.relative,
        }
    }

    pub fn evaluate(&self, mode: MetricMode, value: Option<f64>) -> Color {
        self.scale(mode).evaluate(value)
    }

    pub fn legend_stops(&self, mode: MetricMode, n: usize) -> Vec<LegendStop> {
        self.scale(mode).legend_stops(n)
    }
}

/// Legend/tooltip label for a value: plain °C for absolute, signed % for relative.
pub fn format_value(mode: MetricMode, value: f64) -> String {
    match mode {
        MetricMode::Absolute => format!("{value:.1}°C"),
        MetricMode::Relative => format!("{value:+.1}%"),
    }
}
