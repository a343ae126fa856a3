//! Utility functions for visualization: color conversion, series colors, domain checks.

use crate::color::Color;
use plotters::prelude::*;

/// Observed series: Office blue (#4472C4).
pub const OBSERVED_COLOR: RGBColor = RGBColor(68, 114, 196);
/// Smoothed trend: Office orange (#ED7D31).
pub const TREND_COLOR: RGBColor = RGBColor(237, 125, 49);

/// Convert a crate color to a plotters color.
#[inline]
pub fn to_rgb(c: Color) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

/// Whether `v` lies in `domain` (either orientation), with a small tolerance for
/// values that land exactly on a rescaled edge.
pub fn in_domain(v: f64, domain: (f64, f64)) -> bool {
    let (lo, hi) = if domain.0 <= domain.1 {
        domain
    } else {
        (domain.1, domain.0)
    };
    let eps = (hi - lo).abs() * 1e-9;
    v >= lo - eps && v <= hi + eps
}

/// Color at `offset` (0..=1) along piecewise-linear gradient stops.
pub fn gradient_color(stops: &[(f64, Color)], offset: f64) -> Option<Color> {
    let first = stops.first()?;
    if offset <= first.0 {
        return Some(first.1);
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if offset <= b.0 {
            let span = b.0 - a.0;
            let t = if span > 0.0 { (offset - a.0) / span } else { 1.0 };
            return Some(a.1.lerp(b.1, t));
        }
    }
    stops.last().map(|s| s.1)
}
