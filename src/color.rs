//! Colors and the red–blue perceptual ramp the scales are built on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 8-bit sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (leading `#` optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let h = s.trim().trim_start_matches('#');
        if h.len() != 6 || !h.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&h[0..2], 16).ok()?;
        let g = u8::from_str_radix(&h[2..4], 16).ok()?;
        let b = u8::from_str_radix(&h[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Lower-case `#rrggbb`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation in sRGB space, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * t).round() as u8 };
        Color {
            r: ch(self.r, other.r),
            g: ch(self.g, other.g),
            b: ch(self.b, other.b),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Fill used for countries without data.
pub const NO_DATA: Color = Color::rgb(0xcc, 0xcc, 0xcc);

/// ColorBrewer RdBu, 11 classes, dark red → near white → dark blue.
const RD_BU: [Color; 11] = [
    Color::rgb(0x67, 0x00, 0x1f),
    Color::rgb(0xb2, 0x18, 0x2b),
    Color::rgb(0xd6, 0x60, 0x4d),
    Color::rgb(0xf4, 0xa5, 0x82),
    Color::rgb(0xfd, 0xdb, 0xc7),
    Color::rgb(0xf7, 0xf7, 0xf7),
    Color::rgb(0xd1, 0xe5, 0xf0),
    Color::rgb(0x92, 0xc5, 0xde),
    Color::rgb(0x43, 0x93, 0xc3),
    Color::rgb(0x21, 0x66, 0xac),
    Color::rgb(0x05, 0x30, 0x61),
];

/// Sample the red–blue ramp: `t = 0` is the red end, `t = 1` the blue end,
/// `t = 0.5` the neutral center. `t` is clamped; NaN samples the center.
pub fn interpolate_rd_bu(t: f64) -> Color {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let n = RD_BU.len() - 1;
    let pos = t * n as f64;
    let idx = (pos.floor() as usize).min(n - 1);
    RD_BU[idx].lerp(RD_BU[idx + 1], pos - idx as f64)
}

/// The ramp turned around so that low values are blue and high values red.
pub fn interpolate_cold_hot(t: f64) -> Color {
    interpolate_rd_bu(1.0 - t)
}

/// Blue end of the cold→hot ramp.
pub const COLD: Color = RD_BU[10];
/// Red end of the cold→hot ramp.
pub const HOT: Color = RD_BU[0];
/// Neutral center of the ramp.
pub const NEUTRAL: Color = RD_BU[5];
