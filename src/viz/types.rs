//! Public types for the visualization module.

use std::path::Path;

/// Image format written by the plot functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Vector output with native text.
    Svg,
    /// Raster output. No font rasterizer is compiled in, so glyphs are left out.
    Png,
}

impl OutputKind {
    /// `.svg` (any case) → SVG, everything else → PNG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => OutputKind::Svg,
            _ => OutputKind::Png,
        }
    }

    /// Whether the backend can render glyphs.
    pub fn draws_text(self) -> bool {
        matches!(self, OutputKind::Svg)
    }
}
