//! Render configuration. Every field has a default; a JSON file may override any subset.

use crate::color::{Color, NO_DATA};
use crate::scale::DEFAULT_LEGEND_STEPS;
use crate::smoothing::FilterParams;
use crate::view_state::ZoomExtent;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixel margins around the drill-down plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 30.0,
            bottom: 40.0,
            left: 56.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Legend gradient intervals (stops = steps + 1).
    pub legend_steps: usize,
    /// Labelled ticks on the legend axis, both ends included.
    pub legend_ticks: usize,
    /// Padding added below and above the temperature axis, in °C.
    pub temperature_padding: f64,
    pub chart_filter: FilterParams,
    pub map_filter: FilterParams,
    pub chart_width: f64,
    pub chart_height: f64,
    pub chart_margins: Margins,
    pub map_zoom: ZoomExtent,
    pub chart_zoom: ZoomExtent,
    pub no_data_color: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            legend_steps: DEFAULT_LEGEND_STEPS,
            legend_ticks: 5,
            temperature_padding: 1.0,
            chart_filter: FilterParams::CHART,
            map_filter: FilterParams::MAP,
            chart_width: 800.0,
            chart_height: 400.0,
            chart_margins: Margins::default(),
            map_zoom: ZoomExtent::MAP,
            chart_zoom: ZoomExtent::CHART,
            no_data_color: NO_DATA,
        }
    }
}

impl RenderConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse config {}", path.display()))
    }
}
