//! Render Coordinator: turns Data Index + Scale Model + View State into the frames a
//! [`RenderSurface`] draws, and reacts to [`ViewChange`]s.

use crate::color::Color;
use crate::config::RenderConfig;
use crate::index::DataIndex;
use crate::models::{
    Geography, HistoryPoint, LinearAxis, MetricMode, SmoothedPoint, ZoomTarget, ZoomTransform,
    canonical_country_code,
};
use crate::scale::{LegendStop, ScaleModel, format_value};
use crate::smoothing::{smooth, trend_value};
use crate::surface::RenderSurface;
use crate::view_state::{ViewChange, ViewState};
use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// Fill for one country polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryFill {
    pub country_code: String,
    /// `None` means no data for this country/year/mode.
    pub value: Option<f64>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFrame {
    pub year: i32,
    pub mode: MetricMode,
    pub transform: ZoomTransform,
    pub fills: Vec<CountryFill>,
}

impl MapFrame {
    pub fn fill_for(&self, country_code: &str) -> Option<&CountryFill> {
        let key = canonical_country_code(country_code)?;
        self.fills.iter().find(|f| f.country_code == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendTick {
    pub offset: f64,
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendFrame {
    pub mode: MetricMode,
    /// Gradient samples spanning the whole domain.
    pub stops: Vec<LegendStop>,
    pub axis_min: f64,
    pub axis_max: f64,
    pub ticks: Vec<LegendTick>,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrilldownFrame {
    pub country_code: String,
    pub country_name: String,
    pub raw: Vec<HistoryPoint>,
    pub smoothed: Vec<SmoothedPoint>,
    /// Year axis after the chart zoom is applied.
    pub x_axis: LinearAxis,
    /// Temperature axis after the chart zoom is applied.
    pub y_axis: LinearAxis,
    pub transform: Option<ZoomTransform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub country_code: String,
    pub country_name: String,
    pub text: String,
    /// Map-tuned trend up to the current year, when the country has history.
    pub trend: Option<String>,
}

/// Result of [`RenderCoordinator::apply_zoom`]; map and chart are independent.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoomFrame {
    /// Transform for the map geometry; the geometry itself is untouched.
    Map(ZoomTransform),
    /// Rescaled `(x, y)` chart axes.
    Chart { x_axis: LinearAxis, y_axis: LinearAxis },
}

pub struct RenderCoordinator<'a> {
    index: &'a DataIndex,
    scales: &'a ScaleModel,
    geography: &'a Geography,
    config: RenderConfig,
}

impl<'a> RenderCoordinator<'a> {
    pub fn new(
        index: &'a DataIndex,
        scales: &'a ScaleModel,
        geography: &'a Geography,
        config: RenderConfig,
    ) -> Self {
        Self {
            index,
            scales,
            geography,
            config,
        }
    }

    pub fn index(&self) -> &DataIndex {
        self.index
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Fill color for every country polygon in the current year and mode.
    /// Countries the tabular feed doesn't know get the no-data fill.
    pub fn render_map(&self, view: &ViewState) -> MapFrame {
        let (year, mode) = (view.year(), view.mode());
        let fills = self
            .geography
            .countries
            .iter()
            .map(|feature| {
                let value = self
                    .index
                    .lookup(year, &feature.id)
                    .and_then(|r| r.value_for(mode))
                    .filter(|v| v.is_finite());
                CountryFill {
                    country_code: feature.id.clone(),
                    value,
                    color: self.color_for(mode, value),
                }
            })
            .collect();
        MapFrame {
            year,
            mode,
            transform: view.map_transform(),
            fills,
        }
    }

    /// Gradient stops and axis labels for the active scale.
    pub fn render_legend(&self, mode: MetricMode) -> LegendFrame {
        let scale = self.scales.scale(mode);
        let stops = scale.legend_stops(self.config.legend_steps);
        let (axis_min, axis_max) = scale.extent();
        let n = self.config.legend_ticks.max(2) - 1;
        let ticks = (0..=n)
            .map(|i| {
                let offset = i as f64 / n as f64;
                let value = axis_min + (axis_max - axis_min) * offset;
                LegendTick {
                    offset,
                    value,
                    label: format_value(mode, value),
                }
            })
            .collect();
        LegendFrame {
            mode,
            stops,
            axis_min,
            axis_max,
            ticks,
            unit: mode.unit().to_string(),
        }
    }

    /// Raw and smoothed history with padded axes, or `None` without history.
    pub fn render_drilldown(
        &self,
        country_code: &str,
        transform: Option<ZoomTransform>,
    ) -> Option<DrilldownFrame> {
        let history = self.index.history_for(country_code);
        if history.is_empty() {
            return None;
        }
        let raw = history.to_vec();
        let smoothed = smooth(&raw, self.config.chart_filter);

        let (x_base, y_base) = self.base_chart_axes(&raw, &smoothed);
        let (x_axis, y_axis) = match transform {
            Some(t) => (t.rescale_x(&x_base), t.rescale_y(&y_base)),
            None => (x_base, y_base),
        };

        let code = canonical_country_code(country_code)?;
        let country_name = self
            .index
            .country_name(&code)
            .unwrap_or(code.as_str())
            .to_string();
        debug!("drill-down for {code}: {} points", raw.len());
        Some(DrilldownFrame {
            country_code: code,
            country_name,
            raw,
            smoothed,
            x_axis,
            y_axis,
            transform,
        })
    }

    /// Rescale map or chart independently.
    pub fn apply_zoom(
        &self,
        target: ZoomTarget,
        transform: ZoomTransform,
        selected: Option<&str>,
    ) -> Option<ZoomFrame> {
        match target {
            ZoomTarget::Map => Some(ZoomFrame::Map(transform)),
            ZoomTarget::Chart => {
                let frame = self.render_drilldown(selected?, Some(transform))?;
                Some(ZoomFrame::Chart {
                    x_axis: frame.x_axis,
                    y_axis: frame.y_axis,
                })
            }
        }
    }

    /// Hover text for a country in the current year and mode.
    pub fn tooltip(&self, country_code: &str, view: &ViewState) -> Option<Tooltip> {
        let code = canonical_country_code(country_code)?;
        let mode = view.mode();
        let record = self.index.lookup(view.year(), &code);
        let country_name = record
            .map(|r| r.country_name.clone())
            .or_else(|| self.index.country_name(&code).map(str::to_string))
            .or_else(|| {
                self.geography
                    .countries
                    .iter()
                    .find(|f| f.id == code)
                    .and_then(|f| f.name.clone())
            })
            .unwrap_or_else(|| code.clone());
        let text = match record.and_then(|r| r.value_for(mode)) {
            Some(v) if v.is_finite() => format!("{country_name}: {}", format_value(mode, v)),
            _ => format!("{country_name}: No data available"),
        };

        let history = self.index.history_for(&code);
        let upto: Vec<HistoryPoint> = history
            .iter()
            .copied()
            .filter(|p| p.year <= view.year())
            .collect();
        let trend = trend_value(&upto, self.config.map_filter)
            .map(|t| format!("trend {}", format_value(MetricMode::Absolute, t)));

        Some(Tooltip {
            country_code: code,
            country_name,
            text,
            trend,
        })
    }

    /// Draw everything the current view shows.
    pub fn render_all<S: RenderSurface + ?Sized>(
        &self,
        view: &ViewState,
        surface: &mut S,
    ) -> Result<()> {
        surface.draw_map(&self.render_map(view))?;
        surface.draw_legend(&self.render_legend(view.mode()))?;
        if let Some(code) = view.selected_country()
            && let Some(frame) = self.render_drilldown(code, view.chart_transform())
        {
            surface.draw_drilldown(&frame)?;
        }
        Ok(())
    }

    /// Recompute and push whatever `change` invalidated. Runs to completion before returning.
    pub fn on_change<S: RenderSurface + ?Sized>(
        &self,
        change: &ViewChange,
        view: &ViewState,
        surface: &mut S,
    ) -> Result<()> {
        debug!("view change: {change:?}");
        match change {
            ViewChange::Year { .. } => surface.draw_map(&self.render_map(view)),
            ViewChange::Mode(mode) => {
                surface.draw_map(&self.render_map(view))?;
                surface.draw_legend(&self.render_legend(*mode))
            }
            ViewChange::MapTransform { transform, .. } => {
                match self.apply_zoom(ZoomTarget::Map, *transform, None) {
                    Some(ZoomFrame::Map(t)) => surface.apply_map_zoom(t),
                    _ => Ok(()),
                }
            }
            ViewChange::ChartTransform { transform, .. } => {
                match view
                    .selected_country()
                    .and_then(|code| self.render_drilldown(code, *transform))
                {
                    Some(frame) => surface.draw_drilldown(&frame),
                    None => Ok(()),
                }
            }
            ViewChange::Selection(Some(code)) => {
                match self.render_drilldown(code, view.chart_transform()) {
                    Some(frame) => surface.draw_drilldown(&frame),
                    None => surface.close_drilldown(),
                }
            }
            ViewChange::Selection(None) => surface.close_drilldown(),
        }
    }

    fn color_for(&self, mode: MetricMode, value: Option<f64>) -> Color {
        match value {
            Some(v) if v.is_finite() => self.scales.scale(mode).color(v),
            _ => self.config.no_data_color,
        }
    }

    /// Unzoomed axes: years as given (widened by one year each side for a single
    /// point), temperatures padded by the configured amount.
    fn base_chart_axes(
        &self,
        raw: &[HistoryPoint],
        smoothed: &[SmoothedPoint],
    ) -> (LinearAxis, LinearAxis) {
        let cfg = &self.config;
        let m = cfg.chart_margins;

        let first = raw.first().map(|p| p.year).unwrap_or_default() as f64;
        let last = raw.last().map(|p| p.year).unwrap_or_default() as f64;
        let (x0, x1) = if last > first {
            (first, last)
        } else {
            (first - 1.0, last + 1.0)
        };

        let temps = raw
            .iter()
            .map(|p| p.temperature)
            .chain(smoothed.iter().map(|p| p.temperature));
        let (lo, hi) = temps.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let pad = cfg.temperature_padding;

        let x_axis = LinearAxis::new((x0, x1), (m.left, cfg.chart_width - m.right));
        // pixel y grows downward
        let y_axis = LinearAxis::new(
            (lo - pad, hi + pad),
            (cfg.chart_height - m.bottom, m.top),
        );
        (x_axis, y_axis)
    }
}
