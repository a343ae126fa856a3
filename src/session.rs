//! Interactive session: owns the [`ViewState`] and a [`RenderSurface`], and routes
//! every setter through the [`RenderCoordinator`] before returning.
//!
//! Everything runs on the caller's thread; one event is handled to completion
//! before the next is looked at.

use crate::coordinator::RenderCoordinator;
use crate::models::{MetricMode, ZoomTarget, ZoomTransform};
use crate::surface::RenderSurface;
use crate::view_state::{ViewChange, ViewState};
use log::{debug, warn};
use std::str::FromStr;

/// Discrete UI events the session understands.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Pointer entered a country (`Some`) or left the map (`None`).
    Hover(Option<String>),
    /// Country polygon clicked.
    Click(String),
    Zoom {
        target: ZoomTarget,
        transform: ZoomTransform,
    },
    SetYear(i32),
    SetMode(MetricMode),
    /// Close the drill-down.
    Dismiss,
}

impl FromStr for UiEvent {
    type Err = String;

    /// Line format used by `climap replay`:
    /// `year 1990`, `mode relative`, `click 004`, `hover 004`, `hover`,
    /// `zoom map 2 -100 -50`, `zoom chart 4 0 0`, `dismiss`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or("empty event")?.to_ascii_lowercase();
        let rest: Vec<&str> = parts.collect();
        let num = |s: &str| s.parse::<f64>().map_err(|e| format!("bad number '{s}': {e}"));
        match (verb.as_str(), rest.as_slice()) {
            ("year", [y]) => y
                .parse::<i32>()
                .map(UiEvent::SetYear)
                .map_err(|e| format!("bad year '{y}': {e}")),
            ("mode", [m]) => m.parse::<MetricMode>().map(UiEvent::SetMode),
            ("click", [c]) => Ok(UiEvent::Click(c.to_string())),
            ("hover", []) => Ok(UiEvent::Hover(None)),
            ("hover", [c]) => Ok(UiEvent::Hover(Some(c.to_string()))),
            ("zoom", [target, k, x, y]) => {
                let target = match target.to_ascii_lowercase().as_str() {
                    "map" => ZoomTarget::Map,
                    "chart" => ZoomTarget::Chart,
                    other => return Err(format!("unknown zoom target '{other}'")),
                };
                Ok(UiEvent::Zoom {
                    target,
                    transform: ZoomTransform::new(num(k)?, num(x)?, num(y)?),
                })
            }
            ("dismiss", []) => Ok(UiEvent::Dismiss),
            _ => Err(format!("unrecognized event '{line}'")),
        }
    }
}

pub struct Session<'a, S: RenderSurface> {
    coordinator: RenderCoordinator<'a>,
    view: ViewState,
    surface: S,
}

impl<'a, S: RenderSurface> Session<'a, S> {
    pub fn new(coordinator: RenderCoordinator<'a>, view: ViewState, surface: S) -> Self {
        Self {
            coordinator,
            view,
            surface,
        }
    }

    /// Initial draw of map, legend and (if any) drill-down.
    pub fn start(&mut self) {
        if let Err(e) = self.coordinator.render_all(&self.view, &mut self.surface) {
            warn!("initial render failed: {e:#}");
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn coordinator(&self) -> &RenderCoordinator<'a> {
        &self.coordinator
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Returns the applied change; an out-of-range year comes back clamped.
    pub fn set_year(&mut self, year: i32) -> ViewChange {
        let change = self.view.set_year(year);
        self.notify(&change);
        change
    }

    pub fn set_mode(&mut self, mode: MetricMode) -> ViewChange {
        let change = self.view.set_mode(mode);
        self.notify(&change);
        change
    }

    pub fn set_map_transform(&mut self, transform: ZoomTransform) -> ViewChange {
        let change = self.view.set_map_transform(transform);
        self.notify(&change);
        change
    }

    pub fn set_chart_transform(&mut self, transform: Option<ZoomTransform>) -> ViewChange {
        let change = self.view.set_chart_transform(transform);
        self.notify(&change);
        change
    }

    /// Open the drill-down for `code`, or close it with `None`.
    ///
    /// A country without any history is ignored: no state change, no render.
    pub fn select_country(&mut self, code: Option<&str>) -> Option<ViewChange> {
        if let Some(c) = code
            && self.coordinator.index().history_for(c).is_empty()
        {
            debug!("no history for {c}, drill-down stays as is");
            return None;
        }
        let change = self.view.select_country(code)?;
        self.notify(&change);
        Some(change)
    }

    /// Show or hide the tooltip for a hovered country.
    pub fn hover(&mut self, code: Option<&str>) {
        let tooltip = code.and_then(|c| self.coordinator.tooltip(c, &self.view));
        if let Err(e) = self.surface.show_tooltip(tooltip.as_ref()) {
            warn!("tooltip render failed: {e:#}");
        }
    }

    /// Handle one UI event to completion.
    pub fn dispatch(&mut self, event: UiEvent) -> Option<ViewChange> {
        match event {
            UiEvent::Hover(code) => {
                self.hover(code.as_deref());
                None
            }
            UiEvent::Click(code) => self.select_country(Some(&code)),
            UiEvent::Zoom {
                target: ZoomTarget::Map,
                transform,
            } => Some(self.set_map_transform(transform)),
            UiEvent::Zoom {
                target: ZoomTarget::Chart,
                transform,
            } => {
                if self.view.selected_country().is_none() {
                    debug!("chart zoom ignored, no drill-down open");
                    return None;
                }
                Some(self.set_chart_transform(Some(transform)))
            }
            UiEvent::SetYear(y) => Some(self.set_year(y)),
            UiEvent::SetMode(m) => Some(self.set_mode(m)),
            UiEvent::Dismiss => self.select_country(None),
        }
    }

    fn notify(&mut self, change: &ViewChange) {
        if let Err(e) = self.coordinator.on_change(change, &self.view, &mut self.surface) {
            warn!("render after {change:?} failed: {e:#}");
        }
    }
}
