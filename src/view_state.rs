//! View State: the user-controlled parameters, their persistence, and the change
//! notifications each setter produces.
//!
//! `year` and `mode` are durable (written through a [`ViewStore`] on every successful
//! set); transforms and the selected country live for the session only.

use crate::error::AtlasError;
use crate::models::{MetricMode, ZoomTarget, ZoomTransform, canonical_country_code};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const YEAR_KEY: &str = "year";
pub const MODE_KEY: &str = "mode";

/// Durable string key/value storage.
pub trait ViewStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process store; nothing survives the process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ViewStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object file of string values, rewritten on every write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`. A missing file starts empty; an unreadable one is logged and ignored.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!("ignoring unreadable view state {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, values }
    }

    /// `<config dir>/climate-atlas/view_state.json`, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("climate-atlas"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("view_state.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ViewStore for JsonFileStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let s = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, s).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

/// Inclusive range of years the dataset covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

/// Allowed zoom scale factors for one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomExtent {
    pub min_k: f64,
    pub max_k: f64,
}

impl ZoomExtent {
    pub const MAP: ZoomExtent = ZoomExtent {
        min_k: 1.0,
        max_k: 8.0,
    };
    pub const CHART: ZoomExtent = ZoomExtent {
        min_k: 1.0,
        max_k: 20.0,
    };
}

/// What a setter changed; handed to the render coordinator right away.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewChange {
    /// `clamped_from` holds the rejected request when the year was out of range.
    Year { year: i32, clamped_from: Option<i32> },
    Mode(MetricMode),
    MapTransform { transform: ZoomTransform, clamped: bool },
    ChartTransform { transform: Option<ZoomTransform>, clamped: bool },
    Selection(Option<String>),
}

impl ViewChange {
    /// The out-of-range condition this change recovered from, if any.
    pub fn out_of_range(&self) -> Option<AtlasError> {
        match self {
            ViewChange::Year {
                year,
                clamped_from: Some(requested),
            } => Some(AtlasError::OutOfRange {
                what: "year",
                requested: *requested as f64,
                applied: *year as f64,
            }),
            _ => None,
        }
    }
}

pub struct ViewState {
    year: i32,
    mode: MetricMode,
    map_transform: ZoomTransform,
    chart_transform: Option<ZoomTransform>,
    selected: Option<String>,
    bounds: YearBounds,
    map_extent: ZoomExtent,
    chart_extent: ZoomExtent,
    store: Box<dyn ViewStore>,
}

impl std::fmt::Debug for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewState")
            .field("year", &self.year)
            .field("mode", &self.mode)
            .field("map_transform", &self.map_transform)
            .field("chart_transform", &self.chart_transform)
            .field("selected", &self.selected)
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl ViewState {
    /// Restore year and mode from `store`. Invalid persisted values are replaced
    /// (year → latest year, mode → absolute) and the replacement is written back.
    pub fn hydrate(store: Box<dyn ViewStore>, bounds: YearBounds) -> Self {
        let mut state = Self {
            year: bounds.max,
            mode: MetricMode::default(),
            map_transform: ZoomTransform::IDENTITY,
            chart_transform: None,
            selected: None,
            bounds,
            map_extent: ZoomExtent::MAP,
            chart_extent: ZoomExtent::CHART,
            store,
        };

        let persisted_year = state.store.read(YEAR_KEY);
        match persisted_year.as_deref().map(|s| s.trim().parse::<i32>()) {
            Some(Ok(y)) if bounds.contains(y) => state.year = y,
            Some(_) => {
                warn!(
                    "persisted year {:?} is invalid, resetting to {}",
                    persisted_year, bounds.max
                );
                state.persist(YEAR_KEY, &bounds.max.to_string());
            }
            None => {}
        }

        if let Some(raw) = state.store.read(MODE_KEY) {
            match raw.parse::<MetricMode>() {
                Ok(m) => state.mode = m,
                Err(e) => {
                    warn!("persisted mode is invalid ({e}), resetting to absolute");
                    state.persist(MODE_KEY, MetricMode::Absolute.as_str());
                }
            }
        }
        state
    }

    /// Override the zoom extents (before any transform is set).
    pub fn with_zoom_extents(mut self, map: ZoomExtent, chart: ZoomExtent) -> Self {
        self.map_extent = map;
        self.chart_extent = chart;
        self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn mode(&self) -> MetricMode {
        self.mode
    }

    pub fn map_transform(&self) -> ZoomTransform {
        self.map_transform
    }

    pub fn chart_transform(&self) -> Option<ZoomTransform> {
        self.chart_transform
    }

    pub fn selected_country(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn bounds(&self) -> YearBounds {
        self.bounds
    }

    pub fn store(&self) -> &dyn ViewStore {
        self.store.as_ref()
    }

    /// Set the year. Outside the dataset's bounds the latest year is used instead;
    /// whichever year is applied is persisted.
    pub fn set_year(&mut self, year: i32) -> ViewChange {
        let (applied, clamped_from) = if self.bounds.contains(year) {
            (year, None)
        } else {
            warn!(
                "year {year} outside {}..={}, using {}",
                self.bounds.min, self.bounds.max, self.bounds.max
            );
            (self.bounds.max, Some(year))
        };
        self.year = applied;
        self.persist(YEAR_KEY, &applied.to_string());
        ViewChange::Year {
            year: applied,
            clamped_from,
        }
    }

    pub fn set_mode(&mut self, mode: MetricMode) -> ViewChange {
        self.mode = mode;
        self.persist(MODE_KEY, mode.as_str());
        ViewChange::Mode(mode)
    }

    pub fn set_map_transform(&mut self, transform: ZoomTransform) -> ViewChange {
        let (applied, clamped) = clamp_zoom(transform, self.map_extent, ZoomTarget::Map);
        self.map_transform = applied;
        ViewChange::MapTransform {
            transform: applied,
            clamped,
        }
    }

    pub fn set_chart_transform(&mut self, transform: Option<ZoomTransform>) -> ViewChange {
        let (applied, clamped) = match transform {
            Some(t) => {
                let (t, c) = clamp_zoom(t, self.chart_extent, ZoomTarget::Chart);
                (Some(t), c)
            }
            None => (None, false),
        };
        self.chart_transform = applied;
        ViewChange::ChartTransform {
            transform: applied,
            clamped,
        }
    }

    /// Change the selection. Returns `None` when nothing changed.
    ///
    /// Whether the country has any history is the caller's concern; see
    /// `Session::select_country`.
    pub fn select_country(&mut self, code: Option<&str>) -> Option<ViewChange> {
        let code = code.and_then(canonical_country_code);
        if code == self.selected {
            return None;
        }
        self.selected = code.clone();
        // a new chart starts unzoomed
        self.chart_transform = None;
        Some(ViewChange::Selection(code))
    }

    fn persist(&mut self, key: &str, value: &str) {
        match self.store.write(key, value) {
            Ok(()) => debug!("persisted {key}={value}"),
            Err(e) => warn!("could not persist {key}: {e:#}"),
        }
    }
}

fn clamp_zoom(t: ZoomTransform, extent: ZoomExtent, target: ZoomTarget) -> (ZoomTransform, bool) {
    if !t.is_finite() {
        warn!("non-finite {target:?} zoom {t:?}, resetting");
        return (ZoomTransform::IDENTITY, true);
    }
    let k = t.k.clamp(extent.min_k, extent.max_k);
    if k != t.k {
        warn!("{target:?} zoom scale {} clamped to {k}", t.k);
        (ZoomTransform { k, ..t }, true)
    } else {
        (t, false)
    }
}
