//! Rendering surface contract, plus two implementations: one that records calls and
//! one that writes every frame to disk.

use crate::coordinator::{DrilldownFrame, LegendFrame, MapFrame, Tooltip};
use crate::models::ZoomTransform;
use crate::{storage, viz};
use anyhow::Result;
use log::info;
use std::path::{Path, PathBuf};

/// What the core asks of whatever draws the map, legend and chart.
pub trait RenderSurface {
    /// Update polygon fills.
    fn draw_map(&mut self, frame: &MapFrame) -> Result<()>;
    /// Pan/zoom the map geometry.
    fn apply_map_zoom(&mut self, transform: ZoomTransform) -> Result<()>;
    fn draw_legend(&mut self, frame: &LegendFrame) -> Result<()>;
    /// Open (or refresh) the drill-down chart.
    fn draw_drilldown(&mut self, frame: &DrilldownFrame) -> Result<()>;
    fn close_drilldown(&mut self) -> Result<()>;
    /// Show a tooltip, or hide it with `None`.
    fn show_tooltip(&mut self, tooltip: Option<&Tooltip>) -> Result<()>;
}

/// One call received by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Map(MapFrame),
    MapZoom(ZoomTransform),
    Legend(LegendFrame),
    Drilldown(DrilldownFrame),
    CloseDrilldown,
    Tooltip(Option<Tooltip>),
}

/// Keeps every call in order, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn last_map(&self) -> Option<&MapFrame> {
        self.calls.iter().rev().find_map(|c| match c {
            SurfaceCall::Map(m) => Some(m),
            _ => None,
        })
    }

    pub fn last_legend(&self) -> Option<&LegendFrame> {
        self.calls.iter().rev().find_map(|c| match c {
            SurfaceCall::Legend(l) => Some(l),
            _ => None,
        })
    }

    pub fn last_drilldown(&self) -> Option<&DrilldownFrame> {
        self.calls.iter().rev().find_map(|c| match c {
            SurfaceCall::Drilldown(d) => Some(d),
            _ => None,
        })
    }

    /// Whether the most recent drill-down call opened rather than closed the chart.
    pub fn drilldown_open(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                SurfaceCall::Drilldown(_) => Some(true),
                SurfaceCall::CloseDrilldown => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl RenderSurface for RecordingSurface {
    fn draw_map(&mut self, frame: &MapFrame) -> Result<()> {
        self.calls.push(SurfaceCall::Map(frame.clone()));
        Ok(())
    }

    fn apply_map_zoom(&mut self, transform: ZoomTransform) -> Result<()> {
        self.calls.push(SurfaceCall::MapZoom(transform));
        Ok(())
    }

    fn draw_legend(&mut self, frame: &LegendFrame) -> Result<()> {
        self.calls.push(SurfaceCall::Legend(frame.clone()));
        Ok(())
    }

    fn draw_drilldown(&mut self, frame: &DrilldownFrame) -> Result<()> {
        self.calls.push(SurfaceCall::Drilldown(frame.clone()));
        Ok(())
    }

    fn close_drilldown(&mut self) -> Result<()> {
        self.calls.push(SurfaceCall::CloseDrilldown);
        Ok(())
    }

    fn show_tooltip(&mut self, tooltip: Option<&Tooltip>) -> Result<()> {
        self.calls.push(SurfaceCall::Tooltip(tooltip.cloned()));
        Ok(())
    }
}

/// Writes numbered files into a directory: map fills as JSON, legend and
/// drill-down charts as SVG. Tooltips and map zooms are logged only.
#[derive(Debug, Clone)]
pub struct FileSurface {
    dir: PathBuf,
    width: u32,
    height: u32,
    seq: u32,
    last_map: Option<MapFrame>,
    pub written: Vec<PathBuf>,
}

impl FileSurface {
    pub fn new<P: AsRef<Path>>(dir: P, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            width,
            height,
            seq: 0,
            last_map: None,
            written: Vec::new(),
        })
    }

    fn next_path(&mut self, stem: &str, ext: &str) -> PathBuf {
        self.seq += 1;
        self.dir.join(format!("{:04}-{stem}.{ext}", self.seq))
    }
}

impl RenderSurface for FileSurface {
    fn draw_map(&mut self, frame: &MapFrame) -> Result<()> {
        let path = self.next_path("map", "json");
        storage::save_map_json(frame, &path)?;
        self.last_map = Some(frame.clone());
        self.written.push(path);
        Ok(())
    }

    fn apply_map_zoom(&mut self, transform: ZoomTransform) -> Result<()> {
        // geometry lives elsewhere; re-emit the fills with the new transform
        if let Some(mut frame) = self.last_map.take() {
            frame.transform = transform;
            return self.draw_map(&frame);
        }
        info!("map zoom {transform:?}");
        Ok(())
    }

    fn draw_legend(&mut self, frame: &LegendFrame) -> Result<()> {
        let path = self.next_path("legend", "svg");
        viz::plot_legend(frame, &path, self.width, 90)?;
        self.written.push(path);
        Ok(())
    }

    fn draw_drilldown(&mut self, frame: &DrilldownFrame) -> Result<()> {
        let stem = format!("drilldown-{}", frame.country_code);
        let path = self.next_path(&stem, "svg");
        viz::plot_drilldown(frame, &path, self.width, self.height)?;
        self.written.push(path);
        Ok(())
    }

    fn close_drilldown(&mut self) -> Result<()> {
        info!("drill-down closed");
        Ok(())
    }

    fn show_tooltip(&mut self, tooltip: Option<&Tooltip>) -> Result<()> {
        match tooltip {
            Some(t) => match &t.trend {
                Some(trend) => info!("tooltip: {} ({trend})", t.text),
                None => info!("tooltip: {}", t.text),
            },
            None => info!("tooltip hidden"),
        }
        Ok(())
    }
}
