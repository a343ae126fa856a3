//! climate_atlas
//!
//! Core of an interactive climate choropleth: per-country, per-year temperature
//! records are indexed once, colored through a sequential (°C) or diverging (%)
//! scale, and drilled into as Kalman-smoothed history charts. Pairs with the
//! `climap` CLI.
//!
//! ### Features
//! - Load a tabular feed (CSV or JSON) and a geography feed (GeoJSON or TopoJSON),
//!   from disk or over HTTP, concurrently
//! - Per-country fills for any year in absolute or relative mode, with a legend
//! - Drill-down charts with raw and smoothed series, independently zoomable
//! - Year and mode survive restarts through a small JSON state file
//! - Frames render to SVG/PNG or to any [`RenderSurface`] you provide
//!
//! ### Example
//! ```no_run
//! use climate_atlas::{Atlas, MemoryStore, RecordingSurface, RenderConfig,
//!     RenderCoordinator, Session, ViewState, source};
//!
//! let loaded = source::load_sources("temps.csv", "world.geojson")?;
//! let atlas = Atlas::from_parsed(loaded.rows);
//! let view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds());
//! let coordinator = RenderCoordinator::new(
//!     &atlas.index,
//!     &atlas.scales,
//!     &loaded.geography,
//!     RenderConfig::default(),
//! );
//! let mut session = Session::new(coordinator, view, RecordingSurface::new());
//! session.start();
//! session.set_year(1990);
//! session.select_country(Some("004"));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod atlas;
pub mod color;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod index;
pub mod models;
pub mod scale;
pub mod session;
pub mod smoothing;
pub mod source;
pub mod storage;
pub mod surface;
pub mod view_state;
pub mod viz;

pub use atlas::Atlas;
pub use config::RenderConfig;
pub use coordinator::{DrilldownFrame, LegendFrame, MapFrame, RenderCoordinator, Tooltip};
pub use error::AtlasError;
pub use index::{DataIndex, History, IngestReport};
pub use models::{Geography, MetricMode, RawRow, Record, ZoomTarget, ZoomTransform};
pub use scale::{Scale, ScaleModel};
pub use session::{Session, UiEvent};
pub use surface::{FileSurface, RecordingSurface, RenderSurface, SurfaceCall};
pub use view_state::{JsonFileStore, MemoryStore, ViewChange, ViewState, ViewStore, YearBounds};
