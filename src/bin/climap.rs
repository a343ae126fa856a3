use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use climate_atlas::source::{self, LoadedSources};
use climate_atlas::view_state::{MODE_KEY, YEAR_KEY};
use climate_atlas::{
    Atlas, FileSurface, JsonFileStore, MemoryStore, MetricMode, RenderConfig, RenderCoordinator,
    Session, UiEvent, ViewState, ViewStore, ZoomTransform,
};
use climate_atlas::{storage, viz};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "climap",
    version,
    about = "Render climate choropleth frames, legends & smoothed drill-down charts"
)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Tabular feed: CSV or JSON rows, local path or http(s) URL.
    #[arg(long, global = true)]
    data: Option<String>,
    /// Geography feed: GeoJSON or TopoJSON, local path or http(s) URL.
    #[arg(long, global = true)]
    geo: Option<String>,
    /// View state file (defaults to the user config dir).
    #[arg(long, global = true)]
    state: Option<PathBuf>,
    /// Keep year/mode in memory only.
    #[arg(long, global = true, default_value_t = false)]
    no_persist: bool,
    /// JSON render config overriding the defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Width of rendered images (default 800, or the config's chart_width).
    #[arg(long, global = true)]
    width: Option<u32>,
    /// Height of rendered charts (default 400, or the config's chart_height).
    #[arg(long, global = true)]
    height: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute map fills for a year and mode.
    Map(MapArgs),
    /// Render the legend for a mode (.svg or .png).
    Legend(LegendArgs),
    /// Render a country's raw and smoothed history chart.
    Drilldown(DrilldownArgs),
    /// Print a country's history with its smoothed trend.
    History(HistoryArgs),
    /// Show or change the persisted year and mode.
    State(StateArgs),
    /// Run a file of UI events through a session, writing every frame to a directory.
    Replay(ReplayArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct MapArgs {
    /// Year to show; defaults to the persisted year.
    #[arg(short, long)]
    year: Option<i32>,
    /// absolute or relative; defaults to the persisted mode.
    #[arg(short, long)]
    mode: Option<MetricMode>,
    /// Save fills to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Also write the legend image here.
    #[arg(long)]
    legend: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LegendArgs {
    #[arg(short, long)]
    mode: Option<MetricMode>,
    /// Image path (.svg or .png).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct DrilldownArgs {
    /// Country code as used by both feeds (e.g. 004 or DEU).
    #[arg(short, long)]
    country: String,
    /// Chart path (.svg or .png).
    #[arg(long)]
    out: PathBuf,
    /// Also save the series pair as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Chart zoom as `k,x,y`.
    #[arg(long, allow_hyphen_values = true)]
    zoom: Option<String>,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[arg(short, long)]
    country: String,
}

#[derive(Args, Debug)]
struct StateArgs {
    #[command(subcommand)]
    action: Option<StateAction>,
}

#[derive(Subcommand, Debug)]
enum StateAction {
    /// Print year and mode.
    Show,
    /// Persist a year, clamped to the data's range (needs --data).
    SetYear { year: i32 },
    /// Persist a mode.
    SetMode { mode: MetricMode },
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// One event per line: `year 1990`, `mode relative`, `click 004`, `hover 004`,
    /// `zoom map 2 0 0`, `zoom chart 4 0 0`, `dismiss`. `#` starts a comment.
    #[arg(long)]
    events: PathBuf,
    /// Directory receiving the rendered frames.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Map(args) => cmd_map(&cli.common, args),
        Command::Legend(args) => cmd_legend(&cli.common, args),
        Command::Drilldown(args) => cmd_drilldown(&cli.common, args),
        Command::History(args) => cmd_history(&cli.common, args),
        Command::State(args) => cmd_state(&cli.common, args),
        Command::Replay(args) => cmd_replay(&cli.common, args),
    }
}

fn load(common: &CommonArgs) -> Result<(LoadedSources, Atlas)> {
    let data = common
        .data
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--data is required for this command"))?;
    let geo = common
        .geo
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--geo is required for this command"))?;
    let loaded = source::load_sources(data, geo)?;
    let atlas = Atlas::from_parsed(loaded.rows.clone());
    if atlas.index.is_empty() {
        bail!("no usable records in {data}");
    }
    for err in &atlas.report.skipped {
        warn!("{err}");
    }
    if !atlas.report.skipped.is_empty() {
        eprintln!(
            "Skipped {} malformed rows ({} accepted)",
            atlas.report.skipped.len(),
            atlas.report.accepted
        );
    }
    Ok((loaded, atlas))
}

fn render_config(common: &CommonArgs) -> Result<RenderConfig> {
    let mut cfg = match &common.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(w) = common.width {
        cfg.chart_width = w as f64;
    }
    if let Some(h) = common.height {
        cfg.chart_height = h as f64;
    }
    Ok(cfg)
}

fn open_store(common: &CommonArgs) -> Box<dyn ViewStore> {
    if common.no_persist {
        return Box::new(MemoryStore::new());
    }
    let path = common.state.clone().unwrap_or_else(JsonFileStore::default_path);
    info!("view state at {}", path.display());
    Box::new(JsonFileStore::open(path))
}

/// Pixel size of rendered images, taken from the chart dimensions.
fn image_size(cfg: &RenderConfig) -> (u32, u32) {
    (cfg.chart_width.round() as u32, cfg.chart_height.round() as u32)
}

fn parse_zoom(s: &str) -> Result<ZoomTransform> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid --zoom '{s}', expected k,x,y"))?;
    match parts.as_slice() {
        [k, x, y] => Ok(ZoomTransform::new(*k, *x, *y)),
        _ => bail!("invalid --zoom '{s}', expected k,x,y"),
    }
}

fn cmd_map(common: &CommonArgs, args: MapArgs) -> Result<()> {
    let (loaded, atlas) = load(common)?;
    let cfg = render_config(common)?;
    let mut view = ViewState::hydrate(open_store(common), atlas.year_bounds())
        .with_zoom_extents(cfg.map_zoom, cfg.chart_zoom);
    if let Some(y) = args.year {
        let change = view.set_year(y);
        if let Some(err) = change.out_of_range() {
            eprintln!("{err}");
        }
    }
    if let Some(m) = args.mode {
        view.set_mode(m);
    }

    let (width, _) = image_size(&cfg);
    let coordinator = RenderCoordinator::new(&atlas.index, &atlas.scales, &loaded.geography, cfg);
    let frame = coordinator.render_map(&view);
    let with_data = frame.fills.iter().filter(|f| f.value.is_some()).count();

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("json"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_map_csv(&frame, path)?,
            "json" => storage::save_map_json(&frame, path)?,
            other => bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} fills to {}", frame.fills.len(), path.display());
    } else {
        for fill in &frame.fills {
            let value = fill
                .value
                .map(|v| climate_atlas::scale::format_value(frame.mode, v))
                .unwrap_or_else(|| "NA".to_string());
            println!("{}  {}  {}", fill.country_code, fill.color.hex(), value);
        }
    }

    if let Some(path) = args.legend.as_ref() {
        viz::plot_legend(&coordinator.render_legend(view.mode()), path, width, 90)?;
        eprintln!("Wrote legend to {}", path.display());
    }
    eprintln!(
        "{} {}: {} of {} countries with data",
        frame.year,
        frame.mode,
        with_data,
        frame.fills.len()
    );
    Ok(())
}

fn cmd_legend(common: &CommonArgs, args: LegendArgs) -> Result<()> {
    let (loaded, atlas) = load(common)?;
    let cfg = render_config(common)?;
    let mode = match args.mode {
        Some(m) => m,
        None => ViewState::hydrate(open_store(common), atlas.year_bounds()).mode(),
    };
    let (width, _) = image_size(&cfg);
    let coordinator = RenderCoordinator::new(&atlas.index, &atlas.scales, &loaded.geography, cfg);
    viz::plot_legend(&coordinator.render_legend(mode), &args.out, width, 90)?;
    eprintln!("Wrote legend to {}", args.out.display());
    Ok(())
}

fn cmd_drilldown(common: &CommonArgs, args: DrilldownArgs) -> Result<()> {
    let (loaded, atlas) = load(common)?;
    let cfg = render_config(common)?;
    let zoom = args.zoom.as_deref().map(parse_zoom).transpose()?;

    // clamp the requested zoom the same way an interactive session would
    let mut view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds())
        .with_zoom_extents(cfg.map_zoom, cfg.chart_zoom);
    view.set_chart_transform(zoom);

    let (width, height) = image_size(&cfg);
    let coordinator = RenderCoordinator::new(&atlas.index, &atlas.scales, &loaded.geography, cfg);
    let Some(frame) = coordinator.render_drilldown(&args.country, view.chart_transform()) else {
        bail!("no temperature history for {}", args.country);
    };
    viz::plot_drilldown(&frame, &args.out, width, height)?;
    eprintln!("Wrote chart to {}", args.out.display());
    if let Some(path) = args.csv.as_ref() {
        storage::save_drilldown_csv(&frame, path)?;
        eprintln!("Saved {} rows to {}", frame.smoothed.len(), path.display());
    }
    Ok(())
}

fn cmd_history(common: &CommonArgs, args: HistoryArgs) -> Result<()> {
    let (loaded, atlas) = load(common)?;
    let cfg = render_config(common)?;
    let coordinator = RenderCoordinator::new(&atlas.index, &atlas.scales, &loaded.geography, cfg);
    let Some(frame) = coordinator.render_drilldown(&args.country, None) else {
        bail!("no temperature history for {}", args.country);
    };
    println!("{} ({})", frame.country_name, frame.country_code);
    for p in &frame.smoothed {
        println!(
            "{}  raw={:.2}  smoothed={:.2}",
            p.year, p.original_temperature, p.temperature
        );
    }
    Ok(())
}

fn cmd_state(common: &CommonArgs, args: StateArgs) -> Result<()> {
    let action = args.action.unwrap_or(StateAction::Show);
    if common.data.is_none() {
        return state_without_data(open_store(common), action);
    }

    let (_, atlas) = load(common)?;
    let mut view = ViewState::hydrate(open_store(common), atlas.year_bounds());
    match action {
        StateAction::Show => {}
        StateAction::SetYear { year } => {
            if let Some(err) = view.set_year(year).out_of_range() {
                eprintln!("{err}");
            }
        }
        StateAction::SetMode { mode } => {
            view.set_mode(mode);
        }
    }
    print_state(view.store());
    Ok(())
}

/// Without a dataset there are no year bounds, so the stored year is left untouched.
fn state_without_data(mut store: Box<dyn ViewStore>, action: StateAction) -> Result<()> {
    match action {
        StateAction::Show => {}
        StateAction::SetYear { .. } => {
            bail!("set-year needs --data to check the year against the dataset")
        }
        StateAction::SetMode { mode } => store.write(MODE_KEY, mode.as_str())?,
    }
    print_state(store.as_ref());
    Ok(())
}

fn print_state(store: &dyn ViewStore) {
    let year = store.read(YEAR_KEY).unwrap_or_else(|| "unset".to_string());
    let mode = store
        .read(MODE_KEY)
        .and_then(|m| m.parse::<MetricMode>().ok())
        .unwrap_or_default();
    println!("year={year} mode={mode}");
}

fn cmd_replay(common: &CommonArgs, args: ReplayArgs) -> Result<()> {
    let (loaded, atlas) = load(common)?;
    let cfg = render_config(common)?;
    let text = std::fs::read_to_string(&args.events)
        .with_context(|| format!("read {}", args.events.display()))?;

    let mut events = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let ev: UiEvent = line
            .parse()
            .map_err(|e| anyhow::anyhow!("line {}: {}", i + 1, e))?;
        events.push(ev);
    }

    let view = ViewState::hydrate(open_store(common), atlas.year_bounds())
        .with_zoom_extents(cfg.map_zoom, cfg.chart_zoom);
    let (width, height) = image_size(&cfg);
    let coordinator = RenderCoordinator::new(&atlas.index, &atlas.scales, &loaded.geography, cfg);
    let surface = FileSurface::new(&args.out_dir, width, height)?;
    let mut session = Session::new(coordinator, view, surface);
    session.start();
    for ev in events {
        if let Some(err) = session.dispatch(ev).and_then(|c| c.out_of_range()) {
            eprintln!("{err}");
        }
    }
    let written = session.into_surface().written;
    eprintln!(
        "Wrote {} frames to {}",
        written.len(),
        args.out_dir.display()
    );
    Ok(())
}
