//! Visualization: render drill-down charts and legend bars to **SVG** or **PNG**.
//!
//! - Observed series as line + markers, smoothed trend as a heavier line
//! - Axes follow the frame's (possibly zoomed) domains; points outside are skipped
//! - Legend bar: continuous gradient from the frame's stops with labelled ticks
//!
//! Text is written natively by the SVG backend. PNG output carries the same
//! geometry without glyphs (caption, tick labels and series key are left out),
//! since no font rasterizer is compiled in.

pub mod legend;
pub mod text;
pub mod types;
pub mod util;

pub use legend::plot_legend;
pub use types::OutputKind;

use crate::coordinator::DrilldownFrame;
use anyhow::{Result, anyhow};

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters::style::FontFamily;

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;

use text::truncate_to_width;
use util::{OBSERVED_COLOR, TREND_COLOR, in_domain};

/// Render a drill-down chart (observed + smoothed temperatures) to `out_path`.
/// The format follows the file extension (`.svg`, anything else → PNG).
pub fn plot_drilldown<P: AsRef<Path>>(
    frame: &DrilldownFrame,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    if frame.raw.is_empty() {
        return Err(anyhow!("no history to plot for {}", frame.country_code));
    }
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();

    let kind = OutputKind::from_path(out_path);
    match kind {
        OutputKind::Svg => {
            let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
            draw_drilldown(root, frame, kind.draws_text())
        }
        OutputKind::Png => {
            let root =
                BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
            draw_drilldown(root, frame, kind.draws_text())
        }
    }
}

fn draw_drilldown<DB>(
    root: DrawingArea<DB, Shift>,
    frame: &DrilldownFrame,
    with_text: bool,
) -> Result<()>
where
    DB: DrawingBackend,
{
    const MARGIN: u32 = 16;
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let (x0, x1) = frame.x_axis.domain;
    let (y0, y1) = frame.y_axis.domain;
    let (w, _) = root.dim_in_pixel();
    let title = truncate_to_width(
        &format!("{} – temperature history", frame.country_name),
        20,
        w.saturating_sub(2 * MARGIN),
    );

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(MARGIN)
        .set_label_area_size(LabelAreaPosition::Left, 56)
        .set_label_area_size(LabelAreaPosition::Bottom, 44);
    if with_text {
        builder.caption(title, (FontFamily::SansSerif, 20));
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(|e| anyhow!("{:?}", e))?;

    let x_label_fmt = |x: &f64| (x.round() as i32).to_string();
    let y_label_fmt = |v: &f64| format!("{v:.1}");
    let x_span = (x1 - x0).round().max(1.0) as usize;

    let mut mesh = chart.configure_mesh();
    if with_text {
        mesh.x_desc("Year")
            .y_desc("Temperature (°C)")
            .x_labels((x_span + 1).min(12))
            .y_labels(8)
            .x_label_formatter(&x_label_fmt)
            .y_label_formatter(&y_label_fmt)
            .label_style((FontFamily::SansSerif, 12))
            .axis_desc_style((FontFamily::SansSerif, 14));
    } else {
        // no key points means no label glyphs, only the axis lines
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(|e| anyhow!("{:?}", e))?;

    let visible = |x: f64, y: f64| {
        in_domain(x, frame.x_axis.domain) && in_domain(y, frame.y_axis.domain)
    };

    let observed: Vec<(f64, f64)> = frame
        .raw
        .iter()
        .map(|p| (p.year as f64, p.temperature))
        .filter(|(x, y)| visible(*x, *y))
        .collect();
    let trend: Vec<(f64, f64)> = frame
        .smoothed
        .iter()
        .map(|p| (p.year as f64, p.temperature))
        .filter(|(x, y)| visible(*x, *y))
        .collect();

    let observed_style = ShapeStyle {
        color: OBSERVED_COLOR.to_rgba(),
        filled: false,
        stroke_width: 1,
    };
    chart
        .draw_series(LineSeries::new(observed.clone(), observed_style))
        .map_err(|e| anyhow!("{:?}", e))?
        .label("Observed")
        .legend(|(x, y)| {
            EmptyElement::at((x, y)) + Circle::new((x + 8, y), 4, OBSERVED_COLOR.filled())
        });
    chart
        .draw_series(
            observed
                .iter()
                .map(|(x, y)| Circle::new((*x, *y), 2, OBSERVED_COLOR.filled())),
        )
        .map_err(|e| anyhow!("{:?}", e))?;

    let trend_style = ShapeStyle {
        color: TREND_COLOR.to_rgba(),
        filled: false,
        stroke_width: 3,
    };
    chart
        .draw_series(LineSeries::new(trend, trend_style))
        .map_err(|e| anyhow!("{:?}", e))?
        .label("Smoothed trend")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 16, y)], TREND_COLOR.stroke_width(3))
        });

    if with_text {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .label_font((FontFamily::SansSerif, 13))
            .draw()
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
