//! Legend bar: a continuous gradient with a labelled value axis underneath.

use anyhow::{Result, anyhow};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;

use super::text::centered_label_x;
use super::types::OutputKind;
use super::util::{gradient_color, to_rgb};
use crate::coordinator::LegendFrame;
use crate::models::MetricMode;

/// Render the legend for `frame` to `out_path` (`.svg` or PNG).
pub fn plot_legend<P: AsRef<Path>>(
    frame: &LegendFrame,
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    if frame.stops.len() < 2 {
        return Err(anyhow!("legend needs at least two stops"));
    }
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    let kind = OutputKind::from_path(out_path);
    match kind {
        OutputKind::Svg => {
            let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
            draw_legend_bar(&root, frame, kind.draws_text())?;
            root.present().map_err(|e| anyhow!("{:?}", e))
        }
        OutputKind::Png => {
            let root =
                BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
            draw_legend_bar(&root, frame, kind.draws_text())?;
            root.present().map_err(|e| anyhow!("{:?}", e))
        }
    }
}

fn legend_title(mode: MetricMode) -> &'static str {
    match mode {
        MetricMode::Absolute => "Mean temperature (°C)",
        MetricMode::Relative => "Change vs. prior period (%)",
    }
}

/// Draw the gradient bar and tick marks onto `area`, plus title and tick labels
/// when `with_text` is set.
pub fn draw_legend_bar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    frame: &LegendFrame,
    with_text: bool,
) -> Result<()> {
    area.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    // Layout constants
    let font_px: u32 = 12;
    let title_font_px: u32 = 14;
    let pad_x: i32 = 24;
    let title_y: i32 = 6;
    let bar_top: i32 = title_y + title_font_px as i32 + 6;
    let bar_h: i32 = 16;
    let tick_len: i32 = 5;

    let (w_u32, _) = area.dim_in_pixel();
    let w = w_u32 as i32;
    let bar_w = (w - 2 * pad_x).max(2);

    if with_text {
        let title_style = TextStyle::from((FontFamily::SansSerif, title_font_px))
            .pos(Pos::new(HPos::Left, VPos::Top));
        area.draw(&Text::new(
            legend_title(frame.mode),
            (pad_x, title_y),
            title_style,
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
    }

    // Gradient: one pixel column at a time.
    let stops: Vec<(f64, crate::color::Color)> =
        frame.stops.iter().map(|s| (s.offset, s.color)).collect();
    for i in 0..bar_w {
        let offset = i as f64 / (bar_w - 1).max(1) as f64;
        let Some(c) = gradient_color(&stops, offset) else {
            continue;
        };
        let x = pad_x + i;
        area.draw(&Rectangle::new(
            [(x, bar_top), (x + 1, bar_top + bar_h)],
            to_rgb(c).filled(),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
    }
    area.draw(&Rectangle::new(
        [(pad_x, bar_top), (pad_x + bar_w, bar_top + bar_h)],
        BLACK.mix(0.4).stroke_width(1),
    ))
    .map_err(|e| anyhow!("{:?}", e))?;

    // Axis: ticks at the frame's labelled positions (domain min/max for relative mode).
    let label_style =
        TextStyle::from((FontFamily::SansSerif, font_px)).pos(Pos::new(HPos::Left, VPos::Top));
    let axis_y = bar_top + bar_h;
    for tick in &frame.ticks {
        let x = pad_x + (tick.offset * (bar_w - 1) as f64).round() as i32;
        area.draw(&PathElement::new(
            vec![(x, axis_y), (x, axis_y + tick_len)],
            BLACK.stroke_width(1),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
        if !with_text {
            continue;
        }
        let lx = centered_label_x(&tick.label, font_px, x, w);
        area.draw(&Text::new(
            tick.label.as_str(),
            (lx, axis_y + tick_len + 2),
            label_style.clone(),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}
