use climate_atlas::color::NO_DATA;
use climate_atlas::coordinator::ZoomFrame;
use climate_atlas::{
    Atlas, Geography, MemoryStore, MetricMode, RecordingSurface, RenderConfig, RenderCoordinator,
    SurfaceCall, ViewChange, ViewState, ZoomTarget, ZoomTransform, storage,
};

const CSV: &str = "\
year,country_code,country_name,absolute,relative
1850,004,Afghanistan,14.2,
1900,004,Afghanistan,14.6,2.8
2014,004,Afghanistan,15.1,-1.2
2014,276,Germany,9.6,4.0
2014,716,Zimbabwe,,1.0
";

fn atlas() -> Atlas {
    Atlas::from_parsed(storage::read_rows(CSV).unwrap())
}

fn geo() -> Geography {
    Geography::from_ids(["4", "276", "716", "840"])
}

fn view(atlas: &Atlas) -> ViewState {
    ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds())
}

#[test]
fn map_frame_has_one_fill_per_polygon() {
    let atlas = atlas();
    let geo = geo();
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let view = view(&atlas);

    let frame = coord.render_map(&view);
    assert_eq!(frame.year, 2014);
    assert_eq!(frame.mode, MetricMode::Absolute);
    assert_eq!(frame.fills.len(), 4);

    let afg = frame.fill_for("004").unwrap();
    assert_eq!(afg.value, Some(15.1));
    assert_ne!(afg.color, NO_DATA);
    // present in the feed but without an absolute value
    assert_eq!(frame.fill_for("716").unwrap().color, NO_DATA);
    // polygon unknown to the tabular feed
    assert_eq!(frame.fill_for("840").unwrap().value, None);
    assert_eq!(frame.fill_for("840").unwrap().color, NO_DATA);
}

#[test]
fn relative_mode_uses_changes() {
    let atlas = atlas();
    let geo = geo();
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let mut view = view(&atlas);
    view.set_mode(MetricMode::Relative);

    let frame = coord.render_map(&view);
    assert_eq!(frame.fill_for("716").unwrap().value, Some(1.0));
    assert_eq!(frame.fill_for("276").unwrap().value, Some(4.0));
}

#[test]
fn legend_ticks_span_the_domain() {
    let atlas = atlas();
    let geo = geo();
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());

    let legend = coord.render_legend(MetricMode::Relative);
    assert_eq!(legend.stops.len(), 11);
    assert_eq!((legend.axis_min, legend.axis_max), (-4.0, 4.0));
    assert_eq!(legend.ticks.len(), 5);
    assert_eq!(legend.ticks.first().unwrap().label, "-4.0%");
    assert_eq!(legend.ticks.last().unwrap().label, "+4.0%");
    assert_eq!(legend.unit, "%");

    let legend = coord.render_legend(MetricMode::Absolute);
    assert_eq!(legend.ticks.first().unwrap().label, "9.6°C");
    assert_eq!(legend.unit, "°C");
}

#[test]
fn drilldown_has_both_series_and_padded_axes() {
    let atlas = atlas();
    let geo = geo();
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());

    let frame = coord.render_drilldown("4", None).unwrap();
    assert_eq!(frame.country_code, "004");
    assert_eq!(frame.country_name, "Afghanistan");
    assert_eq!(frame.raw.len(), 3);
    assert_eq!(frame.smoothed.len(), 3);
    assert_eq!(frame.x_axis.domain, (1850.0, 2014.0));
    let (y0, y1) = frame.y_axis.domain;
    assert!(y0 <= 14.2 - 1.0 + 1e-9);
    assert!(y1 >= 15.1 + 1.0 - 1e-9);
    // pixel y grows downward
    assert!(frame.y_axis.range.0 > frame.y_axis.range.1);

    assert!(coord.render_drilldown("716", None).is_none());
    assert!(coord.render_drilldown("840", None).is_none());
}

#[test]
fn single_year_history_gets_a_widened_axis() {
    let atlas = atlas();
    let geo = geo();
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let frame = coord.render_drilldown("276", None).unwrap();
    assert_eq!(frame.x_axis.domain, (2013.0, 2015.0));
}

#[test]
fn chart_zoom_narrows_the_year_axis() {
    let atlas = atlas();
    let geo = geo();
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let base = coord.render_drilldown("004", None).unwrap();

    let Some(ZoomFrame::Chart { x_axis, .. }) = coord.apply_zoom(
        ZoomTarget::Chart,
        ZoomTransform::new(2.0, 0.0, 0.0),
        Some("004"),
    ) else {
        panic!("expected a chart zoom frame");
    };
    let base_span = base.x_axis.domain.1 - base.x_axis.domain.0;
    let zoomed_span = x_axis.domain.1 - x_axis.domain.0;
    assert!((zoomed_span - base_span / 2.0).abs() < 1e-9);

    // map zoom passes the transform through untouched
    let t = ZoomTransform::new(3.0, -10.0, 5.0);
    assert_eq!(
        coord.apply_zoom(ZoomTarget::Map, t, None),
        Some(ZoomFrame::Map(t))
    );
    assert_eq!(coord.apply_zoom(ZoomTarget::Chart, t, None), None);
}

#[test]
fn tooltip_text_and_trend() {
    let atlas = atlas();
    let geo = geo();
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let mut view = view(&atlas);

    let tip = coord.tooltip("004", &view).unwrap();
    assert_eq!(tip.text, "Afghanistan: 15.1°C");
    assert!(tip.trend.as_deref().unwrap().starts_with("trend "));

    let tip = coord.tooltip("716", &view).unwrap();
    assert_eq!(tip.text, "Zimbabwe: No data available");
    assert_eq!(tip.trend, None);

    view.set_year(1900);
    let tip = coord.tooltip("276", &view).unwrap();
    assert_eq!(tip.text, "Germany: No data available");
}

#[test]
fn changes_are_routed_to_the_right_surface_calls() {
    let atlas = atlas();
    let geo = geo();
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let mut view = view(&atlas);
    let mut surface = RecordingSurface::new();

    let change = view.set_year(1900);
    coord.on_change(&change, &view, &mut surface).unwrap();
    assert!(matches!(surface.calls.as_slice(), [SurfaceCall::Map(m)] if m.year == 1900));

    surface.clear();
    let change = view.set_mode(MetricMode::Relative);
    coord.on_change(&change, &view, &mut surface).unwrap();
    assert!(matches!(
        surface.calls.as_slice(),
        [SurfaceCall::Map(_), SurfaceCall::Legend(_)]
    ));

    surface.clear();
    let change = view.set_map_transform(ZoomTransform::new(2.0, 0.0, 0.0));
    coord.on_change(&change, &view, &mut surface).unwrap();
    assert_eq!(
        surface.calls,
        vec![SurfaceCall::MapZoom(ZoomTransform::new(2.0, 0.0, 0.0))]
    );

    surface.clear();
    coord
        .on_change(&ViewChange::Selection(None), &view, &mut surface)
        .unwrap();
    assert_eq!(surface.calls, vec![SurfaceCall::CloseDrilldown]);
}
