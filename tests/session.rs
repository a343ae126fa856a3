use climate_atlas::color::NO_DATA;
use climate_atlas::view_state::{MODE_KEY, YEAR_KEY};
use climate_atlas::{
    Atlas, Geography, MemoryStore, MetricMode, RawRow, RecordingSurface, RenderConfig,
    RenderCoordinator, Session, SurfaceCall, UiEvent, ViewChange, ViewState, ViewStore,
    ZoomTarget, ZoomTransform,
};

fn row(year: i32, code: &str, name: &str, abs: Option<f64>) -> RawRow {
    RawRow {
        year: Some(year.to_string()),
        country_code: Some(code.to_string()),
        country_name: Some(name.to_string()),
        absolute: abs.map(|v| v.to_string()),
        relative: None,
    }
}

fn atlas() -> Atlas {
    Atlas::from_rows(vec![
        row(1850, "004", "Afghanistan", Some(14.2)),
        row(2014, "004", "Afghanistan", Some(15.1)),
        // in the feed, but never with an absolute value
        row(2014, "716", "Zimbabwe", None),
    ])
}

#[test]
fn end_to_end_history_and_colors() {
    let atlas = atlas();
    let history = atlas.index.history_for("004");
    let pairs: Vec<(i32, f64)> = history.iter().map(|p| (p.year, p.temperature)).collect();
    assert_eq!(pairs, vec![(1850, 14.2), (2014, 15.1)]);

    let hot = atlas.scales.evaluate(MetricMode::Absolute, Some(15.1));
    let cold = atlas.scales.evaluate(MetricMode::Absolute, Some(14.2));
    assert_ne!(hot, cold);
    assert_ne!(hot, NO_DATA);
    assert_ne!(cold, NO_DATA);
}

#[test]
fn start_draws_map_and_legend() {
    let atlas = atlas();
    let geo = Geography::from_ids(["004", "716"]);
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds());
    let mut session = Session::new(coord, view, RecordingSurface::new());

    session.start();
    let calls = &session.surface().calls;
    assert!(matches!(
        calls.as_slice(),
        [SurfaceCall::Map(_), SurfaceCall::Legend(_)]
    ));
}

#[test]
fn year_before_data_clamps_to_latest_and_persists() {
    let atlas = atlas();
    let geo = Geography::from_ids(["004"]);
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds());
    let mut session = Session::new(coord, view, RecordingSurface::new());

    let change = session.dispatch(UiEvent::SetYear(1700)).unwrap();
    assert_eq!(
        change,
        ViewChange::Year {
            year: 2014,
            clamped_from: Some(1700)
        }
    );
    assert_eq!(session.view().year(), 2014);
    assert_eq!(
        session.view().store().read(YEAR_KEY).as_deref(),
        Some("2014")
    );
    assert_eq!(session.surface().last_map().unwrap().year, 2014);
}

#[test]
fn mode_switch_redraws_map_and_legend_and_persists() {
    let atlas = atlas();
    let geo = Geography::from_ids(["004"]);
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds());
    let mut session = Session::new(coord, view, RecordingSurface::new());

    session.dispatch(UiEvent::SetMode(MetricMode::Relative));
    assert_eq!(
        session.surface().last_legend().unwrap().mode,
        MetricMode::Relative
    );
    assert_eq!(
        session.surface().last_map().unwrap().mode,
        MetricMode::Relative
    );
    assert_eq!(
        session.view().store().read(MODE_KEY).as_deref(),
        Some("relative")
    );
}

#[test]
fn selecting_a_country_without_history_does_nothing() {
    let atlas = atlas();
    let geo = Geography::from_ids(["004", "716"]);
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds());
    let mut session = Session::new(coord, view, RecordingSurface::new());

    assert_eq!(session.dispatch(UiEvent::Click("716".into())), None);
    assert_eq!(session.dispatch(UiEvent::Click("999".into())), None);
    assert_eq!(session.view().selected_country(), None);
    assert!(session.surface().calls.is_empty());
}

#[test]
fn click_zoom_and_dismiss_drive_the_drilldown() {
    let atlas = atlas();
    let geo = Geography::from_ids(["004"]);
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds());
    let mut session = Session::new(coord, view, RecordingSurface::new());

    session.dispatch(UiEvent::Click("4".into()));
    assert!(session.surface().drilldown_open());
    let frame = session.surface().last_drilldown().unwrap();
    assert_eq!(frame.country_code, "004");
    assert_eq!(frame.raw.len(), 2);
    let base_span = frame.x_axis.domain.1 - frame.x_axis.domain.0;

    session.dispatch(UiEvent::Zoom {
        target: ZoomTarget::Chart,
        transform: ZoomTransform::new(4.0, 0.0, 0.0),
    });
    let zoomed = session.surface().last_drilldown().unwrap();
    let span = zoomed.x_axis.domain.1 - zoomed.x_axis.domain.0;
    assert!((span - base_span / 4.0).abs() < 1e-9);
    // the map was not touched by the chart zoom
    assert_eq!(session.view().map_transform(), ZoomTransform::IDENTITY);

    session.dispatch(UiEvent::Dismiss);
    assert!(!session.surface().drilldown_open());
    assert_eq!(session.view().selected_country(), None);
    assert_eq!(session.view().chart_transform(), None);
}

#[test]
fn chart_zoom_without_drilldown_is_ignored() {
    let atlas = atlas();
    let geo = Geography::from_ids(["004"]);
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds());
    let mut session = Session::new(coord, view, RecordingSurface::new());

    let change = session.dispatch(UiEvent::Zoom {
        target: ZoomTarget::Chart,
        transform: ZoomTransform::new(2.0, 0.0, 0.0),
    });
    assert_eq!(change, None);
    assert!(session.surface().calls.is_empty());
}

#[test]
fn hover_shows_and_hides_tooltip() {
    let atlas = atlas();
    let geo = Geography::from_ids(["004"]);
    let coord = RenderCoordinator::new(&atlas.index, &atlas.scales, &geo, RenderConfig::default());
    let view = ViewState::hydrate(Box::new(MemoryStore::new()), atlas.year_bounds());
    let mut session = Session::new(coord, view, RecordingSurface::new());

    session.dispatch(UiEvent::Hover(Some("004".into())));
    session.dispatch(UiEvent::Hover(None));
    match session.surface().calls.as_slice() {
        [SurfaceCall::Tooltip(Some(t)), SurfaceCall::Tooltip(None)] => {
            assert_eq!(t.text, "Afghanistan: 15.1°C");
        }
        other => panic!("unexpected calls: {other:?}"),
    }
}

#[test]
fn event_lines_parse() {
    assert_eq!("year 1990".parse::<UiEvent>(), Ok(UiEvent::SetYear(1990)));
    assert_eq!(
        "mode rel".parse::<UiEvent>(),
        Ok(UiEvent::SetMode(MetricMode::Relative))
    );
    assert_eq!("hover".parse::<UiEvent>(), Ok(UiEvent::Hover(None)));
    assert_eq!(
        "zoom map 2 -100 -50".parse::<UiEvent>(),
        Ok(UiEvent::Zoom {
            target: ZoomTarget::Map,
            transform: ZoomTransform::new(2.0, -100.0, -50.0)
        })
    );
    assert_eq!("dismiss".parse::<UiEvent>(), Ok(UiEvent::Dismiss));
    assert!("zoom globe 1 0 0".parse::<UiEvent>().is_err());
    assert!("year soon".parse::<UiEvent>().is_err());
}
