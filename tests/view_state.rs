use climate_atlas::view_state::{MODE_KEY, YEAR_KEY, ZoomExtent};
use climate_atlas::{
    AtlasError, JsonFileStore, MemoryStore, MetricMode, ViewChange, ViewState, ViewStore,
    YearBounds, ZoomTransform,
};
use tempfile::tempdir;

const BOUNDS: YearBounds = YearBounds {
    min: 1850,
    max: 2014,
};

#[test]
fn fresh_state_defaults_to_latest_year_and_absolute() {
    let view = ViewState::hydrate(Box::new(MemoryStore::new()), BOUNDS);
    assert_eq!(view.year(), 2014);
    assert_eq!(view.mode(), MetricMode::Absolute);
    assert_eq!(view.map_transform(), ZoomTransform::IDENTITY);
    assert_eq!(view.chart_transform(), None);
    assert_eq!(view.selected_country(), None);
}

#[test]
fn hydrates_persisted_values() {
    let store = MemoryStore::new()
        .with(YEAR_KEY, "1990")
        .with(MODE_KEY, "relative");
    let view = ViewState::hydrate(Box::new(store), BOUNDS);
    assert_eq!(view.year(), 1990);
    assert_eq!(view.mode(), MetricMode::Relative);
}

#[test]
fn invalid_persisted_values_are_replaced_and_written_back() {
    let store = MemoryStore::new()
        .with(YEAR_KEY, "1700")
        .with(MODE_KEY, "kelvin");
    let view = ViewState::hydrate(Box::new(store), BOUNDS);
    assert_eq!(view.year(), 2014);
    assert_eq!(view.mode(), MetricMode::Absolute);
    assert_eq!(view.store().read(YEAR_KEY).as_deref(), Some("2014"));
    assert_eq!(view.store().read(MODE_KEY).as_deref(), Some("absolute"));

    let garbage = MemoryStore::new().with(YEAR_KEY, "soon");
    let view = ViewState::hydrate(Box::new(garbage), BOUNDS);
    assert_eq!(view.year(), 2014);
}

#[test]
fn set_year_persists() {
    let mut view = ViewState::hydrate(Box::new(MemoryStore::new()), BOUNDS);
    let change = view.set_year(1900);
    assert_eq!(
        change,
        ViewChange::Year {
            year: 1900,
            clamped_from: None
        }
    );
    assert_eq!(change.out_of_range(), None);
    assert_eq!(view.store().read(YEAR_KEY).as_deref(), Some("1900"));
}

#[test]
fn out_of_range_year_uses_latest_and_reports() {
    let mut view = ViewState::hydrate(Box::new(MemoryStore::new()), BOUNDS);
    view.set_year(1900);
    let change = view.set_year(2100);
    assert_eq!(view.year(), 2014);
    assert_eq!(view.store().read(YEAR_KEY).as_deref(), Some("2014"));
    assert_eq!(
        change.out_of_range(),
        Some(AtlasError::OutOfRange {
            what: "year",
            requested: 2100.0,
            applied: 2014.0
        })
    );
}

#[test]
fn set_mode_persists() {
    let mut view = ViewState::hydrate(Box::new(MemoryStore::new()), BOUNDS);
    assert_eq!(
        view.set_mode(MetricMode::Relative),
        ViewChange::Mode(MetricMode::Relative)
    );
    assert_eq!(view.store().read(MODE_KEY).as_deref(), Some("relative"));
}

#[test]
fn zoom_scale_is_clamped_to_extent() {
    let mut view = ViewState::hydrate(Box::new(MemoryStore::new()), BOUNDS)
        .with_zoom_extents(ZoomExtent::MAP, ZoomExtent::CHART);
    let change = view.set_map_transform(ZoomTransform::new(50.0, 10.0, 20.0));
    assert_eq!(
        change,
        ViewChange::MapTransform {
            transform: ZoomTransform::new(8.0, 10.0, 20.0),
            clamped: true
        }
    );

    let change = view.set_chart_transform(Some(ZoomTransform::new(0.1, 0.0, 0.0)));
    assert_eq!(
        view.chart_transform(),
        Some(ZoomTransform::new(1.0, 0.0, 0.0))
    );
    assert!(matches!(change, ViewChange::ChartTransform { clamped: true, .. }));

    view.set_map_transform(ZoomTransform::new(f64::NAN, 0.0, 0.0));
    assert_eq!(view.map_transform(), ZoomTransform::IDENTITY);
}

#[test]
fn transforms_are_not_persisted() {
    let mut view = ViewState::hydrate(Box::new(MemoryStore::new()), BOUNDS);
    view.set_map_transform(ZoomTransform::new(2.0, 0.0, 0.0));
    assert_eq!(view.store().read("map_transform"), None);
}

#[test]
fn selection_changes_reset_chart_zoom() {
    let mut view = ViewState::hydrate(Box::new(MemoryStore::new()), BOUNDS);
    assert_eq!(
        view.select_country(Some("4")),
        Some(ViewChange::Selection(Some("004".into())))
    );
    view.set_chart_transform(Some(ZoomTransform::new(3.0, 0.0, 0.0)));
    // same country again: nothing changes
    assert_eq!(view.select_country(Some("004")), None);
    assert!(view.chart_transform().is_some());

    assert_eq!(view.select_country(None), Some(ViewChange::Selection(None)));
    assert_eq!(view.chart_transform(), None);
    assert_eq!(view.select_country(None), None);
}

#[test]
fn json_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("state.json");

    let mut view = ViewState::hydrate(Box::new(JsonFileStore::open(&path)), BOUNDS);
    view.set_year(1950);
    view.set_mode(MetricMode::Relative);
    assert!(path.exists());

    let view = ViewState::hydrate(Box::new(JsonFileStore::open(&path)), BOUNDS);
    assert_eq!(view.year(), 1950);
    assert_eq!(view.mode(), MetricMode::Relative);
}

#[test]
fn unreadable_json_store_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();
    let mut store = JsonFileStore::open(&path);
    assert_eq!(store.read(YEAR_KEY), None);
    store.write(YEAR_KEY, "2000").unwrap();
    assert_eq!(JsonFileStore::open(&path).read(YEAR_KEY).as_deref(), Some("2000"));
}
