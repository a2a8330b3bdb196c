use bigshelf::assets::QualityTier;
use bigshelf::catalog::{BoxKind, BoxRecord, Catalog, ShelfDirection};
use bigshelf::config::ShelfConfig;
use bigshelf::ShelfApp;

fn tall_box(id: i64) -> BoxRecord {
    BoxRecord {
        id,
        slug: format!("tall-{id}"),
        title: format!("Tall {id}"),
        width: 4.0,
        height: 10.0,
        depth: 2.0,
        dir: ShelfDirection::Left,
        kind: BoxKind::BigBox,
        worth_front_view: false,
        gatefold_transparent: false,
        model_path: Some(format!("models/missing-{id}.glb")),
        developers: Vec::new(),
        publishers: Vec::new(),
        shelf_footprint: 0.0,
        shelf_x: 0.0,
        shelf_z: 0.0,
        row: 0,
    }
}

fn app_with_many_rows() -> ShelfApp {
    let catalog = Catalog {
        boxes: (0..30).map(tall_box).collect(),
        developers: Vec::new(),
        publishers: Vec::new(),
    };
    let mut config = ShelfConfig::default();
    config.layout.front_flip_chance = 0.0;
    // A short shelf forces many rows so part of the wall is always outside
    // the camera frustum.
    config.layout.shelf_length = 12.0;
    config.visibility.check_interval = 0.05;
    config.visibility.stagger_window = 0.05;
    ShelfApp::new(catalog, config)
}

#[test]
fn visible_boxes_upgrade_and_distant_rows_stay_placeholder() {
    let mut app = app_with_many_rows();
    for _ in 0..40 {
        app.tick(0.05);
    }

    let tiers: Vec<QualityTier> =
        (0..30).map(|id| app.controller(id).unwrap().requested_tier()).collect();
    assert!(
        tiers.iter().any(|t| *t >= QualityTier::Low),
        "no box in view ever scheduled its load"
    );
    assert!(
        tiers.iter().any(|t| *t == QualityTier::Placeholder),
        "boxes far outside the frustum must not load"
    );
}

#[test]
fn failed_model_loads_leave_the_shelf_usable() {
    let mut app = app_with_many_rows();
    for _ in 0..40 {
        app.tick(0.05);
    }
    // Every load above pointed at a missing file; the scene still stands and
    // interaction still works.
    assert_eq!(app.scene().box_count(), 30);
    app.activate_box(0);
    assert_eq!(app.active_box(), Some(0));
}
