use bigshelf::catalog::{BoxKind, BoxRecord, Catalog, FacetRef, ShelfDirection};
use bigshelf::config::ShelfConfig;
use bigshelf::events::{Route, ShelfEvent};
use bigshelf::ShelfApp;

fn record(id: i64, slug: &str, kind: BoxKind, developer: Option<&str>) -> BoxRecord {
    BoxRecord {
        id,
        slug: slug.to_string(),
        title: slug.to_string(),
        width: 4.0,
        height: 6.0,
        depth: 1.5,
        dir: ShelfDirection::Left,
        kind,
        worth_front_view: false,
        gatefold_transparent: false,
        model_path: None,
        developers: developer
            .map(|d| vec![FacetRef { slug: d.to_string(), name: d.to_string() }])
            .unwrap_or_default(),
        publishers: Vec::new(),
        shelf_footprint: 0.0,
        shelf_x: 0.0,
        shelf_z: 0.0,
        row: 0,
    }
}

fn catalog() -> Catalog {
    Catalog {
        boxes: vec![
            record(1, "alpha", BoxKind::BigBox, Some("lucas")),
            record(2, "beta", BoxKind::BigBoxWithGatefold, Some("lucas")),
            record(3, "gamma", BoxKind::BigBox, Some("sierra")),
            record(4, "delta", BoxKind::BigBoxWithVerticalGatefold, None),
        ],
        developers: Vec::new(),
        publishers: Vec::new(),
    }
}

fn deterministic_config() -> ShelfConfig {
    let mut config = ShelfConfig::default();
    config.layout.front_flip_chance = 0.0;
    config
}

fn app() -> ShelfApp {
    ShelfApp::new(catalog(), deterministic_config())
}

#[test]
fn at_most_one_box_is_active() {
    let mut app = app();
    app.drain_events();

    app.activate_box(1);
    assert_eq!(app.active_box(), Some(1));

    app.activate_box(2);
    assert_eq!(app.active_box(), Some(2));

    let events = app.drain_events();
    let deactivated_1 = events
        .iter()
        .position(|e| matches!(e, ShelfEvent::BoxDeactivated { id: 1 }))
        .expect("box 1 must be put back before box 2 comes out");
    let activated_2 = events
        .iter()
        .position(|e| matches!(e, ShelfEvent::BoxActivated { id: 2, .. }))
        .expect("box 2 must activate");
    assert!(deactivated_1 < activated_2);
}

#[test]
fn activating_the_active_box_is_a_noop() {
    let mut app = app();
    app.activate_box(1);
    app.drain_events();
    app.activate_box(1);
    assert!(app.drain_events().is_empty());
    assert_eq!(app.active_box(), Some(1));
}

#[test]
fn activation_requests_navigation_to_detail_route() {
    let mut app = app();
    app.drain_events();
    app.activate_box(2);
    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ShelfEvent::NavigateTo { route: Route::Game(slug) } if slug == "beta"
    )));
}

#[test]
fn activating_a_missing_box_is_a_noop() {
    let mut app = app();
    app.drain_events();
    app.activate_box(999);
    assert_eq!(app.active_box(), None);
    assert!(app.drain_events().is_empty());
}

#[test]
fn gatefold_toggle_is_noop_for_plain_boxes() {
    let mut app = app();
    app.activate_box(1);
    app.drain_events();
    app.toggle_gatefold(1);
    assert!(app.drain_events().is_empty());
    assert!(!app.controller(1).unwrap().gatefold_open());
}

#[test]
fn gatefold_opens_and_closes_for_capable_boxes() {
    let mut app = app();
    app.activate_box(2);
    app.drain_events();

    app.toggle_gatefold(2);
    let events = app.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, ShelfEvent::GatefoldToggled { id: 2, open: true })));
    assert!(app.controller(2).unwrap().gatefold_open());

    app.toggle_gatefold(2);
    let events = app.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, ShelfEvent::GatefoldToggled { id: 2, open: false })));
}

#[test]
fn gatefold_toggle_requires_active_state() {
    let mut app = app();
    app.drain_events();
    app.toggle_gatefold(2);
    assert!(app.drain_events().is_empty());
    assert!(!app.controller(2).unwrap().gatefold_open());
}

#[test]
fn developer_route_filters_and_repacks() {
    let mut app = app();
    assert_eq!(app.scene().box_count(), 4);
    app.set_route(Route::Developer("lucas".to_string()));
    assert_eq!(app.scene().box_count(), 2);
    app.set_route(Route::Shelf);
    assert_eq!(app.scene().box_count(), 4);
}

#[test]
fn game_route_activates_without_a_click() {
    let mut app = app();
    app.drain_events();
    app.set_route(Route::Game("gamma".to_string()));
    assert_eq!(app.active_box(), Some(3));
}

#[test]
fn leaving_game_route_deactivates_but_keeps_shelves() {
    let mut app = app();
    app.set_route(Route::Game("gamma".to_string()));
    let packed = app.scene().box_count();
    app.drain_events();

    app.set_route(Route::Shelf);
    assert_eq!(app.active_box(), None);
    assert_eq!(app.scene().box_count(), packed);
    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(e, ShelfEvent::BoxDeactivated { id: 3 })));
}

#[test]
fn game_route_for_filtered_out_box_is_a_noop() {
    let mut app = app();
    app.set_route(Route::Developer("lucas".to_string()));
    app.drain_events();
    // gamma belongs to sierra, so it is not on the filtered shelf.
    app.set_route(Route::Game("gamma".to_string()));
    assert_eq!(app.active_box(), None);
}

#[test]
fn standalone_route_is_active_from_the_start() {
    let mut app = app();
    app.set_route(Route::Standalone("delta".to_string()));
    assert_eq!(app.active_box(), Some(4));
    let controller = app.controller(4).unwrap();
    assert!(controller.is_active());
}

#[test]
fn jump_to_slug_travels_the_camera() {
    let mut app = app();
    app.drain_events();
    let site = app.scene().site_by_slug("alpha").cloned().expect("alpha is shelved");
    app.jump_to_slug("alpha");

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(e, ShelfEvent::CameraJump { .. })));

    for _ in 0..40 {
        app.tick(0.05);
    }
    let camera = app.camera();
    assert!((camera.target.x - site.x).abs() < 1e-3);
    assert!((camera.target.y - site.y).abs() < 1e-3);
}

#[test]
fn jump_to_unknown_slug_is_a_noop() {
    let mut app = app();
    app.drain_events();
    app.jump_to_slug("nothing-here");
    assert!(app.drain_events().is_empty());
}

#[test]
fn deactivation_resets_toward_shelf_pose() {
    let mut app = app();
    app.activate_box(1);
    for _ in 0..20 {
        app.tick(0.05);
    }
    let entity = app.scene().box_entity(1).unwrap();
    let presented = app.scene().transform(entity).unwrap().translation;

    app.deactivate_active();
    for _ in 0..20 {
        app.tick(0.05);
    }
    let rested = app.scene().transform(entity).unwrap().translation;
    assert_ne!(presented, rested);
    let shelf = app.controller(1).unwrap().shelf_position();
    assert!((rested - shelf).length() < 1e-3);
}
