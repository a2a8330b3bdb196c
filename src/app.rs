use crate::assets::{ModelRegistry, QualityTier};
use crate::camera3d::{Camera3D, Frustum, MapControls};
use crate::catalog::{BoxRecord, Catalog, ShelfDirection};
use crate::config::ShelfConfig;
use crate::events::{EventBus, Route, ShelfEvent};
use crate::input::{CursorIntent, Gesture, Input};
use crate::interaction::{BoxContext, BoxController, PoseCommand};
use crate::layout::{pack, Layout, PackOptions};
use crate::navigator::CameraNavigator;
use crate::scene::ShelfWorld;
use crate::tween::{Channel, TweenScheduler};
use crate::visibility::VisibilityGate;
use glam::{Vec2, Vec3};
use rand::Rng;
use std::collections::HashMap;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

/// Composition root: owns the catalog, the packed layout, one controller and
/// one visibility gate per box, the tween scheduler, and the camera. The
/// host forwards window events and calls `tick` from its frame loop, then
/// drains events to learn about navigation and activation changes.
pub struct ShelfApp {
    config: ShelfConfig,
    catalog: Catalog,
    route: Route,
    layout: Layout,
    scene: ShelfWorld,
    controllers: HashMap<i64, BoxController>,
    gates: HashMap<i64, VisibilityGate>,
    model_paths: HashMap<i64, String>,
    registry: ModelRegistry,
    tweens: TweenScheduler,
    controls: MapControls,
    navigator: CameraNavigator,
    input: Input,
    events: EventBus,
    active: Option<i64>,
    hovered: Option<i64>,
    cursor_intent: CursorIntent,
    viewport: PhysicalSize<u32>,
    elapsed: f32,
    first_paint_done: bool,
}

impl ShelfApp {
    pub fn new(catalog: Catalog, config: ShelfConfig) -> Self {
        let controls = MapControls::new(
            Vec3::new(0.0, 0.0, config.camera.target_z),
            Vec3::new(0.0, 0.0, config.camera.start_z),
            config.camera.min_distance,
            config.camera.max_distance,
        );
        let navigator = CameraNavigator::new(config.camera.clone());
        let input = Input::new(
            config.interaction.tap_threshold_px,
            config.interaction.double_click_window,
        );
        let mut app = Self {
            config,
            catalog,
            route: Route::Shelf,
            layout: Layout::default(),
            scene: ShelfWorld::new(),
            controllers: HashMap::new(),
            gates: HashMap::new(),
            model_paths: HashMap::new(),
            registry: ModelRegistry::new(),
            tweens: TweenScheduler::default(),
            controls,
            navigator,
            input,
            events: EventBus::default(),
            active: None,
            hovered: None,
            cursor_intent: CursorIntent::Default,
            viewport: PhysicalSize::new(1280, 720),
            elapsed: 0.0,
            first_paint_done: false,
        };
        app.rebuild_shelves();
        app
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn scene(&self) -> &ShelfWorld {
        &self.scene
    }

    pub fn camera(&self) -> &Camera3D {
        self.controls.camera()
    }

    pub fn active_box(&self) -> Option<i64> {
        self.active
    }

    pub fn cursor_intent(&self) -> CursorIntent {
        self.cursor_intent
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn controller(&self, id: i64) -> Option<&BoxController> {
        self.controllers.get(&id)
    }

    pub fn drain_events(&mut self) -> Vec<ShelfEvent> {
        self.events.drain()
    }

    pub fn set_viewport(&mut self, viewport: PhysicalSize<u32>) {
        if viewport.width > 0 && viewport.height > 0 {
            self.viewport = viewport;
        }
    }

    /// The host pushes route changes down; the shelf re-filters, re-packs,
    /// and deep-links accordingly.
    pub fn set_route(&mut self, route: Route) {
        if self.route == route {
            return;
        }
        let previous_scope = Self::filter_scope(&self.route);
        self.route = route;
        match &self.route {
            Route::Shelf | Route::Developer(_) | Route::Publisher(_) => {
                if self.active.is_some() {
                    self.deactivate_active();
                }
                // Re-pack only when the facet filter actually changed;
                // leaving a game detail keeps the shelves as they stand.
                if Self::filter_scope(&self.route) != previous_scope
                    || self.scene.box_count() == 0
                {
                    self.rebuild_shelves();
                }
            }
            Route::Game(slug) => {
                let slug = slug.clone();
                if self.scene.box_count() == 0 {
                    self.rebuild_shelves();
                }
                if let Some(id) = self.scene.site_by_slug(&slug).map(|s| s.id) {
                    self.activate_box(id);
                } // A slug absent from the current filtered catalog is a no-op.
            }
            Route::Standalone(slug) => {
                let slug = slug.clone();
                self.rebuild_standalone(&slug);
            }
        }
    }

    fn filter_scope(route: &Route) -> Option<(&'static str, String)> {
        match route {
            Route::Developer(slug) => Some(("developer", slug.clone())),
            Route::Publisher(slug) => Some(("publisher", slug.clone())),
            _ => None,
        }
    }

    fn filtered_boxes(&self) -> Vec<BoxRecord> {
        match &self.route {
            Route::Developer(slug) => self.catalog.filter_by_developer(slug),
            Route::Publisher(slug) => self.catalog.filter_by_publisher(slug),
            _ => self.catalog.boxes.clone(),
        }
    }

    /// One synchronous packing pass over the filtered catalog, replacing the
    /// layout, scene, controllers, and gates wholesale.
    fn rebuild_shelves(&mut self) {
        let boxes = self.filtered_boxes();
        let options = PackOptions::from(&self.config.layout);
        let mut rng = rand::thread_rng();
        self.layout = pack(&boxes, self.config.layout.shelf_length, &options, &mut rng);
        self.scene.rebuild(&self.layout);
        self.rebuild_controllers(BoxContext::Shelf);
        self.deep_link(&mut rng);
    }

    fn rebuild_standalone(&mut self, slug: &str) {
        let Some(record) = self.catalog.by_slug(slug).cloned() else {
            eprintln!("[shelf] unknown standalone slug {slug}");
            return;
        };
        let options = PackOptions::from(&self.config.layout);
        let mut rng = rand::thread_rng();
        self.layout = pack(
            std::slice::from_ref(&record),
            self.config.layout.shelf_length,
            &options,
            &mut rng,
        );
        self.scene.rebuild(&self.layout);
        self.rebuild_controllers(BoxContext::Standalone);
        if let Some(id) = self.scene.site_by_slug(slug).map(|s| s.id) {
            self.active = Some(id);
            if let (Some(path), Some(record)) =
                (self.model_paths.get(&id).cloned(), self.catalog.by_id(id))
            {
                self.registry.request(
                    &path,
                    QualityTier::High,
                    record.kind,
                    Vec3::new(record.width, record.height, record.depth),
                );
            }
        }
    }

    fn rebuild_controllers(&mut self, context: BoxContext) {
        self.tweens.cancel_all();
        self.controllers.clear();
        self.gates.clear();
        self.model_paths.clear();
        self.active = None;
        self.hovered = None;
        for row in &self.layout.rows {
            for record in &row.boxes {
                let Some(entity) = self.scene.box_entity(record.id) else { continue };
                let Some(transform) = self.scene.transform(entity) else { continue };
                let controller = BoxController::new(
                    record,
                    transform.translation,
                    context,
                    self.config.interaction.clone(),
                );
                self.controllers.insert(record.id, controller);
                self.gates.insert(record.id, VisibilityGate::new(&self.config.visibility));
                if let Some(path) = &record.model_path {
                    self.model_paths.insert(record.id, path.clone());
                }
            }
        }
        self.controls.enabled = true;
    }

    /// After a (re)pack, land the camera on the routed box, or any box at
    /// all. First paint jumps; later passes glide.
    fn deep_link(&mut self, rng: &mut impl Rng) {
        let routed_slug = match &self.route {
            Route::Game(slug) | Route::Standalone(slug) => Some(slug.clone()),
            _ => None,
        };
        let site = routed_slug
            .as_deref()
            .and_then(|slug| self.scene.site_by_slug(slug).cloned())
            .or_else(|| self.scene.random_site(rng).cloned());
        let Some(site) = site else { return };
        let animate = self.first_paint_done;
        self.navigator.move_to(&mut self.controls, Vec2::new(site.x, site.y), animate);
        self.first_paint_done = true;
        if matches!(self.route, Route::Game(_)) {
            if let Some(id) =
                routed_slug.as_deref().and_then(|slug| self.scene.site_by_slug(slug).map(|s| s.id))
            {
                self.activate_box(id);
            }
        }
    }

    /// Animated camera jump to a searched box; unknown targets are a no-op.
    pub fn jump_to_slug(&mut self, slug: &str) {
        if let Some(site) = self.scene.site_by_slug(slug).cloned() {
            self.events.push(ShelfEvent::CameraJump { x: site.x, y: site.y });
            self.navigator.move_to(&mut self.controls, Vec2::new(site.x, site.y), true);
        }
    }

    pub fn jump_to_random(&mut self) {
        let mut rng = rand::thread_rng();
        if let Some(site) = self.scene.random_site(&mut rng).cloned() {
            self.events.push(ShelfEvent::CameraJump { x: site.x, y: site.y });
            self.navigator.move_to(&mut self.controls, Vec2::new(site.x, site.y), true);
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::Resized(size) = event {
            self.set_viewport(*size);
        }
        self.input.push_window_event(event, self.elapsed);
    }

    /// Convenience wrapper for hosts driving the app from a frame clock.
    pub fn frame(&mut self, time: &mut crate::time::Time) {
        time.tick();
        self.tick(time.delta_seconds());
    }

    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.elapsed += dt;
        let gestures = self.input.drain();
        for gesture in gestures {
            self.dispatch(gesture);
        }
        self.tick_visibility(dt);
        self.drain_model_loads();
        self.step_tweens(dt);
        self.navigator.tick(&mut self.controls, dt);
    }

    fn dispatch(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Move { position } => self.pointer_moved(position),
            Gesture::Click { position } => self.pointer_clicked(position),
            Gesture::DoubleClick { position } => self.pointer_double_clicked(position),
            Gesture::DragStart { .. } => {}
            Gesture::Drag { delta, ctrl } => self.pointer_dragged(delta, ctrl),
            Gesture::DragEnd => {
                if let Some(controller) = self.active.and_then(|id| self.controllers.get_mut(&id))
                {
                    controller.drag_end(self.elapsed);
                }
            }
            Gesture::Wheel { delta } => self.wheel(delta),
        }
    }

    fn pick_at(&mut self, position: Vec2) -> Option<i64> {
        let (origin, dir) = self.controls.camera().screen_ray(position, self.viewport)?;
        self.scene.pick(origin, dir).map(|(_, id)| id)
    }

    fn route_preselects(&self) -> bool {
        matches!(self.route, Route::Game(_) | Route::Standalone(_))
    }

    fn pointer_moved(&mut self, position: Vec2) {
        let over = self.pick_at(position);
        match (over, self.active) {
            (Some(id), Some(active_id)) => {
                self.cursor_intent = if id == active_id {
                    CursorIntent::Move
                } else {
                    CursorIntent::Default
                };
            }
            (Some(id), None) => {
                if self.route_preselects() {
                    return;
                }
                if self.hovered != Some(id) {
                    self.unhover_current();
                    if let Some(controller) = self.controllers.get_mut(&id) {
                        let commands = controller.hover();
                        self.hovered = Some(id);
                        self.cursor_intent = CursorIntent::Pointer;
                        self.post_commands(id, commands);
                    }
                }
            }
            (None, _) => {
                self.unhover_current();
                self.cursor_intent = CursorIntent::Default;
            }
        }
    }

    fn unhover_current(&mut self) {
        if let Some(id) = self.hovered.take() {
            if let Some(controller) = self.controllers.get_mut(&id) {
                let commands = controller.unhover();
                self.post_commands(id, commands);
            }
        }
    }

    fn pointer_clicked(&mut self, position: Vec2) {
        match self.pick_at(position) {
            Some(id) => self.activate_box(id),
            None => {
                // Click-outside backdrop, unless this click is the tail of a
                // drag that just ended.
                let settling = self
                    .active
                    .and_then(|id| self.controllers.get(&id))
                    .map(|c| c.is_drag_settling(self.elapsed))
                    .unwrap_or(false);
                if self.active.is_some() && !settling {
                    self.deactivate_active();
                    if matches!(self.route, Route::Game(_)) {
                        self.route = Route::Shelf;
                        self.events.push(ShelfEvent::NavigateTo { route: Route::Shelf });
                    }
                }
            }
        }
    }

    fn pointer_double_clicked(&mut self, position: Vec2) {
        let Some(id) = self.pick_at(position) else { return };
        if self.active == Some(id) {
            self.toggle_gatefold(id);
        }
    }

    /// No-op for non-gatefold kinds and for boxes that are not active.
    pub fn toggle_gatefold(&mut self, id: i64) {
        if let Some(controller) = self.controllers.get_mut(&id) {
            if let Some((open, command)) = controller.toggle_gatefold() {
                self.events.push(ShelfEvent::GatefoldToggled { id, open });
                self.post_commands(id, vec![command]);
            }
        }
    }

    fn pointer_dragged(&mut self, delta: Vec2, ctrl: bool) {
        if let Some(id) = self.active {
            let scale = self
                .controls
                .camera()
                .pixels_per_world_unit(self.config.interaction.active_z_offset, self.viewport);
            if let Some(controller) = self.controllers.get_mut(&id) {
                let commands = controller.drag(delta, ctrl, scale);
                self.post_commands(id, commands);
            }
        } else {
            self.controls.pan(delta, self.viewport);
        }
    }

    fn wheel(&mut self, delta: f32) {
        if let Some(id) = self.active {
            let Some(entity) = self.scene.box_entity(id) else { return };
            let Some(transform) = self.scene.transform(entity) else { return };
            if let Some(controller) = self.controllers.get_mut(&id) {
                if let Some(command) = controller.wheel(delta, transform.translation) {
                    self.post_commands(id, vec![command]);
                }
            }
        } else {
            self.controls.dolly(delta);
        }
    }

    /// Exactly one box may be active; activating another deactivates the
    /// previous one first. Activating the already-active box is a no-op.
    pub fn activate_box(&mut self, id: i64) {
        if self.active == Some(id) {
            return;
        }
        if !self.controllers.contains_key(&id) {
            return;
        }
        if self.active.is_some() {
            self.deactivate_active();
        }
        self.unhover_current();
        let eye = self.controls.position;
        let Some(controller) = self.controllers.get_mut(&id) else { return };
        let Some(commands) = controller.activate(eye) else { return };
        let slug = controller.slug.clone();
        let shelf_context = controller.context() == BoxContext::Shelf;
        self.active = Some(id);
        self.controls.enabled = false;
        self.post_commands(id, commands);
        self.request_model(id, QualityTier::High);
        self.events.push(ShelfEvent::BoxActivated { id, slug: slug.clone() });
        if shelf_context {
            self.events.push(ShelfEvent::NavigateTo { route: Route::Game(slug) });
        }
    }

    pub fn deactivate_active(&mut self) {
        let Some(id) = self.active else { return };
        if let Some(controller) = self.controllers.get_mut(&id) {
            if let Some(commands) = controller.deactivate() {
                self.post_commands(id, commands);
                self.active = None;
                self.controls.enabled = true;
                self.events.push(ShelfEvent::BoxDeactivated { id });
            }
        }
    }

    fn request_model(&mut self, id: i64, tier: QualityTier) {
        let Some(path) = self.model_paths.get(&id).cloned() else { return };
        let Some(record) = self.catalog.by_id(id) else { return };
        let dims = Vec3::new(record.width, record.height, record.depth);
        self.registry.request(&path, tier, record.kind, dims);
    }

    fn tick_visibility(&mut self, dt: f32) {
        let frustum =
            Frustum::from_matrix(&self.controls.camera().view_projection(self.viewport));
        let mut rng = rand::thread_rng();
        let mut fired = Vec::new();
        for (id, gate) in self.gates.iter_mut() {
            let Some(entity) = self.scene.box_entity(*id) else { continue };
            let Some(transform) = self.scene.transform(entity) else { continue };
            if gate.tick(dt, &frustum, transform.translation, &mut rng) {
                fired.push(*id);
            }
        }
        for id in fired {
            if let Some(controller) = self.controllers.get_mut(&id) {
                controller.request_low_tier();
            }
            let tier = self
                .controllers
                .get(&id)
                .map(|c| c.requested_tier())
                .unwrap_or(QualityTier::Low);
            self.request_model(id, tier);
        }
    }

    fn drain_model_loads(&mut self) {
        let completions = self.registry.drain_queue();
        if completions.is_empty() {
            return;
        }
        let mut rng = rand::thread_rng();
        for completion in completions {
            let Some((&id, _)) =
                self.model_paths.iter().find(|(_, path)| **path == completion.path)
            else {
                continue;
            };
            let Some(controller) = self.controllers.get(&id) else { continue };
            if controller.context() != BoxContext::Shelf || controller.is_active() {
                continue;
            }
            let Some(entity) = self.scene.box_entity(id) else { continue };
            // Slide the freshly loaded model in from just off its resting
            // spot, staggered so neighbors do not land in lockstep.
            let start = match self.catalog.by_id(id).map(|r| r.dir) {
                Some(ShelfDirection::Front) => Vec3::new(0.0, 0.0, 2.0),
                _ => Vec3::new(-2.0, 0.0, 0.0),
            };
            let delay = if self.config.visibility.entry_bounce_window > 0.0 {
                rng.gen_range(0.0..self.config.visibility.entry_bounce_window)
            } else {
                0.0
            };
            self.scene.set_model_offset(entity, start);
            self.tweens.post_delayed(
                entity,
                Channel::ModelOffset,
                start,
                Vec3::ZERO,
                0.6,
                delay,
                crate::tween::Ease::BackOut,
            );
        }
    }

    fn step_tweens(&mut self, dt: f32) {
        let scene = &mut self.scene;
        self.tweens.step(dt, |entity, channel, value| match channel {
            Channel::Position => scene.set_translation(entity, value),
            Channel::Rotation => scene.set_rotation_euler(entity, value),
            Channel::Gatefold => scene.set_gatefold_rotation(entity, value),
            Channel::ModelOffset => scene.set_model_offset(entity, value),
        });
    }

    fn post_commands(&mut self, id: i64, commands: Vec<PoseCommand>) {
        let Some(entity) = self.scene.box_entity(id) else { return };
        for command in commands {
            match command {
                PoseCommand::Tween { channel, target, duration, delay, ease } => {
                    let from = match (channel, self.scene.transform(entity)) {
                        (Channel::Position, Some(t)) => t.translation,
                        (Channel::Rotation, Some(t)) => t.rotation_euler,
                        (Channel::Gatefold, _) => self
                            .scene
                            .world
                            .get::<crate::scene::GatefoldRotation>(entity)
                            .map(|g| g.0)
                            .unwrap_or(Vec3::ZERO),
                        (Channel::ModelOffset, _) => self
                            .scene
                            .world
                            .get::<crate::scene::ModelOffset>(entity)
                            .map(|o| o.0)
                            .unwrap_or(Vec3::ZERO),
                        (_, None) => Vec3::ZERO,
                    };
                    self.tweens.post_delayed(entity, channel, from, target, duration, delay, ease);
                }
                PoseCommand::Nudge { channel: Channel::Position, delta } => {
                    self.scene.nudge_translation(entity, delta);
                }
                PoseCommand::Nudge { .. } => {}
            }
        }
    }
}
