use crate::assets::QualityTier;
use crate::catalog::{BoxKind, BoxRecord, ShelfDirection};
use crate::config::InteractionConfig;
use crate::input::CursorIntent;
use crate::tween::{Channel, Ease};
use glam::{Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

/// Where the controller lives: on the browsable shelf, or alone on a detail
/// page where the box is active from the start and stays that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxContext {
    Shelf,
    Standalone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Shelved,
    Hovering,
    Active,
}

/// Animation intents emitted by the state machine. The machine never
/// interpolates; the tween scheduler owns that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseCommand {
    Tween { channel: Channel, target: Vec3, duration: f32, delay: f32, ease: Ease },
    /// Immediate positional adjustment with no interpolation (ctrl-drag pan).
    Nudge { channel: Channel, delta: Vec3 },
}

fn tween(channel: Channel, target: Vec3, duration: f32, ease: Ease) -> PoseCommand {
    PoseCommand::Tween { channel, target, duration, delay: 0.0, ease }
}

#[derive(Debug)]
pub struct BoxController {
    pub id: i64,
    pub slug: String,
    kind: BoxKind,
    dir: ShelfDirection,
    dims: Vec3,
    context: BoxContext,
    shelf_position: Vec3,
    phase: InteractionPhase,
    gatefold_open: bool,
    free_look: Vec2,
    requested_tier: QualityTier,
    drag_settle_until: Option<f32>,
    cfg: InteractionConfig,
}

impl BoxController {
    pub fn new(
        record: &BoxRecord,
        shelf_position: Vec3,
        context: BoxContext,
        cfg: InteractionConfig,
    ) -> Self {
        let standalone = context == BoxContext::Standalone;
        Self {
            id: record.id,
            slug: record.slug.clone(),
            kind: record.kind,
            dir: record.dir,
            dims: Vec3::new(record.width, record.height, record.depth),
            context,
            shelf_position,
            phase: if standalone { InteractionPhase::Active } else { InteractionPhase::Shelved },
            gatefold_open: false,
            free_look: Vec2::ZERO,
            requested_tier: if standalone { QualityTier::High } else { QualityTier::Placeholder },
            drag_settle_until: None,
            cfg,
        }
    }

    pub fn phase(&self) -> InteractionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == InteractionPhase::Active
    }

    pub fn gatefold_open(&self) -> bool {
        self.gatefold_open
    }

    pub fn requested_tier(&self) -> QualityTier {
        self.requested_tier
    }

    pub fn context(&self) -> BoxContext {
        self.context
    }

    pub fn shelf_position(&self) -> Vec3 {
        self.shelf_position
    }

    pub fn dims(&self) -> Vec3 {
        self.dims
    }

    pub fn kind(&self) -> BoxKind {
        self.kind
    }

    /// Resting yaw on the shelf: left-facing boxes stand spine-out.
    pub fn resting_yaw(&self) -> f32 {
        if self.dir == ShelfDirection::Left {
            FRAC_PI_2
        } else {
            0.0
        }
    }

    pub fn resting_rotation(&self) -> Vec3 {
        Vec3::new(0.0, self.resting_yaw(), 0.0)
    }

    /// Marks the placeholder→low upgrade once the visibility gate fires.
    pub fn request_low_tier(&mut self) {
        if self.requested_tier < QualityTier::Low {
            self.requested_tier = QualityTier::Low;
        }
    }

    /// Layout recomputation moved this box; glide to the new resting pose
    /// unless the box is currently pulled off the shelf.
    pub fn set_shelf_pose(&mut self, position: Vec3, dir: ShelfDirection) -> Vec<PoseCommand> {
        self.shelf_position = position;
        self.dir = dir;
        if self.is_active() {
            return Vec::new();
        }
        vec![
            tween(Channel::Position, position, 0.15, Ease::Out),
            tween(Channel::Rotation, self.resting_rotation(), 0.15, Ease::Out),
        ]
    }

    /// Pointer entered while nothing is active: raise toward the viewer.
    /// The caller guards the "no box is active" and route-preselection
    /// conditions; hovering an active box is handled by cursor intent only.
    pub fn hover(&mut self) -> Vec<PoseCommand> {
        if self.phase != InteractionPhase::Shelved {
            return Vec::new();
        }
        self.phase = InteractionPhase::Hovering;
        let raised = self.shelf_position + Vec3::new(0.0, 0.0, self.cfg.hover_raise);
        vec![tween(Channel::Position, raised, 0.15, Ease::Out)]
    }

    pub fn unhover(&mut self) -> Vec<PoseCommand> {
        if self.phase != InteractionPhase::Hovering {
            return Vec::new();
        }
        self.phase = InteractionPhase::Shelved;
        vec![tween(Channel::Position, self.shelf_position, 0.15, Ease::Out)]
    }

    /// Pick the box up and present it in front of the camera. No-op when
    /// already active. Returns the commands, or None for the no-op case so
    /// the caller knows not to emit events or navigate.
    pub fn activate(&mut self, camera_eye: Vec3) -> Option<Vec<PoseCommand>> {
        if self.is_active() {
            return None;
        }
        self.phase = InteractionPhase::Active;
        self.requested_tier = QualityTier::High;
        let z = match self.context {
            BoxContext::Shelf => camera_eye.z - self.cfg.active_z_offset,
            BoxContext::Standalone => self.shelf_position.z,
        };
        Some(vec![
            tween(Channel::Position, Vec3::new(camera_eye.x, camera_eye.y, z), 0.15, Ease::Out),
            tween(
                Channel::Rotation,
                Vec3::new(0.0, self.cfg.presentation_yaw, 0.0),
                0.15,
                Ease::Out,
            ),
        ])
    }

    /// Put the box back: reverse the fly-out, restore shelf yaw, close any
    /// open gatefold, and forget accumulated free-look. Standalone
    /// controllers stay active for their lifetime.
    pub fn deactivate(&mut self) -> Option<Vec<PoseCommand>> {
        if !self.is_active() || self.context == BoxContext::Standalone {
            return None;
        }
        self.phase = InteractionPhase::Shelved;
        self.free_look = Vec2::ZERO;
        self.drag_settle_until = None;
        let mut commands = vec![
            tween(Channel::Position, self.shelf_position, 0.15, Ease::Out),
            tween(Channel::Rotation, self.resting_rotation(), 0.15, Ease::Out),
        ];
        if self.gatefold_open {
            self.gatefold_open = false;
            commands.push(tween(Channel::Gatefold, Vec3::ZERO, 0.5, Ease::InOut));
        }
        Some(commands)
    }

    /// Double-click toggle. The hinge axis and sign come from the box kind;
    /// non-gatefold kinds and shelved boxes ignore the gesture entirely.
    pub fn toggle_gatefold(&mut self) -> Option<(bool, PoseCommand)> {
        if !self.is_active() || !self.kind.is_gatefold() {
            return None;
        }
        self.gatefold_open = !self.gatefold_open;
        let target = if !self.gatefold_open {
            Vec3::ZERO
        } else if self.kind.is_vertical_gatefold() {
            Vec3::new(-PI, 0.0, 0.0)
        } else if self.kind.is_back_gatefold() {
            Vec3::new(0.0, PI, 0.0)
        } else {
            Vec3::new(0.0, -PI, 0.0)
        };
        Some((self.gatefold_open, tween(Channel::Gatefold, target, 0.5, Ease::InOut)))
    }

    /// Press-drag while active: free-look rotation, or camera-plane
    /// translation with ctrl held. `pixels_per_unit` converts screen deltas
    /// into world/angle space so feel is viewport-independent.
    pub fn drag(&mut self, delta: Vec2, ctrl: bool, pixels_per_unit: f32) -> Vec<PoseCommand> {
        if !self.is_active() {
            return Vec::new();
        }
        if ctrl {
            let delta = Vec3::new(
                delta.x * self.cfg.pan_sensitivity,
                -delta.y * self.cfg.pan_sensitivity,
                0.0,
            );
            return vec![PoseCommand::Nudge { channel: Channel::Position, delta }];
        }
        self.free_look += delta;
        let scale = pixels_per_unit.max(1e-3);
        let target =
            Vec3::new(self.free_look.y / scale, self.free_look.x / scale, 0.0);
        vec![tween(Channel::Rotation, target, 0.5, Ease::Out)]
    }

    pub fn drag_end(&mut self, now: f32) {
        if self.is_active() {
            self.drag_settle_until = Some(now + self.cfg.drag_settle);
        }
    }

    /// True for a short window after a drag ends, so the release click does
    /// not read as a backdrop deactivation.
    pub fn is_drag_settling(&self, now: f32) -> bool {
        self.drag_settle_until.map(|until| now < until).unwrap_or(false)
    }

    /// Scroll/pinch while active: dolly the box along its view axis, never
    /// closer than the minimum distance.
    pub fn wheel(&mut self, delta: f32, current_position: Vec3) -> Option<PoseCommand> {
        if !self.is_active() {
            return None;
        }
        let target_z = current_position.z + delta * 2.0;
        if target_z <= self.cfg.min_wheel_distance {
            return None;
        }
        Some(tween(
            Channel::Position,
            Vec3::new(current_position.x, current_position.y, target_z),
            0.3,
            Ease::Out,
        ))
    }

    pub fn cursor_intent(&self, pointer_over: bool) -> CursorIntent {
        match self.phase {
            InteractionPhase::Active if pointer_over => CursorIntent::Move,
            InteractionPhase::Hovering => CursorIntent::Pointer,
            _ => CursorIntent::Default,
        }
    }
}
