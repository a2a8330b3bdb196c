use crate::camera3d::Frustum;
use crate::config::VisibilityConfig;
use crate::time::IntervalTimer;
use glam::Vec3;
use rand::Rng;

/// Per-box decision of whether the detailed model deserves loading yet.
///
/// The frustum test runs once up front and then on a coarse interval rather
/// than every frame, with the bounding sphere expanded by a margin so boxes
/// do not pop at the view edge. Entering view arms a randomized stagger so a
/// screenful of boxes does not request its models in the same tick. Loads
/// are monotonic: leaving view never cancels a scheduled or completed load.
/// Dropping the gate (unmount) drops any pending stagger with it.
#[derive(Debug)]
pub struct VisibilityGate {
    timer: IntervalTimer,
    margin: f32,
    stagger_window: f32,
    first_check_done: bool,
    visible: bool,
    stagger_remaining: Option<f32>,
    load_fired: bool,
}

impl VisibilityGate {
    pub fn new(cfg: &VisibilityConfig) -> Self {
        Self {
            timer: IntervalTimer::new(cfg.check_interval),
            margin: cfg.margin,
            stagger_window: cfg.stagger_window.max(0.0),
            first_check_done: false,
            visible: false,
            stagger_remaining: None,
            load_fired: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn load_pending(&self) -> bool {
        self.stagger_remaining.is_some() && !self.load_fired
    }

    pub fn load_fired(&self) -> bool {
        self.load_fired
    }

    /// Advances the gate by a frame delta. Returns true exactly once, when
    /// the staggered load deadline passes.
    pub fn tick(&mut self, dt: f32, frustum: &Frustum, position: Vec3, rng: &mut impl Rng) -> bool {
        let due = if self.first_check_done { self.timer.tick(dt) } else { true };
        if due {
            self.first_check_done = true;
            let in_view = frustum.contains_sphere(position, self.margin);
            if in_view && !self.visible && self.stagger_remaining.is_none() && !self.load_fired {
                let delay = if self.stagger_window > 0.0 {
                    rng.gen_range(0.0..self.stagger_window)
                } else {
                    0.0
                };
                self.stagger_remaining = Some(delay);
            }
            self.visible = in_view;
        }

        if let Some(remaining) = self.stagger_remaining.as_mut() {
            *remaining -= dt.max(0.0);
            if !self.load_fired && *remaining <= 0.0 {
                self.load_fired = true;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera3d::Camera3D;
    use rand::rngs::mock::StepRng;
    use winit::dpi::PhysicalSize;

    fn frustum() -> Frustum {
        let camera =
            Camera3D::new(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO, 50.0_f32.to_radians(), 0.1, 500.0);
        Frustum::from_matrix(&camera.view_projection(PhysicalSize::new(1280, 720)))
    }

    fn cfg() -> VisibilityConfig {
        VisibilityConfig {
            check_interval: 0.3,
            margin: 1.5,
            stagger_window: 0.2,
            entry_bounce_window: 0.4,
        }
    }

    #[test]
    fn out_of_view_box_never_schedules_load() {
        let frustum = frustum();
        let mut gate = VisibilityGate::new(&cfg());
        let far_away = Vec3::new(400.0, 0.0, 0.0);
        let mut rng = StepRng::new(0, 1);
        for _ in 0..50 {
            assert!(!gate.tick(0.3, &frustum, far_away, &mut rng));
        }
        assert!(!gate.load_pending());
        assert!(!gate.load_fired());
    }

    #[test]
    fn entering_view_fires_load_within_stagger_window() {
        let frustum = frustum();
        let config = cfg();
        let mut gate = VisibilityGate::new(&config);
        let mut rng = StepRng::new(0, 1);
        let mut elapsed = 0.0;
        let mut fired_at = None;
        for _ in 0..40 {
            if gate.tick(0.05, &frustum, Vec3::ZERO, &mut rng) {
                fired_at = Some(elapsed);
                break;
            }
            elapsed += 0.05;
        }
        let fired_at = fired_at.expect("load should fire for a visible box");
        assert!(fired_at <= config.stagger_window + 0.1);
    }

    #[test]
    fn load_fires_exactly_once() {
        let frustum = frustum();
        let mut gate = VisibilityGate::new(&cfg());
        let mut rng = StepRng::new(0, 1);
        let mut fires = 0;
        for _ in 0..100 {
            if gate.tick(0.05, &frustum, Vec3::ZERO, &mut rng) {
                fires += 1;
            }
        }
        assert_eq!(fires, 1);
    }

    #[test]
    fn leaving_view_does_not_cancel_scheduled_load() {
        let frustum = frustum();
        let mut gate = VisibilityGate::new(&cfg());
        let mut rng = StepRng::new(0, 1);
        // First check sees the box, arming the stagger.
        let fired_immediately = gate.tick(0.0, &frustum, Vec3::ZERO, &mut rng);
        assert!(fired_immediately || gate.load_pending());
        // Box scrolls far away before the stagger elapses.
        let mut fired = fired_immediately;
        for _ in 0..10 {
            fired |= gate.tick(0.31, &frustum, Vec3::new(400.0, 0.0, 0.0), &mut rng);
        }
        assert!(fired);
        assert!(gate.load_fired());
    }

    #[test]
    fn checks_are_interval_bound_not_per_frame() {
        let frustum = frustum();
        let mut gate = VisibilityGate::new(&cfg());
        let mut rng = StepRng::new(0, 1);
        gate.tick(0.0, &frustum, Vec3::new(400.0, 0.0, 0.0), &mut rng);
        assert!(!gate.is_visible());
        // Box moves into view right away, but the next check is not due yet.
        gate.tick(0.1, &frustum, Vec3::ZERO, &mut rng);
        assert!(!gate.is_visible());
        gate.tick(0.25, &frustum, Vec3::ZERO, &mut rng);
        assert!(gate.is_visible());
    }
}
