use crate::camera3d::MapControls;
use crate::config::CameraConfig;
use crate::tween::Ease;
use glam::{Vec2, Vec3};

struct Travel {
    target_from: Vec3,
    target_to: Vec3,
    position_from: Vec3,
    position_to: Vec3,
    duration: f32,
    elapsed: f32,
}

/// Eases the camera (both look-at target and eye) onto a shelf coordinate.
/// The instant mode exists for first paint and deep links; everything else
/// animates. The map control is refreshed on every tick because it does not
/// observe external position writes.
pub struct CameraNavigator {
    cfg: CameraConfig,
    travel: Option<Travel>,
}

impl CameraNavigator {
    pub fn new(cfg: CameraConfig) -> Self {
        Self { cfg, travel: None }
    }

    pub fn is_travelling(&self) -> bool {
        self.travel.is_some()
    }

    /// Centers the view on a shelf-space coordinate. The look-at point gets
    /// a fixed forward offset; the eye sits at the viewing distance behind
    /// it along the shelf's depth axis.
    pub fn move_to(&mut self, controls: &mut MapControls, point: Vec2, animate: bool) {
        let target = Vec3::new(point.x, point.y, self.cfg.target_z);
        let position = Vec3::new(point.x, point.y, self.cfg.start_z);
        if !animate {
            self.travel = None;
            controls.target = target;
            controls.position = position;
            controls.refresh();
            return;
        }
        self.travel = Some(Travel {
            target_from: controls.target,
            target_to: target,
            position_from: controls.position,
            position_to: position,
            duration: self.cfg.travel_duration,
            elapsed: 0.0,
        });
    }

    pub fn tick(&mut self, controls: &mut MapControls, dt: f32) {
        let Some(travel) = self.travel.as_mut() else { return };
        travel.elapsed += dt.max(0.0);
        let t = if travel.duration > 0.0 {
            (travel.elapsed / travel.duration).min(1.0)
        } else {
            1.0
        };
        let eased = Ease::InOut.apply(t);
        controls.target = travel.target_from.lerp(travel.target_to, eased);
        controls.position = travel.position_from.lerp(travel.position_to, eased);
        controls.refresh();
        if t >= 1.0 {
            self.travel = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> MapControls {
        MapControls::new(Vec3::new(0.0, 0.0, -4.0), Vec3::new(0.0, 0.0, 30.0), 20.0, 50.0)
    }

    #[test]
    fn instant_move_jumps_without_travel() {
        let cfg = CameraConfig::default();
        let mut navigator = CameraNavigator::new(cfg.clone());
        let mut controls = controls();
        navigator.move_to(&mut controls, Vec2::new(12.0, -8.0), false);
        assert!(!navigator.is_travelling());
        assert_eq!(controls.target, Vec3::new(12.0, -8.0, cfg.target_z));
        assert_eq!(controls.position, Vec3::new(12.0, -8.0, cfg.start_z));
        assert_eq!(controls.camera().position, controls.position);
    }

    #[test]
    fn animated_move_eases_to_destination() {
        let cfg = CameraConfig::default();
        let mut navigator = CameraNavigator::new(cfg.clone());
        let mut controls = controls();
        navigator.move_to(&mut controls, Vec2::new(20.0, -10.0), true);
        assert!(navigator.is_travelling());

        navigator.tick(&mut controls, 0.3);
        assert!(navigator.is_travelling());
        assert!(controls.target.x > 0.0 && controls.target.x < 20.0);
        // The control's derived camera follows every tick.
        assert_eq!(controls.camera().target, controls.target);

        navigator.tick(&mut controls, 2.0);
        assert!(!navigator.is_travelling());
        assert_eq!(controls.target, Vec3::new(20.0, -10.0, cfg.target_z));
        assert_eq!(controls.position, Vec3::new(20.0, -10.0, cfg.start_z));
    }

    #[test]
    fn retargeting_mid_travel_restarts_from_current_pose() {
        let mut navigator = CameraNavigator::new(CameraConfig::default());
        let mut controls = controls();
        navigator.move_to(&mut controls, Vec2::new(40.0, 0.0), true);
        navigator.tick(&mut controls, 0.4);
        let midway = controls.target;
        navigator.move_to(&mut controls, Vec2::new(-40.0, 0.0), true);
        navigator.tick(&mut controls, 0.01);
        assert!((controls.target.x - midway.x).abs() < 2.0);
    }
}
