use glam::{Mat4, Vec2, Vec3, Vec4};
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Perspective camera looking down the shelf wall.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: PhysicalSize<u32>) -> Mat4 {
        let aspect =
            if viewport.height > 0 { viewport.width as f32 / viewport.height as f32 } else { 1.0 };
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// World-space ray from the camera through a screen position; used to pick
    /// the box under the pointer.
    pub fn screen_ray(&self, screen: Vec2, viewport: PhysicalSize<u32>) -> Option<(Vec3, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let clip = Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let inv_view_proj = self.view_projection(viewport).inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let world_pos = (world.truncate() / world.w) - self.position;
        let dir = world_pos.normalize();
        Some((self.position, dir))
    }

    /// Screen pixels per world unit on a plane at the given distance. Drag
    /// deltas divide by this so free-look speed is viewport-independent.
    pub fn pixels_per_world_unit(&self, distance: f32, viewport: PhysicalSize<u32>) -> f32 {
        if viewport.height == 0 || distance <= 0.0 {
            return 1.0;
        }
        let world_height = 2.0 * distance * (self.fov_y_radians * 0.5).tan();
        viewport.height as f32 / world_height.max(1e-4)
    }
}

/// View frustum as six inward-facing planes, extracted from a
/// view-projection matrix (Gribb-Hartmann).
#[derive(Debug, Clone)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    pub fn from_matrix(view_proj: &Mat4) -> Self {
        let rows = view_proj.transpose();
        let [x, y, z, w] = [rows.x_axis, rows.y_axis, rows.z_axis, rows.w_axis];
        let mut planes = [w + x, w - x, w + y, w - y, w + z, w - z];
        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > f32::EPSILON {
                *plane /= len;
            }
        }
        Self { planes }
    }

    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes.iter().all(|plane| {
            plane.truncate().dot(center) + plane.w >= -radius
        })
    }
}

/// Screen-space panning camera control over the shelf wall, with clamped
/// dolly distance. External writers (the navigator) mutate `target` and
/// `position` directly and must call `refresh` afterwards; the control does
/// not observe those writes on its own.
#[derive(Debug, Clone)]
pub struct MapControls {
    pub target: Vec3,
    pub position: Vec3,
    pub enabled: bool,
    camera: Camera3D,
    min_distance: f32,
    max_distance: f32,
}

impl MapControls {
    pub fn new(target: Vec3, position: Vec3, min_distance: f32, max_distance: f32) -> Self {
        let camera = Camera3D::new(position, target, 50.0_f32.to_radians(), 0.1, 500.0);
        let mut controls =
            Self { target, position, enabled: true, camera, min_distance, max_distance };
        controls.refresh();
        controls
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// Re-derives the camera from target/position, clamping the dolly
    /// distance into its configured range.
    pub fn refresh(&mut self) {
        let offset = self.position - self.target;
        let len = offset.length();
        if len > f32::EPSILON {
            let clamped = len.clamp(self.min_distance, self.max_distance);
            if (clamped - len).abs() > f32::EPSILON {
                self.position = self.target + offset * (clamped / len);
            }
        }
        self.camera.position = self.position;
        self.camera.target = self.target;
    }

    /// Screen-space pan: both target and eye shift together in the camera's
    /// local X/Y plane, so the wall slides under the cursor.
    pub fn pan(&mut self, delta_px: Vec2, viewport: PhysicalSize<u32>) {
        if !self.enabled {
            return;
        }
        let scale = self.camera.pixels_per_world_unit(self.distance(), viewport);
        if scale <= f32::EPSILON {
            return;
        }
        let world = Vec3::new(-delta_px.x / scale, delta_px.y / scale, 0.0);
        self.target += world;
        self.position += world;
        self.refresh();
    }

    /// Dolly along the view axis, clamped to the configured distance range.
    pub fn dolly(&mut self, wheel_delta: f32) {
        if !self.enabled {
            return;
        }
        let offset = self.position - self.target;
        let len = offset.length();
        if len <= f32::EPSILON {
            return;
        }
        let next = (len - wheel_delta * 2.0).clamp(self.min_distance, self.max_distance);
        self.position = self.target + offset * (next / len);
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_projection_is_finite() {
        let camera =
            Camera3D::new(Vec3::new(0.0, 1.0, 30.0), Vec3::ZERO, 50.0_f32.to_radians(), 0.1, 500.0);
        let vp = camera.view_projection(PhysicalSize::new(1280, 720));
        assert!(!vp.to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
    }

    #[test]
    fn frustum_accepts_center_rejects_behind() {
        let camera =
            Camera3D::new(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO, 50.0_f32.to_radians(), 0.1, 500.0);
        let frustum = Frustum::from_matrix(&camera.view_projection(PhysicalSize::new(1280, 720)));
        assert!(frustum.contains_sphere(Vec3::ZERO, 1.0));
        assert!(!frustum.contains_sphere(Vec3::new(0.0, 0.0, 80.0), 1.0));
        assert!(!frustum.contains_sphere(Vec3::new(500.0, 0.0, 0.0), 1.0));
    }

    #[test]
    fn frustum_margin_keeps_edge_spheres() {
        let camera =
            Camera3D::new(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO, 50.0_f32.to_radians(), 0.1, 500.0);
        let frustum = Frustum::from_matrix(&camera.view_projection(PhysicalSize::new(1280, 720)));
        let just_outside = Vec3::new(0.0, 14.5, 0.0);
        assert!(frustum.contains_sphere(just_outside, 2.0));
    }

    #[test]
    fn dolly_clamps_to_distance_range() {
        let mut controls =
            MapControls::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 30.0), 20.0, 50.0);
        controls.dolly(100.0);
        assert!((controls.distance() - 20.0).abs() < 1e-4);
        controls.dolly(-100.0);
        assert!((controls.distance() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_target_and_eye_together() {
        let mut controls =
            MapControls::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 30.0), 20.0, 50.0);
        let before = controls.position - controls.target;
        controls.pan(Vec2::new(120.0, -40.0), PhysicalSize::new(1280, 720));
        let after = controls.position - controls.target;
        assert!((before - after).length() < 1e-4);
        assert!(controls.target.x.abs() > 0.0);
    }
}
