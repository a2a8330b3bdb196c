use crate::layout::Layout;
use bevy_ecs::prelude::{Component, Entity, World};
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::collections::HashMap;

/// Shelf board dimensions; boxes stand on top of the board.
pub const BOARD_HEIGHT: f32 = 1.0;
pub const BOARD_DEPTH: f32 = 12.0;

/// Euler-per-axis transform: the interaction tweens animate individual
/// rotation axes, so the euler form is authoritative here.
#[derive(Component, Clone, Copy, Debug)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation_euler: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl Transform3D {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation_euler.x,
            self.rotation_euler.y,
            self.rotation_euler.z,
        )
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.translation)
    }
}

#[derive(Component, Clone, Debug)]
pub struct BoxTag {
    pub id: i64,
    pub slug: String,
    pub dims: Vec3,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct RowBoard {
    pub index: usize,
    pub width: f32,
}

/// Hinge rotation of the gatefold panel, animated on its own channel.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct GatefoldRotation(pub Vec3);

/// Transient offset of the loaded model inside the box group, used by the
/// shelf-entry bounce.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct ModelOffset(pub Vec3);

/// A box's camera-facing coordinate in shelf space, for navigation jumps.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSite {
    pub id: i64,
    pub slug: String,
    pub x: f32,
    pub y: f32,
    pub row: usize,
}

/// The composed shelf: one entity per row board and one per box, rebuilt
/// wholesale from each packing pass.
#[derive(Default)]
pub struct ShelfWorld {
    pub world: World,
    boxes: HashMap<i64, Entity>,
    rows: Vec<Entity>,
    sites: Vec<BoxSite>,
    pub shelf_length: f32,
}

impl ShelfWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole scene with the rows of a fresh layout. No
    /// incremental patching: prior entities are despawned first, so the
    /// spawned state always matches the current catalog and options.
    pub fn rebuild(&mut self, layout: &Layout) {
        for entity in self.rows.drain(..) {
            self.world.despawn(entity);
        }
        for (_, entity) in self.boxes.drain() {
            self.world.despawn(entity);
        }
        self.sites.clear();
        self.shelf_length = layout.shelf_length;

        for (index, row) in layout.rows.iter().enumerate() {
            let board = self
                .world
                .spawn((
                    RowBoard { index, width: layout.shelf_length },
                    Transform3D {
                        translation: Vec3::new(0.0, row.y, 0.0),
                        ..Transform3D::default()
                    },
                ))
                .id();
            self.rows.push(board);

            for record in &row.boxes {
                let translation = Vec3::new(
                    record.shelf_x - layout.shelf_length / 2.0,
                    row.y + BOARD_HEIGHT / 2.0 + record.height / 2.0,
                    record.shelf_z + BOARD_DEPTH / 2.0,
                );
                let yaw = match record.dir {
                    crate::catalog::ShelfDirection::Left => std::f32::consts::FRAC_PI_2,
                    crate::catalog::ShelfDirection::Front => 0.0,
                };
                let entity = self
                    .world
                    .spawn((
                        BoxTag {
                            id: record.id,
                            slug: record.slug.clone(),
                            dims: Vec3::new(record.width, record.height, record.depth),
                        },
                        Transform3D {
                            translation,
                            rotation_euler: Vec3::new(0.0, yaw, 0.0),
                            scale: Vec3::ONE,
                        },
                        GatefoldRotation::default(),
                        ModelOffset::default(),
                    ))
                    .id();
                self.boxes.insert(record.id, entity);
                self.sites.push(BoxSite {
                    id: record.id,
                    slug: record.slug.clone(),
                    x: record.shelf_x - layout.shelf_length / 2.0,
                    y: row.y + record.height / 2.0,
                    row: index,
                });
            }
        }
    }

    pub fn box_entity(&self, id: i64) -> Option<Entity> {
        self.boxes.get(&id).copied()
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform3D> {
        self.world.get::<Transform3D>(entity).copied()
    }

    pub fn set_translation(&mut self, entity: Entity, translation: Vec3) {
        if let Some(mut transform) = self.world.get_mut::<Transform3D>(entity) {
            transform.translation = translation;
        }
    }

    pub fn nudge_translation(&mut self, entity: Entity, delta: Vec3) {
        if let Some(mut transform) = self.world.get_mut::<Transform3D>(entity) {
            transform.translation += delta;
        }
    }

    pub fn set_rotation_euler(&mut self, entity: Entity, rotation: Vec3) {
        if let Some(mut transform) = self.world.get_mut::<Transform3D>(entity) {
            transform.rotation_euler = rotation;
        }
    }

    pub fn set_gatefold_rotation(&mut self, entity: Entity, rotation: Vec3) {
        if let Some(mut gatefold) = self.world.get_mut::<GatefoldRotation>(entity) {
            gatefold.0 = rotation;
        }
    }

    pub fn set_model_offset(&mut self, entity: Entity, offset: Vec3) {
        if let Some(mut model_offset) = self.world.get_mut::<ModelOffset>(entity) {
            model_offset.0 = offset;
        }
    }

    pub fn site_by_id(&self, id: i64) -> Option<&BoxSite> {
        self.sites.iter().find(|s| s.id == id)
    }

    pub fn site_by_slug(&self, slug: &str) -> Option<&BoxSite> {
        self.sites.iter().find(|s| s.slug == slug)
    }

    pub fn random_site(&self, rng: &mut impl rand::Rng) -> Option<&BoxSite> {
        if self.sites.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.sites.len());
        self.sites.get(index)
    }

    /// Box under a world-space ray, nearest hit wins. A miss is the
    /// backdrop: the caller treats it as click-outside.
    pub fn pick(&mut self, origin: Vec3, dir: Vec3) -> Option<(Entity, i64)> {
        let mut best: Option<(Entity, i64, f32)> = None;
        let mut query = self.world.query::<(Entity, &BoxTag, &Transform3D)>();
        for (entity, tag, transform) in query.iter(&self.world) {
            if let Some(distance) = ray_hit_box(origin, dir, transform, tag.dims) {
                let closer = best.map(|(_, _, d)| distance < d).unwrap_or(true);
                if closer {
                    best = Some((entity, tag.id, distance));
                }
            }
        }
        best.map(|(entity, id, _)| (entity, id))
    }
}

/// Ray versus an oriented box: transform the ray into box-local space and
/// run the slab test against the half extents.
pub fn ray_hit_box(origin: Vec3, dir: Vec3, transform: &Transform3D, dims: Vec3) -> Option<f32> {
    let world = transform.matrix();
    let inv = world.inverse();
    if !inv.to_cols_array().iter().all(|v| v.is_finite()) {
        return None;
    }
    let origin_local = inv.transform_point3(origin);
    let dir_local = inv.transform_vector3(dir);
    if dir_local.length_squared() <= f32::EPSILON {
        return None;
    }
    let dir_local = dir_local.normalize();
    let half = dims * 0.5;
    let (t_local, hit_local) = ray_aabb_intersection(origin_local, dir_local, -half, half)?;
    if t_local < 0.0 {
        return None;
    }
    let hit_world = world.transform_point3(hit_local);
    Some((hit_world - origin).length())
}

fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = f32::INFINITY;
    let origin_arr = origin.to_array();
    let dir_arr = dir.to_array();
    let min_arr = min.to_array();
    let max_arr = max.to_array();
    for i in 0..3 {
        let o = origin_arr[i];
        let d = dir_arr[i];
        if d.abs() < 1e-6 {
            if o < min_arr[i] || o > max_arr[i] {
                return None;
            }
        } else {
            let inv_d = 1.0 / d;
            let mut t1 = (min_arr[i] - o) * inv_d;
            let mut t2 = (max_arr[i] - o) * inv_d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
    }
    if t_max < 0.0 {
        return None;
    }
    let t_hit = if t_min >= 0.0 { t_min } else { t_max };
    Some((t_hit, origin + dir * t_hit))
}
