//! Collision and bounds checks for assembled robots.
//!
//! Both checks work on the XY footprint of an [`Aabb`]; height is ignored. Collision
//! treats touching boxes as overlapping, while the terrain bounds are strict: a robot
//! touching the terrain edge is out of bounds.

use bevy_math::primitives::Cuboid;
use glam::Vec3;

use crate::builder::ModelInstance;
use crate::component::{Color, Material};
use crate::error::PlacementError;
use crate::scene::{Aabb, NodeHandle, Scene};

/// Terrain slab colour.
pub const TERRAIN_COLOR: [u8; 4] = [59, 66, 82, 100];

/// Inclusive 1D overlap: `[a0, a1]` and `[b0, b1]` overlap iff `a1 >= b0 && b1 >= a0`.
pub fn intervals_overlap(a: (f32, f32), b: (f32, f32)) -> bool {
    a.1 >= b.0 && b.1 >= a.0
}

/// True when the XY footprints of two boxes overlap (edges touching included).
pub fn footprints_overlap(a: &Aabb, b: &Aabb) -> bool {
    intervals_overlap(a.x_interval(), b.x_interval())
        && intervals_overlap(a.y_interval(), b.y_interval())
}

/// Rectangular arena robots are placed on, centred on the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    pub half_x: f32,
    pub half_y: f32,
    /// Slab node, when the terrain has been added to a scene.
    pub node: Option<NodeHandle>,
}

impl Terrain {
    pub fn new(half_x: f32, half_y: f32) -> Self {
        Self {
            half_x,
            half_y,
            node: None,
        }
    }

    /// Creates the slab in `scene` (top face at `z = 0`) and attaches it to the scene root.
    pub fn spawn(scene: &mut Scene, half_x: f32, half_y: f32, ground_height: f32) -> Self {
        let node = scene.create_node("Terrain");
        let slab = scene.create_node("Ground");
        scene.set_geometry(
            slab,
            Cuboid::new(2.0 * half_x, 2.0 * half_y, ground_height),
        );
        scene.set_material(
            slab,
            Material::terrain(Color::from_rgba8(TERRAIN_COLOR)),
        );
        scene.set_translation(slab, Vec3::new(0.0, 0.0, -ground_height / 2.0));
        scene.attach(slab, node);
        scene.attach_to_root(node);

        Self {
            half_x,
            half_y,
            node: Some(node),
        }
    }

    /// Strictly inside `(-half_x, half_x) × (-half_y, half_y)`, both corners.
    pub fn contains(&self, bounds: &Aabb) -> bool {
        let inside = |v: f32, half: f32| -half < v && v < half;
        inside(bounds.min.x, self.half_x)
            && inside(bounds.max.x, self.half_x)
            && inside(bounds.min.y, self.half_y)
            && inside(bounds.max.y, self.half_y)
    }
}

impl ModelInstance {
    pub fn collides(&self, other: &ModelInstance) -> bool {
        footprints_overlap(&self.bounds, &other.bounds)
    }

    pub fn in_bounds(&self, terrain: &Terrain) -> bool {
        terrain.contains(&self.bounds)
    }
}

/// Checks a candidate against every accepted instance, then against the terrain.
pub fn validate_placement(
    candidate: &ModelInstance,
    placed: &[ModelInstance],
    terrain: &Terrain,
) -> Result<(), PlacementError> {
    if let Some(other) = placed.iter().find(|other| candidate.collides(other)) {
        return Err(PlacementError::Collision {
            id: candidate.id.clone(),
            other: other.id.clone(),
        });
    }
    if !candidate.in_bounds(terrain) {
        return Err(PlacementError::OutOfBounds {
            id: candidate.id.clone(),
        });
    }
    Ok(())
}
