//! Assembles a [`Robot`]'s component tree into scene nodes.
//!
//! The entry point is [`RobotAssembler`]. Configure it with an [`AssemblyConfig`], then
//! call [`RobotAssembler::assemble`] with a robot, the [`Scene`] to build into and a
//! [`GeometryProvider`].
//!
//! # Node layout
//!
//! ```text
//! robot root
//! └── component (root part)
//!     ├── model (geometry, scale, own heading)
//!     └── slot "n" (mount heading)
//!         └── component (translated along local X)
//!             ├── model
//!             └── slot ...
//! ```
//!
//! Every non-root component hangs from a slot node under its parent's component node.
//! The slot node carries the mount rotation and the component node the translation away
//! from the parent, so rotations and offsets compose down the tree without any explicit
//! matrix bookkeeping here.

use glam::Vec3;

use crate::component::{ComponentKind, Material, SLOT_COUNT};
use crate::error::AssemblyError;
use crate::geometry::GeometryProvider;
use crate::robot::Robot;
use crate::scene::{Aabb, NodeHandle, Scene};
use crate::tree::ComponentNode;

/// Mount headings (degrees) for slots 0, 1, 2 and 3.
pub const SLOT_HEADINGS: [f32; SLOT_COUNT] = [90.0, 270.0, 0.0, 180.0];

/// Heading used for every child of a direction-locked parent, which has one physical slot.
pub const SINGLE_SLOT_HEADING: f32 = SLOT_HEADINGS[2];

/// Configuration for robot assembly.
#[derive(Clone, Debug, PartialEq)]
pub struct AssemblyConfig {
    /// Uniform scale applied to every component model.
    pub scale: f32,
    /// Gap left between neighbouring components.
    pub tolerance: f32,
    /// Extra overlap where a pluggable part slides into a slot. Default: 0.15 + tolerance.
    pub slot_offset: f32,
    /// Thickness of the terrain slab.
    pub ground_height: f32,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        let tolerance = 0.02;
        Self {
            scale: 0.1,
            tolerance,
            slot_offset: 0.15 + tolerance,
            ground_height: 2.0,
        }
    }
}

impl AssemblyConfig {
    /// Sets the uniform model scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the gap left between neighbouring components.
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the extra overlap applied where parts interlock.
    pub fn with_slot_offset(mut self, slot_offset: f32) -> Self {
        self.slot_offset = slot_offset;
        self
    }

    /// Sets the terrain slab thickness.
    pub fn with_ground_height(mut self, ground_height: f32) -> Self {
        self.ground_height = ground_height;
        self
    }
}

/// Rotation of the slot node a child is mounted on.
pub fn mount_heading(parent: &ComponentNode, slot: u8) -> f32 {
    if parent.kind.direction_locked() {
        SINGLE_SLOT_HEADING
    } else {
        SLOT_HEADINGS[usize::from(slot)] + parent.heading()
    }
}

/// True when one side exposes a slot and the other plugs into it.
pub fn interlocks(parent: ComponentKind, child: ComponentKind) -> bool {
    (parent.provides_slot() && child.pluggable()) || (parent.pluggable() && child.provides_slot())
}

/// Distance along the slot's X axis from the parent's centre to the child's centre.
pub fn mount_offset(
    config: &AssemblyConfig,
    parent: ComponentKind,
    parent_size: Vec3,
    child: ComponentKind,
    child_size: Vec3,
) -> f32 {
    let size_difference = (parent_size.x - child_size.x) / 2.0 - config.tolerance;
    let offset = parent_size.x - size_difference;
    if interlocks(parent, child) {
        offset - config.slot_offset
    } else {
        offset
    }
}

/// A component as it ended up in the scene.
#[derive(Clone, Debug)]
pub struct PlacedComponent {
    pub id: String,
    pub kind: ComponentKind,
    /// Measured size of the scaled, rotated model.
    pub size: Vec3,
    /// World-space centre after the robot was placed.
    pub position: Vec3,
    pub node: NodeHandle,
    pub model: NodeHandle,
    /// Slot node the component hangs from; `None` for the root part.
    pub slot: Option<NodeHandle>,
}

/// An assembled robot: its root node in the scene plus its world-space footprint.
#[derive(Clone, Debug)]
pub struct ModelInstance {
    pub id: String,
    pub robot: Robot,
    pub root: NodeHandle,
    pub bounds: Aabb,
    pub components: Vec<PlacedComponent>,
}

impl ModelInstance {
    /// Looks up a placed component by its part id.
    pub fn component(&self, id: &str) -> Option<&PlacedComponent> {
        self.components.iter().find(|c| c.id == id)
    }
}

/// Turns robots into scene nodes.
#[derive(Clone, Debug, Default)]
pub struct RobotAssembler {
    config: AssemblyConfig,
}

impl RobotAssembler {
    /// Creates an assembler with the given configuration.
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Builds `robot` into `scene` and places it at its position, resting on `z = 0`.
    ///
    /// The returned instance's root node is left detached from the scene root; the
    /// caller decides whether to accept it. On error every node created here is removed.
    ///
    /// # Geometry placement
    ///
    /// For each component in pre-order:
    /// 1. Its base geometry is loaded and scaled. Unless the kind is direction-locked,
    ///    the model is turned by the component's own orientation. The model's tight
    ///    bounds give the component's measured size.
    /// 2. The root component goes straight under the robot root. Any other component
    ///    gets a slot node under its parent, turned by [`mount_heading`], and is itself
    ///    pushed out along the slot's X axis by [`mount_offset`].
    ///
    /// Finally the robot root is moved to `(x, y)` and lifted by half its height.
    pub fn assemble<G: GeometryProvider + ?Sized>(
        &self,
        robot: Robot,
        scene: &mut Scene,
        geometry: &G,
    ) -> Result<ModelInstance, AssemblyError> {
        let root = scene.create_node(robot.id.clone());
        match self.build_components(&robot, root, scene, geometry) {
            Ok(components) => self.place(robot, root, components, scene),
            Err(e) => {
                scene.remove(root);
                Err(e)
            }
        }
    }

    fn build_components<G: GeometryProvider + ?Sized>(
        &self,
        robot: &Robot,
        root: NodeHandle,
        scene: &mut Scene,
        geometry: &G,
    ) -> Result<Vec<PlacedComponent>, AssemblyError> {
        let tree = &robot.tree;
        let mut placed: Vec<Option<usize>> = vec![None; tree.len()];
        let mut components: Vec<PlacedComponent> = Vec::with_capacity(tree.len());

        for visit in tree.iter() {
            let component = visit.node;

            // 1. Model
            let shape = geometry.load_geometry(component.kind)?;
            let model = scene.create_node(component.kind.name());
            scene.set_geometry(model, shape);
            scene.set_material(model, Material::component(component.kind.color()));
            scene.set_scale(model, Vec3::splat(self.config.scale));
            if !component.kind.direction_locked() {
                scene.set_heading(model, component.heading());
            }
            let size = scene
                .tight_bounds(model)
                .map(|b| b.size())
                .unwrap_or(Vec3::ZERO);

            let node = scene.create_node(component.id.clone());
            scene.attach(model, node);

            // 2. Mount
            let slot_node = match (visit.parent, visit.slot) {
                (Some((parent_id, parent)), Some(slot)) => {
                    let Some(parent_placed) = placed[parent_id].map(|i| &components[i]) else {
                        scene.remove(node);
                        return Err(AssemblyError::InvalidRobot {
                            reason: format!(
                                "component '{}' visited before its parent '{}'",
                                component.id, parent.id
                            ),
                        });
                    };

                    let slot_node = scene.create_node(slot.to_string());
                    scene.set_heading(slot_node, mount_heading(parent, slot));
                    scene.attach(slot_node, parent_placed.node);

                    let offset = mount_offset(
                        &self.config,
                        parent.kind,
                        parent_placed.size,
                        component.kind,
                        size,
                    );
                    scene.set_translation(node, Vec3::new(offset, 0.0, 0.0));
                    scene.attach(node, slot_node);

                    tracing::debug!(
                        "{} -> slot {} of {}: heading {}, offset {:.3}",
                        component.id,
                        slot,
                        parent.id,
                        mount_heading(parent, slot),
                        offset
                    );
                    Some(slot_node)
                }
                _ => {
                    scene.attach(node, root);
                    None
                }
            };

            placed[visit.id] = Some(components.len());
            components.push(PlacedComponent {
                id: component.id.clone(),
                kind: component.kind,
                size,
                position: Vec3::ZERO,
                node,
                model,
                slot: slot_node,
            });
        }

        Ok(components)
    }

    fn place(
        &self,
        robot: Robot,
        root: NodeHandle,
        mut components: Vec<PlacedComponent>,
        scene: &mut Scene,
    ) -> Result<ModelInstance, AssemblyError> {
        // 3. Rest on the ground at the requested position.
        let Some(local) = scene.tight_bounds(root) else {
            scene.remove(root);
            return Err(AssemblyError::InvalidRobot {
                reason: format!("robot '{}' has no geometry", robot.id),
            });
        };
        let height = local.size().z;
        scene.set_translation(
            root,
            Vec3::new(
                robot.position.x as f32,
                robot.position.y as f32,
                height / 2.0,
            ),
        );

        for component in &mut components {
            component.position = scene.world_position(component.node);
        }
        let bounds = scene.world_bounds(root).unwrap_or(local);

        Ok(ModelInstance {
            id: robot.id.clone(),
            robot,
            root,
            bounds,
            components,
        })
    }
}
