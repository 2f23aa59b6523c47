//! Minimal scene graph that robots are assembled into.
//!
//! Stands in for a rendering framework: nodes carry a local transform (translation,
//! heading about +Z, scale), optional cuboid geometry and material, and a visibility
//! flag. Nodes are stored in an arena and addressed by [`NodeHandle`]; a node is either
//! attached under another node, attached to the scene root, or detached.

use bevy_math::primitives::Cuboid;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::component::Material;

/// Handle to a node in a [`Scene`]. Stale once the node is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| match acc {
            None => Some(Self::new(p, p)),
            Some(b) => Some(Self::new(b.min.min(p), b.max.max(p))),
        })
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn x_interval(&self) -> (f32, f32) {
        (self.min.x, self.max.x)
    }

    pub fn y_interval(&self) -> (f32, f32) {
        (self.min.y, self.max.y)
    }
}

/// Position, heading (degrees about +Z) and scale of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub heading: f32,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            heading: 0.0,
            scale: Vec3::ONE,
        }
    }
}

impl LocalTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_rotation_z(self.heading.to_radians()),
            self.translation,
        )
    }
}

#[derive(Clone, Debug)]
struct SceneNode {
    name: String,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    transform: LocalTransform,
    geometry: Option<Cuboid>,
    material: Option<Material>,
    visible: bool,
}

/// Arena of scene nodes plus the list of nodes attached to the scene root.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<Option<SceneNode>>,
    free: Vec<usize>,
    root_children: Vec<NodeHandle>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached, empty node.
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeHandle {
        let node = SceneNode {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: LocalTransform::default(),
            geometry: None,
            material: None,
            visible: true,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeHandle(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeHandle(self.nodes.len() - 1)
            }
        }
    }

    fn get(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn name(&self, handle: NodeHandle) -> Option<&str> {
        self.get(handle).map(|n| n.name.as_str())
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.get(handle).and_then(|n| n.parent)
    }

    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.get(handle).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Nodes currently attached to the scene root.
    pub fn root_children(&self) -> &[NodeHandle] {
        &self.root_children
    }

    pub fn is_attached_to_root(&self, handle: NodeHandle) -> bool {
        self.root_children.contains(&handle)
    }

    // --- Content ---

    pub fn set_geometry(&mut self, handle: NodeHandle, geometry: Cuboid) {
        if let Some(node) = self.get_mut(handle) {
            node.geometry = Some(geometry);
        }
    }

    pub fn geometry(&self, handle: NodeHandle) -> Option<Cuboid> {
        self.get(handle).and_then(|n| n.geometry)
    }

    pub fn set_material(&mut self, handle: NodeHandle, material: Material) {
        if let Some(node) = self.get_mut(handle) {
            node.material = Some(material);
        }
    }

    pub fn material(&self, handle: NodeHandle) -> Option<Material> {
        self.get(handle).and_then(|n| n.material)
    }

    pub fn set_visible(&mut self, handle: NodeHandle, visible: bool) {
        if let Some(node) = self.get_mut(handle) {
            node.visible = visible;
        }
    }

    pub fn is_visible(&self, handle: NodeHandle) -> bool {
        self.get(handle).is_some_and(|n| n.visible)
    }

    // --- Transforms ---

    pub fn local_transform(&self, handle: NodeHandle) -> LocalTransform {
        self.get(handle).map(|n| n.transform).unwrap_or_default()
    }

    pub fn set_translation(&mut self, handle: NodeHandle, translation: Vec3) {
        if let Some(node) = self.get_mut(handle) {
            node.transform.translation = translation;
        }
    }

    /// Sets the heading in degrees about +Z.
    pub fn set_heading(&mut self, handle: NodeHandle, degrees: f32) {
        if let Some(node) = self.get_mut(handle) {
            node.transform.heading = degrees;
        }
    }

    pub fn set_scale(&mut self, handle: NodeHandle, scale: Vec3) {
        if let Some(node) = self.get_mut(handle) {
            node.transform.scale = scale;
        }
    }

    pub fn local_matrix(&self, handle: NodeHandle) -> Mat4 {
        self.local_transform(handle).matrix()
    }

    /// Transform from the node's frame to the scene frame.
    pub fn world_matrix(&self, handle: NodeHandle) -> Mat4 {
        let mut matrix = self.local_matrix(handle);
        let mut current = self.parent(handle);
        while let Some(parent) = current {
            matrix = self.local_matrix(parent) * matrix;
            current = self.parent(parent);
        }
        matrix
    }

    pub fn world_position(&self, handle: NodeHandle) -> Vec3 {
        self.world_matrix(handle).transform_point3(Vec3::ZERO)
    }

    /// Tight box around all geometry below `handle` (inclusive), expressed in the
    /// frame of `handle`'s parent. `None` when the subtree holds no geometry.
    pub fn tight_bounds(&self, handle: NodeHandle) -> Option<Aabb> {
        let mut points = Vec::new();
        self.collect_corners(handle, Mat4::IDENTITY, &mut points);
        Aabb::from_points(points)
    }

    /// Tight box around all geometry below `handle`, in the scene frame.
    pub fn world_bounds(&self, handle: NodeHandle) -> Option<Aabb> {
        let parent_matrix = self
            .parent(handle)
            .map(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY);
        let mut points = Vec::new();
        self.collect_corners(handle, parent_matrix, &mut points);
        Aabb::from_points(points)
    }

    fn collect_corners(&self, handle: NodeHandle, parent_matrix: Mat4, out: &mut Vec<Vec3>) {
        let Some(node) = self.get(handle) else {
            return;
        };
        let matrix = parent_matrix * node.transform.matrix();

        if let Some(cuboid) = node.geometry {
            let h = cuboid.half_size;
            for sx in [-1.0, 1.0] {
                for sy in [-1.0, 1.0] {
                    for sz in [-1.0, 1.0] {
                        out.push(matrix.transform_point3(Vec3::new(sx * h.x, sy * h.y, sz * h.z)));
                    }
                }
            }
        }

        for &child in &node.children {
            self.collect_corners(child, matrix, out);
        }
    }

    // --- Hierarchy ---

    /// Reparents `child` under `parent`, detaching it from wherever it was.
    /// Ignored if either handle is stale or `parent` lies below `child`.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if !self.contains(child) || !self.contains(parent) || self.is_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Attaches a detached node (and its subtree) to the scene root.
    pub fn attach_to_root(&mut self, handle: NodeHandle) {
        if !self.contains(handle) {
            return;
        }
        self.detach(handle);
        self.root_children.push(handle);
    }

    /// Unlinks a node from its parent or from the scene root. The node survives.
    pub fn detach(&mut self, handle: NodeHandle) {
        let parent = self.get_mut(handle).and_then(|n| n.parent.take());
        match parent {
            Some(parent) => {
                if let Some(node) = self.get_mut(parent) {
                    node.children.retain(|&c| c != handle);
                }
            }
            None => self.root_children.retain(|&c| c != handle),
        }
    }

    /// Detaches and destroys a node together with its whole subtree.
    pub fn remove(&mut self, handle: NodeHandle) {
        if !self.contains(handle) {
            return;
        }
        self.detach(handle);
        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
                self.free.push(current.0);
            }
        }
    }

    /// First direct child with the given name.
    pub fn find_child(&self, handle: NodeHandle, name: &str) -> Option<NodeHandle> {
        self.children(handle)
            .iter()
            .copied()
            .find(|&c| self.name(c) == Some(name))
    }

    /// First descendant (depth-first) with the given name.
    pub fn find(&self, handle: NodeHandle, name: &str) -> Option<NodeHandle> {
        for &child in self.children(handle) {
            if self.name(child) == Some(name) {
                return Some(child);
            }
            if let Some(found) = self.find(child, name) {
                return Some(found);
            }
        }
        None
    }

    fn is_ancestor(&self, ancestor: NodeHandle, mut handle: NodeHandle) -> bool {
        loop {
            if handle == ancestor {
                return true;
            }
            match self.parent(handle) {
                Some(parent) => handle = parent,
                None => return false,
            }
        }
    }
}
