//! Rooted component tree built from a flat part list and a connection list.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Children are stored
//! per parent slot, so traversal order is fixed: parent first, then children in
//! ascending slot index.

use std::collections::HashMap;

use crate::component::{BodySpec, ComponentKind, SLOT_COUNT};
use crate::error::StructuralError;

/// Index of a node inside its [`ComponentTree`].
pub type NodeId = usize;

/// A single component of a robot body.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentNode {
    /// Unique within the robot.
    pub id: String,
    pub kind: ComponentKind,
    /// Raw orientation in quarter turns, `0..=3`.
    pub orientation: u8,
    pub root: bool,
    children: [Option<NodeId>; SLOT_COUNT],
    parent: Option<NodeId>,
}

impl ComponentNode {
    fn new(id: String, kind: ComponentKind, orientation: u8, root: bool) -> Self {
        Self {
            id,
            kind,
            orientation,
            root,
            children: [None; SLOT_COUNT],
            parent: None,
        }
    }

    /// Orientation converted to a heading in degrees.
    pub fn heading(&self) -> f32 {
        self.orientation as f32 * 90.0
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child(&self, slot: u8) -> Option<NodeId> {
        self.children.get(slot as usize).copied().flatten()
    }

    /// Occupied slots in ascending order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = (u8, NodeId)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(slot, child)| child.map(|c| (slot as u8, c)))
    }
}

/// One step of a pre-order walk: a node, its parent and the parent slot it hangs from.
/// The root is visited with neither parent nor slot.
#[derive(Clone, Copy, Debug)]
pub struct Visit<'a> {
    pub id: NodeId,
    pub node: &'a ComponentNode,
    pub parent: Option<(NodeId, &'a ComponentNode)>,
    pub slot: Option<u8>,
}

/// An N-ary tree of components rooted at the single `root` part.
#[derive(Clone, Debug)]
pub struct ComponentTree {
    nodes: Vec<ComponentNode>,
    root: NodeId,
    index: HashMap<String, NodeId>,
    issues: Vec<StructuralError>,
}

impl ComponentTree {
    /// Builds a tree from a robot body.
    ///
    /// Unknown kinds, bad orientations, duplicate ids and malformed connections are
    /// skipped and recorded in [`issues`](Self::issues); the rest of the body is still
    /// built. Zero or several root parts are fatal.
    pub fn build(body: &BodySpec) -> Result<Self, StructuralError> {
        let mut nodes: Vec<ComponentNode> = Vec::with_capacity(body.part.len());
        let mut index = HashMap::new();
        let mut issues = Vec::new();

        // 1. One node per recognised part.
        for part in &body.part {
            let kind = match part.kind.parse::<ComponentKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    issues.push(StructuralError::UnknownKind {
                        id: part.id.clone(),
                        kind: part.kind.clone(),
                    });
                    continue;
                }
            };
            let orientation = match u8::try_from(part.orientation) {
                Ok(o) if (o as usize) < SLOT_COUNT => o,
                _ => {
                    issues.push(StructuralError::InvalidOrientation {
                        id: part.id.clone(),
                        orientation: part.orientation,
                    });
                    continue;
                }
            };
            if index.contains_key(&part.id) {
                issues.push(StructuralError::DuplicateId {
                    id: part.id.clone(),
                });
                continue;
            }

            index.insert(part.id.clone(), nodes.len());
            nodes.push(ComponentNode::new(
                part.id.clone(),
                kind,
                orientation,
                part.root,
            ));
        }

        // 2. Root discovery.
        let roots: Vec<NodeId> = (0..nodes.len()).filter(|&i| nodes[i].root).collect();
        let root = match roots.as_slice() {
            [] => return Err(StructuralError::NoRoot),
            [root] => *root,
            _ => {
                return Err(StructuralError::MultipleRoots {
                    ids: roots.iter().map(|&i| nodes[i].id.clone()).collect(),
                });
            }
        };

        // 3. Wire children into parent slots.
        for conn in &body.connection {
            let (Some(&src), Some(&dest)) = (index.get(&conn.src), index.get(&conn.dest)) else {
                issues.push(StructuralError::UnknownEndpoint {
                    src: conn.src.clone(),
                    dest: conn.dest.clone(),
                });
                continue;
            };
            let slot = match u8::try_from(conn.src_slot) {
                Ok(s) if (s as usize) < SLOT_COUNT => s,
                _ => {
                    issues.push(StructuralError::InvalidSlot {
                        src: conn.src.clone(),
                        slot: conn.src_slot,
                    });
                    continue;
                }
            };
            if nodes[src].kind.is_terminal() {
                issues.push(StructuralError::TerminalParent {
                    src: conn.src.clone(),
                    kind: nodes[src].kind,
                });
                continue;
            }
            if nodes[src].children[slot as usize].is_some() {
                issues.push(StructuralError::SlotOccupied {
                    src: conn.src.clone(),
                    slot,
                });
                continue;
            }
            if dest == src {
                issues.push(StructuralError::SelfConnection {
                    id: conn.src.clone(),
                });
                continue;
            }
            if dest == root {
                issues.push(StructuralError::RootAsChild {
                    dest: conn.dest.clone(),
                });
                continue;
            }
            if nodes[dest].parent.is_some() {
                issues.push(StructuralError::MultipleParents {
                    dest: conn.dest.clone(),
                });
                continue;
            }

            nodes[src].children[slot as usize] = Some(dest);
            nodes[dest].parent = Some(src);
        }

        Ok(Self {
            nodes,
            root,
            index,
            issues,
        })
    }

    pub fn root(&self) -> &ComponentNode {
        &self.nodes[self.root]
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&ComponentNode> {
        self.nodes.get(id)
    }

    /// Looks a component up by its string id.
    pub fn find(&self, id: &str) -> Option<&ComponentNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn find_id(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Number of constructed components, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Non-fatal problems found while building.
    pub fn issues(&self) -> &[StructuralError] {
        &self.issues
    }

    /// Pre-order walk from the root, children in ascending slot order.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![(self.root, None, None)],
        }
    }

    /// Pre-order walk collected into a vector.
    pub fn get(&self) -> Vec<Visit<'_>> {
        self.iter().collect()
    }

    /// Components that no connection chain links to the root.
    pub fn unreachable(&self) -> Vec<&ComponentNode> {
        let mut seen = vec![false; self.nodes.len()];
        for visit in self.iter() {
            seen[visit.id] = true;
        }
        self.nodes
            .iter()
            .zip(seen)
            .filter_map(|(node, seen)| (!seen).then_some(node))
            .collect()
    }

    /// Indented textual form, one component per line.
    pub fn dump(&self) -> String {
        self.iter()
            .map(|visit| {
                let depth = self.depth(visit.id);
                format!(
                    "{}{} {}: {} ({})",
                    "  ".repeat(depth),
                    visit.slot.unwrap_or(0),
                    visit.node.id,
                    visit.node.kind,
                    visit.node.heading()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn depth(&self, mut id: NodeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.nodes[id].parent {
            depth += 1;
            id = parent;
        }
        depth
    }
}

/// Iterator returned by [`ComponentTree::iter`].
pub struct PreOrder<'a> {
    tree: &'a ComponentTree,
    stack: Vec<(NodeId, Option<NodeId>, Option<u8>)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, parent, slot) = self.stack.pop()?;
        let node = &self.tree.nodes[id];

        // Reverse so the lowest slot is popped first.
        for (child_slot, child) in node.children().rev() {
            self.stack.push((child, Some(id), Some(child_slot)));
        }

        Some(Visit {
            id,
            node,
            parent: parent.map(|p| (p, &self.tree.nodes[p])),
            slot,
        })
    }
}
