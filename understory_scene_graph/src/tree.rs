// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core graph implementation: structure, updates, queries.

use alloc::vec::Vec;
use kurbo::Affine;
use smallvec::SmallVec;
use understory_scene_event::SceneGraph;

use crate::types::{LocalNode, NodeId};

/// A scene graph whose nodes may have several parents.
///
/// Nodes live in a generational arena. Each one carries a [`LocalNode`]: a
/// transform into its parents' frame, and optional document and scene links.
/// A node with more than one parent appears in several places in the scene;
/// which of them an event is currently visiting is decided by the traversal,
/// not by the graph.
///
/// Cycles are not rejected here. A traversal that runs into one reports
/// [`SceneError::Cycle`](understory_scene_event::SceneError::Cycle).
///
/// ## Example
///
/// ```rust
/// use kurbo::{Affine, Vec2};
/// use understory_scene_graph::{LocalNode, SceneTree};
///
/// let mut tree = SceneTree::new();
/// let left = tree.insert(&[], LocalNode::default());
/// let right = tree.insert(&[], LocalNode::default());
/// let shared = tree.insert(
///     &[left, right],
///     LocalNode::with_transform(Affine::translate(Vec2::new(5.0, 0.0))),
/// );
///
/// assert_eq!(tree.parents_of(shared), &[left, right]);
/// assert_eq!(tree.children_of(left), &[shared]);
///
/// // Removing one parent keeps the shared child alive.
/// tree.remove(left);
/// assert!(tree.is_alive(shared));
/// assert_eq!(tree.parents_of(shared), &[right]);
/// ```
#[derive(Clone, Default)]
pub struct SceneTree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl core::fmt::Debug for SceneTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("SceneTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parents: SmallVec<[NodeId; 2]>,
    children: Vec<NodeId>,
    local: LocalNode,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        Self {
            generation,
            parents: SmallVec::new(),
            children: Vec::new(),
            local,
        }
    }
}

impl SceneTree {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under each of `parents` (a root if empty).
    ///
    /// Stale or repeated parents are ignored.
    pub fn insert(&mut self, parents: &[NodeId], local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        for &parent in parents {
            self.add_parent(id, parent);
        }
        id
    }

    /// Link `id` under `parent` in addition to its existing parents.
    ///
    /// Returns `false` if either node is stale or the link already exists.
    pub fn add_parent(&mut self, id: NodeId, parent: NodeId) -> bool {
        if !self.is_alive(id) || !self.is_alive(parent) || self.parents_of(id).contains(&parent)
        {
            return false;
        }
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.push(id);
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.parents.push(parent);
        }
        true
    }

    /// Unlink `id` from `parent`. The node stays alive, possibly as a root.
    ///
    /// Returns `false` if the link did not exist.
    pub fn remove_parent(&mut self, id: NodeId, parent: NodeId) -> bool {
        let Some(n) = self.node_opt_mut(id) else {
            return false;
        };
        let before = n.parents.len();
        n.parents.retain(|p| *p != parent);
        if n.parents.len() == before {
            return false;
        }
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        true
    }

    /// Remove a node.
    ///
    /// Children that are left without any parent are removed with it;
    /// children that still have another parent survive.
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        let parents = core::mem::take(&mut node.parents);
        let children = core::mem::take(&mut node.children);
        for parent in parents {
            if let Some(p) = self.node_opt_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());

        for child in children {
            let orphaned = match self.node_opt_mut(child) {
                Some(c) => {
                    c.parents.retain(|p| *p != id);
                    c.parents.is_empty()
                }
                None => false,
            };
            if orphaned {
                tracing::trace!(node = ?child, "removing orphaned child");
                self.remove(child);
            }
        }
    }

    /// Update local transform.
    pub fn set_local_transform(&mut self, id: NodeId, tf: Affine) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.local_transform = tf;
        }
    }

    /// Set or clear the document this node establishes.
    pub fn set_document(&mut self, id: NodeId, document: Option<NodeId>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.document = document;
        }
    }

    /// Set or clear the scene this node owns as a viewbox.
    pub fn set_scene(&mut self, id: NodeId, scene: Option<NodeId>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.scene = scene;
        }
    }

    /// Returns the local data of a node if the identifier is live.
    pub fn local(&self, id: NodeId) -> Option<&LocalNode> {
        self.node_opt(id).map(|n| &n.local)
    }

    /// Returns the local transform of a node if the identifier is live.
    pub fn local_transform(&self, id: NodeId) -> Option<Affine> {
        self.local(id).map(|l| l.local_transform)
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Get the parents of a node, or empty slice if node is stale.
    pub fn parents_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map(|n| &n.parents[..]).unwrap_or(&[])
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map(|n| &n.children[..]).unwrap_or(&[])
    }

    /// Live nodes without parents.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(idx, slot)| {
            let n = slot.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            let id = NodeId::new(idx as u32, n.generation);
            n.parents.is_empty().then_some(id)
        })
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Whether the graph has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- internals ---

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }
}

impl SceneGraph<NodeId> for SceneTree {
    type Transform = Affine;

    /// Stale nodes report the identity.
    fn transform(&self, node: &NodeId) -> Affine {
        self.local_transform(*node).unwrap_or(Affine::IDENTITY)
    }

    fn parents(&self, node: &NodeId) -> &[NodeId] {
        self.parents_of(*node)
    }

    fn document(&self, node: &NodeId) -> Option<NodeId> {
        self.local(*node).and_then(|l| l.document)
    }

    fn scene_of(&self, viewbox: &NodeId) -> Option<NodeId> {
        self.local(*viewbox).and_then(|l| l.scene)
    }
}
