// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers and per-node data.

use kurbo::Affine;

/// Identifier for a node in the graph (generational).
///
/// A slot freed by [`SceneTree::remove`](crate::SceneTree::remove) may be
/// reused, but with a higher generation, so stale ids never alias new nodes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Per-node data.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalNode {
    /// Maps the node's local frame into its parents' frame.
    pub local_transform: Affine,
    /// Document whose frame this node establishes for its subtree.
    pub document: Option<NodeId>,
    /// Scene owned by this node when it acts as a viewbox.
    pub scene: Option<NodeId>,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            local_transform: Affine::IDENTITY,
            document: None,
            scene: None,
        }
    }
}

impl LocalNode {
    /// A node with the given transform and nothing else.
    pub fn with_transform(local_transform: Affine) -> Self {
        Self {
            local_transform,
            ..Self::default()
        }
    }
}
