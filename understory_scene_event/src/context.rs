// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversal stacks.
//!
//! A [`TraversalContext`] records the path from the root to the node currently
//! being visited, together with the document and viewbox contexts entered
//! along that path. Every push has a matching pop; pushes and pops must be
//! strictly nested.
//!
//! Node membership is tracked by handle identity, so re-entering a node that
//! is already on the path is detected in O(1) and reported as a cycle.

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::error::{SceneError, StackKind};
use crate::graph::{NodeKey, SceneGraph};

/// Per-event traversal state.
#[derive(Clone, Debug)]
pub struct TraversalContext<K: NodeKey> {
    /// root → current
    nodes: Vec<K>,
    /// mirrors `nodes`
    members: HashSet<K>,
    documents: Vec<K>,
    viewboxes: Vec<K>,
    /// bumped on every node push/pop
    generation: u64,
}

impl<K: NodeKey> Default for TraversalContext<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey> TraversalContext<K> {
    /// Create an empty context.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            members: HashSet::new(),
            documents: Vec::new(),
            viewboxes: Vec::new(),
            generation: 0,
        }
    }

    /// Enter `node`.
    ///
    /// Fails with [`SceneError::Cycle`] if `node` is already on the path; in
    /// that case nothing is modified. Pushes the node's document, if it
    /// declares one.
    pub fn push_node<G>(&mut self, graph: &G, node: K) -> Result<(), SceneError<K>>
    where
        G: SceneGraph<K> + ?Sized,
    {
        if !self.members.insert(node) {
            tracing::warn!(node = ?node, "scene graph cycle detected");
            return Err(SceneError::Cycle { node });
        }
        self.nodes.push(node);
        if let Some(doc) = graph.document(&node) {
            self.documents.push(doc);
        }
        self.generation = self.generation.wrapping_add(1);
        tracing::trace!(node = ?node, depth = self.nodes.len(), "push node");
        Ok(())
    }

    /// Leave the current node and return it.
    ///
    /// If the node declared a document, the document stack is popped as well
    /// and must yield that same document. A mismatch means push and pop calls
    /// were paired incorrectly upstream; it is reported as
    /// [`SceneError::DocumentMismatch`] and the traversal must be aborted.
    pub fn pop_node<G>(&mut self, graph: &G) -> Result<K, SceneError<K>>
    where
        G: SceneGraph<K> + ?Sized,
    {
        let node = self
            .nodes
            .pop()
            .ok_or(SceneError::StackUnderflow(StackKind::Node))?;
        self.members.remove(&node);
        self.generation = self.generation.wrapping_add(1);
        tracing::trace!(node = ?node, depth = self.nodes.len(), "pop node");
        if let Some(expected) = graph.document(&node) {
            let found = self.documents.pop();
            if found != Some(expected) {
                tracing::warn!(node = ?node, ?expected, ?found, "document stack out of sync");
                return Err(SceneError::DocumentMismatch {
                    node,
                    expected,
                    found,
                });
            }
        }
        Ok(node)
    }

    /// Enter a viewbox.
    pub fn push_viewbox(&mut self, viewbox: K) {
        self.viewboxes.push(viewbox);
    }

    /// Leave the innermost viewbox and return it.
    pub fn pop_viewbox(&mut self) -> Result<K, SceneError<K>> {
        self.viewboxes
            .pop()
            .ok_or(SceneError::StackUnderflow(StackKind::Viewbox))
    }

    /// Drop everything above `depth` without consistency checks.
    ///
    /// Used to abandon a traversal after a fatal error. Documents are popped
    /// for every removed node that declares one, as long as any remain.
    pub fn abort_to<G>(&mut self, graph: &G, depth: usize)
    where
        G: SceneGraph<K> + ?Sized,
    {
        while self.nodes.len() > depth {
            let Some(node) = self.nodes.pop() else {
                break;
            };
            self.members.remove(&node);
            if graph.document(&node).is_some() {
                self.documents.pop();
            }
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// The path from the root to the current node.
    pub fn path(&self) -> &[K] {
        &self.nodes
    }

    /// The node currently being visited.
    pub fn current(&self) -> Option<K> {
        self.nodes.last().copied()
    }

    /// The first node on the path.
    pub fn root(&self) -> Option<K> {
        self.nodes.first().copied()
    }

    /// Number of nodes on the path.
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `node` is on the path.
    pub fn contains(&self, node: &K) -> bool {
        self.members.contains(node)
    }

    /// Index of `node` on the path, if present.
    pub fn position(&self, node: &K) -> Option<usize> {
        if !self.contains(node) {
            return None;
        }
        self.nodes.iter().rposition(|n| n == node)
    }

    /// The innermost document, if any.
    pub fn document(&self) -> Option<K> {
        self.documents.last().copied()
    }

    /// All documents entered along the path, outermost first.
    pub fn documents(&self) -> &[K] {
        &self.documents
    }

    /// The innermost viewbox, if any.
    pub fn current_viewbox(&self) -> Option<K> {
        self.viewboxes.last().copied()
    }

    /// All viewboxes entered along the path, outermost first.
    pub fn viewboxes(&self) -> &[K] {
        &self.viewboxes
    }

    /// Changes whenever a node is pushed or popped.
    ///
    /// Anything derived from the path (for example a resolved route) is valid
    /// only while the generation it was computed at is current.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
