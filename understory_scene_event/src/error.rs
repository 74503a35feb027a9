// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for traversal and transform queries.

use core::fmt::Debug;

use crate::frames::DerivedTransform;

/// Which traversal stack an underflow happened on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StackKind {
    /// The node path.
    Node,
    /// The document stack.
    Document,
    /// The viewbox stack.
    Viewbox,
    /// The canvas viewport stack.
    Viewport,
    /// The canvas render-target stack.
    Fbo,
}

/// Errors raised while traversing a scene or resolving transforms.
///
/// Some variants are fatal to the whole traversal (see [`SceneError::is_fatal`]):
/// the scene graph is malformed or push/pop calls were mismatched, and the
/// event must be aborted. The others only fail the query that produced them.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum SceneError<K: Debug> {
    /// A node was pushed while already on the active path.
    #[error("scene graph cycle detected; cannot push {node:?}")]
    Cycle {
        /// The node that would have been entered twice.
        node: K,
    },

    /// No connecting path exists between two frames given the current stack.
    #[error("unable to find unique path from {from:?} to {to:?}")]
    DisjointPath {
        /// Source of the query.
        from: K,
        /// Target of the query.
        to: K,
    },

    /// Popping a node did not pop the document it pushed.
    #[error("document stack out of sync when popping {node:?}: expected {expected:?}, found {found:?}")]
    DocumentMismatch {
        /// The node being popped.
        node: K,
        /// The document declared by that node.
        expected: K,
        /// What the document stack actually held.
        found: Option<K>,
    },

    /// A scoped pop returned a different entry than the one its push entered.
    #[error("unbalanced traversal: expected to leave {expected:?}, found {found:?}")]
    Unbalanced {
        /// The entry the scope pushed.
        expected: K,
        /// What was on top of the stack instead.
        found: K,
    },

    /// A pop was issued on an empty stack.
    #[error("cannot pop from empty {0:?} stack")]
    StackUnderflow(StackKind),

    /// A query needed the current node, but the path is empty.
    #[error("no current node: the traversal path is empty")]
    EmptyPath,

    /// A derived transform was assigned to.
    #[error("cannot set {0:?} on a scene event; it is derived from the scene graph")]
    ImmutableTransform(DerivedTransform),
}

impl<K: Debug> SceneError<K> {
    /// Whether this error must abort the traversal of the current event.
    ///
    /// Cycles, document mismatches, unbalanced scopes, and stack underflows
    /// indicate a malformed graph or mismatched push/pop calls. Path and assignment errors only
    /// fail the query that raised them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Cycle { .. }
                | Self::DocumentMismatch { .. }
                | Self::Unbalanced { .. }
                | Self::StackUnderflow(_)
        )
    }
}
