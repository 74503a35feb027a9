// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator interfaces: scene nodes and the canvas.
//!
//! The traversal core never owns nodes or frames. It reads node data through
//! [`SceneGraph`] and delegates frame anchors and viewport/render-target
//! nesting to a [`Canvas`].

use core::fmt::Debug;
use core::hash::Hash;

use crate::transform::Transform;

/// Handle identifying a node.
///
/// Handles are compared by identity: two distinct nodes must never produce
/// equal handles, even when their contents are identical. Arena indices and
/// generational ids both satisfy this.
pub trait NodeKey: Copy + Eq + Hash + Debug {}

impl<K: Copy + Eq + Hash + Debug> NodeKey for K {}

/// Read-only access to the nodes of a scene graph.
pub trait SceneGraph<K> {
    /// Elementary transform type carried by each node.
    type Transform: Transform;

    /// The transform mapping `node`'s local frame into its parent's frame.
    fn transform(&self, node: &K) -> Self::Transform;

    /// Parents of `node`, in insertion order.
    ///
    /// Roots return an empty slice. More than one entry makes the upward path
    /// ambiguous; the resolver then consults the live traversal stack.
    fn parents(&self, node: &K) -> &[K];

    /// The unique parent of `node`, or `None` for roots and multi-parent nodes.
    fn parent(&self, node: &K) -> Option<K>
    where
        K: Copy,
    {
        match self.parents(node) {
            [parent] => Some(*parent),
            _ => None,
        }
    }

    /// The document node whose frame `node` establishes for its subtree, if any.
    fn document(&self, node: &K) -> Option<K>;

    /// The scene owned by a viewbox node, if `viewbox` is one.
    fn scene_of(&self, viewbox: &K) -> Option<K> {
        let _ = viewbox;
        None
    }
}

/// Integer viewport rectangle in framebuffer pixels.
///
/// When pushed, the origin is interpreted relative to the enclosing viewport.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Create a viewport from its origin and size.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A render target pushed on the canvas together with its viewport and the
/// transform into the target.
#[derive(Clone, Debug, PartialEq)]
pub struct FboFrame<R, T> {
    /// Viewport within the render target.
    pub viewport: Viewport,
    /// The render target itself.
    pub target: R,
    /// Transform mapping the enclosing frame into the target.
    pub transform: T,
}

/// The canvas an event originates from.
///
/// Exposes the three canvas-owned frame anchors and the viewport and
/// render-target stacks. The traversal core forwards these calls unchanged.
pub trait Canvas<K, T> {
    /// Render target handle accepted by [`Canvas::push_fbo`].
    type Target;

    /// Logical canvas pixels, origin at the top left.
    fn canvas_cs(&self) -> K;

    /// Physical framebuffer pixels.
    fn buffer_cs(&self) -> K;

    /// Normalized device coordinates, `(-1, -1)` bottom left to `(1, 1)` top right.
    fn render_cs(&self) -> K;

    /// Push a viewport relative to the current one.
    fn push_viewport(&mut self, viewport: Viewport);

    /// Pop the most recent viewport, or `None` if none is pushed.
    fn pop_viewport(&mut self) -> Option<Viewport>;

    /// Push a render target with its viewport and the transform into it.
    fn push_fbo(&mut self, viewport: Viewport, target: Self::Target, transform: T);

    /// Pop the most recent render target, or `None` if none is pushed.
    fn pop_fbo(&mut self) -> Option<FboFrame<Self::Target, T>>;
}
