// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene event: traversal state plus transform queries for one dispatch.
//!
//! ## Lifecycle
//!
//! A [`SceneEvent`] is created per dispatched event with an empty path. As the
//! dispatch loop descends into each node it calls [`SceneEvent::push_node`],
//! and [`SceneEvent::pop_node`] on the way back up. At any point in between,
//! handlers may ask for transforms between any two nodes or canonical frames.
//! The event is dropped (or turned back into its cache) when dispatch ends.
//!
//! ## Memoization
//!
//! Two layers keep repeated queries cheap:
//!
//! - Resolved routes are remembered per `(from, to)` pair for as long as the
//!   node path is unchanged, so repeating a query does not walk the graph.
//! - Composed chains live in a [`TransformCache`], which survives path changes
//!   and may be handed on to later events within the same frame.

use core::fmt;

use hashbrown::HashMap;

use crate::cache::{CacheStats, Hop, TransformCache, TransformChain};
use crate::context::TraversalContext;
use crate::error::{SceneError, StackKind};
use crate::frames::{CanonicalFrame, DerivedTransform};
use crate::graph::{Canvas, FboFrame, NodeKey, SceneGraph, Viewport};
use crate::pointer::EventKind;
use crate::resolve::{self, NodePath};

/// An event travelling through a scene graph, beginning at a canvas.
///
/// See the [module documentation](self) for the lifecycle.
pub struct SceneEvent<'a, K, G, C>
where
    K: NodeKey,
    G: SceneGraph<K>,
    C: Canvas<K, G::Transform>,
{
    kind: EventKind,
    graph: &'a G,
    canvas: &'a mut C,
    context: TraversalContext<K>,
    cache: TransformCache<K, G::Transform>,
    routes: HashMap<(K, K), TransformChain<K>>,
    /// context generation the memoized routes belong to
    routes_generation: u64,
    path_walks: u64,
}

impl<K, G, C> fmt::Debug for SceneEvent<'_, K, G, C>
where
    K: NodeKey,
    G: SceneGraph<K>,
    C: Canvas<K, G::Transform>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneEvent")
            .field("kind", &self.kind)
            .field("path", &self.context.path())
            .field("viewboxes", &self.context.viewboxes())
            .field("documents", &self.context.documents())
            .field("cached_chains", &self.cache.len())
            .field("memoized_routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

impl<'a, K, G, C> SceneEvent<'a, K, G, C>
where
    K: NodeKey,
    G: SceneGraph<K>,
    C: Canvas<K, G::Transform>,
{
    /// Create an event with an empty path and a fresh transform cache.
    pub fn new(kind: EventKind, graph: &'a G, canvas: &'a mut C) -> Self {
        Self::with_cache(kind, graph, canvas, TransformCache::new())
    }

    /// Create an event that reuses an existing transform cache.
    ///
    /// Only share a cache between events that see the same node transforms,
    /// typically nested passes within one frame.
    pub fn with_cache(
        kind: EventKind,
        graph: &'a G,
        canvas: &'a mut C,
        cache: TransformCache<K, G::Transform>,
    ) -> Self {
        Self {
            kind,
            graph,
            canvas,
            context: TraversalContext::new(),
            cache,
            routes: HashMap::new(),
            routes_generation: 0,
            path_walks: 0,
        }
    }

    /// Finish the event and recover its transform cache for reuse.
    pub fn into_cache(self) -> TransformCache<K, G::Transform> {
        self.cache
    }

    /// What kind of event this is.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The scene graph being traversed.
    pub fn graph(&self) -> &'a G {
        self.graph
    }

    /// The canvas that originated this event.
    pub fn canvas(&self) -> &C {
        &*self.canvas
    }

    /// The traversal stacks.
    pub fn context(&self) -> &TraversalContext<K> {
        &self.context
    }

    // --- traversal ---

    /// The path from the root to the current recipient of this event.
    pub fn path(&self) -> &[K] {
        self.context.path()
    }

    /// The node currently being visited.
    pub fn current(&self) -> Option<K> {
        self.context.current()
    }

    /// The innermost viewbox, if any.
    pub fn viewbox(&self) -> Option<K> {
        self.context.current_viewbox()
    }

    /// Enter `node`. See [`TraversalContext::push_node`].
    pub fn push_node(&mut self, node: K) -> Result<(), SceneError<K>> {
        self.context.push_node(self.graph, node)
    }

    /// Leave the current node. See [`TraversalContext::pop_node`].
    pub fn pop_node(&mut self) -> Result<K, SceneError<K>> {
        self.context.pop_node(self.graph)
    }

    /// Enter a viewbox.
    pub fn push_viewbox(&mut self, viewbox: K) {
        self.context.push_viewbox(viewbox);
    }

    /// Leave the innermost viewbox.
    pub fn pop_viewbox(&mut self) -> Result<K, SceneError<K>> {
        self.context.pop_viewbox()
    }

    /// Run `f` with `node` pushed, then pop it.
    ///
    /// An error from the final pop takes precedence over `f`'s result. If `f`
    /// leaves the path unbalanced, the path is cut back to where it was before
    /// `node` was pushed and [`SceneError::Unbalanced`] is returned.
    pub fn with_node<R>(
        &mut self,
        node: K,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, SceneError<K>> {
        let base = self.context.depth();
        self.push_node(node)?;
        let out = f(self);
        match self.pop_node() {
            Ok(popped) if popped == node => Ok(out),
            Ok(popped) => {
                tracing::warn!(expected = ?node, found = ?popped, "unbalanced node scope");
                self.abort_to(base);
                Err(SceneError::Unbalanced {
                    expected: node,
                    found: popped,
                })
            }
            Err(err) => {
                self.abort_to(base);
                Err(err)
            }
        }
    }

    /// Run `f` inside `viewbox`, then leave it.
    ///
    /// Fails with [`SceneError::Unbalanced`] if `f` left another viewbox on top.
    pub fn with_viewbox<R>(
        &mut self,
        viewbox: K,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, SceneError<K>> {
        self.push_viewbox(viewbox);
        let out = f(self);
        let popped = self.pop_viewbox()?;
        if popped != viewbox {
            tracing::warn!(expected = ?viewbox, found = ?popped, "unbalanced viewbox scope");
            return Err(SceneError::Unbalanced {
                expected: viewbox,
                found: popped,
            });
        }
        Ok(out)
    }

    /// Abandon every node above `depth` after a fatal error.
    pub fn abort_to(&mut self, depth: usize) {
        self.context.abort_to(self.graph, depth);
    }

    // --- viewport and render targets ---

    /// Push a viewport, relative to the current one, on the canvas.
    pub fn push_viewport(&mut self, viewport: Viewport) {
        self.canvas.push_viewport(viewport);
    }

    /// Pop the most recent viewport from the canvas.
    pub fn pop_viewport(&mut self) -> Result<Viewport, SceneError<K>> {
        self.canvas
            .pop_viewport()
            .ok_or(SceneError::StackUnderflow(StackKind::Viewport))
    }

    /// Push a render target, its viewport, and the transform into it.
    pub fn push_fbo(&mut self, viewport: Viewport, target: C::Target, transform: G::Transform) {
        self.canvas.push_fbo(viewport, target, transform);
    }

    /// Pop the most recent render target from the canvas.
    pub fn pop_fbo(&mut self) -> Result<FboFrame<C::Target, G::Transform>, SceneError<K>> {
        self.canvas
            .pop_fbo()
            .ok_or(SceneError::StackUnderflow(StackKind::Fbo))
    }

    // --- canonical frames ---

    /// The node for the current document frame.
    ///
    /// This is the innermost document entered along the path, or the canvas
    /// frame if there is none. Physical measurements (px, mm, in) are made
    /// here.
    pub fn document_cs(&self) -> K {
        self.context
            .document()
            .unwrap_or_else(|| self.canvas.canvas_cs())
    }

    /// The node for logical canvas pixels.
    pub fn canvas_cs(&self) -> K {
        self.canvas.canvas_cs()
    }

    /// The node for physical framebuffer pixels.
    pub fn buffer_cs(&self) -> K {
        self.canvas.buffer_cs()
    }

    /// The node for normalized device coordinates.
    pub fn render_cs(&self) -> K {
        self.canvas.render_cs()
    }

    /// Resolve a canonical frame to its node.
    pub fn frame(&self, frame: CanonicalFrame) -> K {
        match frame {
            CanonicalFrame::Document => self.document_cs(),
            CanonicalFrame::Canvas => self.canvas_cs(),
            CanonicalFrame::Buffer => self.buffer_cs(),
            CanonicalFrame::Render => self.render_cs(),
        }
    }

    /// Compute one of the derived transforms.
    pub fn derived_transform(
        &mut self,
        which: DerivedTransform,
    ) -> Result<G::Transform, SceneError<K>> {
        let (from, to) = which.endpoints();
        let from = from.map(|f| self.frame(f));
        let to = self.frame(to);
        self.node_transform(from, Some(to))
    }

    /// Derived transforms are read-only; this always fails.
    pub fn assign_derived_transform(
        &mut self,
        which: DerivedTransform,
        transform: G::Transform,
    ) -> Result<(), SceneError<K>> {
        let _ = transform;
        Err(SceneError::ImmutableTransform(which))
    }

    /// Current node's local frame to the document frame.
    pub fn visual_to_document(&mut self) -> Result<G::Transform, SceneError<K>> {
        self.derived_transform(DerivedTransform::VisualToDocument)
    }

    /// Document frame to framebuffer pixels.
    pub fn document_to_buffer(&mut self) -> Result<G::Transform, SceneError<K>> {
        self.derived_transform(DerivedTransform::DocumentToBuffer)
    }

    /// Framebuffer pixels to normalized device coordinates.
    pub fn buffer_to_render(&mut self) -> Result<G::Transform, SceneError<K>> {
        self.derived_transform(DerivedTransform::BufferToRender)
    }

    // --- transforms ---

    /// Transform from `map_from` to `map_to`, using the path to resolve
    /// shared nodes.
    ///
    /// `map_to` defaults to normalized device coordinates and `map_from` to
    /// the current node. Without a current node, a defaulted source fails with
    /// [`SceneError::EmptyPath`].
    pub fn node_transform(
        &mut self,
        map_from: Option<K>,
        map_to: Option<K>,
    ) -> Result<G::Transform, SceneError<K>> {
        let map_to = map_to.unwrap_or_else(|| self.canvas.render_cs());
        let map_from = match map_from {
            Some(node) => node,
            None => self.current().ok_or(SceneError::EmptyPath)?,
        };
        self.transform_between(map_from, map_to)
    }

    /// Transform from `map_from`'s frame to `map_to`'s.
    pub fn transform_between(
        &mut self,
        map_from: K,
        map_to: K,
    ) -> Result<G::Transform, SceneError<K>> {
        let generation = self.context.generation();
        if self.routes_generation != generation {
            self.routes.clear();
            self.routes_generation = generation;
        }
        if let Some(chain) = self.routes.get(&(map_from, map_to)) {
            return Ok(self.cache.get(self.graph, chain));
        }

        // `route` walks at most twice; count both as one resolution.
        self.path_walks += 1;
        let chain = resolve::route(&self.context, self.graph, map_from, map_to)?;
        let t = self.cache.get(self.graph, &chain);
        self.routes.insert((map_from, map_to), chain);
        Ok(t)
    }

    /// The raw node walk from `start` toward `end`; see [`resolve::node_path`].
    pub fn node_path(&self, start: K, end: K) -> NodePath<K> {
        resolve::node_path(&self.context, self.graph, start, end)
    }

    /// Transform from the current node through every node on the path:
    /// current node first, then each traversal ancestor toward the root.
    ///
    /// This is what most visuals draw with: the current node composed with
    /// each of its traversal ancestors.
    pub fn full_transform(&mut self) -> G::Transform {
        let chain: TransformChain<K> = self
            .context
            .path()
            .iter()
            .rev()
            .copied()
            .map(Hop::forward)
            .collect();
        self.cache.get(self.graph, &chain)
    }

    /// Transform from the current node to the scene of the innermost viewbox.
    ///
    /// `Ok(None)` unless at least two viewboxes are on the stack, or when the
    /// innermost viewbox owns no scene.
    pub fn scene_transform(&mut self) -> Result<Option<G::Transform>, SceneError<K>> {
        let Some(view) = self.nested_viewbox() else {
            return Ok(None);
        };
        let Some(scene) = self.graph.scene_of(&view) else {
            return Ok(None);
        };
        self.node_transform(None, Some(scene)).map(Some)
    }

    /// Transform from the current node to the innermost viewbox.
    ///
    /// `Ok(None)` unless at least two viewboxes are on the stack.
    pub fn view_transform(&mut self) -> Result<Option<G::Transform>, SceneError<K>> {
        let Some(view) = self.nested_viewbox() else {
            return Ok(None);
        };
        self.node_transform(None, Some(view)).map(Some)
    }

    fn nested_viewbox(&self) -> Option<K> {
        match self.context.viewboxes() {
            [.., _, inner] => Some(*inner),
            _ => None,
        }
    }

    // --- probes ---

    /// How many route resolutions walked the graph.
    ///
    /// Queries answered from the route memo do not count.
    pub fn path_walks(&self) -> u64 {
        self.path_walks
    }

    /// Counters of the transform cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
