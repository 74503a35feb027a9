// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scene_event --heading-base-level=0

//! Understory Scene Event: traversal context and transform resolution for scene graphs.
//!
//! ## Overview
//!
//! Events are delivered to a scene by walking it from the canvas down. At any
//! node a handler may need the transform from one node's local frame to
//! another's, or to one of the canvas frames: a pointer position in local
//! coordinates, a line width in framebuffer pixels, a vertex in normalized
//! device coordinates.
//!
//! In a strict tree that is a walk to the common ancestor. Scene graphs may
//! share subtrees, though, and a node with several parents has no unique way
//! up. A [`SceneEvent`] remembers the path that was *actually* taken to reach
//! the current node and uses it to settle those ambiguities.
//!
//! ## Pieces
//!
//! - [`TraversalContext`]: node, document, and viewbox stacks with O(1) cycle
//!   detection.
//! - [`node_path`](resolve::node_path) and [`route`](resolve::route): the
//!   two-phase walk (parent pointers, then traversal stack) and the join of a
//!   forward and a reverse walk into a [`TransformChain`].
//! - [`TransformCache`]: composed chains keyed by node identity.
//! - [`SceneEvent`]: ties the above to a [`SceneGraph`] and a [`Canvas`], and
//!   answers queries such as [`SceneEvent::node_transform`],
//!   [`SceneEvent::document_to_buffer`], or [`SceneEvent::pos`].
//! - [`walk::run`]: a depth-first driver that keeps the stacks balanced.
//!
//! The crate owns no nodes. Anything implementing [`SceneGraph`] can be
//! traversed; `understory_scene_graph` provides a ready-made arena.
//!
//! ## Frames
//!
//! Four [canonical frames](CanonicalFrame) can be used as query endpoints:
//!
//! - *document*: the innermost document entered on the path, else the canvas
//!   frame. Physical units (px, mm, in) are measured here.
//! - *canvas*: logical pixels, origin at the top left. Pointer input.
//! - *buffer*: physical framebuffer pixels.
//! - *render*: normalized device coordinates.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Affine, Point, Vec2};
//! use understory_scene_event::{
//!     Canvas, EventKind, FboFrame, SceneEvent, SceneGraph, Viewport,
//! };
//!
//! #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
//! struct Id(usize);
//!
//! // 0 render ← 1 buffer ← 2 canvas ← 3 item
//! struct Scene;
//! impl SceneGraph<Id> for Scene {
//!     type Transform = Affine;
//!     fn transform(&self, id: &Id) -> Affine {
//!         match id.0 {
//!             3 => Affine::translate(Vec2::new(10.0, 0.0)),
//!             _ => Affine::IDENTITY,
//!         }
//!     }
//!     fn parents(&self, id: &Id) -> &[Id] {
//!         static UP: [Id; 3] = [Id(0), Id(1), Id(2)];
//!         match id.0 {
//!             0 => &[],
//!             n => core::slice::from_ref(&UP[n - 1]),
//!         }
//!     }
//!     fn document(&self, _: &Id) -> Option<Id> {
//!         None
//!     }
//! }
//!
//! struct Window;
//! impl Canvas<Id, Affine> for Window {
//!     type Target = ();
//!     fn canvas_cs(&self) -> Id { Id(2) }
//!     fn buffer_cs(&self) -> Id { Id(1) }
//!     fn render_cs(&self) -> Id { Id(0) }
//!     fn push_viewport(&mut self, _: Viewport) {}
//!     fn pop_viewport(&mut self) -> Option<Viewport> { None }
//!     fn push_fbo(&mut self, _: Viewport, _: (), _: Affine) {}
//!     fn pop_fbo(&mut self) -> Option<FboFrame<(), Affine>> { None }
//! }
//!
//! let mut window = Window;
//! let mut event = SceneEvent::new(EventKind::Draw, &Scene, &mut window);
//! for id in 0..4 {
//!     event.push_node(Id(id)).unwrap();
//! }
//! let to_canvas = event.node_transform(None, Some(event.canvas_cs())).unwrap();
//! assert_eq!(to_canvas * Point::ORIGIN, Point::new(10.0, 0.0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod cache;
pub mod context;
pub mod error;
pub mod event;
pub mod frames;
pub mod graph;
pub mod pointer;
pub mod resolve;
pub mod transform;
pub mod walk;

pub use cache::{CacheStats, Hop, TransformCache, TransformChain};
pub use context::TraversalContext;
pub use error::{SceneError, StackKind};
pub use event::SceneEvent;
pub use frames::{CanonicalFrame, DerivedTransform};
pub use graph::{Canvas, FboFrame, NodeKey, SceneGraph, Viewport};
pub use pointer::{EventKind, PointerButton, PointerButtons, PointerEvent, PointerEventKind};
pub use resolve::NodePath;
pub use transform::{Transform, compose};
pub use walk::Outcome;
