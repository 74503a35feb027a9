// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scene_graph --heading-base-level=0

//! Understory Scene Graph: a Kurbo-native scene graph with shared subtrees.
//!
//! This crate provides a concrete [`SceneGraph`](understory_scene_event::SceneGraph)
//! and [`Canvas`](understory_scene_event::Canvas) for `understory_scene_event`.
//!
//! - [`SceneTree`]: generational arena of nodes with a local [`Affine`](kurbo::Affine),
//!   any number of parents, and optional document and scene links.
//! - [`FrameCanvas`]: inserts the render, buffer, and canvas frame nodes into
//!   a [`SceneTree`] and keeps the viewport and render-target stacks.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Affine, Point, Size, Vec2};
//! use understory_scene_event::{walk, Canvas, EventKind, Outcome, SceneEvent};
//! use understory_scene_graph::{FrameCanvas, LocalNode, SceneTree};
//!
//! let mut tree = SceneTree::new();
//! let mut canvas = FrameCanvas::new(&mut tree, Size::new(640.0, 480.0), 1.0);
//! let panel = tree.insert(
//!     &[canvas.canvas_cs()],
//!     LocalNode::with_transform(Affine::translate(Vec2::new(20.0, 10.0))),
//! );
//!
//! let root = canvas.render_cs();
//! let mut event = SceneEvent::new(EventKind::Draw, &tree, &mut canvas);
//! let mut on_canvas = None;
//! walk::run(
//!     &mut event,
//!     root,
//!     |n| tree.children_of(n).iter().copied(),
//!     |ev, n| {
//!         if n == panel {
//!             on_canvas = ev.map_to_canvas(Point::ORIGIN).ok();
//!         }
//!         Outcome::Continue
//!     },
//! )
//! .unwrap();
//! assert_eq!(on_canvas, Some(Point::new(20.0, 10.0)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod canvas;
mod tree;
mod types;

pub use canvas::{FrameCanvas, TargetId};
pub use tree::SceneTree;
pub use types::{LocalNode, NodeId};
