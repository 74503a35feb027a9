// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A canvas with the three canonical frame nodes and viewport/target stacks.

use alloc::vec::Vec;
use kurbo::{Affine, Size};
use understory_scene_event::{Canvas, FboFrame, Viewport};

use crate::tree::SceneTree;
use crate::types::{LocalNode, NodeId};

/// Handle of an offscreen render target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

/// A canvas whose frames are nodes of a [`SceneTree`].
///
/// Creating a canvas inserts three nodes:
///
/// ```text
/// render_cs   normalized device coordinates (root)
///  └ buffer_cs   physical framebuffer pixels
///     └ canvas_cs   logical pixels; attach scenes here
/// ```
///
/// Events should be walked from `render_cs` down so that every canvas frame
/// is on the traversal path.
///
/// The frame transforms are fixed for the duration of a frame and change only
/// through [`FrameCanvas::resize`]. Viewports and render targets are stacked
/// for the renderer to consume; pushing them does not alter any transform.
#[derive(Clone, Debug)]
pub struct FrameCanvas {
    render: NodeId,
    buffer: NodeId,
    canvas: NodeId,
    size: Size,
    pixel_scale: f64,
    /// (as pushed, absolute)
    viewports: Vec<(Viewport, Viewport)>,
    fbos: Vec<FboFrame<TargetId, Affine>>,
}

impl FrameCanvas {
    /// Insert the frame nodes into `tree` for a canvas of `size` logical
    /// pixels, with `pixel_scale` physical pixels per logical pixel.
    pub fn new(tree: &mut SceneTree, size: Size, pixel_scale: f64) -> Self {
        let render = tree.insert(&[], LocalNode::default());
        let buffer = tree.insert(&[render], LocalNode::default());
        let canvas = tree.insert(&[buffer], LocalNode::default());
        let mut this = Self {
            render,
            buffer,
            canvas,
            size,
            pixel_scale,
            viewports: Vec::new(),
            fbos: Vec::new(),
        };
        this.resize(tree, size, pixel_scale);
        this
    }

    /// Change the logical size or pixel scale and update the frame transforms.
    pub fn resize(&mut self, tree: &mut SceneTree, size: Size, pixel_scale: f64) {
        self.size = size;
        self.pixel_scale = pixel_scale;
        let physical = self.physical_size();
        tree.set_local_transform(self.buffer, buffer_to_render(physical));
        tree.set_local_transform(self.canvas, Affine::scale(pixel_scale));
        tracing::debug!(?size, pixel_scale, "canvas frames resized");
    }

    /// Size in logical pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Physical pixels per logical pixel.
    pub fn pixel_scale(&self) -> f64 {
        self.pixel_scale
    }

    /// Size of the framebuffer in physical pixels.
    pub fn physical_size(&self) -> Size {
        self.size * self.pixel_scale
    }

    /// The active viewport in absolute framebuffer pixels.
    ///
    /// Without any pushed viewport this covers the whole framebuffer.
    pub fn viewport(&self) -> Viewport {
        match self.viewports.last() {
            Some((_, absolute)) => *absolute,
            None => {
                let physical = self.physical_size();
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "framebuffer dimensions fit in u32"
                )]
                let (width, height) = (physical.width as u32, physical.height as u32);
                Viewport::new(0, 0, width, height)
            }
        }
    }

    /// Number of pushed viewports.
    pub fn viewport_depth(&self) -> usize {
        self.viewports.len()
    }

    /// The innermost render target, or `None` when drawing to the framebuffer.
    pub fn current_target(&self) -> Option<TargetId> {
        self.fbos.last().map(|f| f.target)
    }

    /// Number of pushed render targets.
    pub fn fbo_depth(&self) -> usize {
        self.fbos.len()
    }
}

/// Physical pixels (origin top left, y down) to NDC (y up).
fn buffer_to_render(physical: Size) -> Affine {
    let w = physical.width.max(1.0);
    let h = physical.height.max(1.0);
    Affine::new([2.0 / w, 0.0, 0.0, -2.0 / h, -1.0, 1.0])
}

impl Canvas<NodeId, Affine> for FrameCanvas {
    type Target = TargetId;

    fn canvas_cs(&self) -> NodeId {
        self.canvas
    }

    fn buffer_cs(&self) -> NodeId {
        self.buffer
    }

    fn render_cs(&self) -> NodeId {
        self.render
    }

    fn push_viewport(&mut self, viewport: Viewport) {
        let outer = self.viewport();
        let absolute = Viewport::new(
            outer.x.saturating_add(viewport.x),
            outer.y.saturating_add(viewport.y),
            viewport.width,
            viewport.height,
        );
        self.viewports.push((viewport, absolute));
    }

    fn pop_viewport(&mut self) -> Option<Viewport> {
        self.viewports.pop().map(|(pushed, _)| pushed)
    }

    fn push_fbo(&mut self, viewport: Viewport, target: TargetId, transform: Affine) {
        tracing::trace!(?target, depth = self.fbos.len() + 1, "push render target");
        self.fbos.push(FboFrame {
            viewport,
            target,
            transform,
        });
    }

    fn pop_fbo(&mut self) -> Option<FboFrame<TargetId, Affine>> {
        self.fbos.pop()
    }
}
