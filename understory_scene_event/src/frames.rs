// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Well-known coordinate frames and the transforms derived between them.

/// A canonical coordinate frame that can be used as a query endpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CanonicalFrame {
    /// The innermost document on the path, falling back to [`CanonicalFrame::Canvas`].
    ///
    /// Used for physical measurements (px, mm, in).
    Document,
    /// Logical canvas pixels; the usual frame for pointer input.
    Canvas,
    /// Physical framebuffer pixels; used for antialiasing measurements.
    Buffer,
    /// Normalized device coordinates; every vertex ends up here.
    Render,
}

/// A transform the scene event derives on demand and never stores.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DerivedTransform {
    /// Current node's local frame to the document frame.
    VisualToDocument,
    /// Document frame to framebuffer pixels.
    DocumentToBuffer,
    /// Framebuffer pixels to normalized device coordinates.
    BufferToRender,
}

impl DerivedTransform {
    /// Source and target of the derived transform.
    ///
    /// A `None` source stands for the node currently being visited.
    pub const fn endpoints(self) -> (Option<CanonicalFrame>, CanonicalFrame) {
        match self {
            Self::VisualToDocument => (None, CanonicalFrame::Document),
            Self::DocumentToBuffer => (Some(CanonicalFrame::Document), CanonicalFrame::Buffer),
            Self::BufferToRender => (Some(CanonicalFrame::Buffer), CanonicalFrame::Render),
        }
    }
}
