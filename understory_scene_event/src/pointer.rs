// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event payloads, and pointer positions mapped into node-local frames.
//!
//! A pointer event arrives in canvas coordinates (logical pixels). While a
//! [`SceneEvent`] is visiting a node, [`SceneEvent::pos`] reports the same
//! position in that node's local frame, using the live traversal path to
//! resolve shared subtrees.
//!
//! ```
//! use kurbo::Point;
//! use understory_scene_event::{EventKind, PointerButton, PointerEvent, PointerEventKind};
//!
//! let down = PointerEvent::new(PointerEventKind::Down, Point::new(4.0, 4.0))
//!     .with_button(PointerButton::Primary);
//! let drag = PointerEvent::new(PointerEventKind::Move, Point::new(9.0, 6.0))
//!     .with_last(down.clone())
//!     .with_press(down);
//! assert!(drag.is_dragging());
//! assert!(matches!(EventKind::Pointer(drag), EventKind::Pointer(_)));
//! ```

use alloc::boxed::Box;

use kurbo::{Affine, Point, Vec2};

use crate::error::SceneError;
use crate::event::SceneEvent;
use crate::graph::{Canvas, NodeKey, SceneGraph};

/// What a [`SceneEvent`] carries.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    /// A draw pass; no payload.
    Draw,
    /// Pointer input.
    Pointer(PointerEvent),
}

/// The phase of a pointer interaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// A button went down.
    Down,
    /// A button was released.
    Up,
    /// The pointer moved.
    Move,
    /// A wheel or trackpad scrolled; see [`PointerEvent::delta`].
    Wheel,
}

/// A single pointer button.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Usually the left mouse button.
    Primary,
    /// Usually the right mouse button.
    Secondary,
    /// Usually the middle mouse button.
    Auxiliary,
}

bitflags::bitflags! {
    /// Set of pointer buttons held down.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u8 {
        /// [`PointerButton::Primary`] is held.
        const PRIMARY   = 0b0000_0001;
        /// [`PointerButton::Secondary`] is held.
        const SECONDARY = 0b0000_0010;
        /// [`PointerButton::Auxiliary`] is held.
        const AUXILIARY = 0b0000_0100;
    }
}

impl From<PointerButton> for PointerButtons {
    fn from(button: PointerButton) -> Self {
        match button {
            PointerButton::Primary => Self::PRIMARY,
            PointerButton::Secondary => Self::SECONDARY,
            PointerButton::Auxiliary => Self::AUXILIARY,
        }
    }
}

/// A pointer event in canvas coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Interaction phase.
    pub kind: PointerEventKind,
    /// Position in logical canvas pixels.
    pub pos: Point,
    /// The button that changed, for [`PointerEventKind::Down`] and [`PointerEventKind::Up`].
    pub button: Option<PointerButton>,
    /// Buttons held when the event fired.
    pub buttons: PointerButtons,
    /// Scroll amount for [`PointerEventKind::Wheel`].
    pub delta: Vec2,
    /// The previous pointer event of the same interaction.
    pub last: Option<Box<Self>>,
    /// The press that started the current drag.
    pub press: Option<Box<Self>>,
}

impl PointerEvent {
    /// Create an event with no buttons, no scroll, and no history.
    pub fn new(kind: PointerEventKind, pos: Point) -> Self {
        Self {
            kind,
            pos,
            button: None,
            buttons: PointerButtons::empty(),
            delta: Vec2::ZERO,
            last: None,
            press: None,
        }
    }

    /// Set the changed button; it is also added to the held set.
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self.buttons |= button.into();
        self
    }

    /// Set the held buttons.
    pub fn with_buttons(mut self, buttons: PointerButtons) -> Self {
        self.buttons = buttons;
        self
    }

    /// Set the scroll amount.
    pub fn with_delta(mut self, delta: Vec2) -> Self {
        self.delta = delta;
        self
    }

    /// Attach the previous event.
    pub fn with_last(mut self, last: Self) -> Self {
        self.last = Some(Box::new(last));
        self
    }

    /// Attach the press that started the drag.
    pub fn with_press(mut self, press: Self) -> Self {
        self.press = Some(Box::new(press));
        self
    }

    /// Whether a press is in progress.
    pub fn is_dragging(&self) -> bool {
        self.press.is_some()
    }
}

impl<K, G, C> SceneEvent<'_, K, G, C>
where
    K: NodeKey,
    G: SceneGraph<K, Transform = Affine>,
    C: Canvas<K, Affine>,
{
    /// Map a point from canvas coordinates into the current node's frame.
    pub fn map_from_canvas(&mut self, point: Point) -> Result<Point, SceneError<K>> {
        let current = self.current().ok_or(SceneError::EmptyPath)?;
        let canvas = self.canvas_cs();
        Ok(self.transform_between(canvas, current)? * point)
    }

    /// Map a point from the current node's frame into canvas coordinates.
    pub fn map_to_canvas(&mut self, point: Point) -> Result<Point, SceneError<K>> {
        let canvas = self.canvas_cs();
        Ok(self.node_transform(None, Some(canvas))? * point)
    }

    /// The pointer payload, if this is a pointer event.
    pub fn pointer(&self) -> Option<&PointerEvent> {
        match self.kind() {
            EventKind::Pointer(pointer) => Some(pointer),
            EventKind::Draw => None,
        }
    }

    /// Pointer position in the current node's frame.
    ///
    /// `Ok(None)` for events without a pointer payload.
    pub fn pos(&mut self) -> Result<Option<Point>, SceneError<K>> {
        let Some(pos) = self.pointer().map(|p| p.pos) else {
            return Ok(None);
        };
        self.map_from_canvas(pos).map(Some)
    }

    /// Position of the previous pointer event in the current node's frame.
    pub fn last_pos(&mut self) -> Result<Option<Point>, SceneError<K>> {
        let Some(pos) = self.pointer().and_then(|p| p.last.as_ref()).map(|l| l.pos) else {
            return Ok(None);
        };
        self.map_from_canvas(pos).map(Some)
    }

    /// Position of the press that started the drag, in the current node's frame.
    pub fn press_pos(&mut self) -> Result<Option<Point>, SceneError<K>> {
        let Some(pos) = self.pointer().and_then(|p| p.press.as_ref()).map(|l| l.pos) else {
            return Ok(None);
        };
        self.map_from_canvas(pos).map(Some)
    }

    /// The button that changed.
    pub fn button(&self) -> Option<PointerButton> {
        self.pointer().and_then(|p| p.button)
    }

    /// Buttons held; empty for non-pointer events.
    pub fn buttons(&self) -> PointerButtons {
        self.pointer().map(|p| p.buttons).unwrap_or_default()
    }

    /// Scroll amount, in canvas units.
    pub fn delta(&self) -> Option<Vec2> {
        self.pointer().map(|p| p.delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    use crate::graph::{FboFrame, Viewport};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    struct Node(usize);

    /// 0 render ← 1 buffer ← 2 canvas ← 3 panel ← 4 handle.
    struct Chain(Vec<Affine>);

    impl SceneGraph<Node> for Chain {
        type Transform = Affine;
        fn transform(&self, node: &Node) -> Affine {
            self.0[node.0]
        }
        fn parents(&self, node: &Node) -> &[Node] {
            static PARENTS: [[Node; 1]; 4] = [[Node(0)], [Node(1)], [Node(2)], [Node(3)]];
            match node.0 {
                0 => &[],
                n => &PARENTS[n - 1],
            }
        }
        fn document(&self, _: &Node) -> Option<Node> {
            None
        }
    }

    struct Frames;

    impl Canvas<Node, Affine> for Frames {
        type Target = ();
        fn canvas_cs(&self) -> Node {
            Node(2)
        }
        fn buffer_cs(&self) -> Node {
            Node(1)
        }
        fn render_cs(&self) -> Node {
            Node(0)
        }
        fn push_viewport(&mut self, _: Viewport) {}
        fn pop_viewport(&mut self) -> Option<Viewport> {
            None
        }
        fn push_fbo(&mut self, _: Viewport, _: (), _: Affine) {}
        fn pop_fbo(&mut self) -> Option<FboFrame<(), Affine>> {
            None
        }
    }

    fn scene() -> Chain {
        Chain(alloc::vec![
            Affine::IDENTITY,
            Affine::IDENTITY,
            Affine::IDENTITY,
            Affine::translate(Vec2::new(100.0, 50.0)),
            Affine::scale(2.0),
        ])
    }

    #[test]
    fn position_is_local_to_current_node() {
        let graph = scene();
        let mut canvas = Frames;
        let press = PointerEvent::new(PointerEventKind::Down, Point::new(102.0, 52.0))
            .with_button(PointerButton::Primary);
        let last = PointerEvent::new(PointerEventKind::Move, Point::new(104.0, 54.0));
        let ev = PointerEvent::new(PointerEventKind::Move, Point::new(110.0, 60.0))
            .with_buttons(PointerButtons::PRIMARY)
            .with_last(last)
            .with_press(press);
        let mut ev = SceneEvent::new(EventKind::Pointer(ev), &graph, &mut canvas);

        for n in 0..5 {
            ev.push_node(Node(n)).unwrap();
        }
        assert_eq!(ev.pos().unwrap(), Some(Point::new(5.0, 5.0)));
        assert_eq!(ev.last_pos().unwrap(), Some(Point::new(2.0, 2.0)));
        assert_eq!(ev.press_pos().unwrap(), Some(Point::new(1.0, 1.0)));
        assert_eq!(ev.buttons(), PointerButtons::PRIMARY);
        assert_eq!(ev.button(), None);

        ev.pop_node().unwrap();
        assert_eq!(ev.pos().unwrap(), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn canvas_mapping_round_trips() {
        let graph = scene();
        let mut canvas = Frames;
        let mut ev = SceneEvent::new(EventKind::Draw, &graph, &mut canvas);
        for n in 0..5 {
            ev.push_node(Node(n)).unwrap();
        }
        let local = Point::new(3.0, -1.0);
        let on_canvas = ev.map_to_canvas(local).unwrap();
        assert_eq!(on_canvas, Point::new(106.0, 48.0));
        assert_eq!(ev.map_from_canvas(on_canvas).unwrap(), local);
    }

    #[test]
    fn draw_events_have_no_pointer() {
        let graph = scene();
        let mut canvas = Frames;
        let mut ev = SceneEvent::new(EventKind::Draw, &graph, &mut canvas);
        ev.push_node(Node(0)).unwrap();
        assert_eq!(ev.pos(), Ok(None));
        assert_eq!(ev.press_pos(), Ok(None));
        assert!(ev.buttons().is_empty());
        assert_eq!(ev.delta(), None);
    }

    #[test]
    fn mapping_needs_a_current_node() {
        let graph = scene();
        let mut canvas = Frames;
        let wheel = PointerEvent::new(PointerEventKind::Wheel, Point::ORIGIN)
            .with_delta(Vec2::new(0.0, -3.0));
        let mut ev = SceneEvent::new(EventKind::Pointer(wheel), &graph, &mut canvas);
        assert_eq!(ev.pos(), Err(SceneError::EmptyPath));
        assert_eq!(ev.delta(), Some(Vec2::new(0.0, -3.0)));
    }

    #[test]
    fn button_joins_held_set() {
        let ev = PointerEvent::new(PointerEventKind::Down, Point::ORIGIN)
            .with_buttons(PointerButtons::SECONDARY)
            .with_button(PointerButton::Auxiliary);
        assert_eq!(
            ev.buttons,
            PointerButtons::SECONDARY | PointerButtons::AUXILIARY
        );
        assert!(!ev.is_dragging());
    }
}
