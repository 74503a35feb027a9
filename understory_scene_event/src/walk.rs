// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first driver: deliver an event to a subtree and honor stop outcomes.
//!
//! [`run`] pushes each node onto the event's path before calling the visitor
//! and pops it after the node's subtree is done, so the visitor always sees
//! the path it was reached through. Nodes that own a scene (see
//! [`SceneGraph::scene_of`]) are treated as viewboxes and pushed on the
//! viewbox stack for the duration of their subtree.
//!
//! ## Semantics
//!
//! - [`Outcome::Continue`] descends into the node's children, in the order
//!   the `children` callback yields them.
//! - [`Outcome::SkipChildren`] moves on to the next sibling.
//! - [`Outcome::Stop`] ends the walk immediately. [`run`] returns the node
//!   that stopped it.
//!
//! The event's path is always back at its starting depth when [`run`]
//! returns, whether the walk completed, stopped, or failed.

use alloc::vec;

use smallvec::SmallVec;

use crate::error::SceneError;
use crate::event::SceneEvent;
use crate::graph::{Canvas, NodeKey, SceneGraph};

/// What the walk should do after visiting a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Visit the node's children next.
    Continue,
    /// Do not descend; continue with the next sibling.
    SkipChildren,
    /// End the walk.
    Stop,
}

#[derive(Copy, Clone, Debug)]
enum Step<K> {
    Enter(K),
    Leave { node: K, viewbox: bool },
}

/// Walk the subtree under `root` depth first, calling `visit` at each node.
///
/// Returns `Ok(Some(node))` if `visit` returned [`Outcome::Stop`] at `node`,
/// and `Ok(None)` if every reachable node was visited. A cycle or an
/// unbalanced document stack aborts the walk with the corresponding
/// [`SceneError`].
pub fn run<'a, K, G, C, I>(
    event: &mut SceneEvent<'a, K, G, C>,
    root: K,
    mut children: impl FnMut(K) -> I,
    mut visit: impl FnMut(&mut SceneEvent<'a, K, G, C>, K) -> Outcome,
) -> Result<Option<K>, SceneError<K>>
where
    K: NodeKey,
    G: SceneGraph<K>,
    C: Canvas<K, G::Transform>,
    I: IntoIterator<Item = K>,
{
    let base = event.context().depth();
    let viewbox_base = event.context().viewboxes().len();
    let mut steps = vec![Step::Enter(root)];

    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(node) => {
                if let Err(err) = event.push_node(node) {
                    abort(event, base, viewbox_base);
                    return Err(err);
                }
                let viewbox = event.graph().scene_of(&node).is_some();
                if viewbox {
                    event.push_viewbox(node);
                }
                steps.push(Step::Leave { node, viewbox });

                match visit(event, node) {
                    Outcome::Continue => {
                        let kids: SmallVec<[K; 8]> = children(node).into_iter().collect();
                        steps.extend(kids.into_iter().rev().map(Step::Enter));
                    }
                    Outcome::SkipChildren => {}
                    Outcome::Stop => {
                        tracing::debug!(node = ?node, "walk stopped");
                        unwind(event, base, viewbox_base)?;
                        return Ok(Some(node));
                    }
                }
            }
            Step::Leave { node, viewbox } => {
                if viewbox {
                    let popped = event.pop_viewbox();
                    if let Err(err) = check_popped(popped, node) {
                        abort(event, base, viewbox_base);
                        return Err(err);
                    }
                }
                let popped = event.pop_node();
                if let Err(err) = check_popped(popped, node) {
                    abort(event, base, viewbox_base);
                    return Err(err);
                }
            }
        }
    }
    Ok(None)
}

/// The walk pushed `expected`; anything else on top means a visitor left its
/// own pushes behind.
fn check_popped<K: NodeKey>(
    popped: Result<K, SceneError<K>>,
    expected: K,
) -> Result<(), SceneError<K>> {
    let found = popped?;
    if found == expected {
        Ok(())
    } else {
        tracing::warn!(?expected, ?found, "walk stack out of step");
        Err(SceneError::Unbalanced { expected, found })
    }
}

/// Pop back to `base` with the usual consistency checks.
fn unwind<K, G, C>(
    event: &mut SceneEvent<'_, K, G, C>,
    base: usize,
    viewbox_base: usize,
) -> Result<(), SceneError<K>>
where
    K: NodeKey,
    G: SceneGraph<K>,
    C: Canvas<K, G::Transform>,
{
    while event.context().viewboxes().len() > viewbox_base {
        event.pop_viewbox()?;
    }
    while event.context().depth() > base {
        if let Err(err) = event.pop_node() {
            abort(event, base, viewbox_base);
            return Err(err);
        }
    }
    Ok(())
}

fn abort<K, G, C>(event: &mut SceneEvent<'_, K, G, C>, base: usize, viewbox_base: usize)
where
    K: NodeKey,
    G: SceneGraph<K>,
    C: Canvas<K, G::Transform>,
{
    tracing::warn!(depth = event.context().depth(), base, "aborting walk");
    while event.context().viewboxes().len() > viewbox_base {
        if event.pop_viewbox().is_err() {
            break;
        }
    }
    event.abort_to(base);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    use crate::graph::{FboFrame, Viewport};
    use crate::pointer::EventKind;
    use kurbo::Affine;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    struct Node(u32);

    /// Children are listed explicitly; node 4 is a viewbox.
    struct Graph {
        children: Vec<(Node, Vec<Node>)>,
    }

    impl Graph {
        fn children(&self, node: Node) -> Vec<Node> {
            self.children
                .iter()
                .find(|(n, _)| *n == node)
                .map(|(_, c)| c.clone())
                .unwrap_or_default()
        }
    }

    impl SceneGraph<Node> for Graph {
        type Transform = Affine;
        fn transform(&self, _: &Node) -> Affine {
            Affine::IDENTITY
        }
        fn parents(&self, _: &Node) -> &[Node] {
            &[]
        }
        fn document(&self, _: &Node) -> Option<Node> {
            None
        }
        fn scene_of(&self, viewbox: &Node) -> Option<Node> {
            (viewbox.0 == 4).then_some(Node(5))
        }
    }

    struct NoCanvas;

    impl Canvas<Node, Affine> for NoCanvas {
        type Target = ();
        fn canvas_cs(&self) -> Node {
            Node(0)
        }
        fn buffer_cs(&self) -> Node {
            Node(0)
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

    //      1
    //    /   \
    //   2     4 (viewbox)
    //   |     |
    //   3     5
    fn graph() -> Graph {
        Graph {
            children: vec![
                (Node(1), vec![Node(2), Node(4)]),
                (Node(2), vec![Node(3)]),
                (Node(4), vec![Node(5)]),
            ],
        }
    }

    #[test]
    fn visits_in_depth_first_order_with_live_path() {
        let graph = graph();
        let mut canvas = NoCanvas;
        let mut ev = SceneEvent::new(EventKind::Draw, &graph, &mut canvas);
        let mut seen: Vec<(u32, usize, Option<Node>)> = Vec::new();

        let stopped = run(
            &mut ev,
            Node(1),
            |n| graph.children(n),
            |ev, n| {
                seen.push((n.0, ev.path().len(), ev.viewbox()));
                Outcome::Continue
            },
        )
        .unwrap();

        assert_eq!(stopped, None);
        assert_eq!(
            seen,
            [
                (1, 1, None),
                (2, 2, None),
                (3, 3, None),
                (4, 2, Some(Node(4))),
                (5, 3, Some(Node(4))),
            ]
        );
        assert!(ev.path().is_empty());
        assert_eq!(ev.viewbox(), None);
    }

    #[test]
    fn skip_children_moves_to_sibling() {
        let graph = graph();
        let mut canvas = NoCanvas;
        let mut ev = SceneEvent::new(EventKind::Draw, &graph, &mut canvas);
        let mut seen = Vec::new();
        run(
            &mut ev,
            Node(1),
            |n| graph.children(n),
            |_, n| {
                seen.push(n.0);
                if n == Node(2) {
                    Outcome::SkipChildren
                } else {
                    Outcome::Continue
                }
            },
        )
        .unwrap();
        assert_eq!(seen, [1, 2, 4, 5]);
    }

    #[test]
    fn stop_reports_node_and_unwinds() {
        let graph = graph();
        let mut canvas = NoCanvas;
        let mut ev = SceneEvent::new(EventKind::Draw, &graph, &mut canvas);
        ev.push_node(Node(9)).unwrap();

        let stopped = run(
            &mut ev,
            Node(1),
            |n| graph.children(n),
            |_, n| {
                if n == Node(5) {
                    Outcome::Stop
                } else {
                    Outcome::Continue
                }
            },
        )
        .unwrap();

        assert_eq!(stopped, Some(Node(5)));
        assert_eq!(ev.path(), &[Node(9)]);
        assert_eq!(ev.viewbox(), None);
    }

    #[test]
    fn cycle_aborts_and_restores_path() {
        let graph = Graph {
            children: vec![(Node(1), vec![Node(2)]), (Node(2), vec![Node(1)])],
        };
        let mut canvas = NoCanvas;
        let mut ev = SceneEvent::new(EventKind::Draw, &graph, &mut canvas);

        let err = run(
            &mut ev,
            Node(1),
            |n| graph.children(n),
            |_, _| Outcome::Continue,
        )
        .unwrap_err();

        assert_eq!(err, SceneError::Cycle { node: Node(1) });
        assert!(err.is_fatal());
        assert!(ev.path().is_empty());
    }

    #[test]
    fn leftover_push_in_visitor_aborts() {
        let graph = graph();
        let mut canvas = NoCanvas;
        let mut ev = SceneEvent::new(EventKind::Draw, &graph, &mut canvas);
        let mut seen = Vec::new();

        let err = run(
            &mut ev,
            Node(1),
            |n| graph.children(n),
            |ev, n| {
                seen.push(n.0);
                if n == Node(2) {
                    ev.push_node(Node(7)).unwrap();
                    Outcome::SkipChildren
                } else {
                    Outcome::Continue
                }
            },
        )
        .unwrap_err();

        assert_eq!(
            err,
            SceneError::Unbalanced {
                expected: Node(2),
                found: Node(7),
            }
        );
        assert!(err.is_fatal());
        assert_eq!(seen, [1, 2]);
        assert!(ev.path().is_empty());
        assert_eq!(ev.viewbox(), None);
    }
}
