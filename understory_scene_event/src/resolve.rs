// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node-to-node path resolution.
//!
//! ## Overview
//!
//! To map coordinates from node A to node B we need the chain of elementary
//! transforms connecting them. In a plain tree this is a walk up to the common
//! ancestor. Scene graphs may share subtrees, though: a node with several
//! parents has no unique way up.
//!
//! The live [`TraversalContext`] settles that ambiguity. The traversal stack
//! records the parent that was *actually* used to reach each node during this
//! event, so it is authoritative wherever parent pointers are not.
//!
//! ## Walk
//!
//! [`node_path`] climbs from `start` using parent pointers until it reaches
//! `end`, a node with zero or several parents, or a node on the traversal
//! stack. From a stack node it continues by copying stack entries toward the
//! root. The result may stop short of `end`.
//!
//! [`route`] runs that walk from the source. If it does not reach the target,
//! it walks from the target toward the traversal root and joins the two walks
//! at the first node they share. The forward part contributes node transforms
//! and the reverse part contributes inverses.

use smallvec::{SmallVec, smallvec};

use crate::cache::{Hop, TransformChain};
use crate::context::TraversalContext;
use crate::error::SceneError;
use crate::graph::{NodeKey, SceneGraph};

/// Nodes visited by [`node_path`], starting node first.
pub type NodePath<K> = SmallVec<[K; 16]>;

/// Walk from `start` toward `end`, using parent pointers first and the
/// traversal stack second.
///
/// The returned path always begins with `start`. It ends with `end` only if
/// the walk connected; otherwise it is as long as the walk could make it.
pub fn node_path<K, G>(ctx: &TraversalContext<K>, graph: &G, start: K, end: K) -> NodePath<K>
where
    K: NodeKey,
    G: SceneGraph<K> + ?Sized,
{
    let mut path: NodePath<K> = smallvec![start];

    let mut node = start;
    while !ctx.contains(&node) {
        if node == end {
            return path;
        }
        let Some(parent) = graph.parent(&node) else {
            // Root or shared node off the stack: no unambiguous way up.
            return path;
        };
        node = parent;
        path.push(node);
    }

    if node != end
        && let Some(mut idx) = ctx.position(&node)
    {
        let stack = ctx.path();
        while idx > 0 && path.last() != Some(&end) {
            idx -= 1;
            path.push(stack[idx]);
        }
    }

    path
}

/// Resolve the transform chain mapping `map_from`'s frame to `map_to`'s.
///
/// Hops are in application order. A query from a node to itself yields the
/// empty chain.
///
/// Fails with [`SceneError::DisjointPath`] when neither walk meets the other.
pub fn route<K, G>(
    ctx: &TraversalContext<K>,
    graph: &G,
    map_from: K,
    map_to: K,
) -> Result<TransformChain<K>, SceneError<K>>
where
    K: NodeKey,
    G: SceneGraph<K> + ?Sized,
{
    let fwd = node_path(ctx, graph, map_from, map_to);

    if let Some((last, walked)) = fwd.split_last()
        && *last == map_to
    {
        return Ok(walked.iter().copied().map(Hop::forward).collect());
    }

    // The forward walk stopped short, typically because `map_to` sits below a
    // shared ancestor. Walk up from the target and join at the first node the
    // two walks have in common.
    let anchor = ctx.root().unwrap_or(map_from);
    let rev = node_path(ctx, graph, map_to, anchor);
    for (i, join) in rev.iter().enumerate().skip(1) {
        if let Some(j) = fwd.iter().position(|n| n == join) {
            // Forward hops stop at the join; the ones above it would cancel.
            let mut chain: TransformChain<K> =
                fwd[..j].iter().copied().map(Hop::forward).collect();
            chain.extend(rev[..i].iter().rev().copied().map(Hop::inverse));
            return Ok(chain);
        }
    }

    tracing::warn!(from = ?map_from, to = ?map_to, "no path between frames");
    Err(SceneError::DisjointPath {
        from: map_from,
        to: map_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use kurbo::{Affine, Point, Vec2};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    struct Node(usize);

    /// Small DAG; node `n` translates by `(10^n, 0)` so every composition is
    /// distinguishable.
    struct Dag {
        parents: Vec<Vec<Node>>,
    }

    impl Dag {
        fn new(parents: &[&[usize]]) -> Self {
            Self {
                parents: parents
                    .iter()
                    .map(|ps| ps.iter().map(|&p| Node(p)).collect())
                    .collect(),
            }
        }
    }

    impl SceneGraph<Node> for Dag {
        type Transform = Affine;
        fn transform(&self, node: &Node) -> Affine {
            const SHIFTS: [f64; 5] = [1.0, 10.0, 100.0, 1000.0, 10000.0];
            Affine::translate(Vec2::new(SHIFTS[node.0], 0.0))
        }
        fn parents(&self, node: &Node) -> &[Node] {
            &self.parents[node.0]
        }
        fn document(&self, _: &Node) -> Option<Node> {
            None
        }
    }

    fn push_all(ctx: &mut TraversalContext<Node>, dag: &Dag, nodes: &[usize]) {
        for &n in nodes {
            ctx.push_node(dag, Node(n)).unwrap();
        }
    }

    fn hops(chain: &TransformChain<Node>) -> Vec<(usize, bool)> {
        chain.hops().iter().map(|h| (h.node.0, h.inverse)).collect()
    }

    // 0 ← 1 ← 2 ← 3
    fn chain_dag() -> Dag {
        Dag::new(&[&[], &[0], &[1], &[2]])
    }

    // Diamond: 1 and 2 are children of 0; 3 has parents [1, 2].
    fn diamond() -> Dag {
        Dag::new(&[&[], &[0], &[0], &[1, 2]])
    }

    #[test]
    fn parent_walk_without_stack() {
        let dag = chain_dag();
        let ctx = TraversalContext::new();
        let path = node_path(&ctx, &dag, Node(3), Node(0));
        assert_eq!(path.as_slice(), &[Node(3), Node(2), Node(1), Node(0)]);

        let chain = route(&ctx, &dag, Node(3), Node(0)).unwrap();
        assert_eq!(hops(&chain), [(3, false), (2, false), (1, false)]);
        let t = chain.compose(&dag);
        assert_eq!(t * Point::ORIGIN, Point::new(1110.0, 0.0));
    }

    #[test]
    fn same_node_is_empty_chain() {
        let dag = chain_dag();
        let mut ctx = TraversalContext::new();
        assert!(route(&ctx, &dag, Node(2), Node(2)).unwrap().is_empty());
        push_all(&mut ctx, &dag, &[0, 1, 2]);
        assert!(route(&ctx, &dag, Node(2), Node(2)).unwrap().is_empty());
    }

    #[test]
    fn shared_node_follows_traversal_branch() {
        let dag = diamond();
        let mut ctx = TraversalContext::new();
        push_all(&mut ctx, &dag, &[0, 1, 3]);
        let path = node_path(&ctx, &dag, Node(3), Node(0));
        assert_eq!(path.as_slice(), &[Node(3), Node(1), Node(0)]);
        let chain = route(&ctx, &dag, Node(3), Node(0)).unwrap();
        assert_eq!(hops(&chain), [(3, false), (1, false)]);

        ctx.pop_node(&dag).unwrap();
        ctx.pop_node(&dag).unwrap();
        push_all(&mut ctx, &dag, &[2, 3]);
        let chain = route(&ctx, &dag, Node(3), Node(0)).unwrap();
        assert_eq!(hops(&chain), [(3, false), (2, false)]);
    }

    #[test]
    fn shared_node_off_stack_stops_the_walk() {
        let dag = diamond();
        let ctx = TraversalContext::new();
        let path = node_path(&ctx, &dag, Node(3), Node(0));
        assert_eq!(path.as_slice(), &[Node(3)]);
    }

    #[test]
    fn stack_walk_stops_when_exhausted() {
        let dag = chain_dag();
        let mut ctx = TraversalContext::new();
        push_all(&mut ctx, &dag, &[1, 2]);
        // Node 0 is above the stack root and never reached through the stack.
        let path = node_path(&ctx, &dag, Node(3), Node(0));
        assert_eq!(path.as_slice(), &[Node(3), Node(2), Node(1)]);
    }

    #[test]
    fn downward_query_joins_through_inverses() {
        // 0 ← 1 ← 2, and 0 ← 3 ← 4.
        let dag = Dag::new(&[&[], &[0], &[1], &[0], &[3]]);
        let mut ctx = TraversalContext::new();
        push_all(&mut ctx, &dag, &[0, 1, 2]);

        // From the current node to an ancestor's descendant on another branch.
        let chain = route(&ctx, &dag, Node(2), Node(4)).unwrap();
        assert_eq!(hops(&chain), [(2, false), (1, false), (3, true), (4, true)]);
        let t = chain.compose(&dag);
        // +100 +10 then -1000 -10000
        assert_eq!(t * Point::ORIGIN, Point::new(-10890.0, 0.0));

        // Straight down from an ancestor.
        let chain = route(&ctx, &dag, Node(0), Node(2)).unwrap();
        assert_eq!(hops(&chain), [(1, true), (2, true)]);
    }

    #[test]
    fn join_picks_first_shared_node() {
        // 0 ← 1 ← 2 ← 3 and 2 ← 4.
        let dag = Dag::new(&[&[], &[0], &[1], &[2], &[2]]);
        let mut ctx = TraversalContext::new();
        push_all(&mut ctx, &dag, &[0, 1, 2, 3]);
        let chain = route(&ctx, &dag, Node(3), Node(4)).unwrap();
        assert_eq!(hops(&chain), [(3, false), (4, true)]);
    }

    #[test]
    fn unrelated_trees_are_disjoint() {
        // Two separate roots: 0 ← 1 and 2 ← 3.
        let dag = Dag::new(&[&[], &[0], &[], &[2]]);
        let mut ctx = TraversalContext::new();
        push_all(&mut ctx, &dag, &[0, 1]);
        let err = route(&ctx, &dag, Node(1), Node(3)).unwrap_err();
        assert_eq!(
            err,
            SceneError::DisjointPath {
                from: Node(1),
                to: Node(3),
            }
        );
        assert!(!err.is_fatal());
    }
}
