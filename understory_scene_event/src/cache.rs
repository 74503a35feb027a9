// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memoization of composed transform chains.
//!
//! A [`TransformChain`] names the elementary transforms along a resolved path,
//! in application order, by the identity of the node that owns each one and
//! whether it is inverted. [`TransformCache`] composes a chain once and hands
//! out the stored result for every later request with an equal chain.
//!
//! Keys compare by node identity and order, never by numeric value: two
//! chains that happen to compose to the same matrix are still distinct
//! entries. Node transforms are assumed stable while a cache is in use; call
//! [`TransformCache::clear`] at frame boundaries if they may change.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::graph::{NodeKey, SceneGraph};
use crate::transform::Transform;

/// One elementary transform in a chain: a node's transform or its inverse.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Hop<K> {
    /// The node owning the transform.
    pub node: K,
    /// Whether the transform is applied inverted.
    pub inverse: bool,
}

impl<K> Hop<K> {
    /// The node's transform, mapping its local frame into its parent's.
    pub const fn forward(node: K) -> Self {
        Self {
            node,
            inverse: false,
        }
    }

    /// The inverse of the node's transform, mapping parent frame into local.
    pub const fn inverse(node: K) -> Self {
        Self {
            node,
            inverse: true,
        }
    }
}

/// An ordered sequence of hops; hop 0 is applied first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TransformChain<K> {
    hops: SmallVec<[Hop<K>; 8]>,
}

impl<K> TransformChain<K> {
    /// The empty chain, which composes to the identity.
    pub fn new() -> Self {
        Self {
            hops: SmallVec::new(),
        }
    }

    /// Append a hop.
    pub fn push(&mut self, hop: Hop<K>) {
        self.hops.push(hop);
    }

    /// Hops in application order.
    pub fn hops(&self) -> &[Hop<K>] {
        &self.hops
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Compose the chain without consulting any cache.
    pub fn compose<G>(&self, graph: &G) -> G::Transform
    where
        G: SceneGraph<K> + ?Sized,
    {
        self.hops
            .iter()
            .fold(G::Transform::identity(), |acc, hop| {
                let t = graph.transform(&hop.node);
                if hop.inverse {
                    acc.then(&t.inverse())
                } else {
                    acc.then(&t)
                }
            })
    }
}

impl<K> FromIterator<Hop<K>> for TransformChain<K> {
    fn from_iter<I: IntoIterator<Item = Hop<K>>>(iter: I) -> Self {
        Self {
            hops: iter.into_iter().collect(),
        }
    }
}

impl<K> Extend<Hop<K>> for TransformChain<K> {
    fn extend<I: IntoIterator<Item = Hop<K>>>(&mut self, iter: I) {
        self.hops.extend(iter);
    }
}

/// Hit and miss counters of a [`TransformCache`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from a stored composition.
    pub hits: u64,
    /// Requests that had to compose the chain.
    pub misses: u64,
}

/// Composed transforms keyed by chain.
///
/// A cache can outlive a single event: hand it from one event to the next
/// (for example across nested render-target passes within one frame) with
/// [`SceneEvent::with_cache`](crate::SceneEvent::with_cache) and
/// [`SceneEvent::into_cache`](crate::SceneEvent::into_cache).
#[derive(Clone, Debug)]
pub struct TransformCache<K: NodeKey, T> {
    entries: HashMap<TransformChain<K>, T>,
    stats: CacheStats,
}

impl<K: NodeKey, T: Transform> Default for TransformCache<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey, T: Transform> TransformCache<K, T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Create an empty cache with room for `capacity` chains.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the composition of `chain`, composing it on first request.
    pub fn get<G>(&mut self, graph: &G, chain: &TransformChain<K>) -> T
    where
        G: SceneGraph<K, Transform = T> + ?Sized,
    {
        if let Some(t) = self.entries.get(chain) {
            self.stats.hits += 1;
            return t.clone();
        }
        self.stats.misses += 1;
        tracing::debug!(hops = chain.len(), "composing transform chain");
        let t = chain.compose(graph);
        self.entries.insert(chain.clone(), t.clone());
        t
    }

    /// Number of stored chains.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every stored composition and reset the counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
    }

    /// Hit and miss counters since creation or the last [`clear`](Self::clear).
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
