// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Elementary transform capability.

use kurbo::Affine;

/// An elementary coordinate transform.
///
/// The resolver only needs three things from a transform: an identity, ordered
/// composition, and inversion. The internal representation (affine, projective,
/// non-linear) is up to the implementor.
pub trait Transform: Clone {
    /// The transform that maps every coordinate onto itself.
    fn identity() -> Self;

    /// Compose two transforms: `self` is applied first, then `next`.
    #[must_use]
    fn then(&self, next: &Self) -> Self;

    /// The inverse mapping.
    #[must_use]
    fn inverse(&self) -> Self;
}

impl Transform for Affine {
    fn identity() -> Self {
        Self::IDENTITY
    }

    fn then(&self, next: &Self) -> Self {
        // Kurbo multiplies right-to-left: `b * a` applies `a` first.
        *next * *self
    }

    fn inverse(&self) -> Self {
        Self::inverse(*self)
    }
}

/// Compose a sequence of transforms in application order.
///
/// Element 0 is applied first to source coordinates, the final element last.
/// An empty sequence yields [`Transform::identity`].
pub fn compose<T: Transform>(transforms: impl IntoIterator<Item = T>) -> T {
    transforms
        .into_iter()
        .fold(T::identity(), |acc, t| acc.then(&t))
}
