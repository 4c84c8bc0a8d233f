// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache identity types.

use core::fmt;

use kurbo::Affine;

use crate::transform::InvariantTransform;

/// What kind of unit a cache entry holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// A layer rendered together with its subtree.
    Layer,
    /// A recorded picture leaf.
    Picture,
    /// A display-list leaf.
    DisplayList,
    /// Only the children of a container layer, cached as one unit.
    LayerChildren,
}

impl CacheKind {
    /// Returns `true` for the kinds accounted as layer entries in metrics.
    #[inline]
    #[must_use]
    pub const fn is_layer(self) -> bool {
        matches!(self, Self::Layer | Self::LayerChildren)
    }
}

/// The transform-independent half of a cache key.
///
/// Owner ids are assigned by the scene graph and must be unique per cacheable
/// unit; two distinct units sharing an id is a caller bug that the cache does
/// not detect.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKeyId {
    owner: u64,
    kind: CacheKind,
}

impl CacheKeyId {
    /// Creates a key id for the given owner and kind.
    #[inline]
    #[must_use]
    pub const fn new(owner: u64, kind: CacheKind) -> Self {
        Self { owner, kind }
    }

    /// Creates a [`CacheKind::LayerChildren`] id from the ordered owner ids of
    /// a container's children.
    ///
    /// The same children in the same order always produce the same id.
    #[must_use]
    pub fn for_children(child_owners: &[u64]) -> Self {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325 ^ child_owners.len() as u64;
        for &id in child_owners {
            h = mix(h ^ id);
        }
        Self::new(h, CacheKind::LayerChildren)
    }

    /// Returns the owner id.
    #[inline]
    #[must_use]
    pub const fn owner(self) -> u64 {
        self.owner
    }

    /// Returns the kind.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> CacheKind {
        self.kind
    }
}

impl fmt::Debug for CacheKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKeyId({:?}#{})", self.kind, self.owner)
    }
}

/// SplitMix64 finalizer.
const fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// A complete cache key: which unit, and the transform class it was rendered
/// under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheIdentity {
    /// Owner and kind.
    pub id: CacheKeyId,
    /// Rendering transform with whole-pixel translation discarded.
    pub transform: InvariantTransform,
}

impl CacheIdentity {
    /// Builds the identity for `id` rendered under `transform`.
    #[inline]
    #[must_use]
    pub fn new(id: CacheKeyId, transform: Affine) -> Self {
        Self {
            id,
            transform: InvariantTransform::new(transform),
        }
    }

    /// Returns the kind of the identified unit.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> CacheKind {
        self.id.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    #[test]
    fn same_owner_different_kind_differs() {
        let t = Affine::IDENTITY;
        let a = CacheIdentity::new(CacheKeyId::new(7, CacheKind::Layer), t);
        let b = CacheIdentity::new(CacheKeyId::new(7, CacheKind::DisplayList), t);
        assert_ne!(a, b);
    }

    #[test]
    fn whole_pixel_pan_shares_identity() {
        let id = CacheKeyId::new(1, CacheKind::DisplayList);
        let a = CacheIdentity::new(id, Affine::translate(Vec2::new(0.0, 120.0)));
        let b = CacheIdentity::new(id, Affine::translate(Vec2::new(0.0, 96.0)));
        assert_eq!(a, b);
    }

    #[test]
    fn children_id_depends_on_order_and_members() {
        let a = CacheKeyId::for_children(&[1, 2, 3]);
        assert_eq!(a, CacheKeyId::for_children(&[1, 2, 3]));
        assert_ne!(a, CacheKeyId::for_children(&[3, 2, 1]));
        assert_ne!(a, CacheKeyId::for_children(&[1, 2]));
        assert_eq!(a.kind(), CacheKind::LayerChildren);
    }

    #[test]
    fn layer_kinds() {
        assert!(CacheKind::Layer.is_layer());
        assert!(CacheKind::LayerChildren.is_layer());
        assert!(!CacheKind::Picture.is_layer());
        assert!(!CacheKind::DisplayList.is_layer());
    }
}
