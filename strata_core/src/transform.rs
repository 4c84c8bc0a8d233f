// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invariant transforms and device-space bounds.
//!
//! A cache entry is only reusable when the content would rasterize to the
//! same pixels. Panning by whole device pixels does not change the pixels, so
//! the key keeps every component of the 2×3 affine matrix exactly except the
//! integer part of the translation. Scale, skew, rotation and sub-pixel
//! offset all survive into the key.
//!
//! The sub-pixel offset is snapped to a grid of [`SUBPIXEL_STEPS`] per pixel,
//! both in keys and in [`device_bounds`]. Without it, `0.1 + k` and `0.1`
//! would split into different fractions for most whole `k`.
//!
//! Every key in the crate is built through [`InvariantTransform::new`]; there
//! is no second normalization path.

use core::fmt;
use core::hash::{Hash, Hasher};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Rect};

/// Sub-pixel positions distinguished per device pixel.
pub const SUBPIXEL_STEPS: f64 = 1024.0;

/// Splits `v` into a whole-pixel part and a fraction snapped to the
/// sub-pixel grid, in `[0, 1)`.
fn split_translation(v: f64) -> (f64, f64) {
    let mut whole = v.floor();
    let mut frac = ((v - whole) * SUBPIXEL_STEPS).round() / SUBPIXEL_STEPS;
    if frac >= 1.0 {
        whole += 1.0;
        frac = 0.0;
    }
    (whole, frac)
}

/// Returns `transform` with its translation snapped to the sub-pixel grid.
///
/// Transforms that differ only by a whole-pixel pan stay exactly a whole
/// number of pixels apart after snapping.
#[must_use]
pub fn snap_translation(transform: Affine) -> Affine {
    let [a, b, c, d, e, f] = transform.as_coeffs();
    let (ew, ef) = split_translation(e);
    let (fw, ff) = split_translation(f);
    Affine::new([a, b, c, d, ew + ef, fw + ff])
}

/// A 2×3 affine transform with its whole-pixel translation discarded.
///
/// Coefficients use the [`Affine`] layout `[a, b, c, d, e, f]`, where `e` and
/// `f` are the translation. After normalization `e` and `f` lie in `[0, 1)`
/// on the [`SUBPIXEL_STEPS`] grid.
#[derive(Clone, Copy)]
pub struct InvariantTransform {
    coeffs: [f64; 6],
}

impl InvariantTransform {
    /// Normalizes `transform` by keeping only the snapped fractional part of
    /// its translation.
    #[must_use]
    pub fn new(transform: Affine) -> Self {
        let [a, b, c, d, e, f] = transform.as_coeffs();
        let coeffs = [a, b, c, d, split_translation(e).1, split_translation(f).1];
        // `-0.0 + 0.0` is `+0.0`, so equal matrices share one bit pattern.
        Self {
            coeffs: coeffs.map(|v| v + 0.0),
        }
    }

    /// Returns the normalized coefficients.
    #[inline]
    #[must_use]
    pub const fn coeffs(&self) -> [f64; 6] {
        self.coeffs
    }

    /// Returns the normalized matrix as an [`Affine`].
    #[inline]
    #[must_use]
    pub fn to_affine(self) -> Affine {
        Affine::new(self.coeffs)
    }
}

impl PartialEq for InvariantTransform {
    fn eq(&self, other: &Self) -> bool {
        self.coeffs
            .iter()
            .zip(other.coeffs.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for InvariantTransform {}

impl Hash for InvariantTransform {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for v in self.coeffs {
            v.to_bits().hash(state);
        }
    }
}

impl fmt::Debug for InvariantTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, t] = self.coeffs;
        write!(f, "InvariantTransform([{a}, {b}, {c}, {d}, {e}, {t}])")
    }
}

/// Returns `true` if `transform` is finite and has a non-zero determinant.
#[must_use]
pub fn is_invertible(transform: Affine) -> bool {
    transform.is_finite() && transform.determinant() != 0.0
}

/// Rounds `rect` outward to whole-pixel edges.
#[must_use]
pub fn round_out(rect: Rect) -> Rect {
    let rect = rect.abs();
    Rect::new(
        rect.x0.floor(),
        rect.y0.floor(),
        rect.x1.ceil(),
        rect.y1.ceil(),
    )
}

/// Maps `logical` through `transform` with its translation snapped, and
/// rounds the bounding box out to whole device pixels.
///
/// The fractional part of the translation lands inside the rounded box, so a
/// bitmap rasterized for one transform can be placed at integer coordinates
/// for any transform in the same invariant class.
#[must_use]
pub fn device_bounds(logical: Rect, transform: Affine) -> Rect {
    round_out(snap_translation(transform).transform_rect_bbox(logical))
}

/// Returns `true` if the two rectangles share a region of non-zero area.
#[must_use]
pub fn rects_intersect(a: Rect, b: Rect) -> bool {
    let a = a.abs();
    let b = b.abs();
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    #[test]
    fn integer_pan_is_discarded() {
        let a = InvariantTransform::new(Affine::translate(Vec2::new(10.0, 20.0)));
        let b = InvariantTransform::new(Affine::translate(Vec2::new(-3.0, 7.0)));
        assert_eq!(a, b);
        assert_eq!(a, InvariantTransform::new(Affine::IDENTITY));
    }

    #[test]
    fn fractional_offset_is_kept() {
        let a = InvariantTransform::new(Affine::translate(Vec2::new(10.25, 0.0)));
        let b = InvariantTransform::new(Affine::translate(Vec2::new(11.25, 5.0)));
        let c = InvariantTransform::new(Affine::translate(Vec2::new(10.5, 0.0)));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.coeffs()[4], 0.25);
    }

    #[test]
    fn non_dyadic_whole_pixel_pans_share_a_key() {
        let base = InvariantTransform::new(Affine::translate(Vec2::new(0.1, 0.3)));
        for k in 1..=100 {
            let k = f64::from(k);
            let panned = Affine::translate(Vec2::new(0.1 + k, 0.3 - 3.0 * k));
            assert_eq!(InvariantTransform::new(panned), base, "pan by {k}");
        }
        assert_ne!(
            base,
            InvariantTransform::new(Affine::translate(Vec2::new(0.2, 0.3)))
        );
    }

    #[test]
    fn fraction_just_below_one_folds_to_zero() {
        let t = InvariantTransform::new(Affine::translate(Vec2::new(4.999_999_9, 0.0)));
        assert_eq!(t, InvariantTransform::new(Affine::IDENTITY));
        assert_eq!(
            snap_translation(Affine::translate(Vec2::new(4.999_999_9, 0.0))),
            Affine::translate(Vec2::new(5.0, 0.0))
        );
    }

    #[test]
    fn non_dyadic_pans_keep_device_bounds_a_whole_pan_apart() {
        let logical = Rect::new(0.0, 0.0, 30.0, 20.0);
        let base = device_bounds(logical, Affine::translate(Vec2::new(0.1, 0.3)));
        for k in 1..=50 {
            let k = f64::from(k);
            let panned =
                device_bounds(logical, Affine::translate(Vec2::new(0.1 + k, 0.3 + 2.0 * k)));
            assert_eq!(panned.size(), base.size(), "pan by {k}");
            assert_eq!(panned.x0 - base.x0, k);
            assert_eq!(panned.y0 - base.y0, 2.0 * k);
        }
    }

    #[test]
    fn negative_translation_normalizes_into_unit_range() {
        let t = InvariantTransform::new(Affine::translate(Vec2::new(-0.75, -2.0)));
        assert_eq!(t.coeffs()[4], 0.25);
        assert_eq!(t.coeffs()[5], 0.0);
        assert_eq!(
            t,
            InvariantTransform::new(Affine::translate(Vec2::new(4.25, 1.0)))
        );
    }

    #[test]
    fn scale_rotation_and_skew_are_kept() {
        let base = InvariantTransform::new(Affine::IDENTITY);
        assert_ne!(base, InvariantTransform::new(Affine::scale(2.0)));
        assert_ne!(base, InvariantTransform::new(Affine::rotate(0.1)));
        assert_ne!(base, InvariantTransform::new(Affine::skew(0.5, 0.0)));
    }

    #[test]
    fn scaled_pan_keeps_scale_and_drops_integer_offset() {
        let a = Affine::translate(Vec2::new(3.0, 4.0)) * Affine::scale(2.0);
        let b = Affine::translate(Vec2::new(40.0, -9.0)) * Affine::scale(2.0);
        assert_eq!(InvariantTransform::new(a), InvariantTransform::new(b));
        assert_eq!(InvariantTransform::new(a).coeffs()[0], 2.0);
    }

    #[test]
    fn negative_zero_hashes_like_zero() {
        use core::hash::BuildHasher;

        let a = InvariantTransform::new(Affine::new([1.0, -0.0, 0.0, 1.0, 0.0, 0.0]));
        let b = InvariantTransform::new(Affine::IDENTITY);
        assert_eq!(a, b);
        let s = hashbrown::DefaultHashBuilder::default();
        assert_eq!(s.hash_one(a), s.hash_one(b));
    }

    #[test]
    fn invertibility() {
        assert!(is_invertible(Affine::IDENTITY));
        assert!(is_invertible(Affine::scale(0.5)));
        assert!(!is_invertible(Affine::scale(0.0)));
        assert!(!is_invertible(Affine::new([1.0, 0.0, 0.0, 1.0, f64::NAN, 0.0])));
    }

    #[test]
    fn device_bounds_round_out() {
        let logical = Rect::new(0.0, 0.0, 10.0, 10.0);
        let t = Affine::translate(Vec2::new(0.5, 0.25));
        assert_eq!(device_bounds(logical, t), Rect::new(0.0, 0.0, 11.0, 11.0));

        let t = Affine::translate(Vec2::new(100.5, 0.0)) * Affine::scale(2.0);
        assert_eq!(
            device_bounds(logical, t),
            Rect::new(100.0, 0.0, 121.0, 20.0)
        );
    }

    #[test]
    fn whole_pixel_pan_keeps_device_size() {
        let logical = Rect::new(1.3, 2.7, 40.1, 33.3);
        let t = Affine::translate(Vec2::new(0.4, 0.6)) * Affine::scale(1.5);
        let panned = Affine::translate(Vec2::new(17.0, -5.0)) * t;
        let a = device_bounds(logical, t);
        let b = device_bounds(logical, panned);
        assert_eq!(a.size(), b.size());
        assert_eq!(b.x0 - a.x0, 17.0);
        assert_eq!(b.y0 - a.y0, -5.0);
    }

    #[test]
    fn intersection_requires_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_intersect(a, Rect::new(5.0, 5.0, 20.0, 20.0)));
        assert!(!rects_intersect(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!rects_intersect(a, Rect::new(50.0, 50.0, 60.0, 60.0)));
    }
}
