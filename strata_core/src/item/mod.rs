// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame cacheable items.
//!
//! The scene graph creates one item per cacheable unit each frame and drives
//! it through three calls:
//!
//! 1. [`setup`](CacheableItem::setup) on the way down, before children are
//!    prerolled. Items that can never be cached this frame (no usable cache,
//!    singular transform, a `will_change` hint, empty bounds) stop here.
//! 2. [`finalize`](CacheableItem::finalize) on the way up, after children.
//!    Items outside the cull rect or above uncacheable content are rejected.
//!    Survivors are marked seen in the store, and promoted once their access
//!    count reaches the threshold.
//! 3. At paint time, [`paint_with_cache`] draws the cached image. On a miss
//!    it populates the entry and paints live; the image shows up next frame.
//!
//! Items do not outlive the frame. Access history lives in the
//! [`RasterCache`](crate::store::RasterCache) entry, so an item created fresh
//! each frame sees the count accumulated by its predecessors.

mod display_list;
mod layer;
mod picture;

pub use display_list::DisplayListCacheableItem;
pub use layer::{CacheableLayer, LayerCacheableItem};
pub use picture::PictureCacheableItem;

use kurbo::{Affine, Rect};

use crate::context::{PaintContext, PrerollContext};
use crate::identity::CacheKeyId;
use crate::paint::Paint;
use crate::result::can_rasterize_rect;
use crate::store::RasterCache;
use crate::transform::{device_bounds, is_invertible, rects_intersect};

/// Which unit, if any, an item draws from the cache this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CacheState {
    /// Paint normally.
    #[default]
    None,
    /// The item's own output is the cached unit.
    Current,
    /// Only the item's children are cached, as one unit.
    Children,
}

/// Bookkeeping shared by every item variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemState {
    key_id: CacheKeyId,
    cache_state: CacheState,
    matrix: Affine,
    access_attempts: usize,
    threshold: usize,
    candidate: bool,
}

impl ItemState {
    /// Creates the state for an item owning `key_id`.
    #[must_use]
    pub const fn new(key_id: CacheKeyId) -> Self {
        Self {
            key_id,
            cache_state: CacheState::None,
            matrix: Affine::IDENTITY,
            access_attempts: 0,
            threshold: 0,
            candidate: false,
        }
    }

    /// The item's own key.
    #[must_use]
    pub const fn key_id(&self) -> CacheKeyId {
        self.key_id
    }

    /// Current cache state.
    #[must_use]
    pub const fn cache_state(&self) -> CacheState {
        self.cache_state
    }

    /// Transform recorded at setup; every key the item touches uses it.
    #[must_use]
    pub const fn matrix(&self) -> Affine {
        self.matrix
    }

    /// Access count of the item's entry as of finalize.
    #[must_use]
    pub const fn access_attempts(&self) -> usize {
        self.access_attempts
    }

    /// Access count required for promotion.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether setup registered the item as a candidate.
    #[must_use]
    pub const fn is_candidate(&self) -> bool {
        self.candidate
    }

    /// Resets for a new setup and records the candidate transform.
    fn begin(&mut self, matrix: Affine) {
        self.cache_state = CacheState::None;
        self.matrix = matrix;
        self.access_attempts = 0;
        self.threshold = 0;
        self.candidate = false;
    }

    /// Registers as a candidate if the context has a usable cache and the
    /// transform can be rasterized under.
    fn register(&mut self, ctx: &mut PrerollContext<'_>, threshold: Option<usize>) -> bool {
        let Some(cache) = ctx.raster_cache.as_deref() else {
            return false;
        };
        if cache.access_threshold() == 0 {
            return false;
        }
        if !is_invertible(self.matrix) {
            log::debug!("not caching {:?}: transform is not invertible", self.key_id);
            return false;
        }
        self.threshold = threshold.unwrap_or(cache.access_threshold());
        self.candidate = true;
        ctx.register_candidate();
        true
    }

    /// Returns `true` if content with these logical bounds is visible and
    /// capturable from where the item sits.
    fn is_visible_and_capturable(&self, ctx: &PrerollContext<'_>, bounds: Rect) -> bool {
        !ctx.subtree_is_uncacheable()
            && rects_intersect(device_bounds(bounds, self.matrix), ctx.cull_rect)
    }
}

/// A transient per-frame participant in the raster cache protocol.
pub trait CacheableItem {
    /// Returns the shared bookkeeping.
    fn state(&self) -> &ItemState;

    /// Descent half of preroll. `matrix` is the transform the item's content
    /// will be drawn under.
    fn setup(&mut self, ctx: &mut PrerollContext<'_>, matrix: Affine);

    /// Ascent half of preroll, after the item's children were prerolled.
    fn finalize(&mut self, ctx: &mut PrerollContext<'_>);

    /// Key of the unit matching the current state, or `None` when the item
    /// paints normally.
    fn id(&self) -> Option<CacheKeyId>;

    /// Populates the entry for the current state.
    ///
    /// Returns whether the entry now holds an image. The item's ordinary paint
    /// is what gets rasterized.
    fn try_to_prepare_raster_cache(&self, ctx: &mut PaintContext<'_>) -> bool;

    /// Current cache state.
    fn cache_state(&self) -> CacheState {
        self.state().cache_state()
    }

    /// Draws the cached unit for the current state.
    ///
    /// Returns `false` without drawing on a miss or when the item paints
    /// normally.
    fn draw(&self, ctx: &mut PaintContext<'_>, paint: Option<&Paint>) -> bool {
        let Some(id) = self.id() else {
            return false;
        };
        let Some(cache) = ctx.raster_cache.as_deref_mut() else {
            return false;
        };
        cache.draw(id, &mut *ctx.canvas, paint)
    }

    /// Keeps the entry for the current state alive without counting an
    /// access.
    fn touch(&self, cache: &mut RasterCache) -> bool {
        self.id()
            .is_some_and(|id| cache.touch(id, self.state().matrix()))
    }
}

/// Paints `item` from the cache if possible, and with `live` otherwise.
///
/// On a miss the entry is populated (subject to the frame budget) and the
/// frame is painted with `live`; the new image is first drawn on the next
/// frame. `live` must be the same paint the item rasterizes into its entry.
///
/// Returns `true` if the cached image was drawn.
pub fn paint_with_cache<I, F>(
    item: &I,
    ctx: &mut PaintContext<'_>,
    paint: Option<&Paint>,
    live: F,
) -> bool
where
    I: CacheableItem + ?Sized,
    F: FnOnce(&mut PaintContext<'_>),
{
    if item.draw(ctx, paint) {
        return true;
    }
    item.try_to_prepare_raster_cache(ctx);
    live(ctx);
    false
}

// -- Leaf helpers shared by the display-list and picture variants --

fn leaf_setup(
    state: &mut ItemState,
    ctx: &mut PrerollContext<'_>,
    matrix: Affine,
    bounds: Rect,
    will_change: bool,
) {
    state.begin(matrix);
    if will_change || !can_rasterize_rect(bounds) {
        return;
    }
    state.register(ctx, None);
}

fn leaf_finalize(
    state: &mut ItemState,
    ctx: &mut PrerollContext<'_>,
    bounds: Rect,
    worth_rasterizing: impl FnOnce(&PrerollContext<'_>) -> bool,
) {
    state.cache_state = CacheState::None;
    if !state.candidate {
        return;
    }
    let visible = state.is_visible_and_capturable(ctx, bounds);
    let seen_before = ctx
        .raster_cache
        .as_deref()
        .is_some_and(|cache| cache.access_count(state.key_id, state.matrix) > 0);
    if !seen_before && !worth_rasterizing(ctx) {
        return;
    }
    let Some(cache) = ctx.raster_cache.as_deref_mut() else {
        return;
    };
    if !visible {
        cache.touch(state.key_id, state.matrix);
        return;
    }
    state.access_attempts = cache.mark_seen(state.key_id, state.matrix);
    if state.access_attempts >= state.threshold {
        state.cache_state = CacheState::Current;
        ctx.subtree_can_inherit_opacity = true;
    }
}

fn leaf_draw(
    state: &ItemState,
    offset: kurbo::Vec2,
    ctx: &mut PaintContext<'_>,
    paint: Option<&Paint>,
) -> bool {
    if state.cache_state != CacheState::Current {
        return false;
    }
    let Some(cache) = ctx.raster_cache.as_deref_mut() else {
        return false;
    };
    ctx.canvas.save();
    ctx.canvas.concat(Affine::translate(offset));
    let hit = cache.draw(state.key_id, &mut *ctx.canvas, paint);
    ctx.canvas.restore();
    hit
}
