// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use kurbo::{Affine, Vec2};

use crate::context::{PaintContext, PrerollContext};
use crate::display_list::Picture;
use crate::identity::{CacheKeyId, CacheKind};
use crate::item::{CacheState, CacheableItem, ItemState, leaf_draw, leaf_finalize, leaf_setup};
use crate::paint::Paint;
use crate::result::RasterizeParams;

/// A recorded-picture leaf drawn at an offset.
///
/// Pictures are opaque, so content with no access history is judged by
/// command count alone: more than [`MIN_OP_COUNT`](Self::MIN_OP_COUNT)
/// commands is worth caching.
pub struct PictureCacheableItem<'a> {
    state: ItemState,
    picture: &'a dyn Picture,
    offset: Vec2,
    is_complex: bool,
    will_change: bool,
}

impl fmt::Debug for PictureCacheableItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PictureCacheableItem")
            .field("state", &self.state)
            .field("offset", &self.offset)
            .field("is_complex", &self.is_complex)
            .field("will_change", &self.will_change)
            .finish_non_exhaustive()
    }
}

impl<'a> PictureCacheableItem<'a> {
    /// Pictures with more commands than this are worth caching.
    pub const MIN_OP_COUNT: usize = 5;

    /// Creates an item for `picture` drawn at `offset`.
    #[must_use]
    pub fn new(picture: &'a dyn Picture, offset: Vec2, is_complex: bool, will_change: bool) -> Self {
        Self {
            state: ItemState::new(CacheKeyId::new(picture.unique_id(), CacheKind::Picture)),
            picture,
            offset,
            is_complex,
            will_change,
        }
    }

    /// Paints the picture, from the cache when possible.
    ///
    /// Returns `true` if the cached image was drawn.
    pub fn paint(&self, ctx: &mut PaintContext<'_>, paint: Option<&Paint>) -> bool {
        crate::item::paint_with_cache(self, ctx, paint, |ctx| self.paint_live(ctx))
    }

    /// Plays the picture back at its offset without consulting the cache.
    pub fn paint_live(&self, ctx: &mut PaintContext<'_>) {
        ctx.canvas.save();
        ctx.canvas.concat(Affine::translate(self.offset));
        self.picture.playback(&mut *ctx.canvas);
        ctx.canvas.restore();
    }
}

impl CacheableItem for PictureCacheableItem<'_> {
    fn state(&self) -> &ItemState {
        &self.state
    }

    fn setup(&mut self, ctx: &mut PrerollContext<'_>, matrix: Affine) {
        leaf_setup(
            &mut self.state,
            ctx,
            matrix * Affine::translate(self.offset),
            self.picture.cull_rect(),
            self.will_change,
        );
    }

    fn finalize(&mut self, ctx: &mut PrerollContext<'_>) {
        let worth = self.is_complex || self.picture.approximate_op_count() > Self::MIN_OP_COUNT;
        leaf_finalize(&mut self.state, ctx, self.picture.cull_rect(), |_| worth);
    }

    fn id(&self) -> Option<CacheKeyId> {
        (self.state.cache_state() == CacheState::Current).then_some(self.state.key_id())
    }

    fn try_to_prepare_raster_cache(&self, ctx: &mut PaintContext<'_>) -> bool {
        let Some(id) = self.id() else {
            return false;
        };
        let Some(cache) = ctx.raster_cache.as_deref_mut() else {
            return false;
        };
        let params = RasterizeParams {
            matrix: self.state.matrix(),
            logical_rect: self.picture.cull_rect(),
            color_space: ctx.color_space,
            checkerboard: false,
        };
        let picture = self.picture;
        cache.update_cache_entry(id, &params, &mut *ctx.backend, &mut |nested| {
            picture.playback(&mut *nested.canvas);
        })
    }

    fn draw(&self, ctx: &mut PaintContext<'_>, paint: Option<&Paint>) -> bool {
        leaf_draw(&self.state, self.offset, ctx, paint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use kurbo::Rect;

    use crate::complexity::NaiveEstimator;
    use crate::display_list::{DisplayList, DrawOp};
    use crate::recording::{RecordingBackend, RecordingCanvas};
    use crate::store::{RasterCache, RasterCacheConfig};

    const CULL: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    const BOUNDS: Rect = Rect::new(0.0, 0.0, 10.0, 10.0);

    fn picture(ops: usize) -> DisplayList {
        DisplayList::new(5, BOUNDS, vec![DrawOp::DrawOval(BOUNDS); ops])
    }

    fn preroll(item: &mut PictureCacheableItem<'_>, cache: &mut RasterCache) {
        let estimator = NaiveEstimator;
        let mut ctx = PrerollContext::new(&estimator, CULL).with_raster_cache(cache);
        item.setup(&mut ctx, Affine::IDENTITY);
        item.finalize(&mut ctx);
    }

    #[test]
    fn op_count_gate() {
        let mut cache = RasterCache::new(RasterCacheConfig::new().with_access_threshold(1));
        let small = picture(5);
        let mut item = PictureCacheableItem::new(&small, Vec2::ZERO, false, false);
        preroll(&mut item, &mut cache);
        assert_eq!(item.cache_state(), CacheState::None);

        let big = picture(6);
        let mut item = PictureCacheableItem::new(&big, Vec2::ZERO, false, false);
        preroll(&mut item, &mut cache);
        assert_eq!(item.cache_state(), CacheState::Current);
        assert_eq!(item.state().key_id().kind(), CacheKind::Picture);
    }

    #[test]
    fn picture_and_display_list_with_same_owner_do_not_collide() {
        let mut cache = RasterCache::new(RasterCacheConfig::new().with_access_threshold(1));
        let content = picture(8);
        let mut as_picture = PictureCacheableItem::new(&content, Vec2::ZERO, false, false);
        preroll(&mut as_picture, &mut cache);
        let mut as_list =
            crate::item::DisplayListCacheableItem::new(&content, Vec2::ZERO, false, false);
        {
            let estimator = NaiveEstimator;
            let mut ctx = PrerollContext::new(&estimator, CULL).with_raster_cache(&mut cache);
            as_list.setup(&mut ctx, Affine::IDENTITY);
            as_list.finalize(&mut ctx);
        }
        assert_eq!(cache.cached_entries_count(), 2);
        assert_eq!(cache.picture_cached_entries_count(), 2);
    }

    #[test]
    fn paints_from_cache_once_promoted() {
        let mut cache = RasterCache::new(RasterCacheConfig::new().with_access_threshold(1));
        let mut backend = RecordingBackend::default();
        let content = picture(8);
        let mut item = PictureCacheableItem::new(&content, Vec2::ZERO, false, false);
        preroll(&mut item, &mut cache);

        let mut canvas = RecordingCanvas::new(CULL);
        let mut ctx = PaintContext::new(&mut canvas, &mut backend).with_raster_cache(&mut cache);
        assert!(!item.paint(&mut ctx, None));
        assert!(item.paint(&mut ctx, None));
        assert!(item.paint(&mut ctx, None));
        assert_eq!(canvas.image_count(), 2);
        assert_eq!(canvas.op_count(), 8);
        assert_eq!(backend.surfaces_allocated(), 1);
    }

    #[test]
    fn budget_exhausted_paints_live() {
        let mut cache = RasterCache::new(
            RasterCacheConfig::new()
                .with_access_threshold(1)
                .with_new_entries_per_frame(0),
        );
        let mut backend = RecordingBackend::default();
        let content = picture(8);
        let mut item = PictureCacheableItem::new(&content, Vec2::ZERO, false, false);
        preroll(&mut item, &mut cache);
        assert_eq!(item.cache_state(), CacheState::Current);

        let mut canvas = RecordingCanvas::new(CULL);
        let mut ctx = PaintContext::new(&mut canvas, &mut backend).with_raster_cache(&mut cache);
        assert!(!item.paint(&mut ctx, None));
        assert_eq!(canvas.op_count(), 8);
        assert_eq!(backend.surfaces_allocated(), 0);
    }
}
