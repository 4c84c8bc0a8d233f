// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Affine, Vec2};

use crate::context::{PaintContext, PrerollContext};
use crate::display_list::DisplayList;
use crate::identity::{CacheKeyId, CacheKind};
use crate::item::{CacheState, CacheableItem, ItemState, leaf_draw, leaf_finalize, leaf_setup};
use crate::paint::Paint;
use crate::result::RasterizeParams;

/// A display-list leaf drawn at an offset.
///
/// Content with no access history must be judged worth caching by the
/// context's [`ComplexityEstimator`](crate::complexity::ComplexityEstimator),
/// unless the `is_complex` hint says so up front. The `will_change` hint
/// keeps the item out of the cache entirely.
#[derive(Debug)]
pub struct DisplayListCacheableItem<'a> {
    state: ItemState,
    display_list: &'a DisplayList,
    offset: Vec2,
    is_complex: bool,
    will_change: bool,
}

impl<'a> DisplayListCacheableItem<'a> {
    /// Creates an item for `display_list` drawn at `offset`.
    #[must_use]
    pub fn new(
        display_list: &'a DisplayList,
        offset: Vec2,
        is_complex: bool,
        will_change: bool,
    ) -> Self {
        Self {
            state: ItemState::new(CacheKeyId::new(
                display_list.unique_id(),
                CacheKind::DisplayList,
            )),
            display_list,
            offset,
            is_complex,
            will_change,
        }
    }

    /// Returns the display list.
    #[must_use]
    pub fn display_list(&self) -> &'a DisplayList {
        self.display_list
    }

    /// Paints the display list, from the cache when possible.
    ///
    /// Returns `true` if the cached image was drawn.
    pub fn paint(&self, ctx: &mut PaintContext<'_>, paint: Option<&Paint>) -> bool {
        crate::item::paint_with_cache(self, ctx, paint, |ctx| self.paint_live(ctx))
    }

    /// Replays the display list at its offset without consulting the cache.
    pub fn paint_live(&self, ctx: &mut PaintContext<'_>) {
        ctx.canvas.save();
        ctx.canvas.concat(Affine::translate(self.offset));
        self.display_list.render_to(&mut *ctx.canvas);
        ctx.canvas.restore();
    }
}

impl CacheableItem for DisplayListCacheableItem<'_> {
    fn state(&self) -> &ItemState {
        &self.state
    }

    fn setup(&mut self, ctx: &mut PrerollContext<'_>, matrix: Affine) {
        leaf_setup(
            &mut self.state,
            ctx,
            matrix * Affine::translate(self.offset),
            self.display_list.bounds(),
            self.will_change,
        );
    }

    fn finalize(&mut self, ctx: &mut PrerollContext<'_>) {
        let display_list = self.display_list;
        let is_complex = self.is_complex;
        leaf_finalize(&mut self.state, ctx, display_list.bounds(), |ctx| {
            is_complex || ctx.complexity.is_worth_caching(display_list)
        });
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
            logical_rect: self.display_list.bounds(),
            color_space: ctx.color_space,
            checkerboard: false,
        };
        let display_list = self.display_list;
        cache.update_cache_entry(id, &params, &mut *ctx.backend, &mut |nested| {
            display_list.render_to(&mut *nested.canvas);
        })
    }

    fn draw(&self, ctx: &mut PaintContext<'_>, paint: Option<&Paint>) -> bool {
        leaf_draw(&self.state, self.offset, ctx, paint)
    }
}
