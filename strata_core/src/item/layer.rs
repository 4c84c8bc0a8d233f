// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Rect};

use crate::context::{PaintContext, PrerollContext};
use crate::identity::{CacheKeyId, CacheKind};
use crate::item::{CacheState, CacheableItem, ItemState};
use crate::result::RasterizeParams;

/// The scene-graph side of a cacheable container layer.
///
/// [`paint`](Self::paint) and [`paint_children`](Self::paint_children) are
/// the layer's ordinary, uncached paint. They must not route through the
/// layer's own [`LayerCacheableItem`], since they are exactly what gets
/// rasterized into its entry. Descendant items may use the cache freely.
pub trait CacheableLayer {
    /// Owner id of the layer, stable for as long as its output is.
    fn unique_id(&self) -> u64;

    /// Bounds of everything the layer paints, in the layer's coordinates.
    fn paint_bounds(&self) -> Rect;

    /// Owner ids of the direct children, in paint order.
    fn child_ids(&self) -> Vec<u64>;

    /// Whether [`paint`](Self::paint) would draw anything.
    fn needs_painting(&self, ctx: &PaintContext<'_>) -> bool {
        _ = ctx;
        !self.paint_bounds().is_zero_area()
    }

    /// Paints the layer and its children.
    fn paint(&self, ctx: &mut PaintContext<'_>);

    /// Paints only the children, without the layer's own effect.
    fn paint_children(&self, ctx: &mut PaintContext<'_>);
}

/// A container layer cached as a whole, or as just its children.
///
/// The layer's own entry is marked seen every frame. Once it reaches the
/// threshold the whole layer is cached. Until then, a layer that allows it
/// caches its children as one unit instead, keyed by the ordered child ids,
/// with the same threshold applied to that entry. This suits wrappers such as
/// opacity or filters whose own identity churns while their content does not.
pub struct LayerCacheableItem<'a> {
    state: ItemState,
    layer: &'a dyn CacheableLayer,
    threshold: Option<usize>,
    can_cache_children: bool,
    children_id: Option<CacheKeyId>,
}

impl fmt::Debug for LayerCacheableItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerCacheableItem")
            .field("state", &self.state)
            .field("threshold", &self.threshold)
            .field("can_cache_children", &self.can_cache_children)
            .field("children_id", &self.children_id)
            .finish_non_exhaustive()
    }
}

impl<'a> LayerCacheableItem<'a> {
    /// Creates an item for `layer`.
    #[must_use]
    pub fn new(layer: &'a dyn CacheableLayer) -> Self {
        Self {
            state: ItemState::new(CacheKeyId::new(layer.unique_id(), CacheKind::Layer)),
            layer,
            threshold: None,
            can_cache_children: false,
            children_id: None,
        }
    }

    /// Overrides the cache's access threshold for this layer.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Allows caching the children alone while the layer itself is unstable.
    #[must_use]
    pub fn with_children_caching(mut self, can_cache_children: bool) -> Self {
        self.can_cache_children = can_cache_children;
        self
    }

    /// Key of the children unit, once computed by finalize.
    #[must_use]
    pub fn children_id(&self) -> Option<CacheKeyId> {
        self.children_id
    }

    fn rasterize_into(layer: &dyn CacheableLayer, state: CacheState, ctx: &mut PaintContext<'_>) {
        debug_assert_ne!(state, CacheState::None, "rasterizing an uncached layer");
        match state {
            CacheState::Current => {
                if layer.needs_painting(ctx) {
                    layer.paint(ctx);
                }
            }
            CacheState::Children => layer.paint_children(ctx),
            CacheState::None => {}
        }
    }
}

impl CacheableItem for LayerCacheableItem<'_> {
    fn state(&self) -> &ItemState {
        &self.state
    }

    fn setup(&mut self, ctx: &mut PrerollContext<'_>, matrix: Affine) {
        self.state.begin(matrix);
        self.children_id = None;
        self.state.register(ctx, self.threshold);
    }

    fn finalize(&mut self, ctx: &mut PrerollContext<'_>) {
        self.state.cache_state = CacheState::None;
        if !self.state.candidate {
            return;
        }
        let visible = self
            .state
            .is_visible_and_capturable(ctx, self.layer.paint_bounds());
        let Some(cache) = ctx.raster_cache.as_deref_mut() else {
            return;
        };
        let matrix = self.state.matrix;

        if self.can_cache_children {
            let child_ids = self.layer.child_ids();
            if !child_ids.is_empty() {
                self.children_id = Some(CacheKeyId::for_children(&child_ids));
            }
        }

        if !visible {
            cache.touch(self.state.key_id, matrix);
            if let Some(children_id) = self.children_id {
                cache.touch(children_id, matrix);
            }
            return;
        }

        self.state.access_attempts = cache.mark_seen(self.state.key_id, matrix);
        if self.state.access_attempts >= self.state.threshold {
            self.state.cache_state = CacheState::Current;
        } else if let Some(children_id) = self.children_id
            && cache.mark_seen(children_id, matrix) >= self.state.threshold
        {
            self.state.cache_state = CacheState::Children;
        }
    }

    fn id(&self) -> Option<CacheKeyId> {
        match self.state.cache_state {
            CacheState::None => None,
            CacheState::Current => Some(self.state.key_id),
            CacheState::Children => self.children_id,
        }
    }

    fn try_to_prepare_raster_cache(&self, ctx: &mut PaintContext<'_>) -> bool {
        let Some(id) = self.id() else {
            return false;
        };
        let Some(cache) = ctx.raster_cache.as_deref_mut() else {
            return false;
        };
        let params = RasterizeParams {
            matrix: self.state.matrix,
            logical_rect: self.layer.paint_bounds(),
            color_space: ctx.color_space,
            checkerboard: false,
        };
        let layer = self.layer;
        let state = self.state.cache_state;
        cache.update_cache_entry(id, &params, &mut *ctx.backend, &mut |nested| {
            Self::rasterize_into(layer, state, nested);
        })
    }
}
