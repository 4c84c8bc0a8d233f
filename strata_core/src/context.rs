// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversal contexts handed to cacheable items.
//!
//! The scene graph builds a [`PrerollContext`] for its preroll pass and a
//! [`PaintContext`] for its paint pass. Both optionally borrow the
//! [`RasterCache`]; with no cache every item reports itself uncached and the
//! graph paints normally.

use kurbo::Rect;

use crate::backend::{BackendKind, Canvas, ColorSpace, RenderBackend};
use crate::complexity::ComplexityEstimator;
use crate::store::RasterCache;

/// State shared by every item during preroll.
pub struct PrerollContext<'a> {
    /// The cache, if caching is available this frame.
    pub raster_cache: Option<&'a mut RasterCache>,
    /// Decides whether content with no access history is worth caching.
    pub complexity: &'a dyn ComplexityEstimator,
    /// Rasterizer family of the frame's backend.
    pub backend_kind: BackendKind,
    /// Visible region in device space.
    pub cull_rect: Rect,
    /// The subtree being prerolled embeds a platform view.
    pub has_platform_view: bool,
    /// The subtree being prerolled draws an external texture.
    pub has_texture_layer: bool,
    /// Set by items that will draw from the cache, so a parent may fold its
    /// opacity into the cached draw instead of using a save-layer.
    pub subtree_can_inherit_opacity: bool,
    candidates: usize,
}

impl core::fmt::Debug for PrerollContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrerollContext")
            .field("has_raster_cache", &self.raster_cache.is_some())
            .field("backend_kind", &self.backend_kind)
            .field("cull_rect", &self.cull_rect)
            .field("has_platform_view", &self.has_platform_view)
            .field("has_texture_layer", &self.has_texture_layer)
            .field("candidates", &self.candidates)
            .finish_non_exhaustive()
    }
}

impl<'a> PrerollContext<'a> {
    /// Creates a context with no cache attached.
    #[must_use]
    pub fn new(complexity: &'a dyn ComplexityEstimator, cull_rect: Rect) -> Self {
        Self {
            raster_cache: None,
            complexity,
            backend_kind: BackendKind::default(),
            cull_rect,
            has_platform_view: false,
            has_texture_layer: false,
            subtree_can_inherit_opacity: false,
            candidates: 0,
        }
    }

    /// Attaches the cache.
    #[must_use]
    pub fn with_raster_cache(mut self, raster_cache: &'a mut RasterCache) -> Self {
        self.raster_cache = Some(raster_cache);
        self
    }

    /// Sets the backend kind.
    #[must_use]
    pub fn with_backend_kind(mut self, backend_kind: BackendKind) -> Self {
        self.backend_kind = backend_kind;
        self
    }

    /// Returns `true` if a cache is attached and caching is enabled.
    #[must_use]
    pub fn raster_cache_usable(&self) -> bool {
        self.raster_cache
            .as_deref()
            .is_some_and(|cache| cache.access_threshold() != 0)
    }

    /// Entries the cache may still populate this frame, or zero without a
    /// cache.
    #[must_use]
    pub fn remaining_budget(&self) -> usize {
        self.raster_cache
            .as_deref()
            .map_or(0, RasterCache::remaining_budget)
    }

    /// Returns `true` if the current subtree embeds content that cannot be
    /// captured in a bitmap.
    #[must_use]
    pub fn subtree_is_uncacheable(&self) -> bool {
        self.has_platform_view || self.has_texture_layer
    }

    /// Records that an item registered itself as a cache candidate.
    pub fn register_candidate(&mut self) {
        self.candidates += 1;
    }

    /// Number of items registered as candidates this preroll.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates
    }
}

/// State shared by every item during paint.
pub struct PaintContext<'a> {
    /// Current drawing destination.
    pub canvas: &'a mut dyn Canvas,
    /// Allocates offscreen targets when entries are populated.
    pub backend: &'a mut dyn RenderBackend,
    /// The cache, if caching is available this frame.
    pub raster_cache: Option<&'a mut RasterCache>,
    /// Color space for offscreen targets.
    pub color_space: ColorSpace,
}

impl core::fmt::Debug for PaintContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaintContext")
            .field("transform", &self.canvas.transform())
            .field("backend_kind", &self.backend.kind())
            .field("has_raster_cache", &self.raster_cache.is_some())
            .field("color_space", &self.color_space)
            .finish()
    }
}

impl<'a> PaintContext<'a> {
    /// Creates a context with no cache attached.
    #[must_use]
    pub fn new(canvas: &'a mut dyn Canvas, backend: &'a mut dyn RenderBackend) -> Self {
        Self {
            canvas,
            backend,
            raster_cache: None,
            color_space: ColorSpace::default(),
        }
    }

    /// Attaches the cache.
    #[must_use]
    pub fn with_raster_cache(mut self, raster_cache: &'a mut RasterCache) -> Self {
        self.raster_cache = Some(raster_cache);
        self
    }

    /// Sets the offscreen color space.
    #[must_use]
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }
}
