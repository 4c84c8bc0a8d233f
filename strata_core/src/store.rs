// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-frame raster cache storage with admission budgeting and sweep
//! eviction.
//!
//! The store maps a [`CacheIdentity`] to a [`CacheEntry`]. Entries are created
//! empty by [`mark_seen`](RasterCache::mark_seen), populated at most once by
//! [`update_cache_entry`](RasterCache::update_cache_entry), composited by
//! [`draw`](RasterCache::draw), and removed by
//! [`sweep_after_frame`](RasterCache::sweep_after_frame) once a whole frame
//! passes without anything touching them.
//!
//! At most [`RasterCacheConfig::new_entries_per_frame`] entries are populated
//! per frame. Rasterizing is synchronous on the rendering thread, so the cap
//! spreads the cost of many simultaneously eligible items over several
//! frames. Items over the cap simply paint uncached until a later frame.
//!
//! The store is not thread-safe and is meant to be confined to the rendering
//! thread.

use alloc::boxed::Box;

use hashbrown::HashMap;
use kurbo::Affine;

use crate::backend::{Canvas, RenderBackend};
use crate::context::PaintContext;
use crate::error::RasterError;
use crate::identity::{CacheIdentity, CacheKeyId};
use crate::paint::Paint;
use crate::result::{CacheResult, RasterizeParams, rasterize};
use crate::trace::{
    BudgetExhaustedEvent, ClearEvent, PopulateEvent, PopulateFailedEvent, SweepEvent, TraceSink,
    Tracer,
};

/// Configuration for a [`RasterCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterCacheConfig {
    /// Number of frames an item must be seen before it is cached.
    ///
    /// Zero disables caching entirely.
    pub access_threshold: usize,
    /// Maximum number of entries populated in a single frame.
    pub new_entries_per_frame: usize,
    /// Overlay a checkerboard on every rasterized entry.
    pub checkerboard: bool,
}

impl RasterCacheConfig {
    /// Default access threshold.
    pub const DEFAULT_ACCESS_THRESHOLD: usize = 3;

    /// Default per-frame admission budget.
    pub const DEFAULT_NEW_ENTRIES_PER_FRAME: usize = 3;

    /// Default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            access_threshold: Self::DEFAULT_ACCESS_THRESHOLD,
            new_entries_per_frame: Self::DEFAULT_NEW_ENTRIES_PER_FRAME,
            checkerboard: false,
        }
    }

    /// A configuration that never caches anything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            access_threshold: 0,
            ..Self::new()
        }
    }

    /// Sets [`access_threshold`](Self::access_threshold).
    #[must_use]
    pub const fn with_access_threshold(mut self, access_threshold: usize) -> Self {
        self.access_threshold = access_threshold;
        self
    }

    /// Sets [`new_entries_per_frame`](Self::new_entries_per_frame).
    #[must_use]
    pub const fn with_new_entries_per_frame(mut self, new_entries_per_frame: usize) -> Self {
        self.new_entries_per_frame = new_entries_per_frame;
        self
    }

    /// Sets [`checkerboard`](Self::checkerboard).
    #[must_use]
    pub const fn with_checkerboard(mut self, checkerboard: bool) -> Self {
        self.checkerboard = checkerboard;
        self
    }
}

impl Default for RasterCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Image statistics gathered by one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasterCacheMetrics {
    /// Entries with images evicted by the sweep.
    pub eviction_count: usize,
    /// Bytes of images evicted by the sweep.
    pub eviction_bytes: usize,
    /// Entries with images that were used during the frame.
    pub in_use_count: usize,
    /// Bytes of images that were used during the frame.
    pub in_use_bytes: usize,
}

impl RasterCacheMetrics {
    /// Entries that held an image during the frame, used or evicted.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.in_use_count + self.eviction_count
    }

    /// Bytes held by images during the frame, used or evicted.
    #[must_use]
    pub const fn total_bytes(&self) -> usize {
        self.in_use_bytes + self.eviction_bytes
    }
}

/// One slot in the store.
#[derive(Debug, Default)]
pub struct CacheEntry {
    result: Option<CacheResult>,
    access_count: usize,
    touched_this_frame: bool,
    rasterizing: bool,
}

impl CacheEntry {
    /// Returns the rasterized result, if populated.
    #[must_use]
    pub fn result(&self) -> Option<&CacheResult> {
        self.result.as_ref()
    }

    /// Number of frames this entry was marked seen.
    #[must_use]
    pub fn access_count(&self) -> usize {
        self.access_count
    }

    /// Whether anything touched the entry since the last sweep.
    #[must_use]
    pub fn touched_this_frame(&self) -> bool {
        self.touched_this_frame
    }
}

/// The cross-frame raster cache.
#[derive(Debug)]
pub struct RasterCache {
    config: RasterCacheConfig,
    entries: HashMap<CacheIdentity, CacheEntry>,
    new_entries_this_frame: usize,
    frame_index: u64,
    layer_metrics: RasterCacheMetrics,
    picture_metrics: RasterCacheMetrics,
    tracer: Tracer,
}

impl Default for RasterCache {
    fn default() -> Self {
        Self::new(RasterCacheConfig::new())
    }
}

impl RasterCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: RasterCacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            new_entries_this_frame: 0,
            frame_index: 0,
            layer_metrics: RasterCacheMetrics::default(),
            picture_metrics: RasterCacheMetrics::default(),
            tracer: Tracer::none(),
        }
    }

    /// Installs a trace sink. Events are only delivered with the `trace`
    /// feature enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.tracer = Tracer::new(sink);
    }

    /// Removes the installed trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.tracer.take_sink()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RasterCacheConfig {
        &self.config
    }

    /// Number of frames an item must be seen before it is cached.
    #[must_use]
    pub fn access_threshold(&self) -> usize {
        self.config.access_threshold
    }

    /// Number of sweeps performed so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Entries populated since the last sweep.
    #[must_use]
    pub fn new_entries_this_frame(&self) -> usize {
        self.new_entries_this_frame
    }

    /// Entries that may still be populated this frame.
    #[must_use]
    pub fn remaining_budget(&self) -> usize {
        if self.config.access_threshold == 0 {
            return 0;
        }
        self.config
            .new_entries_per_frame
            .saturating_sub(self.new_entries_this_frame)
    }

    /// Whether another entry may be populated this frame.
    #[must_use]
    pub fn generate_new_cache_in_this_frame(&self) -> bool {
        self.remaining_budget() > 0
    }

    // -- Admission --

    /// Records that `id` was seen under `transform` this frame.
    ///
    /// Creates the entry if needed, marks it touched, and returns its access
    /// count including this call.
    pub fn mark_seen(&mut self, id: CacheKeyId, transform: Affine) -> usize {
        let entry = self
            .entries
            .entry(CacheIdentity::new(id, transform))
            .or_default();
        entry.access_count += 1;
        entry.touched_this_frame = true;
        entry.access_count
    }

    /// Keeps an existing entry alive without counting an access.
    ///
    /// Returns `false` if there is no entry to touch.
    pub fn touch(&mut self, id: CacheKeyId, transform: Affine) -> bool {
        match self.entries.get_mut(&CacheIdentity::new(id, transform)) {
            Some(entry) => {
                entry.touched_this_frame = true;
                true
            }
            None => false,
        }
    }

    /// Returns the access count for `id` under `transform`, or zero.
    #[must_use]
    pub fn access_count(&self, id: CacheKeyId, transform: Affine) -> usize {
        self.entry(id, transform).map_or(0, CacheEntry::access_count)
    }

    /// Returns `true` if the entry for `id` under `transform` holds an image.
    #[must_use]
    pub fn has_result(&self, id: CacheKeyId, transform: Affine) -> bool {
        self.entry(id, transform)
            .is_some_and(|e| e.result.is_some())
    }

    /// Looks up the entry for `id` under `transform`.
    #[must_use]
    pub fn entry(&self, id: CacheKeyId, transform: Affine) -> Option<&CacheEntry> {
        self.entries.get(&CacheIdentity::new(id, transform))
    }

    // -- Population --

    /// Populates the entry for `id` by rasterizing `draw`.
    ///
    /// Returns whether the entry now holds an image. Entries that already
    /// have one return `true` without rasterizing or spending budget. When
    /// the frame budget is spent the call returns `false` and the entry is
    /// left for a later frame.
    ///
    /// `draw` receives a [`PaintContext`] targeting the offscreen surface that
    /// still carries this cache, so nested items can draw from or populate
    /// their own entries.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::MissingEntry`] if `id` was never marked seen
    /// under `params.matrix`, or the error from [`rasterize`] if the target
    /// could not be produced.
    pub fn try_update_cache_entry(
        &mut self,
        id: CacheKeyId,
        params: &RasterizeParams,
        backend: &mut dyn RenderBackend,
        draw: &mut dyn FnMut(&mut PaintContext<'_>),
    ) -> Result<bool, RasterError> {
        let identity = CacheIdentity::new(id, params.matrix);
        match self.entries.get_mut(&identity) {
            None => return Err(RasterError::MissingEntry(id)),
            Some(entry) => {
                entry.touched_this_frame = true;
                if entry.result.is_some() {
                    return Ok(true);
                }
                // Content that paints through its own entry while being
                // rasterized would otherwise recurse.
                if entry.rasterizing {
                    log::trace!("raster cache entry {id:?} is already being rasterized");
                    return Ok(false);
                }
            }
        }

        if !self.generate_new_cache_in_this_frame() {
            log::trace!("raster cache budget spent, deferring {id:?}");
            self.tracer.budget_exhausted(&BudgetExhaustedEvent {
                frame_index: self.frame_index,
                id,
                limit: self.config.new_entries_per_frame,
            });
            return Ok(false);
        }

        let params = RasterizeParams {
            checkerboard: params.checkerboard || self.config.checkerboard,
            ..*params
        };
        self.set_rasterizing(&identity, true);
        let outcome = rasterize(&params, backend, |canvas, backend| {
            let mut nested = PaintContext::new(canvas, backend)
                .with_color_space(params.color_space)
                .with_raster_cache(&mut *self);
            draw(&mut nested);
        });
        self.set_rasterizing(&identity, false);

        let result = match outcome {
            Ok(result) => result,
            Err(error) => {
                log::debug!("failed to populate raster cache entry {id:?}: {error}");
                self.tracer.populate_failed(&PopulateFailedEvent {
                    frame_index: self.frame_index,
                    id,
                    error,
                });
                return Err(error);
            }
        };

        let (width, height) = result.image_dimensions();
        let bytes = result.image_bytes();
        let Some(entry) = self.entries.get_mut(&identity) else {
            return Err(RasterError::MissingEntry(id));
        };
        entry.result = Some(result);
        self.new_entries_this_frame += 1;
        self.tracer.populate(&PopulateEvent {
            frame_index: self.frame_index,
            id,
            width,
            height,
            bytes,
            new_entries_this_frame: self.new_entries_this_frame,
        });
        Ok(true)
    }

    /// Boolean form of [`try_update_cache_entry`](Self::try_update_cache_entry).
    ///
    /// Failures are logged at debug level and reported as `false`.
    pub fn update_cache_entry(
        &mut self,
        id: CacheKeyId,
        params: &RasterizeParams,
        backend: &mut dyn RenderBackend,
        draw: &mut dyn FnMut(&mut PaintContext<'_>),
    ) -> bool {
        match self.try_update_cache_entry(id, params, backend, draw) {
            Ok(populated) => populated,
            Err(RasterError::MissingEntry(id)) => {
                log::debug!("no raster cache entry to populate for {id:?}");
                false
            }
            Err(_) => false,
        }
    }

    // -- Drawing --

    /// Composites the entry for `id` under the canvas's current transform.
    ///
    /// Returns `false` without drawing if there is no entry or it has no
    /// image yet. An existing entry is marked touched either way.
    pub fn draw(&mut self, id: CacheKeyId, canvas: &mut dyn Canvas, paint: Option<&Paint>) -> bool {
        let identity = CacheIdentity::new(id, canvas.transform());
        let Some(entry) = self.entries.get_mut(&identity) else {
            return false;
        };
        entry.touched_this_frame = true;
        match &entry.result {
            Some(result) => {
                result.draw(canvas, paint);
                true
            }
            None => false,
        }
    }

    // -- Frame lifecycle --

    /// Resets the per-frame admission counter.
    pub fn prepare_new_frame(&mut self) {
        self.new_entries_this_frame = 0;
    }

    /// Evicts every entry not touched since the previous sweep, then resets
    /// the touched flags and the admission counter.
    pub fn sweep_after_frame(&mut self) {
        let mut layer = RasterCacheMetrics::default();
        let mut picture = RasterCacheMetrics::default();
        let before = self.entries.len();

        self.entries.retain(|identity, entry| {
            let metrics = if identity.kind().is_layer() {
                &mut layer
            } else {
                &mut picture
            };
            let keep = entry.touched_this_frame;
            if let Some(result) = &entry.result {
                if keep {
                    metrics.in_use_count += 1;
                    metrics.in_use_bytes += result.image_bytes();
                } else {
                    metrics.eviction_count += 1;
                    metrics.eviction_bytes += result.image_bytes();
                }
            }
            entry.touched_this_frame = false;
            keep
        });

        self.layer_metrics = layer;
        self.picture_metrics = picture;
        self.new_entries_this_frame = 0;
        self.tracer.sweep(&SweepEvent {
            frame_index: self.frame_index,
            live_entries: self.entries.len(),
            evicted_entries: before - self.entries.len(),
            layer,
            picture,
        });
        self.frame_index += 1;
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        let evicted_entries = self.entries.len();
        self.entries.clear();
        self.layer_metrics = RasterCacheMetrics::default();
        self.picture_metrics = RasterCacheMetrics::default();
        self.tracer.clear(&ClearEvent {
            frame_index: self.frame_index,
            evicted_entries,
        });
    }

    /// Turns the checkerboard overlay on or off.
    ///
    /// Changing the setting clears the cache so entries are re-rasterized
    /// with the new overlay state.
    pub fn set_checkerboard_cache_images(&mut self, checkerboard: bool) {
        if self.config.checkerboard == checkerboard {
            return;
        }
        self.config.checkerboard = checkerboard;
        self.clear();
    }

    // -- Statistics --

    /// Layer-kind statistics from the most recent sweep.
    #[must_use]
    pub fn layer_metrics(&self) -> &RasterCacheMetrics {
        &self.layer_metrics
    }

    /// Picture-kind statistics from the most recent sweep.
    #[must_use]
    pub fn picture_metrics(&self) -> &RasterCacheMetrics {
        &self.picture_metrics
    }

    /// Number of entries, populated or not.
    #[must_use]
    pub fn cached_entries_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of layer-kind entries, populated or not.
    #[must_use]
    pub fn layer_cached_entries_count(&self) -> usize {
        self.entries.keys().filter(|k| k.kind().is_layer()).count()
    }

    /// Number of picture-kind entries, populated or not.
    #[must_use]
    pub fn picture_cached_entries_count(&self) -> usize {
        self.entries.keys().filter(|k| !k.kind().is_layer()).count()
    }

    /// Bytes held by layer-kind images.
    #[must_use]
    pub fn estimate_layer_cache_bytes(&self) -> usize {
        self.estimate_bytes(true)
    }

    /// Bytes held by picture-kind images.
    #[must_use]
    pub fn estimate_picture_cache_bytes(&self) -> usize {
        self.estimate_bytes(false)
    }

    fn set_rasterizing(&mut self, identity: &CacheIdentity, rasterizing: bool) {
        if let Some(entry) = self.entries.get_mut(identity) {
            entry.rasterizing = rasterizing;
        }
    }

    fn estimate_bytes(&self, layers: bool) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.kind().is_layer() == layers)
            .filter_map(|(_, e)| e.result.as_ref())
            .map(CacheResult::image_bytes)
            .sum()
    }
}
