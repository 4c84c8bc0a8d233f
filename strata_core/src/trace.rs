// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the raster cache.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`RasterCache`](crate::store::RasterCache) calls as entries are populated,
//! throttled and evicted. All method bodies default to no-ops, so implementing
//! only the events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use alloc::boxed::Box;

use crate::error::RasterError;
use crate::identity::CacheKeyId;
use crate::store::RasterCacheMetrics;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an entry receives its rasterized image.
#[derive(Clone, Copy, Debug)]
pub struct PopulateEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which unit was rasterized.
    pub id: CacheKeyId,
    /// Image width in device pixels.
    pub width: u32,
    /// Image height in device pixels.
    pub height: u32,
    /// Approximate image size in bytes.
    pub bytes: usize,
    /// New entries populated this frame, including this one.
    pub new_entries_this_frame: usize,
}

/// Emitted when rasterizing an entry failed.
#[derive(Clone, Copy, Debug)]
pub struct PopulateFailedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which unit failed.
    pub id: CacheKeyId,
    /// Why it failed.
    pub error: RasterError,
}

/// Emitted when population is skipped because the frame budget is spent.
#[derive(Clone, Copy, Debug)]
pub struct BudgetExhaustedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which unit was deferred.
    pub id: CacheKeyId,
    /// Per-frame limit on new entries.
    pub limit: usize,
}

/// Emitted at the end of every [`sweep_after_frame`](crate::store::RasterCache::sweep_after_frame).
#[derive(Clone, Copy, Debug)]
pub struct SweepEvent {
    /// Frame counter of the frame just swept.
    pub frame_index: u64,
    /// Entries remaining after the sweep.
    pub live_entries: usize,
    /// Entries removed by the sweep, with or without an image.
    pub evicted_entries: usize,
    /// Layer-kind image statistics for the frame.
    pub layer: RasterCacheMetrics,
    /// Picture-kind image statistics for the frame.
    pub picture: RasterCacheMetrics,
}

/// Emitted when the whole store is cleared.
#[derive(Clone, Copy, Debug)]
pub struct ClearEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Entries dropped.
    pub evicted_entries: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the raster cache.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after an entry is populated.
    fn on_populate(&mut self, e: &PopulateEvent) {
        _ = e;
    }

    /// Called when population fails.
    fn on_populate_failed(&mut self, e: &PopulateFailedEvent) {
        _ = e;
    }

    /// Called when population is deferred by the frame budget.
    fn on_budget_exhausted(&mut self, e: &BudgetExhaustedEvent) {
        _ = e;
    }

    /// Called after each end-of-frame sweep.
    fn on_sweep(&mut self, e: &SweepEvent) {
        _ = e;
    }

    /// Called when the store is cleared.
    fn on_clear(&mut self, e: &ClearEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Owner of an optional boxed [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing and
/// installed sinks are dropped immediately. When **on**, each method checks
/// the inner `Option` (one branch) before dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            drop(sink);
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Removes and returns the installed sink, if any.
    #[inline]
    pub fn take_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        #[cfg(feature = "trace")]
        {
            self.sink.take()
        }
        #[cfg(not(feature = "trace"))]
        {
            None
        }
    }

    /// Emits a [`PopulateEvent`].
    #[inline]
    pub fn populate(&mut self, e: &PopulateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_populate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PopulateFailedEvent`].
    #[inline]
    pub fn populate_failed(&mut self, e: &PopulateFailedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_populate_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BudgetExhaustedEvent`].
    #[inline]
    pub fn budget_exhausted(&mut self, e: &BudgetExhaustedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_budget_exhausted(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SweepEvent`].
    #[inline]
    pub fn sweep(&mut self, e: &SweepEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_sweep(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ClearEvent`].
    #[inline]
    pub fn clear(&mut self, e: &ClearEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_clear(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sweep() -> SweepEvent {
        SweepEvent {
            frame_index: 3,
            live_entries: 2,
            evicted_entries: 1,
            layer: RasterCacheMetrics::default(),
            picture: RasterCacheMetrics {
                eviction_count: 1,
                eviction_bytes: 400,
                in_use_count: 2,
                in_use_bytes: 800,
            },
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_sweep(&sample_sweep());
        sink.on_clear(&ClearEvent {
            frame_index: 0,
            evicted_entries: 0,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.sweep(&sample_sweep());
        assert!(tracer.take_sink().is_none());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::rc::Rc;
        use alloc::vec::Vec;
        use core::cell::RefCell;

        use crate::identity::CacheKind;

        struct RecordingSink {
            frames: Rc<RefCell<Vec<u64>>>,
        }
        impl TraceSink for RecordingSink {
            fn on_populate(&mut self, e: &PopulateEvent) {
                self.frames.borrow_mut().push(e.frame_index);
            }
        }

        let frames = Rc::new(RefCell::new(Vec::new()));
        let mut tracer = Tracer::new(Box::new(RecordingSink {
            frames: Rc::clone(&frames),
        }));
        tracer.populate(&PopulateEvent {
            frame_index: 9,
            id: CacheKeyId::new(1, CacheKind::DisplayList),
            width: 4,
            height: 4,
            bytes: 64,
            new_entries_this_frame: 1,
        });
        assert_eq!(*frames.borrow(), &[9]);
        assert!(tracer.take_sink().is_some());
    }
}
