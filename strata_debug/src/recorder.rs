// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use strata_core::error::RasterError;
use strata_core::identity::{CacheKeyId, CacheKind};
use strata_core::store::RasterCacheMetrics;
use strata_core::trace::{
    BudgetExhaustedEvent, ClearEvent, PopulateEvent, PopulateFailedEvent, SweepEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_POPULATE: u8 = 1;
const TAG_POPULATE_FAILED: u8 = 2;
const TAG_BUDGET_EXHAUSTED: u8 = 3;
const TAG_SWEEP: u8 = 4;
const TAG_CLEAR: u8 = 5;

const ERR_SURFACE_ALLOCATION: u8 = 0;
const ERR_NON_INVERTIBLE: u8 = 1;
const ERR_EMPTY_BOUNDS: u8 = 2;
const ERR_NON_FINITE_BOUNDS: u8 = 3;
const ERR_MISSING_ENTRY: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_usize(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    fn write_id(&mut self, id: CacheKeyId) {
        self.write_u64(id.owner());
        self.write_u8(match id.kind() {
            CacheKind::Layer => 0,
            CacheKind::Picture => 1,
            CacheKind::DisplayList => 2,
            CacheKind::LayerChildren => 3,
        });
    }

    // Every error occupies the same width so records stay fixed-size.
    fn write_error(&mut self, error: RasterError) {
        let (code, width, height, id) = match error {
            RasterError::SurfaceAllocation { width, height } => {
                (ERR_SURFACE_ALLOCATION, width, height, None)
            }
            RasterError::NonInvertibleTransform => (ERR_NON_INVERTIBLE, 0, 0, None),
            RasterError::EmptyBounds => (ERR_EMPTY_BOUNDS, 0, 0, None),
            RasterError::NonFiniteBounds => (ERR_NON_FINITE_BOUNDS, 0, 0, None),
            RasterError::MissingEntry(id) => (ERR_MISSING_ENTRY, 0, 0, Some(id)),
        };
        self.write_u8(code);
        self.write_u32(width);
        self.write_u32(height);
        self.write_id(id.unwrap_or(CacheKeyId::new(0, CacheKind::Layer)));
    }

    fn write_metrics(&mut self, m: &RasterCacheMetrics) {
        self.write_usize(m.eviction_count);
        self.write_usize(m.eviction_bytes);
        self.write_usize(m.in_use_count);
        self.write_usize(m.in_use_bytes);
    }
}

impl TraceSink for RecorderSink {
    fn on_populate(&mut self, e: &PopulateEvent) {
        self.write_u8(TAG_POPULATE);
        self.write_u64(e.frame_index);
        self.write_id(e.id);
        self.write_u32(e.width);
        self.write_u32(e.height);
        self.write_usize(e.bytes);
        self.write_usize(e.new_entries_this_frame);
    }

    fn on_populate_failed(&mut self, e: &PopulateFailedEvent) {
        self.write_u8(TAG_POPULATE_FAILED);
        self.write_u64(e.frame_index);
        self.write_id(e.id);
        self.write_error(e.error);
    }

    fn on_budget_exhausted(&mut self, e: &BudgetExhaustedEvent) {
        self.write_u8(TAG_BUDGET_EXHAUSTED);
        self.write_u64(e.frame_index);
        self.write_id(e.id);
        self.write_usize(e.limit);
    }

    fn on_sweep(&mut self, e: &SweepEvent) {
        self.write_u8(TAG_SWEEP);
        self.write_u64(e.frame_index);
        self.write_usize(e.live_entries);
        self.write_usize(e.evicted_entries);
        self.write_metrics(&e.layer);
        self.write_metrics(&e.picture);
    }

    fn on_clear(&mut self, e: &ClearEvent) {
        self.write_u8(TAG_CLEAR);
        self.write_u64(e.frame_index);
        self.write_usize(e.evicted_entries);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A [`PopulateEvent`].
    Populate(PopulateEvent),
    /// A [`PopulateFailedEvent`].
    PopulateFailed(PopulateFailedEvent),
    /// A [`BudgetExhaustedEvent`].
    BudgetExhausted(BudgetExhaustedEvent),
    /// A [`SweepEvent`].
    Sweep(SweepEvent),
    /// A [`ClearEvent`].
    Clear(ClearEvent),
}

impl RecordedEvent {
    /// Returns the frame the event belongs to.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        match self {
            Self::Populate(e) => e.frame_index,
            Self::PopulateFailed(e) => e.frame_index,
            Self::BudgetExhausted(e) => e.frame_index,
            Self::Sweep(e) => e.frame_index,
            Self::Clear(e) => e.frame_index,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes: [u8; N] = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_usize(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_id(&mut self) -> Option<CacheKeyId> {
        let owner = self.read_u64()?;
        let kind = match self.read_u8()? {
            0 => CacheKind::Layer,
            1 => CacheKind::Picture,
            2 => CacheKind::DisplayList,
            3 => CacheKind::LayerChildren,
            _ => return None,
        };
        Some(CacheKeyId::new(owner, kind))
    }

    fn read_error(&mut self) -> Option<RasterError> {
        let code = self.read_u8()?;
        let width = self.read_u32()?;
        let height = self.read_u32()?;
        let id = self.read_id()?;
        Some(match code {
            ERR_SURFACE_ALLOCATION => RasterError::SurfaceAllocation { width, height },
            ERR_NON_INVERTIBLE => RasterError::NonInvertibleTransform,
            ERR_EMPTY_BOUNDS => RasterError::EmptyBounds,
            ERR_NON_FINITE_BOUNDS => RasterError::NonFiniteBounds,
            ERR_MISSING_ENTRY => RasterError::MissingEntry(id),
            _ => return None,
        })
    }

    fn read_metrics(&mut self) -> Option<RasterCacheMetrics> {
        Some(RasterCacheMetrics {
            eviction_count: self.read_usize()?,
            eviction_bytes: self.read_usize()?,
            in_use_count: self.read_usize()?,
            in_use_bytes: self.read_usize()?,
        })
    }

    fn decode_populate(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Populate(PopulateEvent {
            frame_index: self.read_u64()?,
            id: self.read_id()?,
            width: self.read_u32()?,
            height: self.read_u32()?,
            bytes: self.read_usize()?,
            new_entries_this_frame: self.read_usize()?,
        }))
    }

    fn decode_populate_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PopulateFailed(PopulateFailedEvent {
            frame_index: self.read_u64()?,
            id: self.read_id()?,
            error: self.read_error()?,
        }))
    }

    fn decode_budget_exhausted(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BudgetExhausted(BudgetExhaustedEvent {
            frame_index: self.read_u64()?,
            id: self.read_id()?,
            limit: self.read_usize()?,
        }))
    }

    fn decode_sweep(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Sweep(SweepEvent {
            frame_index: self.read_u64()?,
            live_entries: self.read_usize()?,
            evicted_entries: self.read_usize()?,
            layer: self.read_metrics()?,
            picture: self.read_metrics()?,
        }))
    }

    fn decode_clear(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Clear(ClearEvent {
            frame_index: self.read_u64()?,
            evicted_entries: self.read_usize()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_POPULATE => self.decode_populate(),
            TAG_POPULATE_FAILED => self.decode_populate_failed(),
            TAG_BUDGET_EXHAUSTED => self.decode_budget_exhausted(),
            TAG_SWEEP => self.decode_sweep(),
            TAG_CLEAR => self.decode_clear(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
