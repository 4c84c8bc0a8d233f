// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use strata_core::identity::{CacheKeyId, CacheKind};
use strata_core::store::RasterCacheMetrics;
use strata_core::trace::{
    BudgetExhaustedEvent, ClearEvent, PopulateEvent, PopulateFailedEvent, SweepEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its destination.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn kind_name(kind: CacheKind) -> &'static str {
    match kind {
        CacheKind::Layer => "layer",
        CacheKind::Picture => "picture",
        CacheKind::DisplayList => "list",
        CacheKind::LayerChildren => "children",
    }
}

struct Id(CacheKeyId);

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{:x}", kind_name(self.0.kind()), self.0.owner())
    }
}

struct Metrics<'a>(&'a RasterCacheMetrics);

impl std::fmt::Display for Metrics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = self.0;
        write!(
            f,
            "in_use={}/{}B evicted={}/{}B",
            m.in_use_count, m.in_use_bytes, m.eviction_count, m.eviction_bytes,
        )
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_populate(&mut self, e: &PopulateEvent) {
        let _ = writeln!(
            self.writer,
            "[populate] frame={} id={} {}x{} bytes={} new={}",
            e.frame_index,
            Id(e.id),
            e.width,
            e.height,
            e.bytes,
            e.new_entries_this_frame,
        );
    }

    fn on_populate_failed(&mut self, e: &PopulateFailedEvent) {
        let _ = writeln!(
            self.writer,
            "[populate:failed] frame={} id={} {}",
            e.frame_index,
            Id(e.id),
            e.error,
        );
    }

    fn on_budget_exhausted(&mut self, e: &BudgetExhaustedEvent) {
        let _ = writeln!(
            self.writer,
            "[budget] frame={} id={} deferred limit={}",
            e.frame_index,
            Id(e.id),
            e.limit,
        );
    }

    fn on_sweep(&mut self, e: &SweepEvent) {
        let _ = writeln!(
            self.writer,
            "[sweep] frame={} live={} dropped={} layer {} picture {}",
            e.frame_index,
            e.live_entries,
            e.evicted_entries,
            Metrics(&e.layer),
            Metrics(&e.picture),
        );
    }

    fn on_clear(&mut self, e: &ClearEvent) {
        let _ = writeln!(
            self.writer,
            "[clear] frame={} dropped={}",
            e.frame_index, e.evicted_entries,
        );
    }
}
