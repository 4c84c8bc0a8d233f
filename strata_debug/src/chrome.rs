// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Cache events carry no wall-clock time, so each frame is placed on a
//! synthetic timeline `frame_interval_us` apart. Sweeps become counter tracks
//! for entry count and resident bytes; everything else is an instant event.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Frame spacing for a 60 Hz display, in microseconds.
pub const FRAME_INTERVAL_60HZ_US: f64 = 16_666.667;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], frame_interval_us: f64, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        let ts = recorded.frame_index() as f64 * frame_interval_us;
        match recorded {
            RecordedEvent::Populate(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Populate",
                    "cat": "RasterCache",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "id": format!("{:?}", e.id),
                        "width": e.width,
                        "height": e.height,
                        "bytes": e.bytes,
                    }
                }));
            }
            RecordedEvent::PopulateFailed(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "PopulateFailed",
                    "cat": "RasterCache",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "id": format!("{:?}", e.id),
                        "error": e.error.to_string(),
                    }
                }));
            }
            RecordedEvent::BudgetExhausted(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "BudgetExhausted",
                    "cat": "RasterCache",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "id": format!("{:?}", e.id),
                        "limit": e.limit,
                    }
                }));
            }
            RecordedEvent::Sweep(e) => {
                events.push(json!({
                    "ph": "C",
                    "name": "Entries",
                    "cat": "RasterCache",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "layer": e.layer.in_use_count,
                        "picture": e.picture.in_use_count,
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "ResidentBytes",
                    "cat": "RasterCache",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "layer": e.layer.in_use_bytes,
                        "picture": e.picture.in_use_bytes,
                    }
                }));
                if e.evicted_entries > 0 {
                    events.push(json!({
                        "ph": "i",
                        "name": "Evict",
                        "cat": "RasterCache",
                        "ts": ts,
                        "pid": 0,
                        "tid": 0,
                        "s": "p",
                        "args": {
                            "frame_index": e.frame_index,
                            "entries": e.evicted_entries,
                            "bytes": e.layer.eviction_bytes + e.picture.eviction_bytes,
                        }
                    }));
                }
            }
            RecordedEvent::Clear(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Clear",
                    "cat": "RasterCache",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": e.frame_index,
                        "entries": e.evicted_entries,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}
