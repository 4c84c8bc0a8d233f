// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cross-frame raster cache for retained scene graphs.
//!
//! `strata_core` decides, frame by frame and per renderable unit, whether a
//! previously rasterized bitmap can stand in for re-executing that unit's
//! vector draw commands. It is `no_std` compatible (with `alloc`) and confined
//! to a single rendering thread.
//!
//! # Architecture
//!
//! Each frame runs three passes over the scene graph:
//!
//! ```text
//!   preroll (descent)            preroll (ascent)              paint
//!   CacheableItem::setup ──► CacheableItem::finalize ──► CacheableItem::draw
//!           │                        │                          │ miss
//!           ▼                        ▼                          ▼
//!   PrerollContext           RasterCache::mark_seen   try_to_prepare_raster_cache
//!                            ComplexityEstimator      RasterCache::update_cache_entry
//!                                                              │
//!                 ┌────────────────────────────────────────────┘
//!                 ▼
//!   RasterCache::sweep_after_frame ──► evict untouched entries
//! ```
//!
//! **[`identity`]**: Cache keys. An owner id and a kind, plus the rendering
//! transform with its whole-pixel translation discarded.
//!
//! **[`store`]**: [`RasterCache`](store::RasterCache), the cross-frame map
//! from identity to entry with a per-frame admission budget and a
//! generational sweep.
//!
//! **[`item`]**: The transient per-frame [`CacheableItem`](item::CacheableItem)
//! state machine, its layer, display-list and picture variants, and the
//! [`CacheableLayer`](item::CacheableLayer) interface scene-graph containers
//! implement.
//!
//! **[`complexity`]**: Cost estimators that decide whether unproven content is
//! worth caching at all.
//!
//! **[`transform`]**: The invariant-transform rule and device-space bounds
//! helpers.
//!
//! **[`result`]**: Rasterized images and how they are redrawn.
//!
//! **[`backend`]**: The traits a rendering backend implements (canvas,
//! offscreen surface, snapshot image).
//!
//! **[`context`]**: Traversal contexts handed to items during preroll and
//! paint.
//!
//! **[`display_list`]**: The draw-command content that leaf items cache.
//!
//! **[`recording`]**: A headless backend that records draw calls, for tests and
//! harnesses.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! cache instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod complexity;
pub mod context;
pub mod display_list;
pub mod error;
pub mod identity;
pub mod item;
pub mod paint;
pub mod recording;
pub mod result;
pub mod store;
pub mod trace;
pub mod transform;
