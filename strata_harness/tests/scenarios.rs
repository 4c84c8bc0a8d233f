// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-frame cache scenarios graded end to end.

use kurbo::{Affine, Rect, Vec2};
use strata_core::backend::{BackendKind, Canvas, RenderBackend};
use strata_core::complexity::estimator_for_backend;
use strata_core::context::{PaintContext, PrerollContext};
use strata_core::display_list::{DisplayList, DrawOp};
use strata_core::item::{
    CacheState, CacheableItem, CacheableLayer, DisplayListCacheableItem, LayerCacheableItem,
    paint_with_cache,
};
use strata_core::recording::{RecordingBackend, RecordingCanvas};
use strata_core::store::{RasterCache, RasterCacheConfig};
use strata_harness::{CacheSample, EfficiencyGrade, EfficiencyReport, EfficiencyTracker, FrameTally};

const VIEWPORT: Rect = Rect::new(0.0, 0.0, 200.0, 400.0);
const ROW: Rect = Rect::new(0.0, 0.0, 50.0, 20.0);
const ROW_BYTES: usize = 50 * 20 * 4;

fn rows(count: u64) -> Vec<DisplayList> {
    (0..count)
        .map(|id| DisplayList::new(id + 1, ROW, vec![DrawOp::DrawRect(ROW); 8]))
        .collect()
}

/// A vertical list of rows under a shared scroll offset.
struct Scene {
    cache: RasterCache,
    backend: RecordingBackend,
    tally: FrameTally,
}

impl Scene {
    fn new(config: RasterCacheConfig) -> Self {
        Self {
            cache: RasterCache::new(config),
            backend: RecordingBackend::new(BackendKind::Software),
            tally: FrameTally::new(),
        }
    }

    fn frame(&mut self, lists: &[DisplayList], scroll: f64) -> CacheSample {
        let estimator = estimator_for_backend(self.backend.kind());
        let matrix = Affine::translate(Vec2::new(0.0, scroll));
        let mut items: Vec<_> = lists
            .iter()
            .enumerate()
            .map(|(i, list)| {
                DisplayListCacheableItem::new(list, Vec2::new(0.0, 30.0 * i as f64), false, false)
            })
            .collect();

        self.cache.prepare_new_frame();
        {
            let mut ctx = PrerollContext::new(&*estimator, VIEWPORT)
                .with_backend_kind(self.backend.kind())
                .with_raster_cache(&mut self.cache);
            for item in &mut items {
                item.setup(&mut ctx, matrix);
                item.finalize(&mut ctx);
            }
        }

        let mut canvas = RecordingCanvas::new(VIEWPORT);
        canvas.set_transform(matrix);
        {
            let mut ctx = PaintContext::new(&mut canvas, &mut self.backend)
                .with_raster_cache(&mut self.cache);
            for item in &items {
                self.tally.record(item.paint(&mut ctx, None));
            }
        }
        assert_eq!(canvas.save_depth(), 0);
        self.tally.finish(&mut self.cache)
    }
}

fn run<const N: usize>(
    scene: &mut Scene,
    tracker: &mut EfficiencyTracker<N>,
    lists: &[DisplayList],
    scrolls: impl IntoIterator<Item = f64>,
) -> (Vec<CacheSample>, Option<EfficiencyReport>) {
    let mut samples = Vec::new();
    let mut report = None;
    for scroll in scrolls {
        let sample = scene.frame(lists, scroll);
        report = Some(tracker.observe(sample));
        samples.push(sample);
    }
    (samples, report)
}

#[test]
fn whole_pixel_scrolling_warms_up_and_stays_cached() {
    let lists = rows(5);
    let mut scene = Scene::new(RasterCacheConfig::new());
    let mut tracker = EfficiencyTracker::<16>::new();
    let (samples, report) = run(
        &mut scene,
        &mut tracker,
        &lists,
        (0..10).map(|f| f64::from(f) * 7.0),
    );
    let report = report.unwrap();

    let cached: Vec<_> = samples.iter().map(|s| s.cached_draws).collect();
    // Two frames below the threshold, then the budget admits three rows and
    // the rest a frame later. Each row is first drawn cached the frame after
    // it is populated.
    assert_eq!(cached, [0, 0, 0, 3, 5, 5, 5, 5, 5, 5]);
    let populated: Vec<_> = samples.iter().map(|s| s.populated).collect();
    assert_eq!(populated, [0, 0, 3, 2, 0, 0, 0, 0, 0, 0]);

    assert_eq!(scene.backend.surfaces_allocated(), 5);
    assert_eq!(samples[9].resident_bytes, 5 * ROW_BYTES);
    assert!((report.hit_rate_per_1000 - 660.0).abs() < 1e-6);
    assert_eq!(report.grade, EfficiencyGrade::C);
    assert_eq!(report.total_populated, 5);
}

#[test]
fn whole_pixel_scrolling_at_a_tenth_pixel_phase_warms_up() {
    let lists = rows(5);
    let mut scene = Scene::new(RasterCacheConfig::new());
    let mut tracker = EfficiencyTracker::<16>::new();
    let (samples, _) = run(
        &mut scene,
        &mut tracker,
        &lists,
        (0..10).map(|f| 0.1 + f64::from(f) * 7.0),
    );

    let cached: Vec<_> = samples.iter().map(|s| s.cached_draws).collect();
    assert_eq!(cached, [0, 0, 0, 3, 5, 5, 5, 5, 5, 5]);
    assert_eq!(scene.backend.surfaces_allocated(), 5);
    assert_eq!(scene.cache.cached_entries_count(), 5);
}

#[test]
fn fractional_scrolling_never_warms_up() {
    let lists = rows(3);
    let mut scene = Scene::new(RasterCacheConfig::new());
    let mut tracker = EfficiencyTracker::<8>::new();
    // Alternating half-pixel phase gives a new key every frame.
    let (samples, report) = run(
        &mut scene,
        &mut tracker,
        &lists,
        (0..8).map(|f| f64::from(f) * 2.5),
    );

    assert!(samples.iter().all(|s| s.cached_draws == 0));
    assert_eq!(scene.backend.surfaces_allocated(), 0);
    assert_eq!(report.unwrap().grade, EfficiencyGrade::D);
}

#[test]
fn budget_spreads_population_over_frames() {
    let lists = rows(10);
    let mut scene = Scene::new(RasterCacheConfig::new().with_access_threshold(1));
    let mut tracker = EfficiencyTracker::<8>::new();
    let (samples, _) = run(&mut scene, &mut tracker, &lists, [0.0; 5]);

    let populated: Vec<_> = samples.iter().map(|s| s.populated).collect();
    assert_eq!(populated, [3, 3, 3, 1, 0]);
    let cached: Vec<_> = samples.iter().map(|s| s.cached_draws).collect();
    assert_eq!(cached, [0, 3, 6, 9, 10]);
    assert_eq!(scene.cache.picture_cached_entries_count(), 10);
}

#[test]
fn removed_content_is_evicted_on_the_next_sweep() {
    let lists = rows(4);
    let mut scene = Scene::new(RasterCacheConfig::new().with_access_threshold(1));
    let mut tracker = EfficiencyTracker::<8>::new();
    let (warm, _) = run(&mut scene, &mut tracker, &lists, [0.0; 2]);
    assert_eq!(warm[1].resident_bytes, 4 * ROW_BYTES);

    // Only the first row remains in the scene.
    let (after, report) = run(&mut scene, &mut tracker, &lists[..1], [0.0]);
    assert_eq!(after[0].evicted_bytes, 3 * ROW_BYTES);
    assert_eq!(after[0].resident_bytes, ROW_BYTES);
    assert_eq!(scene.cache.cached_entries_count(), 1);
    assert!(report.unwrap().churn_ratio > 0.0);
}

#[test]
fn rows_scrolled_offscreen_survive_and_return_cached() {
    let lists = rows(2);
    let mut scene = Scene::new(RasterCacheConfig::new().with_access_threshold(1));
    let mut tracker = EfficiencyTracker::<8>::new();
    run(&mut scene, &mut tracker, &lists, [0.0]);
    assert_eq!(scene.backend.surfaces_allocated(), 2);

    // Far enough that every row is culled, then back.
    let (samples, _) = run(&mut scene, &mut tracker, &lists, [1000.0, 0.0]);
    assert_eq!(samples[0].cached_draws, 0);
    assert_eq!(samples[0].resident_bytes, 2 * ROW_BYTES);
    assert_eq!(samples[1].cached_draws, 2);
    assert_eq!(scene.backend.surfaces_allocated(), 2);
}

struct Wrapper {
    id: u64,
    children: Vec<DisplayList>,
}

impl CacheableLayer for Wrapper {
    fn unique_id(&self) -> u64 {
        self.id
    }

    fn paint_bounds(&self) -> Rect {
        self.children
            .iter()
            .map(DisplayList::bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    fn child_ids(&self) -> Vec<u64> {
        self.children.iter().map(DisplayList::unique_id).collect()
    }

    fn paint(&self, ctx: &mut PaintContext<'_>) {
        ctx.canvas.draw_op(&DrawOp::SaveLayer { bounds: None });
        self.paint_children(ctx);
        ctx.canvas.draw_op(&DrawOp::Restore);
    }

    fn paint_children(&self, ctx: &mut PaintContext<'_>) {
        for child in &self.children {
            child.render_to(&mut *ctx.canvas);
        }
    }
}

#[test]
fn animated_wrapper_reuses_its_children() {
    let mut cache = RasterCache::default();
    let mut backend = RecordingBackend::default();
    let mut tally = FrameTally::new();
    let mut tracker = EfficiencyTracker::<8>::new();
    let estimator = estimator_for_backend(backend.kind());
    let mut states = Vec::new();
    let mut report = None;

    for frame in 0..6 {
        // The wrapper is rebuilt with a fresh id every frame.
        let wrapper = Wrapper {
            id: 1000 + frame,
            children: rows(3),
        };
        let mut item = LayerCacheableItem::new(&wrapper).with_children_caching(true);
        cache.prepare_new_frame();
        {
            let mut ctx = PrerollContext::new(&*estimator, VIEWPORT).with_raster_cache(&mut cache);
            item.setup(&mut ctx, Affine::IDENTITY);
            item.finalize(&mut ctx);
        }
        states.push(item.cache_state());

        let mut canvas = RecordingCanvas::new(VIEWPORT);
        let mut ctx = PaintContext::new(&mut canvas, &mut backend).with_raster_cache(&mut cache);
        let cached = paint_with_cache(&item, &mut ctx, None, |ctx| wrapper.paint(ctx));
        tally.record(cached);
        report = Some(tracker.observe(tally.finish(&mut cache)));
    }

    assert_eq!(
        states,
        [
            CacheState::None,
            CacheState::None,
            CacheState::Children,
            CacheState::Children,
            CacheState::Children,
            CacheState::Children,
        ]
    );
    assert_eq!(backend.surfaces_allocated(), 1);
    assert!((report.unwrap().hit_rate_per_1000 - 500.0).abs() < 1e-6);
}
