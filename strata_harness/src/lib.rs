// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable cache-efficiency metrics and grading for demo harnesses.
//!
//! A harness counts paint outcomes with a [`FrameTally`], closes each frame
//! with [`FrameTally::finish`] (which also sweeps the cache), and feeds the
//! resulting [`CacheSample`] to an [`EfficiencyTracker`] for a rolling
//! [`EfficiencyReport`].

#![no_std]

extern crate alloc;

use alloc::string::String;
use strata_core::store::{RasterCache, RasterCacheMetrics};

/// Per-frame metrics sample fed into [`EfficiencyTracker::observe`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheSample {
    /// Items that went through the cached paint path this frame.
    pub painted: u32,
    /// How many of those drew a cached image.
    pub cached_draws: u32,
    /// Entries populated this frame.
    pub populated: usize,
    /// Image bytes evicted by the sweep that closed the frame.
    pub evicted_bytes: usize,
    /// Image bytes resident after that sweep.
    pub resident_bytes: usize,
}

impl CacheSample {
    /// Fills the byte counters from the layer and picture metrics of a sweep.
    #[must_use]
    pub const fn with_metrics(
        mut self,
        layer: &RasterCacheMetrics,
        picture: &RasterCacheMetrics,
    ) -> Self {
        self.evicted_bytes = layer.eviction_bytes + picture.eviction_bytes;
        self.resident_bytes = layer.in_use_bytes + picture.in_use_bytes;
        self
    }
}

/// Counts paint outcomes during one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameTally {
    painted: u32,
    cached_draws: u32,
}

impl FrameTally {
    /// Creates an empty tally.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            painted: 0,
            cached_draws: 0,
        }
    }

    /// Records one paint; `cached` is what the item's paint call returned.
    pub fn record(&mut self, cached: bool) {
        self.painted = self.painted.saturating_add(1);
        if cached {
            self.cached_draws = self.cached_draws.saturating_add(1);
        }
    }

    /// Sweeps `cache` to close the frame and returns the frame's sample.
    ///
    /// The tally is reset for the next frame.
    pub fn finish(&mut self, cache: &mut RasterCache) -> CacheSample {
        let populated = cache.new_entries_this_frame();
        cache.sweep_after_frame();
        let sample = CacheSample {
            painted: self.painted,
            cached_draws: self.cached_draws,
            populated,
            ..CacheSample::default()
        }
        .with_metrics(cache.layer_metrics(), cache.picture_metrics());
        *self = Self::new();
        sample
    }
}

/// Letter grade for cache efficiency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EfficiencyGrade {
    /// Nearly everything is drawn from the cache with little churn.
    A,
    /// Mostly cached with moderate churn.
    B,
    /// Cache helps but misses or churns often.
    C,
    /// The cache is mostly overhead.
    D,
}

impl EfficiencyGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`EfficiencyTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct EfficiencyReport {
    /// Current grade.
    pub grade: EfficiencyGrade,
    /// Cached draws per 1000 paints, over all observed frames.
    pub hit_rate_per_1000: f64,
    /// Evicted bytes over resident bytes, over the tracked window.
    pub churn_ratio: f64,
    /// Total frames observed.
    pub total_frames: u64,
    /// Total entries populated.
    pub total_populated: u64,
}

/// Rolling efficiency tracker with fixed-size resident-bytes history.
///
/// `N` is the window length in frames and must be at least 1;
/// `EfficiencyTracker::<0>::new()` fails to compile.
#[derive(Debug)]
pub struct EfficiencyTracker<const N: usize> {
    resident: [usize; N],
    evicted: [usize; N],
    cursor: usize,
    total_frames: u64,
    total_painted: u64,
    total_cached: u64,
    total_populated: u64,
}

impl<const N: usize> Default for EfficiencyTracker<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EfficiencyTracker<N> {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(N > 0, "EfficiencyTracker needs a window of at least one frame") };
        Self {
            resident: [0; N],
            evicted: [0; N],
            cursor: 0,
            total_frames: 0,
            total_painted: 0,
            total_cached: 0,
            total_populated: 0,
        }
    }

    /// Observes one frame and returns an updated report.
    #[must_use]
    pub fn observe(&mut self, sample: CacheSample) -> EfficiencyReport {
        self.total_frames = self.total_frames.saturating_add(1);
        self.total_painted = self.total_painted.saturating_add(u64::from(sample.painted));
        self.total_cached = self
            .total_cached
            .saturating_add(u64::from(sample.cached_draws));
        self.total_populated = self
            .total_populated
            .saturating_add(sample.populated as u64);
        self.resident[self.cursor % N] = sample.resident_bytes;
        self.evicted[self.cursor % N] = sample.evicted_bytes;
        self.cursor = (self.cursor + 1) % N;

        let hit_rate = if self.total_painted == 0 {
            0.0
        } else {
            self.total_cached as f64 * 1000.0 / self.total_painted as f64
        };
        let churn = self.churn_ratio();

        EfficiencyReport {
            grade: grade_for(hit_rate, churn),
            hit_rate_per_1000: hit_rate,
            churn_ratio: churn,
            total_frames: self.total_frames,
            total_populated: self.total_populated,
        }
    }

    fn churn_ratio(&self) -> f64 {
        let evicted: usize = self.evicted.iter().sum();
        let resident: usize = self.resident.iter().sum();
        match (evicted, resident) {
            (0, _) => 0.0,
            (_, 0) => f64::INFINITY,
            (e, r) => e as f64 / r as f64,
        }
    }

    /// Returns ring-buffer resident bytes oldest→newest.
    #[must_use]
    pub fn resident_history(&self) -> [usize; N] {
        let mut out = [0; N];
        let mut i = 0;
        while i < N {
            out[i] = self.resident[(self.cursor + i) % N];
            i += 1;
        }
        out
    }

    /// Returns an ASCII sparkline over `resident_history()`, scaled to
    /// `max_bytes`.
    #[must_use]
    pub fn sparkline_ascii(&self, max_bytes: usize) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity(N);
        for v in self.resident_history() {
            let t = if max_bytes == 0 {
                0.0
            } else {
                v.min(max_bytes) as f64 / max_bytes as f64
            };
            #[expect(
                clippy::cast_possible_truncation,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level] as char);
        }
        out
    }
}

fn grade_for(hit_rate_per_1000: f64, churn_ratio: f64) -> EfficiencyGrade {
    if hit_rate_per_1000 >= 900.0 && churn_ratio < 0.05 {
        EfficiencyGrade::A
    } else if hit_rate_per_1000 >= 700.0 && churn_ratio < 0.15 {
        EfficiencyGrade::B
    } else if hit_rate_per_1000 >= 400.0 && churn_ratio < 0.35 {
        EfficiencyGrade::C
    } else {
        EfficiencyGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady(painted: u32, cached_draws: u32) -> CacheSample {
        CacheSample {
            painted,
            cached_draws,
            populated: 0,
            evicted_bytes: 0,
            resident_bytes: 4000,
        }
    }

    #[test]
    fn hit_rate_accumulates() {
        let mut t = EfficiencyTracker::<8>::new();
        let mut report = t.observe(steady(10, 0));
        for _ in 0..9 {
            report = t.observe(steady(10, 10));
        }
        assert!((report.hit_rate_per_1000 - 900.0).abs() < 1e-6);
        assert_eq!(report.total_frames, 10);
        assert_eq!(report.grade, EfficiencyGrade::A);
    }

    #[test]
    fn churn_lowers_the_grade() {
        let mut t = EfficiencyTracker::<4>::new();
        let calm = t.observe(steady(10, 10));
        assert_eq!(calm.grade, EfficiencyGrade::A);

        let churny = t.observe(CacheSample {
            evicted_bytes: 1000,
            ..steady(10, 10)
        });
        // 1000 evicted over 8000 resident.
        assert!((churny.churn_ratio - 0.125).abs() < 1e-9);
        assert_eq!(churny.grade, EfficiencyGrade::B);
    }

    #[test]
    fn nothing_painted_grades_d() {
        let mut t = EfficiencyTracker::<4>::new();
        let r = t.observe(CacheSample::default());
        assert_eq!(r.hit_rate_per_1000, 0.0);
        assert_eq!(r.grade, EfficiencyGrade::D);
    }

    #[test]
    fn sparkline_tracks_history_in_order() {
        let mut t = EfficiencyTracker::<4>::new();
        for bytes in [0, 300, 600, 900] {
            let _ = t.observe(CacheSample {
                resident_bytes: bytes,
                ..CacheSample::default()
            });
        }
        assert_eq!(t.resident_history(), [0, 300, 600, 900]);
        assert_eq!(t.sparkline_ascii(900), " -*@");
    }

    #[test]
    fn single_frame_window_keeps_latest_sample() {
        let mut t = EfficiencyTracker::<1>::default();
        for bytes in [100, 400] {
            let _ = t.observe(CacheSample {
                painted: 2,
                cached_draws: 1,
                resident_bytes: bytes,
                evicted_bytes: 40,
                ..CacheSample::default()
            });
        }
        assert_eq!(t.resident_history(), [400]);
        assert!((t.churn_ratio() - 0.1).abs() < 1e-9);
        assert_eq!(t.sparkline_ascii(400), "@");
    }

    #[test]
    fn tally_resets_after_finish() {
        let mut cache = RasterCache::default();
        let mut tally = FrameTally::new();
        tally.record(true);
        tally.record(false);
        let sample = tally.finish(&mut cache);
        assert_eq!(sample.painted, 2);
        assert_eq!(sample.cached_draws, 1);
        assert_eq!(cache.frame_index(), 1);
        assert_eq!(tally.finish(&mut cache).painted, 0);
    }
}
