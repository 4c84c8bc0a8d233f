// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterization cost estimates for content with no access history.
//!
//! Before an item has been seen often enough to prove it is stable, the cache
//! asks a [`ComplexityEstimator`] whether the content is even expensive enough
//! to be worth an offscreen target. Scores are in calibrated units where
//! roughly 100 units is 0.0005 ms of rasterization on a reference device.
//!
//! Estimators are plain values passed into the
//! [`PrerollContext`](crate::context::PrerollContext) at frame start.
//! [`estimator_for_backend`] picks the default table for a backend family.
//!
//! Both built-in estimators are a single linear walk over the commands using
//! integer arithmetic, so they stay cheap enough to run every frame.

mod metal;
mod naive;

pub use metal::MetalEstimator;
pub use naive::NaiveEstimator;

use alloc::boxed::Box;

use crate::backend::BackendKind;
use crate::display_list::DisplayList;

/// Scores the rasterization cost of display-list content.
pub trait ComplexityEstimator {
    /// Returns the estimated cost of rasterizing `display_list`.
    fn compute(&self, display_list: &DisplayList) -> u32;

    /// Returns `true` if content with this score is worth caching.
    fn should_be_cached(&self, score: u32) -> bool;

    /// Scores `display_list` and applies the threshold.
    fn is_worth_caching(&self, display_list: &DisplayList) -> bool {
        self.should_be_cached(self.compute(display_list))
    }
}

/// Returns the default estimator for a backend family.
///
/// Only Metal has a calibrated cost table; other backends count commands.
#[must_use]
pub fn estimator_for_backend(kind: BackendKind) -> Box<dyn ComplexityEstimator> {
    match kind {
        BackendKind::Metal => Box::new(MetalEstimator),
        BackendKind::Software | BackendKind::Gl => Box::new(NaiveEstimator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use kurbo::Rect;

    use crate::display_list::DrawOp;

    #[test]
    fn backends_select_tables() {
        let list = DisplayList::new(
            1,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![DrawOp::DrawColor(Default::default(), Default::default()); 3],
        );
        // Naive counts three commands; the Metal table charges 50 per fill.
        assert_eq!(estimator_for_backend(BackendKind::Software).compute(&list), 3);
        assert_eq!(estimator_for_backend(BackendKind::Gl).compute(&list), 3);
        assert_eq!(estimator_for_backend(BackendKind::Metal).compute(&list), 150);
    }
}
