// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::complexity::ComplexityEstimator;
use crate::display_list::{DisplayList, DrawOp};

/// Scores content by counting drawing and state commands.
///
/// Attribute changes are free; every other command costs one unit and nested
/// display lists contribute their own score. Content with more than five
/// commands is worth caching.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaiveEstimator;

impl NaiveEstimator {
    /// Scores above this are worth caching.
    pub const THRESHOLD: u32 = 5;
}

impl ComplexityEstimator for NaiveEstimator {
    fn compute(&self, display_list: &DisplayList) -> u32 {
        display_list.ops().iter().fold(0_u32, |score, op| {
            let cost = match op {
                DrawOp::SetAntiAlias(_)
                | DrawOp::SetStyle(_)
                | DrawOp::SetStrokeWidth(_)
                | DrawOp::SetColor(_) => 0,
                DrawOp::DrawDisplayList(inner) => self.compute(inner),
                _ => 1,
            };
            score.saturating_add(cost)
        })
    }

    fn should_be_cached(&self, score: u32) -> bool {
        score > Self::THRESHOLD
    }
}
