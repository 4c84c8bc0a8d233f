// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::complexity::ComplexityEstimator;
use crate::display_list::{DisplayList, DrawOp};
use crate::paint::PaintStyle;

/// Cost table fitted to Metal benchmark timings.
///
/// A 100-pixel hairline without anti-aliasing scores 100 units. Lines scale
/// with length, rectangles with area, ovals and circles with their extent.
/// Penalties are applied as integer percentages of the base cost. Commands
/// without a fitted cost score nothing.
///
/// Matrices and clips are not taken into account.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetalEstimator;

impl MetalEstimator {
    /// Scores above this (about 1 ms) are worth caching.
    pub const THRESHOLD: u32 = 200_000;
}

impl ComplexityEstimator for MetalEstimator {
    fn compute(&self, display_list: &DisplayList) -> u32 {
        let mut walker = Walker::default();
        for op in display_list.ops() {
            walker.visit(self, op);
        }
        walker.score
    }

    fn should_be_cached(&self, score: u32) -> bool {
        score > Self::THRESHOLD
    }
}

#[derive(Clone, Copy, Debug)]
struct PaintState {
    anti_alias: bool,
    style: PaintStyle,
    stroke_width: f64,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            anti_alias: false,
            style: PaintStyle::Fill,
            stroke_width: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SaveKind {
    Save,
    SaveLayer,
}

#[derive(Debug)]
struct Walker {
    paints: Vec<PaintState>,
    saves: Vec<SaveKind>,
    score: u32,
}

impl Default for Walker {
    fn default() -> Self {
        Self {
            paints: vec![PaintState::default()],
            saves: Vec::new(),
            score: 0,
        }
    }
}

impl Walker {
    fn paint(&self) -> PaintState {
        self.paints.last().copied().unwrap_or_default()
    }

    fn paint_mut(&mut self) -> &mut PaintState {
        if self.paints.is_empty() {
            self.paints.push(PaintState::default());
        }
        let last = self.paints.len() - 1;
        &mut self.paints[last]
    }

    fn add(&mut self, cost: u32) {
        self.score = self.score.saturating_add(cost);
    }

    fn visit(&mut self, estimator: &MetalEstimator, op: &DrawOp) {
        match op {
            DrawOp::SetAntiAlias(aa) => self.paint_mut().anti_alias = *aa,
            DrawOp::SetStyle(style) => self.paint_mut().style = *style,
            DrawOp::SetStrokeWidth(width) => self.paint_mut().stroke_width = *width,
            DrawOp::Save => self.saves.push(SaveKind::Save),
            // Save-layers start from a default paint; style and anti-aliasing
            // do not leak in or out.
            DrawOp::SaveLayer { .. } => {
                self.saves.push(SaveKind::SaveLayer);
                self.paints.push(PaintState::default());
            }
            DrawOp::Restore => {
                if self.saves.pop() == Some(SaveKind::SaveLayer) {
                    self.paints.pop();
                }
            }
            DrawOp::DrawColor(..) => self.add(50),
            DrawOp::DrawLine(p0, p1) => self.add(line_cost(self.paint(), *p0, *p1)),
            DrawOp::DrawRect(rect) => self.add(rect_cost(self.paint(), *rect)),
            DrawOp::DrawOval(bounds) => self.add(oval_cost(self.paint(), *bounds)),
            DrawOp::DrawCircle { radius, .. } => self.add(circle_cost(self.paint(), *radius)),
            DrawOp::DrawDisplayList(inner) => self.add(estimator.compute(inner)),
            _ => {}
        }
    }
}

/// Applies a percentage penalty.
fn penalize(cost: u32, percent: u32) -> u32 {
    let scaled = u64::from(cost) * u64::from(percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "scores are clamped to the u32 range before the cast"
)]
fn units(v: f64) -> u32 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, f64::from(u32::MAX)) as u32
}

fn line_cost(paint: PaintState, p0: Point, p1: Point) -> u32 {
    // 100 units per 100 pixels of length.
    let mut cost = units(p0.distance(p1));
    if paint.anti_alias {
        cost = penalize(cost, 130);
    }
    if paint.stroke_width != 0.0 {
        cost = penalize(cost, 120);
    }
    cost
}

fn rect_cost(paint: PaintState, rect: Rect) -> u32 {
    // 150k square pixels filled hairline-stroked is about one line unit.
    let mut cost = units(rect.area().abs()) / 1500;
    if !paint.anti_alias && paint.style == PaintStyle::Stroke {
        cost = penalize(cost, 150);
    }
    if paint.style == PaintStyle::Fill {
        cost = penalize(cost, 700);
    }
    cost
}

fn oval_cost(paint: PaintState, bounds: Rect) -> u32 {
    let length = units((bounds.width().abs() + bounds.height().abs()) / 2.0);
    // A length of 35 is the 100-unit baseline.
    let mut cost = length.saturating_mul(100) / 35;
    if paint.anti_alias && paint.style == PaintStyle::Stroke {
        // Stroked AA cost grows with length, 1% per pixel.
        cost = penalize(cost, length);
    }
    if paint.style == PaintStyle::Fill {
        cost = penalize(cost, (length / 2).min(100));
    }
    cost
}

fn circle_cost(paint: PaintState, radius: f64) -> u32 {
    let radius = units(radius.abs());
    let aa_percent = if paint.style == PaintStyle::Stroke {
        140
    } else {
        100
    };
    // A radius of 250 is ten times the baseline.
    let mut cost = penalize(radius.saturating_mul(4), aa_percent);
    if paint.anti_alias {
        cost = penalize(cost, aa_percent);
    }
    if paint.style == PaintStyle::Fill {
        cost = penalize(cost, radius.saturating_mul(100).saturating_div(80).min(100));
    }
    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;

    fn score(ops: Vec<DrawOp>) -> u32 {
        MetalEstimator.compute(&DisplayList::new(1, Rect::new(0.0, 0.0, 1000.0, 1000.0), ops))
    }

    const LINE: DrawOp = DrawOp::DrawLine(Point::new(0.0, 0.0), Point::new(100.0, 0.0));

    #[test]
    fn hairline_line_is_baseline() {
        assert_eq!(score(vec![LINE]), 100);
    }

    #[test]
    fn line_penalties_compound() {
        assert_eq!(score(vec![DrawOp::SetAntiAlias(true), LINE]), 130);
        assert_eq!(
            score(vec![
                DrawOp::SetAntiAlias(true),
                DrawOp::SetStrokeWidth(2.0),
                LINE
            ]),
            156
        );
    }

    #[test]
    fn filled_rect_costs_seven_times_stroked() {
        let rect = DrawOp::DrawRect(Rect::new(0.0, 0.0, 300.0, 500.0));
        assert_eq!(score(vec![rect.clone()]), 700);
        assert_eq!(
            score(vec![DrawOp::SetStyle(PaintStyle::Stroke), rect.clone()]),
            150
        );
        assert_eq!(
            score(vec![
                DrawOp::SetStyle(PaintStyle::Stroke),
                DrawOp::SetAntiAlias(true),
                rect
            ]),
            100
        );
    }

    #[test]
    fn circle_scales_with_radius() {
        let circle = DrawOp::DrawCircle {
            center: Point::new(500.0, 500.0),
            radius: 250.0,
        };
        assert_eq!(score(vec![circle.clone()]), 1000);
        assert_eq!(
            score(vec![
                DrawOp::SetStyle(PaintStyle::Stroke),
                DrawOp::SetAntiAlias(true),
                circle
            ]),
            1960
        );
    }

    #[test]
    fn oval_uses_average_extent() {
        let oval = DrawOp::DrawOval(Rect::new(0.0, 0.0, 300.0, 400.0));
        // Length 350: 1000 base, full fill penalty.
        assert_eq!(score(vec![oval.clone()]), 1000);
        assert_eq!(
            score(vec![DrawOp::SetStyle(PaintStyle::Stroke), oval]),
            1000
        );
    }

    #[test]
    fn save_layer_isolates_paint_state() {
        assert_eq!(
            score(vec![
                DrawOp::SetAntiAlias(true),
                DrawOp::SaveLayer { bounds: None },
                LINE,
                DrawOp::Restore,
                LINE,
            ]),
            230
        );
        // Plain saves do not reset the paint.
        assert_eq!(
            score(vec![
                DrawOp::SetAntiAlias(true),
                DrawOp::Save,
                LINE,
                DrawOp::Restore,
            ]),
            130
        );
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        assert_eq!(score(vec![DrawOp::Restore, DrawOp::Restore, LINE]), 100);
    }

    #[test]
    fn nested_lists_and_threshold() {
        let inner = Rc::new(DisplayList::new(
            2,
            Rect::new(0.0, 0.0, 1000.0, 1000.0),
            vec![DrawOp::DrawRect(Rect::new(0.0, 0.0, 1000.0, 1000.0)); 40],
        ));
        // 1e6 px² / 1500 = 666, times 7 filled = 4662 per rect.
        let total = score(vec![DrawOp::DrawDisplayList(inner); 2]);
        assert_eq!(total, 4662 * 80);
        assert!(MetalEstimator.should_be_cached(total));
        assert!(!MetalEstimator.should_be_cached(MetalEstimator::THRESHOLD));
    }
}
