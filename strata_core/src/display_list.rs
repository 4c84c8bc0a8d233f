// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cacheable vector content.
//!
//! The scene graph owns the real command encoding; this module carries the
//! small command vocabulary the cache needs to estimate cost and replay
//! content into an offscreen target.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, RoundedRect, Vec2};

use crate::backend::Canvas;
use crate::paint::{BlendMode, Color, PaintStyle};

/// One recorded draw command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Sets anti-aliasing for subsequent geometry.
    SetAntiAlias(bool),
    /// Sets fill/stroke style for subsequent geometry.
    SetStyle(PaintStyle),
    /// Sets stroke width; `0.0` is a hairline.
    SetStrokeWidth(f64),
    /// Sets the paint color.
    SetColor(Color),
    /// Pushes transform and clip state.
    Save,
    /// Pushes state and starts an offscreen layer.
    SaveLayer {
        /// Optional bounds hint for the layer.
        bounds: Option<Rect>,
    },
    /// Pops the most recent save or save-layer.
    Restore,
    /// Translates the current transform.
    Translate(Vec2),
    /// Scales the current transform.
    Scale(f64, f64),
    /// Concatenates an arbitrary affine transform.
    Transform(Affine),
    /// Intersects the clip with a rectangle.
    ClipRect(Rect),
    /// Fills the clip with the current paint.
    DrawPaint,
    /// Fills the clip with a color.
    DrawColor(Color, BlendMode),
    /// Draws a line segment.
    DrawLine(Point, Point),
    /// Draws a rectangle.
    DrawRect(Rect),
    /// Draws an oval inscribed in a rectangle.
    DrawOval(Rect),
    /// Draws a circle.
    DrawCircle {
        /// Center point.
        center: Point,
        /// Radius.
        radius: f64,
    },
    /// Draws a rounded rectangle.
    DrawRoundedRect(RoundedRect),
    /// Draws a path, summarized by its bounds and verb count.
    DrawPath {
        /// Path bounds.
        bounds: Rect,
        /// Number of path verbs.
        verbs: u32,
    },
    /// Draws an image into a destination rectangle.
    DrawImage {
        /// Destination rectangle.
        dst: Rect,
    },
    /// Draws a run of glyphs.
    DrawText {
        /// Text bounds.
        bounds: Rect,
        /// Number of glyphs.
        glyphs: u32,
    },
    /// Draws a shadow for a shape.
    DrawShadow {
        /// Shape bounds.
        bounds: Rect,
        /// Shadow elevation.
        elevation: f64,
    },
    /// Replays a nested display list.
    DrawDisplayList(Rc<DisplayList>),
}

/// An immutable list of draw commands with precomputed bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayList {
    unique_id: u64,
    bounds: Rect,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    /// Creates a display list.
    ///
    /// `unique_id` becomes the cache owner id and must not be shared with any
    /// other display list that has different content.
    #[must_use]
    pub fn new(unique_id: u64, bounds: Rect, ops: Vec<DrawOp>) -> Self {
        Self {
            unique_id,
            bounds,
            ops,
        }
    }

    /// Returns the owner id.
    #[inline]
    #[must_use]
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// Returns the logical bounds of the content.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns the top-level commands.
    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Counts commands, descending into nested display lists.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.ops
            .iter()
            .map(|op| match op {
                DrawOp::DrawDisplayList(inner) => inner.op_count(),
                _ => 1,
            })
            .sum()
    }

    /// Replays every command into `canvas`.
    pub fn render_to(&self, canvas: &mut dyn Canvas) {
        for op in &self.ops {
            match op {
                DrawOp::DrawDisplayList(inner) => {
                    canvas.save();
                    inner.render_to(canvas);
                    canvas.restore();
                }
                _ => canvas.draw_op(op),
            }
        }
    }
}

/// Opaque recorded content that can only be counted and replayed.
pub trait Picture {
    /// Returns the owner id.
    fn unique_id(&self) -> u64;

    /// Returns the logical bounds of the content.
    fn cull_rect(&self) -> Rect;

    /// Returns an approximate command count, including nested content.
    fn approximate_op_count(&self) -> usize;

    /// Replays the picture into `canvas`.
    fn playback(&self, canvas: &mut dyn Canvas);
}

impl Picture for DisplayList {
    fn unique_id(&self) -> u64 {
        self.unique_id
    }

    fn cull_rect(&self) -> Rect {
        self.bounds
    }

    fn approximate_op_count(&self) -> usize {
        self.op_count()
    }

    fn playback(&self, canvas: &mut dyn Canvas) {
        self.render_to(canvas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    use crate::recording::RecordingCanvas;

    #[test]
    fn op_count_descends_into_nested_lists() {
        let inner = Rc::new(DisplayList::new(
            2,
            Rect::new(0.0, 0.0, 5.0, 5.0),
            vec![DrawOp::DrawRect(Rect::new(0.0, 0.0, 5.0, 5.0)); 4],
        ));
        let outer = DisplayList::new(
            1,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![
                DrawOp::Save,
                DrawOp::DrawDisplayList(inner),
                DrawOp::Restore,
            ],
        );
        assert_eq!(outer.op_count(), 6);
        assert_eq!(outer.approximate_op_count(), 6);
    }

    #[test]
    fn render_to_flattens_nested_lists() {
        let inner = Rc::new(DisplayList::new(
            2,
            Rect::new(0.0, 0.0, 5.0, 5.0),
            vec![DrawOp::DrawOval(Rect::new(0.0, 0.0, 5.0, 5.0))],
        ));
        let outer = DisplayList::new(
            1,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![
                DrawOp::DrawRect(Rect::new(0.0, 0.0, 1.0, 1.0)),
                DrawOp::DrawDisplayList(inner),
            ],
        );
        let mut canvas = RecordingCanvas::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        outer.render_to(&mut canvas);
        assert_eq!(canvas.op_count(), 2);
        assert_eq!(canvas.save_depth(), 0);
    }
}
