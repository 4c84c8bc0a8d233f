// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless recording backend.
//!
//! [`RecordingBackend`] hands out surfaces whose canvases log every call
//! together with the transform in effect at the time. Snapshots keep the log,
//! so callers can check what was rasterized into a cache entry without a
//! GPU. A maximum surface dimension simulates allocation failure.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect};

use crate::backend::{BackendKind, Canvas, ColorSpace, Image, RenderBackend, Surface};
use crate::display_list::DrawOp;
use crate::error::RasterError;
use crate::paint::{Color, Paint};

/// One logged canvas call.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCall {
    /// [`Canvas::clear`].
    Clear(Color),
    /// [`Canvas::draw_op`], with the transform in effect.
    Op {
        /// The command.
        op: DrawOp,
        /// Transform at the time of the call.
        transform: Affine,
    },
    /// [`Canvas::draw_image`].
    Image {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Requested origin.
        origin: Point,
        /// Transform at the time of the call.
        transform: Affine,
        /// Paint opacity, `1.0` when no paint was given.
        opacity: f32,
    },
}

/// A canvas that logs calls instead of rasterizing.
#[derive(Clone, Debug)]
pub struct RecordingCanvas {
    bounds: Rect,
    transform: Affine,
    stack: Vec<Affine>,
    calls: Vec<RecordedCall>,
}

impl RecordingCanvas {
    /// Creates a canvas covering `bounds` with an identity transform.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            transform: Affine::IDENTITY,
            stack: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Returns the device bounds of the canvas.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Returns every logged call.
    #[must_use]
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Number of logged draw commands (excluding image draws and clears).
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Op { .. }))
            .count()
    }

    /// Number of logged image draws.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Image { .. }))
            .count()
    }

    /// Current depth of the save stack.
    #[must_use]
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    /// Clears the log, keeping transform state.
    pub fn reset_calls(&mut self) {
        self.calls.clear();
    }
}

impl Canvas for RecordingCanvas {
    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(RecordedCall::Clear(color));
    }

    fn draw_op(&mut self, op: &DrawOp) {
        self.calls.push(RecordedCall::Op {
            op: op.clone(),
            transform: self.transform,
        });
        match op {
            DrawOp::Save | DrawOp::SaveLayer { .. } => self.save(),
            DrawOp::Restore => self.restore(),
            DrawOp::Translate(v) => self.concat(Affine::translate(*v)),
            DrawOp::Scale(sx, sy) => self.concat(Affine::scale_non_uniform(*sx, *sy)),
            DrawOp::Transform(t) => self.concat(*t),
            _ => {}
        }
    }

    fn draw_image(&mut self, image: &dyn Image, origin: Point, paint: Option<&Paint>) {
        self.calls.push(RecordedCall::Image {
            width: image.width(),
            height: image.height(),
            origin,
            transform: self.transform,
            opacity: paint.map_or(1.0, |p| p.opacity),
        });
    }
}

/// A snapshot of a [`RecordingSurface`].
#[derive(Clone, Debug)]
pub struct RecordingImage {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    calls: Vec<RecordedCall>,
}

impl RecordingImage {
    /// Returns the calls that were drawn into the surface.
    #[must_use]
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Returns the color space the surface was allocated in.
    #[must_use]
    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }
}

impl Image for RecordingImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// An offscreen target backed by a [`RecordingCanvas`].
#[derive(Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    canvas: RecordingCanvas,
}

impl Surface for RecordingSurface {
    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }

    fn snapshot(&mut self) -> Rc<dyn Image> {
        Rc::new(RecordingImage {
            width: self.width,
            height: self.height,
            color_space: self.color_space,
            calls: self.canvas.calls.clone(),
        })
    }
}

/// A [`RenderBackend`] that allocates [`RecordingSurface`]s.
#[derive(Clone, Debug)]
pub struct RecordingBackend {
    kind: BackendKind,
    max_dimension: u32,
    surfaces_allocated: usize,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(BackendKind::Software)
    }
}

impl RecordingBackend {
    /// Largest surface edge the backend accepts by default.
    pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

    /// Creates a backend reporting the given rasterizer family.
    #[must_use]
    pub const fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            surfaces_allocated: 0,
        }
    }

    /// Limits surface edges to `max_dimension`; larger requests fail.
    #[must_use]
    pub const fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Number of surfaces successfully allocated so far.
    #[must_use]
    pub const fn surfaces_allocated(&self) -> usize {
        self.surfaces_allocated
    }
}

impl RenderBackend for RecordingBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn make_surface(
        &mut self,
        width: u32,
        height: u32,
        color_space: ColorSpace,
    ) -> Result<Box<dyn Surface>, RasterError> {
        if width == 0 || height == 0 || width > self.max_dimension || height > self.max_dimension
        {
            return Err(RasterError::SurfaceAllocation { width, height });
        }
        self.surfaces_allocated += 1;
        Ok(Box::new(RecordingSurface {
            width,
            height,
            color_space,
            canvas: RecordingCanvas::new(Rect::new(0.0, 0.0, f64::from(width), f64::from(height))),
        }))
    }
}
