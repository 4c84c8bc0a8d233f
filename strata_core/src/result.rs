// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterized cache results.

use alloc::rc::Rc;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Rect, Vec2};

use crate::backend::{Canvas, ColorSpace, Image, RenderBackend};
use crate::display_list::DrawOp;
use crate::error::RasterError;
use crate::paint::{Color, Paint, PaintStyle};
use crate::transform::{device_bounds, is_invertible};

/// Inputs for rasterizing one cache entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterizeParams {
    /// Transform the content is rasterized under.
    pub matrix: Affine,
    /// Logical (pre-transform) bounds of the content.
    pub logical_rect: Rect,
    /// Color space of the offscreen target.
    pub color_space: ColorSpace,
    /// Whether to overlay a checkerboard on the rasterized content.
    pub checkerboard: bool,
}

/// An immutable rasterized image and the logical bounds it represents.
#[derive(Clone, Debug)]
pub struct CacheResult {
    image: Rc<dyn Image>,
    logical_rect: Rect,
}

impl CacheResult {
    /// Wraps a snapshot image.
    #[must_use]
    pub fn new(image: Rc<dyn Image>, logical_rect: Rect) -> Self {
        Self {
            image,
            logical_rect,
        }
    }

    /// Returns the image.
    #[must_use]
    pub fn image(&self) -> &dyn Image {
        &*self.image
    }

    /// Returns the logical bounds the image covers.
    #[must_use]
    pub fn logical_rect(&self) -> Rect {
        self.logical_rect
    }

    /// Returns `(width, height)` of the image in device pixels.
    #[must_use]
    pub fn image_dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Approximate memory held by the image.
    #[must_use]
    pub fn image_bytes(&self) -> usize {
        self.image.byte_size()
    }

    /// Composites the image into `canvas` under its current transform.
    ///
    /// The logical rect is mapped through the canvas transform and rounded
    /// out to whole pixels; the image is drawn untransformed at the top-left
    /// of that box.
    pub fn draw(&self, canvas: &mut dyn Canvas, paint: Option<&Paint>) {
        let bounds = device_bounds(self.logical_rect, canvas.transform());
        debug_assert!(
            (bounds.width() - f64::from(self.image.width())).abs() <= 1.0
                && (bounds.height() - f64::from(self.image.height())).abs() <= 1.0,
            "cached image does not match device bounds"
        );
        canvas.save();
        canvas.set_transform(Affine::IDENTITY);
        canvas.draw_image(&*self.image, Point::new(bounds.x0, bounds.y0), paint);
        canvas.restore();
    }
}

/// Returns `true` if content with these logical bounds can be rasterized.
///
/// Empty bounds are never worth an offscreen target, and non-finite bounds
/// cannot be given one.
#[must_use]
pub fn can_rasterize_rect(rect: Rect) -> bool {
    if !rect.is_finite() {
        log::debug!("refusing to raster cache non-finite bounds {rect:?}");
        return false;
    }
    !rect.is_zero_area()
}

/// Rasterizes `draw` into a fresh offscreen target.
///
/// The target is sized to the rounded-out device bounds of
/// `params.logical_rect`, cleared to transparent, and `draw` runs under
/// `translate(-origin) * params.matrix`. The backend is handed back to
/// `draw` so nested content can populate its own entries.
///
/// # Errors
///
/// Returns an error if the transform is not invertible, the bounds are empty
/// or non-finite, or the backend cannot allocate the target.
pub fn rasterize<F>(
    params: &RasterizeParams,
    backend: &mut dyn RenderBackend,
    draw: F,
) -> Result<CacheResult, RasterError>
where
    F: FnOnce(&mut dyn Canvas, &mut dyn RenderBackend),
{
    if !is_invertible(params.matrix) {
        return Err(RasterError::NonInvertibleTransform);
    }
    if !params.logical_rect.is_finite() {
        return Err(RasterError::NonFiniteBounds);
    }
    let dest = device_bounds(params.logical_rect, params.matrix);
    if dest.is_zero_area() {
        return Err(RasterError::EmptyBounds);
    }
    let width = pixel_extent(dest.width());
    let height = pixel_extent(dest.height());

    let mut surface = backend.make_surface(width, height, params.color_space)?;
    {
        let canvas = surface.canvas();
        canvas.clear(Color::TRANSPARENT);
        canvas.set_transform(Affine::translate(Vec2::new(-dest.x0, -dest.y0)) * params.matrix);
        draw(&mut *canvas, &mut *backend);
        if params.checkerboard {
            draw_checkerboard(canvas, params.logical_rect);
        }
    }
    Ok(CacheResult::new(surface.snapshot(), params.logical_rect))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "device bounds are rounded to whole pixels and clamped"
)]
fn pixel_extent(v: f64) -> u32 {
    v.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}

const CHECKER_SIZE: f64 = 12.0;
const CHECKER_COLORS: [Color; 2] = [Color(0x40ff_00ff), Color(0x4000_ffff)];

/// Overlays a translucent checkerboard on `rect`, marking cached content.
pub fn draw_checkerboard(canvas: &mut dyn Canvas, rect: Rect) {
    canvas.draw_op(&DrawOp::Save);
    canvas.draw_op(&DrawOp::ClipRect(rect));
    canvas.draw_op(&DrawOp::SetStyle(PaintStyle::Fill));
    let mut row = 0_u32;
    let mut y = rect.y0;
    while y < rect.y1 {
        let mut col = 0_u32;
        let mut x = rect.x0;
        while x < rect.x1 {
            canvas.draw_op(&DrawOp::SetColor(CHECKER_COLORS[((row + col) % 2) as usize]));
            canvas.draw_op(&DrawOp::DrawRect(Rect::new(
                x,
                y,
                (x + CHECKER_SIZE).min(rect.x1),
                (y + CHECKER_SIZE).min(rect.y1),
            )));
            x += CHECKER_SIZE;
            col += 1;
        }
        y += CHECKER_SIZE;
        row += 1;
    }
    canvas.draw_op(&DrawOp::Restore);
}
