// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for rendering integrations.
//!
//! The cache never draws pixels itself. A rendering backend supplies three
//! pieces:
//!
//! - **Canvas**: accepts draw commands under a current transform, and can
//!   composite an [`Image`] at a device-space position.
//! - **Surface**: an offscreen target of a requested pixel size and color
//!   space that exposes a [`Canvas`] and produces an immutable snapshot.
//! - **Backend**: allocates surfaces, reporting failure as an
//!   [`RasterError`] rather than panicking.
//!
//! The [`recording`](crate::recording) module provides a headless
//! implementation of all three.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

use kurbo::{Affine, Point};

use crate::display_list::DrawOp;
use crate::error::RasterError;
use crate::paint::{Color, Paint};

/// Which family of rasterizer a backend drives.
///
/// Relative primitive costs differ between families, so the kind selects a
/// default [`ComplexityEstimator`](crate::complexity::ComplexityEstimator).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// CPU rasterization.
    #[default]
    Software,
    /// Metal GPU rasterization.
    Metal,
    /// OpenGL / GLES GPU rasterization.
    Gl,
}

/// Color space requested for an offscreen target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Standard sRGB.
    #[default]
    Srgb,
    /// Linear-light sRGB primaries.
    LinearSrgb,
    /// Display P3.
    DisplayP3,
}

/// An immutable rasterized image.
pub trait Image: fmt::Debug {
    /// Width in device pixels.
    fn width(&self) -> u32;

    /// Height in device pixels.
    fn height(&self) -> u32;

    /// Approximate memory footprint in bytes (4 bytes per pixel by default).
    fn byte_size(&self) -> usize {
        self.width() as usize * self.height() as usize * 4
    }
}

/// A drawing destination with a current transform and a save stack.
pub trait Canvas {
    /// Returns the current total transform.
    fn transform(&self) -> Affine;

    /// Replaces the current total transform.
    fn set_transform(&mut self, transform: Affine);

    /// Pre-multiplies `transform` onto the current transform.
    fn concat(&mut self, transform: Affine) {
        let current = self.transform();
        self.set_transform(current * transform);
    }

    /// Pushes the current transform and clip.
    fn save(&mut self);

    /// Pops the most recent [`save`](Self::save).
    fn restore(&mut self);

    /// Fills the whole target with `color`, ignoring transform and clip.
    fn clear(&mut self, color: Color);

    /// Executes one vector draw command.
    fn draw_op(&mut self, op: &DrawOp);

    /// Composites `image` with its top-left corner at `origin`, in the
    /// canvas's current coordinate space.
    fn draw_image(&mut self, image: &dyn Image, origin: Point, paint: Option<&Paint>);
}

/// An offscreen render target.
pub trait Surface {
    /// Returns the canvas that draws into this surface.
    fn canvas(&mut self) -> &mut dyn Canvas;

    /// Captures the current contents as an immutable image.
    fn snapshot(&mut self) -> Rc<dyn Image>;
}

/// Allocates offscreen targets.
pub trait RenderBackend {
    /// Returns the rasterizer family.
    fn kind(&self) -> BackendKind;

    /// Allocates a `width` × `height` surface in `color_space`.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::SurfaceAllocation`] if the target cannot be
    /// created. Implementations must not panic on allocation failure.
    fn make_surface(
        &mut self,
        width: u32,
        height: u32,
        color_space: ColorSpace,
    ) -> Result<Box<dyn Surface>, RasterError>;
}
