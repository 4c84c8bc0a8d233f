// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint attributes applied when compositing a cached image.

/// Blend mode for compositing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Standard source-over alpha compositing.
    #[default]
    SourceOver,
    /// Replace the destination.
    Source,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
}

/// Geometry fill style used by draw commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaintStyle {
    /// Fill the interior.
    #[default]
    Fill,
    /// Stroke the outline.
    Stroke,
    /// Fill and stroke.
    StrokeAndFill,
}

/// A packed `0xAARRGGBB` color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);

    /// Returns the alpha channel.
    #[inline]
    #[must_use]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

/// Attributes used when an image is composited onto a canvas.
///
/// Passing `None` where an `Option<&Paint>` is accepted means opaque
/// source-over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    /// Group opacity (0.0–1.0).
    pub opacity: f32,
    /// Blend mode.
    pub blend_mode: BlendMode,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend_mode: BlendMode::SourceOver,
        }
    }
}

impl Paint {
    /// A source-over paint with the given opacity.
    #[must_use]
    pub fn with_opacity(opacity: f32) -> Self {
        Self {
            opacity,
            ..Self::default()
        }
    }
}
