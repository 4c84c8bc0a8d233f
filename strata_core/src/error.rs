// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while populating cache entries.
//!
//! None of these are fatal. The store logs them and reports the entry as
//! uncached, and the item falls back to its ordinary paint for the frame.

use thiserror::Error;

use crate::identity::CacheKeyId;

/// Why a cache entry could not be populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RasterError {
    /// The backend could not allocate an offscreen target.
    #[error("failed to allocate a {width}x{height} offscreen surface")]
    SurfaceAllocation {
        /// Requested width in device pixels.
        width: u32,
        /// Requested height in device pixels.
        height: u32,
    },
    /// The rendering transform has no inverse.
    #[error("rendering transform is not invertible")]
    NonInvertibleTransform,
    /// The logical bounds are empty.
    #[error("logical bounds are empty")]
    EmptyBounds,
    /// The logical bounds are not finite.
    #[error("logical bounds are not finite")]
    NonFiniteBounds,
    /// No entry was marked seen for the identity this frame.
    #[error("no cache entry for {0:?}")]
    MissingEntry(CacheKeyId),
}
