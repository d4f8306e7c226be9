// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The ways a render request can be turned away.  The numeric work
//! itself cannot fail; everything here is either a caller handing us
//! geometry we cannot draw, or a render that lost the race to a newer
//! one.

use failure::Fail;

/// Why a render did not produce a buffer.
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum RenderError {
    /// The zoom factor must be a finite number greater than zero.
    #[fail(display = "zoom must be a finite number greater than zero, got {}", _0)]
    InvalidZoom(f64),

    /// Neither side of the image may be zero pixels long.
    #[fail(display = "image dimensions must be non-zero, got {}x{}", width, height)]
    InvalidDimensions {
        /// Requested width, in pixels.
        width: usize,
        /// Requested height, in pixels.
        height: usize,
    },

    /// A newer render started before this one could finish.
    #[fail(display = "render generation {} was superseded by a newer render", generation)]
    Superseded {
        /// The generation that was abandoned.
        generation: u64,
    },

    /// Painting a row panicked, so the image is incomplete.
    #[fail(display = "render generation {} panicked while painting row {}", generation, row)]
    RowPanicked {
        /// The generation that lost the row.
        generation: u64,
        /// The row that was never painted.
        row: usize,
    },

    /// A worker thread could not be started.
    #[fail(display = "could not start worker thread: {}", _0)]
    PoolSpawn(String),

    /// The worker pool is no longer accepting or answering work.
    #[fail(display = "the worker pool has shut down")]
    PoolClosed,
}
