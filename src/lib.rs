#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring `z` and adding `c`, starting from
//! zero, never runs off to infinity.  For every pixel of an image we
//! find the complex number it stands for, iterate until the orbit
//! either leaves the circle of radius two or we run out of patience,
//! and color the pixel by how quickly it escaped.  Points that never
//! escape are painted black; they are (or are presumed to be) inside
//! the set.
//!
//! The amount of patience depends on how far in we are zoomed and on
//! the [`QualityMode`] the caller picked.  Rows of the image are
//! independent of one another, so the [`Rasterizer`] farms them out
//! to a fixed pool of worker threads and waits for all of them to
//! report back before handing over the finished [`PixelBuffer`].

pub mod error;
pub mod escape;
pub mod iterations;
pub mod palette;
pub mod pool;
pub mod raster;
pub mod session;
pub mod viewport;

pub use error::RenderError;
pub use escape::{escape_time, Escape};
pub use iterations::QualityMode;
pub use palette::{Color, ColorMapper, Grayscale, HsbBands, Palette};
pub use raster::{PixelBuffer, Rasterizer, RenderResult};
pub use session::Session;
pub use viewport::{Direction, Pixel, ViewState};
