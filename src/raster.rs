// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Walks every pixel of an image, maps it to the complex plane, runs
//! the escape-time test, and paints it.  Rows are independent of one
//! another, so the multi-threaded renderer hands each row to the
//! worker pool and stitches the finished rows back together.
//!
//! Every render is stamped with a generation number.  Starting a new
//! render (or calling [`Rasterizer::cancel`]) makes every older
//! generation stale: its workers stop picking up rows, rows that were
//! already computed are thrown away instead of committed, and the
//! caller gets [`RenderError::Superseded`] rather than a half-painted
//! buffer.

use crossbeam::channel::unbounded;
use image::RgbImage;
use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::RenderError;
use crate::escape::escape_time;
use crate::iterations::QualityMode;
use crate::palette::{Color, ColorMapper, HsbBands};
use crate::pool::WorkerPool;
use crate::viewport::{Pixel, ViewState};

/// The longest side, in pixels, of an image this crate will draw.
pub const MAX_SIDE: usize = u16::MAX as usize;

/// A width by height grid of RGB pixels, stored row by row, three bytes
/// to a pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// An all-black buffer.  Both sides must be at most [`MAX_SIDE`].
    pub fn new(width: usize, height: usize) -> PixelBuffer {
        PixelBuffer {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The packed RGB bytes of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * 3;
        &self.data[y * stride..(y + 1) * stride]
    }

    fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let stride = self.width * 3;
        &mut self.data[y * stride..(y + 1) * stride]
    }

    /// The color of one pixel.
    pub fn get(&self, pixel: &Pixel) -> Color {
        let offset = (pixel.1 * self.width + pixel.0) * 3;
        Color(
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        )
    }

    /// All of the pixel data.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Hands the pixels over to the image crate, for encoding.
    pub fn into_image(self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width as u32, self.height as u32, self.data)
    }
}

/// A finished render.
#[derive(Debug)]
pub struct RenderResult {
    /// The fully painted image.
    pub buffer: PixelBuffer,
    /// Wall-clock time from dispatch to the last committed row.
    pub elapsed: Duration,
    /// The iteration budget every pixel was given.
    pub max_iterations: usize,
    /// The generation this render ran as.
    pub generation: u64,
}

/// Paints row `y` of a `width` by `height` image into `row`, which
/// holds exactly `width` pixels.
pub(crate) fn render_row(
    view: &ViewState,
    max_iterations: usize,
    mapper: &dyn ColorMapper,
    bounds: (usize, usize),
    y: usize,
    row: &mut [u8],
) {
    debug_assert_eq!(row.len(), bounds.0 * 3);
    for (x, rgb) in row.chunks_mut(3).enumerate() {
        let c = view.pixel_to_point(&Pixel(x, y), bounds.0, bounds.1);
        let escape = escape_time(c, max_iterations);
        let Color(r, g, b) = mapper.color(escape.iterations, max_iterations, escape.escaped);
        rgb[0] = r;
        rgb[1] = g;
        rgb[2] = b;
    }
}

fn check_bounds(view: &ViewState, width: usize, height: usize) -> Result<(), RenderError> {
    view.validate()?;
    let too_big = width > MAX_SIDE
        || height > MAX_SIDE
        || width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(3))
            .is_none();
    if width == 0 || height == 0 || too_big {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// The single-threaded renderer.  Produces exactly the same pixels as
/// [`Rasterizer::render`], one row after another on the calling thread.
pub fn render_single(
    view: &ViewState,
    mode: QualityMode,
    mapper: &dyn ColorMapper,
    width: usize,
    height: usize,
) -> Result<PixelBuffer, RenderError> {
    check_bounds(view, width, height)?;
    let max_iterations = mode.max_iterations(view.zoom);
    let mut buffer = PixelBuffer::new(width, height);
    for y in 0..height {
        render_row(view, max_iterations, mapper, (width, height), y, buffer.row_mut(y));
    }
    Ok(buffer)
}

enum RowReport {
    Painted(usize, Vec<u8>),
    Panicked(usize),
    Skipped,
}

/// The multi-threaded renderer.  Owns a worker pool for its whole
/// lifetime and a color mapper that every render uses.
pub struct Rasterizer {
    pool: WorkerPool,
    mapper: Arc<dyn ColorMapper>,
    generation: Arc<AtomicU64>,
}

impl Rasterizer {
    /// A rasterizer with `threads` workers and the banded HSB palette.
    pub fn new(threads: usize) -> Result<Rasterizer, RenderError> {
        Rasterizer::with_mapper(threads, Arc::new(HsbBands))
    }

    /// A rasterizer with one worker per CPU and the banded HSB palette.
    pub fn with_cpus() -> Result<Rasterizer, RenderError> {
        Rasterizer::new(num_cpus::get())
    }

    /// A rasterizer with `threads` workers painting with `mapper`.
    pub fn with_mapper(
        threads: usize,
        mapper: Arc<dyn ColorMapper>,
    ) -> Result<Rasterizer, RenderError> {
        Ok(Rasterizer {
            pool: WorkerPool::new(threads)?,
            mapper,
            generation: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.size()
    }

    /// The most recently issued generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Makes every render currently in flight stale.  Returns the
    /// generation that is now current.
    pub fn cancel(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Renders the view into a fresh `width` by `height` buffer,
    /// blocking until every row is painted.  The view and mode are
    /// copied before any work is queued.
    pub fn render(
        &self,
        view: &ViewState,
        mode: QualityMode,
        width: usize,
        height: usize,
    ) -> Result<RenderResult, RenderError> {
        check_bounds(view, width, height)?;
        let start = Instant::now();
        let view = *view;
        let generation = self.cancel();
        let max_iterations = mode.max_iterations(view.zoom);
        debug!(
            "render {}: {}x{} at zoom {} ({} mode, {} iterations)",
            generation, width, height, view.zoom, mode, max_iterations
        );

        let (reports, finished) = unbounded();
        for y in 0..height {
            let reports = reports.clone();
            let mapper = self.mapper.clone();
            let current = self.generation.clone();
            self.pool.execute(move || {
                let report = if current.load(Ordering::SeqCst) == generation {
                    let painted = panic::catch_unwind(AssertUnwindSafe(|| {
                        let mut row = vec![0; width * 3];
                        let bounds = (width, height);
                        render_row(&view, max_iterations, &*mapper, bounds, y, &mut row);
                        row
                    }));
                    match painted {
                        Ok(row) => RowReport::Painted(y, row),
                        Err(_) => RowReport::Panicked(y),
                    }
                } else {
                    RowReport::Skipped
                };
                // Nobody is listening if the render was abandoned.
                let _ = reports.send(report);
            })?;
        }
        drop(reports);

        let mut buffer = PixelBuffer::new(width, height);
        for _ in 0..height {
            match finished.recv() {
                Ok(RowReport::Painted(y, row)) if self.generation() == generation => {
                    buffer.row_mut(y).copy_from_slice(&row);
                }
                Ok(RowReport::Panicked(row)) => {
                    // Stops the rest of this render's rows from being painted.
                    self.cancel();
                    warn!("render {} lost row {} to a panic", generation, row);
                    return Err(RenderError::RowPanicked { generation, row });
                }
                Ok(_) => {
                    warn!("render {} superseded before it finished", generation);
                    return Err(RenderError::Superseded { generation });
                }
                Err(_) => return Err(RenderError::PoolClosed),
            }
        }

        let elapsed = start.elapsed();
        debug!("render {} finished in {:?}", generation, elapsed);
        Ok(RenderResult {
            buffer,
            elapsed,
            max_iterations,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Grayscale;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    #[test]
    fn pixel_buffer_rows_are_disjoint() {
        let mut buffer = PixelBuffer::new(4, 3);
        buffer.row_mut(1).copy_from_slice(&[9; 12]);
        assert_eq!(buffer.row(0), &[0; 12][..]);
        assert_eq!(buffer.row(1), &[9; 12][..]);
        assert_eq!(buffer.row(2), &[0; 12][..]);
        assert_eq!(buffer.get(&Pixel(3, 1)), Color(9, 9, 9));
        assert_eq!(buffer.as_bytes().len(), 36);
    }

    #[test]
    fn into_image_keeps_dimensions() {
        let image = PixelBuffer::new(5, 2).into_image().unwrap();
        assert_eq!(image.dimensions(), (5, 2));
    }

    #[test]
    fn rejects_bad_geometry() {
        let raster = Rasterizer::new(2).unwrap();
        let view = ViewState::default();
        assert_eq!(
            raster.render(&view, QualityMode::Fast, 0, 10).unwrap_err(),
            RenderError::InvalidDimensions {
                width: 0,
                height: 10
            }
        );
        let flat = ViewState {
            zoom: 0.0,
            ..view
        };
        assert_eq!(
            raster.render(&flat, QualityMode::Fast, 10, 10).unwrap_err(),
            RenderError::InvalidZoom(0.0)
        );
        assert!(render_single(&flat, QualityMode::Fast, &HsbBands, 10, 10).is_err());
    }

    #[test]
    fn rejects_oversized_images() {
        let raster = Rasterizer::new(1).unwrap();
        let view = ViewState::default();
        for &(width, height) in &[(usize::MAX / 2, 1), (1, usize::MAX), (MAX_SIDE + 1, 1)] {
            assert_eq!(
                raster.render(&view, QualityMode::Fast, width, height).unwrap_err(),
                RenderError::InvalidDimensions { width, height }
            );
            assert!(render_single(&view, QualityMode::Fast, &HsbBands, width, height).is_err());
        }
        assert!(raster.render(&view, QualityMode::Fast, MAX_SIDE, 1).is_ok());
    }

    #[test]
    fn threaded_matches_single() {
        let view = ViewState::new(-0.7, 0.2, 90.0).unwrap();
        let single = render_single(&view, QualityMode::Scaled, &Grayscale, 64, 48).unwrap();
        let raster = Rasterizer::with_mapper(4, Arc::new(Grayscale)).unwrap();
        let threaded = raster.render(&view, QualityMode::Scaled, 64, 48).unwrap();
        assert_eq!(threaded.buffer, single);
        assert_eq!(threaded.max_iterations, QualityMode::Scaled.max_iterations(90.0));
    }

    #[test]
    fn generations_increase() {
        let raster = Rasterizer::new(1).unwrap();
        let view = ViewState::default();
        let first = raster.render(&view, QualityMode::Fast, 8, 8).unwrap();
        let second = raster.render(&view, QualityMode::Fast, 8, 8).unwrap();
        assert!(second.generation > first.generation);
        assert_eq!(raster.generation(), second.generation);
    }

    /// Cancels the render it is painting for, the first time it is asked
    /// for a color.
    struct Saboteur {
        target: Mutex<Option<Arc<AtomicU64>>>,
    }

    impl ColorMapper for Saboteur {
        fn color(&self, iterations: usize, max_iterations: usize, escaped: bool) -> Color {
            if let Some(generation) = self.target.lock().unwrap().take() {
                generation.fetch_add(1, Ordering::SeqCst);
            }
            HsbBands.color(iterations, max_iterations, escaped)
        }
    }

    #[test]
    fn stale_rows_are_never_committed() {
        let saboteur = Arc::new(Saboteur {
            target: Mutex::new(None),
        });
        let raster = Rasterizer::with_mapper(2, saboteur.clone()).unwrap();
        *saboteur.target.lock().unwrap() = Some(raster.generation.clone());

        let view = ViewState::default();
        match raster.render(&view, QualityMode::Fast, 16, 16) {
            Err(RenderError::Superseded { generation }) => assert_eq!(generation, 1),
            other => panic!("expected a superseded render, got {:?}", other),
        }

        // The saboteur is spent; the next render runs to completion.
        let result = raster.render(&view, QualityMode::Fast, 16, 16).unwrap();
        assert_eq!(result.generation, 3);
    }

    /// Panics on the first color it is asked for, then behaves.
    struct Flaky {
        tripped: AtomicBool,
    }

    impl ColorMapper for Flaky {
        fn color(&self, iterations: usize, max_iterations: usize, escaped: bool) -> Color {
            if !self.tripped.swap(true, Ordering::SeqCst) {
                panic!("flaky mapper");
            }
            HsbBands.color(iterations, max_iterations, escaped)
        }
    }

    #[test]
    fn panicking_mapper_fails_one_render_only() {
        let flaky = Arc::new(Flaky {
            tripped: AtomicBool::new(false),
        });
        let raster = Rasterizer::with_mapper(1, flaky).unwrap();
        let view = ViewState::default();
        match raster.render(&view, QualityMode::Fast, 8, 8) {
            Err(RenderError::RowPanicked { generation, row }) => {
                assert_eq!(generation, 1);
                assert!(row < 8);
            }
            other => panic!("expected a lost row, got {:?}", other),
        }

        // The lone worker survived and keeps serving renders.
        let result = raster.render(&view, QualityMode::Fast, 8, 8).unwrap();
        assert_eq!(
            result.buffer,
            render_single(&view, QualityMode::Fast, &HsbBands, 8, 8).unwrap()
        );
        assert_eq!(raster.threads(), 1);
    }
}
