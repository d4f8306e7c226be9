// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the ViewState struct, which describes the window we hold
//! up to the complex plane: where its center sits and how many pixels
//! one unit of the complex plane is stretched across.  Maps pixels of
//! an integral plane with its origin at 0,0 onto points of that
//! window.

use num::Complex;

use crate::error::RenderError;

/// Describes the x, y of a pixel in an image.  Column first, then
/// row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The direction of a single pan step.  Up moves the view toward
/// negative imaginary values, since pixel rows grow downward.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Toward smaller imaginary values.
    Up,
    /// Toward larger imaginary values.
    Down,
    /// Toward smaller real values.
    Left,
    /// Toward larger real values.
    Right,
}

/// The center and scale of the visible part of the complex plane.
/// This is a plain value: every render works on its own copy, so
/// panning or zooming while a render is in flight cannot tear it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Real part of the point drawn at the center of the image.
    pub x_offset: f64,
    /// Imaginary part of the point drawn at the center of the image.
    pub y_offset: f64,
    /// Pixels per unit of the complex plane.  Always greater than zero.
    pub zoom: f64,
}

impl Default for ViewState {
    /// The home view: the whole set, slightly left of center.
    fn default() -> Self {
        ViewState {
            x_offset: -0.5,
            y_offset: 0.0,
            zoom: 300.0,
        }
    }
}

impl ViewState {
    /// Constructor.  Refuses a zoom that is not a finite positive
    /// number, since no sensible geometry comes out of one.
    pub fn new(x_offset: f64, y_offset: f64, zoom: f64) -> Result<ViewState, RenderError> {
        let view = ViewState {
            x_offset,
            y_offset,
            zoom,
        };
        view.validate()?;
        Ok(view)
    }

    /// Checks the zoom invariant.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            Ok(())
        } else {
            Err(RenderError::InvalidZoom(self.zoom))
        }
    }

    /// The point on the complex plane drawn at the center of the image.
    pub fn center(&self) -> Complex<f64> {
        Complex::new(self.x_offset, self.y_offset)
    }

    /// How far one pan step moves the view: twenty pixels' worth at
    /// the current zoom.
    pub fn pan_speed(&self) -> f64 {
        20.0 / self.zoom
    }

    /// Moves the center by one pan step.
    pub fn pan(&mut self, direction: Direction) {
        let step = self.pan_speed();
        match direction {
            Direction::Up => self.y_offset -= step,
            Direction::Down => self.y_offset += step,
            Direction::Left => self.x_offset -= step,
            Direction::Right => self.x_offset += step,
        }
    }

    /// Multiplies the zoom by `factor`.  A factor that would break the
    /// zoom invariant is refused and the view left as it was.
    pub fn zoom_by(&mut self, factor: f64) -> Result<(), RenderError> {
        let zoomed = ViewState {
            zoom: self.zoom * factor,
            ..*self
        };
        zoomed.validate()?;
        *self = zoomed;
        Ok(())
    }

    /// Returns to the home view.
    pub fn reset(&mut self) {
        *self = ViewState::default();
    }

    /// Given a pixel of an image `width` by `height` pixels, return the
    /// point on the complex plane it stands for.  The image's middle
    /// pixel lands exactly on the view's center.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel, width: usize, height: usize) -> Complex<f64> {
        Complex::new(
            (pixel.0 as f64 - (width / 2) as f64) / self.zoom + self.x_offset,
            (pixel.1 as f64 - (height / 2) as f64) / self.zoom + self.y_offset,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_pixel_maps_to_offset() {
        for &zoom in &[0.25, 1.0, 300.0, 1.0e9] {
            let view = ViewState::new(-0.75, 0.1, zoom).unwrap();
            assert_eq!(view.pixel_to_point(&Pixel(400, 300), 800, 600), view.center());
        }
    }

    #[test]
    fn corner_pixel_on_home_view() {
        let view = ViewState::default();
        let corner = view.pixel_to_point(&Pixel(0, 0), 800, 800);
        assert!((corner.re - (-400.0 / 300.0 - 0.5)).abs() < 1e-12);
        assert!((corner.im - (-400.0 / 300.0)).abs() < 1e-12);
    }

    #[test]
    fn odd_dimensions_use_integer_halves() {
        let view = ViewState::new(0.0, 0.0, 1.0).unwrap();
        assert_eq!(view.pixel_to_point(&Pixel(2, 1), 5, 3), Complex::new(0.0, 0.0));
    }

    #[test]
    fn new_rejects_bad_zoom() {
        assert_eq!(ViewState::new(0.0, 0.0, 0.0), Err(RenderError::InvalidZoom(0.0)));
        assert!(ViewState::new(0.0, 0.0, -2.0).is_err());
        assert!(ViewState::new(0.0, 0.0, std::f64::NAN).is_err());
        assert!(ViewState::new(0.0, 0.0, std::f64::INFINITY).is_err());
    }

    #[test]
    fn pan_moves_by_pan_speed() {
        let mut view = ViewState::default();
        let step = 20.0 / 300.0;
        view.pan(Direction::Right);
        view.pan(Direction::Up);
        assert!((view.x_offset - (-0.5 + step)).abs() < 1e-12);
        assert!((view.y_offset + step).abs() < 1e-12);
        view.pan(Direction::Left);
        view.pan(Direction::Down);
        assert!((view.x_offset + 0.5).abs() < 1e-12);
        assert!(view.y_offset.abs() < 1e-12);
    }

    #[test]
    fn zoom_by_refuses_to_collapse() {
        let mut view = ViewState::default();
        assert!(view.zoom_by(0.0).is_err());
        assert!(view.zoom_by(-1.1).is_err());
        assert_eq!(view, ViewState::default());
        view.zoom_by(2.0).unwrap();
        assert_eq!(view.zoom, 600.0);
    }

    #[test]
    fn reset_returns_home() {
        let mut view = ViewState::new(1.0, 1.0, 12.0).unwrap();
        view.reset();
        assert_eq!(view, ViewState::default());
    }
}
