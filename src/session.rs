// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An exploration session: the current view, the current quality
//! mode, and the rasterizer that draws them.  Whatever front end sits
//! on top (a window, a terminal, the command line) translates its
//! input into these calls.

use log::info;

use crate::error::RenderError;
use crate::iterations::QualityMode;
use crate::raster::{Rasterizer, RenderResult};
use crate::viewport::{Direction, ViewState};

/// Zoom factor of a single zoom-in or zoom-out step.
pub const ZOOM_STEP: f64 = 1.1;

/// Zoom factor of a single auto-zoom tick.
pub const AUTO_ZOOM_STEP: f64 = 1.01;

/// Holds the state a front end mutates between renders.
pub struct Session {
    rasterizer: Rasterizer,
    view: ViewState,
    mode: QualityMode,
    width: usize,
    height: usize,
}

impl Session {
    /// A session showing the home view in fast mode.
    pub fn new(rasterizer: Rasterizer, width: usize, height: usize) -> Session {
        Session {
            rasterizer,
            view: ViewState::default(),
            mode: QualityMode::default(),
            width,
            height,
        }
    }

    /// Replaces the current view.
    pub fn with_view(mut self, view: ViewState) -> Session {
        self.view = view;
        self
    }

    /// The current view.
    pub fn view(&self) -> ViewState {
        self.view
    }

    /// The current quality mode.
    pub fn mode(&self) -> QualityMode {
        self.mode
    }

    /// Picks the quality mode for subsequent renders.
    pub fn set_mode(&mut self, mode: QualityMode) {
        self.mode = mode;
    }

    /// One step closer.
    pub fn zoom_in(&mut self) -> Result<(), RenderError> {
        self.view.zoom_by(ZOOM_STEP)
    }

    /// One step further away.
    pub fn zoom_out(&mut self) -> Result<(), RenderError> {
        self.view.zoom_by(1.0 / ZOOM_STEP)
    }

    /// One tick of the slow, continuous zoom.
    pub fn auto_zoom_step(&mut self) -> Result<(), RenderError> {
        self.view.zoom_by(AUTO_ZOOM_STEP)
    }

    /// Moves the view by one pan step.
    pub fn pan(&mut self, direction: Direction) {
        self.view.pan(direction);
    }

    /// Back to the home view.  The quality mode is left alone.
    pub fn reset(&mut self) {
        self.view.reset();
    }

    /// Renders the current view.  Any render still in flight for an
    /// older view is abandoned.
    pub fn render(&self) -> Result<RenderResult, RenderError> {
        let result = self
            .rasterizer
            .render(&self.view, self.mode, self.width, self.height)?;
        info!(
            "Render time: {} ms, zoom: {}",
            result.elapsed.as_millis(),
            self.view.zoom
        );
        Ok(result)
    }
}
