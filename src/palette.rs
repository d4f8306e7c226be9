// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns escape velocities into colors.  The rasterizer only knows the
//! ColorMapper trait, so a palette can be swapped without touching the
//! code that walks the image.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// An RGB triple, eight bits per channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    /// The color of points inside the set.
    pub const BLACK: Color = Color(0, 0, 0);
}

/// Maps the result of an escape-time test to a color.  Implementors are
/// shared between worker threads, and must paint every point that did
/// not escape black.
pub trait ColorMapper: Send + Sync {
    /// Color for a point that took `iterations` of a possible
    /// `max_iterations` steps.
    fn color(&self, iterations: usize, max_iterations: usize, escaped: bool) -> Color;
}

/// Bands of fully saturated color that cycle around the hue wheel as
/// the escape time grows, starting from violet.
#[derive(Copy, Clone, Debug, Default)]
pub struct HsbBands;

impl ColorMapper for HsbBands {
    fn color(&self, iterations: usize, max_iterations: usize, escaped: bool) -> Color {
        if !escaped {
            return Color::BLACK;
        }
        let hue = 0.7 + (iterations as f64) / (max_iterations as f64);
        hsb_to_rgb(hue, 1.0, 1.0)
    }
}

/// Shades of gray, brighter the longer a point held out.
#[derive(Copy, Clone, Debug, Default)]
pub struct Grayscale;

impl ColorMapper for Grayscale {
    fn color(&self, iterations: usize, max_iterations: usize, escaped: bool) -> Color {
        if !escaped {
            return Color::BLACK;
        }
        let gray = (255.0 * (iterations as f64 / max_iterations as f64)) as u8;
        Color(gray, gray, gray)
    }
}

#[inline]
fn channel(v: f64) -> u8 {
    (v * 255.0 + 0.5) as u8
}

/// Standard hue/saturation/brightness to RGB conversion.  Only the
/// fractional part of `hue` matters; saturation and brightness run
/// from zero to one.
pub fn hsb_to_rgb(hue: f64, saturation: f64, brightness: f64) -> Color {
    if saturation == 0.0 {
        let v = channel(brightness);
        return Color(v, v, v);
    }
    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));
    let (r, g, b) = match (h as usize) % 6 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    };
    Color(channel(r), channel(g), channel(b))
}

/// The palettes this crate ships, by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Palette {
    /// [`HsbBands`]
    Bands,
    /// [`Grayscale`]
    Gray,
}

impl Default for Palette {
    fn default() -> Self {
        Palette::Bands
    }
}

impl Palette {
    /// A shareable mapper for this palette.
    pub fn mapper(self) -> Arc<dyn ColorMapper> {
        match self {
            Palette::Bands => Arc::new(HsbBands),
            Palette::Gray => Arc::new(Grayscale),
        }
    }
}

impl FromStr for Palette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bands" | "hsb" => Ok(Palette::Bands),
            "gray" | "grey" | "grayscale" => Ok(Palette::Gray),
            _ => Err(format!("Unknown palette '{}', expected bands or gray", s)),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Palette::Bands => write!(f, "bands"),
            Palette::Gray => write!(f, "gray"),
        }
    }
}
