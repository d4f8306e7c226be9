// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! How long to iterate a point before we give up and call it bounded.
//! The deeper we zoom, the finer the detail near the boundary, and the
//! more iterations it takes to tell an escaping point from a trapped
//! one.

use std::fmt;
use std::str::FromStr;

/// Selects the iteration budget policy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QualityMode {
    /// A budget that grows only logarithmically with zoom.
    Fast,
    /// Adds another hundred iterations for every power of ten of zoom.
    Scaled,
}

impl Default for QualityMode {
    fn default() -> Self {
        QualityMode::Fast
    }
}

impl QualityMode {
    /// The maximum number of iterations for a point at the given zoom.
    /// `zoom` must be greater than zero.
    pub fn max_iterations(self, zoom: f64) -> usize {
        let mut base = 100.0;
        if self == QualityMode::Scaled && zoom > 1.0 {
            base += zoom.log10().floor() * 100.0;
        }
        (base + (1.0 + zoom).ln()).floor() as usize
    }
}

impl FromStr for QualityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(QualityMode::Fast),
            "scaled" => Ok(QualityMode::Scaled),
            _ => Err(format!("Unknown quality mode '{}', expected fast or scaled", s)),
        }
    }
}

impl fmt::Display for QualityMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QualityMode::Fast => write!(f, "fast"),
            QualityMode::Scaled => write!(f, "scaled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_budget_at_home_zoom() {
        assert_eq!(QualityMode::Fast.max_iterations(300.0), 105);
    }

    #[test]
    fn scaled_budget_adds_a_hundred_per_decade() {
        assert_eq!(QualityMode::Scaled.max_iterations(300.0), 305);
        assert_eq!(QualityMode::Scaled.max_iterations(20.0), 203);
        assert_eq!(QualityMode::Scaled.max_iterations(2.0e6), 714);
    }

    #[test]
    fn scaled_equals_fast_below_unit_zoom() {
        for &zoom in &[0.001, 0.5, 1.0] {
            assert_eq!(
                QualityMode::Scaled.max_iterations(zoom),
                QualityMode::Fast.max_iterations(zoom)
            );
        }
    }

    #[test]
    fn scaled_never_below_fast_when_zoomed_in() {
        let mut zoom = 1.5;
        while zoom < 1.0e12 {
            let fast = QualityMode::Fast.max_iterations(zoom);
            let scaled = QualityMode::Scaled.max_iterations(zoom);
            assert!(fast > 0);
            assert!(scaled >= fast, "zoom {}: {} < {}", zoom, scaled, fast);
            zoom *= 3.7;
        }
    }

    #[test]
    fn tiny_zoom_still_gets_a_budget() {
        assert_eq!(QualityMode::Fast.max_iterations(1.0e-9), 100);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("fast".parse::<QualityMode>(), Ok(QualityMode::Fast));
        assert_eq!("Scaled".parse::<QualityMode>(), Ok(QualityMode::Scaled));
        assert!("turbo".parse::<QualityMode>().is_err());
    }
}
