// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time test.  Once an orbit leaves the circle of radius
//! two it is guaranteed to run off to infinity, so the number of steps
//! it takes to get there is a measure of how far outside the set its
//! starting point lies.

use num::Complex;

/// The outcome of iterating a single point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Escape {
    /// Number of steps taken, never more than the budget.
    pub iterations: usize,
    /// True if the orbit left the radius-two circle within the budget.
    pub escaped: bool,
}

/// Iterates `z = z * z + c` from zero until `|z|` reaches two or
/// `limit` steps have been taken.
#[inline]
pub fn escape_time(c: Complex<f64>, limit: usize) -> Escape {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    let mut iterations = 0;
    while iterations < limit && z.norm_sqr() < 4.0 {
        z = z * z + c;
        iterations += 1;
    }
    Escape {
        iterations,
        escaped: iterations < limit,
    }
}
