// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time membership test.
//!
//! A point c belongs to the Mandelbrot set when the orbit of
//! z = z * z + c, starting from zero, stays bounded forever.  We
//! can't wait forever, so anything still within the escape radius
//! after the iteration budget is declared a member.  That makes the
//! rendered set slightly fat -- slow escapers count as members -- but
//! it makes the test total, deterministic, and cheap, and every
//! consumer in this crate agrees on the same approximation.

use num::Complex;

/// The reference iteration budget.  Enough for a recognizable set at
/// screen resolutions while keeping the per-pixel cost bounded.
pub const MAX_ITERATIONS: usize = 64;

/// True when `c` is classified as a member of the set: the orbit's
/// squared modulus never exceeds 4 within `limit` iterations.
///
/// The recurrence tracks x², y² and w = (x+y)², which yields the
/// cross term 2xy as w - x² - y² and saves a multiplication per
/// iteration over the naive complex square.
pub fn is_member(c: Complex<f64>, limit: usize) -> bool {
    let mut x2 = 0.0_f64;
    let mut y2 = 0.0_f64;
    let mut w = 0.0_f64;

    for _ in 0..limit {
        let x = x2 - y2 + c.re;
        let y = w - x2 - y2 + c.im;
        x2 = x * x;
        y2 = y * y;
        w = (x + y) * (x + y);

        if x2 + y2 > 4.0 {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_origin_is_a_member() {
        assert!(is_member(Complex::new(0.0, 0.0), MAX_ITERATIONS));
    }

    #[test]
    fn the_period_two_attractor_is_a_member() {
        // c = -1 cycles 0, -1, 0, -1 forever.
        assert!(is_member(Complex::new(-1.0, 0.0), MAX_ITERATIONS));
    }

    #[test]
    fn the_cardioid_cusp_is_a_member() {
        // c = 0.25 creeps toward the fixed point 0.5 without escaping.
        assert!(is_member(Complex::new(0.25, 0.0), MAX_ITERATIONS));
    }

    #[test]
    fn far_points_escape_immediately() {
        assert!(!is_member(Complex::new(3.0, 3.0), MAX_ITERATIONS));
        assert!(!is_member(Complex::new(2.0, 0.0), MAX_ITERATIONS));
        assert!(!is_member(Complex::new(0.0, 2.5), MAX_ITERATIONS));
    }

    #[test]
    fn just_past_the_needle_escapes() {
        // The set's real slice ends at -2 exactly.
        assert!(is_member(Complex::new(-2.0, 0.0), MAX_ITERATIONS));
        assert!(!is_member(Complex::new(-2.01, 0.0), MAX_ITERATIONS));
    }

    #[test]
    fn classification_is_idempotent() {
        let probes = [
            Complex::new(-0.6, 0.4),
            Complex::new(0.3, 0.7),
            Complex::new(-1.401, 0.001),
        ];
        for &c in probes.iter() {
            let first = is_member(c, MAX_ITERATIONS);
            for _ in 0..8 {
                assert_eq!(is_member(c, MAX_ITERATIONS), first);
            }
        }
    }
}
