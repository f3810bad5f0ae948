// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Analytic estimates of the distance from a point to the boundary
//! of the Mandelbrot set.
//!
//! Iterating z = z * z + c also lets us iterate the derivative of z
//! with respect to c, and from the pair comes a closed-form estimate
//! of how far c sits from the set's boundary.  For escaping points
//! the classic exterior formula 2|z|ln|z| / |dz/dc| applies at the
//! moment of escape.  For points that survive the whole iteration
//! budget, the orbit's closest approach to the origin nominates a
//! candidate cycle period; Newton's method polishes that orbit point
//! into the periodic point itself, and if the cycle turns out to be
//! attracting, a companion formula bounds the distance to the
//! boundary from the inside.
//!
//! Either way the estimate is only trustworthy to within a constant
//! factor (a consequence of the Koebe quarter theorem), and both
//! formulas divide by derivative magnitudes that approach zero near
//! parabolic points.  Callers receive `None` whenever the arithmetic
//! turns fragile and must fall back to testing pixels; a distance
//! estimate is an optimization, never an authority.

use num::Complex;

/// How close a derivative magnitude may come to zero before the
/// division is considered meaningless.
const DERIVATIVE_FLOOR: f64 = 1e-12;

/// A one-sided distance estimate: which side of the boundary the
/// point is on, and roughly how far away the boundary is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DistanceEstimate {
    /// The point escaped; the boundary is roughly this far away on
    /// the outside.
    Exterior(f64),
    /// The point sits in an attracting component; the boundary is
    /// roughly this far away on the inside.
    Interior(f64),
}

/// Estimate the distance from `c` to the set boundary, iterating at
/// most `limit` times.  `None` means no usable estimate: the orbit
/// neither escaped nor settled onto a provably attracting cycle, or
/// a denominator vanished.
pub fn estimate(c: Complex<f64>, limit: usize) -> Option<DistanceEstimate> {
    let one = Complex::new(1.0, 0.0);
    let mut dc = Complex::new(0.0, 0.0);
    let mut z = Complex::new(0.0, 0.0);
    let mut closest = ::std::f64::INFINITY;
    let mut candidate = z;
    let mut period = 0;

    for n in 1..=limit {
        dc = z * dc * 2.0 + one;
        z = z * z + c;

        let magnitude = z.norm();
        if magnitude > 2.0 {
            let denominator = dc.norm();
            if denominator < DERIVATIVE_FLOOR {
                return None;
            }
            let d = 2.0 * magnitude * magnitude.ln() / denominator;
            return if d.is_finite() && d > 0.0 {
                Some(DistanceEstimate::Exterior(d))
            } else {
                None
            };
        }

        // The orbit point nearest the origin is the best seed for a
        // periodic point, and the iteration count that reached it is
        // the candidate period.
        if magnitude < closest {
            closest = magnitude;
            candidate = z;
            period = n;
        }
    }

    let cycle = attractor(candidate, c, period)?;
    interior(cycle, c, period)
}

/// Polish an orbit point into the nearby periodic point of period
/// `p` with Newton's method on `f^p(w) - w`.  Diverging or stalling
/// iterations yield `None`.
fn attractor(mut w: Complex<f64>, c: Complex<f64>, p: usize) -> Option<Complex<f64>> {
    let one = Complex::new(1.0, 0.0);
    for _ in 0..32 {
        let mut z = w;
        let mut dz = one;
        for _ in 0..p {
            dz = z * dz * 2.0;
            z = z * z + c;
        }
        let denominator = dz - one;
        if denominator.norm() < DERIVATIVE_FLOOR {
            return None;
        }
        let step = (z - w) / denominator;
        w = w - step;
        if step.norm_sqr() < 1e-24 {
            return Some(w);
        }
    }
    None
}

/// The interior distance estimate for a point `c` attracted to the
/// cycle of period `p` through `z0`.  Needs four coupled derivatives
/// of the p-fold iterate, and only holds when the cycle's multiplier
/// is attracting.
fn interior(z0: Complex<f64>, c: Complex<f64>, p: usize) -> Option<DistanceEstimate> {
    let one = Complex::new(1.0, 0.0);
    let mut z = z0;
    let mut dz = one;
    let mut dzdz = Complex::new(0.0, 0.0);
    let mut dc = Complex::new(0.0, 0.0);
    let mut dcdz = Complex::new(0.0, 0.0);

    for _ in 0..p {
        dcdz = (z * dcdz + dz * dc) * 2.0;
        dc = z * dc * 2.0 + one;
        dzdz = (dz * dz + z * dzdz) * 2.0;
        dz = z * dz * 2.0;
        z = z * z + c;
    }

    if dz.norm() > 1.0 {
        // Repelling cycle: the seed was not actually an attractor.
        return None;
    }
    let pinch = one - dz;
    if pinch.norm() < DERIVATIVE_FLOOR {
        return None;
    }
    let denominator = (dcdz + dzdz * dc / pinch).norm();
    if denominator < DERIVATIVE_FLOOR {
        return None;
    }
    let d = (1.0 - dz.norm_sqr()) / denominator;
    if d.is_finite() && d > 0.0 {
        Some(DistanceEstimate::Interior(d))
    } else {
        None
    }
}
