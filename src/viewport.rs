// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport struct, which describes a relationship
//! between a rectangle on the integral pixel plane with an origin at
//! 0,0 and a rectangle on the complex plane with arbitrary corners.
//!
//! Unlike an image crate's notion of a rectangle, the complex-plane
//! corners are deliberately unordered: the reference view runs from
//! -2.5+1.0i down to 1.0-1.0i, so the imaginary step is negative and
//! rows descend through the plane.  That is normal and supported.  A
//! viewport whose steps come out zero or non-finite is *degenerate*,
//! and rendering one is defined to be a no-op rather than an error.

use num::Complex;

/// Maps pixel coordinates to sample points on the complex plane.
/// Created fresh for each render call and immutable afterward.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    width: usize,
    height: usize,
    origin: Complex<f64>,
    step_x: f64,
    step_y: f64,
}

impl Viewport {
    /// Constructor.  `start` is the plane coordinate of the image's
    /// top-left corner and `stop` of its bottom-right; the per-pixel
    /// steps follow from the image resolution.  Inverted or zero-area
    /// bounds are accepted and produce a degenerate viewport.
    pub fn new(width: usize, height: usize, start: Complex<f64>, stop: Complex<f64>) -> Viewport {
        let step_x = if width == 0 {
            0.0
        } else {
            (stop.re - start.re) / (width as f64)
        };
        let step_y = if height == 0 {
            0.0
        } else {
            (stop.im - start.im) / (height as f64)
        };
        Viewport {
            width,
            height,
            origin: start,
            step_x,
            step_y,
        }
    }

    /// The image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The per-pixel step sizes.  The imaginary step is negative in
    /// the usual top-down view.
    pub fn step(&self) -> (f64, f64) {
        (self.step_x, self.step_y)
    }

    /// True when the viewport cannot be iterated meaningfully: zero
    /// resolution, a zero-width region, or non-finite bounds.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.step_x == 0.0
            || self.step_y == 0.0
            || !self.step_x.is_finite()
            || !self.step_y.is_finite()
            || !self.origin.re.is_finite()
            || !self.origin.im.is_finite()
    }

    /// Map fractional pixel coordinates to the plane.  Used for cell
    /// centers, which land between pixels.
    pub fn point(&self, column: f64, row: f64) -> Complex<f64> {
        Complex {
            re: self.origin.re + column * self.step_x,
            im: self.origin.im + row * self.step_y,
        }
    }

    /// The sample point for pixel (column, row): the *center* of the
    /// pixel's cell, half a step in from its corner.  Center sampling
    /// avoids a systematic bias along the image's edges, and every
    /// consumer -- the membership test, the distance estimator, and
    /// any brute-force comparison -- must use this one mapping so
    /// their answers agree bit for bit.
    pub fn pixel_center(&self, column: usize, row: usize) -> Complex<f64> {
        self.point(column as f64 + 0.5, row as f64 + 0.5)
    }
}
