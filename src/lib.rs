#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mariani-Silver Mandelbrot rasterizer
//!
//! The Mandelbrot set is connected: there are no islands of "inside"
//! floating in a sea of "outside" that aren't joined to the main body
//! by some filament.  The Mariani-Silver observation is that this
//! makes per-pixel rendering mostly wasted work.  If every pixel on
//! the border of a square region of the image is inside the set, the
//! whole interior is too, and can be flood-filled without testing
//! another point.  A uniformly-outside border proves less, because a
//! filament can poke a lone member pixel into the interior without
//! touching the border; such a square only resolves early when the
//! exterior distance estimate shows the set boundary cannot reach it.
//! Any square that resolves neither way is cut into four quarters and
//! the question is asked again.
//!
//! The trick that makes this cheap is that quarters share borders.
//! Each cell remembers which of its four edges were already walked by
//! a parent, a sibling, or the previous tile, and reads those pixels
//! back out of the one-bit framebuffer instead of iterating them a
//! second time.  Only at the smallest cell size does the renderer
//! give up and test each interior pixel individually.
//!
//! The output is strictly binary membership: a bit-packed monochrome
//! [`Bitmap`](bitmap/struct.Bitmap.html) in which a set bit means
//! "inside the set."

#[macro_use]
extern crate itertools;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
extern crate num;

pub mod bitmap;
pub mod distance;
pub mod escape;
pub mod quadtree;
pub mod viewport;

pub use bitmap::Bitmap;
pub use quadtree::{MarianiRenderer, RenderError, RenderStats};
pub use viewport::Viewport;

/// The crate version, for hosts that want to display what produced
/// an image.  Entirely unrelated to rendering.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
