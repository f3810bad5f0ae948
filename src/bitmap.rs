// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Bitmap struct, a bit-packed monochrome pixel surface.
//!
//! Hardware framebuffers for one-bit displays commonly reserve a few
//! padding columns at the end of each row so that the row stride
//! lands on a convenient byte boundary.  The Bitmap reproduces that
//! layout: eight pixels per byte, most significant bit leftmost, and
//! an optional number of padding columns folded into the stride.
//! Every other component in this crate goes through [`get`] and
//! [`set`]; nothing else is allowed to know how the bits are packed.
//!
//! [`get`]: struct.Bitmap.html#method.get
//! [`set`]: struct.Bitmap.html#method.set

/// A fixed-size monochrome surface, one bit per pixel.  A set bit
/// means the pixel has been drawn ("inside the set" for every caller
/// in this crate); the surface starts with every bit clear.
#[derive(Clone, Debug)]
pub struct Bitmap {
    width: usize,
    height: usize,
    stride: usize,
    bits: Vec<u8>,
}

impl Bitmap {
    /// An unpadded surface: the stride is the smallest whole number
    /// of bytes that holds `width` pixels.
    pub fn new(width: usize, height: usize) -> Bitmap {
        Bitmap::with_padding(width, height, 0)
    }

    /// A surface with `padding` extra columns reserved at the end of
    /// each row, for hosts whose hardware stride is wider than the
    /// logical image.  The padding columns are not addressable; (x, y)
    /// is valid iff `x < width && y < height`.
    pub fn with_padding(width: usize, height: usize, padding: usize) -> Bitmap {
        let stride = (width + padding + 7) / 8;
        Bitmap {
            width,
            height,
            stride,
            bits: vec![0; stride * height],
        }
    }

    /// The logical width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The logical height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The row stride in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Draw one pixel.  Out-of-range coordinates are ignored rather
    /// than trusted; the subdivider is allowed to walk cells that
    /// overhang the surface.
    pub fn set(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.bits[y * self.stride + x / 8] |= 0x80 >> (x % 8);
        }
    }

    /// Read one pixel back.  Out-of-range coordinates read as unset.
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x < self.width && y < self.height {
            self.bits[y * self.stride + x / 8] & (0x80 >> (x % 8)) != 0
        } else {
            false
        }
    }

    /// Clear every pixel.
    pub fn clear(&mut self) {
        for byte in &mut self.bits {
            *byte = 0;
        }
    }

    /// The raw packed rows, `stride` bytes per row, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}
