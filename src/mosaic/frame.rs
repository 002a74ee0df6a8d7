/// Raw mosaic frames and the GRBG tile pattern
///
/// A Bayer sensor delivers one color sample per pixel; which color is
/// determined by a repeating 2x2 tile. This module owns the immutable
/// single-channel frame buffer and the fixed per-channel phase offsets
/// everything downstream (shaders, CPU decoder, tests) agrees on.

use crate::error::ViewerError;

/// One color channel of the mosaic, at half resolution.
///
/// The GRBG tile:
///
/// ```text
///  --------
/// | G1 | R |
/// |----|---|
/// | B  | G2|
///  --------
/// ```
///
/// R and B sit diagonally opposite; the two greens occupy the other
/// diagonal. The phase offsets are fixed by the pattern and must not be
/// altered independently of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Green1,
    Red,
    Blue,
    Green2,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Green1,
        Channel::Red,
        Channel::Blue,
        Channel::Green2,
    ];

    /// Phase offset of this channel's samples within the 2x2 tile.
    /// Plane `P` at `(i, j)` maps to the mosaic sample at
    /// `(2i + offset_x, 2j + offset_y)`.
    pub fn phase(self) -> (u32, u32) {
        match self {
            Channel::Green1 => (0, 0),
            Channel::Red => (1, 0),
            Channel::Blue => (0, 1),
            Channel::Green2 => (1, 1),
        }
    }

    /// The channel a mosaic sample at `(x, y)` belongs to.
    pub fn at(x: u32, y: u32) -> Channel {
        match (x % 2, y % 2) {
            (0, 0) => Channel::Green1,
            (1, 0) => Channel::Red,
            (0, 1) => Channel::Blue,
            _ => Channel::Green2,
        }
    }
}

/// A single raw sensor frame: `width * height` one-byte samples with an
/// implicit GRBG tile pattern. Immutable once created.
#[derive(Debug, Clone)]
pub struct MosaicFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MosaicFrame {
    /// Wrap a raw sample buffer. Dimensions must be even and the buffer
    /// must hold exactly `width * height` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ViewerError> {
        if width % 2 != 0 || height % 2 != 0 {
            return Err(ViewerError::OddDimensions(width, height));
        }
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(ViewerError::BufferSize {
                got: data.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Synthesize a mosaic from an interleaved 8-bit RGB buffer by keeping,
    /// at each pixel, the channel the tile pattern selects there. Useful
    /// for building test inputs with known per-channel content.
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32) -> Result<Self, ViewerError> {
        let pixels = (width as usize) * (height as usize);
        if rgb.len() != pixels * 3 {
            return Err(ViewerError::BufferSize {
                got: rgb.len(),
                expected: pixels * 3,
            });
        }
        let mut data = Vec::with_capacity(pixels);
        for y in 0..height {
            for x in 0..width {
                let i = ((y * width + x) as usize) * 3;
                let sample = match Channel::at(x, y) {
                    Channel::Red => rgb[i],
                    Channel::Green1 | Channel::Green2 => rgb[i + 1],
                    Channel::Blue => rgb[i + 2],
                };
                data.push(sample);
            }
        }
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample access with edge-clamp semantics, matching the GPU textures'
    /// clamp-to-edge addressing.
    pub fn sample(&self, x: u32, y: u32) -> u8 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.data[(y * self.width + x) as usize]
    }
}
