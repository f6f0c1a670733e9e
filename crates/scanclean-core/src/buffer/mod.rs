//! RasterBuffer - the owned 8-bit image container
//!
//! Every stage of the pipeline consumes and produces a `RasterBuffer`.
//!
//! # Pixel layout
//!
//! - One byte per channel, channels interleaved, rows packed without padding
//! - Color order is BGR / BGRA, matching what scanner drivers hand over
//! - A Lab buffer stores L scaled to 0..255 and a/b offset by 128
//!
//! # Ownership model
//!
//! Buffers are plain move-only values. Transforms return a new buffer;
//! only the explicitly named in-place helpers (`fill_*`, `paste`) mutate.

mod convert;
mod draw;

pub use convert::{Lab, bgr_to_lab, lab_to_bgr, luma};

use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Interpretation of the channels in a [`RasterBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// Single 8-bit intensity channel
    Gray,
    /// Blue, green, red
    Bgr,
    /// Blue, green, red, alpha
    Bgra,
    /// CIE L*a*b*, 8-bit encoded
    Lab,
}

impl PixelLayout {
    /// Number of interleaved channels.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Bgr | PixelLayout::Lab => 3,
            PixelLayout::Bgra => 4,
        }
    }

    /// Layout for a raw channel count (3 is taken to be BGR).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedChannels`] for anything but 1, 3 or 4.
    pub fn from_channels(channels: u32) -> Result<Self> {
        match channels {
            1 => Ok(PixelLayout::Gray),
            3 => Ok(PixelLayout::Bgr),
            4 => Ok(PixelLayout::Bgra),
            n => Err(Error::UnsupportedChannels(n)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelLayout::Gray => "gray",
            PixelLayout::Bgr => "bgr",
            PixelLayout::Bgra => "bgra",
            PixelLayout::Lab => "lab",
        }
    }
}

/// Owned, mutable 2D pixel buffer.
///
/// A zero-sized buffer (see [`RasterBuffer::empty`]) represents "no result";
/// every other buffer has `width > 0` and `height > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl RasterBuffer {
    /// Create a zero-filled buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if either dimension is zero.
    pub fn new(width: u32, height: u32, layout: PixelLayout) -> Result<Self> {
        Self::new_filled(width, height, layout, 0)
    }

    /// Create a buffer with every byte set to `value`.
    pub fn new_filled(width: u32, height: u32, layout: PixelLayout, value: u8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let len = width as usize * height as usize * layout.channels();
        Ok(Self {
            width,
            height,
            layout,
            data: vec![value; len],
        })
    }

    /// Wrap existing interleaved bytes.
    ///
    /// # Errors
    ///
    /// Fails on zero dimensions or when `data.len()` does not match.
    pub fn from_raw(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(Error::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// The "no result" buffer.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            layout: PixelLayout::Gray,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Full-image rectangle.
    pub fn bounds(&self) -> Rect {
        Rect::new_unchecked(0, 0, self.width as i32, self.height as i32)
    }

    /// Fail with [`Error::EmptyInput`] for the zero-sized buffer.
    pub fn ensure_not_empty(&self, what: &'static str) -> Result<()> {
        if self.is_empty() {
            Err(Error::EmptyInput(what))
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let s = self.stride();
        let start = y as usize * s;
        &self.data[start..start + s]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let s = self.stride();
        let start = y as usize * s;
        &mut self.data[start..start + s]
    }

    /// Channel slice of one pixel.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels();
        let i = (y as usize * self.width as usize + x as usize) * c;
        &self.data[i..i + c]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let c = self.channels();
        let i = (y as usize * self.width as usize + x as usize) * c;
        &mut self.data[i..i + c]
    }

    /// First channel of a pixel (the intensity for gray buffers).
    #[inline]
    pub fn get_unchecked(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize * self.width as usize + x as usize) * self.channels()]
    }

    /// Set every channel of a pixel to `value`.
    #[inline]
    pub fn set_unchecked(&mut self, x: u32, y: u32, value: u8) {
        for v in self.pixel_mut(x, y) {
            *v = value;
        }
    }

    /// Bounds-checked intensity read for gray buffers.
    pub fn get_gray(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height && self.layout == PixelLayout::Gray {
            Some(self.data[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Require a gray buffer.
    pub fn ensure_gray(&self) -> Result<()> {
        if self.layout == PixelLayout::Gray {
            Ok(())
        } else {
            Err(Error::UnsupportedLayout {
                expected: "gray",
                actual: self.layout.name(),
            })
        }
    }

    /// Require the same width and height as `other`.
    pub fn ensure_same_size(&self, width: u32, height: u32) -> Result<()> {
        if self.width == width && self.height == height {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: (width, height),
                actual: (self.width, self.height),
            })
        }
    }

    /// Copy out a rectangle, clipped to the image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] when the clipped region is empty.
    pub fn crop(&self, rect: &Rect) -> Result<RasterBuffer> {
        let r = rect.clip_to(self.width, self.height).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "crop {:?} lies outside {}x{}",
                rect, self.width, self.height
            ))
        })?;
        let c = self.channels();
        let mut data = Vec::with_capacity(r.w as usize * r.h as usize * c);
        for y in r.y..r.bottom() {
            let row = self.row(y as u32);
            data.extend_from_slice(&row[r.x as usize * c..r.right() as usize * c]);
        }
        RasterBuffer::from_raw(r.w as u32, r.h as u32, self.layout, data)
    }

    /// Mean of the first channel over a rectangle (clipped).
    pub fn mean_in_rect(&self, rect: &Rect) -> Option<f64> {
        let r = rect.clip_to(self.width, self.height)?;
        let mut sum = 0u64;
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                sum += self.get_unchecked(x as u32, y as u32) as u64;
            }
        }
        Some(sum as f64 / r.area() as f64)
    }
}
