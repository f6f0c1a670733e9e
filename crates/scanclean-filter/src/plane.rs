//! FloatPlane - single-channel f32 working image
//!
//! Log-domain and gradient computations need more range than 8 bits.

use crate::{FilterError, FilterResult};
use scanclean_core::{PixelLayout, RasterBuffer};

/// Row-major f32 image.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatPlane {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl FloatPlane {
    /// Zero-filled plane.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    /// Wrap existing samples.
    pub fn from_vec(width: u32, height: u32, data: Vec<f32>) -> FilterResult<Self> {
        if data.len() != width as usize * height as usize {
            return Err(FilterError::InvalidParameters(format!(
                "plane data length {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Intensity plane of a buffer (first channel after gray conversion).
    pub fn from_gray(buf: &RasterBuffer) -> Self {
        let gray = buf.to_gray();
        Self {
            width: gray.width(),
            height: gray.height(),
            data: gray.data().iter().map(|&v| v as f32).collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, v: f32) {
        self.data[y as usize * self.width as usize + x as usize] = v;
    }

    /// Apply `f` to every sample.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> FloatPlane {
        FloatPlane {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Round and clamp to an 8-bit gray buffer.
    pub fn to_gray_clamped(&self) -> FilterResult<RasterBuffer> {
        let data = self
            .data
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        Ok(RasterBuffer::from_raw(
            self.width,
            self.height,
            PixelLayout::Gray,
            data,
        )?)
    }
}
