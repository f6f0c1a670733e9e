//! Conversion to and from `image` crate buffers
//!
//! Hosts that decode with the `image` crate hand over RGB(A) data; the
//! conversion swaps channels into BGR(A) order and back.

use crate::buffer::{PixelLayout, RasterBuffer};
use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

impl RasterBuffer {
    /// Convert a decoded image. 16-bit and float images are reduced to 8 bits.
    pub fn from_dynamic(img: &DynamicImage) -> Result<RasterBuffer> {
        match img {
            DynamicImage::ImageLuma8(g) => {
                RasterBuffer::from_raw(g.width(), g.height(), PixelLayout::Gray, g.as_raw().clone())
            }
            DynamicImage::ImageRgba8(_) | DynamicImage::ImageLumaA8(_) => {
                let rgba = img.to_rgba8();
                let mut data = rgba.into_raw();
                for px in data.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
                RasterBuffer::from_raw(img.width(), img.height(), PixelLayout::Bgra, data)
            }
            _ => {
                let mut data = img.to_rgb8().into_raw();
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                RasterBuffer::from_raw(img.width(), img.height(), PixelLayout::Bgr, data)
            }
        }
    }

    /// Convert into an `image` crate buffer for preview or encoding.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width(), self.height());
        match self.layout() {
            PixelLayout::Gray => {
                let data = self.data().to_vec();
                let actual = data.len();
                GrayImage::from_raw(w, h, data)
                    .map(DynamicImage::ImageLuma8)
                    .ok_or_else(|| raw_mismatch(w, h, 1, actual))
            }
            PixelLayout::Bgra => {
                let mut data = self.data().to_vec();
                for px in data.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
                let actual = data.len();
                RgbaImage::from_raw(w, h, data)
                    .map(DynamicImage::ImageRgba8)
                    .ok_or_else(|| raw_mismatch(w, h, 4, actual))
            }
            PixelLayout::Bgr | PixelLayout::Lab => {
                let mut data = self.to_bgr().into_raw();
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                let actual = data.len();
                RgbImage::from_raw(w, h, data)
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(|| raw_mismatch(w, h, 3, actual))
            }
        }
    }
}

fn raw_mismatch(width: u32, height: u32, channels: usize, actual: usize) -> Error {
    Error::DataLength {
        expected: width as usize * height as usize * channels,
        actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_swaps_to_bgr() {
        let rgb = RgbImage::from_raw(1, 1, vec![10, 20, 30]).unwrap();
        let buf = RasterBuffer::from_dynamic(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(buf.layout(), PixelLayout::Bgr);
        assert_eq!(buf.pixel(0, 0), &[30, 20, 10]);
        let back = buf.to_dynamic().unwrap().to_rgb8();
        assert_eq!(back.as_raw(), &vec![10, 20, 30]);
    }

    #[test]
    fn test_to_dynamic_keeps_geometry() {
        let gray = RasterBuffer::new_filled(5, 3, PixelLayout::Gray, 77).unwrap();
        let img = gray.to_dynamic().unwrap();
        assert_eq!((img.width(), img.height()), (5, 3));
        assert!(matches!(img, DynamicImage::ImageLuma8(_)));

        let bgra = RasterBuffer::from_raw(1, 1, PixelLayout::Bgra, vec![1, 2, 3, 4]).unwrap();
        let back = bgra.to_dynamic().unwrap().to_rgba8();
        assert_eq!(back.as_raw(), &vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_raw_mismatch_reports_lengths() {
        let err = raw_mismatch(4, 2, 3, 5);
        assert!(matches!(err, Error::DataLength { expected: 24, actual: 5 }));
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
    }
}
