//! BinaryMask - single-channel {0, 255} masks
//!
//! Foreground is 255. Ink masks use foreground for text, rules and other
//! dark marks; selection masks use it for "pixels chosen by a predicate".

use crate::buffer::{PixelLayout, RasterBuffer};
use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Foreground value
pub const MASK_ON: u8 = 255;
/// Background value
pub const MASK_OFF: u8 = 0;

/// Single-channel mask whose values are constrained to {0, 255}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BinaryMask {
    /// All-background mask.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(Self {
            width,
            height,
            data: vec![MASK_OFF; width as usize * height as usize],
        })
    }

    /// Mask of the same size as `buf`.
    pub fn like(buf: &RasterBuffer) -> Result<Self> {
        Self::new(buf.width(), buf.height())
    }

    /// Build from a gray buffer; any non-zero value becomes foreground.
    pub fn from_gray(gray: &RasterBuffer) -> Result<Self> {
        gray.ensure_gray()?;
        gray.ensure_not_empty("mask source")?;
        Ok(Self {
            width: gray.width(),
            height: gray.height(),
            data: gray
                .data()
                .iter()
                .map(|&v| if v != 0 { MASK_ON } else { MASK_OFF })
                .collect(),
        })
    }

    /// Build by testing every pixel of a gray buffer.
    pub fn from_predicate(gray: &RasterBuffer, pred: impl Fn(u8) -> bool) -> Result<Self> {
        gray.ensure_gray()?;
        gray.ensure_not_empty("mask source")?;
        Ok(Self {
            width: gray.width(),
            height: gray.height(),
            data: gray
                .data()
                .iter()
                .map(|&v| if pred(v) { MASK_ON } else { MASK_OFF })
                .collect(),
        })
    }

    /// Wrap raw bytes, normalizing non-zero to 255.
    pub fn from_raw(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::DataLength {
                expected,
                actual: data.len(),
            });
        }
        for v in &mut data {
            if *v != 0 {
                *v = MASK_ON;
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get_unchecked(&self, x: u32, y: u32) -> bool {
        self.data[y as usize * self.width as usize + x as usize] != 0
    }

    /// Bounds-checked read; outside pixels read as background.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as u32) < self.width
            && (y as u32) < self.height
            && self.get_unchecked(x as u32, y as u32)
    }

    #[inline]
    pub fn set_unchecked(&mut self, x: u32, y: u32, on: bool) {
        self.data[y as usize * self.width as usize + x as usize] =
            if on { MASK_ON } else { MASK_OFF };
    }

    /// Bounds-checked write; outside pixels are ignored.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, on: bool) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            self.set_unchecked(x as u32, y as u32, on);
        }
    }

    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        &self.data[y as usize * w..(y as usize + 1) * w]
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Number of foreground pixels inside a rectangle (clipped).
    pub fn count_in_rect(&self, rect: &Rect) -> usize {
        let Some(r) = rect.clip_to(self.width, self.height) else {
            return 0;
        };
        (r.y..r.bottom())
            .map(|y| {
                self.row(y as u32)[r.x as usize..r.right() as usize]
                    .iter()
                    .filter(|&&v| v != 0)
                    .count()
            })
            .sum()
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    pub fn ensure_same_size(&self, other: &BinaryMask) -> Result<()> {
        if self.width == other.width && self.height == other.height {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: (self.width, self.height),
                actual: (other.width, other.height),
            })
        }
    }

    /// Swap foreground and background.
    pub fn invert(&self) -> BinaryMask {
        BinaryMask {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| MASK_ON - v).collect(),
        }
    }

    /// In-place union.
    pub fn or_assign(&mut self, other: &BinaryMask) -> Result<()> {
        self.ensure_same_size(other)?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a |= b;
        }
        Ok(())
    }

    /// Intersection.
    pub fn and(&self, other: &BinaryMask) -> Result<BinaryMask> {
        self.ensure_same_size(other)?;
        Ok(BinaryMask {
            width: self.width,
            height: self.height,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a & b).collect(),
        })
    }

    /// Tight bounding box of the foreground, `None` when blank.
    pub fn bounding_box(&self) -> Option<Rect> {
        let (mut x0, mut y0) = (u32::MAX, u32::MAX);
        let (mut x1, mut y1) = (0u32, 0u32);
        for y in 0..self.height {
            let row = self.row(y);
            let Some(first) = row.iter().position(|&v| v != 0) else {
                continue;
            };
            let last = row.iter().rposition(|&v| v != 0).unwrap_or(first);
            x0 = x0.min(first as u32);
            x1 = x1.max(last as u32);
            y0 = y0.min(y);
            y1 = y1.max(y);
        }
        (x0 != u32::MAX).then(|| Rect::from_inclusive(x0 as i32, y0 as i32, x1 as i32, y1 as i32))
    }

    /// Foreground count per row.
    pub fn row_counts(&self) -> Vec<u32> {
        (0..self.height)
            .map(|y| self.row(y).iter().filter(|&&v| v != 0).count() as u32)
            .collect()
    }

    /// Foreground count per column.
    pub fn column_counts(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.width as usize];
        for y in 0..self.height {
            for (c, &v) in counts.iter_mut().zip(self.row(y)) {
                if v != 0 {
                    *c += 1;
                }
            }
        }
        counts
    }

    /// Foreground pixel coordinates in raster order.
    pub fn points(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let w = self.width as usize;
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(move |(i, _)| ((i % w) as u32, (i / w) as u32))
    }

    /// Copy out a rectangle (clipped).
    pub fn crop(&self, rect: &Rect) -> Result<BinaryMask> {
        let r = rect.clip_to(self.width, self.height).ok_or_else(|| {
            Error::InvalidParameter(format!("crop {rect:?} lies outside the mask"))
        })?;
        let mut data = Vec::with_capacity(r.area() as usize);
        for y in r.y..r.bottom() {
            data.extend_from_slice(&self.row(y as u32)[r.x as usize..r.right() as usize]);
        }
        Ok(BinaryMask {
            width: r.w as u32,
            height: r.h as u32,
            data,
        })
    }

    /// Gray buffer view of the mask (0 / 255).
    pub fn to_gray(&self) -> RasterBuffer {
        RasterBuffer::from_raw(self.width, self.height, PixelLayout::Gray, self.data.clone())
            .unwrap_or_else(|_| RasterBuffer::empty())
    }

    /// Bitonal BGR rendering: foreground black on white.
    pub fn to_bitonal_bgr(&self) -> RasterBuffer {
        let mut data = Vec::with_capacity(self.data.len() * 3);
        for &v in &self.data {
            let out = MASK_ON - v;
            data.extend_from_slice(&[out, out, out]);
        }
        RasterBuffer::from_raw(self.width, self.height, PixelLayout::Bgr, data)
            .unwrap_or_else(|_| RasterBuffer::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(w: u32, h: u32, on: &[(u32, u32)]) -> BinaryMask {
        let mut m = BinaryMask::new(w, h).unwrap();
        for &(x, y) in on {
            m.set_unchecked(x, y, true);
        }
        m
    }

    #[test]
    fn test_from_raw_normalizes() {
        let m = BinaryMask::from_raw(2, 2, vec![0, 1, 7, 255]).unwrap();
        assert_eq!(m.data(), &[0, 255, 255, 255]);
    }

    #[test]
    fn test_bounding_box() {
        let m = mask_from(10, 10, &[(2, 3), (7, 5), (4, 8)]);
        assert_eq!(m.bounding_box(), Some(Rect::new_unchecked(2, 3, 6, 6)));
        assert_eq!(BinaryMask::new(3, 3).unwrap().bounding_box(), None);
    }

    #[test]
    fn test_counts() {
        let m = mask_from(4, 3, &[(0, 0), (1, 0), (1, 2)]);
        assert_eq!(m.row_counts(), vec![2, 0, 1]);
        assert_eq!(m.column_counts(), vec![1, 2, 0, 0]);
        assert_eq!(m.count(), 3);
        assert_eq!(m.count_in_rect(&Rect::new_unchecked(1, 0, 3, 3)), 2);
    }

    #[test]
    fn test_invert_and_union() {
        let a = mask_from(2, 1, &[(0, 0)]);
        let mut b = a.invert();
        assert_eq!(b.data(), &[0, 255]);
        b.or_assign(&a).unwrap();
        assert_eq!(b.count(), 2);
        assert_eq!(a.and(&a.invert()).unwrap().count(), 0);
    }

    #[test]
    fn test_size_mismatch() {
        let mut a = BinaryMask::new(2, 2).unwrap();
        let b = BinaryMask::new(3, 2).unwrap();
        assert!(a.or_assign(&b).is_err());
    }
}
