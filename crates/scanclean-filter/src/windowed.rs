//! Windowed statistics using integral images
//!
//! Local mean and standard deviation over square windows in O(1) per pixel
//! using summed area tables. Windows are clipped at the image border and
//! normalized by the number of pixels actually covered.

use crate::{FilterError, FilterResult, FloatPlane};
use scanclean_core::{CancelToken, RasterBuffer};

/// Summed area tables of values and squared values.
///
/// Both tables have one extra leading row and column of zeros, so
/// `sum[(y + 1) * (w + 1) + (x + 1)]` covers the rectangle `[0, x] x [0, y]`.
pub struct IntegralImage {
    width: u32,
    height: u32,
    sum: Vec<f64>,
    sqsum: Vec<f64>,
}

impl IntegralImage {
    /// Build the tables from a gray buffer.
    pub fn new(gray: &RasterBuffer) -> FilterResult<Self> {
        gray.ensure_gray()?;
        gray.ensure_not_empty("integral image source")?;
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0f64; stride * (h + 1)];
        let mut sqsum = vec![0.0f64; stride * (h + 1)];
        for y in 0..h {
            let row = gray.row(y as u32);
            let (mut rs, mut rq) = (0.0f64, 0.0f64);
            for x in 0..w {
                let v = row[x] as f64;
                rs += v;
                rq += v * v;
                let i = (y + 1) * stride + x + 1;
                sum[i] = sum[i - stride] + rs;
                sqsum[i] = sqsum[i - stride] + rq;
            }
        }
        Ok(Self {
            width: gray.width(),
            height: gray.height(),
            sum,
            sqsum,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn table_rect(table: &[f64], stride: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        table[y1 * stride + x1] - table[y0 * stride + x1] - table[y1 * stride + x0]
            + table[y0 * stride + x0]
    }

    /// Clip the window of half-size `half` centered on (x, y).
    #[inline]
    fn window(&self, x: u32, y: u32, half: u32) -> (usize, usize, usize, usize) {
        let x0 = x.saturating_sub(half) as usize;
        let y0 = y.saturating_sub(half) as usize;
        let x1 = (x + half + 1).min(self.width) as usize;
        let y1 = (y + half + 1).min(self.height) as usize;
        (x0, y0, x1, y1)
    }

    /// Sum and pixel count over the half-open rectangle `[x0, x1) x [y0, y1)`.
    pub fn rect_sum(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> (f64, usize) {
        let x1 = x1.min(self.width) as usize;
        let y1 = y1.min(self.height) as usize;
        let (x0, y0) = ((x0 as usize).min(x1), (y0 as usize).min(y1));
        let stride = self.width as usize + 1;
        (
            Self::table_rect(&self.sum, stride, x0, y0, x1, y1),
            (x1 - x0) * (y1 - y0),
        )
    }

    /// Mean and standard deviation of the clipped window around (x, y).
    #[inline]
    pub fn mean_std(&self, x: u32, y: u32, half: u32) -> (f64, f64) {
        let (x0, y0, x1, y1) = self.window(x, y, half);
        let stride = self.width as usize + 1;
        let n = ((x1 - x0) * (y1 - y0)) as f64;
        let s = Self::table_rect(&self.sum, stride, x0, y0, x1, y1);
        let q = Self::table_rect(&self.sqsum, stride, x0, y0, x1, y1);
        let mean = s / n;
        let var = (q / n - mean * mean).max(0.0);
        (mean, var.sqrt())
    }

    /// Mean of the clipped window around (x, y).
    #[inline]
    pub fn mean(&self, x: u32, y: u32, half: u32) -> f64 {
        let (x0, y0, x1, y1) = self.window(x, y, half);
        let stride = self.width as usize + 1;
        let n = ((x1 - x0) * (y1 - y0)) as f64;
        Self::table_rect(&self.sum, stride, x0, y0, x1, y1) / n
    }
}

fn check_window(window: u32) -> FilterResult<u32> {
    if window == 0 || window % 2 == 0 {
        return Err(FilterError::InvalidParameters(format!(
            "window must be a positive odd size, got {window}"
        )));
    }
    Ok(window / 2)
}

/// Local mean over a `window` x `window` box.
pub fn box_mean(gray: &RasterBuffer, window: u32) -> FilterResult<FloatPlane> {
    let half = check_window(window)?;
    let ii = IntegralImage::new(gray)?;
    let mut out = FloatPlane::new(gray.width(), gray.height());
    for y in 0..gray.height() {
        for x in 0..gray.width() {
            out.set(x, y, ii.mean(x, y, half) as f32);
        }
    }
    Ok(out)
}

/// Local mean and standard deviation over a `window` x `window` box.
///
/// Polls `cancel` once per row.
pub fn box_mean_std(
    gray: &RasterBuffer,
    window: u32,
    cancel: &CancelToken,
) -> FilterResult<(FloatPlane, FloatPlane)> {
    let half = check_window(window)?;
    let ii = IntegralImage::new(gray)?;
    let mut mean = FloatPlane::new(gray.width(), gray.height());
    let mut std = FloatPlane::new(gray.width(), gray.height());
    for y in 0..gray.height() {
        cancel.check()?;
        for x in 0..gray.width() {
            let (m, s) = ii.mean_std(x, y, half);
            mean.set(x, y, m as f32);
            std.set(x, y, s as f32);
        }
    }
    Ok((mean, std))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::PixelLayout;

    fn ramp(w: u32, h: u32) -> RasterBuffer {
        let data = (0..h).flat_map(|_| (0..w).map(|x| (x * 10) as u8)).collect();
        RasterBuffer::from_raw(w, h, PixelLayout::Gray, data).unwrap()
    }

    #[test]
    fn test_rect_sum() {
        let ii = IntegralImage::new(&ramp(5, 3)).unwrap();
        let (s, n) = ii.rect_sum(1, 0, 3, 3);
        assert_eq!(n, 6);
        assert_eq!(s, 3.0 * (10.0 + 20.0));
    }

    #[test]
    fn test_constant_has_zero_std() {
        let gray = RasterBuffer::new_filled(9, 9, PixelLayout::Gray, 77).unwrap();
        let (m, s) = box_mean_std(&gray, 5, &CancelToken::none()).unwrap();
        assert!(m.data().iter().all(|&v| (v - 77.0).abs() < 1e-4));
        assert!(s.data().iter().all(|&v| v.abs() < 1e-3));
    }

    #[test]
    fn test_clipped_window_at_corner() {
        let ii = IntegralImage::new(&ramp(5, 3)).unwrap();
        // window covers x in 0..=1 at the left edge
        assert!((ii.mean(0, 1, 1) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_even_window_rejected() {
        assert!(box_mean(&ramp(4, 4), 4).is_err());
    }

    #[test]
    fn test_cancel_observed() {
        let gray = ramp(8, 8);
        let r = box_mean_std(&gray, 3, &CancelToken::trip_after(2));
        assert!(matches!(
            r,
            Err(FilterError::Core(scanclean_core::Error::Cancelled))
        ));
    }
}
