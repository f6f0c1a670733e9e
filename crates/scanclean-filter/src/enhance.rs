//! Contrast-limited adaptive histogram equalization (CLAHE)
//!
//! The image is divided into a grid of tiles. Each tile gets its own
//! equalization lookup table built from a clipped histogram; pixels are
//! mapped through the four surrounding tables and blended bilinearly so
//! tile seams do not show.

use crate::{FilterError, FilterResult};
use scanclean_core::{PixelLayout, RasterBuffer};

/// CLAHE parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheOptions {
    /// Histogram clip limit relative to a flat histogram (default: 2.0)
    pub clip_limit: f32,
    /// Tile grid columns (default: 8)
    pub tiles_x: u32,
    /// Tile grid rows (default: 8)
    pub tiles_y: u32,
}

impl Default for ClaheOptions {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tiles_x: 8,
            tiles_y: 8,
        }
    }
}

impl ClaheOptions {
    pub fn with_clip_limit(mut self, clip_limit: f32) -> Self {
        self.clip_limit = clip_limit;
        self
    }

    pub fn with_tiles(mut self, tiles_x: u32, tiles_y: u32) -> Self {
        self.tiles_x = tiles_x;
        self.tiles_y = tiles_y;
        self
    }

    pub fn validate(&self) -> FilterResult<()> {
        if !(self.clip_limit > 0.0 && self.clip_limit.is_finite()) {
            return Err(FilterError::InvalidParameters(format!(
                "clip_limit must be positive, got {}",
                self.clip_limit
            )));
        }
        if self.tiles_x == 0 || self.tiles_y == 0 {
            return Err(FilterError::InvalidParameters(
                "tile grid must be at least 1x1".into(),
            ));
        }
        Ok(())
    }
}

fn tile_lut(gray: &RasterBuffer, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for &v in &gray.row(y)[x0 as usize..x1 as usize] {
            hist[v as usize] += 1;
        }
    }
    let area = ((x1 - x0) * (y1 - y0)).max(1);
    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for h in hist.iter_mut() {
        if *h > clip {
            excess += *h - clip;
            *h = clip;
        }
    }
    let bonus = excess / 256;
    let mut residual = excess % 256;
    for h in hist.iter_mut() {
        *h += bonus;
        if residual > 0 {
            *h += 1;
            residual -= 1;
        }
    }

    let mut lut = [0u8; 256];
    let scale = 255.0 / area as f32;
    let mut cdf = 0u32;
    for (v, &h) in hist.iter().enumerate() {
        cdf += h;
        lut[v] = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Apply CLAHE to a gray buffer.
pub fn clahe(gray: &RasterBuffer, options: &ClaheOptions) -> FilterResult<RasterBuffer> {
    options.validate()?;
    gray.ensure_gray()?;
    gray.ensure_not_empty("clahe input")?;
    let (w, h) = (gray.width(), gray.height());
    let tx = options.tiles_x.min(w);
    let ty = options.tiles_y.min(h);
    let tile_w = w.div_ceil(tx);
    let tile_h = h.div_ceil(ty);

    let mut luts = Vec::with_capacity((tx * ty) as usize);
    for j in 0..ty {
        for i in 0..tx {
            let x0 = (i * tile_w).min(w - 1);
            let y0 = (j * tile_h).min(h - 1);
            let x1 = ((i + 1) * tile_w).min(w).max(x0 + 1);
            let y1 = ((j + 1) * tile_h).min(h).max(y0 + 1);
            luts.push(tile_lut(gray, x0, y0, x1, y1, options.clip_limit));
        }
    }

    let mut out = RasterBuffer::new(w, h, PixelLayout::Gray)?;
    for y in 0..h {
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let j0 = fy.floor().clamp(0.0, (ty - 1) as f32) as u32;
        let j1 = (j0 + 1).min(ty - 1);
        let wy = (fy - j0 as f32).clamp(0.0, 1.0);
        for x in 0..w {
            let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let i0 = fx.floor().clamp(0.0, (tx - 1) as f32) as u32;
            let i1 = (i0 + 1).min(tx - 1);
            let wx = (fx - i0 as f32).clamp(0.0, 1.0);
            let v = gray.get_unchecked(x, y) as usize;
            let lut = |i: u32, j: u32| luts[(j * tx + i) as usize][v] as f32;
            let top = lut(i0, j0) * (1.0 - wx) + lut(i1, j0) * wx;
            let bottom = lut(i0, j1) * (1.0 - wx) + lut(i1, j1) * wx;
            let value = top * (1.0 - wy) + bottom * wy;
            out.set_unchecked(x, y, value.round().clamp(0.0, 255.0) as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clahe_stretches_low_contrast() {
        let data: Vec<u8> = (0..64 * 64).map(|i| 100 + (i % 8) as u8).collect();
        let gray = RasterBuffer::from_raw(64, 64, PixelLayout::Gray, data).unwrap();
        let out = clahe(&gray, &ClaheOptions::default().with_clip_limit(40.0)).unwrap();
        let (lo, hi) = out
            .data()
            .iter()
            .fold((255u8, 0u8), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        assert!(hi - lo > 7 * 2);
    }

    #[test]
    fn test_clahe_tiny_image() {
        let gray = RasterBuffer::new_filled(3, 2, PixelLayout::Gray, 9).unwrap();
        let out = clahe(&gray, &ClaheOptions::default()).unwrap();
        assert_eq!((out.width(), out.height()), (3, 2));
    }

    #[test]
    fn test_clahe_rejects_bad_options() {
        let gray = RasterBuffer::new_filled(8, 8, PixelLayout::Gray, 9).unwrap();
        assert!(clahe(&gray, &ClaheOptions::default().with_tiles(0, 4)).is_err());
        assert!(clahe(&gray, &ClaheOptions::default().with_clip_limit(-1.0)).is_err());
    }
}
