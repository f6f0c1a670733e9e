//! Image scaling
//!
//! Downscaling for analysis uses area averaging so thin strokes still
//! register; upscaling and arbitrary resizes use bilinear interpolation.

use crate::{TransformError, TransformResult};
use scanclean_core::RasterBuffer;

/// Scaling method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMethod {
    /// Nearest neighbor
    Sampling,
    /// Bilinear interpolation
    Bilinear,
    /// Average of the covered source area (for reductions)
    #[default]
    Area,
}

/// Resize to exactly `width` x `height`.
pub fn scale_to_size(
    src: &RasterBuffer,
    width: u32,
    height: u32,
    method: ScaleMethod,
) -> TransformResult<RasterBuffer> {
    src.ensure_not_empty("scale input")?;
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidParameters(format!(
            "target size must be positive, got {width}x{height}"
        )));
    }
    if (width, height) == (src.width(), src.height()) {
        return Ok(src.clone());
    }
    let method = match method {
        ScaleMethod::Area if width > src.width() || height > src.height() => ScaleMethod::Bilinear,
        m => m,
    };
    match method {
        ScaleMethod::Sampling => Ok(scale_sampling(src, width, height)?),
        ScaleMethod::Bilinear => Ok(scale_bilinear(src, width, height)?),
        ScaleMethod::Area => Ok(scale_area(src, width, height)?),
    }
}

/// Shrink so the width is at most `max_width`, keeping the aspect ratio.
///
/// Returns the scaled buffer and the factor `new_width / old_width`
/// (1.0 when no reduction was needed).
pub fn scale_to_max_width(src: &RasterBuffer, max_width: u32) -> TransformResult<(RasterBuffer, f64)> {
    src.ensure_not_empty("scale input")?;
    if max_width == 0 {
        return Err(TransformError::InvalidParameters(
            "max_width must be positive".into(),
        ));
    }
    if src.width() <= max_width {
        return Ok((src.clone(), 1.0));
    }
    let factor = max_width as f64 / src.width() as f64;
    let height = ((src.height() as f64 * factor).round() as u32).max(1);
    let out = scale_to_size(src, max_width, height, ScaleMethod::Area)?;
    Ok((out, factor))
}

fn scale_sampling(src: &RasterBuffer, w: u32, h: u32) -> scanclean_core::Result<RasterBuffer> {
    let mut out = RasterBuffer::new(w, h, src.layout())?;
    let (sx, sy) = (src.width() as f64 / w as f64, src.height() as f64 / h as f64);
    for y in 0..h {
        let yy = (((y as f64 + 0.5) * sy) as u32).min(src.height() - 1);
        for x in 0..w {
            let xx = (((x as f64 + 0.5) * sx) as u32).min(src.width() - 1);
            out.pixel_mut(x, y).copy_from_slice(src.pixel(xx, yy));
        }
    }
    Ok(out)
}

fn scale_bilinear(src: &RasterBuffer, w: u32, h: u32) -> scanclean_core::Result<RasterBuffer> {
    let mut out = RasterBuffer::new(w, h, src.layout())?;
    let c = src.channels();
    let (sw, sh) = (src.width(), src.height());
    let (rx, ry) = (sw as f64 / w as f64, sh as f64 / h as f64);
    for y in 0..h {
        let fy = ((y as f64 + 0.5) * ry - 0.5).clamp(0.0, (sh - 1) as f64);
        let y0 = fy.floor() as u32;
        let y1 = (y0 + 1).min(sh - 1);
        let ty = fy - y0 as f64;
        for x in 0..w {
            let fx = ((x as f64 + 0.5) * rx - 0.5).clamp(0.0, (sw - 1) as f64);
            let x0 = fx.floor() as u32;
            let x1 = (x0 + 1).min(sw - 1);
            let tx = fx - x0 as f64;
            for ch in 0..c {
                let p00 = src.pixel(x0, y0)[ch] as f64;
                let p10 = src.pixel(x1, y0)[ch] as f64;
                let p01 = src.pixel(x0, y1)[ch] as f64;
                let p11 = src.pixel(x1, y1)[ch] as f64;
                let top = p00 + (p10 - p00) * tx;
                let bottom = p01 + (p11 - p01) * tx;
                out.pixel_mut(x, y)[ch] = (top + (bottom - top) * ty).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(out)
}

fn scale_area(src: &RasterBuffer, w: u32, h: u32) -> scanclean_core::Result<RasterBuffer> {
    let mut out = RasterBuffer::new(w, h, src.layout())?;
    let c = src.channels();
    let (rx, ry) = (src.width() as f64 / w as f64, src.height() as f64 / h as f64);
    let mut acc = vec![0.0f64; c];
    for y in 0..h {
        let (sy0, sy1) = (y as f64 * ry, (y + 1) as f64 * ry);
        for x in 0..w {
            let (sx0, sx1) = (x as f64 * rx, (x + 1) as f64 * rx);
            acc.iter_mut().for_each(|a| *a = 0.0);
            let mut total = 0.0;
            let mut yy = sy0.floor() as u32;
            while (yy as f64) < sy1 && yy < src.height() {
                let wy = (sy1.min(yy as f64 + 1.0) - sy0.max(yy as f64)).max(0.0);
                let mut xx = sx0.floor() as u32;
                while (xx as f64) < sx1 && xx < src.width() {
                    let wx = (sx1.min(xx as f64 + 1.0) - sx0.max(xx as f64)).max(0.0);
                    let wgt = wx * wy;
                    for (a, &v) in acc.iter_mut().zip(src.pixel(xx, yy)) {
                        *a += wgt * v as f64;
                    }
                    total += wgt;
                    xx += 1;
                }
                yy += 1;
            }
            if total > 0.0 {
                for (v, a) in out.pixel_mut(x, y).iter_mut().zip(&acc) {
                    *v = (a / total).round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::PixelLayout;

    #[test]
    fn test_area_halving_averages() {
        let src = RasterBuffer::from_raw(4, 2, PixelLayout::Gray, vec![0, 100, 200, 200, 0, 100, 200, 200])
            .unwrap();
        let out = scale_to_size(&src, 2, 1, ScaleMethod::Area).unwrap();
        assert_eq!(out.data(), &[50, 200]);
    }

    #[test]
    fn test_max_width_factor() {
        let src = RasterBuffer::new_filled(3000, 2000, PixelLayout::Gray, 9).unwrap();
        let (out, f) = scale_to_max_width(&src, 1200).unwrap();
        assert_eq!((out.width(), out.height()), (1200, 800));
        assert!((f - 0.4).abs() < 1e-12);
        let (same, f) = scale_to_max_width(&out, 1200).unwrap();
        assert_eq!(same.width(), 1200);
        assert_eq!(f, 1.0);
    }

    #[test]
    fn test_upscale_bilinear() {
        let src = RasterBuffer::from_raw(2, 1, PixelLayout::Gray, vec![0, 200]).unwrap();
        let out = scale_to_size(&src, 4, 1, ScaleMethod::Area).unwrap();
        assert_eq!(out.get_unchecked(0, 0), 0);
        assert_eq!(out.get_unchecked(3, 0), 200);
        assert!(out.get_unchecked(1, 0) > 0 && out.get_unchecked(1, 0) < 200);
    }
}
