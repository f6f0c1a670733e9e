//! Arbitrary-angle rotation
//!
//! Angles are in degrees; positive values turn the content
//! counter-clockwise as seen on screen. Rotation is about the image center.
//! With `expand` the output canvas grows to `W|cos| + H|sin|` by
//! `W|sin| + H|cos|` so no content is clipped, and the source is centered
//! on it.
//!
//! # Rotation Methods
//!
//! - **Sampling**: nearest neighbor, used for masks
//! - **Bilinear**: interpolated, used for page images

use crate::{TransformError, TransformResult};
use scanclean_core::{BinaryMask, RasterBuffer, color};

// ============================================================================
// Options
// ============================================================================

/// Rotation algorithm to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotateMethod {
    /// Nearest neighbor
    Sampling,
    /// Bilinear interpolation
    #[default]
    Bilinear,
}

/// Background for pixels that map outside the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotateFill {
    #[default]
    White,
    Black,
    /// Explicit per-channel color (BGRA order; extra entries are ignored)
    Color([u8; 4]),
}

impl RotateFill {
    pub fn color(self) -> [u8; 4] {
        match self {
            RotateFill::White => color::WHITE,
            RotateFill::Black => color::BLACK,
            RotateFill::Color(c) => c,
        }
    }
}

/// Options for [`rotate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateOptions {
    /// Rotation algorithm (default: bilinear)
    pub method: RotateMethod,
    /// Background fill (default: white)
    pub fill: RotateFill,
    /// Grow the canvas to hold all rotated content (default: true)
    pub expand: bool,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            method: RotateMethod::Bilinear,
            fill: RotateFill::White,
            expand: true,
        }
    }
}

impl RotateOptions {
    pub fn with_method(mut self, method: RotateMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_fill(mut self, fill: RotateFill) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Size of the canvas that holds a `width` x `height` image rotated by
/// `angle_deg`.
pub fn rotated_bounds(width: u32, height: u32, angle_deg: f64) -> (u32, u32) {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let (w, h) = (width as f64, height as f64);
    // tolerance keeps exact multiples of 90 degrees from growing a pixel
    let nw = (w * c.abs() + h * s.abs() - 1e-6).ceil().max(1.0);
    let nh = (w * s.abs() + h * c.abs() - 1e-6).ceil().max(1.0);
    (nw as u32, nh as u32)
}

/// Inverse mapping from output pixel to source position.
#[derive(Clone, Copy)]
struct InverseMap {
    cos: f64,
    sin: f64,
    src_cx: f64,
    src_cy: f64,
    dst_cx: f64,
    dst_cy: f64,
}

impl InverseMap {
    fn new(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32, angle_deg: f64) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Self {
            cos,
            sin,
            src_cx: (src_w as f64 - 1.0) / 2.0,
            src_cy: (src_h as f64 - 1.0) / 2.0,
            dst_cx: (dst_w as f64 - 1.0) / 2.0,
            dst_cy: (dst_h as f64 - 1.0) / 2.0,
        }
    }

    #[inline]
    fn source(&self, x: u32, y: u32) -> (f64, f64) {
        let dx = x as f64 - self.dst_cx;
        let dy = y as f64 - self.dst_cy;
        (
            self.cos * dx - self.sin * dy + self.src_cx,
            self.sin * dx + self.cos * dy + self.src_cy,
        )
    }
}

fn check_angle(angle_deg: f64) -> TransformResult<()> {
    if angle_deg.is_finite() {
        Ok(())
    } else {
        Err(TransformError::InvalidParameters(format!(
            "rotation angle must be finite, got {angle_deg}"
        )))
    }
}

// ============================================================================
// Rotation
// ============================================================================

/// Rotate a buffer by `angle_deg` about its center.
pub fn rotate(src: &RasterBuffer, angle_deg: f64, options: &RotateOptions) -> TransformResult<RasterBuffer> {
    check_angle(angle_deg)?;
    src.ensure_not_empty("rotation input")?;
    let (w, h) = (src.width(), src.height());
    let (ow, oh) = if options.expand {
        rotated_bounds(w, h, angle_deg)
    } else {
        (w, h)
    };
    let map = InverseMap::new(w, h, ow, oh, angle_deg);
    let fill = options.fill.color();
    let c = src.channels();
    let mut out = RasterBuffer::new(ow, oh, src.layout())?;
    out.fill(&fill[..c.min(4)]);

    let (wf, hf) = (w as f64, h as f64);
    for y in 0..oh {
        for x in 0..ow {
            let (sx, sy) = map.source(x, y);
            if sx < -0.5 || sy < -0.5 || sx > wf - 0.5 || sy > hf - 0.5 {
                continue;
            }
            match options.method {
                RotateMethod::Sampling => {
                    let nx = (sx.round().max(0.0) as u32).min(w - 1);
                    let ny = (sy.round().max(0.0) as u32).min(h - 1);
                    let px: [u8; 4] = {
                        let mut p = [0u8; 4];
                        p[..c].copy_from_slice(src.pixel(nx, ny));
                        p
                    };
                    out.pixel_mut(x, y).copy_from_slice(&px[..c]);
                }
                RotateMethod::Bilinear => {
                    let sx = sx.clamp(0.0, wf - 1.0);
                    let sy = sy.clamp(0.0, hf - 1.0);
                    let (x0, y0) = (sx.floor() as u32, sy.floor() as u32);
                    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
                    let (fx, fy) = (sx - x0 as f64, sy - y0 as f64);
                    let mut px = [0u8; 4];
                    for (ch, v) in px.iter_mut().enumerate().take(c) {
                        let p00 = src.pixel(x0, y0)[ch] as f64;
                        let p10 = src.pixel(x1, y0)[ch] as f64;
                        let p01 = src.pixel(x0, y1)[ch] as f64;
                        let p11 = src.pixel(x1, y1)[ch] as f64;
                        let top = p00 + (p10 - p00) * fx;
                        let bottom = p01 + (p11 - p01) * fx;
                        *v = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
                    }
                    out.pixel_mut(x, y).copy_from_slice(&px[..c]);
                }
            }
        }
    }
    Ok(out)
}

/// Rotate a mask with nearest-neighbor sampling; uncovered pixels are off.
pub fn rotate_mask(mask: &BinaryMask, angle_deg: f64, expand: bool) -> TransformResult<BinaryMask> {
    check_angle(angle_deg)?;
    let (w, h) = (mask.width(), mask.height());
    let (ow, oh) = if expand {
        rotated_bounds(w, h, angle_deg)
    } else {
        (w, h)
    };
    let map = InverseMap::new(w, h, ow, oh, angle_deg);
    let mut out = BinaryMask::new(ow, oh)?;
    for y in 0..oh {
        for x in 0..ow {
            let (sx, sy) = map.source(x, y);
            if mask.get(sx.round() as i32, sy.round() as i32) {
                out.set_unchecked(x, y, true);
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
    fn test_rotated_bounds() {
        assert_eq!(rotated_bounds(100, 50, 0.0), (100, 50));
        assert_eq!(rotated_bounds(100, 50, 90.0), (50, 100));
        let (w, h) = rotated_bounds(100, 100, 45.0);
        assert_eq!((w, h), (142, 142));
    }

    #[test]
    fn test_zero_angle_is_identity() {
        let data: Vec<u8> = (0..12u8).collect();
        let src = RasterBuffer::from_raw(4, 3, PixelLayout::Gray, data).unwrap();
        let out = rotate(&src, 0.0, &RotateOptions::default()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_quarter_turn_is_counter_clockwise() {
        // marker at the right end of a horizontal strip
        let mut src = RasterBuffer::new_filled(5, 1, PixelLayout::Gray, 255).unwrap();
        src.set_unchecked(4, 0, 0);
        let out = rotate(&src, 90.0, &RotateOptions::default().with_method(RotateMethod::Sampling))
            .unwrap();
        assert_eq!((out.width(), out.height()), (1, 5));
        // the right end now points up
        assert_eq!(out.get_unchecked(0, 0), 0);
        assert_eq!(out.get_unchecked(0, 4), 255);
    }

    #[test]
    fn test_fill_color_on_expanded_corners() {
        let src = RasterBuffer::new_filled(40, 40, PixelLayout::Bgr, 255).unwrap();
        let opts = RotateOptions::default().with_fill(RotateFill::Black);
        let out = rotate(&src, 30.0, &opts).unwrap();
        assert!(out.width() > 40);
        assert_eq!(out.pixel(0, 0), &[0, 0, 0]);
        let (cx, cy) = (out.width() / 2, out.height() / 2);
        assert_eq!(out.pixel(cx, cy), &[255, 255, 255]);
    }

    #[test]
    fn test_rotate_mask_keeps_count_roughly() {
        let mut m = BinaryMask::new(60, 60).unwrap();
        for y in 20..40 {
            for x in 10..50 {
                m.set_unchecked(x, y, true);
            }
        }
        let r = rotate_mask(&m, 10.0, true).unwrap();
        let ratio = r.count() as f64 / m.count() as f64;
        assert!((ratio - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_non_finite_angle() {
        let src = RasterBuffer::new_filled(4, 4, PixelLayout::Gray, 0).unwrap();
        assert!(rotate(&src, f64::NAN, &RotateOptions::default()).is_err());
    }
}
