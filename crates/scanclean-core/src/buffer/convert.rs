//! Channel conversion between gray, BGR, BGRA and Lab
//!
//! Gray uses ITU-R BT.601 luma weights in 14-bit fixed point. Lab uses the
//! sRGB transfer curve and a D65 white point; the 8-bit encoding stores
//! `L * 255 / 100`, `a + 128`, `b + 128`.

use super::{PixelLayout, RasterBuffer};

/// CIE L*a*b* triple. `l` is 0..100, `a`/`b` roughly -128..127.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

/// BT.601 luma of a BGR triple.
#[inline]
pub fn luma(b: u8, g: u8, r: u8) -> u8 {
    ((r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14) as u8
}

// D65 reference white
const XN: f32 = 0.950_456;
const ZN: f32 = 1.088_754;

#[inline]
fn srgb_to_linear(c: u8) -> f32 {
    let v = c as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(v: f32) -> u8 {
    let v = v.clamp(0.0, 1.0);
    let s = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > 0.008_856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(t: f32) -> f32 {
    let t3 = t * t * t;
    if t3 > 0.008_856 {
        t3
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

/// Convert one BGR pixel to Lab.
pub fn bgr_to_lab(b: u8, g: u8, r: u8) -> Lab {
    let (rl, gl, bl) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));
    let x = (0.412_453 * rl + 0.357_580 * gl + 0.180_423 * bl) / XN;
    let y = 0.212_671 * rl + 0.715_160 * gl + 0.072_169 * bl;
    let z = (0.019_334 * rl + 0.119_193 * gl + 0.950_227 * bl) / ZN;
    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));
    let l = if y > 0.008_856 {
        116.0 * fy - 16.0
    } else {
        903.3 * y
    };
    Lab {
        l,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Convert one Lab pixel back to BGR.
pub fn lab_to_bgr(lab: Lab) -> (u8, u8, u8) {
    let fy = (lab.l + 16.0) / 116.0;
    let fx = fy + lab.a / 500.0;
    let fz = fy - lab.b / 200.0;
    let x = lab_f_inv(fx) * XN;
    let y = lab_f_inv(fy);
    let z = lab_f_inv(fz) * ZN;
    let rl = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let gl = -0.969_256 * x + 1.875_992 * y + 0.041_556 * z;
    let bl = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;
    (linear_to_srgb(bl), linear_to_srgb(gl), linear_to_srgb(rl))
}

#[inline]
fn encode_lab(lab: Lab) -> [u8; 3] {
    [
        (lab.l * 255.0 / 100.0 + 0.5).clamp(0.0, 255.0) as u8,
        (lab.a + 128.5).clamp(0.0, 255.0) as u8,
        (lab.b + 128.5).clamp(0.0, 255.0) as u8,
    ]
}

#[inline]
fn decode_lab(p: &[u8]) -> Lab {
    Lab {
        l: p[0] as f32 * 100.0 / 255.0,
        a: p[1] as f32 - 128.0,
        b: p[2] as f32 - 128.0,
    }
}

impl RasterBuffer {
    fn map_pixels(&self, layout: PixelLayout, f: impl Fn(&[u8], &mut [u8])) -> RasterBuffer {
        if self.is_empty() {
            return RasterBuffer::empty();
        }
        let (sc, dc) = (self.channels(), layout.channels());
        let mut data = vec![0u8; self.width as usize * self.height as usize * dc];
        for (src, dst) in self.data.chunks_exact(sc).zip(data.chunks_exact_mut(dc)) {
            f(src, dst);
        }
        RasterBuffer {
            width: self.width,
            height: self.height,
            layout,
            data,
        }
    }

    /// Single-channel intensity copy.
    pub fn to_gray(&self) -> RasterBuffer {
        match self.layout {
            PixelLayout::Gray => self.clone(),
            PixelLayout::Bgr | PixelLayout::Bgra => {
                self.map_pixels(PixelLayout::Gray, |s, d| d[0] = luma(s[0], s[1], s[2]))
            }
            PixelLayout::Lab => self.map_pixels(PixelLayout::Gray, |s, d| {
                let (b, g, r) = lab_to_bgr(decode_lab(s));
                d[0] = luma(b, g, r);
            }),
        }
    }

    /// Three-channel BGR copy.
    pub fn to_bgr(&self) -> RasterBuffer {
        match self.layout {
            PixelLayout::Bgr => self.clone(),
            PixelLayout::Gray => self.map_pixels(PixelLayout::Bgr, |s, d| d.fill(s[0])),
            PixelLayout::Bgra => self.map_pixels(PixelLayout::Bgr, |s, d| d.copy_from_slice(&s[..3])),
            PixelLayout::Lab => self.map_pixels(PixelLayout::Bgr, |s, d| {
                let (b, g, r) = lab_to_bgr(decode_lab(s));
                d.copy_from_slice(&[b, g, r]);
            }),
        }
    }

    /// Four-channel BGRA copy; alpha is opaque unless already present.
    pub fn to_bgra(&self) -> RasterBuffer {
        match self.layout {
            PixelLayout::Bgra => self.clone(),
            PixelLayout::Gray => self.map_pixels(PixelLayout::Bgra, |s, d| {
                d.copy_from_slice(&[s[0], s[0], s[0], 255]);
            }),
            PixelLayout::Bgr => self.map_pixels(PixelLayout::Bgra, |s, d| {
                d.copy_from_slice(&[s[0], s[1], s[2], 255]);
            }),
            PixelLayout::Lab => self.map_pixels(PixelLayout::Bgra, |s, d| {
                let (b, g, r) = lab_to_bgr(decode_lab(s));
                d.copy_from_slice(&[b, g, r, 255]);
            }),
        }
    }

    /// 8-bit encoded Lab copy.
    pub fn to_lab(&self) -> RasterBuffer {
        match self.layout {
            PixelLayout::Lab => self.clone(),
            PixelLayout::Gray => self.map_pixels(PixelLayout::Lab, |s, d| {
                d.copy_from_slice(&encode_lab(bgr_to_lab(s[0], s[0], s[0])));
            }),
            PixelLayout::Bgr | PixelLayout::Bgra => self.map_pixels(PixelLayout::Lab, |s, d| {
                d.copy_from_slice(&encode_lab(bgr_to_lab(s[0], s[1], s[2])));
            }),
        }
    }

    /// Copy converted to `layout`.
    pub fn convert(&self, layout: PixelLayout) -> RasterBuffer {
        match layout {
            PixelLayout::Gray => self.to_gray(),
            PixelLayout::Bgr => self.to_bgr(),
            PixelLayout::Bgra => self.to_bgra(),
            PixelLayout::Lab => self.to_lab(),
        }
    }

    /// L* plane (0..100) as floats.
    pub fn lightness_plane(&self) -> Vec<f32> {
        match self.layout {
            PixelLayout::Lab => self.data.chunks_exact(3).map(|p| decode_lab(p).l).collect(),
            PixelLayout::Gray => self
                .data
                .iter()
                .map(|&v| bgr_to_lab(v, v, v).l)
                .collect(),
            _ => {
                let c = self.channels();
                self.data
                    .chunks_exact(c)
                    .map(|p| bgr_to_lab(p[0], p[1], p[2]).l)
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_extremes() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(128, 128, 128), 128);
    }

    #[test]
    fn test_lab_white_black() {
        let w = bgr_to_lab(255, 255, 255);
        assert!((w.l - 100.0).abs() < 0.1);
        assert!(w.a.abs() < 0.5 && w.b.abs() < 0.5);
        let k = bgr_to_lab(0, 0, 0);
        assert!(k.l.abs() < 0.1);
    }

    #[test]
    fn test_lab_roundtrip_color() {
        for (b, g, r) in [(30u8, 120u8, 200u8), (255, 0, 0), (10, 200, 40)] {
            let (b2, g2, r2) = lab_to_bgr(bgr_to_lab(b, g, r));
            assert!((b as i32 - b2 as i32).abs() <= 1);
            assert!((g as i32 - g2 as i32).abs() <= 1);
            assert!((r as i32 - r2 as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_gray_bgr_bgra_chain() {
        let gray = RasterBuffer::from_raw(2, 1, PixelLayout::Gray, vec![10, 240]).unwrap();
        let bgra = gray.to_bgr().to_bgra();
        assert_eq!(bgra.pixel(1, 0), &[240, 240, 240, 255]);
        assert_eq!(bgra.to_gray().data(), gray.data());
    }

    #[test]
    fn test_lab_buffer_roundtrip() {
        let bgr = RasterBuffer::from_raw(1, 1, PixelLayout::Bgr, vec![40, 90, 160]).unwrap();
        let back = bgr.to_lab().to_bgr();
        for (a, b) in bgr.data().iter().zip(back.data()) {
            assert!((*a as i32 - *b as i32).abs() <= 3);
        }
    }
}
