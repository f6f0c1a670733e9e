//! Sobel gradients and Canny edge detection
//!
//! Gradients use the 3x3 Sobel operator with clamped borders. Canny
//! thinning compares each magnitude with its two neighbors along the
//! quantized gradient direction, then links weak edges to strong ones by
//! hysteresis.

use crate::{FilterError, FilterResult};
use scanclean_core::{BinaryMask, CancelToken, RasterBuffer};

const TAN_22_5: f32 = 0.414_213_56;

/// Per-pixel Sobel response.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub width: u32,
    pub height: u32,
    pub gx: Vec<f32>,
    pub gy: Vec<f32>,
    /// L1 magnitude `|gx| + |gy|`
    pub magnitude: Vec<f32>,
}

impl Gradients {
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Sobel gradients of a gray buffer.
pub fn sobel(gray: &RasterBuffer) -> FilterResult<Gradients> {
    gray.ensure_gray()?;
    gray.ensure_not_empty("sobel input")?;
    let (w, h) = (gray.width() as i32, gray.height() as i32);
    let px = |x: i32, y: i32| gray.get_unchecked(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32) as f32;
    let n = (w * h) as usize;
    let (mut gx, mut gy, mut magnitude) = (vec![0.0f32; n], vec![0.0f32; n], vec![0.0f32; n]);
    for y in 0..h {
        for x in 0..w {
            let (tl, t, tr) = (px(x - 1, y - 1), px(x, y - 1), px(x + 1, y - 1));
            let (l, r) = (px(x - 1, y), px(x + 1, y));
            let (bl, b, br) = (px(x - 1, y + 1), px(x, y + 1), px(x + 1, y + 1));
            let dx = (tr + 2.0 * r + br) - (tl + 2.0 * l + bl);
            let dy = (bl + 2.0 * b + br) - (tl + 2.0 * t + tr);
            let i = (y * w + x) as usize;
            gx[i] = dx;
            gy[i] = dy;
            magnitude[i] = dx.abs() + dy.abs();
        }
    }
    Ok(Gradients {
        width: w as u32,
        height: h as u32,
        gx,
        gy,
        magnitude,
    })
}

/// Canny edge map (edge pixels are foreground).
///
/// `low` and `high` are hysteresis thresholds on the L1 Sobel magnitude.
/// Polls `cancel` once per row of the suppression pass.
pub fn canny(gray: &RasterBuffer, low: f32, high: f32, cancel: &CancelToken) -> FilterResult<BinaryMask> {
    if !(low >= 0.0 && high >= low) {
        return Err(FilterError::InvalidParameters(format!(
            "canny thresholds must satisfy 0 <= low <= high, got {low}/{high}"
        )));
    }
    let g = sobel(gray)?;
    let (w, h) = (g.width as usize, g.height as usize);
    let mut mask = BinaryMask::like(gray)?;
    if w < 3 || h < 3 {
        return Ok(mask);
    }

    // 0 = suppressed, 1 = weak, 2 = strong
    let mut state = vec![0u8; w * h];
    let mut stack = Vec::new();
    let mag = &g.magnitude;
    for y in 1..h - 1 {
        cancel.check()?;
        for x in 1..w - 1 {
            let i = y * w + x;
            let m = mag[i];
            if m <= low {
                continue;
            }
            let (ax, ay) = (g.gx[i].abs(), g.gy[i].abs());
            let (n1, n2) = if ay <= ax * TAN_22_5 {
                (mag[i - 1], mag[i + 1])
            } else if ax <= ay * TAN_22_5 {
                (mag[i - w], mag[i + w])
            } else if (g.gx[i] >= 0.0) == (g.gy[i] >= 0.0) {
                (mag[i - w - 1], mag[i + w + 1])
            } else {
                (mag[i - w + 1], mag[i + w - 1])
            };
            // ties on one side keep plateaus one pixel wide
            if m > n1 && m >= n2 {
                if m > high {
                    state[i] = 2;
                    stack.push(i);
                } else {
                    state[i] = 1;
                }
            }
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = (i % w, i / w);
        mask.set_unchecked(x as u32, y as u32, true);
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if state[j] == 1 {
                    state[j] = 2;
                    stack.push(j);
                }
            }
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::PixelLayout;

    fn step(w: u32, h: u32, at: u32) -> RasterBuffer {
        let data = (0..h)
            .flat_map(|_| (0..w).map(move |x| if x < at { 0 } else { 200 }))
            .collect();
        RasterBuffer::from_raw(w, h, PixelLayout::Gray, data).unwrap()
    }

    #[test]
    fn test_sobel_vertical_step() {
        let g = sobel(&step(10, 5, 5)).unwrap();
        let i = g.index(5, 2);
        assert!(g.gx[i] > 0.0);
        assert_eq!(g.gy[i], 0.0);
    }

    #[test]
    fn test_canny_single_line() {
        let edges = canny(&step(20, 12, 10), 50.0, 150.0, &CancelToken::none()).unwrap();
        let cols = edges.column_counts();
        let hit: Vec<usize> = cols.iter().enumerate().filter(|(_, c)| **c > 0).map(|(i, _)| i).collect();
        assert_eq!(hit.len(), 1);
        assert!(hit[0] == 9 || hit[0] == 10);
    }

    #[test]
    fn test_canny_flat_is_empty() {
        let gray = RasterBuffer::new_filled(16, 16, PixelLayout::Gray, 128).unwrap();
        assert!(canny(&gray, 50.0, 150.0, &CancelToken::none()).unwrap().is_blank());
    }

    #[test]
    fn test_canny_bad_thresholds() {
        let gray = RasterBuffer::new_filled(8, 8, PixelLayout::Gray, 0).unwrap();
        assert!(canny(&gray, 100.0, 50.0, &CancelToken::none()).is_err());
    }
}
