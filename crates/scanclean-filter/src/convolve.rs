//! Gaussian and box smoothing
//!
//! Small sigmas use an exact separable kernel with reflected borders.
//! Large sigmas (the illumination estimate of the retinex stage uses
//! sigma around 30) switch to three successive box passes, which converge
//! on the same Gaussian at a cost independent of sigma.

use crate::{FilterError, FilterResult, FloatPlane};
use scanclean_core::{CancelToken, RasterBuffer};

/// Largest sigma handled with an explicit kernel.
const EXACT_SIGMA_LIMIT: f32 = 4.0;

/// Reflect an index into `0..n` without repeating the edge sample.
#[inline]
fn reflect(mut i: isize, n: isize) -> usize {
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Normalized 1-D Gaussian kernel of radius `ceil(3 sigma)`.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut k: Vec<f32> = (-radius..=radius)
        .map(|i| (-(i * i) as f32 / denom).exp())
        .collect();
    let total: f32 = k.iter().sum();
    for v in &mut k {
        *v /= total;
    }
    k
}

fn convolve_rows(src: &FloatPlane, kernel: &[f32]) -> FloatPlane {
    let (w, h) = (src.width() as isize, src.height());
    let r = (kernel.len() / 2) as isize;
    let mut out = FloatPlane::new(src.width(), h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                acc += kv * src.get(reflect(x + k as isize - r, w) as u32, y);
            }
            out.set(x as u32, y, acc);
        }
    }
    out
}

fn convolve_cols(src: &FloatPlane, kernel: &[f32]) -> FloatPlane {
    let (w, h) = (src.width(), src.height() as isize);
    let r = (kernel.len() / 2) as isize;
    let mut out = FloatPlane::new(w, src.height());
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                acc += kv * src.get(x, reflect(y + k as isize - r, h) as u32);
            }
            out.set(x, y as u32, acc);
        }
    }
    out
}

/// Box sizes for approximating a Gaussian with `n` passes.
fn box_sizes(sigma: f32, n: usize) -> Vec<usize> {
    let nf = n as f32;
    let w_ideal = (12.0 * sigma * sigma / nf + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i32;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;
    let wlf = wl as f32;
    let m_ideal =
        (12.0 * sigma * sigma - nf * wlf * wlf - 4.0 * nf * wlf - 3.0 * nf) / (-4.0 * wlf - 4.0);
    let m = m_ideal.round().max(0.0) as usize;
    (0..n)
        .map(|i| if i < m { wl as usize } else { wu as usize })
        .collect()
}

/// Running-sum 1-D box over one line; the window is clipped at the ends.
fn box_line(line: &mut [f32], scratch: &mut Vec<f32>, size: usize) {
    let n = line.len();
    let half = size / 2;
    scratch.clear();
    scratch.push(0.0);
    let mut acc = 0.0f64;
    for &v in line.iter() {
        acc += v as f64;
        scratch.push(acc as f32);
    }
    for (i, v) in line.iter_mut().enumerate() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        *v = (scratch[hi] - scratch[lo]) / (hi - lo) as f32;
    }
}

fn box_passes(src: &FloatPlane, sigma: f32, cancel: &CancelToken) -> FilterResult<FloatPlane> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let mut out = src.clone();
    let mut scratch = Vec::with_capacity(w.max(h) + 1);
    let mut column = vec![0.0f32; h];
    for size in box_sizes(sigma, 3) {
        cancel.check()?;
        for row in out.data_mut().chunks_exact_mut(w) {
            box_line(row, &mut scratch, size);
        }
        for x in 0..w {
            for (y, c) in column.iter_mut().enumerate() {
                *c = out.data()[y * w + x];
            }
            box_line(&mut column, &mut scratch, size);
            for (y, &c) in column.iter().enumerate() {
                out.data_mut()[y * w + x] = c;
            }
        }
    }
    Ok(out)
}

/// Gaussian blur of a float plane.
pub fn gaussian_blur_plane(
    src: &FloatPlane,
    sigma: f32,
    cancel: &CancelToken,
) -> FilterResult<FloatPlane> {
    if !(sigma > 0.0 && sigma.is_finite()) {
        return Err(FilterError::InvalidParameters(format!(
            "gaussian sigma must be positive, got {sigma}"
        )));
    }
    if src.width() == 0 || src.height() == 0 {
        return Ok(src.clone());
    }
    if sigma > EXACT_SIGMA_LIMIT {
        return box_passes(src, sigma, cancel);
    }
    let kernel = gaussian_kernel(sigma);
    let rows = convolve_rows(src, &kernel);
    cancel.check()?;
    Ok(convolve_cols(&rows, &kernel))
}

/// Gaussian blur of a gray buffer.
pub fn gaussian_blur(gray: &RasterBuffer, sigma: f32) -> FilterResult<RasterBuffer> {
    gray.ensure_gray()?;
    let plane = FloatPlane::from_gray(gray);
    gaussian_blur_plane(&plane, sigma, &CancelToken::none())?.to_gray_clamped()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(2, 5), 2);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn test_kernel_normalized() {
        let k = gaussian_kernel(1.5);
        assert_eq!(k.len(), 11);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_box_sizes_cover_sigma() {
        let sizes = box_sizes(30.0, 3);
        assert_eq!(sizes.len(), 3);
        let var: f32 = sizes.iter().map(|&s| ((s * s) as f32 - 1.0) / 12.0).sum();
        assert!((var.sqrt() - 30.0).abs() < 1.5);
    }

    #[test]
    fn test_blur_preserves_constant() {
        let plane = FloatPlane::from_vec(20, 10, vec![42.0; 200]).unwrap();
        for sigma in [1.0, 10.0] {
            let out = gaussian_blur_plane(&plane, sigma, &CancelToken::none()).unwrap();
            assert!(out.data().iter().all(|&v| (v - 42.0).abs() < 1e-3));
        }
    }

    #[test]
    fn test_blur_spreads_impulse() {
        let mut plane = FloatPlane::new(21, 21);
        plane.set(10, 10, 100.0);
        let out = gaussian_blur_plane(&plane, 2.0, &CancelToken::none()).unwrap();
        assert!(out.get(10, 10) < 100.0);
        assert!(out.get(11, 10) > 0.0);
        assert!((out.data().iter().sum::<f32>() - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_invalid_sigma() {
        let plane = FloatPlane::new(4, 4);
        assert!(gaussian_blur_plane(&plane, 0.0, &CancelToken::none()).is_err());
    }
}
