//! Thresholding gray images into ink masks
//!
//! Every function here returns a [`BinaryMask`] with ink (dark marks) as
//! foreground. Turning a mask into the bitonal page image is left to
//! [`crate::binarize`].
//!
//! - Fixed threshold: `pixel > t` is paper
//! - Otsu: `t` chosen to maximize between-class variance
//! - Adaptive: `pixel > local_mean - c` is paper
//! - Sauvola: `pixel > mean * (1 + k * (std / r - 1)) + margin` is paper

use crate::{ColorError, ColorResult};
use scanclean_core::{BinaryMask, CancelToken, RasterBuffer, stats};
use scanclean_filter::{ClaheOptions, FloatPlane, IntegralImage, clahe, gaussian_blur_plane};
use scanclean_morph::{close_brick, open_brick};

// ============================================================================
// Global thresholds
// ============================================================================

/// Otsu threshold of a 256-bin histogram.
///
/// Returns the largest value that still belongs to the dark class.
pub fn otsu_from_histogram(hist: &[u64; 256]) -> u8 {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }
    let sum_all: f64 = hist.iter().enumerate().map(|(i, &h)| i as f64 * h as f64).sum();
    let (mut w_b, mut sum_b) = (0u64, 0.0f64);
    let (mut best_t, mut best_var) = (0u8, -1.0f64);
    for (t, &h) in hist.iter().enumerate() {
        w_b += h;
        if w_b == 0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0 {
            break;
        }
        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b as f64;
        let m_f = (sum_all - sum_b) / w_f as f64;
        let var = w_b as f64 * w_f as f64 * (m_b - m_f) * (m_b - m_f);
        if var > best_var {
            best_var = var;
            best_t = t as u8;
        }
    }
    best_t
}

/// Otsu threshold of a buffer's intensity.
pub fn compute_otsu_threshold(src: &RasterBuffer) -> ColorResult<u8> {
    src.ensure_not_empty("otsu input")?;
    Ok(otsu_from_histogram(&stats::gray_histogram(&src.to_gray())))
}

/// Ink mask for a fixed threshold: pixels `<= threshold` are ink.
pub fn threshold_ink_mask(gray: &RasterBuffer, threshold: u8) -> ColorResult<BinaryMask> {
    Ok(BinaryMask::from_predicate(gray, |v| v <= threshold)?)
}

/// Ink mask at the Otsu threshold of any layout.
pub fn otsu_ink_mask(src: &RasterBuffer) -> ColorResult<BinaryMask> {
    let gray = src.to_gray();
    let t = compute_otsu_threshold(&gray)?;
    threshold_ink_mask(&gray, t)
}

// ============================================================================
// Adaptive threshold
// ============================================================================

/// How the local reference level is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdaptiveMethod {
    /// Use mean of local window
    #[default]
    Mean,
    /// Use Gaussian-weighted mean
    Gaussian,
}

/// Options for adaptive thresholding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveThresholdOptions {
    /// Odd window size; `None` derives `clamp(min(W, H) / 30, 3, 201)`
    pub block_size: Option<u32>,
    /// Offset subtracted from the local mean (default: 10.0)
    pub c: f32,
    /// Local reference (default: mean)
    pub method: AdaptiveMethod,
    /// Square opening applied to the ink mask; 0 disables (default: 0)
    pub open_size: u32,
}

impl Default for AdaptiveThresholdOptions {
    fn default() -> Self {
        Self {
            block_size: None,
            c: 10.0,
            method: AdaptiveMethod::Mean,
            open_size: 0,
        }
    }
}

impl AdaptiveThresholdOptions {
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = Some(block_size);
        self
    }

    pub fn with_c(mut self, c: f32) -> Self {
        self.c = c;
        self
    }

    pub fn with_method(mut self, method: AdaptiveMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_open_size(mut self, open_size: u32) -> Self {
        self.open_size = open_size;
        self
    }

    pub fn validate(&self) -> ColorResult<()> {
        if let Some(b) = self.block_size
            && b < 3
        {
            return Err(ColorError::InvalidParameters(format!(
                "adaptive block size must be at least 3, got {b}"
            )));
        }
        if !self.c.is_finite() {
            return Err(ColorError::InvalidParameters("adaptive offset must be finite".into()));
        }
        Ok(())
    }

    /// Window size used for a `width` x `height` image (always odd).
    pub fn resolved_block_size(&self, width: u32, height: u32) -> u32 {
        let b = self
            .block_size
            .unwrap_or_else(|| (width.min(height) / 30).clamp(3, 201));
        if b % 2 == 0 { b + 1 } else { b }
    }
}

/// Gaussian sigma matching a window of `block` pixels.
fn gaussian_sigma_for_block(block: u32) -> f32 {
    0.3 * ((block as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Adaptive ink mask: pixels at or below `local_mean - c` are ink.
pub fn adaptive_ink_mask(
    gray: &RasterBuffer,
    options: &AdaptiveThresholdOptions,
    cancel: &CancelToken,
) -> ColorResult<BinaryMask> {
    options.validate()?;
    gray.ensure_gray()?;
    gray.ensure_not_empty("adaptive threshold input")?;
    let (w, h) = (gray.width(), gray.height());
    let block = options.resolved_block_size(w, h);
    let mut mask = BinaryMask::new(w, h)?;

    match options.method {
        AdaptiveMethod::Mean => {
            let ii = IntegralImage::new(gray)?;
            let half = block / 2;
            for y in 0..h {
                cancel.check()?;
                let row = gray.row(y);
                for x in 0..w {
                    let t = ii.mean(x, y, half) - options.c as f64;
                    if row[x as usize] as f64 <= t {
                        mask.set_unchecked(x, y, true);
                    }
                }
            }
        }
        AdaptiveMethod::Gaussian => {
            let plane = FloatPlane::from_gray(gray);
            let local = gaussian_blur_plane(&plane, gaussian_sigma_for_block(block), cancel)?;
            for y in 0..h {
                cancel.check()?;
                for x in 0..w {
                    if gray.get_unchecked(x, y) as f32 <= local.get(x, y) - options.c {
                        mask.set_unchecked(x, y, true);
                    }
                }
            }
        }
    }

    if options.open_size > 1 {
        mask = open_brick(&mask, options.open_size, options.open_size)?;
    }
    Ok(mask)
}

// ============================================================================
// Sauvola
// ============================================================================

/// Options for Sauvola thresholding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SauvolaOptions {
    /// Odd window size (default: 25)
    pub window: u32,
    /// Sensitivity to local contrast (default: 0.34)
    pub k: f32,
    /// Dynamic range of the standard deviation (default: 180.0)
    pub r: f32,
    /// Extra offset added to the threshold before comparing (default: 0.0)
    pub margin: f32,
    /// Optional CLAHE pass before thresholding (default: off)
    pub contrast: Option<ClaheOptions>,
    /// 2x2 opening then closing of the ink mask, for handwriting (default: off)
    pub cleanup: bool,
}

impl Default for SauvolaOptions {
    fn default() -> Self {
        Self {
            window: 25,
            k: 0.34,
            r: 180.0,
            margin: 0.0,
            contrast: None,
            cleanup: false,
        }
    }
}

impl SauvolaOptions {
    pub fn with_window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    pub fn with_k(mut self, k: f32) -> Self {
        self.k = k;
        self
    }

    pub fn with_r(mut self, r: f32) -> Self {
        self.r = r;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_contrast(mut self, contrast: ClaheOptions) -> Self {
        self.contrast = Some(contrast);
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn validate(&self) -> ColorResult<()> {
        if self.window < 3 || self.window % 2 == 0 {
            return Err(ColorError::InvalidParameters(format!(
                "sauvola window must be odd and at least 3, got {}",
                self.window
            )));
        }
        if !(self.r > 0.0 && self.r.is_finite()) || !self.k.is_finite() || !self.margin.is_finite() {
            return Err(ColorError::InvalidParameters(format!(
                "sauvola parameters out of range: k={}, r={}, margin={}",
                self.k, self.r, self.margin
            )));
        }
        if let Some(c) = &self.contrast {
            c.validate()?;
        }
        Ok(())
    }
}

/// Sauvola ink mask.
pub fn sauvola_ink_mask(
    gray: &RasterBuffer,
    options: &SauvolaOptions,
    cancel: &CancelToken,
) -> ColorResult<BinaryMask> {
    options.validate()?;
    gray.ensure_gray()?;
    gray.ensure_not_empty("sauvola input")?;
    let enhanced;
    let gray = match &options.contrast {
        Some(c) => {
            enhanced = clahe(gray, c)?;
            &enhanced
        }
        None => gray,
    };
    let (w, h) = (gray.width(), gray.height());
    let ii = IntegralImage::new(gray)?;
    let half = options.window / 2;
    let (k, r, margin) = (options.k as f64, options.r as f64, options.margin as f64);
    let mut mask = BinaryMask::new(w, h)?;
    for y in 0..h {
        cancel.check()?;
        let row = gray.row(y);
        for x in 0..w {
            let (mean, std) = ii.mean_std(x, y, half);
            let t = mean * (1.0 + k * (std / r - 1.0));
            if row[x as usize] as f64 <= t + margin {
                mask.set_unchecked(x, y, true);
            }
        }
    }
    if options.cleanup {
        mask = close_brick(&open_brick(&mask, 2, 2)?, 2, 2)?;
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::PixelLayout;

    fn bimodal() -> RasterBuffer {
        let data: Vec<u8> = (0..100).map(|i| if i < 30 { 40 } else { 210 }).collect();
        RasterBuffer::from_raw(10, 10, PixelLayout::Gray, data).unwrap()
    }

    #[test]
    fn test_otsu_between_modes() {
        let t = compute_otsu_threshold(&bimodal()).unwrap();
        assert!((40..210).contains(&t));
        assert_eq!(otsu_ink_mask(&bimodal()).unwrap().count(), 30);
    }

    #[test]
    fn test_otsu_flat_histogram() {
        let mut hist = [0u64; 256];
        hist[77] = 10;
        assert_eq!(otsu_from_histogram(&hist), 0);
        assert_eq!(otsu_from_histogram(&[0; 256]), 0);
    }

    #[test]
    fn test_block_size_resolution() {
        let o = AdaptiveThresholdOptions::default();
        assert_eq!(o.resolved_block_size(3000, 2400), 81);
        assert_eq!(o.resolved_block_size(60, 60), 3);
        assert_eq!(o.resolved_block_size(9000, 9000), 201);
        assert_eq!(o.with_block_size(10).resolved_block_size(100, 100), 11);
    }

    #[test]
    fn test_adaptive_finds_dark_mark_on_gradient() {
        let (w, h) = (90u32, 30u32);
        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let paper = 120 + x as u8;
                let ink = (40..44).contains(&x) && (10..20).contains(&y);
                data.push(if ink { paper - 80 } else { paper });
            }
        }
        let gray = RasterBuffer::from_raw(w, h, PixelLayout::Gray, data).unwrap();
        for method in [AdaptiveMethod::Mean, AdaptiveMethod::Gaussian] {
            let opts = AdaptiveThresholdOptions::default()
                .with_block_size(15)
                .with_method(method);
            let mask = adaptive_ink_mask(&gray, &opts, &CancelToken::none()).unwrap();
            assert!(mask.get(41, 15));
            assert!(!mask.get(10, 5));
            assert!(!mask.get(80, 25));
        }
    }

    #[test]
    fn test_sauvola_text_on_gray_paper() {
        let mut page = RasterBuffer::new_filled(60, 40, PixelLayout::Gray, 190).unwrap();
        page.fill_rect(&scanclean_core::Rect::new_unchecked(20, 15, 12, 3), &[30]);
        let mask = sauvola_ink_mask(&page, &SauvolaOptions::default(), &CancelToken::none()).unwrap();
        assert!(mask.get(25, 16));
        assert!(!mask.get(5, 5));
        assert_eq!(mask.count(), 36);
    }

    #[test]
    fn test_sauvola_rejects_even_window() {
        let page = RasterBuffer::new_filled(8, 8, PixelLayout::Gray, 190).unwrap();
        let opts = SauvolaOptions::default().with_window(24);
        assert!(sauvola_ink_mask(&page, &opts, &CancelToken::none()).is_err());
    }
}
