//! Homomorphic retinex illumination normalization
//!
//! The intensity is taken to the log domain, where illumination and
//! reflectance separate additively. A wide Gaussian gives the slowly
//! varying illumination (low band); the residual carries paper texture
//! and ink (high band). The bands are reweighted, re-exponentiated and
//! stretched back to 8 bits.

use crate::{FilterError, FilterResult, FloatPlane, gaussian_blur_plane};
use scanclean_core::{CancelToken, RasterBuffer, stats};

/// Histogram bins used for the percentile stretch.
const PERCENTILE_BINS: usize = 4096;

/// How the re-exponentiated result is mapped to 0..255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetinexNormalization {
    /// Stretch the full minimum..maximum range
    MinMax,
    /// Clip at the given low/high percentiles (0..100) before stretching
    Percentile { low: f64, high: f64 },
}

impl Default for RetinexNormalization {
    fn default() -> Self {
        RetinexNormalization::Percentile {
            low: 0.5,
            high: 99.5,
        }
    }
}

/// Parameters for [`homomorphic_retinex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetinexOptions {
    /// Gaussian sigma of the illumination estimate in pixels (default: 30.0)
    pub sigma: f32,
    /// Gain on the high-frequency band (default: 1.5)
    pub gamma_high: f32,
    /// Gain on the low-frequency band (default: 0.7)
    pub gamma_low: f32,
    /// Output stretch (default: percentile 0.5 / 99.5)
    pub normalization: RetinexNormalization,
}

impl Default for RetinexOptions {
    fn default() -> Self {
        Self {
            sigma: 30.0,
            gamma_high: 1.5,
            gamma_low: 0.7,
            normalization: RetinexNormalization::default(),
        }
    }
}

impl RetinexOptions {
    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn with_gains(mut self, gamma_high: f32, gamma_low: f32) -> Self {
        self.gamma_high = gamma_high;
        self.gamma_low = gamma_low;
        self
    }

    pub fn with_normalization(mut self, normalization: RetinexNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn validate(&self) -> FilterResult<()> {
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return Err(FilterError::InvalidParameters(format!(
                "retinex sigma must be positive, got {}",
                self.sigma
            )));
        }
        if !(self.gamma_high.is_finite() && self.gamma_low.is_finite()) {
            return Err(FilterError::InvalidParameters(
                "retinex gains must be finite".into(),
            ));
        }
        if let RetinexNormalization::Percentile { low, high } = self.normalization {
            let in_range = |p: f64| (0.0..=100.0).contains(&p);
            if !in_range(low) || !in_range(high) || low >= high {
                return Err(FilterError::InvalidParameters(format!(
                    "percentiles must satisfy 0 <= low < high <= 100, got {low}/{high}"
                )));
            }
        }
        Ok(())
    }
}

/// Flatten uneven illumination; returns a gray buffer.
///
/// Any layout is accepted and reduced to intensity first. An empty input
/// gives an empty output.
pub fn homomorphic_retinex(
    src: &RasterBuffer,
    options: &RetinexOptions,
    cancel: &CancelToken,
) -> FilterResult<RasterBuffer> {
    options.validate()?;
    if src.is_empty() {
        return Ok(RasterBuffer::empty());
    }
    let log = FloatPlane::from_gray(src).map(|v| v.ln_1p());
    let low = gaussian_blur_plane(&log, options.sigma, cancel)?;
    cancel.check()?;

    let mut out = log;
    for (v, &l) in out.data_mut().iter_mut().zip(low.data()) {
        let high = *v - l;
        *v = (options.gamma_low * l + options.gamma_high * high).exp_m1();
    }

    let (lo, hi) = match options.normalization {
        RetinexNormalization::MinMax => stats::min_max(out.data()),
        RetinexNormalization::Percentile { low, high } => stats::histogram_percentile(
            out.data(),
            low,
            PERCENTILE_BINS,
        )
        .zip(stats::histogram_percentile(out.data(), high, PERCENTILE_BINS)),
    }
    .unwrap_or((0.0, 0.0));

    let range = hi - lo;
    let stretched = if range > f32::EPSILON {
        out.map(|v| (v - lo) / range * 255.0)
    } else {
        out.map(|_| 255.0)
    };
    stretched.to_gray_clamped()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::PixelLayout;

    /// Page whose brightness falls off left to right, with dark marks.
    fn shaded_page() -> RasterBuffer {
        let (w, h) = (120u32, 60u32);
        let mut data = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                let paper = 230.0 - x as f32;
                let ink = (x % 20 == 10) && (10..50).contains(&y);
                data.push(if ink { paper * 0.3 } else { paper } as u8);
            }
        }
        RasterBuffer::from_raw(w, h, PixelLayout::Gray, data).unwrap()
    }

    #[test]
    fn test_retinex_flattens_paper() {
        let page = shaded_page();
        let opts = RetinexOptions::default().with_sigma(8.0).with_gains(1.5, 0.3);
        let out = homomorphic_retinex(&page, &opts, &CancelToken::none()).unwrap();
        let before = page.get_unchecked(5, 5) as i32 - page.get_unchecked(115, 5) as i32;
        let after = out.get_unchecked(5, 5) as i32 - out.get_unchecked(115, 5) as i32;
        assert!(after.abs() < before.abs());
        // ink stays darker than the paper around it
        assert!(out.get_unchecked(90, 30) < out.get_unchecked(95, 30));
    }

    #[test]
    fn test_retinex_empty() {
        let out =
            homomorphic_retinex(&RasterBuffer::empty(), &RetinexOptions::default(), &CancelToken::none())
                .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_retinex_rejects_bad_percentiles() {
        let opts = RetinexOptions::default().with_normalization(RetinexNormalization::Percentile {
            low: 90.0,
            high: 10.0,
        });
        assert!(opts.validate().is_err());
    }
}
