//! Binarizer entry point
//!
//! Reduces a page to black ink on white paper. The result is always a
//! 3-channel BGR buffer holding only 0 and 255, so every later stage sees
//! the same layout regardless of which method produced it.

use crate::threshold::{
    AdaptiveThresholdOptions, SauvolaOptions, adaptive_ink_mask, sauvola_ink_mask,
    threshold_ink_mask,
};
use crate::{ColorError, ColorResult};
use scanclean_core::{BinaryMask, CancelToken, RasterBuffer};
use scanclean_filter::{RetinexOptions, homomorphic_retinex};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Thresholding method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BinarizeMethod {
    /// Fixed global cutoff
    #[default]
    Threshold,
    /// Local mean or Gaussian-weighted threshold
    Adaptive,
    /// Local mean and contrast threshold
    Sauvola,
}

impl BinarizeMethod {
    pub fn name(self) -> &'static str {
        match self {
            BinarizeMethod::Threshold => "Threshold",
            BinarizeMethod::Adaptive => "Adaptive",
            BinarizeMethod::Sauvola => "Sauvola",
        }
    }
}

impl fmt::Display for BinarizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BinarizeMethod {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threshold" => Ok(BinarizeMethod::Threshold),
            "adaptive" => Ok(BinarizeMethod::Adaptive),
            "sauvola" => Ok(BinarizeMethod::Sauvola),
            _ => Err(ColorError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Optional normalization run before thresholding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PreBinarization {
    #[default]
    None,
    /// Flatten uneven illumination
    HomomorphicRetinex,
}

impl PreBinarization {
    pub fn name(self) -> &'static str {
        match self {
            PreBinarization::None => "None",
            PreBinarization::HomomorphicRetinex => "HomomorphicRetinex",
        }
    }
}

impl fmt::Display for PreBinarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PreBinarization {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(PreBinarization::None),
            "homomorphicretinex" | "retinex" => Ok(PreBinarization::HomomorphicRetinex),
            _ => Err(ColorError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Tunables for all thresholding methods
///
/// Only the block matching the selected method is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinarizeParameters {
    /// Global cutoff for [`BinarizeMethod::Threshold`] (default: 128)
    pub threshold: u8,
    pub adaptive: AdaptiveThresholdOptions,
    pub sauvola: SauvolaOptions,
}

impl Default for BinarizeParameters {
    fn default() -> Self {
        Self {
            threshold: 128,
            adaptive: AdaptiveThresholdOptions::default(),
            sauvola: SauvolaOptions::default(),
        }
    }
}

impl BinarizeParameters {
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_adaptive(mut self, adaptive: AdaptiveThresholdOptions) -> Self {
        self.adaptive = adaptive;
        self
    }

    pub fn with_sauvola(mut self, sauvola: SauvolaOptions) -> Self {
        self.sauvola = sauvola;
        self
    }

    /// Check the block used by `method`.
    pub fn validate(&self, method: BinarizeMethod) -> ColorResult<()> {
        match method {
            BinarizeMethod::Threshold => Ok(()),
            BinarizeMethod::Adaptive => self.adaptive.validate(),
            BinarizeMethod::Sauvola => self.sauvola.validate(),
        }
    }
}

/// Pre-binarization stage selection and tunables
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PreBinarizeParameters {
    pub method: PreBinarization,
    pub retinex: RetinexOptions,
}

impl PreBinarizeParameters {
    pub fn retinex(options: RetinexOptions) -> Self {
        Self {
            method: PreBinarization::HomomorphicRetinex,
            retinex: options,
        }
    }
}

/// Ink mask of `src` (ink = foreground).
///
/// Runs the pre-binarization stage, then the selected threshold.
pub fn binarize_to_mask(
    src: &RasterBuffer,
    method: BinarizeMethod,
    params: &BinarizeParameters,
    pre: &PreBinarizeParameters,
    cancel: &CancelToken,
) -> ColorResult<BinaryMask> {
    params.validate(method)?;
    src.ensure_not_empty("binarize input")?;

    let gray = match pre.method {
        PreBinarization::None => src.to_gray(),
        PreBinarization::HomomorphicRetinex => homomorphic_retinex(src, &pre.retinex, cancel)?,
    };
    cancel.check()?;

    let mask = match method {
        BinarizeMethod::Threshold => threshold_ink_mask(&gray, params.threshold)?,
        BinarizeMethod::Adaptive => adaptive_ink_mask(&gray, &params.adaptive, cancel)?,
        BinarizeMethod::Sauvola => sauvola_ink_mask(&gray, &params.sauvola, cancel)?,
    };
    debug!(
        method = %method,
        pre = %pre.method,
        ink_pixels = mask.count(),
        "binarized {}x{}",
        src.width(),
        src.height()
    );
    Ok(mask)
}

/// Binarize a page into a bitonal 3-channel image.
///
/// An empty input returns an empty buffer.
///
/// # Errors
///
/// Returns [`ColorError::InvalidParameters`] for out-of-range tunables and
/// propagates cancellation.
pub fn binarize(
    src: &RasterBuffer,
    method: BinarizeMethod,
    params: &BinarizeParameters,
    pre: &PreBinarizeParameters,
    cancel: &CancelToken,
) -> ColorResult<RasterBuffer> {
    if src.is_empty() {
        return Ok(RasterBuffer::empty());
    }
    Ok(binarize_to_mask(src, method, params, pre, cancel)?.to_bitonal_bgr())
}

/// Binarize with method and pre-method given by name.
///
/// # Errors
///
/// Unknown names give [`ColorError::UnsupportedMethod`].
pub fn binarize_named(
    src: &RasterBuffer,
    method: &str,
    pre_method: &str,
    params: &BinarizeParameters,
    cancel: &CancelToken,
) -> ColorResult<RasterBuffer> {
    let method: BinarizeMethod = method.parse()?;
    let pre = PreBinarizeParameters {
        method: pre_method.parse()?,
        ..Default::default()
    };
    binarize(src, method, params, &pre, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::{ErrorKind, PixelLayout};

    fn checker() -> RasterBuffer {
        let mut data = Vec::new();
        for y in 0..16u32 {
            for x in 0..16u32 {
                let v = if (x / 4 + y / 4) % 2 == 0 { 20 } else { 230 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        RasterBuffer::from_raw(16, 16, PixelLayout::Bgr, data).unwrap()
    }

    #[test]
    fn test_threshold_output_is_bitonal_bgr() {
        let out = binarize(
            &checker(),
            BinarizeMethod::Threshold,
            &BinarizeParameters::default(),
            &PreBinarizeParameters::default(),
            &CancelToken::none(),
        )
        .unwrap();
        assert_eq!(out.layout(), PixelLayout::Bgr);
        assert!(out.data().iter().all(|&v| v == 0 || v == 255));
        assert_eq!(out.pixel(0, 0), &[0, 0, 0]);
        assert_eq!(out.pixel(5, 0), &[255, 255, 255]);
    }

    #[test]
    fn test_threshold_is_idempotent() {
        let params = BinarizeParameters::default();
        let pre = PreBinarizeParameters::default();
        let once = binarize(&checker(), BinarizeMethod::Threshold, &params, &pre, &CancelToken::none()).unwrap();
        let twice = binarize(&once, BinarizeMethod::Threshold, &params, &pre, &CancelToken::none()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let out = binarize(
            &RasterBuffer::empty(),
            BinarizeMethod::Sauvola,
            &BinarizeParameters::default(),
            &PreBinarizeParameters::default(),
            &CancelToken::none(),
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_method_names() {
        assert_eq!("sauvola".parse::<BinarizeMethod>().unwrap(), BinarizeMethod::Sauvola);
        assert_eq!("Adaptive".parse::<BinarizeMethod>().unwrap(), BinarizeMethod::Adaptive);
        assert_eq!(
            "HomomorphicRetinex".parse::<PreBinarization>().unwrap(),
            PreBinarization::HomomorphicRetinex
        );
        let err = "Niblack".parse::<BinarizeMethod>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration);
        let err = "MultiScaleRetinex".parse::<PreBinarization>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration);
    }

    #[test]
    fn test_named_entry_rejects_unknown_pre_method() {
        let res = binarize_named(
            &checker(),
            "Threshold",
            "Wolf",
            &BinarizeParameters::default(),
            &CancelToken::none(),
        );
        assert!(matches!(res, Err(ColorError::UnsupportedMethod(_))));
    }

    #[test]
    fn test_cancelled_sauvola() {
        let res = binarize(
            &checker(),
            BinarizeMethod::Sauvola,
            &BinarizeParameters::default(),
            &PreBinarizeParameters::default(),
            &CancelToken::trip_after(3),
        );
        assert_eq!(res.unwrap_err().kind(), ErrorKind::Cancelled);
    }
}
