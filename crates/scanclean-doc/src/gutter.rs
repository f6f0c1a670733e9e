//! Splitting a two-page spread at the gutter
//!
//! The spread is reduced to an analysis copy no wider than
//! `analysis_max_width`. On that copy:
//!
//! 1. An ink mask (optional CLAHE, adaptive threshold, then a wide
//!    horizontal close that fuses characters into line blobs) is summed per
//!    column and smoothed.
//! 2. The deepest valley of that profile inside the central band is the
//!    candidate gutter. Projection confidence is `1 - valley / median`
//!    over the band.
//! 3. The candidate is checked in Lab: a narrow band at the column should
//!    be brighter than its two flanking bands by `min_delta_l` and have at
//!    most `max_std_ratio` of their texture.
//!
//! The two scores are blended into the final confidence. Below
//! `min_confidence` the split is refused; otherwise both halves are cut
//! from the full-resolution source with `pad_px` of overlap.

use crate::{DocError, DocResult};
use scanclean_color::{AdaptiveThresholdOptions, adaptive_ink_mask};
use scanclean_core::{CancelToken, RasterBuffer, Rect, stats};
use scanclean_filter::{ClaheOptions, clahe};
use scanclean_morph::close_brick;
use scanclean_transform::scale_to_max_width;
use tracing::{debug, warn};

/// Options for [`split_pages`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    /// Width of the analysis copy (default: 1200)
    pub analysis_max_width: u32,
    /// Contrast stabilization before thresholding (default: CLAHE on)
    pub clahe: Option<ClaheOptions>,
    pub adaptive: AdaptiveThresholdOptions,
    /// Horizontal close fusing characters (default: 15 x 3)
    pub close_width: u32,
    pub close_height: u32,
    /// Moving-average window over the column profile (default: 9)
    pub smoothing_window: usize,
    /// Central band searched for the valley, as fractions of the width
    /// (default: 0.35 to 0.65)
    pub band_start: f64,
    pub band_end: f64,
    /// Lab band half-width as a fraction of the width (default: 0.01)
    pub lab_band_fraction: f64,
    /// Lightness advantage of a real gutter over its flanks (default: 8)
    pub min_delta_l: f64,
    /// Largest gutter-to-flank texture ratio (default: 0.6)
    pub max_std_ratio: f64,
    /// Weight of the projection score; Lab gets the rest (default: 0.7)
    pub projection_weight: f64,
    /// Weight of brightness in the Lab score; texture gets the rest
    /// (default: 0.65)
    pub brightness_weight: f64,
    /// Confidence needed to split (default: 0.5)
    pub min_confidence: f64,
    /// Fail instead of reporting an unsuccessful split (default: false)
    pub throw_if_low_confidence: bool,
    /// Overlap added to each half, in source pixels (default: 8)
    pub pad_px: u32,
    /// Produce an analysis overlay (default: false)
    pub debug: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            analysis_max_width: 1200,
            clahe: Some(ClaheOptions::default()),
            adaptive: AdaptiveThresholdOptions::default(),
            close_width: 15,
            close_height: 3,
            smoothing_window: 9,
            band_start: 0.35,
            band_end: 0.65,
            lab_band_fraction: 0.01,
            min_delta_l: 8.0,
            max_std_ratio: 0.6,
            projection_weight: 0.7,
            brightness_weight: 0.65,
            min_confidence: 0.5,
            throw_if_low_confidence: false,
            pad_px: 8,
            debug: false,
        }
    }
}

impl SplitOptions {
    pub fn with_analysis_max_width(mut self, width: u32) -> Self {
        self.analysis_max_width = width;
        self
    }

    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = confidence;
        self
    }

    pub fn with_throw_if_low_confidence(mut self, strict: bool) -> Self {
        self.throw_if_low_confidence = strict;
        self
    }

    pub fn with_band(mut self, start: f64, end: f64) -> Self {
        self.band_start = start;
        self.band_end = end;
        self
    }

    pub fn with_pad(mut self, px: u32) -> Self {
        self.pad_px = px;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn validate(&self) -> DocResult<()> {
        if self.analysis_max_width < 16 {
            return Err(DocError::InvalidParameters(format!(
                "analysis_max_width must be at least 16, got {}",
                self.analysis_max_width
            )));
        }
        if !(0.0 <= self.band_start && self.band_start < self.band_end && self.band_end <= 1.0) {
            return Err(DocError::InvalidParameters(format!(
                "band [{}, {}] must be an increasing range within [0, 1]",
                self.band_start, self.band_end
            )));
        }
        let unit = [
            ("projection_weight", self.projection_weight),
            ("brightness_weight", self.brightness_weight),
            ("min_confidence", self.min_confidence),
            ("lab_band_fraction", self.lab_band_fraction),
        ];
        for (name, v) in unit {
            if !(0.0..=1.0).contains(&v) {
                return Err(DocError::InvalidParameters(format!(
                    "{name} must be in [0, 1], got {v}"
                )));
            }
        }
        if !(self.min_delta_l > 0.0) || !(self.max_std_ratio > 0.0) {
            return Err(DocError::InvalidParameters(format!(
                "min_delta_l {} and max_std_ratio {} must be positive",
                self.min_delta_l, self.max_std_ratio
            )));
        }
        if self.close_width == 0 || self.close_height == 0 || self.smoothing_window == 0 {
            return Err(DocError::InvalidParameters(
                "close size and smoothing window must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Result of [`split_pages`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplitResult {
    pub success: bool,
    pub left: Option<RasterBuffer>,
    pub right: Option<RasterBuffer>,
    /// Candidate gutter column in the source
    pub split_x: Option<u32>,
    /// Candidate gutter column in the analysis copy
    pub split_x_analysis: Option<u32>,
    pub projection_confidence: f64,
    pub lab_confidence: f64,
    pub final_confidence: f64,
    /// Why the split was refused
    pub reason: Option<String>,
    /// Analysis overlay, when requested
    pub debug: Option<RasterBuffer>,
}

// ============================================================================
// Analysis
// ============================================================================

/// Column ink profile of the analysis copy.
fn ink_profile(analysis: &RasterBuffer, options: &SplitOptions, cancel: &CancelToken) -> DocResult<Vec<f64>> {
    let mut gray = analysis.to_gray();
    if let Some(c) = &options.clahe {
        gray = clahe(&gray, c)?;
    }
    let ink = adaptive_ink_mask(&gray, &options.adaptive, cancel)?;
    let fused = close_brick(&ink, options.close_width, options.close_height)?;
    let columns: Vec<f64> = fused.column_counts().into_iter().map(f64::from).collect();
    Ok(stats::moving_average(&columns, options.smoothing_window))
}

/// Center of the longest run of minimal values in `profile[lo..hi]`.
fn find_valley(profile: &[f64], lo: usize, hi: usize) -> Option<(usize, f64)> {
    let band = profile.get(lo..hi)?;
    let min = band.iter().copied().fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return None;
    }
    let (mut best, mut run_start) = (None::<(usize, usize)>, None::<usize>);
    for (i, &v) in band.iter().enumerate().chain(std::iter::once((band.len(), &f64::INFINITY))) {
        let at_min = v <= min + 1e-9;
        match (at_min, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(s)) => {
                if best.is_none_or(|(bs, be)| i - s > be - bs) {
                    best = Some((s, i));
                }
                run_start = None;
            }
            _ => {}
        }
    }
    let (s, e) = best?;
    Some((lo + (s + e - 1) / 2, min))
}

/// Mean and standard deviation of L* over columns `[x0, x1)`.
fn band_lightness(lightness: &[f32], width: usize, x0: usize, x1: usize) -> Option<(f64, f64)> {
    if x0 >= x1 || x1 > width {
        return None;
    }
    let values: Vec<f64> = lightness
        .chunks_exact(width)
        .flat_map(|row| row[x0..x1].iter().map(|&v| v as f64))
        .collect();
    stats::mean_std(&values)
}

/// Lab confirmation score for a candidate column.
fn lab_confidence(analysis: &RasterBuffer, x: usize, options: &SplitOptions) -> f64 {
    let width = analysis.width() as usize;
    let lightness = analysis.lightness_plane();
    let half = ((width as f64 * options.lab_band_fraction).round() as usize).max(2);
    let offset = 4 * half;
    if x < offset + half || x + offset + half + 1 > width {
        return 0.0;
    }
    let center = band_lightness(&lightness, width, x - half, x + half + 1);
    let left = band_lightness(&lightness, width, x - offset - half, x - offset + half + 1);
    let right = band_lightness(&lightness, width, x + offset - half, x + offset + half + 1);
    let (Some((lc, sc)), Some((ll, sl)), Some((lr, sr))) = (center, left, right) else {
        return 0.0;
    };
    let delta_l = lc - (ll + lr) / 2.0;
    let brightness = (delta_l / options.min_delta_l).clamp(0.0, 1.0);
    let flank_std = (sl + sr) / 2.0;
    let ratio = if flank_std > 1e-6 {
        sc / flank_std
    } else if sc > 1e-6 {
        f64::INFINITY
    } else {
        0.0
    };
    let texture = if ratio <= options.max_std_ratio {
        1.0
    } else {
        (options.max_std_ratio / ratio).clamp(0.0, 1.0)
    };
    debug!(x, delta_l, std_ratio = ratio, brightness, texture, "gutter lab check");
    options.brightness_weight * brightness + (1.0 - options.brightness_weight) * texture
}

fn overlay(analysis: &RasterBuffer, lo: usize, hi: usize, split: Option<usize>) -> RasterBuffer {
    let mut out = analysis.to_bgr();
    let h = out.height() as f64;
    for x in [lo, hi.saturating_sub(1)] {
        out.draw_line(x as f64, 0.0, x as f64, h - 1.0, 1.0, &[128, 128, 128]);
    }
    if let Some(x) = split {
        out.draw_line(x as f64, 0.0, x as f64, h - 1.0, 1.0, &[0, 0, 255]);
    }
    out
}

// ============================================================================
// Split
// ============================================================================

/// Find the gutter of a two-page spread and cut the pages apart.
///
/// A refused split is reported through [`SplitResult::success`] and
/// [`SplitResult::reason`], or as [`DocError::LowConfidence`] when
/// `throw_if_low_confidence` is set.
pub fn split_pages(src: &RasterBuffer, options: &SplitOptions, cancel: &CancelToken) -> DocResult<SplitResult> {
    options.validate()?;
    src.ensure_not_empty("split input")?;
    let (analysis, factor) = scale_to_max_width(src, options.analysis_max_width)?;
    cancel.check()?;
    let aw = analysis.width() as usize;
    let lo = (aw as f64 * options.band_start).floor() as usize;
    let hi = ((aw as f64 * options.band_end).ceil() as usize).min(aw);

    let mut result = SplitResult::default();
    let profile = ink_profile(&analysis, options, cancel)?;
    cancel.check()?;
    let Some((valley_x, valley)) = find_valley(&profile, lo, hi) else {
        return refuse(result, "central band is empty".into(), options);
    };

    let band_median = stats::median(&profile[lo..hi]).unwrap_or(0.0);
    result.projection_confidence = if band_median > 0.0 {
        (1.0 - valley / band_median).clamp(0.0, 1.0)
    } else {
        0.0
    };
    result.lab_confidence = lab_confidence(&analysis, valley_x, options);
    result.final_confidence = options.projection_weight * result.projection_confidence
        + (1.0 - options.projection_weight) * result.lab_confidence;
    result.split_x_analysis = Some(valley_x as u32);
    let split_x = (((valley_x as f64 + 0.5) / factor - 0.5).round().max(0.0) as u32)
        .min(src.width().saturating_sub(1));
    result.split_x = Some(split_x);
    if options.debug {
        result.debug = Some(overlay(&analysis, lo, hi, Some(valley_x)));
    }
    debug!(
        split_x,
        valley_x,
        projection = result.projection_confidence,
        lab = result.lab_confidence,
        confidence = result.final_confidence,
        "gutter candidate"
    );

    if result.final_confidence < options.min_confidence {
        let reason = format!(
            "confidence {:.3} below minimum {:.3}",
            result.final_confidence, options.min_confidence
        );
        return refuse(result, reason, options);
    }
    if split_x == 0 || split_x + 1 >= src.width() {
        return refuse(result, format!("split column {split_x} leaves an empty page"), options);
    }

    let (w, h) = (src.width() as i32, src.height() as i32);
    let pad = options.pad_px as i32;
    let sx = split_x as i32;
    let left_end = (sx + pad).min(w);
    let right_start = (sx - pad).max(0);
    result.left = Some(src.crop(&Rect::new_unchecked(0, 0, left_end, h))?);
    result.right = Some(src.crop(&Rect::new_unchecked(right_start, 0, w - right_start, h))?);
    result.success = true;
    Ok(result)
}

fn refuse(mut result: SplitResult, reason: String, options: &SplitOptions) -> DocResult<SplitResult> {
    warn!(%reason, "page split refused");
    if options.throw_if_low_confidence {
        return Err(DocError::LowConfidence {
            confidence: result.final_confidence,
            minimum: options.min_confidence,
            reason,
        });
    }
    result.success = false;
    result.reason = Some(reason);
    Ok(result)
}
