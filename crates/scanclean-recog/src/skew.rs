//! Skew estimation
//!
//! Four independent estimators, each returning the *corrective* angle in
//! degrees: rotating the page by the returned angle (positive turns
//! counter-clockwise on screen) straightens it. `None` means the estimator
//! found nothing it trusts; callers treat that as "leave the page alone".
//!
//! # Estimators
//!
//! 1. **ByBorders**: largest outer contour of an adaptive-threshold mask;
//!    its longest quadrilateral edge, or its minimum-area rectangle
//! 2. **Hough**: median direction of long Canny-edge line segments
//! 3. **Projection**: angle sweep maximizing the variance of the row-wise
//!    ink histogram (coarse sweep, then a finer one around the best)
//! 4. **PCA**: principal axis of the ink pixel cloud
//!
//! [`SkewMethod::Auto`] tries Hough, then PCA, then Projection.

use crate::hough::{HoughLineOptions, hough_line_segments};
use crate::{RecogError, RecogResult};
use scanclean_color::{AdaptiveThresholdOptions, adaptive_ink_mask, otsu_ink_mask};
use scanclean_core::{
    BinaryMask, CancelToken, PointF, RasterBuffer, fold_to_axis_deg, normalize_angle_deg, stats,
};
use scanclean_filter::canny;
use scanclean_morph::close_brick;
use scanclean_region::{approx_poly_closed, arc_length, largest_external_contour, min_area_rect};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// Methods
// ============================================================================

/// Skew estimator selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkewMethod {
    /// Hough, then PCA, then Projection
    #[default]
    Auto,
    /// Largest outer contour (page edge on a dark scanner bed)
    ByBorders,
    /// Long straight edges
    Hough,
    /// Row-profile variance sweep
    Projection,
    /// Principal axis of the ink
    Pca,
}

impl SkewMethod {
    /// Name as used in parameter maps.
    pub fn name(self) -> &'static str {
        match self {
            SkewMethod::Auto => "Auto",
            SkewMethod::ByBorders => "ByBorders",
            SkewMethod::Hough => "Hough",
            SkewMethod::Projection => "Projection",
            SkewMethod::Pca => "PCA",
        }
    }

    /// Smallest angle worth rotating for, in degrees.
    pub fn deadband(self) -> f64 {
        match self {
            SkewMethod::ByBorders => 0.02,
            SkewMethod::Hough | SkewMethod::Pca | SkewMethod::Auto => 0.01,
            SkewMethod::Projection => 0.005,
        }
    }
}

impl fmt::Display for SkewMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SkewMethod {
    type Err = RecogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SkewMethod::Auto),
            "byborders" | "borders" => Ok(SkewMethod::ByBorders),
            "hough" => Ok(SkewMethod::Hough),
            "projection" => Ok(SkewMethod::Projection),
            "pca" => Ok(SkewMethod::Pca),
            _ => Err(RecogError::UnsupportedMethod(s.to_string())),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Options for the border-contour estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderSkewOptions {
    /// Smallest contour area, as a fraction of the image area (default: 0.25)
    pub min_area_fraction: f64,
    /// Square closing applied to the threshold mask; 0 disables (default: 5)
    pub close_size: u32,
    /// Polygon tolerance as a fraction of the contour length (default: 0.02)
    pub approx_epsilon_fraction: f64,
    /// Thresholding of the page outline
    pub adaptive: AdaptiveThresholdOptions,
}

impl Default for BorderSkewOptions {
    fn default() -> Self {
        Self {
            min_area_fraction: 0.25,
            close_size: 5,
            approx_epsilon_fraction: 0.02,
            adaptive: AdaptiveThresholdOptions::default(),
        }
    }
}

impl BorderSkewOptions {
    pub fn with_min_area_fraction(mut self, fraction: f64) -> Self {
        self.min_area_fraction = fraction;
        self
    }

    pub fn with_close_size(mut self, size: u32) -> Self {
        self.close_size = size;
        self
    }

    pub fn validate(&self) -> RecogResult<()> {
        if !(0.0..=1.0).contains(&self.min_area_fraction) {
            return Err(RecogError::InvalidParameter(format!(
                "min_area_fraction must be within [0, 1], got {}",
                self.min_area_fraction
            )));
        }
        if !(self.approx_epsilon_fraction > 0.0 && self.approx_epsilon_fraction < 1.0) {
            return Err(RecogError::InvalidParameter(format!(
                "approx_epsilon_fraction must be within (0, 1), got {}",
                self.approx_epsilon_fraction
            )));
        }
        self.adaptive.validate()?;
        Ok(())
    }
}

/// Options for the Hough estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughSkewOptions {
    /// Canny low hysteresis threshold (default: 50.0)
    pub canny_low: f32,
    /// Canny high hysteresis threshold (default: 150.0)
    pub canny_high: f32,
    /// Requested minimum line length as a fraction of the width, in (0, 1]
    /// (default: 0.25)
    pub min_length_fraction: f64,
    /// Largest gap bridged along a line, in pixels (default: 10.0)
    pub max_line_gap: f64,
}

impl Default for HoughSkewOptions {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            min_length_fraction: 0.25,
            max_line_gap: 10.0,
        }
    }
}

impl HoughSkewOptions {
    pub fn with_min_length_fraction(mut self, fraction: f64) -> Self {
        self.min_length_fraction = fraction;
        self
    }

    pub fn with_canny_thresholds(mut self, low: f32, high: f32) -> Self {
        self.canny_low = low;
        self.canny_high = high;
        self
    }

    pub fn with_max_line_gap(mut self, gap: f64) -> Self {
        self.max_line_gap = gap;
        self
    }

    pub fn validate(&self) -> RecogResult<()> {
        if !(self.min_length_fraction > 0.0 && self.min_length_fraction <= 1.0) {
            return Err(RecogError::InvalidParameter(format!(
                "min_length_fraction must be within (0, 1], got {}",
                self.min_length_fraction
            )));
        }
        if !(self.canny_low >= 0.0 && self.canny_high >= self.canny_low) {
            return Err(RecogError::InvalidParameter(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {}/{}",
                self.canny_low, self.canny_high
            )));
        }
        if !(self.max_line_gap >= 0.0) {
            return Err(RecogError::InvalidParameter("max_line_gap must be non-negative".into()));
        }
        Ok(())
    }
}

/// Options for the projection-profile estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSkewOptions {
    /// Half the sweep range in degrees (default: 15.0)
    pub range: f64,
    /// Coarse sweep step in degrees (default: 1.0)
    pub coarse_step: f64,
    /// Fine sweep step in degrees (default: 0.2)
    pub fine_step: f64,
    /// Ink pixels scored per angle; larger inputs are subsampled (default: 200000)
    pub max_points: usize,
}

impl Default for ProjectionSkewOptions {
    fn default() -> Self {
        Self {
            range: 15.0,
            coarse_step: 1.0,
            fine_step: 0.2,
            max_points: 200_000,
        }
    }
}

impl ProjectionSkewOptions {
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    pub fn with_steps(mut self, coarse: f64, fine: f64) -> Self {
        self.coarse_step = coarse;
        self.fine_step = fine;
        self
    }

    pub fn validate(&self) -> RecogResult<()> {
        if !(self.range > 0.0 && self.range <= 45.0) {
            return Err(RecogError::InvalidParameter(format!(
                "projection range must be within (0, 45], got {}",
                self.range
            )));
        }
        if !(self.coarse_step > 0.0 && self.fine_step > 0.0 && self.fine_step <= self.coarse_step) {
            return Err(RecogError::InvalidParameter(format!(
                "projection steps must satisfy 0 < fine <= coarse, got {}/{}",
                self.fine_step, self.coarse_step
            )));
        }
        if self.max_points == 0 {
            return Err(RecogError::InvalidParameter("max_points must be positive".into()));
        }
        Ok(())
    }
}

/// Options for the PCA estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcaSkewOptions {
    /// Fewest ink pixels for an estimate (default: 50)
    pub min_points: usize,
    /// Estimates steeper than this are discarded (default: 45.0)
    pub max_abs_angle: f64,
}

impl Default for PcaSkewOptions {
    fn default() -> Self {
        Self {
            min_points: 50,
            max_abs_angle: 45.0,
        }
    }
}

/// Options for all estimators
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkewOptions {
    pub border: BorderSkewOptions,
    pub hough: HoughSkewOptions,
    pub projection: ProjectionSkewOptions,
    pub pca: PcaSkewOptions,
}

impl SkewOptions {
    pub fn validate(&self) -> RecogResult<()> {
        self.border.validate()?;
        self.hough.validate()?;
        self.projection.validate()?;
        Ok(())
    }
}

/// An accepted estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewEstimate {
    /// Corrective angle in degrees
    pub angle: f64,
    /// Estimator that produced it (never `Auto`)
    pub method: SkewMethod,
}

// ============================================================================
// Border contour
// ============================================================================

/// Corrective angle from the page outline.
///
/// `None` when no contour covers `min_area_fraction` of the image or the
/// angle is below 0.02 degrees.
pub fn estimate_by_borders(
    src: &RasterBuffer,
    options: &BorderSkewOptions,
    cancel: &CancelToken,
) -> RecogResult<Option<f64>> {
    options.validate()?;
    src.ensure_not_empty("skew input")?;
    let gray = src.to_gray();
    let mut mask = adaptive_ink_mask(&gray, &options.adaptive, cancel)?;
    if options.close_size > 1 {
        mask = close_brick(&mask, options.close_size, options.close_size)?;
    }
    let Some(contour) = largest_external_contour(&mask, cancel)? else {
        return Ok(None);
    };
    let image_area = gray.width() as f64 * gray.height() as f64;
    let area = contour.area();
    if area < options.min_area_fraction * image_area {
        debug!(area, image_area, "border contour too small");
        return Ok(None);
    }

    let points = contour.points_f64();
    let quad = approx_poly_closed(&points, options.approx_epsilon_fraction * arc_length(&points));
    let edge = if quad.len() == 4 { longest_edge_angle(&points, &quad) } else { None };
    let raw = match edge {
        Some(a) => a,
        None => match min_area_rect(&points) {
            Some(r) => r.long_side_angle(),
            None => return Ok(None),
        },
    };
    let angle = fold_to_axis_deg(normalize_angle_deg(raw));
    debug!(angle, vertices = quad.len(), "border contour skew");
    if angle.abs() < SkewMethod::ByBorders.deadband() {
        return Ok(None);
    }
    Ok(Some(angle))
}

/// Fraction of an edge run dropped at each end before line fitting.
const EDGE_TRIM_FRACTION: f64 = 0.15;

/// Largest disagreement, in degrees, between opposite quad edges.
const EDGE_PARALLEL_TOLERANCE: f64 = 1.0;

/// Direction of the longest quad edge, fitted over the contour run
/// between its two vertices.
///
/// `None` when the opposite edge is not parallel within
/// [`EDGE_PARALLEL_TOLERANCE`] or a run is too short to fit.
fn longest_edge_angle(points: &[PointF], quad: &[PointF]) -> Option<f64> {
    let idx: Vec<usize> = quad.iter().map(|v| nearest_index(points, v)).collect();
    let longest = (0..4).max_by(|&i, &j| {
        quad[i].distance(&quad[(i + 1) % 4]).total_cmp(&quad[j].distance(&quad[(j + 1) % 4]))
    })?;
    let opposite = (longest + 2) % 4;
    let a = edge_run_angle(points, idx[longest], idx[(longest + 1) % 4])?;
    let b = edge_run_angle(points, idx[opposite], idx[(opposite + 1) % 4])?;
    let spread = fold_to_axis_deg(a - b).abs();
    debug!(a, b, spread, "border quad edges");
    if spread > EDGE_PARALLEL_TOLERANCE {
        return None;
    }
    Some(a)
}

fn nearest_index(points: &[PointF], v: &PointF) -> usize {
    (0..points.len())
        .min_by(|&i, &j| points[i].distance(v).total_cmp(&points[j].distance(v)))
        .unwrap_or(0)
}

/// Principal-axis angle of the shorter contour arc from `from` to `to`,
/// with both ends trimmed off.
fn edge_run_angle(points: &[PointF], from: usize, to: usize) -> Option<f64> {
    let n = points.len();
    let forward = (to + n - from) % n;
    let (start, len) = if forward * 2 <= n { (from, forward) } else { (to, n - forward) };
    let trim = (len as f64 * EDGE_TRIM_FRACTION).round() as usize;
    if len < 2 * trim + 3 {
        return None;
    }
    let run: Vec<PointF> = (trim..=len - trim).map(|k| points[(start + k) % n]).collect();
    let count = run.len() as f64;
    let (mx, my) = run.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (mx, my) = (mx / count, my / count);
    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);
    for p in &run {
        let (dx, dy) = (p.x - mx, p.y - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    Some((0.5 * (2.0 * sxy).atan2(sxx - syy)).to_degrees())
}

// ============================================================================
// Hough
// ============================================================================

/// Corrective angle from long straight edges.
///
/// `None` when no segment is found or the median direction is steeper
/// than 45 degrees.
pub fn estimate_by_hough(
    src: &RasterBuffer,
    options: &HoughSkewOptions,
    cancel: &CancelToken,
) -> RecogResult<Option<f64>> {
    options.validate()?;
    src.ensure_not_empty("skew input")?;
    let gray = src.to_gray();
    let edges = canny(&gray, options.canny_low, options.canny_high, cancel)?;
    let requested = options.min_length_fraction * gray.width() as f64;
    let detect_len = (requested * 0.25).max(10.0);
    let lines = HoughLineOptions::default()
        .with_min_line_length(detect_len)
        .with_vote_threshold(detect_len as u32)
        .with_max_line_gap(options.max_line_gap);
    let segments = hough_line_segments(&edges, &lines, cancel)?;
    if segments.is_empty() {
        return Ok(None);
    }

    let long: Vec<f64> = segments
        .iter()
        .filter(|s| s.length() >= requested * 0.5)
        .map(|s| s.angle_deg())
        .collect();
    let angles = if long.is_empty() {
        segments.iter().map(|s| s.angle_deg()).collect()
    } else {
        long
    };
    let Some(median) = stats::median(&angles) else {
        return Ok(None);
    };
    debug!(segments = segments.len(), used = angles.len(), median, "hough skew");
    if median.abs() > 45.0 {
        return Ok(None);
    }
    Ok(Some(median))
}

// ============================================================================
// Projection profile
// ============================================================================

/// Ink coordinates relative to the image center, subsampled to `max_points`.
fn centered_points(mask: &BinaryMask, max_points: usize) -> Vec<(f64, f64)> {
    let total = mask.count();
    let stride = total.div_ceil(max_points).max(1);
    let cx = (mask.width() as f64 - 1.0) / 2.0;
    let cy = (mask.height() as f64 - 1.0) / 2.0;
    mask.points()
        .step_by(stride)
        .map(|(x, y)| (x as f64 - cx, y as f64 - cy))
        .collect()
}

/// Variance of the row histogram after turning the points by `angle_deg`.
fn profile_variance(points: &[(f64, f64)], angle_deg: f64, bins: &mut [u32]) -> f64 {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let half = (bins.len() / 2) as f64;
    bins.fill(0);
    for &(dx, dy) in points {
        let row = (c * dy - s * dx + half).round();
        if row >= 0.0 && (row as usize) < bins.len() {
            bins[row as usize] += 1;
        }
    }
    stats::variance_u32(bins)
}

/// Best angle on `[lo, hi]` in steps of `step`; the earliest wins ties.
fn sweep(
    points: &[(f64, f64)],
    lo: f64,
    hi: f64,
    step: f64,
    bins: &mut [u32],
    cancel: &CancelToken,
) -> RecogResult<(f64, f64)> {
    let n = ((hi - lo) / step + 1e-9).floor() as usize;
    let mut best = (lo, f64::MIN);
    for i in 0..=n {
        cancel.check()?;
        let angle = lo + i as f64 * step;
        let score = profile_variance(points, angle, bins);
        if score > best.1 {
            best = (angle, score);
        }
    }
    Ok(best)
}

/// Corrective angle maximizing the variance of the row-wise ink count.
///
/// `None` when the page has no ink. Polls `cancel` once per angle.
pub fn estimate_by_projection(
    src: &RasterBuffer,
    options: &ProjectionSkewOptions,
    cancel: &CancelToken,
) -> RecogResult<Option<f64>> {
    options.validate()?;
    src.ensure_not_empty("skew input")?;
    let ink = otsu_ink_mask(src)?;
    projection_angle_of_mask(&ink, options, cancel)
}

/// Projection sweep over an existing ink mask.
pub fn projection_angle_of_mask(
    ink: &BinaryMask,
    options: &ProjectionSkewOptions,
    cancel: &CancelToken,
) -> RecogResult<Option<f64>> {
    options.validate()?;
    let points = centered_points(ink, options.max_points);
    if points.is_empty() {
        return Ok(None);
    }
    let diag = (ink.width() as f64).hypot(ink.height() as f64).ceil() as usize;
    let mut bins = vec![0u32; diag + 3];

    let (coarse, _) = sweep(
        &points,
        -options.range,
        options.range,
        options.coarse_step,
        &mut bins,
        cancel,
    )?;
    let (fine, score) = sweep(
        &points,
        coarse - options.coarse_step,
        coarse + options.coarse_step,
        options.fine_step,
        &mut bins,
        cancel,
    )?;
    debug!(coarse, fine, score, points = points.len(), "projection skew");
    Ok(Some(fine))
}

// ============================================================================
// PCA
// ============================================================================

/// Corrective angle from the principal axis of the ink pixels.
///
/// `None` with fewer than `min_points` ink pixels or when the axis is
/// steeper than `max_abs_angle`.
pub fn estimate_by_pca(
    src: &RasterBuffer,
    options: &PcaSkewOptions,
    cancel: &CancelToken,
) -> RecogResult<Option<f64>> {
    src.ensure_not_empty("skew input")?;
    let ink = otsu_ink_mask(src)?;
    let (mut n, mut sx, mut sy) = (0usize, 0.0f64, 0.0f64);
    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);
    for y in 0..ink.height() {
        cancel.check()?;
        for (x, &v) in ink.row(y).iter().enumerate() {
            if v == 0 {
                continue;
            }
            let (xf, yf) = (x as f64, y as f64);
            n += 1;
            sx += xf;
            sy += yf;
            sxx += xf * xf;
            syy += yf * yf;
            sxy += xf * yf;
        }
    }
    if n < options.min_points.max(2) {
        return Ok(None);
    }
    let nf = n as f64;
    let (mx, my) = (sx / nf, sy / nf);
    let cxx = sxx / nf - mx * mx;
    let cyy = syy / nf - my * my;
    let cxy = sxy / nf - mx * my;
    let angle = normalize_angle_deg(0.5 * (2.0 * cxy).atan2(cxx - cyy).to_degrees());
    debug!(points = n, angle, "pca skew");
    if angle.abs() > options.max_abs_angle {
        return Ok(None);
    }
    Ok(Some(angle))
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run one estimator, or the Auto fallback chain.
pub fn estimate_skew(
    src: &RasterBuffer,
    method: SkewMethod,
    options: &SkewOptions,
    cancel: &CancelToken,
) -> RecogResult<Option<SkewEstimate>> {
    options.validate()?;
    let single = |m: SkewMethod| -> RecogResult<Option<SkewEstimate>> {
        let angle = match m {
            SkewMethod::ByBorders => estimate_by_borders(src, &options.border, cancel)?,
            SkewMethod::Hough => estimate_by_hough(src, &options.hough, cancel)?,
            SkewMethod::Projection => estimate_by_projection(src, &options.projection, cancel)?,
            SkewMethod::Pca => estimate_by_pca(src, &options.pca, cancel)?,
            SkewMethod::Auto => None,
        };
        Ok(angle
            .filter(|a| a.is_finite())
            .map(|angle| SkewEstimate { angle, method: m }))
    };
    match method {
        SkewMethod::Auto => {
            for m in [SkewMethod::Hough, SkewMethod::Pca, SkewMethod::Projection] {
                if let Some(est) = single(m)? {
                    return Ok(Some(est));
                }
            }
            Ok(None)
        }
        m => single(m),
    }
}
