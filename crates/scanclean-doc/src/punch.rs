//! Punch hole removal
//!
//! Holes are searched only in bands along the page edges. Circular holes
//! come from a gradient Hough transform, rectangular ones from an adaptive
//! threshold and external contours. A candidate must be at least the
//! nominal size and at most `nominal * (1 + tolerance)`, and its interior
//! must differ from its surroundings by [`PunchOptions::contrast_margin`]
//! in the expected direction. Accepted holes are drawn into one mask,
//! feathered and inpainted.

use crate::hough_circle::{HoughCircleOptions, hough_circles};
use crate::{DocError, DocResult};
use scanclean_color::{AdaptiveThresholdOptions, adaptive_ink_mask};
use scanclean_core::{BinaryMask, CancelToken, PixelLayout, PointF, RasterBuffer, Rect};
use scanclean_filter::{FloatPlane, Gradients, canny, gaussian_blur_plane, inpaint, sobel};
use scanclean_region::find_external_contours;
use std::str::FromStr;
use tracing::debug;

/// Default band width as a fraction of the perpendicular page dimension.
const DEFAULT_BAND_FRACTION: f64 = 0.15;

/// Slack, in pixels, for rasterized hole edges.
const SIZE_SLACK: f64 = 1.0;

// ============================================================================
// Specification
// ============================================================================

/// Nominal hole geometry, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PunchShape {
    Circle { diameter: f64 },
    Rect { width: f64, height: f64 },
}

/// Expected hole tone relative to the paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoleDensity {
    /// Darker than the paper (dark scanner lid)
    Dark,
    /// Lighter than the paper
    Light,
    #[default]
    Any,
}

impl FromStr for HoleDensity {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Dark" => Ok(HoleDensity::Dark),
            "Light" => Ok(HoleDensity::Light),
            "Any" => Ok(HoleDensity::Any),
            other => Err(DocError::UnsupportedMethod(format!("hole density '{other}'"))),
        }
    }
}

/// One kind of hole to look for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PunchSpec {
    pub shape: PunchShape,
    /// Accepted oversize, as a fraction of the nominal size (default: 0.2).
    /// Holes smaller than nominal are never accepted.
    pub size_tolerance_fraction: f64,
    pub density: HoleDensity,
}

impl PunchSpec {
    pub fn circle(diameter: f64) -> Self {
        Self {
            shape: PunchShape::Circle { diameter },
            size_tolerance_fraction: 0.2,
            density: HoleDensity::Any,
        }
    }

    pub fn rect(width: f64, height: f64) -> Self {
        Self {
            shape: PunchShape::Rect { width, height },
            size_tolerance_fraction: 0.2,
            density: HoleDensity::Any,
        }
    }

    pub fn with_tolerance(mut self, fraction: f64) -> Self {
        self.size_tolerance_fraction = fraction;
        self
    }

    pub fn with_density(mut self, density: HoleDensity) -> Self {
        self.density = density;
        self
    }

    pub fn validate(&self) -> DocResult<()> {
        let sizes_ok = match self.shape {
            PunchShape::Circle { diameter } => diameter >= 2.0 && diameter.is_finite(),
            PunchShape::Rect { width, height } => {
                width >= 2.0 && height >= 2.0 && width.is_finite() && height.is_finite()
            }
        };
        if !sizes_ok {
            return Err(DocError::InvalidParameters(format!(
                "hole size {:?} must be at least 2px",
                self.shape
            )));
        }
        if !(self.size_tolerance_fraction >= 0.0 && self.size_tolerance_fraction.is_finite()) {
            return Err(DocError::InvalidParameters(format!(
                "size tolerance must be non-negative, got {}",
                self.size_tolerance_fraction
            )));
        }
        Ok(())
    }
}

/// Search bands along each edge, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeBands {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl EdgeBands {
    pub fn uniform(px: u32) -> Self {
        Self {
            left: px,
            top: px,
            right: px,
            bottom: px,
        }
    }

    /// Bands a fixed fraction of the page wide.
    pub fn proportional(width: u32, height: u32, fraction: f64) -> Self {
        let lr = (width as f64 * fraction).round() as u32;
        let tb = (height as f64 * fraction).round() as u32;
        Self {
            left: lr,
            top: tb,
            right: lr,
            bottom: tb,
        }
    }

    pub fn contains(&self, x: f64, y: f64, width: u32, height: u32) -> bool {
        x < self.left as f64
            || y < self.top as f64
            || x >= width as f64 - self.right as f64
            || y >= height as f64 - self.bottom as f64
    }

    fn mask(&self, width: u32, height: u32) -> DocResult<BinaryMask> {
        let mut m = BinaryMask::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                if self.contains(x as f64, y as f64, width, height) {
                    m.set_unchecked(x, y, true);
                }
            }
        }
        Ok(m)
    }
}

/// Options for [`remove_punch_holes`]
#[derive(Debug, Clone, PartialEq)]
pub struct PunchOptions {
    pub specs: Vec<PunchSpec>,
    /// Search bands; `None` uses 15% of the page on every side
    pub bands: Option<EdgeBands>,
    /// Required mean difference between interior and surroundings
    /// (default: 25)
    pub contrast_margin: f64,
    /// Rectangles: pixel area over bounding-box area (default: 0.6)
    pub min_fill_ratio: f64,
    /// Gaussian sigma used to feather the hole mask (default: 2.0)
    pub feather_sigma: f32,
    /// Canny hysteresis thresholds (default: 50 / 150)
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for PunchOptions {
    fn default() -> Self {
        Self {
            specs: Vec::new(),
            bands: None,
            contrast_margin: 25.0,
            min_fill_ratio: 0.6,
            feather_sigma: 2.0,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

impl PunchOptions {
    pub fn new(specs: Vec<PunchSpec>) -> Self {
        Self {
            specs,
            ..Default::default()
        }
    }

    pub fn with_bands(mut self, bands: EdgeBands) -> Self {
        self.bands = Some(bands);
        self
    }

    pub fn with_contrast_margin(mut self, margin: f64) -> Self {
        self.contrast_margin = margin;
        self
    }

    pub fn with_feather_sigma(mut self, sigma: f32) -> Self {
        self.feather_sigma = sigma;
        self
    }

    pub fn validate(&self) -> DocResult<()> {
        for spec in &self.specs {
            spec.validate()?;
        }
        if !(self.contrast_margin >= 0.0) || !(0.0..=1.0).contains(&self.min_fill_ratio) {
            return Err(DocError::InvalidParameters(format!(
                "contrast margin {} / fill ratio {} out of range",
                self.contrast_margin, self.min_fill_ratio
            )));
        }
        if !(self.feather_sigma >= 0.0 && self.feather_sigma.is_finite()) {
            return Err(DocError::InvalidParameters(format!(
                "feather sigma must be non-negative, got {}",
                self.feather_sigma
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Detection
// ============================================================================

/// An accepted hole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectedHole {
    Circle { center: PointF, radius: f64 },
    Rect(Rect),
}

impl DetectedHole {
    /// Radius of the hole, or half the shorter side of a rectangle.
    pub fn radius(&self) -> f64 {
        match self {
            DetectedHole::Circle { radius, .. } => *radius,
            DetectedHole::Rect(r) => r.w.min(r.h) as f64 / 2.0,
        }
    }
}

/// Mean gray over the pixels within `[r0, r1)` of `center`.
fn ring_mean(gray: &RasterBuffer, center: PointF, r0: f64, r1: f64) -> Option<f64> {
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    let x0 = ((center.x - r1).floor() as i64).max(0);
    let x1 = ((center.x + r1).ceil() as i64).min(w - 1);
    let y0 = ((center.y - r1).floor() as i64).max(0);
    let y1 = ((center.y + r1).ceil() as i64).min(h - 1);
    let (mut sum, mut n) = (0.0, 0u64);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = (x as f64 - center.x).hypot(y as f64 - center.y);
            if d >= r0 && d < r1 {
                sum += gray.get_unchecked(x as u32, y as u32) as f64;
                n += 1;
            }
        }
    }
    (n > 0).then(|| sum / n as f64)
}

/// Mean gray of the band between `inner` and `outer` (clipped).
fn frame_mean(gray: &RasterBuffer, inner: &Rect, outer: &Rect) -> Option<f64> {
    let outer = outer.clip_to(gray.width(), gray.height())?;
    let (mut sum, mut n) = (0.0, 0u64);
    for y in outer.y..outer.bottom() {
        for x in outer.x..outer.right() {
            if !inner.contains_point(x, y) {
                sum += gray.get_unchecked(x as u32, y as u32) as f64;
                n += 1;
            }
        }
    }
    (n > 0).then(|| sum / n as f64)
}

/// Whether `interior` vs `surround` passes the density test.
fn contrast_ok(interior: f64, surround: f64, density: HoleDensity, margin: f64) -> bool {
    match density {
        HoleDensity::Dark => surround - interior > margin,
        HoleDensity::Light => interior - surround > margin,
        HoleDensity::Any => (surround - interior).abs() > margin,
    }
}

fn detect_circles(
    gray: &RasterBuffer,
    (edges, gradients): (&BinaryMask, &Gradients),
    spec: &PunchSpec,
    diameter: f64,
    bands: &EdgeBands,
    options: &PunchOptions,
    cancel: &CancelToken,
) -> DocResult<Vec<DetectedHole>> {
    let nominal = diameter / 2.0;
    let max_r = nominal * (1.0 + spec.size_tolerance_fraction);
    let hough = HoughCircleOptions::new(nominal.max(1.0), max_r.max(1.0));
    let circles = hough_circles(edges, gradients, &hough, cancel)?;
    let (w, h) = (gray.width(), gray.height());
    let mut out = Vec::new();
    for c in circles {
        if c.radius < nominal - SIZE_SLACK || c.radius > max_r + SIZE_SLACK {
            continue;
        }
        if !bands.contains(c.center.x, c.center.y, w, h) {
            continue;
        }
        let interior = ring_mean(gray, c.center, 0.0, 0.8 * c.radius);
        let surround = ring_mean(gray, c.center, 1.2 * c.radius, 1.6 * c.radius);
        let (Some(interior), Some(surround)) = (interior, surround) else {
            continue;
        };
        if contrast_ok(interior, surround, spec.density, options.contrast_margin) {
            debug!(x = c.center.x, y = c.center.y, radius = c.radius, interior, surround, "punch hole");
            out.push(DetectedHole::Circle {
                center: c.center,
                radius: c.radius,
            });
        }
    }
    Ok(out)
}

fn detect_rects(
    gray: &RasterBuffer,
    spec: &PunchSpec,
    (width, height): (f64, f64),
    bands: &EdgeBands,
    options: &PunchOptions,
    cancel: &CancelToken,
) -> DocResult<Vec<DetectedHole>> {
    let tol = 1.0 + spec.size_tolerance_fraction;
    let block = {
        let b = (3.0 * width.max(height)).ceil() as u32 | 1;
        b.max(3)
    };
    let adaptive = AdaptiveThresholdOptions::default().with_block_size(block);
    let mut sources = Vec::new();
    if spec.density != HoleDensity::Light {
        sources.push(gray.clone());
    }
    if spec.density != HoleDensity::Dark {
        let mut inverted = gray.clone();
        for v in inverted.data_mut() {
            *v = 255 - *v;
        }
        sources.push(inverted);
    }

    let (w, h) = (gray.width(), gray.height());
    let mut out: Vec<DetectedHole> = Vec::new();
    for src in &sources {
        let mask = adaptive_ink_mask(src, &adaptive, cancel)?;
        for contour in find_external_contours(&mask, cancel)? {
            let b = contour.bounds;
            let (bw, bh) = (b.w as f64, b.h as f64);
            let size_ok = bw >= width - SIZE_SLACK
                && bh >= height - SIZE_SLACK
                && bw <= width * tol + SIZE_SLACK
                && bh <= height * tol + SIZE_SLACK;
            if !size_ok {
                continue;
            }
            let fill = contour.pixel_area as f64 / b.area().max(1) as f64;
            if fill < options.min_fill_ratio {
                continue;
            }
            let center = b.center();
            if !bands.contains(center.x, center.y, w, h) {
                continue;
            }
            let shrink = (b.w.min(b.h) / 5).max(1);
            let inner = Rect::new_unchecked(b.x + shrink, b.y + shrink, b.w - 2 * shrink, b.h - 2 * shrink);
            let pad = (b.w.min(b.h) / 4).max(2);
            let interior = gray.mean_in_rect(&inner);
            let surround = frame_mean(gray, &b.inflate(pad / 2), &b.inflate(pad / 2 + pad));
            let (Some(interior), Some(surround)) = (interior, surround) else {
                continue;
            };
            if contrast_ok(interior, surround, spec.density, options.contrast_margin)
                && !out.iter().any(|d| matches!(d, DetectedHole::Rect(r) if r.intersect(&b).is_some()))
            {
                debug!(x = b.x, y = b.y, w = b.w, h = b.h, interior, surround, "rectangular punch hole");
                out.push(DetectedHole::Rect(b));
            }
        }
    }
    Ok(out)
}

/// Find the holes described by `options.specs`.
pub fn detect_punch_holes(
    src: &RasterBuffer,
    options: &PunchOptions,
    cancel: &CancelToken,
) -> DocResult<Vec<DetectedHole>> {
    options.validate()?;
    src.ensure_not_empty("punch hole input")?;
    let gray = src.to_gray();
    let (w, h) = (gray.width(), gray.height());
    let bands = options
        .bands
        .unwrap_or_else(|| EdgeBands::proportional(w, h, DEFAULT_BAND_FRACTION));

    let needs_edges = options
        .specs
        .iter()
        .any(|s| matches!(s.shape, PunchShape::Circle { .. }));
    let edge_data = if needs_edges {
        let edges = canny(&gray, options.canny_low, options.canny_high, cancel)?
            .and(&bands.mask(w, h)?)?;
        Some((edges, sobel(&gray)?))
    } else {
        None
    };

    let mut holes = Vec::new();
    for spec in &options.specs {
        cancel.check()?;
        match (spec.shape, &edge_data) {
            (PunchShape::Circle { diameter }, Some((edges, grads))) => {
                holes.extend(detect_circles(&gray, (edges, grads), spec, diameter, &bands, options, cancel)?);
            }
            (PunchShape::Rect { width, height }, _) => {
                holes.extend(detect_rects(&gray, spec, (width, height), &bands, options, cancel)?);
            }
            _ => {}
        }
    }
    Ok(holes)
}

// ============================================================================
// Repair
// ============================================================================

/// Mask covering every hole, grown by one pixel and feathered.
pub fn hole_mask(width: u32, height: u32, holes: &[DetectedHole], feather_sigma: f32) -> DocResult<BinaryMask> {
    let mut canvas = RasterBuffer::new(width, height, PixelLayout::Gray)?;
    for hole in holes {
        match *hole {
            DetectedHole::Circle { center, radius } => {
                canvas.fill_circle(center.x, center.y, radius + 1.0, &[255]);
            }
            DetectedHole::Rect(r) => canvas.fill_rect(&r.inflate(1), &[255]),
        }
    }
    if feather_sigma > 0.0 {
        let blurred = gaussian_blur_plane(&FloatPlane::from_gray(&canvas), feather_sigma, &CancelToken::none())?;
        canvas = blurred.to_gray_clamped()?;
    }
    Ok(BinaryMask::from_predicate(&canvas, |v| v >= 32)?)
}

/// Result of [`remove_punch_holes`]
#[derive(Debug, Clone, PartialEq)]
pub struct PunchOutcome {
    pub image: RasterBuffer,
    pub holes: Vec<DetectedHole>,
}

/// Detect and inpaint punch holes. Returns the source unchanged when
/// nothing is found.
pub fn remove_punch_holes(
    src: &RasterBuffer,
    options: &PunchOptions,
    cancel: &CancelToken,
) -> DocResult<PunchOutcome> {
    let holes = detect_punch_holes(src, options, cancel)?;
    debug!(count = holes.len(), "punch holes accepted");
    if holes.is_empty() {
        return Ok(PunchOutcome {
            image: src.clone(),
            holes,
        });
    }
    let mask = hole_mask(src.width(), src.height(), &holes, options.feather_sigma)?;
    let mean_radius = holes.iter().map(DetectedHole::radius).sum::<f64>() / holes.len() as f64;
    let radius = (mean_radius / 2.0).round().clamp(3.0, 15.0) as u32;
    let image = inpaint(src, &mask, radius, cancel)?;
    Ok(PunchOutcome { image, holes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::ErrorKind;

    fn page() -> RasterBuffer {
        RasterBuffer::new_filled(200, 200, PixelLayout::Gray, 230).unwrap()
    }

    #[test]
    fn test_circle_in_band() {
        let mut p = page();
        p.fill_circle(20.0, 100.0, 8.0, &[20]);
        let opts = PunchOptions::new(vec![PunchSpec::circle(16.0)]);
        let holes = detect_punch_holes(&p, &opts, &CancelToken::none()).unwrap();
        assert_eq!(holes.len(), 1);
    }

    #[test]
    fn test_circle_outside_band_is_ignored() {
        let mut p = page();
        p.fill_circle(100.0, 100.0, 8.0, &[20]);
        let opts = PunchOptions::new(vec![PunchSpec::circle(16.0)]);
        assert!(detect_punch_holes(&p, &opts, &CancelToken::none()).unwrap().is_empty());
    }

    #[test]
    fn test_density_direction() {
        let mut p = page();
        p.fill_circle(20.0, 100.0, 8.0, &[20]);
        let light = PunchOptions::new(vec![PunchSpec::circle(16.0).with_density(HoleDensity::Light)]);
        assert!(detect_punch_holes(&p, &light, &CancelToken::none()).unwrap().is_empty());
        let dark = PunchOptions::new(vec![PunchSpec::circle(16.0).with_density(HoleDensity::Dark)]);
        assert_eq!(detect_punch_holes(&p, &dark, &CancelToken::none()).unwrap().len(), 1);
    }

    #[test]
    fn test_rect_hole() {
        let mut p = page();
        p.fill_rect(&Rect::new_unchecked(90, 8, 24, 10), &[15]);
        let opts = PunchOptions::new(vec![PunchSpec::rect(24.0, 10.0)]);
        let out = remove_punch_holes(&p, &opts, &CancelToken::none()).unwrap();
        assert_eq!(out.holes, vec![DetectedHole::Rect(Rect::new_unchecked(90, 8, 24, 10))]);
        assert!(out.image.get_unchecked(100, 12) > 200);
    }

    #[test]
    fn test_nothing_found_returns_source() {
        let p = page();
        let opts = PunchOptions::new(vec![PunchSpec::circle(16.0), PunchSpec::rect(10.0, 10.0)]);
        let out = remove_punch_holes(&p, &opts, &CancelToken::none()).unwrap();
        assert_eq!(out.image, p);
        assert!(out.holes.is_empty());
    }

    #[test]
    fn test_density_names() {
        assert_eq!("Dark".parse::<HoleDensity>().unwrap(), HoleDensity::Dark);
        assert_eq!("Grey".parse::<HoleDensity>().unwrap_err().kind(), ErrorKind::UnsupportedConfiguration);
    }

    #[test]
    fn test_invalid_spec() {
        let opts = PunchOptions::new(vec![PunchSpec::circle(1.0)]);
        assert!(detect_punch_holes(&page(), &opts, &CancelToken::none()).is_err());
    }
}
