//! Circles from an edge map (gradient Hough transform)
//!
//! Every edge pixel votes along its gradient, in both directions, for a
//! center at each radius of the search range. Accumulator peaks become
//! candidate centers; each candidate's radius is then read off the
//! distance histogram of the surrounding edge pixels and accepted only
//! when enough of the circumference is present.

use crate::{DocError, DocResult};
use scanclean_core::{BinaryMask, CancelToken, PointF};
use scanclean_filter::Gradients;
use std::f64::consts::PI;

/// Distance from a candidate radius within which an edge pixel counts.
const RING_HALF_WIDTH: f64 = 1.0;

/// A detected circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: PointF,
    pub radius: f64,
    /// Fraction of the circumference backed by edge pixels
    pub support: f64,
}

/// Options for [`hough_circles`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughCircleOptions {
    /// Smallest radius searched
    pub min_radius: f64,
    /// Largest radius searched
    pub max_radius: f64,
    /// Peak votes required, as a fraction of `2 * pi * min_radius`
    /// (default: 0.35)
    pub vote_fraction: f64,
    /// Circumference fraction a radius needs (default: 0.5)
    pub min_support: f64,
    /// Closest allowed distance between centers; `None` uses
    /// `min_radius` (default: None)
    pub min_center_distance: Option<f64>,
    /// Candidate peaks examined, strongest first (default: 32)
    pub max_candidates: usize,
}

impl HoughCircleOptions {
    pub fn new(min_radius: f64, max_radius: f64) -> Self {
        Self {
            min_radius,
            max_radius,
            vote_fraction: 0.35,
            min_support: 0.5,
            min_center_distance: None,
            max_candidates: 32,
        }
    }

    pub fn with_min_support(mut self, support: f64) -> Self {
        self.min_support = support;
        self
    }

    pub fn with_vote_fraction(mut self, fraction: f64) -> Self {
        self.vote_fraction = fraction;
        self
    }

    pub fn validate(&self) -> DocResult<()> {
        if !(self.min_radius >= 1.0 && self.max_radius >= self.min_radius && self.max_radius.is_finite()) {
            return Err(DocError::InvalidParameters(format!(
                "circle radius range [{}, {}] is invalid",
                self.min_radius, self.max_radius
            )));
        }
        if !(0.0..=1.0).contains(&self.min_support) || !(self.vote_fraction >= 0.0) {
            return Err(DocError::InvalidParameters(format!(
                "support {} and vote fraction {} must be fractions",
                self.min_support, self.vote_fraction
            )));
        }
        Ok(())
    }
}

/// Radius best supported by `points` around `center`, searched over
/// `[lo, hi]` in half-pixel steps. Returns (mean radius, support).
fn fit_radius(points: &[(f64, f64)], center: PointF, lo: f64, hi: f64) -> Option<(f64, f64)> {
    let dists: Vec<f64> = points
        .iter()
        .map(|&(x, y)| (x - center.x).hypot(y - center.y))
        .filter(|&d| d >= lo - RING_HALF_WIDTH && d <= hi + RING_HALF_WIDTH)
        .collect();
    let mut best: Option<(f64, usize)> = None;
    let mut r = lo;
    while r <= hi + 1e-9 {
        let n = dists.iter().filter(|&&d| (d - r).abs() <= RING_HALF_WIDTH).count();
        if best.is_none_or(|(_, bn)| n > bn) {
            best = Some((r, n));
        }
        r += 0.5;
    }
    let (r, _) = best?;
    let ring: Vec<f64> = dists
        .into_iter()
        .filter(|d| (d - r).abs() <= RING_HALF_WIDTH)
        .collect();
    if ring.is_empty() {
        return None;
    }
    let mean = ring.iter().sum::<f64>() / ring.len() as f64;
    // a one-pixel-wide edge ring at radius r holds about 2*pi*r pixels
    let support = (ring.len() as f64 / (2.0 * PI * mean)).min(1.0);
    Some((mean, support))
}

/// Detect circles among the foreground pixels of `edges`.
///
/// `gradients` must cover the same image. Circles are returned strongest
/// first. Polls `cancel` per edge row while voting and per candidate.
pub fn hough_circles(
    edges: &BinaryMask,
    gradients: &Gradients,
    options: &HoughCircleOptions,
    cancel: &CancelToken,
) -> DocResult<Vec<Circle>> {
    options.validate()?;
    let (w, h) = (edges.width(), edges.height());
    if gradients.width != w || gradients.height != h {
        return Err(DocError::InvalidParameters(format!(
            "gradient field {}x{} does not match edge map {w}x{h}",
            gradients.width, gradients.height
        )));
    }

    let (wi, hi) = (w as i64, h as i64);
    let mut acc = vec![0u32; w as usize * h as usize];
    let mut points = Vec::new();
    let r_lo = options.min_radius.floor() as i64;
    let r_hi = options.max_radius.ceil() as i64;
    for y in 0..h {
        cancel.check()?;
        for (x, &v) in edges.row(y).iter().enumerate() {
            if v == 0 {
                continue;
            }
            let x = x as u32;
            points.push((x as f64, y as f64));
            let i = gradients.index(x, y);
            let (gx, gy) = (gradients.gx[i] as f64, gradients.gy[i] as f64);
            let norm = gx.hypot(gy);
            if norm == 0.0 {
                continue;
            }
            let (ux, uy) = (gx / norm, gy / norm);
            for r in r_lo..=r_hi {
                for sign in [-1.0, 1.0] {
                    let cx = (x as f64 + sign * r as f64 * ux).round() as i64;
                    let cy = (y as f64 + sign * r as f64 * uy).round() as i64;
                    if cx >= 0 && cy >= 0 && cx < wi && cy < hi {
                        acc[(cy * wi + cx) as usize] += 1;
                    }
                }
            }
        }
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }

    // 3x3 box sum of the accumulator absorbs gradient direction noise
    let score = |cx: i64, cy: i64| -> u32 {
        let mut s = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y) = (cx + dx, cy + dy);
                if x >= 0 && y >= 0 && x < wi && y < hi {
                    s += acc[(y * wi + x) as usize];
                }
            }
        }
        s
    };
    let min_votes = (options.vote_fraction * 2.0 * PI * options.min_radius).max(1.0) as u32;
    let mut peaks: Vec<(u32, i64, i64)> = Vec::new();
    for cy in 0..hi {
        for cx in 0..wi {
            if acc[(cy * wi + cx) as usize] == 0 {
                continue;
            }
            let s = score(cx, cy);
            if s >= min_votes {
                peaks.push((s, cx, cy));
            }
        }
    }
    peaks.sort_by(|a, b| b.0.cmp(&a.0).then(a.2.cmp(&b.2)).then(a.1.cmp(&b.1)));

    let min_dist = options.min_center_distance.unwrap_or(options.min_radius);
    let mut circles: Vec<Circle> = Vec::new();
    let mut examined = 0usize;
    for &(_, cx, cy) in &peaks {
        if examined >= options.max_candidates {
            break;
        }
        let rough = PointF::new(cx as f64, cy as f64);
        if circles.iter().any(|c| c.center.distance(&rough) < min_dist) {
            continue;
        }
        cancel.check()?;
        examined += 1;

        // vote-weighted centroid of the peak neighborhood
        let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y) = (cx + dx, cy + dy);
                if x >= 0 && y >= 0 && x < wi && y < hi {
                    let v = acc[(y * wi + x) as usize] as f64;
                    sx += v * x as f64;
                    sy += v * y as f64;
                    sw += v;
                }
            }
        }
        let center = if sw > 0.0 { PointF::new(sx / sw, sy / sw) } else { rough };
        let Some((radius, support)) =
            fit_radius(&points, center, options.min_radius, options.max_radius)
        else {
            continue;
        };
        if support >= options.min_support {
            circles.push(Circle {
                center,
                radius,
                support,
            });
        }
    }
    Ok(circles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::{PixelLayout, RasterBuffer};
    use scanclean_filter::{canny, sobel};

    fn detect(radius: f64, lo: f64, hi: f64) -> Vec<Circle> {
        let mut page = RasterBuffer::new_filled(120, 120, PixelLayout::Gray, 230).unwrap();
        page.fill_circle(60.0, 60.0, radius, &[20]);
        let edges = canny(&page, 50.0, 150.0, &CancelToken::none()).unwrap();
        let grads = sobel(&page).unwrap();
        hough_circles(&edges, &grads, &HoughCircleOptions::new(lo, hi), &CancelToken::none()).unwrap()
    }

    #[test]
    fn test_finds_disc() {
        let found = detect(15.0, 14.0, 18.0);
        assert_eq!(found.len(), 1);
        let c = found[0];
        assert!(c.center.distance(&PointF::new(60.0, 60.0)) < 1.5);
        assert!((c.radius - 15.0).abs() < 1.5);
    }

    #[test]
    fn test_smaller_disc_is_not_found() {
        assert!(detect(10.0, 14.0, 18.0).is_empty());
    }

    #[test]
    fn test_blank_edges() {
        let page = RasterBuffer::new_filled(40, 40, PixelLayout::Gray, 200).unwrap();
        let edges = BinaryMask::new(40, 40).unwrap();
        let grads = sobel(&page).unwrap();
        let found =
            hough_circles(&edges, &grads, &HoughCircleOptions::new(5.0, 8.0), &CancelToken::none()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert!(HoughCircleOptions::new(10.0, 5.0).validate().is_err());
    }
}
