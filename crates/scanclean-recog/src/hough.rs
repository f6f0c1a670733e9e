//! Straight line segments from an edge map
//!
//! A standard (rho, theta) Hough accumulator proposes candidate lines;
//! each candidate is then checked against the edge pixels still unclaimed,
//! split wherever the gap along the line exceeds `max_line_gap`, and every
//! run long enough becomes a segment fitted by least squares. Pixels that
//! end up in a segment are not reused by weaker candidates.

use crate::{RecogError, RecogResult};
use scanclean_core::{BinaryMask, CancelToken, PointF, normalize_angle_deg};

/// A detected line segment in image coordinates (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: PointF,
    pub end: PointF,
    /// Edge pixels supporting the segment
    pub support: usize,
}

impl LineSegment {
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Direction in degrees, normalized to (-90, 90].
    pub fn angle_deg(&self) -> f64 {
        normalize_angle_deg((self.end.y - self.start.y).atan2(self.end.x - self.start.x).to_degrees())
    }
}

/// Options for [`hough_line_segments`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughLineOptions {
    /// Angular resolution: number of theta bins over 180 degrees (default: 360)
    pub theta_bins: u32,
    /// Minimum accumulator votes for a candidate line (default: 30)
    pub vote_threshold: u32,
    /// Shortest segment reported, in pixels (default: 30.0)
    pub min_line_length: f64,
    /// Largest gap bridged along a line, in pixels (default: 10.0)
    pub max_line_gap: f64,
    /// Distance from a candidate line within which pixels count (default: 1.5)
    pub band: f64,
    /// Candidate lines examined, strongest first (default: 64)
    pub max_candidates: usize,
}

impl Default for HoughLineOptions {
    fn default() -> Self {
        Self {
            theta_bins: 360,
            vote_threshold: 30,
            min_line_length: 30.0,
            max_line_gap: 10.0,
            band: 1.5,
            max_candidates: 64,
        }
    }
}

impl HoughLineOptions {
    pub fn with_vote_threshold(mut self, votes: u32) -> Self {
        self.vote_threshold = votes;
        self
    }

    pub fn with_min_line_length(mut self, length: f64) -> Self {
        self.min_line_length = length;
        self
    }

    pub fn with_max_line_gap(mut self, gap: f64) -> Self {
        self.max_line_gap = gap;
        self
    }

    pub fn validate(&self) -> RecogResult<()> {
        if self.theta_bins < 4 {
            return Err(RecogError::InvalidParameter(format!(
                "theta_bins must be at least 4, got {}",
                self.theta_bins
            )));
        }
        if !(self.min_line_length > 0.0) || !(self.max_line_gap >= 0.0) || !(self.band > 0.0) {
            return Err(RecogError::InvalidParameter(format!(
                "line length {}, gap {} and band {} must be positive",
                self.min_line_length, self.max_line_gap, self.band
            )));
        }
        Ok(())
    }
}

/// Least-squares fit of a run of points; endpoints are the extreme
/// projections onto the fitted direction.
fn fit_segment(points: &[(i32, i32)]) -> LineSegment {
    let n = points.len() as f64;
    let (mx, my) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
    let (mx, my) = (mx / n, my / n);
    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);
    for &(x, y) in points {
        let (dx, dy) = (x as f64 - mx, y as f64 - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let (uy, ux) = theta.sin_cos();
    let (mut tmin, mut tmax) = (f64::MAX, f64::MIN);
    for &(x, y) in points {
        let t = (x as f64 - mx) * ux + (y as f64 - my) * uy;
        tmin = tmin.min(t);
        tmax = tmax.max(t);
    }
    LineSegment {
        start: PointF::new(mx + tmin * ux, my + tmin * uy),
        end: PointF::new(mx + tmax * ux, my + tmax * uy),
        support: points.len(),
    }
}

/// Detect line segments in an edge mask.
///
/// Segments are returned longest first. Polls `cancel` while voting and
/// once per candidate line.
pub fn hough_line_segments(
    edges: &BinaryMask,
    options: &HoughLineOptions,
    cancel: &CancelToken,
) -> RecogResult<Vec<LineSegment>> {
    options.validate()?;
    let points: Vec<(i32, i32)> = edges.points().map(|(x, y)| (x as i32, y as i32)).collect();
    if points.len() < 2 {
        return Ok(Vec::new());
    }

    let n_theta = options.theta_bins as usize;
    let trig: Vec<(f64, f64)> = (0..n_theta)
        .map(|t| (t as f64 * std::f64::consts::PI / n_theta as f64).sin_cos())
        .collect();
    let diag = (edges.width() as f64).hypot(edges.height() as f64).ceil() as i64;
    let n_rho = (2 * diag + 1) as usize;

    let mut acc = vec![0u32; n_theta * n_rho];
    for (i, &(x, y)) in points.iter().enumerate() {
        if i % 4096 == 0 {
            cancel.check()?;
        }
        for (t, &(s, c)) in trig.iter().enumerate() {
            let r = (x as f64 * c + y as f64 * s).round() as i64 + diag;
            acc[t * n_rho + r as usize] += 1;
        }
    }

    let mut peaks: Vec<(u32, usize, usize)> = Vec::new();
    for t in 0..n_theta {
        for r in 0..n_rho {
            let v = acc[t * n_rho + r];
            if v < options.vote_threshold {
                continue;
            }
            let mut is_peak = true;
            'nb: for dt in -1i64..=1 {
                for dr in -1i64..=1 {
                    if dt == 0 && dr == 0 {
                        continue;
                    }
                    let (nt, nr) = (t as i64 + dt, r as i64 + dr);
                    if nt < 0 || nr < 0 || nt >= n_theta as i64 || nr >= n_rho as i64 {
                        continue;
                    }
                    let nv = acc[nt as usize * n_rho + nr as usize];
                    // ties go to the earlier bin
                    if nv > v || (nv == v && (dt, dr) < (0, 0)) {
                        is_peak = false;
                        break 'nb;
                    }
                }
            }
            if is_peak {
                peaks.push((v, t, r));
            }
        }
    }
    peaks.sort_by(|a, b| b.0.cmp(&a.0));
    peaks.truncate(options.max_candidates);

    let mut used = vec![false; points.len()];
    let mut segments = Vec::new();
    let mut run: Vec<(f64, usize)> = Vec::new();
    for &(_, t, r) in &peaks {
        cancel.check()?;
        let (s, c) = trig[t];
        let rho = r as f64 - diag as f64;
        run.clear();
        for (i, &(x, y)) in points.iter().enumerate() {
            if used[i] || (x as f64 * c + y as f64 * s - rho).abs() > options.band {
                continue;
            }
            run.push((-(x as f64) * s + y as f64 * c, i));
        }
        if run.len() < 2 {
            continue;
        }
        run.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut begin = 0usize;
        for k in 1..=run.len() {
            let split = k == run.len() || run[k].0 - run[k - 1].0 > options.max_line_gap;
            if !split {
                continue;
            }
            let piece = &run[begin..k];
            if piece.len() >= 2 && piece[piece.len() - 1].0 - piece[0].0 >= options.min_line_length {
                let pts: Vec<(i32, i32)> = piece.iter().map(|&(_, i)| points[i]).collect();
                for &(_, i) in piece {
                    used[i] = true;
                }
                segments.push(fit_segment(&pts));
            }
            begin = k;
        }
    }
    segments.sort_by(|a, b| b.length().total_cmp(&a.length()));
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_mask(w: u32, h: u32, pts: impl Iterator<Item = (i32, i32)>) -> BinaryMask {
        let mut m = BinaryMask::new(w, h).unwrap();
        for (x, y) in pts {
            m.set(x, y, true);
        }
        m
    }

    #[test]
    fn test_horizontal_segment() {
        let m = line_mask(200, 100, (20..180).map(|x| (x, 40)));
        let segs = hough_line_segments(&m, &HoughLineOptions::default(), &CancelToken::none()).unwrap();
        assert_eq!(segs.len(), 1);
        assert!(segs[0].angle_deg().abs() < 1e-6);
        assert!((segs[0].length() - 159.0).abs() < 1e-6);
    }

    #[test]
    fn test_tilted_segment_angle() {
        // rises to the right: negative angle in y-down coordinates
        let slope = -(5f64.to_radians().tan());
        let m = line_mask(300, 200, (10..290).map(|x| (x, (120.0 + slope * x as f64).round() as i32)));
        let segs = hough_line_segments(&m, &HoughLineOptions::default(), &CancelToken::none()).unwrap();
        assert!(!segs.is_empty());
        assert!((segs[0].angle_deg() + 5.0).abs() < 0.2, "{}", segs[0].angle_deg());
    }

    #[test]
    fn test_gap_splits_segment() {
        let pts = (10..80).chain(120..190).map(|x| (x, 50));
        let m = line_mask(200, 100, pts);
        let opts = HoughLineOptions::default().with_max_line_gap(5.0);
        let segs = hough_line_segments(&m, &opts, &CancelToken::none()).unwrap();
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn test_empty_mask() {
        let m = BinaryMask::new(20, 20).unwrap();
        assert!(hough_line_segments(&m, &HoughLineOptions::default(), &CancelToken::none())
            .unwrap()
            .is_empty());
    }
}
