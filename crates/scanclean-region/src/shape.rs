//! Polygon helpers for contours
//!
//! Convex hull (monotone chain), minimum-area enclosing rectangle
//! (one candidate per hull edge), Douglas-Peucker simplification of closed
//! curves, shoelace area and perimeter.

use scanclean_core::{PointF, RotatedRect, normalize_angle_deg};

fn cross(o: PointF, a: PointF, b: PointF) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull; collinear points are dropped.
pub fn convex_hull(points: &[PointF]) -> Vec<PointF> {
    let mut pts: Vec<PointF> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }
    let mut hull = half_hull(pts.iter());
    hull.extend(half_hull(pts.iter().rev()));
    hull
}

/// One monotone chain; the last point is left for the other chain.
fn half_hull<'a>(points: impl Iterator<Item = &'a PointF>) -> Vec<PointF> {
    let mut chain: Vec<PointF> = Vec::new();
    for &p in points {
        while chain.len() >= 2 && cross(chain[chain.len() - 2], chain[chain.len() - 1], p) <= 0.0 {
            chain.pop();
        }
        chain.push(p);
    }
    chain.pop();
    chain
}

/// Smallest-area rotated rectangle around `points`.
///
/// `width` runs along the chosen hull edge and `angle` is that edge's
/// direction in degrees, normalized to (-90, 90].
pub fn min_area_rect(points: &[PointF]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle: 0.0,
            });
        }
        _ => {}
    }
    let mut best: Option<(f64, RotatedRect)> = None;
    for i in 0..hull.len() {
        let (a, b) = (hull[i], hull[(i + 1) % hull.len()]);
        let len = a.distance(&b);
        if len <= f64::EPSILON {
            continue;
        }
        let (ux, uy) = ((b.x - a.x) / len, (b.y - a.y) / len);
        let (mut min_u, mut max_u, mut min_v, mut max_v) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for p in &hull {
            let (dx, dy) = (p.x - a.x, p.y - a.y);
            let u = dx * ux + dy * uy;
            let v = -dx * uy + dy * ux;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
        let (width, height) = (max_u - min_u, max_v - min_v);
        let area = width * height;
        if best.as_ref().is_some_and(|(a, _)| *a <= area) {
            continue;
        }
        let (cu, cv) = ((min_u + max_u) / 2.0, (min_v + max_v) / 2.0);
        let center = PointF::new(a.x + cu * ux - cv * uy, a.y + cu * uy + cv * ux);
        let angle = normalize_angle_deg(uy.atan2(ux).to_degrees());
        best = Some((
            area,
            RotatedRect {
                center,
                width,
                height,
                angle,
            },
        ));
    }
    best.map(|(_, r)| r)
}

/// Absolute shoelace area of a closed polygon.
pub fn polygon_area(points: &[PointF]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..points.len() {
        let (p, q) = (points[i], points[(i + 1) % points.len()]);
        acc += p.x * q.y - q.x * p.y;
    }
    acc.abs() / 2.0
}

/// Perimeter of a closed polygon.
pub fn arc_length(points: &[PointF]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    (0..points.len())
        .map(|i| points[i].distance(&points[(i + 1) % points.len()]))
        .sum()
}

fn segment_distance(p: PointF, a: PointF, b: PointF) -> f64 {
    let len = a.distance(&b);
    if len <= f64::EPSILON {
        return p.distance(&a);
    }
    cross(a, b, p).abs() / len
}

fn simplify_open(points: &[PointF], epsilon: f64, out: &mut Vec<PointF>) {
    // iterative to keep deep recursion off long borders
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((s, e)) = stack.pop() {
        if e <= s + 1 {
            continue;
        }
        let (mut idx, mut dmax) = (s, 0.0);
        for i in s + 1..e {
            let d = segment_distance(points[i], points[s], points[e]);
            if d > dmax {
                dmax = d;
                idx = i;
            }
        }
        if dmax > epsilon {
            keep[idx] = true;
            stack.push((s, idx));
            stack.push((idx, e));
        }
    }
    out.extend(points.iter().zip(&keep).filter(|(_, k)| **k).map(|(p, _)| *p));
}

/// Douglas-Peucker simplification of a closed curve.
///
/// The curve is split at its first point and the point farthest from it;
/// each half is simplified with tolerance `epsilon`.
pub fn approx_poly_closed(points: &[PointF], epsilon: f64) -> Vec<PointF> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let far = (1..points.len())
        .max_by(|&i, &j| points[0].distance(&points[i]).total_cmp(&points[0].distance(&points[j])))
        .unwrap_or(1);
    let mut first = Vec::new();
    simplify_open(&points[..=far], epsilon, &mut first);
    let mut second_half: Vec<PointF> = points[far..].to_vec();
    second_half.push(points[0]);
    let mut second = Vec::new();
    simplify_open(&second_half, epsilon, &mut second);
    // drop the shared endpoints of the second half
    first.extend(&second[1..second.len() - 1]);
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> PointF {
        PointF::new(x, y)
    }

    #[test]
    fn test_hull_square_with_interior() {
        let pts = [p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0), p(2.0, 2.0), p(2.0, 0.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!((polygon_area(&hull) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_area_rect_rotated() {
        let (c, s) = (30f64.to_radians().cos(), 30f64.to_radians().sin());
        let corners: Vec<PointF> = [(0.0, 0.0), (10.0, 0.0), (10.0, 4.0), (0.0, 4.0)]
            .iter()
            .map(|&(x, y)| p(50.0 + x * c - y * s, 50.0 + x * s + y * c))
            .collect();
        let r = min_area_rect(&corners).unwrap();
        assert!((r.area() - 40.0).abs() < 1e-6);
        assert!((r.long_side_angle() - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_approx_rectangle_outline() {
        let mut pts = Vec::new();
        for x in 0..10 {
            pts.push(p(x as f64, 0.0));
        }
        for y in 0..6 {
            pts.push(p(10.0, y as f64));
        }
        for x in (1..=10).rev() {
            pts.push(p(x as f64, 6.0));
        }
        for y in (1..=6).rev() {
            pts.push(p(0.0, y as f64));
        }
        let poly = approx_poly_closed(&pts, 0.5);
        assert_eq!(poly.len(), 4);
        assert!((polygon_area(&poly) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_arc_length() {
        let sq = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert!((arc_length(&sq) - 4.0).abs() < 1e-12);
    }
}
