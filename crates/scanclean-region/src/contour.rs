//! External contour tracing
//!
//! Moore-neighbor tracing around each 8-connected component, starting at
//! its topmost-leftmost pixel and walking clockwise (in y-down image
//! coordinates). Only outer borders are traced; holes are ignored.

use crate::conncomp::{ConnectivityType, label_components};
use crate::shape::polygon_area;
use crate::RegionResult;
use scanclean_core::{BinaryMask, CancelToken, Point, PointF, Rect};

/// Clockwise neighbor offsets starting east.
const DIRS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

fn dir_of(dx: i32, dy: i32) -> usize {
    DIRS.iter()
        .position(|&d| d == (dx, dy))
        .unwrap_or(4)
}

/// Closed outer border of one component.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Border pixels in clockwise order, without repeating the first
    pub points: Vec<Point>,
    /// Bounding box of the component
    pub bounds: Rect,
    /// Pixel count of the component
    pub pixel_area: u32,
}

impl Contour {
    /// Shoelace area of the border polygon through pixel centers.
    pub fn area(&self) -> f64 {
        polygon_area(&self.points_f64())
    }

    pub fn points_f64(&self) -> Vec<PointF> {
        self.points.iter().map(|p| p.to_f64()).collect()
    }
}

/// Trace the border that starts at `start`, the topmost-leftmost pixel
/// of its component.
fn trace(mask: &BinaryMask, start: Point, limit: usize) -> Vec<Point> {
    let mut points = vec![start];
    let mut cur = start;
    // backtrack neighbor, as a direction from `cur`
    let mut back = 4usize;
    let start_back = back;
    for _ in 0..limit {
        let mut next = None;
        for k in 1..=8 {
            let d = (back + k) % 8;
            let (nx, ny) = (cur.x + DIRS[d].0, cur.y + DIRS[d].1);
            if mask.get(nx, ny) {
                let prev = (back + k - 1) % 8;
                let (bx, by) = (cur.x + DIRS[prev].0, cur.y + DIRS[prev].1);
                next = Some((Point::new(nx, ny), dir_of(bx - nx, by - ny)));
                break;
            }
        }
        let Some((p, b)) = next else {
            // isolated pixel
            break;
        };
        if p == start && b == start_back {
            break;
        }
        // leaving the start along the first step again
        if cur == start && points.len() > 1 && p == points[1] {
            break;
        }
        cur = p;
        back = b;
        if cur != start {
            points.push(cur);
        }
    }
    points
}

/// Outer contours of all 8-connected components, in label order.
pub fn find_external_contours(mask: &BinaryMask, cancel: &CancelToken) -> RegionResult<Vec<Contour>> {
    let labeling = label_components(mask, ConnectivityType::EightWay, cancel)?;
    let mut contours = Vec::with_capacity(labeling.components().len());
    for rec in labeling.components() {
        cancel.check()?;
        let b = rec.bounds;
        let Some(start) = (b.x..b.right())
            .find(|&x| labeling.label_at(x as u32, b.y as u32) == rec.label)
            .map(|x| Point::new(x, b.y))
        else {
            continue;
        };
        let limit = 4 * rec.area as usize + 8;
        contours.push(Contour {
            points: trace(mask, start, limit),
            bounds: b,
            pixel_area: rec.area,
        });
    }
    Ok(contours)
}

/// Contour with the largest polygon area, if any.
pub fn largest_external_contour(mask: &BinaryMask, cancel: &CancelToken) -> RegionResult<Option<Contour>> {
    Ok(find_external_contours(mask, cancel)?
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area())))
}
