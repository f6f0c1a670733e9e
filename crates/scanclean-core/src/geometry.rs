//! Rect, Point, RotatedRect - plain geometry values
//!
//! All coordinates are in pixels with the origin at the top-left corner
//! and y growing downwards.

use crate::error::{Error, Result};

/// An axis-aligned rectangle.
///
/// Small and `Copy`; `right()`/`bottom()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left x coordinate
    pub x: i32,
    /// Top y coordinate
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Rect {
    /// Create a new rectangle
    ///
    /// # Errors
    ///
    /// Returns an error if width or height is negative.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Result<Self> {
        if w < 0 || h < 0 {
            return Err(Error::InvalidParameter(format!(
                "rect dimensions must be non-negative: w={w}, h={h}"
            )));
        }
        Ok(Self { x, y, w, h })
    }

    /// Create a rectangle without validation
    pub const fn new_unchecked(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning the inclusive corner coordinates.
    pub fn from_inclusive(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let (l, r) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (t, b) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        Self::new_unchecked(l, t, r - l + 1, b - t + 1)
    }

    /// Right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Center in floating point.
    pub fn center(&self) -> PointF {
        PointF::new(
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Intersection with another rectangle, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(Rect::new_unchecked(x0, y0, x1 - x0, y1 - y0))
        }
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::new_unchecked(x0, y0, x1 - x0, y1 - y0)
    }

    /// Grow (or shrink, for negative `by`) on every side.
    pub fn inflate(&self, by: i32) -> Rect {
        Rect::new_unchecked(
            self.x - by,
            self.y - by,
            (self.w + 2 * by).max(0),
            (self.h + 2 * by).max(0),
        )
    }

    /// Clip to an image of the given size.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Rect> {
        self.intersect(&Rect::new_unchecked(0, 0, width as i32, height as i32))
    }
}

/// Integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_f64(self) -> PointF {
        PointF::new(self.x as f64, self.y as f64)
    }
}

/// Sub-pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PointF) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A rectangle rotated about its center.
///
/// `angle` is the direction of the `width` side in degrees, measured in
/// image coordinates (y down), normalized to (-90, 90].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotatedRect {
    pub center: PointF,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl RotatedRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Direction of the longer side, in degrees normalized to (-90, 90].
    pub fn long_side_angle(&self) -> f64 {
        if self.width >= self.height {
            normalize_angle_deg(self.angle)
        } else {
            normalize_angle_deg(self.angle + 90.0)
        }
    }
}

/// Normalize a line direction in degrees to (-90, 90].
///
/// Lines are undirected, so angles differing by 180 degrees are equal.
pub fn normalize_angle_deg(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let mut a = angle % 180.0;
    if a <= -90.0 {
        a += 180.0;
    } else if a > 90.0 {
        a -= 180.0;
    }
    a
}

/// Fold a normalized angle onto the nearest axis, giving (-45, 45].
pub fn fold_to_axis_deg(angle: f64) -> f64 {
    let a = normalize_angle_deg(angle);
    if a > 45.0 {
        a - 90.0
    } else if a <= -45.0 {
        a + 90.0
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new_unchecked(0, 0, 10, 10);
        let b = Rect::new_unchecked(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), Some(Rect::new_unchecked(5, 5, 5, 5)));
        let c = Rect::new_unchecked(20, 20, 2, 2);
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_rect_from_inclusive() {
        let r = Rect::from_inclusive(7, 3, 2, 5);
        assert_eq!(r, Rect::new_unchecked(2, 3, 6, 3));
    }

    #[test]
    fn test_rect_new_rejects_negative() {
        assert!(Rect::new(0, 0, -1, 3).is_err());
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle_deg(90.0) - 90.0).abs() < 1e-9);
        assert!((normalize_angle_deg(-90.0) - 90.0).abs() < 1e-9);
        assert!((normalize_angle_deg(135.0) + 45.0).abs() < 1e-9);
        assert!((normalize_angle_deg(-179.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fold_to_axis() {
        assert!((fold_to_axis_deg(88.0) + 2.0).abs() < 1e-9);
        assert!((fold_to_axis_deg(-87.0) - 3.0).abs() < 1e-9);
        assert!((fold_to_axis_deg(3.0) - 3.0).abs() < 1e-9);
    }
}
