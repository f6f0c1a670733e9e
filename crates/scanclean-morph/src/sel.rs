//! Structuring element (SEL) for morphological operations
//!
//! A structuring element is a small grid of hits with an origin. Rectangular
//! all-hit elements ("bricks") take a separable fast path in [`crate::binary`].

use crate::{MorphError, MorphResult};

/// Structuring element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sel {
    width: u32,
    height: u32,
    cx: u32,
    cy: u32,
    hits: Vec<bool>,
}

impl Sel {
    fn check_size(width: u32, height: u32) -> MorphResult<()> {
        if width == 0 || height == 0 {
            return Err(MorphError::InvalidSel(format!(
                "dimensions must be positive: {width}x{height}"
            )));
        }
        Ok(())
    }

    /// Rectangular all-hit element with a centered origin.
    pub fn brick(width: u32, height: u32) -> MorphResult<Self> {
        Self::check_size(width, height)?;
        Ok(Self {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            hits: vec![true; (width * height) as usize],
        })
    }

    /// Square all-hit element.
    pub fn square(size: u32) -> MorphResult<Self> {
        Self::brick(size, size)
    }

    /// Horizontal line of `length` hits.
    pub fn horizontal(length: u32) -> MorphResult<Self> {
        Self::brick(length, 1)
    }

    /// Vertical line of `length` hits.
    pub fn vertical(length: u32) -> MorphResult<Self> {
        Self::brick(1, length)
    }

    /// Filled ellipse inscribed in a `width` x `height` box.
    ///
    /// Pixel centers are measured against the half-extent between the
    /// outermost centers, so a 3x3 ellipse is a cross. A box too small to
    /// hold any hit degenerates to a brick.
    pub fn ellipse(width: u32, height: u32) -> MorphResult<Self> {
        Self::check_size(width, height)?;
        let rx = ((width as f64 - 1.0) / 2.0).max(0.5);
        let ry = ((height as f64 - 1.0) / 2.0).max(0.5);
        let (ox, oy) = ((width as f64 - 1.0) / 2.0, (height as f64 - 1.0) / 2.0);
        let mut hits = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let dx = (x as f64 - ox) / rx;
                let dy = (y as f64 - oy) / ry;
                hits.push(dx * dx + dy * dy <= 1.0 + 1e-9);
            }
        }
        if !hits.iter().any(|&h| h) {
            return Self::brick(width, height);
        }
        Ok(Self {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            hits,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Origin (cx, cy).
    pub fn origin(&self) -> (u32, u32) {
        (self.cx, self.cy)
    }

    /// True when every element is a hit.
    pub fn is_brick(&self) -> bool {
        self.hits.iter().all(|&h| h)
    }

    /// Offsets of the hits relative to the origin.
    pub fn hit_offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let w = self.width as usize;
        self.hits
            .iter()
            .enumerate()
            .filter(|(_, h)| **h)
            .map(move |(i, _)| {
                (
                    (i % w) as i32 - self.cx as i32,
                    (i / w) as i32 - self.cy as i32,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brick_origin() {
        let sel = Sel::brick(3, 5).unwrap();
        assert_eq!(sel.origin(), (1, 2));
        assert!(sel.is_brick());
        assert_eq!(sel.hit_offsets().count(), 15);
    }

    #[test]
    fn test_ellipse_is_not_brick() {
        let sel = Sel::ellipse(7, 7).unwrap();
        assert!(!sel.is_brick());
        assert!(sel.hit_offsets().any(|o| o == (0, 0)));
        assert!(!sel.hit_offsets().any(|o| o == (-3, -3)));
        assert!(sel.hit_offsets().any(|o| o == (3, 0)));
    }

    #[test]
    fn test_small_ellipse_is_cross() {
        let sel = Sel::ellipse(3, 3).unwrap();
        assert!(!sel.is_brick());
        let mut hits: Vec<(i32, i32)> = sel.hit_offsets().collect();
        hits.sort();
        assert_eq!(hits, vec![(-1, 0), (0, -1), (0, 0), (0, 1), (1, 0)]);
        assert!(Sel::ellipse(2, 2).unwrap().is_brick());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Sel::brick(0, 3).is_err());
    }
}
