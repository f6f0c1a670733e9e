//! Binary morphological operations
//!
//! Erosion, dilation, opening and closing on [`BinaryMask`]. Pixels outside
//! the image count as background for dilation and as foreground for
//! erosion, so a closing never eats into content touching the border.
//!
//! Dilation reflects the element about its origin, so an opening or a
//! closing with an even-sized element does not shift the image.
//!
//! Brick elements run as two 1-D passes over running counts, which makes
//! the cost independent of the element size.

use crate::{MorphResult, Sel};
use scanclean_core::BinaryMask;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    Dilate,
    Erode,
}

/// 1-D window pass over one line of `len` samples read through `get`.
///
/// The window for output `i` spans `[i - origin, i - origin + size)`.
fn line_pass(len: usize, size: usize, origin: usize, op: Op, get: impl Fn(usize) -> bool) -> Vec<bool> {
    let mut prefix = vec![0u32; len + 1];
    for i in 0..len {
        prefix[i + 1] = prefix[i] + get(i) as u32;
    }
    (0..len)
        .map(|i| {
            let start = i as isize - origin as isize;
            let end = start + size as isize;
            let lo = start.max(0) as usize;
            let hi = (end.min(len as isize)).max(0) as usize;
            let set = if hi > lo { prefix[hi] - prefix[lo] } else { 0 };
            match op {
                Op::Dilate => set > 0,
                Op::Erode => set as usize == hi.saturating_sub(lo),
            }
        })
        .collect()
}

fn brick_op(mask: &BinaryMask, sel: &Sel, op: Op) -> MorphResult<BinaryMask> {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let (mut cx, mut cy) = sel.origin();
    if op == Op::Dilate {
        cx = sel.width() - 1 - cx;
        cy = sel.height() - 1 - cy;
    }
    let mut tmp = BinaryMask::new(mask.width(), mask.height())?;
    for y in 0..h {
        let row = mask.row(y as u32);
        let out = line_pass(w, sel.width() as usize, cx as usize, op, |x| row[x] != 0);
        for (x, on) in out.into_iter().enumerate() {
            if on {
                tmp.set_unchecked(x as u32, y as u32, true);
            }
        }
    }
    let mut dst = BinaryMask::new(mask.width(), mask.height())?;
    for x in 0..w {
        let out = line_pass(h, sel.height() as usize, cy as usize, op, |y| {
            tmp.get_unchecked(x as u32, y as u32)
        });
        for (y, on) in out.into_iter().enumerate() {
            if on {
                dst.set_unchecked(x as u32, y as u32, true);
            }
        }
    }
    Ok(dst)
}

fn generic_op(mask: &BinaryMask, sel: &Sel, op: Op) -> MorphResult<BinaryMask> {
    let offsets: Vec<(i32, i32)> = sel.hit_offsets().collect();
    let (w, h) = (mask.width() as i32, mask.height() as i32);
    let mut dst = BinaryMask::new(mask.width(), mask.height())?;
    for y in 0..h {
        for x in 0..w {
            let on = match op {
                Op::Dilate => offsets.iter().any(|&(dx, dy)| mask.get(x - dx, y - dy)),
                Op::Erode => offsets.iter().all(|&(dx, dy)| {
                    let (sx, sy) = (x + dx, y + dy);
                    sx < 0 || sy < 0 || sx >= w || sy >= h || mask.get_unchecked(sx as u32, sy as u32)
                }),
            };
            if on {
                dst.set_unchecked(x as u32, y as u32, true);
            }
        }
    }
    Ok(dst)
}

fn apply(mask: &BinaryMask, sel: &Sel, op: Op) -> MorphResult<BinaryMask> {
    if sel.is_brick() {
        brick_op(mask, sel, op)
    } else {
        generic_op(mask, sel, op)
    }
}

/// Dilate: grow foreground by the structuring element.
pub fn dilate(mask: &BinaryMask, sel: &Sel) -> MorphResult<BinaryMask> {
    apply(mask, sel, Op::Dilate)
}

/// Erode: shrink foreground by the structuring element.
pub fn erode(mask: &BinaryMask, sel: &Sel) -> MorphResult<BinaryMask> {
    apply(mask, sel, Op::Erode)
}

/// Opening (erode then dilate) removes foreground smaller than the element.
pub fn open(mask: &BinaryMask, sel: &Sel) -> MorphResult<BinaryMask> {
    dilate(&erode(mask, sel)?, sel)
}

/// Closing (dilate then erode) bridges gaps smaller than the element.
pub fn close(mask: &BinaryMask, sel: &Sel) -> MorphResult<BinaryMask> {
    erode(&dilate(mask, sel)?, sel)
}

/// Dilate with a `width` x `height` brick.
pub fn dilate_brick(mask: &BinaryMask, width: u32, height: u32) -> MorphResult<BinaryMask> {
    dilate(mask, &Sel::brick(width, height)?)
}

/// Erode with a `width` x `height` brick.
pub fn erode_brick(mask: &BinaryMask, width: u32, height: u32) -> MorphResult<BinaryMask> {
    erode(mask, &Sel::brick(width, height)?)
}

/// Open with a `width` x `height` brick.
pub fn open_brick(mask: &BinaryMask, width: u32, height: u32) -> MorphResult<BinaryMask> {
    open(mask, &Sel::brick(width, height)?)
}

/// Close with a `width` x `height` brick.
pub fn close_brick(mask: &BinaryMask, width: u32, height: u32) -> MorphResult<BinaryMask> {
    close(mask, &Sel::brick(width, height)?)
}
