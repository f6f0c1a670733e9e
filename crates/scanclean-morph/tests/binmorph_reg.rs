//! Binary morphology regression test
//!
//! Brick and generic elements must agree, and the basic size identities of
//! erosion and dilation must hold away from the border.

use scanclean_core::{BinaryMask, Rect};
use scanclean_morph::{Sel, close, close_brick, dilate, dilate_brick, erode, erode_brick, open, open_brick};
use scanclean_test::{RegParams, init_logging};

fn square_mask(size: u32, block: Rect) -> BinaryMask {
    let mut m = BinaryMask::new(size, size).expect("mask");
    for y in block.y..block.y + block.h {
        for x in block.x..block.x + block.w {
            m.set(x, y, true);
        }
    }
    m
}

#[test]
fn binmorph_sizes_reg() {
    init_logging();
    let mut rp = RegParams::new("binmorph_sizes");

    let m = square_mask(40, Rect::new_unchecked(15, 15, 10, 10));
    rp.compare_values(100.0, m.count() as f64, 0.0);
    rp.compare_values(64.0, erode_brick(&m, 3, 3).expect("erode").count() as f64, 0.0);
    rp.compare_values(144.0, dilate_brick(&m, 3, 3).expect("dilate").count() as f64, 0.0);
    rp.compare_values(120.0, dilate_brick(&m, 3, 1).expect("dilate h").count() as f64, 0.0);

    // --- an opening keeps the square, a closing keeps it too ---
    rp.compare_masks(&m, &open_brick(&m, 3, 3).expect("open"));
    rp.compare_masks(&m, &close_brick(&m, 3, 3).expect("close"));

    assert!(rp.cleanup(), "binmorph_sizes regression test failed");
}

#[test]
fn binmorph_brick_vs_generic_reg() {
    init_logging();
    let mut rp = RegParams::new("binmorph_brick_vs_generic");

    let mut m = square_mask(48, Rect::new_unchecked(10, 12, 14, 9));
    m.set(35, 30, true);
    m.set(36, 31, true);
    m.set(17, 16, false);

    // --- brick passes match a direct neighborhood scan ---
    let brick = Sel::brick(5, 3).expect("brick");
    let fast = dilate(&m, &brick).expect("dilate");
    let mut reference = BinaryMask::new(48, 48).expect("mask");
    for y in 0..48 {
        for x in 0..48 {
            let hit = (-1..=1).any(|dy| (-2..=2).any(|dx| m.get(x + dx, y + dy)));
            reference.set(x, y, hit);
        }
    }
    rp.compare_masks(&reference, &fast);
    rp.compare_masks(&fast, &dilate_brick(&m, 5, 3).expect("dilate brick"));
    rp.compare_masks(&erode_brick(&m, 5, 3).expect("a"), &erode(&m, &brick).expect("b"));

    // --- opening removes the specks, closing fills the pinhole ---
    let opened = open(&m, &Sel::square(3).expect("sel")).expect("open");
    rp.check(!opened.get(35, 30) && !opened.get(36, 31), "specks opened away");
    let closed = close(&m, &Sel::square(3).expect("sel")).expect("close");
    rp.check(closed.get(17, 16), "pinhole closed");

    // --- a disc element rounds a single pixel ---
    let mut dot = BinaryMask::new(21, 21).expect("mask");
    dot.set(10, 10, true);
    let disc = dilate(&dot, &Sel::ellipse(7, 7).expect("disc")).expect("disc dilate");
    eprintln!("  disc area {}", disc.count());
    rp.check(disc.count() > 25 && disc.count() < 49, "disc is rounder than a square");
    rp.check(disc.get(10, 7) && disc.get(7, 10), "disc reaches its radius");

    assert!(rp.cleanup(), "binmorph_brick_vs_generic regression test failed");
}
