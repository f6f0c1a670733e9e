//! Rotation and scaling regression test
//!
//! Canvas sizes, quarter turns, the identity, mask rotation and
//! width-bounded reduction.

use scanclean_core::{BinaryMask, ErrorKind, Rect};
use scanclean_test::{RegParams, init_logging, synth};
use scanclean_transform::{
    RotateFill, RotateMethod, RotateOptions, ScaleMethod, rotate, rotate_mask, rotated_bounds,
    scale_to_max_width, scale_to_size,
};

#[test]
fn rotate_bounds_reg() {
    init_logging();
    let mut rp = RegParams::new("rotate_bounds");

    rp.check(rotated_bounds(100, 50, 0.0) == (100, 50), "0 degrees");
    rp.check(rotated_bounds(100, 50, 90.0) == (50, 100), "90 degrees swaps");
    rp.check(rotated_bounds(100, 50, -180.0) == (100, 50), "180 degrees");
    let (w, h) = rotated_bounds(100, 100, 45.0);
    rp.compare_values(142.0, w as f64, 0.0);
    rp.compare_values(142.0, h as f64, 0.0);

    assert!(rp.cleanup(), "rotate_bounds regression test failed");
}

#[test]
fn rotate_page_reg() {
    init_logging();
    let mut rp = RegParams::new("rotate_page");

    // marker block in the top-right corner
    let page = synth::page_with_block(40, 20, Rect::new_unchecked(34, 0, 6, 6)).expect("page");

    let same = rotate(&page, 0.0, &RotateOptions::default()).expect("identity");
    rp.compare_buffers(&page, &same);

    let opts = RotateOptions::default().with_method(RotateMethod::Sampling);
    let turned = rotate(&page, 90.0, &opts).expect("quarter turn");
    rp.compare_values(20.0, turned.width() as f64, 0.0);
    rp.compare_values(40.0, turned.height() as f64, 0.0);
    // counter-clockwise: top-right lands top-left
    rp.compare_values(0.0, turned.get_unchecked(2, 3) as f64, 0.0);
    rp.compare_values(255.0, turned.get_unchecked(17, 37) as f64, 0.0);
    rp.compare_values(36.0, synth::dark_pixels(&turned, 128) as f64, 0.0);

    // uncovered corners take the fill
    let opts = RotateOptions::default().with_fill(RotateFill::Black);
    let tilted = rotate(&synth::blank_page(60, 40, 200).expect("page"), 20.0, &opts).expect("tilt");
    rp.check(tilted.width() > 60 && tilted.height() > 40, "canvas grows");
    rp.compare_values(0.0, tilted.get_unchecked(0, 0) as f64, 0.0);
    let center = tilted.get_unchecked(tilted.width() / 2, tilted.height() / 2);
    rp.compare_values(200.0, center as f64, 0.0);

    let kept = rotate(&page, 20.0, &RotateOptions::default().with_expand(false)).expect("kept");
    rp.check((kept.width(), kept.height()) == (40, 20), "canvas kept");

    let err = rotate(&page, f64::NAN, &RotateOptions::default()).expect_err("nan");
    rp.check(err.kind() == ErrorKind::InvalidInput, "non-finite angle is InvalidInput");

    assert!(rp.cleanup(), "rotate_page regression test failed");
}

#[test]
fn rotate_mask_reg() {
    init_logging();
    let mut rp = RegParams::new("rotate_mask");

    let mut mask = BinaryMask::new(60, 60).expect("mask");
    for y in 20..40 {
        for x in 20..40 {
            mask.set_unchecked(x, y, true);
        }
    }
    let turned = rotate_mask(&mask, 30.0, false).expect("rotate");
    eprintln!("  rotated square count: {}", turned.count());
    rp.compare_values(400.0, turned.count() as f64, 40.0);
    rp.check(turned.get_unchecked(30, 30), "center stays set");
    rp.check(!turned.get_unchecked(21, 21), "corner swings away");

    assert!(rp.cleanup(), "rotate_mask regression test failed");
}

#[test]
fn scale_reg() {
    init_logging();
    let mut rp = RegParams::new("scale");

    let page = synth::text_page(640, 480, 0.0).expect("page");
    let (small, factor) = scale_to_max_width(&page, 320).expect("reduce");
    rp.compare_values(0.5, factor, 1e-12);
    rp.check((small.width(), small.height()) == (320, 240), "halved");

    let (same, factor) = scale_to_max_width(&page, 1000).expect("no-op");
    rp.compare_values(1.0, factor, 0.0);
    rp.compare_buffers(&page, &same);

    let flat = synth::blank_page(90, 60, 180).expect("flat");
    for method in [ScaleMethod::Sampling, ScaleMethod::Bilinear, ScaleMethod::Area] {
        let out = scale_to_size(&flat, 37, 23, method).expect("scale");
        rp.check(out.data().iter().all(|&v| v == 180), "flat page stays flat");
    }
    rp.check(scale_to_size(&flat, 0, 10, ScaleMethod::Area).is_err(), "zero size rejected");

    assert!(rp.cleanup(), "scale regression test failed");
}
