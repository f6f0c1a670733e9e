//! Border removal regression test
//!
//! A black frame touching every edge must disappear; an interior block of
//! the same area must survive untouched.

use scanclean_core::{CancelToken, Rect};
use scanclean_doc::{BorderOptions, BorderRemovalAlgorithm, BorderRepair, remove_borders};
use scanclean_test::{RegParams, init_logging, synth};

#[test]
fn border_frame_reg() {
    init_logging();
    let mut rp = RegParams::new("border_frame");
    let none = CancelToken::none();
    let (w, h, f) = (300u32, 200u32, 12u32);
    let frame_px = synth::frame_pixel_count(w, h, f) as f64;
    let page = synth::framed_page(w, h, f).expect("framed page");

    // --- canonical crop ---
    let out = remove_borders(&page, &BorderOptions::default(), &none).expect("crop");
    let left = synth::dark_pixels(&out.image, 128) as f64;
    eprintln!("  crop {:?}, residual dark {left} of {frame_px}", out.crop);
    rp.check(out.removed_components == 1, "frame is one artifact");
    rp.check(left <= frame_px * 0.01, "crop leaves at most 1% of the frame");
    rp.check(out.image.width() < w && out.image.height() < h, "page is cropped");

    // --- legacy fill keeps the size ---
    let opts = BorderOptions::new(BorderRemovalAlgorithm::ByContrast).with_repair(BorderRepair::Fill);
    let filled = remove_borders(&page, &opts, &none).expect("fill");
    rp.compare_values(w as f64, filled.image.width() as f64, 0.0);
    rp.compare_values(h as f64, filled.image.height() as f64, 0.0);
    let left = synth::dark_pixels(&filled.image, 128) as f64;
    rp.check(left <= frame_px * 0.01, "fill leaves at most 1% of the frame");

    assert!(rp.cleanup(), "border_frame regression test failed");
}

#[test]
fn border_interior_block_reg() {
    init_logging();
    let mut rp = RegParams::new("border_interior_block");
    let none = CancelToken::none();
    let (w, h, f) = (300u32, 200u32, 12u32);
    let side = (synth::frame_pixel_count(w, h, f) as f64).sqrt().round() as i32;
    let block = Rect::new_unchecked(96, (h as i32 - side) / 2, side, side);

    // --- block alone is not touched ---
    let page = synth::page_with_block(w, h, block).expect("block page");
    let out = remove_borders(&page, &BorderOptions::default(), &none).expect("remove");
    rp.check(out.removed_components == 0, "interior block is not an artifact");
    rp.compare_buffers(&page, &out.image);

    // --- block inside a frame survives the frame removal ---
    let mut framed = synth::framed_page(w, h, f).expect("framed page");
    framed.fill_rect(&block, &[0]);
    let out = remove_borders(&framed, &BorderOptions::default(), &none).expect("remove");
    let dark = synth::dark_pixels(&out.image, 128) as f64;
    rp.compare_values((side * side) as f64, dark, 0.0);

    assert!(rp.cleanup(), "border_interior_block regression test failed");
}

#[test]
fn border_scanner_shadow_reg() {
    init_logging();
    let mut rp = RegParams::new("border_scanner_shadow");
    let none = CancelToken::none();

    // gray paper with a dark strip on the left and a text-like mark near it
    let mut page = synth::blank_page(320, 240, synth::PAPER).expect("page");
    page.fill_rect(&Rect::new_unchecked(0, 0, 18, 240), &[30]);
    page.fill_rect(&Rect::new_unchecked(60, 100, 40, 6), &[synth::INK]);
    let out = remove_borders(&page, &BorderOptions::default(), &none).expect("remove");
    let crop = out.crop.expect("crop");
    eprintln!("  threshold {:?}, crop {crop:?}", out.threshold);
    rp.check(crop.x >= 18, "shadow strip is cut off");
    rp.check(crop.x <= 24, "crop stays close to the strip");
    rp.compare_values(240.0, out.image.height() as f64, 0.0);
    rp.compare_values(240.0, synth::dark_pixels(&out.image, 100) as f64, 0.0);

    assert!(rp.cleanup(), "border_scanner_shadow regression test failed");
}
