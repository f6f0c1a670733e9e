//! Filter regression test
//!
//! Smoothing, local statistics, edges, contrast equalization and
//! inpainting on synthetic gray pages.

use scanclean_core::{BinaryMask, CancelToken, PixelLayout, RasterBuffer, Rect};
use scanclean_filter::{
    ClaheOptions, RetinexOptions, box_mean_std, canny, clahe, gaussian_blur, gaussian_kernel,
    homomorphic_retinex, inpaint,
};
use scanclean_test::{RegParams, init_logging, synth};

fn range(buf: &RasterBuffer) -> (u8, u8) {
    let lo = buf.data().iter().copied().min().unwrap_or(0);
    let hi = buf.data().iter().copied().max().unwrap_or(0);
    (lo, hi)
}

#[test]
fn filter_smooth_reg() {
    init_logging();
    let mut rp = RegParams::new("filter_smooth");
    let none = CancelToken::none();

    for sigma in [0.8f32, 2.0, 5.0] {
        let k = gaussian_kernel(sigma);
        rp.check(k.len() % 2 == 1, "kernel length is odd");
        rp.compare_values(1.0, k.iter().map(|&v| v as f64).sum(), 1e-4);
    }

    let flat = synth::blank_page(80, 60, synth::PAPER).expect("flat");
    let blurred = gaussian_blur(&flat, 3.0).expect("blur");
    let (lo, hi) = range(&blurred);
    rp.compare_values(synth::PAPER as f64, lo as f64, 1.0);
    rp.compare_values(synth::PAPER as f64, hi as f64, 1.0);

    // a step edge is spread, not moved
    let step = synth::page_with_block(80, 60, Rect::new_unchecked(40, 0, 40, 60)).expect("step");
    let soft = gaussian_blur(&step, 2.0).expect("blur step");
    rp.check(soft.get_unchecked(38, 30) < 255, "blur reaches across the edge");
    rp.check(soft.get_unchecked(41, 30) > 0, "blur reaches across the edge");
    rp.compare_values(255.0, soft.get_unchecked(10, 30) as f64, 0.0);
    rp.compare_values(0.0, soft.get_unchecked(70, 30) as f64, 0.0);

    let (mean, std) = box_mean_std(&flat, 9, &none).expect("box stats");
    rp.compare_values(synth::PAPER as f64, mean.get(40, 30) as f64, 1e-3);
    rp.check(std.data().iter().all(|&s| s.abs() < 1e-3), "flat page has zero deviation");
    rp.check(box_mean_std(&flat, 8, &none).is_err(), "even window rejected");

    assert!(rp.cleanup(), "filter_smooth regression test failed");
}

#[test]
fn filter_edge_reg() {
    init_logging();
    let mut rp = RegParams::new("filter_edge");
    let none = CancelToken::none();

    let block = Rect::new_unchecked(30, 20, 40, 30);
    let page = synth::page_with_block(100, 70, block).expect("page");
    let edges = canny(&page, 50.0, 150.0, &none).expect("canny");
    let perimeter = 2.0 * (40.0 + 30.0);
    eprintln!("  canny edge pixels: {}", edges.count());
    rp.compare_values(perimeter, edges.count() as f64, 0.3 * perimeter);
    rp.check(!edges.get(50, 35), "interior has no edges");
    rp.check(!edges.get(5, 5), "paper has no edges");
    let near_border = (28..=31).any(|x| edges.get(x, 35));
    rp.check(near_border, "left side of the block is an edge");
    rp.check(canny(&page, 100.0, 50.0, &none).is_err(), "low above high rejected");

    assert!(rp.cleanup(), "filter_edge regression test failed");
}

#[test]
fn filter_enhance_reg() {
    init_logging();
    let mut rp = RegParams::new("filter_enhance");
    let none = CancelToken::none();

    // low-contrast page: lines at 150 on paper at 180
    let mut dull = synth::blank_page(160, 120, 180).expect("dull");
    for y in (10..110).step_by(12) {
        dull.fill_rect(&Rect::new_unchecked(10, y, 140, 4), &[150]);
    }
    let eq = clahe(&dull, &ClaheOptions::default().with_clip_limit(40.0)).expect("clahe");
    rp.check(eq.layout() == PixelLayout::Gray, "clahe output is gray");
    rp.compare_values(160.0, eq.width() as f64, 0.0);
    let (lo, hi) = range(&eq);
    eprintln!("  clahe range {lo}..{hi}");
    rp.check(hi - lo > 30, "contrast is stretched");
    let bad = ClaheOptions::default().with_tiles(0, 8);
    rp.check(clahe(&dull, &bad).is_err(), "zero tiles rejected");

    let flat = homomorphic_retinex(&dull, &RetinexOptions::default(), &none).expect("retinex");
    rp.check(flat.layout() == PixelLayout::Gray, "retinex output is gray");
    rp.compare_values(120.0, flat.height() as f64, 0.0);
    let empty = homomorphic_retinex(&RasterBuffer::empty(), &RetinexOptions::default(), &none)
        .expect("empty");
    rp.check(empty.is_empty(), "empty in, empty out");

    assert!(rp.cleanup(), "filter_enhance regression test failed");
}

#[test]
fn filter_inpaint_reg() {
    init_logging();
    let mut rp = RegParams::new("filter_inpaint");
    let none = CancelToken::none();

    let mut page = synth::blank_page(120, 90, synth::PAPER).expect("page");
    page.fill_circle(60.0, 45.0, 12.0, &[synth::INK]);
    let mask = BinaryMask::from_predicate(&page, |v| v < 128).expect("mask");
    rp.check(mask.count() > 400, "disc is masked");

    let filled = inpaint(&page, &mask, 5, &none).expect("inpaint");
    let (lo, hi) = range(&filled);
    rp.compare_values(synth::PAPER as f64, lo as f64, 2.0);
    rp.compare_values(synth::PAPER as f64, hi as f64, 2.0);

    let blank = BinaryMask::new(120, 90).expect("blank");
    rp.compare_buffers(&page, &inpaint(&page, &blank, 5, &none).expect("no-op"));
    rp.check(inpaint(&page, &mask, 0, &none).is_err(), "zero radius rejected");

    assert!(rp.cleanup(), "filter_inpaint regression test failed");
}
