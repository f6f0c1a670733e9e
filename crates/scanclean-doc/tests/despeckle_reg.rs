//! Despeckle regression test
//!
//! One letter-sized glyph and ten isolated single-pixel dots: the glyph
//! keeps every pixel, every dot is erased. Cancellation mid-scan must
//! surface as an error, never as a partial page.

use scanclean_core::{CancelToken, ErrorKind, PixelLayout, RasterBuffer, Rect};
use scanclean_doc::{DespeckleKernel, DespeckleSettings, RetentionHeuristics, despeckle};
use scanclean_test::{RegParams, init_logging, synth};

fn glyph_ink(page: &RasterBuffer, glyph: Rect) -> usize {
    let mut n = 0;
    for y in glyph.y..glyph.bottom() {
        for x in glyph.x..glyph.right() {
            if page.get_unchecked(x as u32, y as u32) == 0 {
                n += 1;
            }
        }
    }
    n
}

#[test]
fn despeckle_letter_and_dots_reg() {
    init_logging();
    let mut rp = RegParams::new("despeckle_letter_and_dots");
    let none = CancelToken::none();
    let sp = synth::speckled_page(400, 300, 24).expect("speckled page");
    rp.compare_values(10.0, sp.dots.len() as f64, 0.0);

    for kernel in [
        DespeckleKernel::None,
        DespeckleKernel::Horizontal1x3,
        DespeckleKernel::Vertical3x1,
        DespeckleKernel::Square3x3,
    ] {
        let settings = DespeckleSettings::default().with_kernel(kernel);
        let out = despeckle(&sp.page, &settings, &none).expect("despeckle");
        eprintln!(
            "  {kernel:?}: removed {} components, median {:?}",
            out.removed_components, out.median_height
        );
        rp.compare_values(sp.glyph_pixels as f64, glyph_ink(&out.image, sp.glyph) as f64, 0.0);
        let dots_left = sp
            .dots
            .iter()
            .filter(|&&(x, y)| out.image.get_unchecked(x, y) != 255)
            .count();
        rp.compare_values(0.0, dots_left as f64, 0.0);
        rp.compare_values(10.0, out.removed_pixels as f64, 0.0);
    }

    // --- isolated dots are not rescued by the retention tests ---
    let settings = DespeckleSettings::default().with_retention(RetentionHeuristics::enabled());
    let out = despeckle(&sp.page, &settings, &none).expect("despeckle");
    rp.compare_values(10.0, out.removed_pixels as f64, 0.0);

    assert!(rp.cleanup(), "despeckle_letter_and_dots regression test failed");
}

#[test]
fn despeckle_cancel_reg() {
    init_logging();
    let mut rp = RegParams::new("despeckle_cancel");

    // large page with a grid of glyph blocks and many dots
    let mut page = RasterBuffer::new_filled(1200, 900, PixelLayout::Gray, 255).expect("page");
    for j in 0..20 {
        for i in 0..30 {
            page.fill_rect(&Rect::new_unchecked(20 + i * 38, 20 + j * 42, 10, 18), &[0]);
            page.set_unchecked(35 + i as u32 * 38, 45 + j as u32 * 42, 0);
        }
    }
    let settings = DespeckleSettings::default();

    let full = despeckle(&page, &settings, &CancelToken::none()).expect("despeckle");
    rp.compare_values(600.0, full.removed_components as f64, 0.0);

    for polls in [1, 100, 1000, 2500] {
        let result = despeckle(&page, &settings, &CancelToken::trip_after(polls));
        let cancelled = matches!(&result, Err(e) if e.kind() == ErrorKind::Cancelled);
        rp.check(cancelled, &format!("cancelled after {polls} polls"));
    }

    // a token cancelled up front stops before any work
    let token = CancelToken::new();
    token.cancel();
    rp.check(despeckle(&page, &settings, &token).is_err(), "pre-cancelled token");

    assert!(rp.cleanup(), "despeckle_cancel regression test failed");
}
