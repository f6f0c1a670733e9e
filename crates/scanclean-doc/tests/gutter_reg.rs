//! Page split regression test
//!
//! A single page must be refused with a reason; a real spread must split
//! within a few pixels of its gutter, also when analysed at reduced size.

use scanclean_core::{CancelToken, ErrorKind};
use scanclean_doc::{SplitOptions, split_pages};
use scanclean_test::{RegParams, init_logging, synth};

#[test]
fn gutter_single_page_reg() {
    init_logging();
    let mut rp = RegParams::new("gutter_single_page");
    let none = CancelToken::none();
    let page = synth::single_page_spread(1000, 700).expect("page");
    let opts = SplitOptions::default();

    let out = split_pages(&page, &opts, &none).expect("split");
    eprintln!(
        "  projection {:.3}, lab {:.3}, final {:.3}, reason {:?}",
        out.projection_confidence, out.lab_confidence, out.final_confidence, out.reason
    );
    rp.check(!out.success, "single page is not split");
    rp.check(out.final_confidence < opts.min_confidence, "confidence below minimum");
    rp.check(out.reason.is_some(), "refusal has a reason");
    rp.check(out.left.is_none() && out.right.is_none(), "no pages on refusal");

    let strict = opts.with_throw_if_low_confidence(true);
    match split_pages(&page, &strict, &none) {
        Err(e) => rp.check(e.kind() == ErrorKind::NoSignal, "strict refusal is NoSignal"),
        Ok(_) => rp.check(false, "strict mode must fail"),
    };

    assert!(rp.cleanup(), "gutter_single_page regression test failed");
}

#[test]
fn gutter_two_page_reg() {
    init_logging();
    let mut rp = RegParams::new("gutter_two_page");
    let none = CancelToken::none();

    for (width, gutter_x) in [(1000u32, 500u32), (1000, 460), (1600, 820)] {
        let page = synth::two_page_spread(width, 700, gutter_x, 60).expect("spread");
        let opts = SplitOptions::default().with_pad(10).with_debug(true);
        let out = split_pages(&page, &opts, &none).expect("split");
        eprintln!(
            "  width {width}: split {:?} (analysis {:?}), confidence {:.3}",
            out.split_x, out.split_x_analysis, out.final_confidence
        );
        rp.check(out.success, "spread is split");
        let x = out.split_x.unwrap_or(0) as f64;
        rp.compare_values(gutter_x as f64, x, 5.0);
        if let (Some(left), Some(right)) = (&out.left, &out.right) {
            rp.compare_values(x + 10.0, left.width() as f64, 0.0);
            rp.compare_values(width as f64 - (x - 10.0), right.width() as f64, 0.0);
            rp.compare_values(700.0, left.height() as f64, 0.0);
        }
        let overlay_width = out.debug.as_ref().map_or(0, |d| d.width());
        rp.compare_values(width.min(1200) as f64, overlay_width as f64, 0.0);
    }

    // cancellation before analysis
    let page = synth::two_page_spread(800, 500, 400, 50).expect("spread");
    let res = split_pages(&page, &SplitOptions::default(), &CancelToken::trip_after(1));
    rp.check(matches!(res, Err(e) if e.kind() == ErrorKind::Cancelled), "split cancelled");

    assert!(rp.cleanup(), "gutter_two_page regression test failed");
}
