//! Pipeline regression test
//!
//! A batch-style command list over synthetic pages: a tilted text page is
//! straightened, binarized and cleaned; a spread ends split in two; a
//! cancelled run reports cancellation and nothing else.

use scanclean::{
    CancelToken, Command, CommandOutput, CommandParams, ErrorKind, ParamMap, Pipeline, PixelLayout,
};
use scanclean_test::{RegParams, init_logging, synth};

fn restoration() -> Pipeline {
    Pipeline::new()
        .then_parsed(Command::Deskew, &ParamMap::new().with("deskewAlgorithm", "Projection"))
        .expect("deskew params")
        .then_parsed(
            Command::Binarize,
            &ParamMap::new().with("method", "Sauvola").with("windowSize", 31),
        )
        .expect("binarize params")
        .then(CommandParams::defaults(Command::Despeckle))
}

#[test]
fn pipeline_restoration_reg() {
    init_logging();
    let mut rp = RegParams::new("pipeline_restoration");

    let page = synth::text_page(640, 480, 2.0).expect("text page");
    let out = restoration().run(page, &CancelToken::none()).expect("run");
    rp.check(!out.is_split(), "single page stays single");
    let pages = out.into_pages();
    rp.compare_values(1.0, pages.len() as f64, 0.0);
    if let Some(clean) = pages.first() {
        rp.compare_values(640.0, clean.width() as f64, 0.0);
        rp.compare_values(480.0, clean.height() as f64, 0.0);
        rp.check(clean.layout() == PixelLayout::Bgr, "output is BGR");
        rp.check(clean.data().iter().all(|&v| v == 0 || v == 255), "output is bitonal");
        let ink = synth::dark_pixels(clean, 128);
        eprintln!("  ink pixels after restoration: {ink}");
        rp.check(ink > 0, "text survives");
    }

    assert!(rp.cleanup(), "pipeline_restoration regression test failed");
}

#[test]
fn pipeline_split_reg() {
    init_logging();
    let mut rp = RegParams::new("pipeline_split");

    let spread = synth::two_page_spread(1000, 700, 500, 60).expect("spread");
    let pipeline = Pipeline::new()
        .then_parsed(
            Command::PunchHoleRemove,
            &ParamMap::new().with("punchShape", "Circle").with("diameterPx", 30),
        )
        .expect("punch params")
        .then_parsed(Command::SplitPages, &ParamMap::new().with("minConfidence", 0.5))
        .expect("split params");
    rp.compare_values(2.0, pipeline.len() as f64, 0.0);

    match pipeline.run(spread, &CancelToken::none()).expect("run") {
        CommandOutput::Pages { left, right } => {
            eprintln!("  pages {}x{} / {}x{}", left.width(), left.height(), right.width(), right.height());
            rp.compare_values(700.0, left.height() as f64, 0.0);
            rp.compare_values(700.0, right.height() as f64, 0.0);
            rp.compare_values(1016.0, (left.width() + right.width()) as f64, 0.0);
        }
        CommandOutput::Page(_) => {
            rp.check(false, "spread is split");
        }
    }

    // --- nothing may follow a split ---
    let bad = pipeline.then(CommandParams::defaults(Command::Binarize));
    let err = bad
        .run(synth::blank_page(50, 50, 255).expect("page"), &CancelToken::none())
        .expect_err("split not last");
    rp.check(err.kind() == ErrorKind::InvalidInput, "misplaced split is InvalidInput");

    assert!(rp.cleanup(), "pipeline_split regression test failed");
}

#[test]
fn pipeline_cancel_reg() {
    init_logging();
    let mut rp = RegParams::new("pipeline_cancel");

    let page = synth::text_page(640, 480, 2.0).expect("text page");
    let pipeline = restoration();
    for polls in [1usize, 2, 3] {
        let cancel = CancelToken::trip_after(polls);
        match pipeline.run(page.clone(), &cancel) {
            Err(e) => {
                eprintln!("  trip after {polls}: {e}");
                rp.check(e.kind() == ErrorKind::Cancelled, "only cancellation is reported");
            }
            Ok(_) => {
                rp.check(false, "cancelled run must not succeed");
            }
        }
    }

    assert!(rp.cleanup(), "pipeline_cancel regression test failed");
}
