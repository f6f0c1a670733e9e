//! scanclean-doc - page cleanup for scanned documents
//!
//! # Quick Start
//!
//! ```no_run
//! use scanclean_core::{CancelToken, PixelLayout, RasterBuffer};
//! use scanclean_doc::{BorderOptions, DespeckleSettings, despeckle, remove_borders};
//!
//! let page = RasterBuffer::new_filled(800, 600, PixelLayout::Gray, 255).unwrap();
//! let cancel = CancelToken::none();
//! let framed = remove_borders(&page, &BorderOptions::default(), &cancel).unwrap();
//! let clean = despeckle(&framed.image, &DespeckleSettings::default(), &cancel).unwrap();
//! println!("removed {} specks", clean.removed_components);
//! ```
//!
//! # Modules
//!
//! - [`border`]: dark edge artifacts, cropped or filled
//! - [`despeckle`](mod@despeckle): specks sized against the median text height
//! - [`punch`]: circular and rectangular punch holes, inpainted
//! - [`hough_circle`]: gradient Hough transform for circles
//! - [`gutter`]: two-page spread splitting with confidence gating

pub mod border;
pub mod despeckle;
mod error;
pub mod gutter;
pub mod hough_circle;
pub mod punch;

pub use border::{
    BorderOptions, BorderOutcome, BorderRemovalAlgorithm, BorderRepair, ManualMargins,
    content_crop_rect, dark_threshold_for, detect_border_artifacts, estimate_background,
    remove_borders,
};
pub use despeckle::{
    DespeckleKernel, DespeckleOutcome, DespeckleSettings, RetentionHeuristics, SmallAreaCutoff,
    SpeckSelection, despeckle, ink_mask, select_specks,
};
pub use error::{DocError, DocResult};
pub use gutter::{SplitOptions, SplitResult, split_pages};
pub use hough_circle::{Circle, HoughCircleOptions, hough_circles};
pub use punch::{
    DetectedHole, EdgeBands, HoleDensity, PunchOptions, PunchOutcome, PunchShape, PunchSpec,
    detect_punch_holes, hole_mask, remove_punch_holes,
};
