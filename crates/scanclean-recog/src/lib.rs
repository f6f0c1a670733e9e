//! scanclean-recog - skew estimation and deskewing
//!
//! # Quick Start
//!
//! ```no_run
//! use scanclean_core::{CancelToken, PixelLayout, RasterBuffer};
//! use scanclean_recog::{DeskewOptions, SkewMethod, deskew};
//!
//! let page = RasterBuffer::new_filled(800, 600, PixelLayout::Gray, 255).unwrap();
//! let out = deskew(&page, &DeskewOptions::new(SkewMethod::Auto), &CancelToken::none()).unwrap();
//! println!("angle: {:?} via {:?}", out.angle, out.method);
//! ```
//!
//! # Modules
//!
//! - [`skew`]: the four estimators and the Auto fallback chain
//! - [`hough`]: line segments from an edge map
//! - [`deskew`](mod@deskew): rotation with canvas growth and content crop

pub mod deskew;
mod error;
pub mod hough;
pub mod skew;

pub use deskew::{DeskewOptions, DeskewOutcome, background_for, deskew, rotate_page};
pub use error::{RecogError, RecogResult};
pub use hough::{HoughLineOptions, LineSegment, hough_line_segments};
pub use skew::{
    BorderSkewOptions, HoughSkewOptions, PcaSkewOptions, ProjectionSkewOptions, SkewEstimate,
    SkewMethod, SkewOptions, estimate_by_borders, estimate_by_hough, estimate_by_pca,
    estimate_by_projection, estimate_skew, projection_angle_of_mask,
};
