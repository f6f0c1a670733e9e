//! scanclean-morph - morphological operations on binary masks
//!
//! - [`Sel`] structuring elements (bricks, lines, ellipses)
//! - [`binary`]: erosion, dilation, opening, closing

pub mod binary;
mod error;
pub mod sel;

pub use binary::{
    close, close_brick, dilate, dilate_brick, erode, erode_brick, open, open_brick,
};
pub use error::{MorphError, MorphResult};
pub use sel::Sel;
