//! scanclean-transform - geometric transforms
//!
//! - [`rotate`]: arbitrary-angle rotation with optional canvas growth
//! - [`scale`]: area, bilinear and sampling resizes

mod error;
pub mod rotate;
pub mod scale;

pub use error::{TransformError, TransformResult};
pub use rotate::{RotateFill, RotateMethod, RotateOptions, rotate, rotate_mask, rotated_bounds};
pub use scale::{ScaleMethod, scale_to_max_width, scale_to_size};
