//! scanclean-core - basic data structures for document restoration
//!
//! This crate provides the types every other scanclean crate builds on:
//!
//! - [`RasterBuffer`] - owned 8-bit image with gray / BGR / BGRA / Lab layouts
//! - [`BinaryMask`] - single-channel {0, 255} mask
//! - [`Rect`] / [`Point`] / [`PointF`] / [`RotatedRect`] - geometry values
//! - [`CancelToken`] - cooperative cancellation flag
//! - [`stats`] - median, mean/std, histogram and smoothing helpers
//!
//! # Example
//!
//! ```
//! use scanclean_core::{PixelLayout, RasterBuffer};
//!
//! let page = RasterBuffer::new_filled(640, 480, PixelLayout::Bgr, 255).unwrap();
//! let gray = page.to_gray();
//! assert_eq!(gray.layout(), PixelLayout::Gray);
//! assert_eq!(gray.get_unchecked(10, 10), 255);
//! ```

pub mod buffer;
pub mod cancel;
pub mod error;
pub mod geometry;
#[cfg(feature = "image")]
mod interop;
pub mod mask;
pub mod stats;

pub use buffer::{Lab, PixelLayout, RasterBuffer, bgr_to_lab, lab_to_bgr, luma};
pub use cancel::CancelToken;
pub use error::{Error, ErrorKind, Result};
pub use geometry::{Point, PointF, Rect, RotatedRect, fold_to_axis_deg, normalize_angle_deg};
pub use mask::{BinaryMask, MASK_OFF, MASK_ON};

/// Fill colors shared by the pipeline stages.
pub mod color {
    /// Paper white in any layout
    pub const WHITE: [u8; 4] = [255, 255, 255, 255];
    /// Scanner-bed black
    pub const BLACK: [u8; 4] = [0, 0, 0, 255];
    /// Marker used by debug visualizations
    pub const MID_GRAY: [u8; 4] = [128, 128, 128, 255];
}
