//! scanclean-color - binarization of scanned pages
//!
//! Turns gray or color scans into black-on-white bitonal images.
//!
//! - [`threshold`]: fixed, Otsu, adaptive and Sauvola ink masks
//! - [`binarize`](mod@binarize): method selection, the optional retinex
//!   pre-stage and the 3-channel bitonal output
//!
//! # Example
//!
//! ```
//! use scanclean_color::{BinarizeMethod, BinarizeParameters, PreBinarizeParameters, binarize};
//! use scanclean_core::{CancelToken, PixelLayout, RasterBuffer};
//!
//! let page = RasterBuffer::new_filled(32, 32, PixelLayout::Gray, 200).unwrap();
//! let out = binarize(
//!     &page,
//!     BinarizeMethod::Threshold,
//!     &BinarizeParameters::default(),
//!     &PreBinarizeParameters::default(),
//!     &CancelToken::none(),
//! )
//! .unwrap();
//! assert_eq!(out.channels(), 3);
//! ```

pub mod binarize;
mod error;
pub mod threshold;

pub use binarize::{
    BinarizeMethod, BinarizeParameters, PreBinarizeParameters, PreBinarization, binarize,
    binarize_named, binarize_to_mask,
};
pub use error::{ColorError, ColorResult};
pub use threshold::{
    AdaptiveMethod, AdaptiveThresholdOptions, SauvolaOptions, adaptive_ink_mask,
    compute_otsu_threshold, otsu_from_histogram, otsu_ink_mask, sauvola_ink_mask,
    threshold_ink_mask,
};
