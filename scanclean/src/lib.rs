//! scanclean - scanned document restoration
//!
//! Straightens skewed pages, reduces scans to black ink on white paper,
//! strips scanner-bed borders and punch holes, removes noise specks and
//! splits two-page spreads at the gutter.
//!
//! # Overview
//!
//! A host decodes an image into a [`RasterBuffer`], picks a [`Command`],
//! and passes its parameters either typed or as a string-keyed
//! [`ParamMap`]. Parameters are parsed and validated once into
//! [`CommandParams`], then applied through an [`ImageProcessor`] or as
//! part of a [`Pipeline`].
//!
//! Every failure is a [`ProcessError`]: invalid input, unsupported
//! configuration, no signal (strict mode only) or cancellation.
//!
//! # Example
//!
//! ```
//! use scanclean::{CancelToken, Command, CommandParams, ParamMap, PixelLayout, Pipeline, RasterBuffer};
//!
//! let page = RasterBuffer::new_filled(320, 240, PixelLayout::Bgr, 235).unwrap();
//! let binarize = ParamMap::new().with("method", "Sauvola").with("windowSize", 31);
//!
//! let pipeline = Pipeline::new()
//!     .then_parsed(Command::Binarize, &binarize)
//!     .unwrap()
//!     .then(CommandParams::defaults(Command::Despeckle));
//! let out = pipeline.run(page, &CancelToken::none()).unwrap();
//! assert_eq!(out.page().unwrap().width(), 320);
//! ```

mod command;
mod process_error;
pub mod params;
mod pipeline;
mod processor;

pub use command::Command;
pub use process_error::{ProcessError, ProcessResult};
pub use params::{BinarizeCommand, CommandParams, ParamMap, ParamValue};
pub use pipeline::Pipeline;
pub use processor::{CommandOutput, ImageProcessor, NativeProcessor, run_command};

// Re-export core types (buffers, masks, geometry, cancellation)
pub use scanclean_core::*;

// Re-export the stage crates as modules to avoid name conflicts
pub use scanclean_color as binarize;
pub use scanclean_doc as doc;
pub use scanclean_filter as filter;
pub use scanclean_morph as morph;
pub use scanclean_recog as recog;
pub use scanclean_region as region;
pub use scanclean_transform as transform;
