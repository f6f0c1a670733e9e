//! scanclean-region - connected components and contours
//!
//! - [`conncomp`]: two-pass labeling, [`ComponentRecord`] geometry
//! - [`classify`]: predicate-driven component selection
//! - [`contour`]: outer border tracing
//! - [`shape`]: convex hull, minimum-area rectangle, polygon simplification
//!
//! # Example
//!
//! ```
//! use scanclean_core::{BinaryMask, CancelToken};
//! use scanclean_region::{ConnectivityType, classify};
//!
//! let mut mask = BinaryMask::new(50, 50).unwrap();
//! mask.set(0, 10, true);
//! mask.set(25, 25, true);
//!
//! let touching = classify(&mask, ConnectivityType::EightWay, &CancelToken::none(), |c| {
//!     c.touches.any()
//! })
//! .unwrap();
//! assert_eq!(touching.count(), 1);
//! ```

pub mod classify;
pub mod conncomp;
pub mod contour;
mod error;
pub mod shape;

pub use classify::{Selection, classify, classify_detailed, classify_labeled};
pub use conncomp::{
    ComponentRecord, ConnectivityType, EdgeTouch, Labeling, find_components, label_components,
};
pub use contour::{Contour, find_external_contours, largest_external_contour};
pub use error::{RegionError, RegionResult};
pub use shape::{approx_poly_closed, arc_length, convex_hull, min_area_rect, polygon_area};
