//! scanclean-filter - image filters used by the restoration stages
//!
//! - [`windowed`]: integral images, local mean and standard deviation
//! - [`convolve`]: Gaussian blur (exact kernel or three box passes)
//! - [`enhance`]: CLAHE local contrast
//! - [`edge`]: Sobel gradients and Canny edges
//! - [`retinex`]: homomorphic illumination normalization
//! - [`inpaint`]: mask-guided hole filling

pub mod convolve;
pub mod edge;
pub mod enhance;
mod error;
pub mod inpaint;
mod plane;
pub mod retinex;
pub mod windowed;

pub use convolve::{gaussian_blur, gaussian_blur_plane, gaussian_kernel};
pub use edge::{Gradients, canny, sobel};
pub use enhance::{ClaheOptions, clahe};
pub use error::{FilterError, FilterResult};
pub use inpaint::inpaint;
pub use plane::FloatPlane;
pub use retinex::{RetinexNormalization, RetinexOptions, homomorphic_retinex};
pub use windowed::{IntegralImage, box_mean, box_mean_std};
