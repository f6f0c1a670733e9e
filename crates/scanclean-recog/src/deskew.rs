//! Applying a skew estimate
//!
//! The page is rotated onto a canvas large enough to hold every source
//! pixel. The canvas is either kept, or cropped back to the original size
//! around the bounding box of whatever is not background.

use crate::skew::{SkewMethod, SkewOptions, estimate_skew};
use crate::{RecogError, RecogResult};
use scanclean_core::{BinaryMask, CancelToken, RasterBuffer, Rect};
use scanclean_transform::{RotateFill, RotateMethod, RotateOptions, rotate};
use tracing::{debug, warn};

/// Gray distance from the fill color that counts as content when cropping.
const CONTENT_DISTANCE: u8 = 32;

/// Options for [`deskew`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeskewOptions {
    /// Estimator (default: Auto)
    pub method: SkewMethod,
    pub skew: SkewOptions,
    /// Return the grown canvas instead of cropping to the original size
    /// (default: false)
    pub keep_canvas: bool,
    /// Interpolation (default: bilinear)
    pub rotate_method: RotateMethod,
}

impl DeskewOptions {
    pub fn new(method: SkewMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_skew(mut self, skew: SkewOptions) -> Self {
        self.skew = skew;
        self
    }

    pub fn with_keep_canvas(mut self, keep: bool) -> Self {
        self.keep_canvas = keep;
        self
    }

    pub fn with_rotate_method(mut self, method: RotateMethod) -> Self {
        self.rotate_method = method;
        self
    }
}

/// Result of [`deskew`]
#[derive(Debug, Clone, PartialEq)]
pub struct DeskewOutcome {
    pub image: RasterBuffer,
    /// Corrective angle found, if any
    pub angle: Option<f64>,
    /// Estimator that produced `angle`
    pub method: Option<SkewMethod>,
    /// Whether `image` was rotated
    pub rotated: bool,
}

/// Canvas fill expected by the stage after each estimator.
pub fn background_for(method: SkewMethod) -> RotateFill {
    match method {
        SkewMethod::ByBorders => RotateFill::Black,
        _ => RotateFill::White,
    }
}

/// Mask of pixels whose intensity differs from `fill` by more than
/// [`CONTENT_DISTANCE`].
fn content_mask(img: &RasterBuffer, fill: RotateFill) -> RecogResult<BinaryMask> {
    let [b, g, r, _] = fill.color();
    let bg = scanclean_core::luma(b, g, r);
    Ok(BinaryMask::from_predicate(&img.to_gray(), |v| {
        v.abs_diff(bg) > CONTENT_DISTANCE
    })?)
}

/// Rotate `src` by `angle_deg` on a grown canvas.
///
/// Unless `keep_canvas` is set the result is cropped back to the source
/// size, centered on the content. When no content is found the grown
/// canvas is returned as is.
pub fn rotate_page(
    src: &RasterBuffer,
    angle_deg: f64,
    fill: RotateFill,
    method: RotateMethod,
    keep_canvas: bool,
) -> RecogResult<RasterBuffer> {
    let options = RotateOptions::default()
        .with_method(method)
        .with_fill(fill)
        .with_expand(true);
    let canvas = rotate(src, angle_deg, &options)?;
    if keep_canvas {
        return Ok(canvas);
    }
    let Some(bbox) = content_mask(&canvas, fill)?.bounding_box() else {
        warn!("no content after rotation; keeping the grown canvas");
        return Ok(canvas);
    };
    let w = src.width().min(canvas.width()) as i32;
    let h = src.height().min(canvas.height()) as i32;
    let center = bbox.center();
    let x = (center.x.round() as i32 - w / 2).clamp(0, canvas.width() as i32 - w);
    let y = (center.y.round() as i32 - h / 2).clamp(0, canvas.height() as i32 - h);
    Ok(canvas.crop(&Rect::new_unchecked(x, y, w, h))?)
}

/// Estimate the skew of `src` and straighten it.
///
/// Returns a clone when no estimate is found or the angle falls inside the
/// estimator's deadband.
///
/// # Errors
///
/// Fails on an empty input, invalid options or cancellation.
pub fn deskew(src: &RasterBuffer, options: &DeskewOptions, cancel: &CancelToken) -> RecogResult<DeskewOutcome> {
    if src.is_empty() {
        return Err(RecogError::Core(scanclean_core::Error::EmptyInput("deskew input")));
    }
    let Some(est) = estimate_skew(src, options.method, &options.skew, cancel)? else {
        warn!(method = %options.method, "no skew estimate; page left unchanged");
        return Ok(DeskewOutcome {
            image: src.clone(),
            angle: None,
            method: None,
            rotated: false,
        });
    };
    cancel.check()?;
    if est.angle.abs() < est.method.deadband() {
        debug!(angle = est.angle, method = %est.method, "skew inside deadband");
        return Ok(DeskewOutcome {
            image: src.clone(),
            angle: Some(est.angle),
            method: Some(est.method),
            rotated: false,
        });
    }
    let fill = background_for(options.method);
    let image = rotate_page(src, est.angle, fill, options.rotate_method, options.keep_canvas)?;
    debug!(
        angle = est.angle,
        method = %est.method,
        width = image.width(),
        height = image.height(),
        "deskewed"
    );
    Ok(DeskewOutcome {
        image,
        angle: Some(est.angle),
        method: Some(est.method),
        rotated: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::{ErrorKind, PixelLayout};

    #[test]
    fn test_rotate_page_keeps_size() {
        let mut page = RasterBuffer::new_filled(120, 80, PixelLayout::Gray, 255).unwrap();
        page.fill_rect(&Rect::new_unchecked(30, 30, 60, 8), &[0]);
        let out = rotate_page(&page, 5.0, RotateFill::White, RotateMethod::Bilinear, false).unwrap();
        assert_eq!((out.width(), out.height()), (120, 80));
        let grown = rotate_page(&page, 5.0, RotateFill::White, RotateMethod::Bilinear, true).unwrap();
        assert!(grown.width() > 120 && grown.height() > 80);
    }

    #[test]
    fn test_blank_page_keeps_canvas() {
        let page = RasterBuffer::new_filled(50, 40, PixelLayout::Gray, 255).unwrap();
        let out = rotate_page(&page, 10.0, RotateFill::White, RotateMethod::Bilinear, false).unwrap();
        assert!(out.width() > 50);
    }

    #[test]
    fn test_deskew_blank_is_noop() {
        let page = RasterBuffer::new_filled(80, 60, PixelLayout::Gray, 240).unwrap();
        let out = deskew(&page, &DeskewOptions::new(SkewMethod::Projection), &CancelToken::none()).unwrap();
        assert!(!out.rotated);
        assert_eq!(out.image, page);
        assert_eq!(out.angle, None);
    }

    #[test]
    fn test_deskew_empty_input() {
        let err = deskew(&RasterBuffer::empty(), &DeskewOptions::default(), &CancelToken::none()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_border_background_is_black() {
        assert_eq!(background_for(SkewMethod::ByBorders), RotateFill::Black);
        assert_eq!(background_for(SkewMethod::Pca), RotateFill::White);
    }
}
