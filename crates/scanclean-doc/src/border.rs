//! Border artifact removal
//!
//! Dark regions along the page edges (scanner lid shadow, the bed around a
//! small page, binder strips) are found as connected components of a dark
//! mask that touch an image edge and look like artifacts rather than text.
//!
//! # Selection
//!
//! A dark component is an artifact when it touches an edge and any of:
//!
//! - its area is at least `min_area_fraction` of the page
//! - its solidity is at least `solidity_threshold`
//! - it runs along a touched edge for `min_span_fraction` of that edge
//! - it reaches `min_depth_fraction * min(W, H)` into the page
//! - it touches two opposite edges
//!
//! # Repair
//!
//! The selection is dilated by `feather_px`. [`BorderRepair::Crop`] then
//! trims every outer row and column that holds nothing but artifact and
//! paints what is left of the artifact inside the crop with the page
//! background. [`BorderRepair::Fill`] only paints.

use crate::{DocError, DocResult};
use scanclean_color::compute_otsu_threshold;
use scanclean_core::{BinaryMask, CancelToken, RasterBuffer, Rect, color};
use scanclean_morph::dilate_brick;
use scanclean_region::{ComponentRecord, ConnectivityType, Labeling, Selection, classify_detailed};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

// ============================================================================
// Options
// ============================================================================

/// How artifacts are located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderRemovalAlgorithm {
    /// Dark threshold from Otsu, capped by the configured threshold
    #[default]
    Auto,
    /// Configured dark threshold as is
    ByContrast,
    /// Crop fixed margins
    Manual,
}

impl BorderRemovalAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            BorderRemovalAlgorithm::Auto => "Auto",
            BorderRemovalAlgorithm::ByContrast => "ByContrast",
            BorderRemovalAlgorithm::Manual => "Manual",
        }
    }
}

impl fmt::Display for BorderRemovalAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BorderRemovalAlgorithm {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Auto" => Ok(BorderRemovalAlgorithm::Auto),
            "ByContrast" => Ok(BorderRemovalAlgorithm::ByContrast),
            "Manual" => Ok(BorderRemovalAlgorithm::Manual),
            other => Err(DocError::UnsupportedMethod(format!(
                "border removal algorithm '{other}'"
            ))),
        }
    }
}

/// What happens to the selected artifact pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderRepair {
    /// Crop to the artifact-free region, then paint any residue
    #[default]
    Crop,
    /// Paint the artifact with the background color, keep the size
    Fill,
}

/// Margins cut by [`BorderRemovalAlgorithm::Manual`], in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManualMargins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl ManualMargins {
    pub fn uniform(px: u32) -> Self {
        Self {
            left: px,
            top: px,
            right: px,
            bottom: px,
        }
    }
}

/// Options for [`remove_borders`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderOptions {
    /// Detection algorithm (default: Auto)
    pub algorithm: BorderRemovalAlgorithm,
    /// Gray level at or below which a pixel is dark (default: 60)
    pub dark_threshold: u8,
    /// Area, as a fraction of the page, that alone marks an artifact
    /// (default: 0.002)
    pub min_area_fraction: f64,
    /// Solidity that alone marks an artifact (default: 0.6)
    pub solidity_threshold: f64,
    /// Run along a touched edge, as a fraction of that edge (default: 0.5)
    pub min_span_fraction: f64,
    /// Inward reach, as a fraction of `min(W, H)` (default: 0.05)
    pub min_depth_fraction: f64,
    /// Dilation applied to the selection (default: 2)
    pub feather_px: u32,
    /// Repair mode (default: crop)
    pub repair: BorderRepair,
    /// Margins for the manual algorithm
    pub margins: ManualMargins,
}

impl Default for BorderOptions {
    fn default() -> Self {
        Self {
            algorithm: BorderRemovalAlgorithm::Auto,
            dark_threshold: 60,
            min_area_fraction: 0.002,
            solidity_threshold: 0.6,
            min_span_fraction: 0.5,
            min_depth_fraction: 0.05,
            feather_px: 2,
            repair: BorderRepair::Crop,
            margins: ManualMargins::default(),
        }
    }
}

impl BorderOptions {
    pub fn new(algorithm: BorderRemovalAlgorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }

    pub fn with_dark_threshold(mut self, threshold: u8) -> Self {
        self.dark_threshold = threshold;
        self
    }

    pub fn with_min_area_fraction(mut self, fraction: f64) -> Self {
        self.min_area_fraction = fraction;
        self
    }

    pub fn with_solidity_threshold(mut self, threshold: f64) -> Self {
        self.solidity_threshold = threshold;
        self
    }

    pub fn with_min_span_fraction(mut self, fraction: f64) -> Self {
        self.min_span_fraction = fraction;
        self
    }

    pub fn with_min_depth_fraction(mut self, fraction: f64) -> Self {
        self.min_depth_fraction = fraction;
        self
    }

    pub fn with_feather(mut self, px: u32) -> Self {
        self.feather_px = px;
        self
    }

    pub fn with_repair(mut self, repair: BorderRepair) -> Self {
        self.repair = repair;
        self
    }

    pub fn with_margins(mut self, margins: ManualMargins) -> Self {
        self.margins = margins;
        self
    }

    pub fn validate(&self) -> DocResult<()> {
        let fractions = [
            ("min_area_fraction", self.min_area_fraction),
            ("solidity_threshold", self.solidity_threshold),
            ("min_span_fraction", self.min_span_fraction),
            ("min_depth_fraction", self.min_depth_fraction),
        ];
        for (name, v) in fractions {
            if !(0.0..=1.0).contains(&v) {
                return Err(DocError::InvalidParameters(format!(
                    "{name} must be in [0, 1], got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Result of [`remove_borders`]
#[derive(Debug, Clone, PartialEq)]
pub struct BorderOutcome {
    pub image: RasterBuffer,
    /// Number of artifact components selected
    pub removed_components: usize,
    /// Crop applied, in source coordinates
    pub crop: Option<Rect>,
    /// Dark threshold used for detection
    pub threshold: Option<u8>,
}

impl BorderOutcome {
    fn untouched(src: &RasterBuffer, threshold: Option<u8>) -> Self {
        Self {
            image: src.clone(),
            removed_components: 0,
            crop: None,
            threshold,
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Largest distance, over the component's pixels, to the nearest edge the
/// component touches.
fn inward_depth(labeling: &Labeling, rec: &ComponentRecord) -> u32 {
    let (w, h) = (labeling.width(), labeling.height());
    let t = rec.touches;
    let mut depth = 0u32;
    for (x, y) in labeling.pixels(rec) {
        let mut d = u32::MAX;
        if t.left {
            d = d.min(x);
        }
        if t.top {
            d = d.min(y);
        }
        if t.right {
            d = d.min(w - 1 - x);
        }
        if t.bottom {
            d = d.min(h - 1 - y);
        }
        if d != u32::MAX {
            depth = depth.max(d);
        }
    }
    depth
}

fn is_artifact(labeling: &Labeling, rec: &ComponentRecord, options: &BorderOptions) -> bool {
    let t = rec.touches;
    if !t.any() {
        return false;
    }
    let (w, h) = (labeling.width() as f64, labeling.height() as f64);
    let min_area = options.min_area_fraction * w * h;
    if rec.area as f64 >= min_area || t.opposite() {
        return true;
    }
    if rec.solidity() >= options.solidity_threshold {
        return true;
    }
    let horizontal_span = (t.top || t.bottom) && rec.width() as f64 >= options.min_span_fraction * w;
    let vertical_span = (t.left || t.right) && rec.height() as f64 >= options.min_span_fraction * h;
    if horizontal_span || vertical_span {
        return true;
    }
    let min_depth = options.min_depth_fraction * w.min(h);
    inward_depth(labeling, rec) as f64 >= min_depth
}

/// Select the edge-touching dark components of `gray` that look like
/// border artifacts.
///
/// Pixels at or below `threshold` are dark. Polls `cancel` per row while
/// labeling and per component while classifying.
pub fn detect_border_artifacts(
    gray: &RasterBuffer,
    threshold: u8,
    options: &BorderOptions,
    cancel: &CancelToken,
) -> DocResult<Selection> {
    options.validate()?;
    let dark = BinaryMask::from_predicate(gray, |v| v <= threshold)?;
    let selection = classify_detailed(&dark, ConnectivityType::EightWay, cancel, |lab, rec| {
        Ok(is_artifact(lab, rec, options))
    })?;
    Ok(selection)
}

/// Detection threshold for an algorithm.
pub fn dark_threshold_for(src: &RasterBuffer, options: &BorderOptions) -> DocResult<u8> {
    match options.algorithm {
        BorderRemovalAlgorithm::Auto => {
            Ok(compute_otsu_threshold(src)?.min(options.dark_threshold))
        }
        _ => Ok(options.dark_threshold),
    }
}

// ============================================================================
// Repair
// ============================================================================

/// Mean color of the corner patches brighter than `threshold`; white when
/// every corner is dark.
pub fn estimate_background(src: &RasterBuffer, threshold: u8) -> [u8; 4] {
    let (w, h) = (src.width() as i32, src.height() as i32);
    if w == 0 || h == 0 {
        return color::WHITE;
    }
    let size = (w.min(h) / 20).max(4).min(w.min(h));
    let corners = [
        Rect::new_unchecked(0, 0, size, size),
        Rect::new_unchecked(w - size, 0, size, size),
        Rect::new_unchecked(0, h - size, size, size),
        Rect::new_unchecked(w - size, h - size, size, size),
    ];
    let gray = src.to_gray();
    let c = src.channels();
    let mut sum = [0f64; 4];
    let mut used = 0u32;
    for corner in &corners {
        let bright = gray
            .mean_in_rect(corner)
            .is_some_and(|m| m > threshold as f64);
        if !bright {
            continue;
        }
        let mut acc = [0f64; 4];
        for y in corner.y..corner.bottom() {
            for x in corner.x..corner.right() {
                for (ch, v) in src.pixel(x as u32, y as u32).iter().enumerate() {
                    acc[ch] += *v as f64;
                }
            }
        }
        let n = corner.area() as f64;
        for ch in 0..c {
            sum[ch] += acc[ch] / n;
        }
        used += 1;
    }
    if used == 0 {
        return color::WHITE;
    }
    let mut out = color::WHITE;
    for ch in 0..c {
        out[ch] = (sum[ch] / used as f64).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Largest rectangle left after trimming every outer row and column that
/// is entirely artifact. `None` when nothing but artifact remains.
pub fn content_crop_rect(artifact: &BinaryMask) -> Option<Rect> {
    let clean = artifact.invert();
    let rows = clean.row_counts();
    let cols = clean.column_counts();
    let top = rows.iter().position(|&n| n > 0)?;
    let bottom = rows.iter().rposition(|&n| n > 0)?;
    let left = cols.iter().position(|&n| n > 0)?;
    let right = cols.iter().rposition(|&n| n > 0)?;
    Some(Rect::from_inclusive(left as i32, top as i32, right as i32, bottom as i32))
}

fn crop_margins(src: &RasterBuffer, margins: &ManualMargins) -> DocResult<RasterBuffer> {
    let (w, h) = (src.width(), src.height());
    let horizontal = margins.left as u64 + margins.right as u64;
    let vertical = margins.top as u64 + margins.bottom as u64;
    if horizontal >= w as u64 || vertical >= h as u64 {
        return Err(DocError::InvalidParameters(format!(
            "margins {margins:?} leave nothing of a {w}x{h} page"
        )));
    }
    let rect = Rect::new_unchecked(
        margins.left as i32,
        margins.top as i32,
        (w as u64 - horizontal) as i32,
        (h as u64 - vertical) as i32,
    );
    Ok(src.crop(&rect)?)
}

/// Remove dark border artifacts from a page.
///
/// Returns the page untouched when no artifact is selected, or when the
/// artifacts cover every row or column (nothing would remain of the page).
pub fn remove_borders(
    src: &RasterBuffer,
    options: &BorderOptions,
    cancel: &CancelToken,
) -> DocResult<BorderOutcome> {
    options.validate()?;
    src.ensure_not_empty("border removal input")?;

    if options.algorithm == BorderRemovalAlgorithm::Manual {
        let image = crop_margins(src, &options.margins)?;
        let m = options.margins;
        let crop = Rect::new_unchecked(
            m.left as i32,
            m.top as i32,
            image.width() as i32,
            image.height() as i32,
        );
        return Ok(BorderOutcome {
            image,
            removed_components: 0,
            crop: Some(crop),
            threshold: None,
        });
    }

    let gray = src.to_gray();
    let threshold = dark_threshold_for(&gray, options)?;
    let selection = detect_border_artifacts(&gray, threshold, options, cancel)?;
    debug!(
        threshold,
        inspected = selection.inspected,
        selected = selection.selected.len(),
        "border artifacts"
    );
    if selection.is_empty() {
        return Ok(BorderOutcome::untouched(src, Some(threshold)));
    }

    let feather = options.feather_px;
    let artifact = if feather > 0 {
        dilate_brick(&selection.mask, 2 * feather + 1, 2 * feather + 1)?
    } else {
        selection.mask
    };
    let background = estimate_background(src, threshold);
    let fill = &background[..src.channels()];

    let (image, crop) = match options.repair {
        BorderRepair::Fill => {
            let mut out = src.clone();
            out.fill_masked(&artifact, fill)?;
            (out, None)
        }
        BorderRepair::Crop => {
            let Some(rect) = content_crop_rect(&artifact) else {
                warn!("border artifacts cover the whole page; leaving it untouched");
                return Ok(BorderOutcome::untouched(src, Some(threshold)));
            };
            let mut out = src.crop(&rect)?;
            let residue = artifact.crop(&rect)?;
            out.fill_masked(&residue, fill)?;
            (out, Some(rect))
        }
    };
    Ok(BorderOutcome {
        image,
        removed_components: selection.selected.len(),
        crop,
        threshold: Some(threshold),
    })
}
