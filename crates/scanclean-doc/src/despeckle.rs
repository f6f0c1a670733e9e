//! Speck removal
//!
//! Small marks are judged against the page's own text size: the median
//! height of the ink components (ignoring anything under
//! `min_reference_height`) is the reference. A component is a speck when
//! its ink area is below the small-area cutoff or its height is at most
//! `max_speck_height_fraction` of the reference.
//!
//! An optional pre-dilation merges touching dot clusters before labeling.
//! Areas and heights are always measured on the undilated ink, and only
//! true ink pixels are erased.

use crate::{DocError, DocResult};
use scanclean_color::otsu_ink_mask;
use scanclean_core::{BinaryMask, CancelToken, PointF, RasterBuffer, Rect, color, stats};
use scanclean_morph::dilate_brick;
use scanclean_region::{ConnectivityType, classify_labeled, label_components};
use tracing::{debug, warn};

// ============================================================================
// Settings
// ============================================================================

/// Pre-dilation applied before labeling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DespeckleKernel {
    #[default]
    None,
    /// 1 row by 3 columns
    Horizontal1x3,
    /// 3 rows by 1 column
    Vertical3x1,
    Square3x3,
}

impl DespeckleKernel {
    /// Brick size as (width, height).
    fn brick(self) -> Option<(u32, u32)> {
        match self {
            DespeckleKernel::None => None,
            DespeckleKernel::Horizontal1x3 => Some((3, 1)),
            DespeckleKernel::Vertical3x1 => Some((1, 3)),
            DespeckleKernel::Square3x3 => Some((3, 3)),
        }
    }
}

/// Area below which a component is a speck
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmallAreaCutoff {
    /// `multiplier * median_height^2`
    Relative { multiplier: f64 },
    /// Fixed pixel count
    Absolute(u32),
}

impl Default for SmallAreaCutoff {
    fn default() -> Self {
        SmallAreaCutoff::Relative { multiplier: 0.05 }
    }
}

impl SmallAreaCutoff {
    fn pixels(self, median_height: f64) -> f64 {
        match self {
            SmallAreaCutoff::Relative { multiplier } => multiplier * median_height * median_height,
            SmallAreaCutoff::Absolute(px) => px as f64,
        }
    }
}

/// Tests that keep a speck candidate which is likely punctuation.
///
/// Distances are in units of the median text height. Off by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionHeuristics {
    pub enabled: bool,
    /// Keep candidates within this distance of a text component's box
    /// (default: 0.5)
    pub near_text_factor: f64,
    /// Keep candidates inside a text component's vertical span and within
    /// this horizontal reach of it (default: 2.0)
    pub line_reach_factor: f64,
    /// Keep compact candidates with aspect ratio at most this
    /// (default: 1.5)...
    pub square_max_aspect: f64,
    /// ...and at least this many ink pixels (default: 4)
    pub square_min_area: u32,
    /// Neighborhood radius for clustering (default: 1.0)
    pub cluster_radius_factor: f64,
    /// Keep candidates with at least this many candidate neighbors
    /// (default: 3)
    pub cluster_min_neighbors: usize,
}

impl Default for RetentionHeuristics {
    fn default() -> Self {
        Self {
            enabled: false,
            near_text_factor: 0.5,
            line_reach_factor: 2.0,
            square_max_aspect: 1.5,
            square_min_area: 4,
            cluster_radius_factor: 1.0,
            cluster_min_neighbors: 3,
        }
    }
}

impl RetentionHeuristics {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }
}

/// Options for [`despeckle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DespeckleSettings {
    /// Pre-dilation (default: none)
    pub kernel: DespeckleKernel,
    pub cutoff: SmallAreaCutoff,
    /// Components at most this fraction of the median height are specks
    /// (default: 0.25)
    pub max_speck_height_fraction: f64,
    /// Components shorter than this do not count toward the median
    /// (default: 3)
    pub min_reference_height: u32,
    /// Paint removed pixels mid-gray instead of background
    pub debug_visualize: bool,
    pub retention: RetentionHeuristics,
    /// Fixed ink threshold; `None` uses Otsu with automatic polarity
    pub ink_threshold: Option<u8>,
}

impl Default for DespeckleSettings {
    fn default() -> Self {
        Self {
            kernel: DespeckleKernel::None,
            cutoff: SmallAreaCutoff::default(),
            max_speck_height_fraction: 0.25,
            min_reference_height: 3,
            debug_visualize: false,
            retention: RetentionHeuristics::default(),
            ink_threshold: None,
        }
    }
}

impl DespeckleSettings {
    pub fn with_kernel(mut self, kernel: DespeckleKernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_cutoff(mut self, cutoff: SmallAreaCutoff) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_max_speck_height_fraction(mut self, fraction: f64) -> Self {
        self.max_speck_height_fraction = fraction;
        self
    }

    pub fn with_debug_visualize(mut self, on: bool) -> Self {
        self.debug_visualize = on;
        self
    }

    pub fn with_retention(mut self, retention: RetentionHeuristics) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_ink_threshold(mut self, threshold: u8) -> Self {
        self.ink_threshold = Some(threshold);
        self
    }

    pub fn validate(&self) -> DocResult<()> {
        if let SmallAreaCutoff::Relative { multiplier } = self.cutoff
            && !(multiplier >= 0.0 && multiplier.is_finite())
        {
            return Err(DocError::InvalidParameters(format!(
                "speck area multiplier must be non-negative, got {multiplier}"
            )));
        }
        if !(0.0..=1.0).contains(&self.max_speck_height_fraction) {
            return Err(DocError::InvalidParameters(format!(
                "max_speck_height_fraction must be in [0, 1], got {}",
                self.max_speck_height_fraction
            )));
        }
        if self.min_reference_height == 0 {
            return Err(DocError::InvalidParameters(
                "min_reference_height must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Selection on a mask
// ============================================================================

/// Ink footprint of one labeled cluster.
#[derive(Debug, Clone, Copy)]
struct InkStats {
    area: u32,
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl InkStats {
    fn empty() -> Self {
        Self {
            area: 0,
            x0: u32::MAX,
            y0: u32::MAX,
            x1: 0,
            y1: 0,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.x0 = self.x0.min(x);
        self.y0 = self.y0.min(y);
        self.x1 = self.x1.max(x);
        self.y1 = self.y1.max(y);
    }

    fn height(&self) -> u32 {
        if self.area == 0 { 0 } else { self.y1 - self.y0 + 1 }
    }

    fn width(&self) -> u32 {
        if self.area == 0 { 0 } else { self.x1 - self.x0 + 1 }
    }

    fn rect(&self) -> Rect {
        Rect::from_inclusive(self.x0 as i32, self.y0 as i32, self.x1 as i32, self.y1 as i32)
    }

    fn center(&self) -> PointF {
        PointF::new(
            (self.x0 + self.x1) as f64 / 2.0,
            (self.y0 + self.y1) as f64 / 2.0,
        )
    }
}

/// Specks found in an ink mask.
#[derive(Debug, Clone)]
pub struct SpeckSelection {
    /// Ink pixels to erase
    pub mask: BinaryMask,
    pub removed_components: usize,
    /// Reference text height; `None` when nothing was tall enough
    pub median_height: Option<f64>,
    pub retained: usize,
}

fn distance_to_rect(p: PointF, r: &Rect) -> f64 {
    let dx = (r.x as f64 - p.x).max(p.x - (r.right() - 1) as f64).max(0.0);
    let dy = (r.y as f64 - p.y).max(p.y - (r.bottom() - 1) as f64).max(0.0);
    dx.hypot(dy)
}

/// Which candidates the retention tests keep.
fn retained_candidates(
    ink: &[InkStats],
    candidate: &[bool],
    median: f64,
    rules: &RetentionHeuristics,
    cancel: &CancelToken,
) -> DocResult<Vec<bool>> {
    let text: Vec<Rect> = ink
        .iter()
        .zip(candidate)
        .filter(|(s, c)| !**c && s.area > 0)
        .map(|(s, _)| s.rect())
        .collect();
    let centers: Vec<(usize, PointF)> = candidate
        .iter()
        .enumerate()
        .filter(|(_, c)| **c)
        .map(|(i, _)| (i, ink[i].center()))
        .collect();

    let mut keep = vec![false; ink.len()];
    for &(i, p) in &centers {
        cancel.check()?;
        let s = &ink[i];
        let near_text = text
            .iter()
            .any(|r| distance_to_rect(p, r) <= rules.near_text_factor * median);
        let on_line = text.iter().any(|r| {
            let inside_span = p.y >= r.y as f64 && p.y < r.bottom() as f64;
            let gap = (r.x as f64 - p.x).max(p.x - (r.right() - 1) as f64).max(0.0);
            inside_span && gap <= rules.line_reach_factor * median
        });
        let (w, h) = (s.width().max(1) as f64, s.height().max(1) as f64);
        let squarish = s.area >= rules.square_min_area && w.max(h) / w.min(h) <= rules.square_max_aspect;
        let radius = rules.cluster_radius_factor * median;
        let neighbors = centers
            .iter()
            .filter(|&&(j, q)| j != i && p.distance(&q) <= radius)
            .count();
        let clustered = neighbors >= rules.cluster_min_neighbors;
        keep[i] = near_text || on_line || squarish || clustered;
    }
    Ok(keep)
}

/// Select the specks of an ink mask.
///
/// Polls `cancel` per row while labeling and gathering ink statistics, and
/// per component while selecting.
pub fn select_specks(
    ink: &BinaryMask,
    settings: &DespeckleSettings,
    cancel: &CancelToken,
) -> DocResult<SpeckSelection> {
    settings.validate()?;
    let clusters = match settings.kernel.brick() {
        Some((bw, bh)) => dilate_brick(ink, bw, bh)?,
        None => ink.clone(),
    };
    let labeling = label_components(&clusters, ConnectivityType::EightWay, cancel)?;

    let mut stats_by_label = vec![InkStats::empty(); labeling.components().len()];
    for y in 0..ink.height() {
        cancel.check()?;
        for (x, &v) in ink.row(y).iter().enumerate() {
            if v == 0 {
                continue;
            }
            let label = labeling.label_at(x as u32, y);
            if label > 0 {
                stats_by_label[label as usize - 1].add(x as u32, y);
            }
        }
    }

    let heights: Vec<f64> = stats_by_label
        .iter()
        .map(InkStats::height)
        .filter(|&h| h >= settings.min_reference_height)
        .map(f64::from)
        .collect();
    let Some(median) = stats::median(&heights) else {
        warn!(
            components = stats_by_label.len(),
            "no component tall enough to size text; nothing removed"
        );
        return Ok(SpeckSelection {
            mask: BinaryMask::new(ink.width(), ink.height())?,
            removed_components: 0,
            median_height: None,
            retained: 0,
        });
    };

    let area_cutoff = settings.cutoff.pixels(median);
    let max_height = settings.max_speck_height_fraction * median;
    let candidate: Vec<bool> = stats_by_label
        .iter()
        .map(|s| s.area > 0 && ((s.area as f64) < area_cutoff || s.height() as f64 <= max_height))
        .collect();
    let retained = if settings.retention.enabled {
        retained_candidates(&stats_by_label, &candidate, median, &settings.retention, cancel)?
    } else {
        vec![false; candidate.len()]
    };

    let selection = classify_labeled(&labeling, cancel, |_, rec| {
        let i = rec.label as usize - 1;
        Ok(candidate[i] && !retained[i])
    })?;
    let mask = selection.mask.and(ink)?;
    let retained = retained.iter().filter(|&&r| r).count();
    debug!(
        median_height = median,
        area_cutoff,
        max_height,
        removed = selection.selected.len(),
        retained,
        "speck selection"
    );
    Ok(SpeckSelection {
        mask,
        removed_components: selection.selected.len(),
        median_height: Some(median),
        retained,
    })
}

// ============================================================================
// Image entry point
// ============================================================================

/// Result of [`despeckle`]
#[derive(Debug, Clone, PartialEq)]
pub struct DespeckleOutcome {
    pub image: RasterBuffer,
    pub removed_components: usize,
    pub removed_pixels: usize,
    pub median_height: Option<f64>,
    /// Ink was lighter than the background
    pub inverted: bool,
}

/// Ink mask of `src` with ink as foreground, plus whether the page is
/// light-on-dark.
pub fn ink_mask(src: &RasterBuffer, threshold: Option<u8>) -> DocResult<(BinaryMask, bool)> {
    let mask = match threshold {
        Some(t) => BinaryMask::from_predicate(&src.to_gray(), |v| v <= t)?,
        None => otsu_ink_mask(src)?,
    };
    let total = mask.width() as usize * mask.height() as usize;
    if mask.count() * 2 > total {
        Ok((mask.invert(), true))
    } else {
        Ok((mask, false))
    }
}

/// Remove specks from a page.
pub fn despeckle(
    src: &RasterBuffer,
    settings: &DespeckleSettings,
    cancel: &CancelToken,
) -> DocResult<DespeckleOutcome> {
    settings.validate()?;
    src.ensure_not_empty("despeckle input")?;
    let (ink, inverted) = ink_mask(src, settings.ink_threshold)?;
    let selection = select_specks(&ink, settings, cancel)?;

    let mut image = src.clone();
    let removed_pixels = selection.mask.count();
    if removed_pixels > 0 {
        let paint = if settings.debug_visualize {
            color::MID_GRAY
        } else if inverted {
            color::BLACK
        } else {
            color::WHITE
        };
        image.fill_masked(&selection.mask, &paint[..src.channels()])?;
    }
    Ok(DespeckleOutcome {
        image,
        removed_components: selection.removed_components,
        removed_pixels,
        median_height: selection.median_height,
        inverted,
    })
}
