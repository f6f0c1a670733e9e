//! Component classification
//!
//! Label a mask, ask a predicate about every component in label order and
//! union the accepted ones into a selection mask. This is the shared engine
//! behind border, speck and hole detection.

use crate::conncomp::{ComponentRecord, ConnectivityType, Labeling, label_components};
use crate::RegionResult;
use scanclean_core::{BinaryMask, CancelToken};

/// Components accepted by a predicate.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Union of the accepted components
    pub mask: BinaryMask,
    /// Accepted records, in label order
    pub selected: Vec<ComponentRecord>,
    /// Number of components inspected
    pub inspected: usize,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Select the components of `mask` for which `predicate` returns true.
///
/// Polls `cancel` once per component.
pub fn classify(
    mask: &BinaryMask,
    connectivity: ConnectivityType,
    cancel: &CancelToken,
    mut predicate: impl FnMut(&ComponentRecord) -> bool,
) -> RegionResult<BinaryMask> {
    Ok(classify_detailed(mask, connectivity, cancel, |_, rec| Ok(predicate(rec)))?.mask)
}

/// Like [`classify`], but the predicate also sees the label map (to walk a
/// component's pixels) and may fail.
pub fn classify_detailed(
    mask: &BinaryMask,
    connectivity: ConnectivityType,
    cancel: &CancelToken,
    predicate: impl FnMut(&Labeling, &ComponentRecord) -> RegionResult<bool>,
) -> RegionResult<Selection> {
    let labeling = label_components(mask, connectivity, cancel)?;
    classify_labeled(&labeling, cancel, predicate)
}

/// Run the selection over an existing labeling.
///
/// Lets a caller gather statistics over all components before deciding.
pub fn classify_labeled(
    labeling: &Labeling,
    cancel: &CancelToken,
    mut predicate: impl FnMut(&Labeling, &ComponentRecord) -> RegionResult<bool>,
) -> RegionResult<Selection> {
    let mut out = BinaryMask::new(labeling.width(), labeling.height())?;
    let mut selected = Vec::new();
    for rec in labeling.components() {
        cancel.check()?;
        if predicate(labeling, rec)? {
            labeling.paint(rec, &mut out);
            selected.push(*rec);
        }
    }
    Ok(Selection {
        mask: out,
        selected,
        inspected: labeling.components().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanclean_core::Rect;

    fn two_blobs() -> BinaryMask {
        let mut m = BinaryMask::new(20, 10).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                m.set_unchecked(x, y, true);
            }
        }
        for y in 5..7 {
            for x in 10..12 {
                m.set_unchecked(x, y, true);
            }
        }
        m
    }

    #[test]
    fn test_select_edge_touching() {
        let m = two_blobs();
        let sel = classify(&m, ConnectivityType::EightWay, &CancelToken::none(), |r| {
            r.touches.any()
        })
        .unwrap();
        assert_eq!(sel.count(), 16);
        assert_eq!(sel.bounding_box(), Some(Rect::new_unchecked(0, 0, 4, 4)));
    }

    #[test]
    fn test_detailed_reports_inspected() {
        let m = two_blobs();
        let sel = classify_detailed(&m, ConnectivityType::EightWay, &CancelToken::none(), |_, r| {
            Ok(r.area < 10)
        })
        .unwrap();
        assert_eq!(sel.inspected, 2);
        assert_eq!(sel.selected.len(), 1);
        assert_eq!(sel.mask.count(), 4);
    }

    #[test]
    fn test_reject_all_is_blank() {
        let sel = classify(&two_blobs(), ConnectivityType::EightWay, &CancelToken::none(), |_| false)
            .unwrap();
        assert!(sel.is_blank());
    }
}
