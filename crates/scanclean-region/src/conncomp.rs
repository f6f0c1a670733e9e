//! Connected component labeling
//!
//! Two-pass labeling with a union-find table. Labels are compacted to
//! 1..N in raster order of each component's first pixel; 0 is background.
//! The label map lives only inside a [`Labeling`] and is dropped with it.

use crate::RegionResult;
use scanclean_core::{BinaryMask, CancelToken, Rect};

/// Connectivity type for component analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 4-way connectivity (up, down, left, right)
    FourWay,
    /// 8-way connectivity (includes diagonals)
    #[default]
    EightWay,
}

/// Which image edges a component touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeTouch {
    pub left: bool,
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
}

impl EdgeTouch {
    pub fn any(&self) -> bool {
        self.left || self.top || self.right || self.bottom
    }

    /// Touches left and right, or top and bottom.
    pub fn opposite(&self) -> bool {
        (self.left && self.right) || (self.top && self.bottom)
    }

    pub fn count(&self) -> usize {
        [self.left, self.top, self.right, self.bottom]
            .iter()
            .filter(|&&t| t)
            .count()
    }
}

/// Geometry of one connected component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentRecord {
    /// Label id, 1..N
    pub label: u32,
    /// Tight bounding box
    pub bounds: Rect,
    /// Pixel count
    pub area: u32,
    /// Image edges touched by the bounding box
    pub touches: EdgeTouch,
}

impl ComponentRecord {
    /// Area divided by bounding-box area.
    pub fn solidity(&self) -> f64 {
        let bbox = self.bounds.area();
        if bbox == 0 {
            0.0
        } else {
            self.area as f64 / bbox as f64
        }
    }

    pub fn width(&self) -> u32 {
        self.bounds.w as u32
    }

    pub fn height(&self) -> u32 {
        self.bounds.h as u32
    }
}

/// Union-find over provisional labels.
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self { parent: vec![0] }
    }

    fn make(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut a: u32) -> u32 {
        while self.parent[a as usize] != a {
            let grand = self.parent[self.parent[a as usize] as usize];
            self.parent[a as usize] = grand;
            a = grand;
        }
        a
    }

    fn union(&mut self, a: u32, b: u32) -> u32 {
        let (ra, rb) = (self.find(a), self.find(b));
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi as usize] = lo;
        lo
    }
}

/// Label map plus per-component records for one mask.
pub struct Labeling {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    components: Vec<ComponentRecord>,
}

impl Labeling {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Records in label order; `components()[i].label == i + 1`.
    pub fn components(&self) -> &[ComponentRecord] {
        &self.components
    }

    pub fn into_components(self) -> Vec<ComponentRecord> {
        self.components
    }

    /// Label at a pixel (0 for background).
    #[inline]
    pub fn label_at(&self, x: u32, y: u32) -> u32 {
        self.labels[y as usize * self.width as usize + x as usize]
    }

    /// Pixels of one component, scanned within its bounding box.
    pub fn pixels<'a>(&'a self, record: &'a ComponentRecord) -> impl Iterator<Item = (u32, u32)> + 'a {
        let b = record.bounds;
        (b.y..b.bottom()).flat_map(move |y| {
            (b.x..b.right())
                .filter(move |&x| self.label_at(x as u32, y as u32) == record.label)
                .map(move |x| (x as u32, y as u32))
        })
    }

    /// Paint one component into `mask`.
    pub fn paint(&self, record: &ComponentRecord, mask: &mut BinaryMask) {
        for (x, y) in self.pixels(record) {
            mask.set_unchecked(x, y, true);
        }
    }
}

/// Label the foreground of `mask`.
///
/// Polls `cancel` once per row in each pass.
pub fn label_components(
    mask: &BinaryMask,
    connectivity: ConnectivityType,
    cancel: &CancelToken,
) -> RegionResult<Labeling> {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let mut labels = vec![0u32; w * h];
    let mut uf = UnionFind::new();

    for y in 0..h {
        cancel.check()?;
        let row = mask.row(y as u32);
        for x in 0..w {
            if row[x] == 0 {
                continue;
            }
            let mut current = 0u32;
            let mut consider = |n: u32, current: &mut u32| {
                if n == 0 {
                    return;
                }
                *current = if *current == 0 { n } else { uf.union(*current, n) };
            };
            if x > 0 {
                consider(labels[y * w + x - 1], &mut current);
            }
            if y > 0 {
                let above = (y - 1) * w;
                consider(labels[above + x], &mut current);
                if connectivity == ConnectivityType::EightWay {
                    if x > 0 {
                        consider(labels[above + x - 1], &mut current);
                    }
                    if x + 1 < w {
                        consider(labels[above + x + 1], &mut current);
                    }
                }
            }
            labels[y * w + x] = if current == 0 { uf.make() } else { current };
        }
    }

    // Resolve roots and compact to 1..N in order of first appearance
    let mut compact = vec![0u32; uf.parent.len()];
    let mut components: Vec<ComponentRecord> = Vec::new();
    let (wi, hi) = (w as i32, h as i32);
    for y in 0..h {
        cancel.check()?;
        for x in 0..w {
            let l = labels[y * w + x];
            if l == 0 {
                continue;
            }
            let root = uf.find(l);
            if compact[root as usize] == 0 {
                components.push(ComponentRecord {
                    label: components.len() as u32 + 1,
                    bounds: Rect::new_unchecked(x as i32, y as i32, 1, 1),
                    area: 0,
                    touches: EdgeTouch::default(),
                });
                compact[root as usize] = components.len() as u32;
            }
            let id = compact[root as usize];
            labels[y * w + x] = id;
            let rec = &mut components[id as usize - 1];
            rec.area += 1;
            let (xi, yi) = (x as i32, y as i32);
            let b = rec.bounds;
            let x0 = b.x.min(xi);
            let y0 = b.y.min(yi);
            let x1 = b.right().max(xi + 1);
            let y1 = b.bottom().max(yi + 1);
            rec.bounds = Rect::new_unchecked(x0, y0, x1 - x0, y1 - y0);
        }
    }
    for rec in &mut components {
        rec.touches = EdgeTouch {
            left: rec.bounds.x == 0,
            top: rec.bounds.y == 0,
            right: rec.bounds.right() == wi,
            bottom: rec.bounds.bottom() == hi,
        };
    }

    Ok(Labeling {
        width: mask.width(),
        height: mask.height(),
        labels,
        components,
    })
}

/// Component records of `mask`; the label map is discarded.
pub fn find_components(
    mask: &BinaryMask,
    connectivity: ConnectivityType,
    cancel: &CancelToken,
) -> RegionResult<Vec<ComponentRecord>> {
    Ok(label_components(mask, connectivity, cancel)?.into_components())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(w: u32, h: u32, on: &[(u32, u32)]) -> BinaryMask {
        let mut m = BinaryMask::new(w, h).unwrap();
        for &(x, y) in on {
            m.set_unchecked(x, y, true);
        }
        m
    }

    #[test]
    fn test_diagonal_connectivity() {
        let m = mask_from(4, 4, &[(0, 0), (1, 1), (2, 2)]);
        let none = CancelToken::none();
        assert_eq!(find_components(&m, ConnectivityType::EightWay, &none).unwrap().len(), 1);
        assert_eq!(find_components(&m, ConnectivityType::FourWay, &none).unwrap().len(), 3);
    }

    #[test]
    fn test_u_shape_merges() {
        // two arms joined only at the bottom row
        let m = mask_from(5, 3, &[(0, 0), (4, 0), (0, 1), (4, 1), (0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
        let comps = find_components(&m, ConnectivityType::FourWay, &CancelToken::none()).unwrap();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].area, 9);
        assert_eq!(comps[0].bounds, Rect::new_unchecked(0, 0, 5, 3));
        assert!(comps[0].touches.opposite());
    }

    #[test]
    fn test_labels_in_raster_order() {
        let m = mask_from(6, 6, &[(4, 0), (1, 3), (5, 5)]);
        let lab = label_components(&m, ConnectivityType::EightWay, &CancelToken::none()).unwrap();
        assert_eq!(lab.label_at(4, 0), 1);
        assert_eq!(lab.label_at(1, 3), 2);
        assert_eq!(lab.label_at(5, 5), 3);
        assert_eq!(lab.label_at(0, 0), 0);
        let rec = lab.components()[2];
        assert!(rec.touches.right && rec.touches.bottom && !rec.touches.left);
        assert_eq!(lab.pixels(&rec).collect::<Vec<_>>(), vec![(5, 5)]);
    }

    #[test]
    fn test_solidity() {
        let m = mask_from(3, 3, &[(0, 0), (1, 1), (2, 2)]);
        let comps = find_components(&m, ConnectivityType::EightWay, &CancelToken::none()).unwrap();
        assert!((comps[0].solidity() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cancel() {
        let m = BinaryMask::new(10, 10).unwrap();
        assert!(label_components(&m, ConnectivityType::EightWay, &CancelToken::trip_after(3)).is_err());
    }
}
