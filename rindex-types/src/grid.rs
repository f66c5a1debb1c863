use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// An axis-aligned box in D dimensions with signed integer corners.
///
/// This is the key type of the Hilbert tree and the query box of the
/// Hilbert curve codec. Equality is exact; integer coordinates need no
/// tolerance.
///
/// # Examples
///
/// ```
/// use rindex_types::grid::GridRect;
///
/// let b = GridRect::new(vec![0, 0], vec![3, 3])?;
/// assert_eq!(b.center(), vec![1, 1]);
/// assert!(b.contains_point(&[3, 0]));
/// # Ok::<(), rindex_types::IndexError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    lo: Vec<i64>,
    hi: Vec<i64>,
}

impl GridRect {
    /// Create a box from its lower and upper corners.
    ///
    /// Axes where `lo[i] > hi[i]` are swapped into canonical order.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the corners have different lengths,
    /// `InvalidParameters` when they are empty.
    pub fn new(mut lo: Vec<i64>, mut hi: Vec<i64>) -> Result<Self> {
        if lo.len() != hi.len() {
            return Err(IndexError::DimensionMismatch {
                expected: lo.len(),
                actual: hi.len(),
            });
        }
        if lo.is_empty() {
            return Err(IndexError::InvalidParameters(
                "box must have at least one dimension".to_string(),
            ));
        }
        for i in 0..lo.len() {
            if lo[i] > hi[i] {
                std::mem::swap(&mut lo[i], &mut hi[i]);
            }
        }
        Ok(Self { lo, hi })
    }

    /// Create a zero-extent box covering a single lattice point.
    pub fn point(coords: Vec<i64>) -> Result<Self> {
        Self::new(coords.clone(), coords)
    }

    /// Number of dimensions.
    pub fn dims(&self) -> usize {
        self.lo.len()
    }

    /// Lower corner.
    pub fn lo(&self) -> &[i64] {
        &self.lo
    }

    /// Upper corner.
    pub fn hi(&self) -> &[i64] {
        &self.hi
    }

    /// Component-wise midpoint, using integer division.
    pub fn center(&self) -> Vec<i64> {
        self.lo
            .iter()
            .zip(&self.hi)
            .map(|(l, h)| (l + h) / 2)
            .collect()
    }

    /// Grow this box in place so it covers `other`.
    ///
    /// Both boxes must have the same dimension.
    pub fn expand_to_include(&mut self, other: &GridRect) {
        debug_assert_eq!(self.dims(), other.dims());
        for i in 0..self.lo.len() {
            if other.lo[i] < self.lo[i] {
                self.lo[i] = other.lo[i];
            }
            if other.hi[i] > self.hi[i] {
                self.hi[i] = other.hi[i];
            }
        }
    }

    /// True when the boxes share at least one point.
    ///
    /// Touching on a face counts. Boxes of different dimensions never
    /// intersect.
    pub fn intersects(&self, other: &GridRect) -> bool {
        if self.dims() != other.dims() {
            return false;
        }
        self.lo
            .iter()
            .zip(&self.hi)
            .zip(other.lo.iter().zip(&other.hi))
            .all(|((al, ah), (bl, bh))| *ah >= *bl && *al <= *bh)
    }

    /// True when `other` lies entirely inside `self` (boundaries included).
    pub fn contains(&self, other: &GridRect) -> bool {
        if self.dims() != other.dims() {
            return false;
        }
        self.lo
            .iter()
            .zip(&self.hi)
            .zip(other.lo.iter().zip(&other.hi))
            .all(|((al, ah), (bl, bh))| *al <= *bl && *bh <= *ah)
    }

    /// True when the lattice point `p` lies inside the box.
    pub fn contains_point(&self, p: &[i64]) -> bool {
        if p.len() != self.dims() {
            return false;
        }
        p.iter()
            .zip(self.lo.iter().zip(&self.hi))
            .all(|(x, (l, h))| *x >= *l && *x <= *h)
    }

    /// Visit every lattice point of the box with at least one coordinate
    /// on a boundary.
    ///
    /// The enumeration recurses over dimensions; callers may rely on the
    /// set of visited points but not on their order.
    pub fn visit_perimeter<F: FnMut(&[i64])>(&self, mut visit: F) {
        let mut point = vec![0i64; self.dims()];
        self.walk_perimeter(0, &mut point, &mut visit);
    }

    fn walk_perimeter<F: FnMut(&[i64])>(&self, axis: usize, point: &mut Vec<i64>, visit: &mut F) {
        if axis == self.dims() {
            let on_boundary = point
                .iter()
                .zip(self.lo.iter().zip(&self.hi))
                .any(|(x, (l, h))| x == l || x == h);
            if on_boundary {
                visit(point);
            }
            return;
        }
        for x in self.lo[axis]..=self.hi[axis] {
            point[axis] = x;
            self.walk_perimeter(axis + 1, point, visit);
        }
    }
}
