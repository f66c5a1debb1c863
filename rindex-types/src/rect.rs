use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};

/// Relative tolerance used when comparing floating-point coordinates.
///
/// MBRs are recomputed many times over the life of a tree, so exact
/// equality would reject semantically identical rectangles.
pub const RELATIVE_EPSILON: f64 = 1e-7;

/// Compare two floating-point coordinates under the relative tolerance
/// `|x - y| <= RELATIVE_EPSILON * (|x| + |y|)`.
pub fn approx_eq(x: f64, y: f64) -> bool {
    (x - y).abs() <= RELATIVE_EPSILON * (x.abs() + y.abs())
}

/// An axis-aligned rectangle in D dimensions with `f64` coordinates.
///
/// Represented by two coordinate vectors `lo` and `hi` of equal length
/// with `lo[i] <= hi[i]` on every axis. The constructor normalizes
/// reversed axes, so degenerate-order inputs are tolerated.
///
/// # Examples
///
/// ```
/// use rindex_types::rect::Rect;
///
/// let r = Rect::new(vec![0.0, 0.0], vec![2.0, 3.0])?;
/// assert_eq!(r.area(), 6.0);
/// # Ok::<(), rindex_types::IndexError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    lo: Vec<f64>,
    hi: Vec<f64>,
}

impl Rect {
    /// Create a rectangle from its lower and upper corners.
    ///
    /// Axes where `lo[i] > hi[i]` are swapped into canonical order.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the corners have different lengths,
    /// `InvalidParameters` when they are empty.
    pub fn new(mut lo: Vec<f64>, mut hi: Vec<f64>) -> Result<Self> {
        if lo.len() != hi.len() {
            return Err(IndexError::DimensionMismatch {
                expected: lo.len(),
                actual: hi.len(),
            });
        }
        if lo.is_empty() {
            return Err(IndexError::InvalidParameters(
                "rectangle must have at least one dimension".to_string(),
            ));
        }
        for i in 0..lo.len() {
            if lo[i] > hi[i] {
                std::mem::swap(&mut lo[i], &mut hi[i]);
            }
        }
        Ok(Self { lo, hi })
    }

    /// Create a zero-extent rectangle covering a single point.
    pub fn point(coords: Vec<f64>) -> Result<Self> {
        Self::new(coords.clone(), coords)
    }

    /// Number of dimensions.
    pub fn dims(&self) -> usize {
        self.lo.len()
    }

    /// Lower corner.
    pub fn lo(&self) -> &[f64] {
        &self.lo
    }

    /// Upper corner.
    pub fn hi(&self) -> &[f64] {
        &self.hi
    }

    /// Product of the per-axis extents.
    ///
    /// Uses the absolute value per axis, so the result is non-negative
    /// even for rectangles built from unnormalized coordinates.
    pub fn area(&self) -> f64 {
        self.lo
            .iter()
            .zip(&self.hi)
            .map(|(l, h)| (h - l).abs())
            .product()
    }

    /// Smallest rectangle covering both `self` and `other`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the rectangles differ in dimension.
    pub fn union(&self, other: &Rect) -> Result<Rect> {
        if self.dims() != other.dims() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims(),
                actual: other.dims(),
            });
        }
        let mut out = self.clone();
        out.expand_to_include(other);
        Ok(out)
    }

    /// Grow this rectangle in place so it covers `other`.
    ///
    /// Both rectangles must have the same dimension.
    pub fn expand_to_include(&mut self, other: &Rect) {
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

    /// True when the rectangles share at least one point.
    ///
    /// Touching on a face counts as an intersection. Rectangles of
    /// different dimensions never intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
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
    pub fn contains(&self, other: &Rect) -> bool {
        if self.dims() != other.dims() {
            return false;
        }
        self.lo
            .iter()
            .zip(&self.hi)
            .zip(other.lo.iter().zip(&other.hi))
            .all(|((al, ah), (bl, bh))| *al <= *bl && *bh <= *ah)
    }

    /// Area growth required for `self` to cover `other`.
    ///
    /// Always non-negative. Both rectangles must have the same dimension.
    pub fn enlargement(&self, other: &Rect) -> f64 {
        debug_assert_eq!(self.dims(), other.dims());
        let mut grown = self.clone();
        grown.expand_to_include(other);
        grown.area() - self.area()
    }

    /// Per-coordinate comparison under [`RELATIVE_EPSILON`].
    pub fn approx_eq(&self, other: &Rect) -> bool {
        if self.dims() != other.dims() {
            return false;
        }
        self.lo
            .iter()
            .zip(&other.lo)
            .chain(self.hi.iter().zip(&other.hi))
            .all(|(x, y)| approx_eq(*x, *y))
    }

    /// Component-wise midpoint.
    pub fn centroid(&self) -> Vec<f64> {
        self.lo
            .iter()
            .zip(&self.hi)
            .map(|(l, h)| (l + h) / 2.0)
            .collect()
    }
}
