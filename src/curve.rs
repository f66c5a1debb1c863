//! D-dimensional Hilbert curve codec.
//!
//! Implements the Gray-code-based transposed-index algorithm: a bijection
//! between a point with `bits`-wide coordinates and a scalar index in
//! `[0, 2^(bits * dims) - 1]`. Neighboring indices map to points at
//! Manhattan distance 1, which is what gives the Hilbert tree its
//! locality.

use rindex_types::error::{IndexError, Result};
use rindex_types::grid::GridRect;
use rindex_types::range::{Range, Ranges};
use serde::{Deserialize, Serialize};

/// Largest hole the range query will bridge between two perimeter cells.
const FUSE_GAP: i64 = 100;

/// Default scratch capacity for [`HilbertCurve::query`].
const DEFAULT_QUERY_BUFFER: i32 = 1024;

/// A Hilbert curve over a `2^bits x ... x 2^bits` grid in `dims`
/// dimensions.
///
/// # Examples
///
/// ```
/// use rindex::HilbertCurve;
///
/// let curve = HilbertCurve::new(1, 2)?;
/// assert_eq!(curve.index(&[0, 0]), 0);
/// assert_eq!(curve.index(&[0, 1]), 1);
/// assert_eq!(curve.index(&[1, 1]), 2);
/// assert_eq!(curve.index(&[1, 0]), 3);
/// # Ok::<(), rindex::IndexError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HilbertCurve {
    bits: u32,
    dims: usize,
    len: u32,
}

impl HilbertCurve {
    /// Create a curve with `bits` bits per dimension over `dims`
    /// dimensions.
    ///
    /// # Errors
    ///
    /// `InvalidParameters` when `bits` or `dims` is zero, or when
    /// `bits * dims` exceeds 63 and the index would overflow a signed
    /// 64-bit scalar.
    pub fn new(bits: u32, dims: usize) -> Result<Self> {
        if bits < 1 || dims < 1 {
            return Err(IndexError::InvalidParameters(
                "curve bits and dimensions must both be at least 1".to_string(),
            ));
        }
        let len = bits as usize * dims;
        if len > 63 {
            return Err(IndexError::InvalidParameters(format!(
                "bits * dims must be at most 63, got {len}"
            )));
        }
        Ok(Self {
            bits,
            dims,
            len: len as u32,
        })
    }

    /// Bits per dimension.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of dimensions.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Total number of index bits, `bits * dims`.
    pub fn length(&self) -> u32 {
        self.len
    }

    /// Largest coordinate value on any axis, `2^bits - 1`.
    pub fn max_ordinate(&self) -> i64 {
        ((1u64 << self.bits) - 1) as i64
    }

    /// Largest index value, `2^(bits * dims) - 1`.
    pub fn max_index(&self) -> i64 {
        ((1u64 << self.len) - 1) as i64
    }

    /// Map a point to its Hilbert index.
    ///
    /// Coordinates must lie in `[0, 2^bits - 1]` and `point` must have
    /// `dims` entries.
    pub fn index(&self, point: &[i64]) -> i64 {
        debug_assert_eq!(point.len(), self.dims);
        let transposed = Self::transposed_index(self.bits, point);
        self.to_index(&transposed)
    }

    /// Map a Hilbert index back to its point.
    pub fn point(&self, index: i64) -> Vec<i64> {
        let mut x = vec![0i64; self.dims];
        self.transpose_into(index, &mut x);
        Self::transposed_to_point(self.bits, &mut x);
        x
    }

    /// Map an index to a point, reusing the caller's buffer.
    pub fn point_into(&self, index: i64, out: &mut Vec<i64>) {
        out.clear();
        out.resize(self.dims, 0);
        self.transpose_into(index, out);
        Self::transposed_to_point(self.bits, out);
    }

    /// De-interleave an index into its transposed representation: one
    /// `bits`-wide word per dimension.
    pub fn transpose(&self, index: i64) -> Vec<i64> {
        let mut x = vec![0i64; self.dims];
        self.transpose_into(index, &mut x);
        x
    }

    fn transpose_into(&self, index: i64, x: &mut [i64]) {
        for idx in 0..self.len {
            if index & (1i64 << idx) != 0 {
                let d = (self.len - idx - 1) as usize % self.dims;
                let s = idx / self.dims as u32;
                x[d] |= 1i64 << s;
            }
        }
    }

    /// Convert a point to its transposed Hilbert representation.
    pub fn transposed_index(bits: u32, point: &[i64]) -> Vec<i64> {
        let n = point.len();
        let m = 1i64 << (bits - 1);
        let mut x = point.to_vec();

        let mut q = m;
        while q > 1 {
            let p = q - 1;
            for i in 0..n {
                if x[i] & q != 0 {
                    x[0] ^= p;
                } else {
                    let t = (x[0] ^ x[i]) & p;
                    x[0] ^= t;
                    x[i] ^= t;
                }
            }
            q >>= 1;
        }

        // Gray decode across coordinates.
        for i in 1..n {
            x[i] ^= x[i - 1];
        }

        let mut t = 0;
        let mut q = m;
        while q > 1 {
            if x[n - 1] & q != 0 {
                t ^= q - 1;
            }
            q >>= 1;
        }
        for v in x.iter_mut() {
            *v ^= t;
        }

        x
    }

    /// Reconstruct a point from its transposed representation, in place.
    pub fn transposed_index_to_point(bits: u32, x: &mut [i64]) {
        Self::transposed_to_point(bits, x);
    }

    fn transposed_to_point(bits: u32, x: &mut [i64]) {
        let n = x.len();
        let cap = 2i64 << (bits - 1);

        let mut t = x[n - 1] >> 1;
        for i in (1..n).rev() {
            x[i] ^= x[i - 1];
        }
        x[0] ^= t;

        let mut q = 2i64;
        while q != cap {
            let p = q - 1;
            for i in (0..n).rev() {
                if x[i] & q != 0 {
                    x[0] ^= p;
                } else {
                    t = (x[0] ^ x[i]) & p;
                    x[0] ^= t;
                    x[i] ^= t;
                }
            }
            q <<= 1;
        }
    }

    /// Interleave a transposed representation into a single index,
    /// most-significant bit first across coordinates then bit planes.
    fn to_index(&self, transposed: &[i64]) -> i64 {
        let mut b = 0i64;
        let mut bidx = self.len as i64 - 1;
        let mut mask = 1i64 << (self.bits - 1);

        for _ in 0..self.bits {
            for v in transposed {
                if v & mask != 0 {
                    b |= 1i64 << bidx;
                }
                bidx -= 1;
            }
            mask >>= 1;
        }
        b
    }

    /// Cover the box `[a, b]` with index ranges, returning at most
    /// `max_ranges` of them (0 = unlimited).
    ///
    /// See [`query_with_buffer`](Self::query_with_buffer).
    pub fn query(&self, a: &[i64], b: &[i64], max_ranges: i32) -> Result<Ranges> {
        self.query_with_buffer(a, b, max_ranges, DEFAULT_QUERY_BUFFER)
    }

    /// Cover the box `[a, b]` with index ranges using an explicit scratch
    /// capacity.
    ///
    /// Walks the box perimeter, sorts the perimeter cell indices, and
    /// fuses them into runs: a run is extended while the next index is at
    /// most [`FUSE_GAP`] ahead and every index in between still decodes to
    /// a point inside the box.
    ///
    /// # Errors
    ///
    /// `InvalidQueryBounds` when `max_ranges < 0` or
    /// `buffer <= max_ranges`; `DimensionMismatch` when the corners do
    /// not match the curve dimension.
    pub fn query_with_buffer(
        &self,
        a: &[i64],
        b: &[i64],
        max_ranges: i32,
        buffer: i32,
    ) -> Result<Ranges> {
        if max_ranges < 0 {
            return Err(IndexError::InvalidQueryBounds(
                "max range number in a query must be positive".to_string(),
            ));
        }
        if buffer <= max_ranges {
            return Err(IndexError::InvalidQueryBounds(
                "buffer size must be larger than the max range".to_string(),
            ));
        }
        if a.len() != self.dims {
            return Err(IndexError::DimensionMismatch {
                expected: self.dims,
                actual: a.len(),
            });
        }
        let query_box = GridRect::new(a.to_vec(), b.to_vec())?;

        let mut cells = Vec::new();
        query_box.visit_perimeter(|p| cells.push(self.index(p)));
        cells.sort_unstable();

        let mut ranges = Ranges::new(if buffer > 0 {
            buffer as usize
        } else {
            DEFAULT_QUERY_BUFFER as usize
        });
        let Some(&first) = cells.first() else {
            return Ok(ranges);
        };

        let mut scratch = Vec::with_capacity(self.dims);
        let mut start = first;
        let mut end = first;
        for &idx in &cells[1..] {
            let mut continuous = true;
            let mut probe = end + 1;
            while probe < idx {
                self.point_into(probe, &mut scratch);
                if !query_box.contains_point(&scratch) {
                    continuous = false;
                    break;
                }
                probe += 1;
            }

            if continuous && idx - end <= FUSE_GAP {
                end = idx;
            } else {
                ranges.add(Range::new(start, end)?)?;
                start = idx;
                end = idx;
            }
        }
        ranges.add(Range::new(start, end)?)?;

        if max_ranges > 0 && ranges.len() > max_ranges as usize {
            let mut limited = Ranges::new(max_ranges as usize);
            for range in ranges.iter().take(max_ranges as usize) {
                limited.add(*range)?;
            }
            return Ok(limited);
        }
        Ok(ranges)
    }
}
