//! In-memory multidimensional spatial index with two R-tree variants.
//!
//! Rectangle-keyed insertion, overlap search and deletion over a bag of
//! `(bounding box, payload)` associations. Two engines share the same
//! surface: a [`GuttmanTree`] with quadratic splitting over `f64`
//! rectangles, and a [`HilbertTree`] that orders integer rectangles by
//! the Hilbert index of their centers and rebalances through
//! cooperating siblings. The [`HilbertCurve`] codec behind the second
//! variant is exposed for direct use, including perimeter-driven range
//! queries.
//!
//! ```rust
//! use rindex::{GuttmanTree, Rect};
//!
//! let mut tree = GuttmanTree::new(2, 5)?;
//! tree.insert(Rect::new(vec![0.0, 0.0], vec![1.0, 1.0])?, 42)?;
//!
//! let hits = tree.search(&Rect::new(vec![0.5, 0.5], vec![2.0, 2.0])?);
//! assert_eq!(hits, vec![&42]);
//! # Ok::<(), rindex::IndexError>(())
//! ```
//!
//! Trees are single-threaded; wrap one in your own synchronization for
//! concurrent access. Payloads are owned by the tree and handed back by
//! reference from `search`.

mod arena;
pub mod curve;
pub mod guttman;
pub mod hilbert;

pub use curve::HilbertCurve;
pub use guttman::GuttmanTree;
pub use hilbert::HilbertTree;

pub use rindex_types::error::{IndexError, Result};
pub use rindex_types::grid::GridRect;
pub use rindex_types::range::{Range, Ranges};
pub use rindex_types::rect::Rect;
