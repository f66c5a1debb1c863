//! Guttman R-tree over floating-point rectangles.
//!
//! A dynamically balanced tree keyed on MBR overlap: insertion descends
//! by minimal enlargement, overfull nodes split with the quadratic
//! strategy, and deletion condenses the tree by detaching underfull
//! nodes and re-homing their entries.

mod node;
mod tree;

pub use tree::GuttmanTree;
