//! Shared geometry and interval types for the `rindex` spatial index.
//!
//! This crate holds the plain data types the index operates on: the
//! floating-point rectangle used by the Guttman tree ([`rect::Rect`]), the
//! integer-corner box used by the Hilbert tree and curve codec
//! ([`grid::GridRect`]), and the scalar interval collection produced by
//! Hilbert range queries ([`range::Ranges`]).

pub mod error;
pub mod grid;
pub mod range;
pub mod rect;

pub use error::{IndexError, Result};
pub use grid::GridRect;
pub use range::{Range, Ranges};
pub use rect::Rect;
