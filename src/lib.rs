//! Amino acid sequence logos around alignment positions such as transmembrane
//! domain boundaries.
//!
//! Pipeline: [`window`] extraction, [`frequency`] tabulation, [`color`] resolution
//! and [`logo`] compositing of recolored [`glyph`] images. [`maker`] drives it for
//! whole input tables.

pub mod color;
pub mod error;
pub mod frequency;
pub mod glyph;
pub mod logo;
pub mod maker;
pub mod scales;
pub mod sequence;
pub mod style;
pub mod types;
pub mod window;
