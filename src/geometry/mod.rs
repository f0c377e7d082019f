//! Coordinate-space tagged geometry.
//!
//! Raw kurbo/integer geometry is wrapped in [`Parameter`], [`Device`] or [`Layer`] so that values
//! from different spaces cannot be mixed by accident. Only [`Layer`] values expose arithmetic;
//! moving between spaces goes through [`crate::Mapping`].

pub(crate) mod layer;
pub(crate) mod space;
pub(crate) mod transform;

pub use space::{Device, Geometry, Layer, Parameter};
