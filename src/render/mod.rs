//! Scratch surfaces and CPU rasterization used when a filter result has to be materialized.

pub(crate) mod raster;
pub(crate) mod surface;
