//! Pixel-level collaborators of the filter core: images, colors, sampling, shaders and
//! recorded pictures.

pub(crate) mod color;
pub(crate) mod picture;
pub(crate) mod sampling;
pub(crate) mod shader;
pub(crate) mod special;
