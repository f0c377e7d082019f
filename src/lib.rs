//! Coordinate-space-safe, lazily composed image filter evaluation.
//!
//! Filter graphs are authored in *parameter* space, evaluated in *layer* space and drawn in
//! *device* space. [`Mapping`] splits a device transform between those spaces, [`FilterResult`]
//! keeps crops, transforms and color filters pending on a shared image until pixels are needed,
//! and [`Builder`] combines several results in a single paint. [`apply_filter`] ties everything
//! together for a graph of [`ImageFilter`] nodes, usually built from a JSON [`FilterSpec`].
#![forbid(unsafe_code)]

pub(crate) mod filter;
pub(crate) mod foundation;
pub(crate) mod geometry;
pub(crate) mod graph;
pub(crate) mod image;
pub(crate) mod mapping;
pub(crate) mod render;

pub use filter::builder::{Builder, ShaderFlags};
pub use filter::cache::{CacheKey, FilterCache, FilterCacheStats, InMemoryFilterCache};
pub use filter::context::{Backend, Context, ContextInfo, GpuHandle};
pub use filter::decision::{
    ColorFilterPlan, PendingOps, ShaderPlan, TransformPlan, is_cropped, plan_color_filter,
    plan_shader, plan_transform,
};
pub use filter::result::{FilterResult, ResultState};
pub use foundation::core::{
    Affine, BezPath, IPoint, IRect, ISize, IVector, Point, Rect, Size, Vec2, Vector,
};
pub use foundation::error::{FxError, FxResult};
pub use foundation::math::ROUND_EPSILON;
pub use geometry::{Device, Geometry, Layer, Parameter};
pub use graph::apply::{FilteredLayer, apply_filter, apply_filter_with_cache};
pub use graph::model::{
    ColorDef, ColorMatrixDef, ColorMatrixPreset, FilterSpec, PictureOpDef, RectDef,
};
pub use graph::node::{FilterOp, ImageFilter};
pub use image::color::{BlendMode, Color4f, ColorFilter, ColorMatrix, ColorSpace, ColorType};
pub use image::picture::{Picture, PictureOp};
pub use image::sampling::{CubicResampler, FilterMode, SamplingOptions, merge_sampling};
pub use image::shader::{Shader, ShaderProgram};
pub use image::special::SpecialImage;
pub use mapping::{IntoLayer, Mapping, MatrixCapability};
pub use render::surface::{
    BackendKind, PixelGeometry, RasterOpts, RasterSurfaceFactory, RenderStats,
    RenderStatsSnapshot, Surface, SurfaceDesc, SurfaceFactory, SurfaceProps,
};
