use std::sync::Arc;

use crate::filter::cache::FilterCache;
use crate::filter::result::FilterResult;
use crate::foundation::core::{IPoint, IRect, ISize};
use crate::geometry::Layer;
use crate::image::color::{ColorSpace, ColorType};
use crate::image::special::SpecialImage;
use crate::mapping::Mapping;
use crate::render::surface::{BackendKind, Surface, SurfaceDesc, SurfaceFactory, SurfaceProps};

/// Opaque handle to a GPU context owned by the embedder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpuHandle(pub u64);

/// Backend a [`Context`] renders with. At most one GPU handle can be attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Backend {
    #[default]
    Raster,
    Direct(GpuHandle),
    Recorder(GpuHandle),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Raster => BackendKind::Raster,
            Backend::Direct(_) => BackendKind::Direct,
            Backend::Recorder(_) => BackendKind::Recorder,
        }
    }

    pub fn gpu_handle(&self) -> Option<GpuHandle> {
        match self {
            Backend::Raster => None,
            Backend::Direct(h) | Backend::Recorder(h) => Some(*h),
        }
    }
}

/// The copyable part of a [`Context`].
#[derive(Clone, Debug)]
pub struct ContextInfo {
    pub mapping: Mapping,
    /// Region of layer space the caller will read. Output outside it may be dropped.
    pub desired_output: Layer<IRect>,
    /// Input used by nodes that do not name one.
    pub source: FilterResult,
    pub color_type: ColorType,
    pub color_space: ColorSpace,
    pub surface_props: SurfaceProps,
    pub cache: Option<Arc<dyn FilterCache>>,
}

impl ContextInfo {
    /// Empty source, RGBA8 sRGB surfaces and no cache.
    pub fn new(mapping: Mapping, desired_output: Layer<IRect>) -> Self {
        Self {
            mapping,
            desired_output,
            source: FilterResult::empty(),
            color_type: ColorType::Rgba8888,
            color_space: ColorSpace::Srgb,
            surface_props: SurfaceProps::default(),
            cache: None,
        }
    }
}

/// Evaluation state handed to every filter node.
///
/// Contexts are never mutated; the `with_new_*` methods derive a modified copy.
#[derive(Clone, Debug)]
pub struct Context {
    info: ContextInfo,
    backend: Backend,
    surfaces: Arc<dyn SurfaceFactory>,
}

impl Context {
    /// CPU context. Forces the color type to [`ColorType::Rgba8888`].
    pub fn make_raster(mut info: ContextInfo, surfaces: Arc<dyn SurfaceFactory>) -> Self {
        info.color_type = ColorType::Rgba8888;
        Self::new(info, Backend::Raster, surfaces)
    }

    pub fn make_direct(
        handle: GpuHandle,
        info: ContextInfo,
        surfaces: Arc<dyn SurfaceFactory>,
    ) -> Self {
        Self::new(info, Backend::Direct(handle), surfaces)
    }

    pub fn make_recorder(
        handle: GpuHandle,
        info: ContextInfo,
        surfaces: Arc<dyn SurfaceFactory>,
    ) -> Self {
        Self::new(info, Backend::Recorder(handle), surfaces)
    }

    fn new(info: ContextInfo, backend: Backend, surfaces: Arc<dyn SurfaceFactory>) -> Self {
        debug_assert!(
            info.source
                .image()
                .is_none_or(|img| !img.is_texture_backed() || img.backend_kind() == backend.kind()),
            "source image backend does not match the context backend"
        );
        Self {
            info,
            backend,
            surfaces,
        }
    }

    pub fn info(&self) -> &ContextInfo {
        &self.info
    }

    pub fn mapping(&self) -> &Mapping {
        &self.info.mapping
    }

    pub fn desired_output(&self) -> Layer<IRect> {
        self.info.desired_output
    }

    pub fn source(&self) -> &FilterResult {
        &self.info.source
    }

    pub fn color_type(&self) -> ColorType {
        self.info.color_type
    }

    pub fn color_space(&self) -> ColorSpace {
        self.info.color_space
    }

    pub fn surface_props(&self) -> &SurfaceProps {
        &self.info.surface_props
    }

    pub fn cache(&self) -> Option<&Arc<dyn FilterCache>> {
        self.info.cache.as_ref()
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn surfaces(&self) -> &Arc<dyn SurfaceFactory> {
        &self.surfaces
    }

    /// Scratch target compatible with this context's color type, color space and backend.
    pub fn make_surface(&self, size: Layer<ISize>, props: Option<&SurfaceProps>) -> Option<Surface> {
        let desc = SurfaceDesc {
            size: size.get(),
            color_type: self.info.color_type,
            color_space: self.info.color_space,
            props: props.copied().unwrap_or(self.info.surface_props),
            backend: self.backend.kind(),
        };
        self.surfaces.make_surface(&desc)
    }

    pub fn with_new_mapping(&self, mapping: Mapping) -> Context {
        let mut info = self.info.clone();
        info.mapping = mapping;
        self.derive(info)
    }

    pub fn with_new_desired_output(&self, desired_output: Layer<IRect>) -> Context {
        let mut info = self.info.clone();
        info.desired_output = desired_output;
        self.derive(info)
    }

    pub fn with_new_color_space(&self, color_space: ColorSpace) -> Context {
        let mut info = self.info.clone();
        info.color_space = color_space;
        self.derive(info)
    }

    /// Use `image`, currently placed at `origin`, as the source and move layer space so that
    /// the image's top-left corner is the layer origin.
    pub fn with_new_source(&self, image: Option<SpecialImage>, origin: Layer<IPoint>) -> Context {
        let mut info = self.info.clone();
        info.mapping.apply_origin(origin);
        info.desired_output = info.desired_output.offset(Layer::new(IPoint::ZERO) - origin);
        info.source = FilterResult::new(image, Layer::new(IPoint::ZERO));
        self.derive(info)
    }

    /// Replace the source without touching the mapping.
    pub fn with_new_source_result(&self, source: FilterResult) -> Context {
        let mut info = self.info.clone();
        info.source = source;
        self.derive(info)
    }

    fn derive(&self, info: ContextInfo) -> Context {
        Self::new(info, self.backend, Arc::clone(&self.surfaces))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/context.rs"]
mod tests;
