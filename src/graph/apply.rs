use std::sync::Arc;

use tracing::{debug, warn};

use crate::filter::cache::FilterCache;
use crate::filter::context::{Context, ContextInfo};
use crate::filter::result::FilterResult;
use crate::foundation::core::{Affine, IPoint, IRect, Point};
use crate::foundation::math;
use crate::geometry::{Device, Layer, Parameter};
use crate::graph::node::ImageFilter;
use crate::image::sampling::SamplingOptions;
use crate::image::special::SpecialImage;
use crate::mapping::Mapping;
use crate::render::surface::SurfaceFactory;

/// Output of [`apply_filter`]: a layer-space result plus what is needed to draw it on the device.
#[derive(Clone, Debug)]
pub struct FilteredLayer {
    context: Context,
    result: FilterResult,
    device_clip: Device<IRect>,
}

impl FilteredLayer {
    pub fn result(&self) -> &FilterResult {
        &self.result
    }

    /// Context the graph was evaluated with.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn mapping(&self) -> &Mapping {
        self.context.mapping()
    }

    pub fn layer_bounds(&self) -> Layer<IRect> {
        self.result.layer_bounds()
    }

    /// Device pixels the result can touch, limited to the device clip.
    pub fn device_bounds(&self) -> Option<Device<IRect>> {
        if self.result.is_empty() {
            return None;
        }
        let mapped = self.mapping().map_to_device(self.result.layer_bounds()).get();
        mapped
            .intersect(self.device_clip.get())
            .filter(|r| !r.is_empty())
            .map(Device::new)
    }

    /// Render the result into device space through the layer→device matrix.
    ///
    /// Returns the image and the device position of its top-left corner; `None` when nothing is
    /// visible or no scratch surface is available.
    pub fn to_device(&self) -> Option<(SpecialImage, Device<IPoint>)> {
        let bounds = self.device_bounds()?.get();
        // Device space evaluated as a layer space with an identity mapping.
        let device = Layer::new(bounds);
        let ctx = self
            .context
            .with_new_mapping(Mapping::default())
            .with_new_desired_output(device);
        let to_device = Layer::new(self.mapping().layer_to_device_matrix());
        let placed = self
            .result
            .apply_transform(&ctx, to_device, SamplingOptions::DEFAULT);
        let (image, origin) = placed.resolve(&ctx, device);
        Some((image?, Device::new(origin.get())))
    }
}

/// Evaluate `filter` for content drawn with `ctm`, limited to `device_clip`.
///
/// `source`, when given, is the device-space image the graph reads as its source. The graph's
/// matrix capability decides how `ctm` is split between filtering and the final draw.
pub fn apply_filter(
    filter: &ImageFilter,
    ctm: Affine,
    device_clip: Device<IRect>,
    source: Option<(SpecialImage, Device<IPoint>)>,
    surfaces: Arc<dyn SurfaceFactory>,
) -> FilteredLayer {
    apply_filter_with_cache(filter, ctm, device_clip, source, surfaces, None)
}

/// [`apply_filter`] sharing intermediate results through `cache`.
#[tracing::instrument(level = "debug", skip_all, fields(node = filter.id()))]
pub fn apply_filter_with_cache(
    filter: &ImageFilter,
    ctm: Affine,
    device_clip: Device<IRect>,
    source: Option<(SpecialImage, Device<IPoint>)>,
    surfaces: Arc<dyn SurfaceFactory>,
    cache: Option<Arc<dyn FilterCache>>,
) -> FilteredLayer {
    let clip = device_clip.get();
    let representative = match math::invert(ctm) {
        Some(inverse) => inverse * clip.to_rect().center(),
        None => Point::ZERO,
    };

    let mut mapping = Mapping::default();
    let decomposed = mapping.decompose_ctm(ctm, filter.capability(), Parameter::new(representative));
    let mut info = if decomposed {
        ContextInfo::new(mapping, mapping.device_to_layer(device_clip))
    } else {
        warn!(ctm = ?ctm.as_coeffs(), "ctm cannot be decomposed; filter output is empty");
        ContextInfo::new(mapping, Layer::<IRect>::empty())
    };
    info.cache = cache;
    let ctx = Context::make_raster(info, surfaces);

    let ctx = match source {
        Some((image, origin)) if decomposed => {
            // Positioned by device numbers, then pulled into layer space without rendering when
            // the device→layer step is an integer translation.
            let placed = FilterResult::new(Some(image), Layer::new(origin.get()));
            let to_layer = Layer::new(mapping.device_to_layer_matrix());
            let source = placed.apply_transform(&ctx, to_layer, SamplingOptions::DEFAULT);
            ctx.with_new_source_result(source)
        }
        _ => ctx,
    };

    let result = if decomposed {
        filter.filter_image(&ctx)
    } else {
        FilterResult::empty()
    };
    debug!(
        layer_bounds = ?result.layer_bounds().get(),
        state = ?result.state(),
        "filter applied"
    );
    FilteredLayer {
        context: ctx,
        result,
        device_clip,
    }
}
