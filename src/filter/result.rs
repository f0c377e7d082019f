use std::sync::Arc;

use crate::filter::builder::ShaderFlags;
use crate::filter::context::Context;
use crate::filter::decision::{
    self, ColorFilterPlan, PendingOps, ShaderPlan, TransformPlan,
};
use crate::foundation::core::{Affine, IPoint, IRect, Point, Rect};
use crate::foundation::math;
use crate::geometry::{Layer, Parameter};
use crate::image::color::{BlendMode, Color4f, ColorFilter};
use crate::image::picture::Picture;
use crate::image::sampling::SamplingOptions;
use crate::image::shader::Shader;
use crate::image::special::SpecialImage;

/// Coarse state of a [`FilterResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultState {
    /// Transparent everywhere.
    Empty,
    /// A pixel-aligned image with nothing pending; reading it needs no rendering.
    Resolved,
    /// Sampling, a non-trivial transform or a color filter are still pending.
    Deferred,
}

/// A lazily transformed image in layer space.
///
/// Reading a filter result means, in this order: sample `image` through `transform` with
/// `sampling` (decal outside the image), apply `color_filter` to every sample including the
/// transparent ones, then clip to `layer_bounds`. Operations return new values and share the
/// backing image whenever they only touch this metadata.
#[derive(Clone, Debug)]
pub struct FilterResult {
    image: Option<SpecialImage>,
    sampling: SamplingOptions,
    transform: Layer<Affine>,
    color_filter: Option<Arc<ColorFilter>>,
    layer_bounds: Layer<IRect>,
}

impl Default for FilterResult {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<(Option<SpecialImage>, Layer<IPoint>)> for FilterResult {
    fn from((image, origin): (Option<SpecialImage>, Layer<IPoint>)) -> Self {
        Self::new(image, origin)
    }
}

impl FilterResult {
    /// The canonical transparent result.
    pub fn empty() -> Self {
        Self {
            image: None,
            sampling: SamplingOptions::DEFAULT,
            transform: Layer::<Affine>::identity(),
            color_filter: None,
            layer_bounds: Layer::<IRect>::empty(),
        }
    }

    /// `image` with its top-left corner at `origin`.
    pub fn new(image: Option<SpecialImage>, origin: Layer<IPoint>) -> Self {
        let Some(image) = image else {
            return Self::empty();
        };
        let transform = Layer::<Affine>::translate_int(origin - Layer::new(IPoint::ZERO));
        let layer_bounds = transform.map_irect(Layer::new(IRect::from_size(image.dimensions())));
        Self {
            image: Some(image),
            sampling: SamplingOptions::DEFAULT,
            transform,
            color_filter: None,
            layer_bounds,
        }
    }

    pub fn image(&self) -> Option<&SpecialImage> {
        self.image.as_ref()
    }

    pub fn sampling(&self) -> SamplingOptions {
        self.sampling
    }

    pub fn transform(&self) -> Layer<Affine> {
        self.transform
    }

    pub fn color_filter(&self) -> Option<&Arc<ColorFilter>> {
        self.color_filter.as_ref()
    }

    pub fn layer_bounds(&self) -> Layer<IRect> {
        self.layer_bounds
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none() || self.layer_bounds.is_empty()
    }

    pub fn state(&self) -> ResultState {
        if self.is_empty() {
            return ResultState::Empty;
        }
        let aligned = self.transform.integer_translation().is_some();
        if aligned && self.color_filter.is_none() {
            ResultState::Resolved
        } else {
            ResultState::Deferred
        }
    }

    pub(crate) fn pending(&self) -> PendingOps<'_> {
        PendingOps {
            image_size: self.image.as_ref().map(SpecialImage::dimensions),
            sampling: self.sampling,
            transform: self.transform,
            color_filter: self.color_filter.as_deref(),
            layer_bounds: self.layer_bounds,
        }
    }

    /// Restrict to `crop`. Pure metadata; never renders.
    pub fn apply_crop(&self, ctx: &Context, crop: Layer<IRect>) -> FilterResult {
        if self.image.is_none() {
            return Self::empty();
        }
        let tight = crop
            .intersect(ctx.desired_output())
            .and_then(|r| r.intersect(self.layer_bounds));
        match tight {
            Some(bounds) => FilterResult {
                layer_bounds: bounds,
                ..self.clone()
            },
            None => Self::empty(),
        }
    }

    /// Transform the result by `transform`, sampling with `sampling`.
    ///
    /// Folds into the pending transform when that samples identically; otherwise renders the
    /// current result and transforms the rendered image.
    pub fn apply_transform(
        &self,
        ctx: &Context,
        transform: Layer<Affine>,
        sampling: SamplingOptions,
    ) -> FilterResult {
        if self.image.is_none() {
            return Self::empty();
        }
        if transform.invert().is_none() {
            return Self::empty();
        }

        let plan = decision::plan_transform(&self.pending(), transform, sampling, ctx.desired_output());
        tracing::trace!(?plan, bounds = ?self.layer_bounds.get(), "transform plan");
        let (mut out, sampling) = match plan {
            TransformPlan::Defer { sampling } => (self.clone(), sampling),
            TransformPlan::Resolve { sampling } => {
                let resolved: FilterResult = self.resolve(ctx, self.layer_bounds).into();
                (resolved, sampling)
            }
        };
        if out.image.is_none() {
            return Self::empty();
        }

        out.transform = out.transform.post_concat(transform);
        out.sampling = if out.transform.integer_translation().is_some() {
            SamplingOptions::DEFAULT
        } else {
            sampling
        };
        match transform
            .map_irect(out.layer_bounds)
            .intersect(ctx.desired_output())
        {
            Some(bounds) => {
                out.layer_bounds = bounds;
                out
            }
            None => Self::empty(),
        }
    }

    /// Apply `filter` after the pending color filter.
    ///
    /// A filter that turns transparent black into color extends the result to the whole desired
    /// output; if the current clip would be visible in that area the result is rendered first so
    /// the clipped-out region keeps the filtered transparent color instead of leaking content.
    pub fn apply_color_filter(&self, ctx: &Context, filter: Arc<ColorFilter>) -> FilterResult {
        let plan = decision::plan_color_filter(&self.pending(), &filter, ctx.desired_output());
        tracing::trace!(?plan, "color filter plan");
        match plan {
            ColorFilterPlan::Empty => Self::empty(),
            ColorFilterPlan::FillDesired => {
                let color = filter.filter_color(Color4f::TRANSPARENT);
                Self::make_from_shader_in_layer(ctx, Shader::color(color), false)
            }
            ColorFilterPlan::Compose { bounds } => FilterResult {
                color_filter: ColorFilter::compose(Some(filter), self.color_filter.clone()),
                layer_bounds: bounds,
                ..self.clone()
            },
            ColorFilterPlan::ResolveThenCompose { resolve, bounds } => {
                let resolved: FilterResult = self.resolve(ctx, resolve).into();
                if resolved.image.is_none() {
                    return Self::empty();
                }
                FilterResult {
                    color_filter: Some(filter),
                    layer_bounds: bounds,
                    ..resolved
                }
            }
        }
    }

    /// Render everything pending inside `dst_bounds` into one pixel-aligned image.
    ///
    /// Returns the image and the layer position of its top-left corner, or `None` when nothing
    /// is visible or no scratch surface is available. An already pixel-aligned result with no
    /// color filter is returned as (a subset of) its own image without rendering.
    pub fn resolve(&self, ctx: &Context, dst_bounds: Layer<IRect>) -> (Option<SpecialImage>, Layer<IPoint>) {
        let none = (None, Layer::new(IPoint::ZERO));
        let Some(dst) = dst_bounds.intersect(self.layer_bounds) else {
            return none;
        };
        let Some(image) = &self.image else {
            return none;
        };

        if self.color_filter.is_none()
            && let Some(origin) = self.transform.integer_origin()
        {
            let image_bounds = Layer::new(IRect::from_size(image.dimensions()))
                .offset(origin - Layer::new(IPoint::ZERO));
            let Some(sub) = image_bounds.intersect(dst) else {
                return none;
            };
            if sub == image_bounds {
                return (Some(image.clone()), origin);
            }
            let local = sub.offset(Layer::new(IPoint::ZERO) - origin);
            return (image.make_subset(local.get()), sub.top_left());
        }

        let Some(sampler) = ResultSampler::new(self) else {
            return none;
        };
        let Some(mut surface) = ctx.make_surface(dst.size(), None) else {
            tracing::warn!(bounds = ?dst.get(), "no scratch surface; result dropped");
            return none;
        };
        tracing::debug!(bounds = ?dst.get(), state = ?self.state(), "resolving filter result");
        let offset = dst.top_left().to_float().get();
        surface.fill_with(
            |p| sampler.shade(Point::new(p.x + offset.x, p.y + offset.y)),
            BlendMode::Src,
            false,
        );
        (Some(surface.snapshot()), dst.top_left())
    }

    /// Resolve the whole result; convenience for consumers that need plain pixels.
    pub fn image_and_offset(&self, ctx: &Context) -> (Option<SpecialImage>, Layer<IPoint>) {
        self.resolve(ctx, self.layer_bounds)
    }

    /// Shader that reads this result in layer space (or parameter space with
    /// [`ShaderFlags::SAMPLE_IN_PARAMETER_SPACE`]). `None` for an empty result.
    ///
    /// Pending metadata is evaluated per sample when that is equivalent to rendering first;
    /// otherwise the part of the result inside the context's desired output is resolved.
    pub fn as_shader(
        &self,
        ctx: &Context,
        extra_sampling: SamplingOptions,
        flags: ShaderFlags,
    ) -> Option<Arc<Shader>> {
        let layer_matrix = ctx.mapping().layer_matrix();
        let plan = decision::plan_shader(
            &self.pending(),
            extra_sampling,
            flags,
            layer_matrix,
            ctx.desired_output(),
        )?;
        tracing::trace!(?plan, "shader plan");

        let shader = match plan {
            ShaderPlan::Deferred { sampling } => {
                let image = self.image.clone()?;
                Shader::image(image, sampling, self.transform.get())?
                    .with_color_filter(self.color_filter.clone())
            }
            ShaderPlan::Resolve => {
                let visible = self.layer_bounds.intersect(ctx.desired_output())?;
                let (image, origin) = self.resolve(ctx, visible);
                let origin = origin.to_float().get();
                Shader::image(image?, extra_sampling, Affine::translate((origin.x, origin.y)))?
            }
        };

        if flags.contains(ShaderFlags::SAMPLE_IN_PARAMETER_SPACE) {
            // Parameter coordinates q read the layer shader at layer_matrix * q.
            let layer_to_param = math::invert(layer_matrix)?;
            shader.with_local_matrix(layer_to_param)
        } else {
            Some(shader)
        }
    }

    /// Play `picture` back in parameter space, limited to `cull` and the desired output.
    pub fn make_from_picture(ctx: &Context, picture: &Picture, cull: Parameter<Rect>) -> FilterResult {
        let picture = picture.clipped(cull.get());
        if picture.is_empty() {
            return Self::empty();
        }
        let Some(dst) = ctx
            .mapping()
            .param_to_layer(Parameter::new(picture.cull()))
            .round_out()
            .intersect(ctx.desired_output())
        else {
            return Self::empty();
        };
        let Some(mut surface) = ctx.make_surface(dst.size(), None) else {
            tracing::warn!(bounds = ?dst.get(), "no scratch surface for picture");
            return Self::empty();
        };
        tracing::debug!(bounds = ?dst.get(), "rasterizing picture");
        let origin = dst.top_left().to_float().get();
        let to_surface = Affine::translate((-origin.x, -origin.y)) * ctx.mapping().layer_matrix();
        surface.draw_picture(&picture, to_surface);
        Self::new(Some(surface.snapshot()), dst.top_left())
    }

    /// Fill the desired output with `shader`, evaluated in parameter space.
    pub fn make_from_shader(ctx: &Context, shader: Arc<Shader>, dither: bool) -> FilterResult {
        match shader.with_local_matrix(ctx.mapping().layer_matrix()) {
            Some(shader) => Self::make_from_shader_in_layer(ctx, shader, dither),
            None => Self::empty(),
        }
    }

    /// Draw `image`'s `src_rect` into `dst_rect` (parameter space).
    ///
    /// A pixel-aligned `src_rect` becomes a subset of `image` with a deferred transform; any
    /// other source rectangle is rendered.
    pub fn make_from_image(
        ctx: &Context,
        image: &SpecialImage,
        src_rect: Rect,
        dst_rect: Parameter<Rect>,
        sampling: SamplingOptions,
    ) -> FilterResult {
        let Some(src_to_dst) = math::rect_to_rect(src_rect, dst_rect.get()) else {
            return Self::empty();
        };
        let image_rect = IRect::from_size(image.dimensions()).to_rect();
        let src = Layer::new(src_rect).intersect(Layer::new(image_rect));
        let Some(src) = src.map(|s| s.get()) else {
            return Self::empty();
        };
        let dst = math::map_rect_bbox(src_to_dst, src);
        let layer_matrix = ctx.mapping().layer_matrix();

        let aligned = math::round_nearest(src);
        let is_aligned = [
            (src.x0, aligned.left),
            (src.y0, aligned.top),
            (src.x1, aligned.right),
            (src.y1, aligned.bottom),
        ]
        .iter()
        .all(|&(f, i)| math::nearly_equal(f, f64::from(i), math::ROUND_EPSILON));

        if is_aligned {
            let Some(subset) = image.make_subset(aligned) else {
                return Self::empty();
            };
            let Some(place) = math::rect_to_rect(IRect::from_size(subset.dimensions()).to_rect(), dst) else {
                return Self::empty();
            };
            let result = Self::new(Some(subset), Layer::new(IPoint::ZERO));
            return result.apply_transform(ctx, Layer::new(layer_matrix * place), sampling);
        }

        let Some(shader) = Shader::image(image.clone(), sampling, layer_matrix * src_to_dst) else {
            return Self::empty();
        };
        let Some(bounds) = Layer::new(math::map_rect_bbox(layer_matrix, dst))
            .round_out()
            .intersect(ctx.desired_output())
        else {
            return Self::empty();
        };
        let src_clip = Layer::new(src);
        let dst_to_src = math::invert(layer_matrix * src_to_dst);
        let Some(dst_to_src) = dst_to_src else {
            return Self::empty();
        };
        Self::fill_bounds(ctx, bounds, false, |p| {
            let q = dst_to_src * p;
            if src_clip.get().contains(q) {
                shader.shade(p)
            } else {
                Color4f::TRANSPARENT
            }
        })
    }

    /// Fill the desired output with a shader already expressed in layer space.
    pub(crate) fn make_from_shader_in_layer(ctx: &Context, shader: Arc<Shader>, dither: bool) -> FilterResult {
        let bounds = ctx.desired_output();
        if bounds.is_empty() {
            return Self::empty();
        }
        Self::fill_bounds(ctx, bounds, dither, |p| shader.shade(p))
    }

    /// One paint over `bounds` with `shade` evaluated at layer-space pixel centers.
    pub(crate) fn fill_bounds(
        ctx: &Context,
        bounds: Layer<IRect>,
        dither: bool,
        shade: impl Fn(Point) -> Color4f,
    ) -> FilterResult {
        let Some(mut surface) = ctx.make_surface(bounds.size(), None) else {
            tracing::warn!(bounds = ?bounds.get(), "no scratch surface; result dropped");
            return Self::empty();
        };
        tracing::debug!(bounds = ?bounds.get(), "filling layer bounds");
        let offset = bounds.top_left().to_float().get();
        surface.fill_with(
            |p| shade(Point::new(p.x + offset.x, p.y + offset.y)),
            BlendMode::Src,
            dither,
        );
        Self::new(Some(surface.snapshot()), bounds.top_left())
    }
}

/// Per-pixel evaluation of a result's pending metadata at layer-space points.
pub(crate) struct ResultSampler<'a> {
    image: &'a SpecialImage,
    inverse: Affine,
    sampling: SamplingOptions,
    color_filter: Option<&'a ColorFilter>,
    bounds: Rect,
}

impl<'a> ResultSampler<'a> {
    /// `None` for an empty result or a singular transform.
    pub(crate) fn new(result: &'a FilterResult) -> Option<Self> {
        if result.layer_bounds.is_empty() {
            return None;
        }
        Some(Self {
            image: result.image.as_ref()?,
            inverse: result.transform.invert()?.get(),
            sampling: result.sampling,
            color_filter: result.color_filter.as_deref(),
            bounds: result.layer_bounds.to_float().get(),
        })
    }

    pub(crate) fn shade(&self, p: Point) -> Color4f {
        let b = &self.bounds;
        if !(p.x >= b.x0 && p.x < b.x1 && p.y >= b.y0 && p.y < b.y1) {
            return Color4f::TRANSPARENT;
        }
        let c = self.image.sample(self.inverse * p, self.sampling);
        match self.color_filter {
            Some(f) => f.filter_color(c),
            None => c,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/result.rs"]
mod tests;
