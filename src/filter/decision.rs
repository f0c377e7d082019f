//! Pure "can this stay lazy" rules for [`crate::FilterResult`].
//!
//! Every operation on a filter result first asks one of these planners whether the new step can
//! be folded into the deferred metadata or whether the current result has to be rendered. The
//! planners only look at metadata, never at pixels, so they are cheap and testable in isolation.

use crate::filter::builder::ShaderFlags;
use crate::foundation::core::{Affine, IRect, ISize};
use crate::geometry::Layer;
use crate::geometry::transform::quad_contains_rect;
use crate::image::color::ColorFilter;
use crate::image::sampling::{SamplingOptions, merge_sampling};

/// The deferred state of a filter result, as seen by the planners.
#[derive(Clone, Copy, Debug)]
pub struct PendingOps<'a> {
    /// Dimensions of the backing image; `None` when there is no image.
    pub image_size: Option<ISize>,
    pub sampling: SamplingOptions,
    /// Image coordinates → layer coordinates.
    pub transform: Layer<Affine>,
    pub color_filter: Option<&'a ColorFilter>,
    pub layer_bounds: Layer<IRect>,
}

impl PendingOps<'_> {
    fn fills_transparent(&self) -> bool {
        self.color_filter
            .is_some_and(ColorFilter::affects_transparent_black)
    }
}

/// What to do with a new transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformPlan {
    /// Fold into the pending transform and sample once with `sampling`.
    Defer { sampling: SamplingOptions },
    /// Render first, then attach the transform with `sampling`.
    Resolve { sampling: SamplingOptions },
}

/// What to do with a new color filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorFilterPlan {
    /// The filtered result is transparent everywhere.
    Empty,
    /// Nothing to filter, but the filter turns transparent black into color: flood the desired
    /// output with the filtered transparent color.
    FillDesired,
    /// Compose with the pending filter and clip to `bounds`.
    Compose { bounds: Layer<IRect> },
    /// The pending clip would be lost under a transparent-affecting filter; render `resolve`
    /// first, then compose and clip to `bounds`.
    ResolveThenCompose {
        resolve: Layer<IRect>,
        bounds: Layer<IRect>,
    },
}

/// How to turn a result into a shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShaderPlan {
    /// Sample the backing image directly with `sampling`, applying pending metadata per pixel.
    Deferred { sampling: SamplingOptions },
    /// Render to an image first and sample that.
    Resolve,
}

/// True when the result's clip edge can be seen once `extra` is applied and the output is
/// restricted to `dst`, i.e. dropping the clip would change visible pixels.
pub fn is_cropped(pending: &PendingOps<'_>, extra: Layer<Affine>, dst: Layer<IRect>) -> bool {
    let Some(size) = pending.image_size else {
        return false;
    };
    let content = if pending.fills_transparent() {
        dst
    } else {
        let image_rect = Layer::new(IRect::from_size(size));
        let placed = extra.pre_concat(pending.transform).map_irect(image_rect);
        match placed.intersect(dst) {
            Some(c) => c,
            None => return false,
        }
    };
    !quad_contains_rect(extra, pending.layer_bounds.get(), content.get())
}

/// Decide whether `next` can be composed into the pending transform.
///
/// Composition is legal when one sampling pass with the merged options matches sampling twice
/// and the pending clip stays outside the visible area.
pub fn plan_transform(
    pending: &PendingOps<'_>,
    next: Layer<Affine>,
    sampling: SamplingOptions,
    desired: Layer<IRect>,
) -> TransformPlan {
    let current_is_integer = pending.transform.integer_translation().is_some();
    let next_is_integer = next.integer_translation().is_some();
    let next_sampling = if next_is_integer {
        SamplingOptions::DEFAULT
    } else {
        sampling
    };

    let cropped = !next_is_integer && is_cropped(pending, next, desired);
    let filter_bleeds = !next_is_integer && pending.fills_transparent();
    let merged = merge_sampling(
        pending.sampling,
        current_is_integer,
        next_sampling,
        next_is_integer,
    );

    match merged {
        Some(sampling) if !cropped && !filter_bleeds => TransformPlan::Defer { sampling },
        _ => TransformPlan::Resolve {
            sampling: next_sampling,
        },
    }
}

/// Decide how `filter` attaches to the pending state.
pub fn plan_color_filter(
    pending: &PendingOps<'_>,
    filter: &ColorFilter,
    desired: Layer<IRect>,
) -> ColorFilterPlan {
    let visible = pending
        .image_size
        .and_then(|_| pending.layer_bounds.intersect(desired));

    if filter.affects_transparent_black() {
        let Some(visible) = visible else {
            return ColorFilterPlan::FillDesired;
        };
        if is_cropped(pending, Layer::<Affine>::identity(), desired) {
            return ColorFilterPlan::ResolveThenCompose {
                resolve: visible,
                bounds: desired,
            };
        }
        return ColorFilterPlan::Compose { bounds: desired };
    }

    match visible {
        Some(bounds) => ColorFilterPlan::Compose { bounds },
        None => ColorFilterPlan::Empty,
    }
}

/// Decide whether a shader can sample the pending state directly. `None` when there is nothing
/// to sample.
///
/// `layer_matrix` is the parameter→layer matrix, used when inputs are sampled in parameter
/// space; `desired` is the region the shader will be evaluated over.
pub fn plan_shader(
    pending: &PendingOps<'_>,
    extra_sampling: SamplingOptions,
    flags: ShaderFlags,
    layer_matrix: Affine,
    desired: Layer<IRect>,
) -> Option<ShaderPlan> {
    pending.image_size?;

    let current_is_integer = pending.transform.integer_translation().is_some();
    let next_is_integer = !flags.contains(ShaderFlags::NON_TRIVIAL_SAMPLING)
        && (!flags.contains(ShaderFlags::SAMPLE_IN_PARAMETER_SPACE)
            || Layer::new(layer_matrix)
                .invert()
                .is_some_and(|inv| inv.integer_translation().is_some()));

    let merged = merge_sampling(
        pending.sampling,
        current_is_integer,
        extra_sampling,
        next_is_integer,
    );
    let needs_resolve = flags.contains(ShaderFlags::FORCE_RESOLVE_INPUTS)
        || merged.is_none()
        || is_cropped(pending, Layer::<Affine>::identity(), desired);

    Some(match merged {
        Some(sampling) if !needs_resolve => ShaderPlan::Deferred { sampling },
        _ => ShaderPlan::Resolve,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/filter/decision.rs"]
mod tests;
