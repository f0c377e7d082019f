use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::filter::context::Context;
use crate::filter::result::{FilterResult, ResultSampler};
use crate::foundation::core::{IRect, Point};
use crate::geometry::Layer;
use crate::image::color::{BlendMode, Color4f};
use crate::image::sampling::SamplingOptions;
use crate::image::shader::Shader;

bitflags! {
    /// How [`Builder::eval`] prepares its inputs and sizes its output.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ShaderFlags: u32 {
        /// Input shaders read parameter-space coordinates and the combined shader is mapped
        /// back into layer space.
        const SAMPLE_IN_PARAMETER_SPACE = 1;
        /// Render every input to an image before making its shader. Needed by combinators that
        /// read arbitrary texels rather than evaluating a shader at one point.
        const FORCE_RESOLVE_INPUTS = 1 << 1;
        /// The combinator samples inputs away from pixel centers, so an input cannot be read
        /// with nearest or integer-translation shortcuts.
        const NON_TRIVIAL_SAMPLING = 1 << 2;
        /// Output is clipped to the union of the input bounds instead of covering the whole
        /// desired output.
        const OUTPUT_FILLS_INPUT_UNION = 1 << 3;
    }
}

/// Collects filter results and combines them into one.
#[derive(Debug)]
pub struct Builder<'a> {
    context: &'a Context,
    inputs: SmallVec<[FilterResult; 2]>,
}

impl<'a> Builder<'a> {
    pub fn new(context: &'a Context) -> Self {
        Self {
            context,
            inputs: SmallVec::new(),
        }
    }

    pub fn add(mut self, input: FilterResult) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn inputs(&self) -> &[FilterResult] {
        &self.inputs
    }

    /// Non-empty inputs that reach the desired output, with their visible bounds.
    fn visible_inputs(&self) -> SmallVec<[(&FilterResult, Layer<IRect>); 2]> {
        let desired = self.context.desired_output();
        self.inputs
            .iter()
            .filter(|i| !i.is_empty())
            .filter_map(|i| i.layer_bounds().intersect(desired).map(|b| (i, b)))
            .collect()
    }

    /// Union of the visible input bounds, `None` when no input reaches the desired output.
    fn input_union(&self) -> Option<Layer<IRect>> {
        self.visible_inputs()
            .into_iter()
            .map(|(_, b)| b)
            .reduce(|a, b| a.union(b))
    }

    /// Source-over composite of all inputs, first input at the bottom.
    ///
    /// A single non-empty input is only cropped; two or more are painted into one surface in a
    /// single pass.
    pub fn merge(self) -> FilterResult {
        let ctx = self.context;
        let visible = self.visible_inputs();
        let Some(bounds) = visible.iter().map(|(_, b)| *b).reduce(|a, b| a.union(b)) else {
            return FilterResult::empty();
        };
        if let [(only, _)] = visible.as_slice() {
            return only.apply_crop(ctx, bounds);
        }

        let samplers: SmallVec<[ResultSampler<'_>; 2]> =
            visible.iter().filter_map(|(i, _)| ResultSampler::new(i)).collect();
        tracing::debug!(inputs = samplers.len(), bounds = ?bounds.get(), "merging inputs");
        FilterResult::fill_bounds(ctx, bounds, false, |p| {
            samplers.iter().fold(Color4f::TRANSPARENT, |dst, s| {
                BlendMode::SrcOver.blend(s.shade(p), dst)
            })
        })
    }

    /// Bounds [`Builder::eval`] would paint for `flags`.
    pub fn output_bounds(&self, flags: ShaderFlags) -> Option<Layer<IRect>> {
        let desired = self.context.desired_output();
        let bounds = if flags.contains(ShaderFlags::OUTPUT_FILLS_INPUT_UNION) {
            self.input_union()?
        } else {
            desired
        };
        (!bounds.is_empty()).then_some(bounds)
    }

    /// Turn every input into a shader (`None` for empty inputs), combine them with `shader_fn`
    /// and paint the combination over the output bounds.
    ///
    /// Inputs are converted against a context whose desired output is the output bounds, so an
    /// input is only rendered over the region that will be read.
    pub fn eval<F>(self, shader_fn: F, flags: ShaderFlags, extra_sampling: SamplingOptions) -> FilterResult
    where
        F: FnOnce(&[Option<Arc<Shader>>]) -> Option<Arc<Shader>>,
    {
        let Some(bounds) = self.output_bounds(flags) else {
            return FilterResult::empty();
        };
        let ctx = self.context.with_new_desired_output(bounds);
        let shaders: SmallVec<[Option<Arc<Shader>>; 2]> = self
            .inputs
            .iter()
            .map(|input| input.as_shader(&ctx, extra_sampling, flags))
            .collect();

        let Some(mut shader) = shader_fn(&shaders) else {
            return FilterResult::empty();
        };
        if flags.contains(ShaderFlags::SAMPLE_IN_PARAMETER_SPACE) {
            match shader.with_local_matrix(ctx.mapping().layer_matrix()) {
                Some(s) => shader = s,
                None => return FilterResult::empty(),
            }
        }
        tracing::debug!(inputs = shaders.len(), bounds = ?bounds.get(), ?flags, "evaluating shader");
        FilterResult::fill_bounds(&ctx, bounds, false, |p: Point| shader.shade(p))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/builder.rs"]
mod tests;
