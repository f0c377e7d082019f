use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::filter::builder::{Builder, ShaderFlags};
use crate::filter::cache::CacheKey;
use crate::filter::context::Context;
use crate::filter::result::FilterResult;
use crate::foundation::core::{Affine, ISize, Rect, Vector};
use crate::foundation::error::FxResult;
use crate::foundation::math;
use crate::geometry::{Layer, Parameter};
use crate::graph::model::{self, FilterSpec};
use crate::image::color::{BlendMode, Color4f, ColorFilter};
use crate::image::picture::Picture;
use crate::image::sampling::SamplingOptions;
use crate::image::shader::Shader;
use crate::mapping::MatrixCapability;

static NEXT_FILTER_ID: AtomicU64 = AtomicU64::new(1);

/// What a node does with its inputs. Parameters are in parameter space.
#[derive(Debug, Clone)]
pub enum FilterOp {
    Source,
    Empty,
    Offset(Vector),
    Transform {
        matrix: Affine,
        sampling: SamplingOptions,
    },
    Crop(Rect),
    ColorFilter(Arc<ColorFilter>),
    Flood {
        color: Color4f,
        rect: Option<Rect>,
    },
    /// Source-over of every input, first at the bottom.
    Merge,
    /// Input 1 blended onto input 0.
    Blend(BlendMode),
    /// Input 0 evaluated with the output of input 1 as its source.
    Compose,
    Picture {
        picture: Picture,
        cull: Rect,
    },
}

impl FilterOp {
    fn name(&self) -> &'static str {
        match self {
            FilterOp::Source => "source",
            FilterOp::Empty => "empty",
            FilterOp::Offset(_) => "offset",
            FilterOp::Transform { .. } => "transform",
            FilterOp::Crop(_) => "crop",
            FilterOp::ColorFilter(_) => "color_filter",
            FilterOp::Flood { .. } => "flood",
            FilterOp::Merge => "merge",
            FilterOp::Blend(_) => "blend",
            FilterOp::Compose => "compose",
            FilterOp::Picture { .. } => "picture",
        }
    }

    fn capability(&self) -> MatrixCapability {
        match self {
            // Parameter rects become layer rects only under axis-aligned layer matrices.
            FilterOp::Crop(_) | FilterOp::Flood { rect: Some(_), .. } => {
                MatrixCapability::ScaleTranslate
            }
            _ => MatrixCapability::Complex,
        }
    }
}

/// A node of a filter graph. `None` inputs read the context's source.
#[derive(Debug)]
pub struct ImageFilter {
    id: u64,
    op: FilterOp,
    inputs: SmallVec<[Option<Arc<ImageFilter>>; 2]>,
}

impl ImageFilter {
    pub fn new(op: FilterOp, inputs: impl IntoIterator<Item = Option<Arc<ImageFilter>>>) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_FILTER_ID.fetch_add(1, Ordering::Relaxed),
            op,
            inputs: inputs.into_iter().collect(),
        })
    }

    /// Build the node tree for a validated description.
    pub fn from_spec(spec: &FilterSpec) -> FxResult<Arc<Self>> {
        spec.validate()?;
        Self::build(spec)
    }

    fn build(spec: &FilterSpec) -> FxResult<Arc<Self>> {
        let input = |i: &Option<Box<FilterSpec>>| -> FxResult<Option<Arc<Self>>> {
            i.as_deref().map(Self::build).transpose()
        };
        Ok(match spec {
            FilterSpec::Source => Self::new(FilterOp::Source, []),
            FilterSpec::Empty => Self::new(FilterOp::Empty, []),
            FilterSpec::Offset { dx, dy, input: i } => {
                Self::new(FilterOp::Offset(Vector::new(*dx, *dy)), [input(i)?])
            }
            FilterSpec::Transform {
                matrix,
                sampling,
                input: i,
            } => Self::new(
                FilterOp::Transform {
                    matrix: Affine::new(*matrix),
                    sampling: *sampling,
                },
                [input(i)?],
            ),
            FilterSpec::Crop { rect, input: i } => Self::new(FilterOp::Crop(rect.to_rect()), [input(i)?]),
            FilterSpec::ColorMatrix { matrix, input: i } => Self::new(
                FilterOp::ColorFilter(ColorFilter::matrix(matrix.to_matrix()?)),
                [input(i)?],
            ),
            FilterSpec::Flood { color, rect } => Self::new(
                FilterOp::Flood {
                    color: color.to_color(),
                    rect: rect.map(|r| r.to_rect()),
                },
                [],
            ),
            FilterSpec::Merge { inputs } => {
                let inputs = inputs
                    .iter()
                    .map(|i| i.as_ref().map(Self::build).transpose())
                    .collect::<FxResult<Vec<_>>>()?;
                Self::new(FilterOp::Merge, inputs)
            }
            FilterSpec::Blend {
                mode,
                background,
                foreground,
            } => Self::new(FilterOp::Blend(*mode), [input(background)?, input(foreground)?]),
            FilterSpec::Compose { outer, inner } => Self::new(
                FilterOp::Compose,
                [Some(Self::build(outer)?), Some(Self::build(inner)?)],
            ),
            FilterSpec::Picture { cull, ops } => Self::new(
                FilterOp::Picture {
                    picture: model::build_picture(*cull, ops)?,
                    cull: cull.to_rect(),
                },
                [],
            ),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn op(&self) -> &FilterOp {
        &self.op
    }

    pub fn inputs(&self) -> &[Option<Arc<ImageFilter>>] {
        &self.inputs
    }

    /// Most complex parameter→layer transform the whole subtree evaluates correctly.
    pub fn capability(&self) -> MatrixCapability {
        self.inputs
            .iter()
            .flatten()
            .fold(self.op.capability(), |cap, f| cap.min(f.capability()))
    }

    /// Evaluate this node, going through the context's cache when one is attached.
    #[tracing::instrument(level = "trace", skip(self, ctx), fields(node = self.id, op = self.op.name()))]
    pub fn filter_image(&self, ctx: &Context) -> FilterResult {
        if ctx.desired_output().is_empty() {
            return FilterResult::empty();
        }
        let cached = ctx.cache().map(|cache| (cache, CacheKey::new(self.id, ctx)));
        if let Some((cache, key)) = &cached
            && let Some(hit) = cache.get(key)
        {
            return hit;
        }

        let result = self.on_filter_image(ctx);
        if let Some((cache, key)) = cached {
            cache.put(key, result.clone());
        }
        result
    }

    fn input(&self, index: usize, ctx: &Context) -> FilterResult {
        match self.inputs.get(index) {
            Some(Some(filter)) => filter.filter_image(ctx),
            _ => ctx.source().clone(),
        }
    }

    fn on_filter_image(&self, ctx: &Context) -> FilterResult {
        let mapping = ctx.mapping();
        let desired = ctx.desired_output();
        match &self.op {
            FilterOp::Source => ctx.source().apply_crop(ctx, desired),
            FilterOp::Empty => FilterResult::empty(),
            FilterOp::Offset(v) => {
                let offset = mapping.param_to_layer(Parameter::new(*v));
                let back = Layer::new(Vector::new(-offset.x(), -offset.y()));
                let wanted = desired.to_float().offset(back).round_out();
                self.input(0, &ctx.with_new_desired_output(wanted))
                    .apply_transform(ctx, Layer::<Affine>::translate(offset), SamplingOptions::DEFAULT)
            }
            FilterOp::Transform { matrix, sampling } => {
                let layer_matrix = mapping.layer_matrix();
                let Some(to_param) = math::invert(layer_matrix) else {
                    return FilterResult::empty();
                };
                let transform = Layer::new(layer_matrix * *matrix * to_param);
                let Some(wanted) = transform.inverse_map_irect(desired) else {
                    return FilterResult::empty();
                };
                // Filtering reads one texel past the edge.
                let wanted = wanted.outset(Layer::new(ISize::new(1, 1)));
                self.input(0, &ctx.with_new_desired_output(wanted))
                    .apply_transform(ctx, transform, *sampling)
            }
            FilterOp::Crop(rect) => {
                let crop = mapping.param_to_layer(Parameter::new(*rect)).round_out();
                let Some(wanted) = crop.intersect(desired) else {
                    return FilterResult::empty();
                };
                self.input(0, &ctx.with_new_desired_output(wanted))
                    .apply_crop(ctx, crop)
            }
            FilterOp::ColorFilter(filter) => self.input(0, ctx).apply_color_filter(ctx, Arc::clone(filter)),
            FilterOp::Flood { color, rect } => {
                let area = match rect {
                    Some(r) => match mapping.param_to_layer(Parameter::new(*r)).round_out().intersect(desired) {
                        Some(area) => area,
                        None => return FilterResult::empty(),
                    },
                    None => desired,
                };
                FilterResult::make_from_shader(&ctx.with_new_desired_output(area), Shader::color(*color), false)
            }
            FilterOp::Merge => (0..self.inputs.len())
                .fold(Builder::new(ctx), |b, i| b.add(self.input(i, ctx)))
                .merge(),
            FilterOp::Blend(mode) => {
                let mode = *mode;
                Builder::new(ctx)
                    .add(self.input(0, ctx))
                    .add(self.input(1, ctx))
                    .eval(
                        |shaders| {
                            let transparent = || Shader::color(Color4f::TRANSPARENT);
                            let dst = shaders[0].clone().unwrap_or_else(transparent);
                            let src = shaders[1].clone().unwrap_or_else(transparent);
                            Some(Shader::blend(mode, src, dst))
                        },
                        ShaderFlags::OUTPUT_FILLS_INPUT_UNION,
                        SamplingOptions::DEFAULT,
                    )
            }
            FilterOp::Compose => {
                let inner = self.input(1, ctx);
                self.input(0, &ctx.with_new_source_result(inner))
            }
            FilterOp::Picture { picture, cull } => {
                FilterResult::make_from_picture(ctx, picture, Parameter::new(*cull))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/node.rs"]
mod tests;
