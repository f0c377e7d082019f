use std::sync::Arc;

use crate::foundation::core::{Affine, Point};
use crate::foundation::math;
use crate::image::color::{BlendMode, Color4f, ColorFilter};
use crate::image::sampling::SamplingOptions;
use crate::image::special::SpecialImage;

/// User-supplied per-pixel program, used by combinators that are not expressible with the
/// built-in shader nodes.
pub trait ShaderProgram: Send + Sync + std::fmt::Debug {
    /// Premultiplied color at `p` in the program's coordinate space.
    fn shade(&self, p: Point) -> Color4f;
}

/// Paint source evaluated per pixel center.
#[derive(Clone, Debug)]
pub enum Shader {
    Color(Color4f),
    /// Decal image. `inverse` maps shader coordinates back to image coordinates.
    Image {
        image: SpecialImage,
        sampling: SamplingOptions,
        inverse: Affine,
    },
    Filtered {
        shader: Arc<Shader>,
        filter: Arc<ColorFilter>,
    },
    /// `shader` drawn through a transform; `inverse` is the inverse of that transform.
    LocalMatrix { shader: Arc<Shader>, inverse: Affine },
    Blend {
        mode: BlendMode,
        src: Arc<Shader>,
        dst: Arc<Shader>,
    },
    Custom(Arc<dyn ShaderProgram>),
}

impl Shader {
    pub fn color(c: Color4f) -> Arc<Shader> {
        Arc::new(Shader::Color(c))
    }

    /// Image placed by `transform` (image coordinates → shader coordinates). `None` when the
    /// transform is singular.
    pub fn image(
        image: SpecialImage,
        sampling: SamplingOptions,
        transform: Affine,
    ) -> Option<Arc<Shader>> {
        let inverse = math::invert(transform)?;
        Some(Arc::new(Shader::Image {
            image,
            sampling,
            inverse,
        }))
    }

    pub fn blend(mode: BlendMode, src: Arc<Shader>, dst: Arc<Shader>) -> Arc<Shader> {
        Arc::new(Shader::Blend { mode, src, dst })
    }

    pub fn custom(program: Arc<dyn ShaderProgram>) -> Arc<Shader> {
        Arc::new(Shader::Custom(program))
    }

    pub fn with_color_filter(self: Arc<Self>, filter: Option<Arc<ColorFilter>>) -> Arc<Shader> {
        match filter {
            Some(filter) => Arc::new(Shader::Filtered {
                shader: self,
                filter,
            }),
            None => self,
        }
    }

    /// The same shader drawn through `m`. `None` when `m` is singular.
    pub fn with_local_matrix(self: Arc<Self>, m: Affine) -> Option<Arc<Shader>> {
        if m == Affine::IDENTITY {
            return Some(self);
        }
        let inverse = math::invert(m)?;
        Some(Arc::new(Shader::LocalMatrix {
            shader: self,
            inverse,
        }))
    }

    pub fn shade(&self, p: Point) -> Color4f {
        match self {
            Shader::Color(c) => *c,
            Shader::Image {
                image,
                sampling,
                inverse,
            } => image.sample(*inverse * p, *sampling),
            Shader::Filtered { shader, filter } => filter.filter_color(shader.shade(p)),
            Shader::LocalMatrix { shader, inverse } => shader.shade(*inverse * p),
            Shader::Blend { mode, src, dst } => mode.blend(src.shade(p), dst.shade(p)),
            Shader::Custom(program) => program.shade(p),
        }
    }
}
