use std::sync::Arc;

use crate::foundation::math::{Fnv1a64, u8_to_unit, unit_to_u8};

/// Premultiplied RGBA color with components in `[0, 1]`.
///
/// All blending in the crate happens on this type; pixel buffers store the same values quantized
/// to premultiplied RGBA8.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color4f {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4f {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Premultiplied components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Straight-alpha components, premultiplied on construction.
    pub fn from_unpremul(r: f32, g: f32, b: f32, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self::new(
            r.clamp(0.0, 1.0) * a,
            g.clamp(0.0, 1.0) * a,
            b.clamp(0.0, 1.0) * a,
            a,
        )
    }

    pub fn from_rgba8_premul(px: [u8; 4]) -> Self {
        Self::new(
            u8_to_unit(px[0]),
            u8_to_unit(px[1]),
            u8_to_unit(px[2]),
            u8_to_unit(px[3]),
        )
    }

    /// Straight-alpha RGBA8, e.g. as authored in a graph description.
    pub fn from_rgba8(px: [u8; 4]) -> Self {
        Self::from_unpremul(
            u8_to_unit(px[0]),
            u8_to_unit(px[1]),
            u8_to_unit(px[2]),
            u8_to_unit(px[3]),
        )
    }

    pub fn to_rgba8_premul(self) -> [u8; 4] {
        let a = unit_to_u8(self.a);
        // Keep the premultiplied invariant after quantization.
        let c = |v: f32| unit_to_u8(v).min(a);
        [c(self.r), c(self.g), c(self.b), a]
    }

    /// Straight-alpha components; fully transparent colors become transparent black.
    pub fn unpremul(self) -> [f32; 4] {
        if self.a <= 0.0 {
            return [0.0; 4];
        }
        let inv = 1.0 / self.a;
        [
            (self.r * inv).min(1.0),
            (self.g * inv).min(1.0),
            (self.b * inv).min(1.0),
            self.a,
        ]
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.r * s, self.g * s, self.b * s, self.a * s)
    }

    pub fn add(self, o: Self) -> Self {
        Self::new(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }

    pub fn clamp(self) -> Self {
        let a = self.a.clamp(0.0, 1.0);
        Self::new(
            self.r.clamp(0.0, a),
            self.g.clamp(0.0, a),
            self.b.clamp(0.0, a),
            a,
        )
    }

    pub fn is_transparent(self) -> bool {
        self.a <= 1.0 / 512.0
            && self.r.abs() <= 1.0 / 512.0
            && self.g.abs() <= 1.0 / 512.0
            && self.b.abs() <= 1.0 / 512.0
    }
}

/// Pixel format of scratch surfaces. Pixels are always held as premultiplied RGBA8 in memory;
/// the tag travels with the context for consumers that care about the target format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorType {
    #[default]
    Rgba8888,
    Bgra8888,
    Alpha8,
    RgbaF16,
}

/// Opaque color space tag carried through evaluation. No conversion math is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    #[default]
    Srgb,
    LinearSrgb,
    DisplayP3,
    Rec2020,
}

/// Porter-Duff operators plus a few separable modes, on premultiplied colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    Clear,
    Src,
    Dst,
    #[default]
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcATop,
    DstATop,
    Xor,
    Plus,
    Modulate,
    Screen,
    Multiply,
}

impl BlendMode {
    pub fn blend(self, src: Color4f, dst: Color4f) -> Color4f {
        let (sa, da) = (src.a, dst.a);
        let out = match self {
            BlendMode::Clear => Color4f::TRANSPARENT,
            BlendMode::Src => src,
            BlendMode::Dst => dst,
            BlendMode::SrcOver => src.add(dst.scale(1.0 - sa)),
            BlendMode::DstOver => dst.add(src.scale(1.0 - da)),
            BlendMode::SrcIn => src.scale(da),
            BlendMode::DstIn => dst.scale(sa),
            BlendMode::SrcOut => src.scale(1.0 - da),
            BlendMode::DstOut => dst.scale(1.0 - sa),
            BlendMode::SrcATop => src.scale(da).add(dst.scale(1.0 - sa)),
            BlendMode::DstATop => dst.scale(sa).add(src.scale(1.0 - da)),
            BlendMode::Xor => src.scale(1.0 - da).add(dst.scale(1.0 - sa)),
            BlendMode::Plus => src.add(dst),
            BlendMode::Modulate => per_channel(src, dst, |s, d| s * d),
            BlendMode::Screen => per_channel(src, dst, |s, d| s + d - s * d),
            BlendMode::Multiply => per_channel(src, dst, |s, d| s * d)
                .add(src.scale(1.0 - da))
                .add(dst.scale(1.0 - sa)),
        };
        out.clamp()
    }
}

fn per_channel(s: Color4f, d: Color4f, f: impl Fn(f32, f32) -> f32) -> Color4f {
    Color4f::new(f(s.r, d.r), f(s.g, d.g), f(s.b, d.b), f(s.a, d.a))
}

/// 4x5 row-major matrix over straight-alpha RGBA; the fifth column is an offset in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorMatrix(pub [f32; 20]);

impl ColorMatrix {
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]);

    /// Rec. 709 luma.
    pub const GRAYSCALE: Self = Self([
        0.2126, 0.7152, 0.0722, 0.0, 0.0, //
        0.2126, 0.7152, 0.0722, 0.0, 0.0, //
        0.2126, 0.7152, 0.0722, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]);

    pub const SEPIA: Self = Self([
        0.393, 0.769, 0.189, 0.0, 0.0, //
        0.349, 0.686, 0.168, 0.0, 0.0, //
        0.272, 0.534, 0.131, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]);

    pub fn apply(&self, rgba: [f32; 4]) -> [f32; 4] {
        let m = &self.0;
        let row = |i: usize| {
            let o = i * 5;
            (m[o] * rgba[0] + m[o + 1] * rgba[1] + m[o + 2] * rgba[2] + m[o + 3] * rgba[3] + m[o + 4])
                .clamp(0.0, 1.0)
        };
        [row(0), row(1), row(2), row(3)]
    }
}

/// Per-pixel color transform applied after sampling.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorFilter {
    Matrix(ColorMatrix),
    /// Blend a constant (premultiplied) color over each pixel with `mode`; the pixel is `dst`.
    Blend { color: Color4f, mode: BlendMode },
    /// `outer(inner(c))`.
    Compose {
        outer: Arc<ColorFilter>,
        inner: Arc<ColorFilter>,
    },
}

impl ColorFilter {
    pub fn matrix(m: ColorMatrix) -> Arc<ColorFilter> {
        Arc::new(ColorFilter::Matrix(m))
    }

    pub fn blend(color: Color4f, mode: BlendMode) -> Arc<ColorFilter> {
        Arc::new(ColorFilter::Blend { color, mode })
    }

    /// Filter applying `inner` first, then `outer`. A missing half leaves the other unchanged.
    pub fn compose(
        outer: Option<Arc<ColorFilter>>,
        inner: Option<Arc<ColorFilter>>,
    ) -> Option<Arc<ColorFilter>> {
        match (outer, inner) {
            (None, x) | (x, None) => x,
            (Some(outer), Some(inner)) => Some(Arc::new(ColorFilter::Compose { outer, inner })),
        }
    }

    pub fn filter_color(&self, c: Color4f) -> Color4f {
        match self {
            ColorFilter::Matrix(m) => {
                let [r, g, b, a] = m.apply(c.unpremul());
                Color4f::from_unpremul(r, g, b, a)
            }
            ColorFilter::Blend { color, mode } => mode.blend(*color, c),
            ColorFilter::Compose { outer, inner } => outer.filter_color(inner.filter_color(c)),
        }
    }

    /// True when transparent black does not stay transparent (e.g. a flood or an alpha offset).
    /// Such filters turn the infinite transparent plane around an image into visible color.
    pub fn affects_transparent_black(&self) -> bool {
        !self.filter_color(Color4f::TRANSPARENT).is_transparent()
    }

    /// Feed the filter's full description into `h`; equal filters hash equally.
    pub(crate) fn hash_into(&self, h: &mut Fnv1a64) {
        match self {
            ColorFilter::Matrix(m) => {
                h.write_u8(0);
                for v in m.0 {
                    h.write_f64(f64::from(v));
                }
            }
            ColorFilter::Blend { color, mode } => {
                h.write_u8(1);
                for v in [color.r, color.g, color.b, color.a] {
                    h.write_f64(f64::from(v));
                }
                h.write_u8(*mode as u8);
            }
            ColorFilter::Compose { outer, inner } => {
                h.write_u8(2);
                outer.hash_into(h);
                inner.hash_into(h);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/color.rs"]
mod tests;
