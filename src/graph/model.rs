//! JSON description of a filter graph.

use serde::{Deserialize, Serialize};

use crate::foundation::core::{BezPath, Rect};
use crate::foundation::error::{FxError, FxResult};
use crate::image::color::{BlendMode, Color4f, ColorMatrix};
use crate::image::picture::Picture;
use crate::image::sampling::SamplingOptions;

/// One filter node. Missing `input`s read the evaluation source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSpec {
    Source,
    Empty,
    Offset {
        dx: f64,
        dy: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Box<FilterSpec>>,
    },
    /// Parameter-space affine `[a, b, c, d, e, f]` (kurbo coefficient order).
    Transform {
        matrix: [f64; 6],
        #[serde(default)]
        sampling: SamplingOptions,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Box<FilterSpec>>,
    },
    Crop {
        rect: RectDef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Box<FilterSpec>>,
    },
    ColorMatrix {
        matrix: ColorMatrixDef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Box<FilterSpec>>,
    },
    /// Solid color over the desired output, or only over `rect` when given.
    Flood {
        color: ColorDef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rect: Option<RectDef>,
    },
    Merge {
        inputs: Vec<Option<FilterSpec>>,
    },
    /// `foreground` blended onto `background` with `mode`.
    Blend {
        #[serde(default)]
        mode: BlendMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background: Option<Box<FilterSpec>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        foreground: Option<Box<FilterSpec>>,
    },
    /// `outer` evaluated with the output of `inner` as its source.
    Compose {
        outer: Box<FilterSpec>,
        inner: Box<FilterSpec>,
    },
    Picture {
        cull: RectDef,
        ops: Vec<PictureOpDef>,
    },
}

impl FilterSpec {
    pub fn from_json(s: &str) -> FxResult<Self> {
        let spec: FilterSpec = serde_json::from_str(s)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn to_json(&self) -> FxResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that cannot be evaluated (non-finite numbers, degenerate rects).
    pub fn validate(&self) -> FxResult<()> {
        match self {
            FilterSpec::Source | FilterSpec::Empty => Ok(()),
            FilterSpec::Offset { dx, dy, input } => {
                finite("offset", &[*dx, *dy])?;
                validate_input(input)
            }
            FilterSpec::Transform { matrix, input, .. } => {
                finite("transform matrix", matrix)?;
                validate_input(input)
            }
            FilterSpec::Crop { rect, input } => {
                rect.validate("crop rect")?;
                validate_input(input)
            }
            FilterSpec::ColorMatrix { matrix, input } => {
                matrix.to_matrix()?;
                validate_input(input)
            }
            FilterSpec::Flood { color, rect } => {
                color.validate()?;
                match rect {
                    Some(r) => r.validate("flood rect"),
                    None => Ok(()),
                }
            }
            FilterSpec::Merge { inputs } => inputs.iter().flatten().try_for_each(FilterSpec::validate),
            FilterSpec::Blend {
                background,
                foreground,
                ..
            } => {
                validate_input(background)?;
                validate_input(foreground)
            }
            FilterSpec::Compose { outer, inner } => {
                outer.validate()?;
                inner.validate()
            }
            FilterSpec::Picture { cull, ops } => {
                cull.validate("picture cull")?;
                for op in ops {
                    op.color().validate()?;
                    if let PictureOpDef::FillPath { path, .. } = op {
                        parse_svg_path(path)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn validate_input(input: &Option<Box<FilterSpec>>) -> FxResult<()> {
    match input {
        Some(spec) => spec.validate(),
        None => Ok(()),
    }
}

fn finite(what: &str, values: &[f64]) -> FxResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(FxError::validation(format!("{what} must be finite")))
    }
}

pub(crate) fn parse_svg_path(path: &str) -> FxResult<BezPath> {
    BezPath::from_svg(path).map_err(|e| FxError::validation(format!("invalid svg path: {e}")))
}

/// Rectangle as `[left, top, right, bottom]` or `{ "x", "y", "width", "height" }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectDef {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl RectDef {
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x0, self.y0, self.x1, self.y1)
    }

    fn validate(&self, what: &str) -> FxResult<()> {
        finite(what, &[self.x0, self.y0, self.x1, self.y1])?;
        if self.x1 < self.x0 || self.y1 < self.y0 {
            return Err(FxError::validation(format!("{what} has negative size")));
        }
        Ok(())
    }
}

impl From<Rect> for RectDef {
    fn from(r: Rect) -> Self {
        Self {
            x0: r.x0,
            y0: r.y0,
            x1: r.x1,
            y1: r.y1,
        }
    }
}

impl<'de> Deserialize<'de> for RectDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Arr([f64; 4]),
            Xywh {
                x: f64,
                y: f64,
                width: f64,
                height: f64,
            },
            Ltrb {
                x0: f64,
                y0: f64,
                x1: f64,
                y1: f64,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Arr([x0, y0, x1, y1]) | Repr::Ltrb { x0, y0, x1, y1 } => Ok(Self { x0, y0, x1, y1 }),
            Repr::Xywh {
                x,
                y,
                width,
                height,
            } => Ok(Self {
                x0: x,
                y0: y,
                x1: x + width,
                y1: y + height,
            }),
        }
    }
}

/// Straight-alpha color: `"#RRGGBB"`, `"#RRGGBBAA"`, `[r, g, b(, a)]` or `{ r, g, b, a }` with
/// components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDef {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorDef {
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color(self) -> Color4f {
        Color4f::from_unpremul(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a,
        )
    }

    fn validate(&self) -> FxResult<()> {
        if [self.r, self.g, self.b, self.a].iter().all(|c| c.is_finite()) {
            Ok(())
        } else {
            Err(FxError::validation("color components must be finite"))
        }
    }
}

impl<'de> Deserialize<'de> for ColorDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Obj {
                r: f32,
                g: f32,
                b: f32,
                #[serde(default = "one")]
                a: f32,
            },
            Arr(Vec<f32>),
        }

        fn one() -> f32 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::Obj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::rgba(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn parse_hex(s: &str) -> Result<ColorDef, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return Err("hex color must be ascii".to_owned());
    }

    fn hex_byte(pair: &str) -> Result<f32, String> {
        u8::from_str_radix(pair, 16)
            .map(|b| f32::from(b) / 255.0)
            .map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    let a = match s.len() {
        6 => 1.0,
        8 => hex_byte(&s[6..8])?,
        _ => return Err("hex color must be #RRGGBB or #RRGGBBAA".to_owned()),
    };
    Ok(ColorDef::rgba(
        hex_byte(&s[0..2])?,
        hex_byte(&s[2..4])?,
        hex_byte(&s[4..6])?,
        a,
    ))
}

/// Named preset or 20 row-major coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorMatrixDef {
    Preset(ColorMatrixPreset),
    Values(Vec<f32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMatrixPreset {
    Identity,
    Grayscale,
    Sepia,
}

impl ColorMatrixDef {
    pub fn to_matrix(&self) -> FxResult<ColorMatrix> {
        match self {
            ColorMatrixDef::Preset(ColorMatrixPreset::Identity) => Ok(ColorMatrix::IDENTITY),
            ColorMatrixDef::Preset(ColorMatrixPreset::Grayscale) => Ok(ColorMatrix::GRAYSCALE),
            ColorMatrixDef::Preset(ColorMatrixPreset::Sepia) => Ok(ColorMatrix::SEPIA),
            ColorMatrixDef::Values(v) => {
                let m: [f32; 20] = v.as_slice().try_into().map_err(|_| {
                    FxError::validation(format!("color matrix needs 20 values, got {}", v.len()))
                })?;
                if m.iter().any(|c| !c.is_finite()) {
                    return Err(FxError::validation("color matrix values must be finite"));
                }
                Ok(ColorMatrix(m))
            }
        }
    }
}

/// One recorded fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PictureOpDef {
    FillRect { rect: RectDef, color: ColorDef },
    /// `path` is SVG path data in parameter coordinates.
    FillPath { path: String, color: ColorDef },
}

impl PictureOpDef {
    fn color(&self) -> ColorDef {
        match self {
            PictureOpDef::FillRect { color, .. } | PictureOpDef::FillPath { color, .. } => *color,
        }
    }
}

pub(crate) fn build_picture(cull: RectDef, ops: &[PictureOpDef]) -> FxResult<Picture> {
    ops.iter().try_fold(Picture::new(cull.to_rect()), |pic, op| {
        Ok(match op {
            PictureOpDef::FillRect { rect, color } => pic.fill_rect(rect.to_rect(), color.to_color()),
            PictureOpDef::FillPath { path, color } => {
                pic.fill_path(parse_svg_path(path)?, color.to_color())
            }
        })
    })
}

#[cfg(test)]
#[path = "../../tests/unit/graph/model.rs"]
mod tests;
