use crate::foundation::math::Fnv1a64;

/// Texel filter used when no cubic resampler is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Mitchell-Netravali family of bicubic kernels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CubicResampler {
    pub b: f32,
    pub c: f32,
}

impl CubicResampler {
    pub const MITCHELL: Self = Self {
        b: 1.0 / 3.0,
        c: 1.0 / 3.0,
    };
    pub const CATMULL_ROM: Self = Self { b: 0.0, c: 0.5 };

    /// Kernel weight at distance `x` from the sample position.
    pub fn weight(&self, x: f32) -> f32 {
        let (b, c) = (self.b, self.c);
        let x = x.abs();
        if x < 1.0 {
            ((12.0 - 9.0 * b - 6.0 * c) * x * x * x
                + (-18.0 + 12.0 * b + 6.0 * c) * x * x
                + (6.0 - 2.0 * b))
                / 6.0
        } else if x < 2.0 {
            ((-b - 6.0 * c) * x * x * x
                + (6.0 * b + 30.0 * c) * x * x
                + (-12.0 * b - 48.0 * c) * x
                + (8.0 * b + 24.0 * c))
                / 6.0
        } else {
            0.0
        }
    }
}

/// How an image is read between texel centers.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SamplingOptions {
    pub filter: FilterMode,
    /// When set, overrides `filter` with a bicubic kernel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cubic: Option<CubicResampler>,
}

impl SamplingOptions {
    /// Bilinear.
    pub const DEFAULT: Self = Self {
        filter: FilterMode::Linear,
        cubic: None,
    };
    pub const NEAREST: Self = Self {
        filter: FilterMode::Nearest,
        cubic: None,
    };

    pub const fn cubic(resampler: CubicResampler) -> Self {
        Self {
            filter: FilterMode::Linear,
            cubic: Some(resampler),
        }
    }

    pub(crate) fn hash_into(&self, h: &mut Fnv1a64) {
        h.write_u8(self.filter as u8);
        match self.cubic {
            Some(c) => {
                h.write_u8(1);
                h.write_f64(f64::from(c.b));
                h.write_f64(f64::from(c.c));
            }
            None => h.write_u8(0),
        }
    }

    pub fn is_cubic(&self) -> bool {
        self.cubic.is_some()
    }

    pub fn is_linear(&self) -> bool {
        self.cubic.is_none() && self.filter == FilterMode::Linear
    }

    pub fn is_nearest(&self) -> bool {
        self.cubic.is_none() && self.filter == FilterMode::Nearest
    }
}

/// Single sampling that reproduces sampling with `current` and then resampling the result with
/// `next`, or `None` when the two steps must stay separate.
///
/// The `*_is_integer` flags say whether the matching transform is a pixel-aligned translation,
/// in which case nearest-neighbor reads through it are exact.
pub fn merge_sampling(
    current: SamplingOptions,
    current_is_integer: bool,
    next: SamplingOptions,
    next_is_integer: bool,
) -> Option<SamplingOptions> {
    match (current.cubic, next.cubic) {
        (Some(cur), _) if next.is_linear() || next.cubic == Some(cur) => Some(current),
        (None, Some(_)) if current.is_linear() => Some(next),
        _ if current.is_linear() && next.is_linear() => Some(SamplingOptions::DEFAULT),
        _ if next.is_nearest() && current_is_integer => Some(next),
        _ if current.is_nearest() && next_is_integer => Some(current),
        _ => None,
    }
}
