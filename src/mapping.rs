//! Decomposition of a device transform into the parameter, layer and device spaces.

use crate::foundation::core::{Affine, IPoint, Point};
use crate::foundation::error::{FxError, FxResult};
use crate::foundation::math::{self, Fnv1a64};
use crate::geometry::{Device, Geometry, Layer, Parameter};

/// The most complex parameter→layer transform a filter can evaluate correctly.
///
/// Whatever the filter cannot absorb is left in the layer→device half and applied when the
/// filtered layer is drawn back to the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixCapability {
    /// Translation only; scale, rotation and skew are applied after filtering.
    Translate,
    /// Axis-aligned scale and translation.
    #[default]
    ScaleTranslate,
    /// Any affine transform.
    Complex,
}

impl MatrixCapability {
    /// The weaker of two capabilities. A graph can only use what every node supports.
    pub fn min(self, other: MatrixCapability) -> MatrixCapability {
        use MatrixCapability::*;
        match (self, other) {
            (Translate, _) | (_, Translate) => Translate,
            (ScaleTranslate, _) | (_, ScaleTranslate) => ScaleTranslate,
            (Complex, Complex) => Complex,
        }
    }
}

/// Transforms connecting parameter, layer and device space.
///
/// `device_to_layer` is always the inverse of `layer_to_device`; every mutation recomputes both
/// together or leaves the mapping untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mapping {
    layer_to_dev: Affine,
    dev_to_layer: Affine,
    param_to_layer: Affine,
}

impl Default for Mapping {
    fn default() -> Self {
        Self::new(Affine::IDENTITY)
    }
}

/// Geometry from a non-layer space that a [`Mapping`] can bring into layer space.
pub trait IntoLayer {
    /// Raw geometry kind carried by the wrapper.
    type Geometry: Geometry;

    /// Map into layer space with `mapping`.
    fn into_layer(self, mapping: &Mapping) -> Layer<Self::Geometry>;
}

impl<G: Geometry> IntoLayer for Parameter<G> {
    type Geometry = G;

    fn into_layer(self, mapping: &Mapping) -> Layer<G> {
        Layer::new(self.get().map(mapping.param_to_layer))
    }
}

impl<G: Geometry> IntoLayer for Device<G> {
    type Geometry = G;

    fn into_layer(self, mapping: &Mapping) -> Layer<G> {
        Layer::new(self.get().map(mapping.dev_to_layer))
    }
}

impl Mapping {
    /// Mapping whose layer space coincides with device space.
    pub fn new(param_to_layer: Affine) -> Self {
        Self {
            layer_to_dev: Affine::IDENTITY,
            dev_to_layer: Affine::IDENTITY,
            param_to_layer,
        }
    }

    /// Mapping from explicit halves. `None` when `layer_to_device` cannot be inverted.
    pub fn from_parts(layer_to_device: Affine, param_to_layer: Affine) -> Option<Self> {
        let dev_to_layer = math::invert(layer_to_device)?;
        Some(Self {
            layer_to_dev: layer_to_device,
            dev_to_layer,
            param_to_layer,
        })
    }

    /// Build a mapping by decomposing `ctm`, reporting failure as an error.
    pub fn try_from_ctm(
        ctm: Affine,
        capability: MatrixCapability,
        representative_point: Parameter<Point>,
    ) -> FxResult<Self> {
        let mut mapping = Self::default();
        if mapping.decompose_ctm(ctm, capability, representative_point) {
            Ok(mapping)
        } else {
            Err(FxError::non_invertible(format!(
                "cannot decompose {:?} for {capability:?}",
                ctm.as_coeffs()
            )))
        }
    }

    /// Split `ctm` into `layer_to_device ∘ param_to_layer`, keeping the parameter→layer half
    /// within `capability`.
    ///
    /// Returns `false` and leaves `self` untouched when the device half cannot be inverted or the
    /// two halves do not reproduce `ctm` at `representative_point`.
    #[must_use]
    pub fn decompose_ctm(
        &mut self,
        ctm: Affine,
        capability: MatrixCapability,
        representative_point: Parameter<Point>,
    ) -> bool {
        if math::invert(ctm).is_none() {
            return false;
        }

        let Some((remainder, layer)) = split_ctm(ctm, capability) else {
            return false;
        };

        let p = representative_point.get();
        let expected = ctm * p;
        let actual = remainder * (layer * p);
        let tol = math::ROUND_EPSILON * expected.x.abs().max(expected.y.abs()).max(1.0);
        if !(math::nearly_equal(expected.x, actual.x, tol)
            && math::nearly_equal(expected.y, actual.y, tol))
        {
            return false;
        }

        let Some(dev_to_layer) = math::invert(remainder) else {
            return false;
        };
        self.layer_to_dev = remainder;
        self.dev_to_layer = dev_to_layer;
        self.param_to_layer = layer;
        true
    }

    /// Redefine parameter space: `local` maps the new parameter space into the old one.
    pub fn concat_local(&mut self, local: Parameter<Affine>) {
        self.param_to_layer = self.param_to_layer * local.get();
    }

    /// Re-origin layer space. `layer` maps old layer coordinates to new ones; parameter and
    /// device geometry keep their numeric values.
    ///
    /// Returns `false` and leaves `self` untouched when `layer` is not invertible.
    #[must_use]
    pub fn adjust_layer_space(&mut self, layer: Layer<Affine>) -> bool {
        let Some(inv) = layer.invert() else {
            return false;
        };
        let m = layer.get();
        self.param_to_layer = m * self.param_to_layer;
        self.dev_to_layer = m * self.dev_to_layer;
        self.layer_to_dev = self.layer_to_dev * inv.get();
        true
    }

    /// Move layer space so that `origin` becomes `(0, 0)`.
    pub fn apply_origin(&mut self, origin: Layer<IPoint>) {
        let shift = Layer::<Affine>::translate_int(Layer::new(IPoint::ZERO) - origin);
        let adjusted = self.adjust_layer_space(shift);
        debug_assert!(adjusted, "translations are always invertible");
    }

    pub fn layer_to_device_matrix(&self) -> Affine {
        self.layer_to_dev
    }

    pub fn device_to_layer_matrix(&self) -> Affine {
        self.dev_to_layer
    }

    /// Parameter→layer matrix.
    pub fn layer_matrix(&self) -> Affine {
        self.param_to_layer
    }

    /// Parameter→device matrix.
    pub fn total_matrix(&self) -> Affine {
        self.layer_to_dev * self.param_to_layer
    }

    /// Map geometry from parameter or device space into layer space.
    pub fn map_to_layer<S: IntoLayer>(&self, value: S) -> Layer<S::Geometry> {
        value.into_layer(self)
    }

    pub fn param_to_layer<G: Geometry>(&self, value: Parameter<G>) -> Layer<G> {
        self.map_to_layer(value)
    }

    pub fn device_to_layer<G: Geometry>(&self, value: Device<G>) -> Layer<G> {
        self.map_to_layer(value)
    }

    pub fn map_to_device<G: Geometry>(&self, value: Layer<G>) -> Device<G> {
        Device::new(value.get().map(self.layer_to_dev))
    }

    /// Pull layer geometry back to parameter space. `None` for a singular parameter→layer matrix.
    pub fn layer_to_param<G: Geometry>(&self, value: Layer<G>) -> Option<Parameter<G>> {
        let inv = math::invert(self.param_to_layer)?;
        Some(Parameter::new(value.get().map(inv)))
    }

    /// Map raw geometry through an arbitrary matrix using the kind's own rule.
    pub fn map<G: Geometry>(value: G, matrix: Affine) -> G {
        value.map(matrix)
    }

    pub(crate) fn hash_into(&self, h: &mut Fnv1a64) {
        for m in [self.layer_to_dev, self.param_to_layer] {
            for c in m.as_coeffs() {
                h.write_f64(c);
            }
        }
    }
}

fn split_ctm(ctm: Affine, capability: MatrixCapability) -> Option<(Affine, Affine)> {
    match capability {
        MatrixCapability::Translate => Some((ctm, Affine::IDENTITY)),
        MatrixCapability::Complex => Some((Affine::IDENTITY, ctm)),
        MatrixCapability::ScaleTranslate if math::is_scale_translate(ctm) => {
            Some((Affine::IDENTITY, ctm))
        }
        MatrixCapability::ScaleTranslate => {
            let [a, b, c, d, _, _] = ctm.as_coeffs();
            let (sx, sy) = (a.hypot(b), c.hypot(d));
            let usable = |s: f64| s.is_finite() && s > f64::EPSILON;
            let (sx, sy) = if usable(sx) && usable(sy) {
                (sx, sy)
            } else {
                // Affine area scale is uniform; fall back to it when the columns degenerate.
                let s = math::determinant(ctm).abs().sqrt();
                if !usable(s) {
                    return None;
                }
                (s, s)
            };
            let layer = Affine::scale_non_uniform(sx, sy);
            let remainder = ctm * Affine::scale_non_uniform(1.0 / sx, 1.0 / sy);
            Some((remainder, layer))
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/mapping.rs"]
mod tests;
