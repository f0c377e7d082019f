use crate::foundation::core::{Affine, IPoint, IRect, ISize, IVector, Point, Rect, Size, Vector};
use crate::foundation::math;

/// Geometry authored in a filter's local coordinate system (e.g. a blur radius or crop rect as
/// written by the filter author).
///
/// Parameter values are inert: they can only be read back or converted to [`Layer`] through a
/// [`crate::Mapping`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Parameter<T>(T);

/// Geometry in the final pixel space of the render target. Inert like [`Parameter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Device<T>(T);

/// Geometry in the space where a filter graph is evaluated. Unlike [`Parameter`] and [`Device`],
/// layer geometry exposes the arithmetic filters need (see `geometry::layer`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Layer<T>(T);

macro_rules! inert_space {
    ($space:ident) => {
        impl<T> $space<T> {
            pub const fn new(value: T) -> Self {
                Self(value)
            }

            pub fn into_inner(self) -> T {
                self.0
            }
        }

        impl<T: Copy> $space<T> {
            pub fn get(&self) -> T {
                self.0
            }
        }
    };
}

inert_space!(Parameter);
inert_space!(Device);
inert_space!(Layer);

mod sealed {
    pub trait Sealed {}
}

/// Raw geometry kinds that can move between coordinate spaces.
///
/// Each kind carries its own transform rule: positions see translation, directions do not,
/// sizes stay non-negative and integer kinds are snapped back onto the pixel grid.
pub trait Geometry: Copy + sealed::Sealed {
    /// Map `self` through `m` using this kind's rule.
    fn map(self, m: Affine) -> Self;
}

macro_rules! sealed {
    ($($t:ty),*) => { $(impl sealed::Sealed for $t {})* };
}

sealed!(IPoint, Point, IVector, Vector, ISize, Size, IRect, Rect);

impl Geometry for Point {
    fn map(self, m: Affine) -> Self {
        math::map_point(m, self)
    }
}

impl Geometry for IPoint {
    fn map(self, m: Affine) -> Self {
        let p = math::map_point(m, self.to_point());
        IPoint::new(
            math::saturate_i32(p.x.round()),
            math::saturate_i32(p.y.round()),
        )
    }
}

impl Geometry for Vector {
    fn map(self, m: Affine) -> Self {
        math::map_vector(m, self)
    }
}

impl Geometry for IVector {
    fn map(self, m: Affine) -> Self {
        let v = math::map_vector(m, self.to_vector());
        IVector::new(
            math::saturate_i32(v.x.round()),
            math::saturate_i32(v.y.round()),
        )
    }
}

impl Geometry for Size {
    fn map(self, m: Affine) -> Self {
        let v = math::map_vector(m, Vector::new(self.width, self.height));
        Size::new(v.x.abs(), v.y.abs())
    }
}

impl Geometry for ISize {
    fn map(self, m: Affine) -> Self {
        let s = self.to_size().map(m);
        ISize::new(
            math::saturate_i32((s.width - math::ROUND_EPSILON).ceil()),
            math::saturate_i32((s.height - math::ROUND_EPSILON).ceil()),
        )
    }
}

impl Geometry for Rect {
    fn map(self, m: Affine) -> Self {
        math::map_rect_bbox(m, self)
    }
}

impl Geometry for IRect {
    fn map(self, m: Affine) -> Self {
        map_irect_robust(m, self)
    }
}

/// Integer bounds of `r` after mapping through `m`.
///
/// Scale/translate matrices map each edge independently in `f64`, so huge rectangles do not lose
/// their far edges to corner products; other matrices fall back to the rounded-out bounding box.
pub(crate) fn map_irect_robust(m: Affine, r: IRect) -> IRect {
    if r.is_empty() {
        return IRect::EMPTY;
    }
    let mapped = if math::is_scale_translate(m) {
        let [a, _, _, d, e, f] = m.as_coeffs();
        let x0 = a * f64::from(r.left) + e;
        let x1 = a * f64::from(r.right) + e;
        let y0 = d * f64::from(r.top) + f;
        let y1 = d * f64::from(r.bottom) + f;
        Rect::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    } else {
        math::map_rect_bbox(m, r.to_rect())
    };
    let out = math::round_out(mapped);
    if out.is_empty() { IRect::EMPTY } else { out }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/space.rs"]
mod tests;
