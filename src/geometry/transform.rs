use crate::foundation::core::{Affine, IPoint, IRect, IVector, Point, Rect, Vector};
use crate::foundation::math;
use crate::geometry::space::{Geometry, Layer, map_irect_robust};

impl Layer<Affine> {
    pub fn identity() -> Self {
        Layer::new(Affine::IDENTITY)
    }

    pub fn translate(v: Layer<Vector>) -> Self {
        Layer::new(Affine::translate(v.get()))
    }

    pub fn translate_int(v: Layer<IVector>) -> Self {
        Self::translate(v.to_float())
    }

    /// Transform mapping `src` onto `dst` with independent x/y scales. `None` for empty `src`.
    pub fn rect_to_rect(src: Layer<Rect>, dst: Layer<Rect>) -> Option<Self> {
        math::rect_to_rect(src.get(), dst.get()).map(Layer::new)
    }

    pub fn matrix(&self) -> Affine {
        self.get()
    }

    pub fn map_point(&self, p: Layer<Point>) -> Layer<Point> {
        Layer::new(p.get().map(self.get()))
    }

    pub fn map_vector(&self, v: Layer<Vector>) -> Layer<Vector> {
        Layer::new(v.get().map(self.get()))
    }

    pub fn map_rect(&self, r: Layer<Rect>) -> Layer<Rect> {
        Layer::new(r.get().map(self.get()))
    }

    /// Pixel bounds covering `r` after the transform.
    pub fn map_irect(&self, r: Layer<IRect>) -> Layer<IRect> {
        Layer::new(map_irect_robust(self.get(), r.get()))
    }

    /// `self ∘ other`: apply `other` first.
    pub fn pre_concat(&self, other: Layer<Affine>) -> Layer<Affine> {
        Layer::new(self.get() * other.get())
    }

    /// `other ∘ self`: apply `self` first.
    pub fn post_concat(&self, other: Layer<Affine>) -> Layer<Affine> {
        Layer::new(other.get() * self.get())
    }

    pub fn invert(&self) -> Option<Layer<Affine>> {
        math::invert(self.get()).map(Layer::new)
    }

    pub fn inverse_map_rect(&self, r: Layer<Rect>) -> Option<Layer<Rect>> {
        self.invert().map(|inv| inv.map_rect(r))
    }

    pub fn inverse_map_irect(&self, r: Layer<IRect>) -> Option<Layer<IRect>> {
        self.invert().map(|inv| inv.map_irect(r))
    }

    pub fn is_identity(&self) -> bool {
        self.integer_translation() == Some(Layer::new(IVector::ZERO))
    }

    pub fn is_scale_translate(&self) -> bool {
        math::is_scale_translate(self.get())
    }

    /// Offset of a translation-only transform whose translation lands on the pixel grid.
    pub fn integer_translation(&self) -> Option<Layer<IVector>> {
        math::nearly_integer_translation(self.get()).map(|(x, y)| Layer::new(IVector::new(x, y)))
    }

    /// Origin of the transformed image when the transform is an integer translation.
    pub(crate) fn integer_origin(&self) -> Option<Layer<IPoint>> {
        self.integer_translation()
            .map(|v| Layer::new(IPoint::ZERO) + v)
    }
}

/// True when the quad `m(src)` covers every point of `dst`.
///
/// Works in the source space: `dst` is pulled back through `m` and tested against `src` with a
/// small tolerance, so axis-aligned and rotated placements are handled the same way.
pub(crate) fn quad_contains_rect(m: Layer<Affine>, src: IRect, dst: IRect) -> bool {
    if dst.is_empty() {
        return true;
    }
    if src.is_empty() {
        return false;
    }
    let Some(inv) = m.invert() else {
        return false;
    };
    let s = src.to_rect();
    let d = dst.to_rect();
    let corners = [
        Point::new(d.x0, d.y0),
        Point::new(d.x1, d.y0),
        Point::new(d.x1, d.y1),
        Point::new(d.x0, d.y1),
    ];
    let tol = math::ROUND_EPSILON;
    corners.iter().all(|&c| {
        let p = c.map(inv.get());
        p.x >= s.x0 - tol && p.x <= s.x1 + tol && p.y >= s.y0 - tol && p.y <= s.y1 + tol
    })
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/transform.rs"]
mod tests;
