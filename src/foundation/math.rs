use crate::foundation::core::{Affine, IRect, Point, Rect, Vector};

/// Tolerance used when snapping float geometry to the pixel grid. Absorbs error accumulated by
/// repeated transforms so that e.g. `9.9995` still rounds out to `10`.
pub const ROUND_EPSILON: f64 = 1e-3;

const INVERT_EPSILON: f64 = 1e-12;
const LINEAR_EPSILON: f64 = 1e-6;

/// Convert with saturation; NaN maps to zero.
pub(crate) fn saturate_i32(v: f64) -> i32 {
    v as i32
}

/// Smallest integer rect covering `r`, ignoring slivers thinner than [`ROUND_EPSILON`].
pub fn round_out(r: Rect) -> IRect {
    IRect::new(
        saturate_i32((r.x0 + ROUND_EPSILON).floor()),
        saturate_i32((r.y0 + ROUND_EPSILON).floor()),
        saturate_i32((r.x1 - ROUND_EPSILON).ceil()),
        saturate_i32((r.y1 - ROUND_EPSILON).ceil()),
    )
}

/// Largest integer rect inside `r`, treating edges within [`ROUND_EPSILON`] of the grid as on it.
pub fn round_in(r: Rect) -> IRect {
    IRect::new(
        saturate_i32((r.x0 - ROUND_EPSILON).ceil()),
        saturate_i32((r.y0 - ROUND_EPSILON).ceil()),
        saturate_i32((r.x1 + ROUND_EPSILON).floor()),
        saturate_i32((r.y1 + ROUND_EPSILON).floor()),
    )
}

pub fn round_nearest(r: Rect) -> IRect {
    IRect::new(
        saturate_i32(r.x0.round()),
        saturate_i32(r.y0.round()),
        saturate_i32(r.x1.round()),
        saturate_i32(r.y1.round()),
    )
}

pub(crate) fn nearly_zero(v: f64, tol: f64) -> bool {
    v.abs() <= tol
}

pub(crate) fn nearly_equal(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

pub(crate) fn determinant(m: Affine) -> f64 {
    let [a, b, c, d, _, _] = m.as_coeffs();
    a * d - b * c
}

/// Inverse of `m`, or `None` when `m` is singular or produces non-finite coefficients.
pub fn invert(m: Affine) -> Option<Affine> {
    let [a, b, c, d, e, f] = m.as_coeffs();
    let det = a * d - b * c;
    if !det.is_finite() || det.abs() <= INVERT_EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let out = [
        d * inv,
        -b * inv,
        -c * inv,
        a * inv,
        (c * f - d * e) * inv,
        (b * e - a * f) * inv,
    ];
    out.iter().all(|v| v.is_finite()).then(|| Affine::new(out))
}

/// Apply only the linear part of `m`; directions ignore translation.
pub fn map_vector(m: Affine, v: Vector) -> Vector {
    let [a, b, c, d, _, _] = m.as_coeffs();
    Vector::new(a * v.x + c * v.y, b * v.x + d * v.y)
}

pub fn map_point(m: Affine, p: Point) -> Point {
    m * p
}

/// Axis-aligned bounds of the four mapped corners of `r`.
pub fn map_rect_bbox(m: Affine, r: Rect) -> Rect {
    let corners = [
        m * Point::new(r.x0, r.y0),
        m * Point::new(r.x1, r.y0),
        m * Point::new(r.x1, r.y1),
        m * Point::new(r.x0, r.y1),
    ];
    let mut out = Rect::new(corners[0].x, corners[0].y, corners[0].x, corners[0].y);
    for p in &corners[1..] {
        out.x0 = out.x0.min(p.x);
        out.y0 = out.y0.min(p.y);
        out.x1 = out.x1.max(p.x);
        out.y1 = out.y1.max(p.y);
    }
    out
}

/// Scale/translate transform taking `src` onto `dst`. `None` for an empty `src`.
pub fn rect_to_rect(src: Rect, dst: Rect) -> Option<Affine> {
    let (sw, sh) = (src.x1 - src.x0, src.y1 - src.y0);
    if !(sw > 0.0 && sh > 0.0) {
        return None;
    }
    let sx = (dst.x1 - dst.x0) / sw;
    let sy = (dst.y1 - dst.y0) / sh;
    Some(Affine::new([
        sx,
        0.0,
        0.0,
        sy,
        dst.x0 - src.x0 * sx,
        dst.y0 - src.y0 * sy,
    ]))
}

pub(crate) fn is_scale_translate(m: Affine) -> bool {
    let [_, b, c, _, _, _] = m.as_coeffs();
    nearly_zero(b, LINEAR_EPSILON) && nearly_zero(c, LINEAR_EPSILON)
}

pub(crate) fn is_translate(m: Affine) -> bool {
    let [a, b, c, d, _, _] = m.as_coeffs();
    nearly_equal(a, 1.0, LINEAR_EPSILON)
        && nearly_zero(b, LINEAR_EPSILON)
        && nearly_zero(c, LINEAR_EPSILON)
        && nearly_equal(d, 1.0, LINEAR_EPSILON)
}

/// Integer offset of `m` when it is a pure translation landing on the pixel grid.
pub fn nearly_integer_translation(m: Affine) -> Option<(i32, i32)> {
    if !is_translate(m) {
        return None;
    }
    let [_, _, _, _, e, f] = m.as_coeffs();
    let (re, rf) = (e.round(), f.round());
    (nearly_equal(e, re, ROUND_EPSILON) && nearly_equal(f, rf, ROUND_EPSILON))
        .then(|| (saturate_i32(re), saturate_i32(rf)))
}

pub(crate) fn affines_nearly_equal(a: Affine, b: Affine, tol: f64) -> bool {
    a.as_coeffs()
        .iter()
        .zip(b.as_coeffs().iter())
        .all(|(x, y)| nearly_equal(*x, *y, tol))
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_f64(&mut self, v: f64) {
        // -0.0 and 0.0 describe the same transform.
        let v = if v == 0.0 { 0.0 } else { v };
        self.write_u64(v.to_bits());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

pub(crate) fn u8_to_unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
