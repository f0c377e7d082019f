use std::ops::{Add, Neg, Sub};

use crate::foundation::core::{IPoint, IRect, ISize, IVector, Point, Rect, Size, Vector};
use crate::foundation::math;
use crate::geometry::space::Layer;

impl Layer<IPoint> {
    pub fn x(&self) -> i32 {
        self.get().x
    }

    pub fn y(&self) -> i32 {
        self.get().y
    }

    pub fn to_float(self) -> Layer<Point> {
        Layer::new(self.get().to_point())
    }
}

impl Layer<Point> {
    pub fn x(&self) -> f64 {
        self.get().x
    }

    pub fn y(&self) -> f64 {
        self.get().y
    }
}

impl Layer<IVector> {
    pub fn x(&self) -> i32 {
        self.get().x
    }

    pub fn y(&self) -> i32 {
        self.get().y
    }

    pub fn to_float(self) -> Layer<Vector> {
        Layer::new(self.get().to_vector())
    }
}

impl Layer<Vector> {
    pub fn x(&self) -> f64 {
        self.get().x
    }

    pub fn y(&self) -> f64 {
        self.get().y
    }
}

impl Layer<ISize> {
    pub fn width(&self) -> i32 {
        self.get().width
    }

    pub fn height(&self) -> i32 {
        self.get().height
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }

    pub fn to_float(self) -> Layer<Size> {
        Layer::new(self.get().to_size())
    }
}

impl Layer<Size> {
    pub fn width(&self) -> f64 {
        self.get().width
    }

    pub fn height(&self) -> f64 {
        self.get().height
    }

    pub fn round(self) -> Layer<ISize> {
        let s = self.get();
        Layer::new(ISize::new(
            math::saturate_i32(s.width.round()),
            math::saturate_i32(s.height.round()),
        ))
    }

    /// Smallest integer size covering `self`, ignoring float noise below [`math::ROUND_EPSILON`].
    pub fn ceil(self) -> Layer<ISize> {
        let s = self.get();
        Layer::new(ISize::new(
            math::saturate_i32((s.width - math::ROUND_EPSILON).ceil()),
            math::saturate_i32((s.height - math::ROUND_EPSILON).ceil()),
        ))
    }

    pub fn floor(self) -> Layer<ISize> {
        let s = self.get();
        Layer::new(ISize::new(
            math::saturate_i32((s.width + math::ROUND_EPSILON).floor()),
            math::saturate_i32((s.height + math::ROUND_EPSILON).floor()),
        ))
    }
}

impl Layer<IRect> {
    pub const fn empty() -> Self {
        Layer::new(IRect::EMPTY)
    }

    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Layer::new(IRect::new(left, top, right, bottom))
    }

    /// Rectangle with its top-left corner at the layer origin.
    pub fn from_size(size: Layer<ISize>) -> Self {
        Layer::new(IRect::from_size(size.get()))
    }

    pub fn left(&self) -> i32 {
        self.get().left
    }

    pub fn top(&self) -> i32 {
        self.get().top
    }

    pub fn right(&self) -> i32 {
        self.get().right
    }

    pub fn bottom(&self) -> i32 {
        self.get().bottom
    }

    pub fn width(&self) -> i32 {
        self.get().width()
    }

    pub fn height(&self) -> i32 {
        self.get().height()
    }

    pub fn top_left(&self) -> Layer<IPoint> {
        Layer::new(self.get().top_left())
    }

    pub fn size(&self) -> Layer<ISize> {
        Layer::new(self.get().size())
    }

    pub fn center(&self) -> Layer<Point> {
        self.to_float().center()
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }

    pub fn contains(&self, other: Layer<IRect>) -> bool {
        self.get().contains(other.get())
    }

    pub fn intersect(&self, other: Layer<IRect>) -> Option<Layer<IRect>> {
        self.get().intersect(other.get()).map(Layer::new)
    }

    pub fn union(&self, other: Layer<IRect>) -> Layer<IRect> {
        Layer::new(self.get().union(other.get()))
    }

    pub fn offset(&self, v: Layer<IVector>) -> Layer<IRect> {
        Layer::new(self.get().offset(v.x(), v.y()))
    }

    pub fn outset(&self, amount: Layer<ISize>) -> Layer<IRect> {
        Layer::new(self.get().outset(amount.width(), amount.height()))
    }

    pub fn to_float(self) -> Layer<Rect> {
        Layer::new(self.get().to_rect())
    }
}

fn rect_is_empty(r: Rect) -> bool {
    !(r.x0 < r.x1 && r.y0 < r.y1)
}

impl Layer<Rect> {
    pub fn empty() -> Self {
        Layer::new(Rect::ZERO)
    }

    pub fn from_ltrb(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Layer::new(Rect::new(x0, y0, x1, y1))
    }

    pub fn left(&self) -> f64 {
        self.get().x0
    }

    pub fn top(&self) -> f64 {
        self.get().y0
    }

    pub fn right(&self) -> f64 {
        self.get().x1
    }

    pub fn bottom(&self) -> f64 {
        self.get().y1
    }

    pub fn width(&self) -> f64 {
        self.get().x1 - self.get().x0
    }

    pub fn height(&self) -> f64 {
        self.get().y1 - self.get().y0
    }

    pub fn top_left(&self) -> Layer<Point> {
        Layer::new(Point::new(self.left(), self.top()))
    }

    pub fn size(&self) -> Layer<Size> {
        Layer::new(Size::new(self.width(), self.height()))
    }

    pub fn center(&self) -> Layer<Point> {
        let r = self.get();
        Layer::new(Point::new(0.5 * (r.x0 + r.x1), 0.5 * (r.y0 + r.y1)))
    }

    /// True for zero-area and NaN rectangles.
    pub fn is_empty(&self) -> bool {
        rect_is_empty(self.get())
    }

    pub fn contains(&self, other: Layer<Rect>) -> bool {
        let (a, b) = (self.get(), other.get());
        !self.is_empty()
            && !other.is_empty()
            && a.x0 <= b.x0
            && a.y0 <= b.y0
            && a.x1 >= b.x1
            && a.y1 >= b.y1
    }

    pub fn intersect(&self, other: Layer<Rect>) -> Option<Layer<Rect>> {
        let (a, b) = (self.get(), other.get());
        let r = Rect::new(a.x0.max(b.x0), a.y0.max(b.y0), a.x1.min(b.x1), a.y1.min(b.y1));
        (!rect_is_empty(r)).then(|| Layer::new(r))
    }

    pub fn union(&self, other: Layer<Rect>) -> Layer<Rect> {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return other;
        }
        let (a, b) = (self.get(), other.get());
        Layer::new(Rect::new(
            a.x0.min(b.x0),
            a.y0.min(b.y0),
            a.x1.max(b.x1),
            a.y1.max(b.y1),
        ))
    }

    pub fn offset(&self, v: Layer<Vector>) -> Layer<Rect> {
        Layer::new(self.get() + v.get())
    }

    pub fn outset(&self, amount: Layer<Size>) -> Layer<Rect> {
        Layer::new(self.get().inflate(amount.width(), amount.height()))
    }

    /// Nearest point of the rectangle to `p`.
    pub fn clamp(&self, p: Layer<Point>) -> Layer<Point> {
        let r = self.get();
        Layer::new(Point::new(
            p.x().max(r.x0).min(r.x1),
            p.y().max(r.y0).min(r.y1),
        ))
    }

    pub fn round(&self) -> Layer<IRect> {
        Layer::new(math::round_nearest(self.get()))
    }

    /// Largest pixel-aligned rectangle inside `self`, for coverage that must not show gaps.
    pub fn round_in(&self) -> Layer<IRect> {
        Layer::new(math::round_in(self.get()))
    }

    /// Smallest pixel-aligned rectangle covering `self`, for coverage that must not clip.
    pub fn round_out(&self) -> Layer<IRect> {
        Layer::new(math::round_out(self.get()))
    }
}

impl Add<Layer<IVector>> for Layer<IPoint> {
    type Output = Layer<IPoint>;

    fn add(self, rhs: Layer<IVector>) -> Self::Output {
        Layer::new(IPoint::new(
            self.x().saturating_add(rhs.x()),
            self.y().saturating_add(rhs.y()),
        ))
    }
}

impl Sub<Layer<IVector>> for Layer<IPoint> {
    type Output = Layer<IPoint>;

    fn sub(self, rhs: Layer<IVector>) -> Self::Output {
        self + (-rhs)
    }
}

impl Sub for Layer<IPoint> {
    type Output = Layer<IVector>;

    fn sub(self, rhs: Layer<IPoint>) -> Self::Output {
        Layer::new(IVector::new(
            self.x().saturating_sub(rhs.x()),
            self.y().saturating_sub(rhs.y()),
        ))
    }
}

impl Add for Layer<IVector> {
    type Output = Layer<IVector>;

    fn add(self, rhs: Layer<IVector>) -> Self::Output {
        Layer::new(IVector::new(
            self.x().saturating_add(rhs.x()),
            self.y().saturating_add(rhs.y()),
        ))
    }
}

impl Neg for Layer<IVector> {
    type Output = Layer<IVector>;

    fn neg(self) -> Self::Output {
        Layer::new(IVector::new(self.x().saturating_neg(), self.y().saturating_neg()))
    }
}

impl Add<Layer<Vector>> for Layer<Point> {
    type Output = Layer<Point>;

    fn add(self, rhs: Layer<Vector>) -> Self::Output {
        Layer::new(self.get() + rhs.get())
    }
}

impl Sub<Layer<Vector>> for Layer<Point> {
    type Output = Layer<Point>;

    fn sub(self, rhs: Layer<Vector>) -> Self::Output {
        Layer::new(self.get() - rhs.get())
    }
}

impl Sub for Layer<Point> {
    type Output = Layer<Vector>;

    fn sub(self, rhs: Layer<Point>) -> Self::Output {
        Layer::new(self.get() - rhs.get())
    }
}

impl Add for Layer<Vector> {
    type Output = Layer<Vector>;

    fn add(self, rhs: Layer<Vector>) -> Self::Output {
        Layer::new(self.get() + rhs.get())
    }
}

impl Neg for Layer<Vector> {
    type Output = Layer<Vector>;

    fn neg(self) -> Self::Output {
        Layer::new(-self.get())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/layer.rs"]
mod tests;
