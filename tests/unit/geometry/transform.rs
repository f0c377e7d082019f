use super::*;

fn lrect(x0: f64, y0: f64, x1: f64, y1: f64) -> Layer<Rect> {
    Layer::<Rect>::from_ltrb(x0, y0, x1, y1)
}

#[test]
fn rect_to_rect_maps_corners() {
    let m = Layer::<Affine>::rect_to_rect(lrect(0.0, 0.0, 10.0, 10.0), lrect(5.0, 5.0, 25.0, 15.0))
        .unwrap();
    assert_eq!(
        m.map_point(Layer::new(Point::new(10.0, 10.0))).get(),
        Point::new(25.0, 15.0)
    );
    assert!(Layer::<Affine>::rect_to_rect(Layer::<Rect>::empty(), lrect(0.0, 0.0, 1.0, 1.0)).is_none());
}

#[test]
fn concat_order() {
    let t = Layer::<Affine>::translate(Layer::new(Vector::new(10.0, 0.0)));
    let s = Layer::new(Affine::scale(2.0));
    let p = Layer::new(Point::new(1.0, 0.0));
    // pre_concat applies the argument first.
    assert_eq!(t.pre_concat(s).map_point(p).get(), Point::new(12.0, 0.0));
    assert_eq!(t.post_concat(s).map_point(p).get(), Point::new(22.0, 0.0));
}

#[test]
fn integer_translation_only_for_pure_translations() {
    let t = Layer::<Affine>::translate_int(Layer::new(IVector::new(5, -2)));
    assert_eq!(t.integer_translation(), Some(Layer::new(IVector::new(5, -2))));
    assert_eq!(t.integer_origin().map(|p| p.get()), Some(IPoint::new(5, -2)));
    assert!(Layer::<Affine>::identity().is_identity());
    assert!(Layer::new(Affine::scale(1.5)).integer_translation().is_none());
}

#[test]
fn inverse_mapping() {
    let m = Layer::new(Affine::scale(2.0));
    let r = m.inverse_map_irect(Layer::<IRect>::from_ltrb(0, 0, 10, 10)).unwrap();
    assert_eq!(r.get(), IRect::new(0, 0, 5, 5));
    assert!(Layer::new(Affine::scale(0.0)).invert().is_none());
}

#[test]
fn quad_containment() {
    let src = IRect::new(0, 0, 10, 10);
    let id = Layer::<Affine>::identity();
    assert!(quad_contains_rect(id, src, IRect::new(0, 0, 10, 10)));
    assert!(!quad_contains_rect(id, src, IRect::new(0, 0, 11, 10)));

    let rot = Layer::new(Affine::rotate_about(
        std::f64::consts::FRAC_PI_4,
        Point::new(5.0, 5.0),
    ));
    // The rotated square covers its inscribed centre but not its own bounding box.
    assert!(quad_contains_rect(rot, src, IRect::new(3, 3, 7, 7)));
    assert!(!quad_contains_rect(rot, src, IRect::new(0, 0, 10, 10)));
}
