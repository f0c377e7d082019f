use super::*;

#[test]
fn wrappers_round_trip_their_value() {
    let p = Parameter::new(Point::new(1.0, 2.0));
    assert_eq!(p.get(), Point::new(1.0, 2.0));
    let d = Device::new(IRect::new(0, 0, 4, 4));
    assert_eq!(d.into_inner(), IRect::new(0, 0, 4, 4));
}

#[test]
fn vectors_ignore_translation_points_do_not() {
    let m = Affine::translate((10.0, 20.0));
    assert_eq!(Point::new(1.0, 1.0).map(m), Point::new(11.0, 21.0));
    assert_eq!(Vector::new(1.0, 1.0).map(m), Vector::new(1.0, 1.0));
    assert_eq!(IPoint::new(1, 1).map(m), IPoint::new(11, 21));
    assert_eq!(IVector::new(1, 1).map(m), IVector::new(1, 1));
}

#[test]
fn sizes_stay_positive_under_flips() {
    let flip = Affine::scale_non_uniform(-2.0, 1.0);
    assert_eq!(Size::new(3.0, 4.0).map(flip), Size::new(6.0, 4.0));
    assert_eq!(ISize::new(3, 4).map(Affine::scale(0.5)), ISize::new(2, 2));
    assert_eq!(ISize::new(4, 4).map(Affine::scale(0.5)), ISize::new(2, 2));
}

#[test]
fn irect_mapping_rounds_out() {
    let m = Affine::translate((0.5, 0.0));
    assert_eq!(IRect::new(0, 0, 10, 10).map(m), IRect::new(0, 0, 11, 10));

    let flip = Affine::scale_non_uniform(-1.0, 1.0);
    assert_eq!(IRect::new(0, 0, 10, 10).map(flip), IRect::new(-10, 0, 0, 10));
}

#[test]
fn irect_mapping_handles_huge_rects() {
    let huge = IRect::new(-(1 << 30), -(1 << 30), 1 << 30, 1 << 30);
    let out = huge.map(Affine::translate((3.0, 4.0)));
    assert_eq!(out, IRect::new(-(1 << 30) + 3, -(1 << 30) + 4, (1 << 30) + 3, (1 << 30) + 4));
}

#[test]
fn irect_mapping_of_empty_is_empty() {
    assert_eq!(IRect::EMPTY.map(Affine::scale(3.0)), IRect::EMPTY);
    assert!(IRect::new(5, 5, 5, 9).map(Affine::IDENTITY).is_empty());
}

#[test]
fn rotated_rect_maps_to_bounding_box() {
    let rot = Affine::rotate(std::f64::consts::FRAC_PI_2);
    let r = IRect::new(0, 0, 10, 20).map(rot);
    assert_eq!(r, IRect::new(-20, 0, 0, 10));
}
