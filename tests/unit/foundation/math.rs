use super::*;

#[test]
fn fnv_hash_is_stable_across_writes() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"layerfx");
    let mut b = Fnv1a64::new_default();
    b.write_u8(b'l');
    b.write_bytes(b"ayerfx");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv_treats_signed_zero_alike() {
    let mut a = Fnv1a64::new_default();
    a.write_f64(0.0);
    let mut b = Fnv1a64::new_default();
    b.write_f64(-0.0);
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn round_out_absorbs_float_noise() {
    let r = Rect::new(10.0004, 9.9996, 19.9995, 20.0004);
    assert_eq!(round_out(r), IRect::new(10, 10, 20, 20));
    assert_eq!(round_out(Rect::new(0.5, 0.5, 1.5, 1.5)), IRect::new(0, 0, 2, 2));
}

#[test]
fn round_in_absorbs_float_noise() {
    let r = Rect::new(9.9995, 10.0004, 20.0004, 19.9995);
    assert_eq!(round_in(r), IRect::new(10, 10, 20, 20));
    assert_eq!(round_in(Rect::new(0.5, 0.5, 2.5, 2.5)), IRect::new(1, 1, 2, 2));
}

#[test]
fn round_nearest_rounds_each_edge() {
    assert_eq!(
        round_nearest(Rect::new(0.4, 0.6, 2.4, 2.6)),
        IRect::new(0, 1, 2, 3)
    );
}

#[test]
fn invert_rejects_singular() {
    assert!(invert(Affine::scale_non_uniform(1.0, 0.0)).is_none());
    let m = Affine::new([2.0, 1.0, -1.0, 3.0, 5.0, 7.0]);
    let inv = invert(m).unwrap();
    assert!(affines_nearly_equal(m * inv, Affine::IDENTITY, 1e-9));
}

#[test]
fn vectors_ignore_translation() {
    let m = Affine::translate((100.0, 50.0)) * Affine::scale(2.0);
    assert_eq!(map_vector(m, Vector::new(1.0, 2.0)), Vector::new(2.0, 4.0));
    assert_eq!(map_point(m, Point::new(1.0, 2.0)), Point::new(102.0, 54.0));
}

#[test]
fn integer_translation_detection() {
    assert_eq!(
        nearly_integer_translation(Affine::translate((3.0, -4.0))),
        Some((3, -4))
    );
    assert_eq!(
        nearly_integer_translation(Affine::translate((3.0004, -4.0))),
        Some((3, -4))
    );
    assert_eq!(nearly_integer_translation(Affine::translate((0.5, 0.0))), None);
    assert_eq!(nearly_integer_translation(Affine::scale(2.0)), None);
}

#[test]
fn bbox_of_rotated_square() {
    let m = Affine::rotate(std::f64::consts::FRAC_PI_4);
    let r = map_rect_bbox(m, Rect::new(0.0, 0.0, 1.0, 1.0));
    let s = std::f64::consts::FRAC_1_SQRT_2;
    assert!(nearly_equal(r.x0, -s, 1e-12));
    assert!(nearly_equal(r.x1, s, 1e-12));
    assert!(nearly_equal(r.y0, 0.0, 1e-12));
    assert!(nearly_equal(r.y1, 2.0 * s, 1e-12));
}
