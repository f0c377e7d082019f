use super::*;
use crate::foundation::core::{IRect, Rect, Vector};

fn origin() -> Parameter<Point> {
    Parameter::new(Point::new(0.0, 0.0))
}

fn assert_identity(m: Affine) {
    assert!(
        math::affines_nearly_equal(m, Affine::IDENTITY, 1e-9),
        "not identity: {:?}",
        m.as_coeffs()
    );
}

#[test]
fn decomposition_reproduces_total_matrix() {
    let ctm = Affine::translate((7.0, -3.0)) * Affine::rotate(0.3) * Affine::scale_non_uniform(2.0, 3.0);
    for cap in [
        MatrixCapability::Translate,
        MatrixCapability::ScaleTranslate,
        MatrixCapability::Complex,
    ] {
        let mut m = Mapping::default();
        assert!(m.decompose_ctm(ctm, cap, origin()));
        assert!(math::affines_nearly_equal(m.total_matrix(), ctm, 1e-9));
        assert_identity(m.layer_to_device_matrix() * m.device_to_layer_matrix());
    }
}

#[test]
fn capability_controls_layer_matrix() {
    let rot = Affine::rotate(0.5) * Affine::scale(2.0);

    let mut m = Mapping::default();
    assert!(m.decompose_ctm(rot, MatrixCapability::Translate, origin()));
    assert_identity(m.layer_matrix());

    let mut m = Mapping::default();
    assert!(m.decompose_ctm(rot, MatrixCapability::ScaleTranslate, origin()));
    assert!(math::is_scale_translate(m.layer_matrix()));
    let [a, _, _, d, _, _] = m.layer_matrix().as_coeffs();
    assert!(math::nearly_equal(a, 2.0, 1e-9));
    assert!(math::nearly_equal(d, 2.0, 1e-9));

    let mut m = Mapping::default();
    assert!(m.decompose_ctm(rot, MatrixCapability::Complex, origin()));
    assert_identity(m.layer_to_device_matrix());
}

#[test]
fn scale_translate_ctm_stays_in_layer_space() {
    let ctm = Affine::translate((4.0, 5.0)) * Affine::scale(3.0);
    let mut m = Mapping::default();
    assert!(m.decompose_ctm(ctm, MatrixCapability::ScaleTranslate, origin()));
    assert_identity(m.layer_to_device_matrix());
    assert_eq!(m.layer_matrix(), ctm);
}

#[test]
fn singular_ctm_leaves_mapping_untouched() {
    let mut m = Mapping::default();
    assert!(m.decompose_ctm(Affine::scale(2.0), MatrixCapability::Complex, origin()));
    let before = m;

    let singular = Affine::new([1.0, 2.0, 2.0, 4.0, 0.0, 0.0]);
    assert!(!m.decompose_ctm(singular, MatrixCapability::ScaleTranslate, origin()));
    assert_eq!(m, before);

    // Still usable afterwards.
    let r = m.param_to_layer(Parameter::new(IRect::new(0, 0, 5, 5)));
    assert_eq!(r.get(), IRect::new(0, 0, 10, 10));
    assert!(Mapping::try_from_ctm(singular, MatrixCapability::Complex, origin()).is_err());
}

#[test]
fn adjust_layer_space_keeps_param_and_device_values() {
    let mut m = Mapping::from_parts(Affine::rotate(0.25), Affine::scale(2.0)).unwrap();
    let total = m.total_matrix();
    let p = Parameter::new(Point::new(3.0, 4.0));
    let layer_before = m.param_to_layer(p);

    assert!(m.adjust_layer_space(Layer::<Affine>::translate(Layer::new(Vector::new(-10.0, -20.0)))));
    assert!(math::affines_nearly_equal(m.total_matrix(), total, 1e-9));
    assert_identity(m.layer_to_device_matrix() * m.device_to_layer_matrix());
    let layer_after = m.param_to_layer(p);
    assert!(math::nearly_equal(layer_after.x(), layer_before.x() - 10.0, 1e-9));
    assert!(math::nearly_equal(layer_after.y(), layer_before.y() - 20.0, 1e-9));

    let before = m;
    assert!(!m.adjust_layer_space(Layer::new(Affine::scale(0.0))));
    assert_eq!(m, before);
}

#[test]
fn apply_origin_moves_origin_to_zero() {
    let mut m = Mapping::default();
    m.apply_origin(Layer::new(IPoint::new(5, 7)));
    let o = m.device_to_layer(Device::new(IPoint::new(5, 7)));
    assert_eq!(o.get(), IPoint::ZERO);
    let back = m.map_to_device(Layer::new(IPoint::ZERO));
    assert_eq!(back.get(), IPoint::new(5, 7));
}

#[test]
fn concat_local_redefines_parameter_space() {
    let mut m = Mapping::new(Affine::scale(2.0));
    m.concat_local(Parameter::new(Affine::translate((1.0, 0.0))));
    let p = m.param_to_layer(Parameter::new(Point::new(0.0, 0.0)));
    assert_eq!(p.get(), Point::new(2.0, 0.0));
    assert_identity(m.layer_to_device_matrix());
}

#[test]
fn vectors_and_rects_use_their_own_rules() {
    let m = Mapping::from_parts(Affine::translate((100.0, 0.0)), Affine::IDENTITY).unwrap();
    let v = m.map_to_device(Layer::new(Vector::new(1.0, 1.0)));
    assert_eq!(v.get(), Vector::new(1.0, 1.0));
    let r = m.map_to_layer(Device::new(Rect::new(100.0, 0.0, 110.0, 10.0)));
    assert_eq!(r.get(), Rect::new(0.0, 0.0, 10.0, 10.0));
    let back = m.layer_to_param(Layer::new(Point::new(1.0, 1.0))).unwrap();
    assert_eq!(back.get(), Point::new(1.0, 1.0));
}

#[test]
fn capability_min_is_the_weaker_one() {
    use MatrixCapability::*;
    assert_eq!(Complex.min(ScaleTranslate), ScaleTranslate);
    assert_eq!(Translate.min(Complex), Translate);
    assert_eq!(Complex.min(Complex), Complex);
}
