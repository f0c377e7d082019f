use super::*;

fn gradient_4x4() -> SpecialImage {
    let mut bytes = Vec::new();
    for y in 0..4u8 {
        for x in 0..4u8 {
            bytes.extend_from_slice(&[x * 60, y * 60, 0, 255]);
        }
    }
    SpecialImage::from_rgba8_premul(4, 4, &bytes).unwrap()
}

#[test]
fn rejects_bad_buffers() {
    assert!(matches!(
        SpecialImage::from_rgba8_premul(2, 2, &[0; 15]),
        Err(FxError::Validation(_))
    ));
    assert!(matches!(
        SpecialImage::from_rgba8_premul(0, 2, &[]),
        Err(FxError::Validation(_))
    ));
}

#[test]
fn oversized_pixmap_is_an_allocation_error() {
    let err = SpecialImage::from_rgba8_premul(70_000, 1, &[]).unwrap_err();
    assert!(matches!(err, FxError::Allocation(_)), "{err}");
    assert!(err.to_string().contains("70000x1"));
    assert!(matches!(
        SpecialImage::from_rgba8(1, 70_000, &[]),
        Err(FxError::Allocation(_))
    ));
}

#[test]
fn subset_shares_pixels_and_offsets_reads() {
    let img = gradient_4x4();
    let sub = img.make_subset(IRect::new(1, 2, 3, 4)).unwrap();
    assert_eq!(sub.dimensions(), ISize::new(2, 2));
    assert_eq!(sub.subset(), IRect::new(1, 2, 3, 4));
    assert_eq!(sub.pixel(0, 0).to_rgba8_premul(), [60, 120, 0, 255]);
    assert_ne!(sub.unique_id(), img.unique_id());
    assert!(!SpecialImage::ptr_eq(&sub, &img));

    let whole = img.make_subset(IRect::new(-5, -5, 10, 10)).unwrap();
    assert!(SpecialImage::ptr_eq(&whole, &img));
    assert!(img.make_subset(IRect::new(10, 10, 12, 12)).is_none());
}

#[test]
fn reads_outside_subset_are_transparent() {
    let img = gradient_4x4();
    assert_eq!(img.pixel(-1, 0), Color4f::TRANSPARENT);
    assert_eq!(img.pixel(4, 0), Color4f::TRANSPARENT);
    let edge = img.sample(Point::new(0.0, 0.5), SamplingOptions::DEFAULT);
    assert!((edge.a - 0.5).abs() < 1e-6);
}

#[test]
fn sampling_at_texel_centers_is_exact() {
    let img = gradient_4x4();
    for s in [
        SamplingOptions::NEAREST,
        SamplingOptions::DEFAULT,
        SamplingOptions::cubic(crate::image::sampling::CubicResampler::CATMULL_ROM),
    ] {
        let c = img.sample(Point::new(2.5, 1.5), s);
        assert_eq!(c.to_rgba8_premul(), [120, 60, 0, 255], "{s:?}");
    }
}

#[test]
fn bilinear_interpolates_between_centers() {
    let img = gradient_4x4();
    let c = img.sample(Point::new(2.0, 1.5), SamplingOptions::DEFAULT);
    assert_eq!(c.to_rgba8_premul(), [90, 60, 0, 255]);
}

#[test]
fn rgba8_round_trip_through_subset() {
    let img = gradient_4x4();
    let sub = img.make_subset(IRect::new(2, 0, 4, 1)).unwrap();
    assert_eq!(sub.to_rgba8_premul(), vec![120, 0, 0, 255, 180, 0, 0, 255]);
}

#[test]
fn premultiply_helpers() {
    let mut px = [255, 128, 0, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, [128, 64, 0, 128]);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(px, [255, 128, 0, 128]);
}

#[test]
fn backend_tag_marks_texture_images() {
    let img = gradient_4x4();
    assert!(!img.is_texture_backed());
    let gpu = img.with_backend(BackendKind::Direct);
    assert!(gpu.is_texture_backed());
    assert_eq!(gpu.backend_kind(), BackendKind::Direct);
}

#[test]
fn straight_alpha_export_undoes_premultiplication() {
    let img = SpecialImage::from_rgba8(1, 1, &[200, 100, 0, 128]).unwrap();
    let straight = img.to_rgba8();
    assert_eq!(straight[3], 128);
    assert!((i32::from(straight[0]) - 200).abs() <= 1);
    assert!((i32::from(straight[1]) - 100).abs() <= 1);
}
