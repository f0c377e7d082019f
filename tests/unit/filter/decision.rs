use super::*;
use crate::image::color::{BlendMode, Color4f, ColorMatrix};

fn image_at<'a>(x: i32, y: i32, w: i32, h: i32) -> PendingOps<'a> {
    PendingOps {
        image_size: Some(ISize::new(w, h)),
        sampling: SamplingOptions::DEFAULT,
        transform: Layer::new(Affine::translate((f64::from(x), f64::from(y)))),
        color_filter: None,
        layer_bounds: Layer::new(IRect::new(x, y, x + w, y + h)),
    }
}

fn nothing() -> PendingOps<'static> {
    PendingOps {
        image_size: None,
        sampling: SamplingOptions::DEFAULT,
        transform: Layer::<Affine>::identity(),
        color_filter: None,
        layer_bounds: Layer::<IRect>::empty(),
    }
}

fn desired(l: i32, t: i32, r: i32, b: i32) -> Layer<IRect> {
    Layer::new(IRect::new(l, t, r, b))
}

#[test]
fn integer_translation_is_deferred() {
    let p = image_at(10, 10, 40, 40);
    let next = Layer::new(Affine::translate((5.0, 5.0)));
    assert_eq!(
        plan_transform(&p, next, SamplingOptions::NEAREST, desired(0, 0, 100, 100)),
        TransformPlan::Defer {
            sampling: SamplingOptions::DEFAULT
        }
    );
}

#[test]
fn uncropped_scale_is_deferred() {
    let p = image_at(0, 0, 10, 10);
    let plan = plan_transform(
        &p,
        Layer::new(Affine::scale(2.0)),
        SamplingOptions::DEFAULT,
        desired(0, 0, 100, 100),
    );
    assert_eq!(
        plan,
        TransformPlan::Defer {
            sampling: SamplingOptions::DEFAULT
        }
    );
}

#[test]
fn visible_crop_forces_resolve_before_scale() {
    let mut p = image_at(0, 0, 10, 10);
    p.layer_bounds = desired(2, 2, 8, 8);
    let scale = Layer::new(Affine::scale(1.5));
    assert!(is_cropped(&p, scale, desired(0, 0, 100, 100)));
    assert!(matches!(
        plan_transform(&p, scale, SamplingOptions::DEFAULT, desired(0, 0, 100, 100)),
        TransformPlan::Resolve { .. }
    ));
}

#[test]
fn crop_outside_desired_output_is_invisible() {
    let mut p = image_at(0, 0, 10, 10);
    p.layer_bounds = desired(0, 0, 10, 5);
    // Only the top half is read, so the crop edge never shows.
    assert!(!is_cropped(&p, Layer::<Affine>::identity(), desired(0, 0, 10, 5)));
}

#[test]
fn incompatible_sampling_resolves() {
    let mut p = image_at(0, 0, 10, 10);
    p.transform = Layer::new(Affine::scale(2.0));
    p.layer_bounds = desired(0, 0, 20, 20);
    let next = Layer::new(Affine::translate((0.5, 0.0)));
    assert_eq!(
        plan_transform(&p, next, SamplingOptions::NEAREST, desired(0, 0, 100, 100)),
        TransformPlan::Resolve {
            sampling: SamplingOptions::NEAREST
        }
    );
}

#[test]
fn bleeding_filter_blocks_non_integer_transform() {
    let flood = ColorFilter::Blend {
        color: Color4f::WHITE,
        mode: BlendMode::SrcOver,
    };
    let mut p = image_at(0, 0, 10, 10);
    p.color_filter = Some(&flood);
    assert!(matches!(
        plan_transform(
            &p,
            Layer::new(Affine::scale(2.0)),
            SamplingOptions::DEFAULT,
            desired(0, 0, 100, 100)
        ),
        TransformPlan::Resolve { .. }
    ));
    assert!(matches!(
        plan_transform(
            &p,
            Layer::new(Affine::translate((3.0, 0.0))),
            SamplingOptions::DEFAULT,
            desired(0, 0, 100, 100)
        ),
        TransformPlan::Defer { .. }
    ));
}

#[test]
fn flood_on_nothing_fills_desired_output() {
    let flood = ColorFilter::Blend {
        color: Color4f::WHITE,
        mode: BlendMode::SrcOver,
    };
    assert_eq!(
        plan_color_filter(&nothing(), &flood, desired(0, 0, 10, 10)),
        ColorFilterPlan::FillDesired
    );
}

#[test]
fn plain_filter_on_invisible_result_is_empty() {
    let gray = ColorFilter::Matrix(ColorMatrix::GRAYSCALE);
    let p = image_at(0, 0, 10, 10);
    assert_eq!(
        plan_color_filter(&p, &gray, desired(20, 20, 30, 30)),
        ColorFilterPlan::Empty
    );
    assert_eq!(
        plan_color_filter(&nothing(), &gray, desired(0, 0, 10, 10)),
        ColorFilterPlan::Empty
    );
    assert_eq!(
        plan_color_filter(&p, &gray, desired(5, 5, 30, 30)),
        ColorFilterPlan::Compose {
            bounds: desired(5, 5, 10, 10)
        }
    );
}

#[test]
fn flood_over_cropped_result_resolves_the_crop_first() {
    let flood = ColorFilter::Blend {
        color: Color4f::WHITE,
        mode: BlendMode::DstOver,
    };
    let mut p = image_at(0, 0, 10, 10);
    p.layer_bounds = desired(0, 0, 5, 5);
    assert_eq!(
        plan_color_filter(&p, &flood, desired(0, 0, 20, 20)),
        ColorFilterPlan::ResolveThenCompose {
            resolve: desired(0, 0, 5, 5),
            bounds: desired(0, 0, 20, 20),
        }
    );

    let whole = image_at(0, 0, 10, 10);
    assert_eq!(
        plan_color_filter(&whole, &flood, desired(0, 0, 20, 20)),
        ColorFilterPlan::Compose {
            bounds: desired(0, 0, 20, 20)
        }
    );
}

#[test]
fn shader_plans() {
    let p = image_at(0, 0, 10, 10);
    let d = desired(0, 0, 10, 10);
    assert_eq!(
        plan_shader(&p, SamplingOptions::DEFAULT, ShaderFlags::empty(), Affine::IDENTITY, d),
        Some(ShaderPlan::Deferred {
            sampling: SamplingOptions::DEFAULT
        })
    );
    assert_eq!(
        plan_shader(
            &p,
            SamplingOptions::DEFAULT,
            ShaderFlags::FORCE_RESOLVE_INPUTS,
            Affine::IDENTITY,
            d
        ),
        Some(ShaderPlan::Resolve)
    );
    assert_eq!(
        plan_shader(&nothing(), SamplingOptions::DEFAULT, ShaderFlags::empty(), Affine::IDENTITY, d),
        None
    );

    let mut cropped = image_at(0, 0, 10, 10);
    cropped.layer_bounds = desired(0, 0, 4, 4);
    assert_eq!(
        plan_shader(&cropped, SamplingOptions::DEFAULT, ShaderFlags::empty(), Affine::IDENTITY, d),
        Some(ShaderPlan::Resolve)
    );
}

#[test]
fn parameter_space_nearest_needs_integer_layer_matrix() {
    let p = image_at(0, 0, 10, 10);
    let d = desired(0, 0, 10, 10);
    let flags = ShaderFlags::SAMPLE_IN_PARAMETER_SPACE;
    // Nearest reads through an integer image placement are exact either way.
    assert_eq!(
        plan_shader(&p, SamplingOptions::NEAREST, flags, Affine::scale(2.0), d),
        Some(ShaderPlan::Deferred {
            sampling: SamplingOptions::NEAREST
        })
    );
    let mut scaled = image_at(0, 0, 10, 10);
    scaled.transform = Layer::new(Affine::scale(1.0 / 3.0));
    scaled.layer_bounds = desired(0, 0, 4, 4);
    assert_eq!(
        plan_shader(&scaled, SamplingOptions::NEAREST, flags, Affine::scale(2.0), desired(0, 0, 3, 3)),
        Some(ShaderPlan::Resolve)
    );
}
