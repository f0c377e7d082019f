use super::*;
use crate::filter::cache::{FilterCache, InMemoryFilterCache};
use crate::filter::context::ContextInfo;
use crate::filter::result::ResultState;
use crate::foundation::core::{IPoint, IRect};
use crate::image::special::SpecialImage;
use crate::mapping::Mapping;
use crate::render::surface::RasterSurfaceFactory;

const RED: Color4f = Color4f::new(1.0, 0.0, 0.0, 1.0);

fn harness(desired: IRect, cache: Option<Arc<InMemoryFilterCache>>) -> (Context, Arc<RasterSurfaceFactory>) {
    let factory = Arc::new(RasterSurfaceFactory::default());
    let mut info = ContextInfo::new(Mapping::default(), Layer::new(desired));
    info.cache = cache.map(|c| c as Arc<dyn FilterCache>);
    let source = SpecialImage::filled(ISize::new(10, 10), RED).unwrap();
    let ctx = Context::make_raster(info, factory.clone())
        .with_new_source(Some(source), Layer::new(IPoint::ZERO));
    (ctx, factory)
}

fn read(ctx: &Context, result: &FilterResult, x: i32, y: i32) -> [u8; 4] {
    let (image, origin) = result.image_and_offset(ctx);
    image
        .unwrap()
        .pixel(x - origin.x(), y - origin.y())
        .to_rgba8_premul()
}

fn from_json(json: &str) -> Arc<ImageFilter> {
    ImageFilter::from_spec(&FilterSpec::from_json(json).unwrap()).unwrap()
}

#[test]
fn ids_are_unique() {
    let a = ImageFilter::new(FilterOp::Source, []);
    let b = ImageFilter::new(FilterOp::Source, []);
    assert_ne!(a.id(), b.id());
}

#[test]
fn offset_moves_source_without_rendering() {
    let (ctx, factory) = harness(IRect::new(0, 0, 50, 50), None);
    let node = ImageFilter::new(FilterOp::Offset(Vector::new(5.0, 3.0)), [None]);
    let out = node.filter_image(&ctx);
    assert_eq!(out.layer_bounds().get(), IRect::new(5, 3, 15, 13));
    assert_eq!(out.state(), ResultState::Resolved);
    assert!(SpecialImage::ptr_eq(out.image().unwrap(), ctx.source().image().unwrap()));
    assert_eq!(factory.stats().snapshot().surfaces_allocated, 0);
}

#[test]
fn crop_limits_bounds_without_rendering() {
    let (ctx, factory) = harness(IRect::new(0, 0, 50, 50), None);
    let out = from_json(r#"{ "kind": "crop", "rect": [2, 2, 6, 6] }"#).filter_image(&ctx);
    assert_eq!(out.layer_bounds().get(), IRect::new(2, 2, 6, 6));
    assert_eq!(factory.stats().snapshot().surfaces_allocated, 0);

    let outside = from_json(r#"{ "kind": "crop", "rect": [60, 60, 70, 70] }"#).filter_image(&ctx);
    assert!(outside.is_empty());
}

#[test]
fn flood_fills_its_rect() {
    let (ctx, factory) = harness(IRect::new(0, 0, 50, 50), None);
    let out = from_json(r##"{ "kind": "flood", "color": "#ffffff", "rect": [1, 1, 3, 3] }"##)
        .filter_image(&ctx);
    assert_eq!(out.layer_bounds().get(), IRect::new(1, 1, 3, 3));
    assert_eq!(read(&ctx, &out, 1, 1), [255, 255, 255, 255]);
    assert_eq!(factory.stats().snapshot().surfaces_allocated, 1);

    let everywhere = from_json(r##"{ "kind": "flood", "color": "#ffffff" }"##).filter_image(&ctx);
    assert_eq!(everywhere.layer_bounds().get(), IRect::new(0, 0, 50, 50));
}

#[test]
fn merge_combines_inputs_in_one_paint() {
    let (ctx, factory) = harness(IRect::new(0, 0, 50, 50), None);
    let json = r#"{
        "kind": "merge",
        "inputs": [null, { "kind": "offset", "dx": 20, "dy": 0 }]
    }"#;
    let out = from_json(json).filter_image(&ctx);
    assert_eq!(out.layer_bounds().get(), IRect::new(0, 0, 30, 10));
    assert_eq!(read(&ctx, &out, 25, 5), [255, 0, 0, 255]);
    assert_eq!(read(&ctx, &out, 15, 5), [0, 0, 0, 0]);
    assert_eq!(factory.stats().snapshot().surfaces_allocated, 1);
}

#[test]
fn compose_feeds_inner_into_outer() {
    let (ctx, _) = harness(IRect::new(0, 0, 50, 50), None);
    let json = r#"{
        "kind": "compose",
        "outer": { "kind": "offset", "dx": 1, "dy": 1 },
        "inner": { "kind": "crop", "rect": [0, 0, 2, 2] }
    }"#;
    let out = from_json(json).filter_image(&ctx);
    assert_eq!(out.layer_bounds().get(), IRect::new(1, 1, 3, 3));
}

#[test]
fn blend_uses_background_alpha() {
    let (ctx, _) = harness(IRect::new(0, 0, 50, 50), None);
    let json = r##"{
        "kind": "blend",
        "mode": "src_in",
        "background": { "kind": "flood", "color": "#ffffff", "rect": [0, 0, 4, 4] }
    }"##;
    let out = from_json(json).filter_image(&ctx);
    assert_eq!(out.layer_bounds().get(), IRect::new(0, 0, 10, 10));
    assert_eq!(read(&ctx, &out, 1, 1), [255, 0, 0, 255]);
    assert_eq!(read(&ctx, &out, 6, 6), [0, 0, 0, 0]);
}

#[test]
fn color_matrix_stays_pending() {
    let (ctx, factory) = harness(IRect::new(0, 0, 50, 50), None);
    let out = from_json(r#"{ "kind": "color_matrix", "matrix": "grayscale" }"#).filter_image(&ctx);
    assert_eq!(out.state(), ResultState::Deferred);
    assert_eq!(out.layer_bounds().get(), IRect::new(0, 0, 10, 10));
    assert_eq!(factory.stats().snapshot().surfaces_allocated, 0);
    let px = read(&ctx, &out, 2, 2);
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
}

#[test]
fn transform_scales_with_requested_sampling() {
    let (ctx, _) = harness(IRect::new(0, 0, 50, 50), None);
    let mut bytes = [255u8, 0, 0, 255].repeat(4);
    bytes[12..16].copy_from_slice(&[0, 255, 0, 255]);
    let image = SpecialImage::from_rgba8_premul(2, 2, &bytes).unwrap();
    let ctx = ctx.with_new_source(Some(image), Layer::new(IPoint::ZERO));

    let node = ImageFilter::new(
        FilterOp::Transform {
            matrix: Affine::scale(2.0),
            sampling: SamplingOptions::NEAREST,
        },
        [None],
    );
    let out = node.filter_image(&ctx);
    assert_eq!(out.layer_bounds().get(), IRect::new(0, 0, 4, 4));
    assert_eq!(read(&ctx, &out, 0, 0), [255, 0, 0, 255]);
    assert_eq!(read(&ctx, &out, 3, 3), [0, 255, 0, 255]);
}

#[test]
fn capability_is_the_weakest_in_the_tree() {
    let offset = from_json(r#"{ "kind": "offset", "dx": 1, "dy": 1 }"#);
    assert_eq!(offset.capability(), MatrixCapability::Complex);

    let cropped = from_json(
        r#"{ "kind": "merge", "inputs": [
            { "kind": "offset", "dx": 1, "dy": 1 },
            { "kind": "crop", "rect": [0, 0, 2, 2] }
        ] }"#,
    );
    assert_eq!(cropped.capability(), MatrixCapability::ScaleTranslate);
}

#[test]
fn empty_desired_output_short_circuits() {
    let (ctx, factory) = harness(IRect::new(0, 0, 50, 50), None);
    let ctx = ctx.with_new_desired_output(Layer::<IRect>::empty());
    let out = from_json(r##"{ "kind": "flood", "color": "#ffffff" }"##).filter_image(&ctx);
    assert!(out.is_empty());
    assert_eq!(factory.stats().snapshot().surfaces_allocated, 0);
}

#[test]
fn cached_results_are_reused() {
    let cache = Arc::new(InMemoryFilterCache::new(16));
    let (ctx, factory) = harness(IRect::new(0, 0, 20, 20), Some(cache.clone()));
    let node = from_json(r##"{ "kind": "flood", "color": "#00ff00" }"##);

    let first = node.filter_image(&ctx);
    let second = node.filter_image(&ctx);
    assert!(SpecialImage::ptr_eq(first.image().unwrap(), second.image().unwrap()));
    assert_eq!(factory.stats().snapshot().surfaces_allocated, 1);
    assert_eq!(cache.stats().hits, 1);

    // A different request is a different entry.
    let smaller = ctx.with_new_desired_output(Layer::new(IRect::new(0, 0, 5, 5)));
    node.filter_image(&smaller);
    assert_eq!(factory.stats().snapshot().surfaces_allocated, 2);
}

#[test]
fn shared_node_under_different_sources_is_not_confused() {
    let cache = Arc::new(InMemoryFilterCache::new(16));
    let (ctx, _) = harness(IRect::new(0, 0, 10, 10), Some(cache.clone()));
    let outer = ImageFilter::new(FilterOp::Source, []);
    let tint = |color: Color4f| {
        let inner = ImageFilter::new(
            FilterOp::ColorFilter(ColorFilter::blend(color, BlendMode::SrcIn)),
            [None],
        );
        ImageFilter::new(FilterOp::Compose, [Some(Arc::clone(&outer)), Some(inner)])
    };
    let red = tint(Color4f::new(1.0, 0.0, 0.0, 1.0));
    let blue = tint(Color4f::new(0.0, 0.0, 1.0, 1.0));

    let r = red.filter_image(&ctx);
    let b = blue.filter_image(&ctx);
    assert_eq!(read(&ctx, &r, 5, 5), [255, 0, 0, 255]);
    assert_eq!(read(&ctx, &b, 5, 5), [0, 0, 255, 255]);
    assert_eq!(cache.stats().hits, 0);
}

#[test]
fn malformed_descriptions_do_not_build() {
    let spec = FilterSpec::ColorMatrix {
        matrix: model::ColorMatrixDef::Values(vec![1.0; 3]),
        input: None,
    };
    assert!(ImageFilter::from_spec(&spec).is_err());
}
