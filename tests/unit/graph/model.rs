use super::*;
use crate::foundation::error::FxError;

#[test]
fn nested_graph_parses() {
    let json = r##"{
        "kind": "merge",
        "inputs": [
            { "kind": "flood", "color": "#ff0000", "rect": [0, 0, 10, 10] },
            null,
            {
                "kind": "offset", "dx": 3, "dy": -2,
                "input": { "kind": "color_matrix", "matrix": "grayscale" }
            }
        ]
    }"##;
    let spec = FilterSpec::from_json(json).unwrap();
    let FilterSpec::Merge { inputs } = &spec else {
        panic!("expected merge, got {spec:?}");
    };
    assert_eq!(inputs.len(), 3);
    assert!(inputs[1].is_none());
    assert!(matches!(
        &inputs[0],
        Some(FilterSpec::Flood { rect: Some(r), .. }) if r.to_rect() == Rect::new(0.0, 0.0, 10.0, 10.0)
    ));
    let Some(FilterSpec::Offset { dx, dy, input }) = &inputs[2] else {
        panic!("expected offset");
    };
    assert_eq!((*dx, *dy), (3.0, -2.0));
    assert!(matches!(
        input.as_deref(),
        Some(FilterSpec::ColorMatrix {
            matrix: ColorMatrixDef::Preset(ColorMatrixPreset::Grayscale),
            input: None
        })
    ));

    let again = FilterSpec::from_json(&spec.to_json().unwrap()).unwrap();
    assert_eq!(again, spec);
}

#[test]
fn rects_accept_array_and_object_forms() {
    let arr: RectDef = serde_json::from_str("[1, 2, 5, 8]").unwrap();
    let xywh: RectDef = serde_json::from_str(r#"{ "x": 1, "y": 2, "width": 4, "height": 6 }"#).unwrap();
    let ltrb: RectDef = serde_json::from_str(r#"{ "x0": 1, "y0": 2, "x1": 5, "y1": 8 }"#).unwrap();
    assert_eq!(arr, xywh);
    assert_eq!(arr, ltrb);
    assert_eq!(arr.to_rect(), Rect::new(1.0, 2.0, 5.0, 8.0));
}

#[test]
fn colors_accept_hex_array_and_object_forms() {
    let hex: ColorDef = serde_json::from_str(r##""#FF000080""##).unwrap();
    assert_eq!(hex.r, 1.0);
    assert!((hex.a - 128.0 / 255.0).abs() < 1e-6);

    let arr: ColorDef = serde_json::from_str("[0, 1, 0]").unwrap();
    assert_eq!(arr, ColorDef::rgba(0.0, 1.0, 0.0, 1.0));

    let obj: ColorDef = serde_json::from_str(r#"{ "r": 0, "g": 0, "b": 1 }"#).unwrap();
    assert_eq!(obj.a, 1.0);

    assert!(serde_json::from_str::<ColorDef>(r##""#12345""##).is_err());
    assert!(serde_json::from_str::<ColorDef>("[1, 2]").is_err());
}

#[test]
fn colors_premultiply_on_conversion() {
    let c = ColorDef::rgba(1.0, 0.5, 0.0, 0.5).to_color();
    assert_eq!(c, Color4f::new(0.5, 0.25, 0.0, 0.5));
}

#[test]
fn color_matrix_needs_twenty_values() {
    let json = r#"{ "kind": "color_matrix", "matrix": [1, 0, 0, 0] }"#;
    assert!(matches!(FilterSpec::from_json(json), Err(FxError::Validation(_))));

    let mut values = vec![0.0f32; 20];
    values[18] = 1.0;
    let def = ColorMatrixDef::Values(values);
    assert_eq!(def.to_matrix().unwrap().0[18], 1.0);
}

#[test]
fn invalid_values_are_rejected() {
    let flipped = r#"{ "kind": "crop", "rect": [10, 0, 0, 10] }"#;
    assert!(matches!(FilterSpec::from_json(flipped), Err(FxError::Validation(_))));

    let bad_path = r##"{
        "kind": "picture", "cull": [0, 0, 4, 4],
        "ops": [{ "op": "fill_path", "path": "M 0 0 X 1 1", "color": "#ffffff" }]
    }"##;
    assert!(matches!(FilterSpec::from_json(bad_path), Err(FxError::Validation(_))));

    assert!(FilterSpec::from_json(r#"{ "kind": "sharpen" }"#).is_err());
}

#[test]
fn pictures_record_their_ops() {
    let ops = [
        PictureOpDef::FillRect {
            rect: RectDef::from(Rect::new(0.0, 0.0, 2.0, 2.0)),
            color: ColorDef::rgba(1.0, 1.0, 1.0, 1.0),
        },
        PictureOpDef::FillPath {
            path: "M 0 0 L 4 0 L 4 4 Z".to_owned(),
            color: ColorDef::rgba(0.0, 0.0, 0.0, 1.0),
        },
    ];
    let pic = build_picture(RectDef::from(Rect::new(0.0, 0.0, 4.0, 4.0)), &ops).unwrap();
    assert_eq!(pic.ops().len(), 2);
    assert_eq!(pic.cull(), Rect::new(0.0, 0.0, 4.0, 4.0));
}
