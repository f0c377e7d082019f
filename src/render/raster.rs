use crate::foundation::core::{Affine, BezPath, Point, Rect};
use crate::foundation::math;
use crate::image::color::Color4f;
use crate::image::picture::{Picture, PictureOp};

const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Ordered-dither offset in color units for pixel `(x, y)`; spans one 8-bit step around zero.
pub(crate) fn dither_offset(x: u32, y: u32) -> f32 {
    let v = BAYER_4X4[(y & 3) as usize][(x & 3) as usize];
    (f32::from(v) - 7.5) / 16.0 / 255.0
}

pub(crate) fn apply_dither(c: Color4f, x: u32, y: u32) -> Color4f {
    if c.a <= 0.0 {
        return c;
    }
    let d = dither_offset(x, y);
    Color4f::new(c.r + d, c.g + d, c.b + d, c.a).clamp()
}

/// Play `picture` back into a `width x height` pixmap through `transform`, clipped to the
/// picture's cull rect.
pub(crate) fn rasterize_picture(
    picture: &Picture,
    transform: Affine,
    width: u16,
    height: u16,
) -> vello_cpu::Pixmap {
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.reset();
    ctx.set_transform(affine_to_cpu(transform));
    for op in picture.ops() {
        match op {
            PictureOp::FillRect { rect, color } => {
                let Some(rect) = clip_rect(*rect, picture.cull()) else {
                    continue;
                };
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
            }
            PictureOp::FillPath { path, color } => {
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_path(&bezpath_to_cpu(path));
            }
        }
    }
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);

    // Paths are not clipped geometrically; drop pixels whose centers fall outside the cull rect.
    if picture
        .ops()
        .iter()
        .any(|op| matches!(op, PictureOp::FillPath { .. }))
    {
        mask_outside_cull(&mut pixmap, transform, picture.cull());
    }
    pixmap
}

fn clip_rect(r: Rect, cull: Rect) -> Option<Rect> {
    let out = Rect::new(
        r.x0.max(cull.x0),
        r.y0.max(cull.y0),
        r.x1.min(cull.x1),
        r.y1.min(cull.y1),
    );
    (out.x0 < out.x1 && out.y0 < out.y1).then_some(out)
}

fn mask_outside_cull(pixmap: &mut vello_cpu::Pixmap, transform: Affine, cull: Rect) {
    let Some(inv) = math::invert(transform) else {
        pixmap.data_as_u8_slice_mut().fill(0);
        return;
    };
    let w = usize::from(pixmap.width());
    for (i, px) in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4).enumerate() {
        let (x, y) = ((i % w) as f64 + 0.5, (i / w) as f64 + 0.5);
        let p = inv * Point::new(x, y);
        if !(p.x >= cull.x0 && p.x < cull.x1 && p.y >= cull.y0 && p.y < cull.y1) {
            px.fill(0);
        }
    }
}

fn color_to_cpu(c: Color4f) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.unpremul();
    vello_cpu::peniko::Color::from_rgba8(
        math::unit_to_u8(r),
        math::unit_to_u8(g),
        math::unit_to_u8(b),
        math::unit_to_u8(a),
    )
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
