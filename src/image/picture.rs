use crate::foundation::core::{BezPath, Rect};
use crate::image::color::Color4f;

/// One recorded draw.
#[derive(Clone, Debug, PartialEq)]
pub enum PictureOp {
    FillRect { rect: Rect, color: Color4f },
    FillPath { path: BezPath, color: Color4f },
}

/// Recorded vector content in its own (parameter) coordinates, clipped to `cull` when played
/// back.
#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    cull: Rect,
    ops: Vec<PictureOp>,
}

impl Picture {
    pub fn new(cull: Rect) -> Self {
        Self {
            cull,
            ops: Vec::new(),
        }
    }

    pub fn fill_rect(mut self, rect: Rect, color: Color4f) -> Self {
        self.ops.push(PictureOp::FillRect { rect, color });
        self
    }

    pub fn fill_path(mut self, path: BezPath, color: Color4f) -> Self {
        self.ops.push(PictureOp::FillPath { path, color });
        self
    }

    pub fn cull(&self) -> Rect {
        self.cull
    }

    pub fn ops(&self) -> &[PictureOp] {
        &self.ops
    }

    /// Same ops with the cull narrowed to `clip`.
    pub fn clipped(&self, clip: Rect) -> Picture {
        let cull = self.cull.intersect(clip);
        Picture {
            cull,
            ops: self.ops.clone(),
        }
    }

    /// Nothing visible: no ops, or a degenerate cull rect.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() || !(self.cull.x0 < self.cull.x1 && self.cull.y0 < self.cull.y1)
    }
}
