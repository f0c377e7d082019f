use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{IRect, ISize, Point};
use crate::foundation::error::{FxError, FxResult};
use crate::image::color::Color4f;
use crate::image::sampling::{FilterMode, SamplingOptions};
use crate::render::surface::BackendKind;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

fn next_image_id() -> u64 {
    NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Immutable, ref-counted image used as the backing store of filter results.
///
/// Pixels are premultiplied RGBA8 held in a shared [`vello_cpu::Pixmap`]; the image only exposes
/// its `subset` of that pixmap. Subsetting and cloning share the pixel buffer. Reads outside the
/// subset are transparent (decal).
#[derive(Clone)]
pub struct SpecialImage {
    pixels: Arc<vello_cpu::Pixmap>,
    subset: IRect,
    backend: BackendKind,
    id: u64,
}

impl std::fmt::Debug for SpecialImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialImage")
            .field("id", &self.id)
            .field("subset", &self.subset)
            .field("backend", &self.backend)
            .finish()
    }
}

impl SpecialImage {
    /// Wrap a whole pixmap as a raster image.
    pub fn from_pixmap(pixmap: vello_cpu::Pixmap) -> Self {
        let subset = IRect::new(0, 0, i32::from(pixmap.width()), i32::from(pixmap.height()));
        Self {
            pixels: Arc::new(pixmap),
            subset,
            backend: BackendKind::Raster,
            id: next_image_id(),
        }
    }

    /// Copy premultiplied RGBA8 bytes (`width * height * 4`, tightly packed) into a new image.
    pub fn from_rgba8_premul(width: u32, height: u32, bytes: &[u8]) -> FxResult<Self> {
        if width == 0 || height == 0 {
            return Err(FxError::validation("image dimensions must be non-zero"));
        }
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(FxError::allocation(format!(
                "{width}x{height} exceeds the largest pixmap ({max}x{max})",
                max = u16::MAX
            )));
        };
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if bytes.len() != expected {
            return Err(FxError::validation(format!(
                "rgba8 byte len mismatch: expected {expected}, got {}",
                bytes.len()
            )));
        }
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        pixmap.data_as_u8_slice_mut().copy_from_slice(bytes);
        Ok(Self::from_pixmap(pixmap))
    }

    /// Like [`SpecialImage::from_rgba8_premul`] for straight-alpha input (e.g. decoded PNGs).
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> FxResult<Self> {
        let mut premul = bytes.to_vec();
        premultiply_rgba8_in_place(&mut premul);
        Self::from_rgba8_premul(width, height, &premul)
    }

    /// Image of `size` filled with one color.
    pub fn filled(size: ISize, color: Color4f) -> FxResult<Self> {
        if size.is_empty() {
            return Err(FxError::validation("image dimensions must be non-zero"));
        }
        let px = color.to_rgba8_premul();
        let bytes: Vec<u8> = std::iter::repeat_n(px, size.area() as usize)
            .flatten()
            .collect();
        Self::from_rgba8_premul(size.width as u32, size.height as u32, &bytes)
    }

    /// Same pixels, tagged as living on `backend`.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Identity of the pixel content; subsets get a fresh id.
    pub fn unique_id(&self) -> u64 {
        self.id
    }

    pub fn dimensions(&self) -> ISize {
        self.subset.size()
    }

    /// Visible rectangle within the backing pixmap.
    pub fn subset(&self) -> IRect {
        self.subset
    }

    pub fn is_texture_backed(&self) -> bool {
        self.backend != BackendKind::Raster
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend
    }

    /// True when both images expose the same subset of the same pixel buffer.
    pub fn ptr_eq(a: &SpecialImage, b: &SpecialImage) -> bool {
        Arc::ptr_eq(&a.pixels, &b.pixels) && a.subset == b.subset
    }

    /// Sub-image for `rect`, given in this image's own coordinates. Shares pixels.
    pub fn make_subset(&self, rect: IRect) -> Option<SpecialImage> {
        let local = rect.intersect(IRect::from_size(self.dimensions()))?;
        if local == IRect::from_size(self.dimensions()) {
            return Some(self.clone());
        }
        Some(Self {
            pixels: Arc::clone(&self.pixels),
            subset: local.offset(self.subset.left, self.subset.top),
            backend: self.backend,
            id: next_image_id(),
        })
    }

    /// Texel at integer image coordinates, transparent outside the subset.
    pub fn pixel(&self, x: i32, y: i32) -> Color4f {
        let size = self.dimensions();
        if x < 0 || y < 0 || x >= size.width || y >= size.height {
            return Color4f::TRANSPARENT;
        }
        let stride = usize::from(self.pixels.width());
        let px = (self.subset.left + x) as usize;
        let py = (self.subset.top + y) as usize;
        let i = (py * stride + px) * 4;
        let data = self.pixels.data_as_u8_slice();
        Color4f::from_rgba8_premul([data[i], data[i + 1], data[i + 2], data[i + 3]])
    }

    /// Filtered read at continuous image coordinates; texel `(i, j)` covers `[i, i+1) x [j, j+1)`.
    pub fn sample(&self, p: Point, sampling: SamplingOptions) -> Color4f {
        let (u, v) = (p.x - 0.5, p.y - 0.5);
        if let Some(cubic) = sampling.cubic {
            let (x0, y0) = (u.floor(), v.floor());
            let (fx, fy) = ((u - x0) as f32, (v - y0) as f32);
            let (x0, y0) = (x0 as i32, y0 as i32);
            let mut acc = Color4f::TRANSPARENT;
            for j in -1..=2 {
                let wy = cubic.weight(j as f32 - fy);
                if wy == 0.0 {
                    continue;
                }
                for i in -1..=2 {
                    let w = cubic.weight(i as f32 - fx) * wy;
                    acc = acc.add(self.pixel(x0 + i, y0 + j).scale(w));
                }
            }
            return acc.clamp();
        }
        match sampling.filter {
            FilterMode::Nearest => self.pixel(p.x.floor() as i32, p.y.floor() as i32),
            FilterMode::Linear => {
                let (x0, y0) = (u.floor(), v.floor());
                let (fx, fy) = ((u - x0) as f32, (v - y0) as f32);
                let (x0, y0) = (x0 as i32, y0 as i32);
                let top = lerp(self.pixel(x0, y0), self.pixel(x0 + 1, y0), fx);
                let bottom = lerp(self.pixel(x0, y0 + 1), self.pixel(x0 + 1, y0 + 1), fx);
                lerp(top, bottom, fy)
            }
        }
    }

    /// Tightly packed premultiplied RGBA8 copy of the subset.
    pub fn to_rgba8_premul(&self) -> Vec<u8> {
        let size = self.dimensions();
        let stride = usize::from(self.pixels.width()) * 4;
        let data = self.pixels.data_as_u8_slice();
        let row_len = size.width as usize * 4;
        let mut out = Vec::with_capacity(row_len * size.height as usize);
        for y in 0..size.height as usize {
            let start = (self.subset.top as usize + y) * stride + self.subset.left as usize * 4;
            out.extend_from_slice(&data[start..start + row_len]);
        }
        out
    }

    /// Straight-alpha RGBA8 copy of the subset, as PNG encoders expect.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = self.to_rgba8_premul();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }
}

fn lerp(a: Color4f, b: Color4f, t: f32) -> Color4f {
    if t == 0.0 {
        return a;
    }
    a.scale(1.0 - t).add(b.scale(t))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((u16::from(px[0]) * a + 127) / 255) as u8;
        px[1] = ((u16::from(px[1]) * a + 127) / 255) as u8;
        px[2] = ((u16::from(px[2]) * a + 127) / 255) as u8;
    }
}

/// Inverse of [`premultiply_rgba8_in_place`], used when handing pixels to PNG encoders.
pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/special.rs"]
mod tests;
