use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{Affine, ISize, Point};
use crate::image::color::{BlendMode, Color4f, ColorSpace, ColorType};
use crate::image::picture::Picture;
use crate::image::special::SpecialImage;
use crate::render::raster;

/// Where an image's pixels live. `Raster` images have no backend affinity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Raster,
    /// Immediate-mode GPU context.
    Direct,
    /// Deferred GPU recording context.
    Recorder,
}

/// Subpixel layout of the target, carried for consumers that render text or LCD-aware content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelGeometry {
    #[default]
    Unknown,
    RgbHorizontal,
    BgrHorizontal,
    RgbVertical,
    BgrVertical,
}

/// Surface-creation properties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SurfaceProps {
    pub pixel_geometry: PixelGeometry,
}

/// Everything needed to create a scratch render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub size: ISize,
    pub color_type: ColorType,
    pub color_space: ColorSpace,
    pub props: SurfaceProps,
    pub backend: BackendKind,
}

impl SurfaceDesc {
    /// Bytes of premultiplied RGBA8 storage.
    pub fn byte_len(&self) -> u64 {
        self.size.area().saturating_mul(4)
    }
}

/// Creates scratch render targets for materialization. `None` means the surface could not be
/// allocated; callers treat that as a transparent result.
pub trait SurfaceFactory: Send + Sync + std::fmt::Debug {
    fn make_surface(&self, desc: &SurfaceDesc) -> Option<Surface>;
}

/// Limits for [`RasterSurfaceFactory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterOpts {
    /// Largest single surface, in bytes.
    pub max_surface_bytes: u64,
    /// Largest width or height. Never above `u16::MAX`.
    pub max_dimension: u32,
}

impl Default for RasterOpts {
    fn default() -> Self {
        Self {
            max_surface_bytes: 256 * 1024 * 1024,
            max_dimension: u32::from(u16::MAX),
        }
    }
}

impl RasterOpts {
    /// Defaults, with `LAYERFX_MAX_SURFACE_BYTES` overriding the byte limit when set to a
    /// positive integer.
    pub fn from_env() -> Self {
        let default = Self::default();
        let max_surface_bytes = std::env::var("LAYERFX_MAX_SURFACE_BYTES")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(default.max_surface_bytes);
        Self {
            max_surface_bytes,
            ..default
        }
    }
}

/// Counters for scratch allocation and painting. Shared between a factory and its surfaces.
#[derive(Debug, Default)]
pub struct RenderStats {
    surfaces_allocated: AtomicU64,
    bytes_allocated: AtomicU64,
    paints: AtomicU64,
    failed_allocations: AtomicU64,
}

/// Point-in-time copy of [`RenderStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStatsSnapshot {
    pub surfaces_allocated: u64,
    pub bytes_allocated: u64,
    pub paints: u64,
    pub failed_allocations: u64,
}

impl RenderStats {
    pub fn snapshot(&self) -> RenderStatsSnapshot {
        RenderStatsSnapshot {
            surfaces_allocated: self.surfaces_allocated.load(Ordering::Relaxed),
            bytes_allocated: self.bytes_allocated.load(Ordering::Relaxed),
            paints: self.paints.load(Ordering::Relaxed),
            failed_allocations: self.failed_allocations.load(Ordering::Relaxed),
        }
    }

    fn record_alloc(&self, bytes: u64) {
        self.surfaces_allocated.fetch_add(1, Ordering::Relaxed);
        self.bytes_allocated.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_paint(&self) {
        self.paints.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed_allocations.fetch_add(1, Ordering::Relaxed);
    }
}

/// CPU surface factory backed by `vello_cpu` pixmaps.
#[derive(Debug, Default)]
pub struct RasterSurfaceFactory {
    opts: RasterOpts,
    stats: Arc<RenderStats>,
}

impl RasterSurfaceFactory {
    pub fn new(opts: RasterOpts) -> Self {
        Self {
            opts,
            stats: Arc::new(RenderStats::default()),
        }
    }

    pub fn opts(&self) -> RasterOpts {
        self.opts
    }

    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }
}

impl SurfaceFactory for RasterSurfaceFactory {
    fn make_surface(&self, desc: &SurfaceDesc) -> Option<Surface> {
        let max_dim = self.opts.max_dimension.min(u32::from(u16::MAX));
        let fits = !desc.size.is_empty()
            && desc.size.width as u32 <= max_dim
            && desc.size.height as u32 <= max_dim
            && desc.byte_len() <= self.opts.max_surface_bytes;
        if !fits {
            self.stats.record_failure();
            tracing::warn!(
                width = desc.size.width,
                height = desc.size.height,
                max_surface_bytes = self.opts.max_surface_bytes,
                "scratch surface rejected"
            );
            return None;
        }
        let surface = Surface::new(*desc)?.with_stats(Arc::clone(&self.stats));
        self.stats.record_alloc(desc.byte_len());
        Some(surface)
    }
}

/// Scratch render target. Starts fully transparent; [`Surface::snapshot`] turns it into an
/// immutable image.
pub struct Surface {
    pixmap: vello_cpu::Pixmap,
    desc: SurfaceDesc,
    stats: Option<Arc<RenderStats>>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface").field("desc", &self.desc).finish()
    }
}

impl Surface {
    /// Transparent surface for `desc`. `None` when the size is empty or exceeds `u16`.
    pub fn new(desc: SurfaceDesc) -> Option<Self> {
        if desc.size.is_empty() {
            return None;
        }
        let w: u16 = desc.size.width.try_into().ok()?;
        let h: u16 = desc.size.height.try_into().ok()?;
        Some(Self {
            pixmap: vello_cpu::Pixmap::new(w, h),
            desc,
            stats: None,
        })
    }

    /// Report paints into `stats`.
    pub fn with_stats(mut self, stats: Arc<RenderStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn size(&self) -> ISize {
        self.desc.size
    }

    pub fn desc(&self) -> &SurfaceDesc {
        &self.desc
    }

    /// One paint: evaluate `shade` at every pixel center (surface coordinates) and blend the
    /// result onto the current contents with `blend`.
    pub fn fill_with(&mut self, shade: impl Fn(Point) -> Color4f, blend: BlendMode, dither: bool) {
        let w = usize::from(self.pixmap.width());
        for (i, px) in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4).enumerate() {
            let (x, y) = ((i % w) as u32, (i / w) as u32);
            let mut src = shade(Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5));
            if dither {
                src = raster::apply_dither(src, x, y);
            }
            let out = match blend {
                BlendMode::Src => src.clamp(),
                mode => mode.blend(src, Color4f::from_rgba8_premul([px[0], px[1], px[2], px[3]])),
            };
            px.copy_from_slice(&out.to_rgba8_premul());
        }
        self.record_paint();
    }

    /// One paint: play `picture` back through `transform` (picture coordinates → surface
    /// coordinates) and composite it source-over.
    pub fn draw_picture(&mut self, picture: &Picture, transform: Affine) {
        let layer =
            raster::rasterize_picture(picture, transform, self.pixmap.width(), self.pixmap.height());
        let src = layer.data_as_u8_slice();
        for (d, s) in self
            .pixmap
            .data_as_u8_slice_mut()
            .chunks_exact_mut(4)
            .zip(src.chunks_exact(4))
        {
            let sa = u16::from(s[3]);
            if sa == 0 {
                continue;
            }
            let inv = 255 - sa;
            for c in 0..4 {
                d[c] = (u16::from(s[c]) + (u16::from(d[c]) * inv + 127) / 255).min(255) as u8;
            }
        }
        self.record_paint();
    }

    /// Freeze the pixels into an image tagged with this surface's backend.
    pub fn snapshot(self) -> SpecialImage {
        SpecialImage::from_pixmap(self.pixmap).with_backend(self.desc.backend)
    }

    fn record_paint(&self) {
        if let Some(stats) = &self.stats {
            stats.record_paint();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
