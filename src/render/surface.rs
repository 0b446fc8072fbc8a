use std::path::Path;

use anyhow::Context as _;

use crate::assets::decode::{DecodedImage, unpremultiply_rgba8_in_place};
use crate::foundation::core::{Affine, Rect, SurfaceSize, Vec2};
use crate::foundation::error::{PlayerError, PlayerResult};

/// 2-D drawing surface the renderer paints onto.
///
/// A frame is `clear`, any number of `draw_image` calls, then `present`.
pub trait DrawSurface: Send {
    fn size(&self) -> SurfaceSize;

    /// Reallocate the pixel buffer. Contents are undefined until the next frame is drawn.
    fn resize(&mut self, size: SurfaceSize) -> PlayerResult<()>;

    /// Start a new frame on a transparent buffer.
    fn clear(&mut self);

    /// Paint `image` stretched into `dest` (local coordinates), mapped to the surface by
    /// `transform`.
    fn draw_image(&mut self, image: &DecodedImage, transform: Affine, dest: Rect);

    /// Finish the frame started by [`DrawSurface::clear`].
    fn present(&mut self) {}

    /// Straight-alpha RGBA8 readback, for surfaces that keep pixels.
    fn read_rgba8(&self) -> Option<Vec<u8>> {
        None
    }
}

/// CPU surface backed by a `vello_cpu` pixmap.
pub struct CpuSurface {
    size: SurfaceSize,
    pixmap: vello_cpu::Pixmap,
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuSurface {
    pub fn new(size: SurfaceSize) -> PlayerResult<Self> {
        let (w, h) = surface_dims_u16(size)?;
        Ok(Self {
            size,
            pixmap: vello_cpu::Pixmap::new(w, h),
            ctx: None,
        })
    }

    /// Premultiplied RGBA8 contents as of the last `present`.
    pub fn rgba8_premul(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Straight-alpha RGBA8 copy of the contents, ready for encoding.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = self.pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    pub fn write_png(&self, path: &Path) -> PlayerResult<()> {
        write_png(path, self.size, &self.to_rgba8())
    }

    fn context(&mut self) -> &mut vello_cpu::RenderContext {
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        self.ctx
            .get_or_insert_with(|| vello_cpu::RenderContext::new(w, h))
    }
}

impl DrawSurface for CpuSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) -> PlayerResult<()> {
        if size == self.size {
            return Ok(());
        }
        let (w, h) = surface_dims_u16(size)?;
        self.size = size;
        self.pixmap = vello_cpu::Pixmap::new(w, h);
        self.ctx = None;
        Ok(())
    }

    fn clear(&mut self) {
        clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);
        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        self.ctx = Some(vello_cpu::RenderContext::new(w, h));
    }

    fn draw_image(&mut self, image: &DecodedImage, transform: Affine, dest: Rect) {
        let (iw, ih) = (f64::from(image.width()), f64::from(image.height()));
        if dest.width() == 0.0 || dest.height() == 0.0 {
            return;
        }
        let fit = Affine::translate(Vec2::new(dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);
        let full = transform * fit;
        if full.determinant().abs() < 1e-12 {
            return;
        }

        let ctx = self.context();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(full));
        ctx.set_paint(image.paint());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    }

    fn present(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            ctx.flush();
            ctx.render_to_pixmap(&mut self.pixmap);
        }
    }

    fn read_rgba8(&self) -> Option<Vec<u8>> {
        Some(self.to_rgba8())
    }
}

/// One call observed by a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Clear,
    Image {
        width: u32,
        height: u32,
        transform: Affine,
        dest: Rect,
    },
    Present,
}

/// Headless surface that records draw calls instead of rasterising them.
#[derive(Debug)]
pub struct RecordingSurface {
    size: SurfaceSize,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn presented(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Present))
            .count()
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) -> PlayerResult<()> {
        self.size = size;
        Ok(())
    }

    fn clear(&mut self) {
        self.ops.push(SurfaceOp::Clear);
    }

    fn draw_image(&mut self, image: &DecodedImage, transform: Affine, dest: Rect) {
        self.ops.push(SurfaceOp::Image {
            width: image.width(),
            height: image.height(),
            transform,
            dest,
        });
    }

    fn present(&mut self) {
        self.ops.push(SurfaceOp::Present);
    }
}

/// Encode straight RGBA8 pixels of `size` as a PNG file, creating parent directories.
pub fn write_png(path: &Path, size: SurfaceSize, rgba: &[u8]) -> PlayerResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        rgba,
        size.width,
        size.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

fn surface_dims_u16(size: SurfaceSize) -> PlayerResult<(u16, u16)> {
    let w: u16 = size
        .width
        .try_into()
        .map_err(|_| PlayerError::surface("surface width exceeds u16"))?;
    let h: u16 = size
        .height
        .try_into()
        .map_err(|_| PlayerError::surface("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(PlayerError::surface("surface size must be non-zero"));
    }
    Ok((w, h))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}
