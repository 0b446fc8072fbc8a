use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{PlayerError, PlayerResult};

/// Decoded, immediately drawable raster image.
///
/// Pixels live in a shared `vello_cpu` pixmap (premultiplied RGBA8), so cloning a handle is cheap
/// and never copies pixel data. Images are never mutated after decode.
#[derive(Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixmap: Arc<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl DecodedImage {
    /// Wrap row-major premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: &[u8]) -> PlayerResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| PlayerError::validation("image width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| PlayerError::validation("image height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(PlayerError::validation("image dimensions must be non-zero"));
        }
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(PlayerError::validation("image byte length mismatch"));
        }

        let mut may_have_opacities = false;
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for px in rgba8_premul.chunks_exact(4) {
            let a = px[3];
            may_have_opacities |= a != 255;
            pixels.push(vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a,
            });
        }

        Ok(Self {
            width,
            height,
            pixmap: Arc::new(vello_cpu::Pixmap::from_parts_with_opacity(
                pixels,
                w,
                h,
                may_have_opacities,
            )),
        })
    }

    /// Single-colour image, handy for placeholders and tests.
    pub fn solid(width: u32, height: u32, straight_rgba: [u8; 4]) -> PlayerResult<Self> {
        let mut px = straight_rgba;
        premultiply_rgba8_in_place(&mut px);
        let bytes = px.repeat(width as usize * height as usize);
        Self::from_premul_rgba8(width, height, &bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 pixel bytes.
    pub fn rgba8_premul(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// `true` when both handles share the same decoded pixels.
    pub fn same_as(&self, other: &DecodedImage) -> bool {
        Arc::ptr_eq(&self.pixmap, &other.pixmap)
    }

    pub(crate) fn paint(&self) -> vello_cpu::Image {
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::clone(&self.pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }
}

/// Decode encoded image bytes (PNG, WebP, ...) into a drawable image.
pub fn decode_image(bytes: &[u8]) -> PlayerResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    DecodedImage::from_premul_rgba8(width, height, &rgba8_premul)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
