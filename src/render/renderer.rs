use crate::assets::decode::DecodedImage;
use crate::foundation::config::PlayerConfig;
use crate::foundation::core::{Affine, FrameIndex, SurfaceSize};
use crate::overlay::animator::{OverlayTransform, SkewMode, compute_transform};
use crate::overlay::geometry::OverlayGeometry;
use crate::playback::cache::FrameCache;
use crate::render::surface::DrawSurface;

/// Result of one [`Renderer::draw_frame`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawOutcome {
    /// No surface is attached; nothing happened.
    NoSurface,
    /// The frame is not cached; the surface and overlay geometry were left untouched.
    Skipped,
    /// The frame was painted. `overlay` is the recorded hit box, if the sprite was painted too.
    Drawn { overlay: Option<OverlayGeometry> },
}

/// Paints a background frame plus the overlay sprite.
#[derive(Clone, Copy, Debug)]
pub struct Renderer {
    total_frames: u32,
    skew: SkewMode,
}

impl Renderer {
    pub fn new(total_frames: u32, skew: SkewMode) -> Self {
        Self { total_frames, skew }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(config.total_frames, config.skew)
    }

    /// Overlay placement for `frame` on a surface of `size`.
    pub fn overlay_transform(&self, frame: FrameIndex, size: SurfaceSize) -> OverlayTransform {
        compute_transform(frame, self.total_frames, size)
    }

    /// Draw `frame` from `cache` onto `surface`.
    ///
    /// A cache miss is a no-op. Otherwise the surface is cleared, the frame is stretched over the
    /// whole buffer and, when `overlay` is loaded, the sprite is painted on top. `geometry` receives
    /// the sprite's hit box, or `None` when the sprite was not painted.
    pub fn draw_frame<S>(
        &self,
        frame: FrameIndex,
        cache: &FrameCache,
        overlay: Option<&DecodedImage>,
        surface: Option<&mut S>,
        geometry: &mut Option<OverlayGeometry>,
    ) -> DrawOutcome
    where
        S: DrawSurface + ?Sized,
    {
        let Some(surface) = surface else {
            return DrawOutcome::NoSurface;
        };
        let Some(background) = cache.get(frame) else {
            tracing::trace!(frame = frame.get(), "frame not cached, skipping");
            return DrawOutcome::Skipped;
        };

        let size = surface.size();
        surface.clear();
        surface.draw_image(background, Affine::IDENTITY, size.rect());

        *geometry = overlay.map(|sprite| {
            let t = self.overlay_transform(frame, size);
            surface.draw_image(sprite, t.to_affine(self.skew), t.local_rect());
            t.geometry()
        });
        surface.present();

        DrawOutcome::Drawn {
            overlay: *geometry,
        }
    }
}
