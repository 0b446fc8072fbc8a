use std::f64::consts::PI;

use crate::foundation::core::{Affine, FrameIndex, Rect, SurfaceSize, Vec2};
use crate::foundation::error::{PlayerError, PlayerResult};
use crate::overlay::geometry::OverlayGeometry;

/// Horizontal start of the trajectory, as a fraction of surface width (off-canvas left).
pub const START_X_FRACTION: f64 = -0.3;
/// Horizontal end of the trajectory, as a fraction of surface width (off-canvas right).
pub const END_X_FRACTION: f64 = 1.1;
/// Unscaled sprite footprint, as a fraction of surface width and height.
pub const FOOTPRINT_FRACTION: f64 = 0.25;

const DEFAULT_MIN_SCALE: f64 = 0.05;

fn default_min_scale() -> f64 {
    DEFAULT_MIN_SCALE
}

/// How the half-turn rotation is turned into a horizontal 2-D transform.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SkewMode {
    /// Horizontal scale by `|cos|` clamped to `min_scale`, mirrored past the quarter turn.
    Foreshorten {
        #[serde(default = "default_min_scale")]
        min_scale: f64,
    },
    /// Horizontal scale by the raw `cos`: mirrors past the quarter turn and collapses at it.
    ShearFlip,
}

impl Default for SkewMode {
    fn default() -> Self {
        Self::Foreshorten {
            min_scale: DEFAULT_MIN_SCALE,
        }
    }
}

impl SkewMode {
    pub fn validate(self) -> PlayerResult<()> {
        match self {
            Self::Foreshorten { min_scale } if !(min_scale > 0.0 && min_scale <= 1.0) => Err(
                PlayerError::config("skew min_scale must be in (0, 1]"),
            ),
            _ => Ok(()),
        }
    }

    /// Horizontal scale factor applied to the sprite for `rotation` radians.
    pub fn horizontal_factor(self, rotation: f64) -> f64 {
        let c = rotation.cos();
        match self {
            Self::Foreshorten { min_scale } => {
                let sign = if c >= 0.0 { 1.0 } else { -1.0 };
                c.abs().max(min_scale) * sign
            }
            Self::ShearFlip => c,
        }
    }
}

/// Per-frame placement of the overlay sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayTransform {
    pub x: f64,
    pub y: f64,
    /// Size multiplier in `[0.5, 1]`.
    pub scale: f64,
    /// Rotation about the vertical axis, `0..=PI` over the sequence.
    pub rotation: f64,
    /// Footprint width in surface pixels (scale applied).
    pub width: f64,
    pub height: f64,
}

impl OverlayTransform {
    /// Axis-aligned footprint used for hit testing.
    pub fn geometry(&self) -> OverlayGeometry {
        OverlayGeometry::centered(self.x, self.y, self.width, self.height)
    }

    /// Sprite rectangle in local coordinates, centred on the origin.
    pub fn local_rect(&self) -> Rect {
        Rect::new(
            -self.width / 2.0,
            -self.height / 2.0,
            self.width / 2.0,
            self.height / 2.0,
        )
    }

    /// Local-to-surface transform: translate to the centre, then apply the horizontal skew.
    pub fn to_affine(&self, skew: SkewMode) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y))
            * Affine::scale_non_uniform(skew.horizontal_factor(self.rotation), 1.0)
    }
}

/// Overlay transform for `frame` of a `total_frames` sequence drawn on `surface`.
///
/// Pure: identical inputs always produce identical outputs.
pub fn compute_transform(
    frame: FrameIndex,
    total_frames: u32,
    surface: SurfaceSize,
) -> OverlayTransform {
    transform_at_progress(frame.progress(total_frames), surface)
}

/// Overlay transform at normalised progress `p` (clamped to `[0, 1]`).
pub fn transform_at_progress(p: f64, surface: SurfaceSize) -> OverlayTransform {
    let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    let sw = surface.width_f64();
    let sh = surface.height_f64();

    let start_x = START_X_FRACTION * sw;
    let end_x = END_X_FRACTION * sw;
    let x = start_x + (end_x - start_x) * p;
    let y = sh / 2.0;

    let rotation = PI * p;
    let scale = 0.5 + 0.5 * rotation.cos().abs();

    OverlayTransform {
        x,
        y,
        scale,
        rotation,
        width: sw * FOOTPRINT_FRACTION * scale,
        height: sh * FOOTPRINT_FRACTION * scale,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/animator.rs"]
mod tests;
