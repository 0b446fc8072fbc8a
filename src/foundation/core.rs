use crate::foundation::error::{PlayerError, PlayerResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// 1-based index of one frame in the sequence.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u32);

impl FrameIndex {
    /// First frame of every sequence.
    pub const FIRST: FrameIndex = FrameIndex(1);

    /// Validate `index` against a sequence of `total` frames.
    pub fn new(index: u32, total: u32) -> PlayerResult<Self> {
        if index == 0 || index > total {
            return Err(PlayerError::validation(format!(
                "frame index {index} outside [1, {total}]"
            )));
        }
        Ok(Self(index))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Normalised position of this frame in a sequence of `total` frames, in `[0, 1]`.
    pub fn progress(self, total: u32) -> f64 {
        if total < 2 {
            return 0.0;
        }
        let p = f64::from(self.0.saturating_sub(1)) / f64::from(total - 1);
        p.clamp(0.0, 1.0)
    }
}

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Pixel-buffer dimensions of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> PlayerResult<Self> {
        if width == 0 || height == 0 {
            return Err(PlayerError::validation("surface size must be non-zero"));
        }
        Ok(Self { width, height })
    }

    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }

    /// Full-surface rectangle in surface pixel coordinates.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width_f64(), self.height_f64())
    }
}

/// Fit a `base` sized sequence inside a container box, preserving the native aspect ratio.
///
/// A degenerate container (zero, negative or non-finite scale) falls back to the native size.
pub fn fit_surface(
    container_width: f64,
    container_height: f64,
    base: SurfaceSize,
) -> SurfaceSize {
    let mut scale = (container_width / base.width_f64()).min(container_height / base.height_f64());
    if !scale.is_finite() || scale <= 0.0 {
        scale = 1.0;
    }
    let width = (base.width_f64() * scale).round().max(1.0) as u32;
    let height = (base.height_f64() * scale).round().max(1.0) as u32;
    SurfaceSize { width, height }
}
