use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::core::SurfaceSize;
use crate::foundation::error::{PlayerError, PlayerResult};
use crate::overlay::animator::SkewMode;

pub const ENV_PRELOAD_WINDOW: &str = "FLIPREEL_PRELOAD_WINDOW";
pub const ENV_TARGET_FPS: &str = "FLIPREEL_TARGET_FPS";
/// Environment variable overriding [`PlayerConfig::miss_policy`] (`skip` / `load_then_draw`).
pub const ENV_MISS_POLICY: &str = "FLIPREEL_MISS_POLICY";

/// What a tick does when the playhead frame is not cached yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissPolicy {
    /// Leave the surface untouched for this tick; the loop never waits on a load.
    #[default]
    Skip,
    /// Load the frame inside the tick, cache it, then draw it.
    LoadThenDraw,
}

impl MissPolicy {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Some(Self::Skip),
            "load_then_draw" | "load-then-draw" => Some(Self::LoadThenDraw),
            _ => None,
        }
    }
}

/// Player configuration.
///
/// Defaults describe the observed 150-frame, 1080x1080 WebP sequence.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Number of frames in the sequence (frames are `1..=total_frames`).
    pub total_frames: u32,
    /// Number of frames the prefetcher keeps warm ahead of the playhead.
    pub preload_window: u32,
    /// Target playback rate. Below `refresh_hz` the loop delays each tick past its slot.
    pub target_fps: u32,
    pub refresh_hz: u32,
    pub frame_dir: String,
    pub frame_ext: String,
    /// Zero-padding width of the frame number in file names.
    pub frame_pad: usize,
    pub overlay_path: String,
    pub base_width: u32,
    pub base_height: u32,
    pub miss_policy: MissPolicy,
    pub skew: SkewMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            total_frames: 150,
            preload_window: 5,
            target_fps: 30,
            refresh_hz: 60,
            frame_dir: "frame_webp".to_string(),
            frame_ext: "webp".to_string(),
            frame_pad: 4,
            overlay_path: "xiong.webp".to_string(),
            base_width: 1080,
            base_height: 1080,
            miss_policy: MissPolicy::Skip,
            skew: SkewMode::default(),
        }
    }
}

/// Loop timing derived from [`PlayerConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub slot: Duration,
    /// Delay between the slot and the tick, present only when throttling below the native
    /// rate. Slot plus throttle is one `1s / target_fps` period.
    pub throttle: Option<Duration>,
}

impl PlayerConfig {
    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> PlayerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> PlayerResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| PlayerError::config(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> PlayerResult<()> {
        if self.total_frames < 2 {
            return Err(PlayerError::config("total_frames must be >= 2"));
        }
        if self.preload_window == 0 {
            return Err(PlayerError::config("preload_window must be >= 1"));
        }
        if self.target_fps == 0 || self.refresh_hz == 0 {
            return Err(PlayerError::config("target_fps and refresh_hz must be > 0"));
        }
        if self.frame_dir.trim().is_empty() || self.frame_ext.trim().is_empty() {
            return Err(PlayerError::config("frame_dir and frame_ext must be non-empty"));
        }
        if self.overlay_path.trim().is_empty() {
            return Err(PlayerError::config("overlay_path must be non-empty"));
        }
        if self.base_width == 0 || self.base_height == 0 {
            return Err(PlayerError::config("base size must be non-zero"));
        }
        self.skew.validate()
    }

    /// Apply `FLIPREEL_*` environment overrides. Unparseable or zero values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(n) = lookup(ENV_PRELOAD_WINDOW)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            self.preload_window = n;
        }
        if let Some(n) = lookup(ENV_TARGET_FPS)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            self.target_fps = n;
        }
        if let Some(p) = lookup(ENV_MISS_POLICY).and_then(|v| MissPolicy::parse(&v)) {
            self.miss_policy = p;
        }
    }

    pub fn base_size(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.base_width.max(1),
            height: self.base_height.max(1),
        }
    }

    pub fn pacing(&self) -> Pacing {
        let refresh = self.refresh_hz.max(1);
        let target = self.target_fps.max(1);
        let slot = Duration::from_secs(1) / refresh;
        let throttle = (target < refresh).then(|| (Duration::from_secs(1) / target) - slot);
        Pacing { slot, throttle }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
