#![forbid(unsafe_code)]
//! `flipreel` plays a numbered image sequence on a 2-D surface with an animated, clickable
//! overlay sprite.
//!
//! A [`Player`] owns one mounted session at a time. Each tick draws the playhead frame from the
//! [`FrameCache`] (skipping it, or loading it first, when it is missing), asks the [`Prefetcher`]
//! to warm the next window, and advances. Clicking the overlay toggles pause.

pub mod assets;
pub mod foundation;
pub mod overlay;
pub mod playback;
pub mod render;

pub use assets::decode::{DecodedImage, decode_image};
pub use assets::fetch::{AssetFetcher, FsFetcher, MemoryFetcher};
pub use assets::loader::FrameLoader;
pub use assets::path::{FrameScheme, frame_asset_path};
pub use foundation::config::{MissPolicy, Pacing, PlayerConfig};
pub use foundation::core::{FrameIndex, SurfaceSize, fit_surface};
pub use foundation::error::{LoadError, PlayerError, PlayerResult};
pub use overlay::animator::{OverlayTransform, SkewMode, compute_transform};
pub use overlay::geometry::OverlayGeometry;
pub use playback::cache::FrameCache;
pub use playback::interaction::{PointerEvent, hit_test};
pub use playback::player::{PlaybackStats, Player};
pub use playback::prefetch::{BatchReport, Prefetcher, window_indices};
pub use render::renderer::{DrawOutcome, Renderer};
pub use render::surface::{CpuSurface, DrawSurface, RecordingSurface, SurfaceOp};
