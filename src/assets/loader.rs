use std::sync::Arc;

use crate::assets::decode::{DecodedImage, decode_image};
use crate::assets::fetch::AssetFetcher;
use crate::assets::path::FrameScheme;
use crate::foundation::config::PlayerConfig;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::LoadError;

/// Resolves frame indices to static assets and decodes them.
///
/// Cloning is cheap; clones share the underlying fetcher. The loader keeps no mutable state of its
/// own, so concurrent loads of distinct frames are independent.
#[derive(Clone)]
pub struct FrameLoader {
    fetcher: Arc<dyn AssetFetcher>,
    scheme: FrameScheme,
    overlay_path: String,
}

impl FrameLoader {
    pub fn new(
        fetcher: Arc<dyn AssetFetcher>,
        scheme: FrameScheme,
        overlay_path: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            scheme,
            overlay_path: overlay_path.into(),
        }
    }

    /// Loader using the naming scheme and overlay path from `config`.
    pub fn from_config(fetcher: Arc<dyn AssetFetcher>, config: &PlayerConfig) -> Self {
        Self::new(
            fetcher,
            FrameScheme::new(&config.frame_dir, &config.frame_ext, config.frame_pad),
            format!("/{}", config.overlay_path.trim_start_matches('/')),
        )
    }

    pub fn overlay_path(&self) -> &str {
        &self.overlay_path
    }

    #[tracing::instrument(level = "trace", skip(self), fields(frame = index.get()))]
    pub async fn load_frame(&self, index: FrameIndex) -> Result<DecodedImage, LoadError> {
        let path = self.scheme.frame_path(index);
        self.load_path(&path).await
    }

    pub async fn load_overlay(&self) -> Result<DecodedImage, LoadError> {
        self.load_path(&self.overlay_path).await
    }

    async fn load_path(&self, path: &str) -> Result<DecodedImage, LoadError> {
        let bytes = self.fetcher.fetch(path).await?;
        decode_image(&bytes).map_err(|e| LoadError::Decode {
            path: path.to_string(),
            reason: format!("{e:#}"),
        })
    }
}

impl std::fmt::Debug for FrameLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameLoader")
            .field("scheme", &self.scheme)
            .field("overlay_path", &self.overlay_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
