use std::path::PathBuf;

pub type PlayerResult<T> = Result<T, PlayerError>;

#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("surface error: {0}")]
    Surface(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlayerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }
}

/// Failure to fetch or decode a single static asset.
///
/// Load errors are recovered where they happen: the affected cache slot (or the overlay) simply
/// stays empty and the loop keeps going.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("asset '{path}' not found")]
    NotFound { path: String },

    #[error("failed to read asset '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode asset '{path}': {reason}")]
    Decode { path: String, reason: String },

    #[error("invalid asset path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
