use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::assets::path::normalize_static_path;
use crate::foundation::error::LoadError;

/// Static asset fetch collaborator.
///
/// Implementations must tolerate concurrent calls for distinct paths; each call is independent.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch the raw bytes behind a static asset path such as `/frame_webp/frame_0001.webp`.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError>;
}

/// Serves static assets from a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem location a static path resolves to.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, LoadError> {
        let rel = normalize_static_path(path)?;
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl AssetFetcher for FsFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        let resolved = self.resolve(path)?;
        match tokio::fs::read(&resolved).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoadError::NotFound {
                path: path.to_string(),
            }),
            Err(source) => Err(LoadError::Io {
                path: resolved,
                source,
            }),
        }
    }
}

/// In-memory asset table, used for embedding and tests.
///
/// Every call is counted per path; paths registered with [`MemoryFetcher::fail`] always fail
/// with an IO error.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    assets: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, u64>>,
    total_calls: AtomicU64,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        lock(&self.assets).insert(path.into(), bytes);
    }

    pub fn fail(&self, path: impl Into<String>) {
        lock(&self.failing).insert(path.into());
    }

    pub fn heal(&self, path: &str) {
        lock(&self.failing).remove(path);
    }

    /// Number of fetches issued for `path`.
    pub fn calls_for(&self, path: &str) -> u64 {
        lock(&self.calls).get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AssetFetcher for MemoryFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        *lock(&self.calls).entry(path.to_string()).or_insert(0) += 1;

        if lock(&self.failing).contains(path) {
            return Err(LoadError::Io {
                path: PathBuf::from(path),
                source: std::io::Error::other("injected fetch failure"),
            });
        }
        lock(&self.assets)
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                path: path.to_string(),
            })
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
