use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::assets::loader::FrameLoader;
use crate::foundation::core::FrameIndex;
use crate::playback::cache::{SharedCache, lock};

/// Indices of the prefetch window of `window` frames starting at `start`, clipped to
/// `1..=total`. The window never wraps past the last frame.
pub fn window_indices(start: u32, window: u32, total: u32) -> Vec<FrameIndex> {
    let first = start.max(1);
    if window == 0 || first > total {
        return Vec::new();
    }
    let last = first.saturating_add(window - 1).min(total);
    (first..=last).map(FrameIndex).collect()
}

/// Outcome of one prefetch batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Frames decoded and inserted into the cache.
    pub loaded: Vec<FrameIndex>,
    /// Frames whose load failed; they stay absent.
    pub failed: Vec<FrameIndex>,
}

/// Frame load counters, kept across sessions.
#[derive(Debug, Default)]
pub struct LoadCounters {
    ok: AtomicU64,
    failed: AtomicU64,
}

impl LoadCounters {
    pub fn ok(&self) -> u64 {
        self.ok.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub(crate) fn record(&self, ok: bool) {
        let counter = if ok { &self.ok } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Frames of the batch in flight; empty while no batch runs.
type LoadingSet = watch::Sender<BTreeSet<FrameIndex>>;

/// Claims the batch slot for `frames` and empties it again when the batch ends, however it ends.
struct InFlightGuard(Arc<LoadingSet>);

impl InFlightGuard {
    fn acquire(loading: &Arc<LoadingSet>, frames: &[FrameIndex]) -> Option<Self> {
        let claimed = loading.send_if_modified(|set| {
            if !set.is_empty() {
                return false;
            }
            set.extend(frames.iter().copied());
            true
        });
        claimed.then(|| Self(Arc::clone(loading)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.send_replace(BTreeSet::new());
    }
}

/// Keeps a forward window of frames warm in the cache, one batch at a time.
pub struct Prefetcher {
    loader: FrameLoader,
    window: u32,
    total_frames: u32,
    cache: SharedCache,
    loading: Arc<LoadingSet>,
    counters: Arc<LoadCounters>,
    runtime: Handle,
}

impl Prefetcher {
    pub fn new(
        loader: FrameLoader,
        window: u32,
        total_frames: u32,
        cache: SharedCache,
        counters: Arc<LoadCounters>,
        runtime: Handle,
    ) -> Self {
        Self {
            loader,
            window,
            total_frames,
            cache,
            loading: Arc::new(watch::Sender::new(BTreeSet::new())),
            counters,
            runtime,
        }
    }

    /// Whether a batch is currently loading.
    pub fn in_flight(&self) -> bool {
        !self.loading.borrow().is_empty()
    }

    /// Whether the batch in flight covers `index`.
    pub fn is_loading(&self, index: FrameIndex) -> bool {
        self.loading.borrow().contains(&index)
    }

    /// Resolves once no batch in flight covers `index`. The frame is cached afterwards unless
    /// its load failed.
    pub fn loaded(&self, index: FrameIndex) -> impl Future<Output = ()> + Send + 'static {
        let mut loading = self.loading.subscribe();
        async move {
            loop {
                let covered = loading.borrow_and_update().contains(&index);
                if !covered || loading.changed().await.is_err() {
                    return;
                }
            }
        }
    }

    /// Start loading the uncached frames of the window beginning at `start`.
    ///
    /// Returns `None` without issuing any load when every frame is already cached or another
    /// batch is still in flight. Otherwise the batch runs as a detached task: every load
    /// succeeds or fails on its own, successes land in the cache and failures are logged and
    /// left absent for a later window to retry.
    pub fn request_window(&self, start: u32) -> Option<JoinHandle<BatchReport>> {
        let missing: Vec<FrameIndex> = {
            let cache = lock(&self.cache);
            window_indices(start, self.window, self.total_frames)
                .into_iter()
                .filter(|&i| !cache.has(i))
                .collect()
        };
        if missing.is_empty() {
            return None;
        }
        let Some(guard) = InFlightGuard::acquire(&self.loading, &missing) else {
            tracing::trace!(start, "prefetch batch in flight, skipping window");
            return None;
        };

        tracing::debug!(
            first = missing[0].get(),
            count = missing.len(),
            "prefetch batch started"
        );
        let loader = self.loader.clone();
        let cache = Arc::clone(&self.cache);
        let counters = Arc::clone(&self.counters);
        Some(self.runtime.spawn(async move {
            let _guard = guard;
            let loads = missing.into_iter().map(|index| {
                let loader = loader.clone();
                async move { (index, loader.load_frame(index).await) }
            });

            let mut report = BatchReport::default();
            for (index, result) in futures::future::join_all(loads).await {
                match result {
                    Ok(image) => {
                        lock(&cache).put(index, image);
                        counters.record(true);
                        report.loaded.push(index);
                    }
                    Err(err) => {
                        tracing::warn!(frame = index.get(), error = %err, "frame load failed");
                        counters.record(false);
                        report.failed.push(index);
                    }
                }
            }
            tracing::debug!(
                loaded = report.loaded.len(),
                failed = report.failed.len(),
                "prefetch batch finished"
            );
            report
        }))
    }
}

impl std::fmt::Debug for Prefetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prefetcher")
            .field("window", &self.window)
            .field("total_frames", &self.total_frames)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/prefetch.rs"]
mod tests;
