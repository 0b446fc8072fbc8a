use std::io::Cursor;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::*;
use crate::assets::fetch::{AssetFetcher, MemoryFetcher};
use crate::foundation::config::PlayerConfig;
use crate::foundation::error::LoadError;
use crate::playback::cache::FrameCache;

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn frame_path(i: u32) -> String {
    format!("/frame_webp/frame_{i:04}.webp")
}

fn memory_with_frames(total: u32) -> Arc<MemoryFetcher> {
    let fetcher = Arc::new(MemoryFetcher::new());
    let png = png_bytes();
    for i in 1..=total {
        fetcher.insert(frame_path(i), png.clone());
    }
    fetcher
}

/// Holds every fetch until a permit is released.
struct GatedFetcher {
    inner: Arc<MemoryFetcher>,
    gate: Semaphore,
}

#[async_trait]
impl AssetFetcher for GatedFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        let _permit = self.gate.acquire().await.unwrap();
        self.inner.fetch(path).await
    }
}

fn prefetcher(fetcher: Arc<dyn AssetFetcher>, window: u32, cache: SharedCache) -> Prefetcher {
    let config = PlayerConfig::default();
    Prefetcher::new(
        FrameLoader::from_config(fetcher, &config),
        window,
        config.total_frames,
        cache,
        Arc::new(LoadCounters::default()),
        Handle::current(),
    )
}

#[test]
fn window_is_clipped_to_sequence() {
    let ids = |v: Vec<FrameIndex>| v.into_iter().map(FrameIndex::get).collect::<Vec<_>>();
    assert_eq!(ids(window_indices(1, 5, 150)), vec![1, 2, 3, 4, 5]);
    assert_eq!(ids(window_indices(0, 3, 150)), vec![1, 2, 3]);
    assert_eq!(ids(window_indices(148, 5, 150)), vec![148, 149, 150]);
    assert!(window_indices(151, 5, 150).is_empty());
    assert!(window_indices(1, 0, 150).is_empty());
    assert_eq!(ids(window_indices(u32::MAX - 1, 5, u32::MAX)), vec![u32::MAX - 1, u32::MAX]);
}

#[tokio::test]
async fn first_window_loads_exactly_frames_one_to_five() {
    let fetcher = memory_with_frames(150);
    let cache = FrameCache::shared();
    let p = prefetcher(fetcher.clone(), 5, Arc::clone(&cache));

    let report = p.request_window(1).unwrap().await.unwrap();
    assert_eq!(report.loaded.len(), 5);
    assert!(report.failed.is_empty());

    let cache = lock(&cache);
    for k in 1..=5 {
        assert!(cache.has(FrameIndex(k)), "frame {k} missing");
    }
    assert!(!cache.has(FrameIndex(6)));
    assert!(!cache.has(FrameIndex(0)));
    assert_eq!(fetcher.total_calls(), 5);
    assert_eq!(fetcher.calls_for(&frame_path(0)), 0);
}

#[tokio::test]
async fn no_second_batch_while_one_is_in_flight() {
    let inner = memory_with_frames(150);
    let gated = Arc::new(GatedFetcher {
        inner: Arc::clone(&inner),
        gate: Semaphore::new(0),
    });
    let cache = FrameCache::shared();
    let p = prefetcher(gated.clone(), 5, Arc::clone(&cache));

    let batch = p.request_window(1).unwrap();
    assert!(p.in_flight());
    assert!(p.request_window(1).is_none());
    assert!(p.request_window(3).is_none());

    gated.gate.add_permits(100);
    let report = batch.await.unwrap();
    assert_eq!(report.loaded.len(), 5);
    assert!(!p.in_flight());
    for k in 1..=5 {
        assert_eq!(inner.calls_for(&frame_path(k)), 1);
    }

    // Only the uncached tail of the overlapping window is requested.
    let report = p.request_window(3).unwrap().await.unwrap();
    assert_eq!(report.loaded, vec![FrameIndex(6), FrameIndex(7)]);
    assert_eq!(inner.total_calls(), 7);
}

#[tokio::test]
async fn fully_cached_window_issues_nothing() {
    let fetcher = memory_with_frames(150);
    let cache = FrameCache::shared();
    let p = prefetcher(fetcher.clone(), 2, Arc::clone(&cache));

    p.request_window(1).unwrap().await.unwrap();
    assert!(p.request_window(1).is_none());
    assert!(!p.in_flight());
    assert_eq!(fetcher.total_calls(), 2);
}

#[tokio::test]
async fn partial_failure_keeps_successful_loads() {
    let fetcher = memory_with_frames(150);
    fetcher.fail(frame_path(3));
    let cache = FrameCache::shared();
    let counters = Arc::new(LoadCounters::default());
    let p = Prefetcher::new(
        FrameLoader::from_config(fetcher.clone(), &PlayerConfig::default()),
        5,
        150,
        Arc::clone(&cache),
        Arc::clone(&counters),
        Handle::current(),
    );

    let report = p.request_window(1).unwrap().await.unwrap();
    assert_eq!(report.failed, vec![FrameIndex(3)]);
    assert_eq!(report.loaded.len(), 4);
    assert_eq!((counters.ok(), counters.failed()), (4, 1));
    assert!(!p.in_flight());
    {
        let cache = lock(&cache);
        assert!(!cache.has(FrameIndex(3)));
        assert!(cache.has(FrameIndex(4)));
    }

    // A later window that covers the failed frame retries it.
    fetcher.heal(&frame_path(3));
    let report = p.request_window(2).unwrap().await.unwrap();
    assert_eq!(report.loaded, vec![FrameIndex(3), FrameIndex(6)]);
    assert!(lock(&cache).has(FrameIndex(3)));
}

#[tokio::test]
async fn guard_is_released_when_batch_is_aborted() {
    let gated = Arc::new(GatedFetcher {
        inner: memory_with_frames(150),
        gate: Semaphore::new(0),
    });
    let p = prefetcher(gated, 5, FrameCache::shared());

    let batch = p.request_window(1).unwrap();
    tokio::task::yield_now().await;
    assert!(p.in_flight());

    batch.abort();
    assert!(batch.await.unwrap_err().is_cancelled());
    assert!(!p.in_flight());
}

#[tokio::test]
async fn loaded_resolves_when_the_covering_batch_ends() {
    let gated = Arc::new(GatedFetcher {
        inner: memory_with_frames(150),
        gate: Semaphore::new(0),
    });
    let cache = FrameCache::shared();
    let p = prefetcher(gated.clone(), 5, Arc::clone(&cache));

    let batch = p.request_window(1).unwrap();
    assert!(p.is_loading(FrameIndex(3)));
    assert!(!p.is_loading(FrameIndex(6)));
    p.loaded(FrameIndex(6)).await;

    let wait = tokio::spawn(p.loaded(FrameIndex(3)));
    tokio::task::yield_now().await;
    assert!(!wait.is_finished());

    gated.gate.add_permits(100);
    wait.await.unwrap();
    assert!(lock(&cache).has(FrameIndex(3)));
    assert!(!p.is_loading(FrameIndex(3)));
    batch.await.unwrap();
}
