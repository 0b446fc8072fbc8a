use std::io::Cursor;

use super::*;
use crate::assets::fetch::MemoryFetcher;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn loader_with(fetcher: Arc<MemoryFetcher>) -> FrameLoader {
    FrameLoader::from_config(fetcher, &PlayerConfig::default())
}

#[tokio::test]
async fn load_frame_resolves_padded_path() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert("/frame_webp/frame_0007.webp", png_bytes(3, 2, [255, 0, 0, 255]));
    let loader = loader_with(Arc::clone(&fetcher));

    let img = loader.load_frame(FrameIndex(7)).await.unwrap();
    assert_eq!((img.width(), img.height()), (3, 2));
    assert_eq!(fetcher.calls_for("/frame_webp/frame_0007.webp"), 1);
}

#[tokio::test]
async fn load_overlay_uses_rooted_overlay_path() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert("/xiong.webp", png_bytes(4, 4, [0, 255, 0, 255]));
    let loader = loader_with(Arc::clone(&fetcher));

    assert_eq!(loader.overlay_path(), "/xiong.webp");
    let img = loader.load_overlay().await.unwrap();
    assert_eq!(img.width(), 4);
}

#[tokio::test]
async fn undecodable_bytes_are_decode_errors() {
    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert("/frame_webp/frame_0001.webp", b"garbage".to_vec());
    let loader = loader_with(fetcher);

    let err = loader.load_frame(FrameIndex(1)).await.unwrap_err();
    let LoadError::Decode { path, .. } = err else {
        panic!("expected decode error, got {err:?}");
    };
    assert_eq!(path, "/frame_webp/frame_0001.webp");
}

#[tokio::test]
async fn missing_frame_is_not_found() {
    let loader = loader_with(Arc::new(MemoryFetcher::new()));
    let err = loader.load_frame(FrameIndex(2)).await.unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
}
