use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PlayerError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(PlayerError::config("x").to_string().contains("config error:"));
    assert!(
        PlayerError::surface("x")
            .to_string()
            .contains("surface error:")
    );
    let load = PlayerError::from(LoadError::NotFound {
        path: "/frame_webp/frame_0001.webp".to_string(),
    });
    assert!(load.to_string().starts_with("load error:"));
    assert!(load.to_string().contains("frame_0001.webp"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PlayerError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn io_load_error_keeps_source_chain() {
    let err = LoadError::Io {
        path: PathBuf::from("/tmp/frames/frame_0002.webp"),
        source: std::io::Error::other("disk gone"),
    };
    assert!(err.to_string().contains("frame_0002.webp"));
    let source = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("disk gone"));
}
