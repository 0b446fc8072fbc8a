use super::*;

#[test]
fn defaults_match_observed_sequence() {
    let cfg = PlayerConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.total_frames, 150);
    assert_eq!(cfg.preload_window, 5);
    assert_eq!(cfg.frame_pad, 4);
    assert_eq!(cfg.miss_policy, MissPolicy::Skip);
    assert_eq!(cfg.base_size(), SurfaceSize::new(1080, 1080).unwrap());
}

#[test]
fn partial_json_fills_defaults() {
    let cfg = PlayerConfig::from_json_str(
        r#"{ "preload_window": 30, "target_fps": 60, "miss_policy": "load_then_draw" }"#,
    )
    .unwrap();
    assert_eq!(cfg.preload_window, 30);
    assert_eq!(cfg.target_fps, 60);
    assert_eq!(cfg.miss_policy, MissPolicy::LoadThenDraw);
    assert_eq!(cfg.total_frames, 150);
}

#[test]
fn skew_mode_parses_from_json() {
    let cfg = PlayerConfig::from_json_str(r#"{ "skew": { "mode": "shear_flip" } }"#).unwrap();
    assert_eq!(cfg.skew, SkewMode::ShearFlip);

    let cfg =
        PlayerConfig::from_json_str(r#"{ "skew": { "mode": "foreshorten", "min_scale": 0.1 } }"#)
            .unwrap();
    assert_eq!(cfg.skew, SkewMode::Foreshorten { min_scale: 0.1 });
}

#[test]
fn invalid_documents_are_config_errors() {
    let err = PlayerConfig::from_json_str(r#"{ "total_frames": 1 }"#).unwrap_err();
    assert!(matches!(err, PlayerError::Config(_)));

    let err = PlayerConfig::from_json_str(r#"{ "preload_window": 0 }"#).unwrap_err();
    assert!(matches!(err, PlayerError::Config(_)));

    let err = PlayerConfig::from_json_str(r#"{ "bogus": true }"#).unwrap_err();
    assert!(matches!(err, PlayerError::Config(_)));

    let err = PlayerConfig::from_json_str("not json").unwrap_err();
    assert!(err.to_string().contains("config error:"));
}

#[test]
fn env_overrides_ignore_garbage() {
    let mut cfg = PlayerConfig::default();
    cfg.apply_overrides_from(|key| match key {
        ENV_PRELOAD_WINDOW => Some("30".to_string()),
        ENV_TARGET_FPS => Some("0".to_string()),
        ENV_MISS_POLICY => Some("Load-Then-Draw".to_string()),
        _ => None,
    });
    assert_eq!(cfg.preload_window, 30);
    assert_eq!(cfg.target_fps, 30);
    assert_eq!(cfg.miss_policy, MissPolicy::LoadThenDraw);

    cfg.apply_overrides_from(|key| (key == ENV_PRELOAD_WINDOW).then(|| "lots".to_string()));
    assert_eq!(cfg.preload_window, 30);
}

#[test]
fn pacing_throttles_only_below_native_rate() {
    let cfg = PlayerConfig::default();
    let pacing = cfg.pacing();
    assert_eq!(pacing.slot, Duration::from_secs(1) / 60);
    assert_eq!(
        pacing.slot + pacing.throttle.unwrap(),
        Duration::from_secs(1) / 30
    );

    let cfg = PlayerConfig {
        refresh_hz: 20,
        target_fps: 10,
        ..PlayerConfig::default()
    };
    assert_eq!(cfg.pacing().slot, Duration::from_millis(50));
    assert_eq!(cfg.pacing().throttle, Some(Duration::from_millis(50)));

    let cfg = PlayerConfig {
        target_fps: 60,
        ..PlayerConfig::default()
    };
    assert_eq!(cfg.pacing().throttle, None);
}

#[test]
fn from_json_file_reports_missing_file() {
    let missing = std::env::temp_dir().join("flipreel_definitely_missing_config.json");
    let err = PlayerConfig::from_json_file(&missing).unwrap_err();
    assert!(err.to_string().contains("read config"));
}
