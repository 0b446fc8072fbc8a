use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn square(px: u32) -> SurfaceSize {
    SurfaceSize::new(px, px).unwrap()
}

#[test]
fn transform_is_deterministic_for_every_frame() {
    let surface = SurfaceSize::new(1080, 720).unwrap();
    for i in 1..=150 {
        let a = compute_transform(FrameIndex(i), 150, surface);
        let b = compute_transform(FrameIndex(i), 150, surface);
        assert_eq!(a, b);
    }
}

#[test]
fn trajectory_endpoints_enter_left_and_exit_right() {
    let surface = square(1080);

    let first = compute_transform(FrameIndex(1), 150, surface);
    assert!(close(first.x, -324.0));
    assert!(close(first.y, 540.0));
    assert_eq!(first.rotation, 0.0);
    assert_eq!(first.scale, 1.0);

    let last = compute_transform(FrameIndex(150), 150, surface);
    assert!(close(last.x, 1188.0));
    assert_eq!(last.rotation, PI);
    assert_eq!(last.scale, 1.0);
}

#[test]
fn scale_bottoms_out_at_quarter_turn() {
    let mid = transform_at_progress(0.5, square(1080));
    assert!(close(mid.rotation, PI / 2.0));
    assert!(close(mid.scale, 0.5));
    assert!(close(mid.width, 1080.0 * 0.25 * 0.5));
}

#[test]
fn quarter_progress_x_position() {
    let t = transform_at_progress(0.25, square(1080));
    // -324 + (1188 - (-324)) * 0.25
    assert!(close(t.x, 54.0));
}

#[test]
fn progress_is_clamped() {
    let surface = square(100);
    assert_eq!(
        transform_at_progress(-2.0, surface),
        transform_at_progress(0.0, surface)
    );
    assert_eq!(
        transform_at_progress(7.0, surface),
        transform_at_progress(1.0, surface)
    );
    assert_eq!(
        transform_at_progress(f64::NAN, surface),
        transform_at_progress(0.0, surface)
    );
}

#[test]
fn footprint_is_quarter_surface_times_scale() {
    let t = compute_transform(FrameIndex(1), 150, SurfaceSize::new(800, 400).unwrap());
    assert!(close(t.width, 200.0));
    assert!(close(t.height, 100.0));

    let g = t.geometry();
    assert!(close(g.x, t.x - 100.0));
    assert!(close(g.y, 200.0 - 50.0));
    assert_eq!(t.local_rect().width(), t.width);
}

#[test]
fn foreshorten_clamps_and_mirrors() {
    let skew = SkewMode::default();
    assert!(close(skew.horizontal_factor(0.0), 1.0));
    assert!(close(skew.horizontal_factor(PI / 2.0), 0.05));
    assert!(close(skew.horizontal_factor(PI), -1.0));
    assert!(skew.horizontal_factor(0.75 * PI) < 0.0);
}

#[test]
fn shear_flip_follows_raw_cosine() {
    let skew = SkewMode::ShearFlip;
    assert!(close(skew.horizontal_factor(PI / 3.0), 0.5));
    assert!(close(skew.horizontal_factor(PI), -1.0));
    assert!(skew.horizontal_factor(PI / 2.0).abs() < 1e-12);
}

#[test]
fn affine_maps_local_origin_to_centre() {
    let t = compute_transform(FrameIndex(40), 150, square(1080));
    let p = t.to_affine(SkewMode::default()) * kurbo::Point::ORIGIN;
    assert!(close(p.x, t.x));
    assert!(close(p.y, t.y));
}

#[test]
fn skew_validation() {
    assert!(SkewMode::Foreshorten { min_scale: 0.0 }.validate().is_err());
    assert!(SkewMode::Foreshorten { min_scale: 1.5 }.validate().is_err());
    assert!(SkewMode::Foreshorten { min_scale: f64::NAN }.validate().is_err());
    assert!(SkewMode::ShearFlip.validate().is_ok());
}
