use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width(), 1);
    assert_eq!(decoded.height(), 1);
    assert_eq!(
        decoded.rgba8_premul(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_rejects_garbage() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(format!("{err:#}").contains("decode image"));
}

#[test]
fn clones_share_pixels() {
    let a = DecodedImage::solid(2, 2, [10, 20, 30, 255]).unwrap();
    let b = a.clone();
    let c = DecodedImage::solid(2, 2, [10, 20, 30, 255]).unwrap();
    assert!(a.same_as(&b));
    assert!(!a.same_as(&c));
}

#[test]
fn from_premul_validates_length() {
    assert!(DecodedImage::from_premul_rgba8(2, 2, &[0u8; 15]).is_err());
    assert!(DecodedImage::from_premul_rgba8(0, 2, &[]).is_err());
}

#[test]
fn unpremultiply_inverts_opaque_and_half_alpha() {
    let mut px = [100u8, 50, 200, 255, 100, 50, 200, 128];
    premultiply_rgba8_in_place(&mut px);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[100, 50, 200, 255]);
    for (got, want) in px[4..7].iter().zip([100u8, 50, 200]) {
        assert!(got.abs_diff(want) <= 1);
    }
}
