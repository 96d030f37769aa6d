use std::io::Cursor;

use super::*;

fn png_bytes(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap();

    let bitmap = decode_image(&png_bytes(img)).unwrap();
    assert_eq!(bitmap.width, 1);
    assert_eq!(bitmap.height, 1);
    assert_eq!(
        bitmap.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_keeps_opaque_pixels_unchanged() {
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 255]));
    let bitmap = decode_image(&png_bytes(img)).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (3, 2));
    assert!(
        bitmap
            .rgba8_premul
            .chunks_exact(4)
            .all(|px| px == [9, 8, 7, 255])
    );
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"definitely not an image").is_err());
    assert!(decode_image(&[]).is_err());
}

#[test]
fn from_rgba8_checks_length() {
    assert!(Bitmap::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(Bitmap::from_rgba8(0, 2, vec![]).is_err());
    let b = Bitmap::from_rgba8(1, 1, vec![255, 255, 255, 0]).unwrap();
    assert_eq!(b.rgba8_premul.as_slice(), &[0, 0, 0, 0]);
}
