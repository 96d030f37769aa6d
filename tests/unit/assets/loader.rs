use std::{io::Cursor, path::PathBuf};

use super::*;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "storysheet-loader-{}-{name}",
        std::process::id()
    ))
}

#[test]
fn inline_bytes_decode() {
    let loader = DefaultLoader::default();
    let bitmap = loader.load(&SourceRef::inline(png_bytes(4, 3))).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (4, 3));
}

#[test]
fn inline_garbage_is_a_load_error_with_reference() {
    let loader = DefaultLoader::default();
    let err = loader
        .load(&SourceRef::inline(b"nope".to_vec()))
        .unwrap_err();
    assert_eq!(err.reference, "inline:4 bytes");
    assert!(err.reason.contains("decode"));
}

#[test]
fn file_source_reads_from_disk() {
    let path = scratch_path("ok.png");
    std::fs::write(&path, png_bytes(2, 5)).unwrap();

    let loader = DefaultLoader::default();
    let bitmap = loader.load(&SourceRef::File(path.clone())).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (2, 5));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file_names_the_path() {
    let path = scratch_path("missing.png");
    let loader = DefaultLoader::default();
    let err = loader.load(&SourceRef::File(path.clone())).unwrap_err();
    assert_eq!(err.reference, path.display().to_string());
    assert!(err.reason.contains("read failed"));
}

#[test]
fn oversized_file_is_rejected() {
    let path = scratch_path("big.png");
    std::fs::write(&path, png_bytes(16, 16)).unwrap();

    let cfg = Config {
        max_fetch_bytes: 8,
        ..Config::default()
    };
    let err = DefaultLoader::new(&cfg)
        .load(&SourceRef::File(path.clone()))
        .unwrap_err();
    assert!(err.reason.contains("exceeds"));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn unreachable_remote_is_a_single_load_error() {
    let cfg = Config {
        fetch_timeout_secs: 2,
        ..Config::default()
    };
    let url = "http://127.0.0.1:1/never.png";
    let err = DefaultLoader::new(&cfg)
        .load(&SourceRef::Remote(url.to_string()))
        .unwrap_err();
    assert_eq!(err.reference, url);
    assert!(err.reason.contains("fetch failed"));
}
