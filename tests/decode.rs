//! Image decoding integration tests.
//!
//! Fixtures are written with the `image` crate into temporary directories.

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use stillreel::StillreelError;

fn write_png(directory: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = directory.join(name);
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]))
        .save(&path)
        .expect("write png");
    path
}

#[test]
fn decodes_to_packed_rgb() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = write_png(directory.path(), "frame.png", 64, 48);

    let image = stillreel::decode(&path).expect("decode");
    assert_eq!(image.dimensions(), (64, 48));
    assert_eq!(image.as_bytes().len(), 64 * 48 * 3);
    assert_eq!(image.pixel(5, 7), Some([5, 7, 5 ^ 7]));
}

#[test]
fn decoding_is_deterministic() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = directory.path().join("frame.jpg");
    RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 200]))
        .save(&path)
        .expect("write jpeg");

    let first = stillreel::decode(&path).expect("decode");
    let second = stillreel::decode(&path).expect("decode again");
    assert_eq!(first.as_bytes(), second.as_bytes());
    assert_eq!(first.as_bytes().len(), 32 * 32 * 3);
}

#[test]
fn grayscale_is_expanded_to_rgb() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = directory.path().join("gray.png");
    GrayImage::from_pixel(4, 4, Luma([90])).save(&path).unwrap();

    let image = stillreel::decode(&path).expect("decode");
    assert_eq!(image.as_bytes().len(), 4 * 4 * 3);
    assert_eq!(image.pixel(3, 3), Some([90, 90, 90]));
}

#[test]
fn alpha_is_dropped() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = directory.path().join("alpha.png");
    RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0])).save(&path).unwrap();

    let image = stillreel::decode(&path).expect("decode");
    assert_eq!(image.as_bytes(), &[10, 20, 30].repeat(4)[..]);
}

#[test]
fn format_is_sniffed_from_content() {
    let directory = tempfile::tempdir().expect("temp dir");
    let png = write_png(directory.path(), "frame.png", 8, 8);
    let misnamed = directory.path().join("frame.dat");
    fs::copy(&png, &misnamed).unwrap();

    let image = stillreel::decode(&misnamed).expect("decode by content");
    assert_eq!(image.dimensions(), (8, 8));
}

#[test]
fn missing_file_is_not_found() {
    let directory = tempfile::tempdir().expect("temp dir");
    let result = stillreel::decode(directory.path().join("missing.png"));
    assert!(matches!(result, Err(StillreelError::FileNotFound(_))));
}

#[test]
fn directory_is_unreadable() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = directory.path().join("sub.png");
    fs::create_dir(&path).unwrap();

    let result = stillreel::decode(&path);
    match result {
        Err(StillreelError::FileUnreadable { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected FileUnreadable, got {other:?}"),
    }
}

#[test]
fn garbage_is_malformed() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = directory.path().join("garbage.png");
    fs::write(&path, b"this is not an image at all").unwrap();

    let result = stillreel::decode(&path);
    assert!(
        matches!(result, Err(StillreelError::MalformedImageHeader { .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn unknown_format_is_malformed() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = directory.path().join("notes.txt");
    fs::write(&path, b"hello").unwrap();

    let result = stillreel::decode(&path);
    assert!(matches!(
        result,
        Err(StillreelError::MalformedImageHeader { .. })
    ));
}

#[test]
fn truncated_header_is_malformed() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = write_png(directory.path(), "cut.png", 16, 16);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..12]).unwrap();

    let result = stillreel::decode(&path);
    assert!(
        matches!(result, Err(StillreelError::MalformedImageHeader { .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn truncated_body_fails_without_partial_output() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = write_png(directory.path(), "cut.png", 64, 64);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let result = stillreel::decode(&path);
    assert!(
        matches!(result, Err(StillreelError::MalformedImageHeader { .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn allocation_limit_reports_out_of_memory() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = write_png(directory.path(), "big.png", 256, 256);

    let result = stillreel::decode_with_limit(&path, Some(1024));
    assert!(
        matches!(result, Err(StillreelError::OutOfMemory { .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn probe_reads_dimensions_only() {
    let directory = tempfile::tempdir().expect("temp dir");
    let path = write_png(directory.path(), "frame.png", 40, 30);
    assert_eq!(stillreel::probe_dimensions(&path).unwrap(), (40, 30));
}
