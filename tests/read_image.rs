//! End-to-end tests of the read pipeline through the public API.
//!
//! Each test builds a throwaway allowed root, writes synthetic images into it,
//! and checks the data URI that comes back by decoding it again.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, RgbaImage};
use image_inline::data_uri;
use image_inline::imaging::ImageKind;
use image_inline::{AllowedRoot, ErrorKind, ImageReader, ImageRequest, ReaderSettings};
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn setup() -> (TempDir, ImageReader) {
    let tmp = TempDir::new().unwrap();
    let root = AllowedRoot::new(tmp.path()).unwrap();
    (tmp, ImageReader::new(root, ReaderSettings::default()))
}

fn write_image(dir: &Path, name: &str, kind: ImageKind, width: u32, height: u32) {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 90, 255])
    }));
    let mut bytes = Vec::new();
    match kind {
        ImageKind::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, 95))
            .unwrap(),
        other => img
            .write_to(&mut Cursor::new(&mut bytes), other.image_format())
            .unwrap(),
    }
    fs::write(dir.join(name), bytes).unwrap();
}

/// Decode a data URI all the way back to pixels.
fn decode_uri(uri: &str) -> (ImageKind, DynamicImage) {
    let (kind, bytes) = data_uri::decode(uri).unwrap();
    let img = image::load_from_memory_with_format(&bytes, kind.image_format()).unwrap();
    (kind, img)
}

#[test]
fn scenario_a_in_bounds_png_is_unchanged() {
    let (tmp, reader) = setup();
    write_image(tmp.path(), "logo.png", ImageKind::Png, 400, 100);

    let outcome = reader.read(&ImageRequest::new("logo.png")).unwrap();
    assert_eq!(outcome.format, ImageKind::Png);
    assert!(!outcome.was_resized());
    assert!(outcome.data_uri.starts_with("data:image/png;base64,"));

    let (kind, img) = decode_uri(&outcome.data_uri);
    assert_eq!(kind, ImageKind::Png);
    assert_eq!(img.dimensions(), (400, 100));
}

#[test]
fn scenario_b_wide_jpeg_scales_down() {
    let (tmp, reader) = setup();
    write_image(tmp.path(), "banner.jpg", ImageKind::Jpeg, 2000, 500);

    let outcome = reader.read(&ImageRequest::new("banner.jpg")).unwrap();
    assert!(outcome.data_uri.starts_with("data:image/jpeg;base64,"));
    assert_eq!(outcome.original.as_tuple(), (2000, 500));

    let (kind, img) = decode_uri(&outcome.data_uri);
    assert_eq!(kind, ImageKind::Jpeg);
    assert_eq!(img.dimensions(), (800, 200));
}

#[test]
fn scenario_c_tiny_gif_scales_up() {
    let (tmp, reader) = setup();
    write_image(tmp.path(), "dot.gif", ImageKind::Gif, 10, 10);

    let outcome = reader.read(&ImageRequest::new("dot.gif")).unwrap();
    assert!(outcome.data_uri.starts_with("data:image/gif;base64,"));

    let (_, img) = decode_uri(&outcome.data_uri);
    assert_eq!(img.dimensions(), (20, 20));
}

#[test]
fn scenario_d_traversal_is_denied() {
    let (_tmp, reader) = setup();

    let err = reader
        .read(&ImageRequest::new("../../etc/passwd"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
    assert!(err.to_string().contains("Access denied"));
}

#[test]
fn scenario_e_oversized_file_is_too_large() {
    let (tmp, reader) = setup();
    let file = File::create(tmp.path().join("huge.png")).unwrap();
    file.set_len(150 * 1024 * 1024).unwrap();

    let err = reader.read(&ImageRequest::new("huge.png")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooLarge);
    assert!(err.to_string().contains("104857600 bytes"));
}

#[test]
fn scenario_f_text_renamed_png_is_invalid() {
    let (tmp, reader) = setup();
    fs::write(tmp.path().join("notes.png"), "these are my notes\n").unwrap();

    let err = reader.read(&ImageRequest::new("notes.png")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidImage);
}

#[test]
fn webp_round_trips_with_alpha() {
    let (tmp, reader) = setup();
    write_image(tmp.path(), "icon.webp", ImageKind::WebP, 1000, 250);

    let outcome = reader.read(&ImageRequest::new("icon.webp")).unwrap();
    let (kind, img) = decode_uri(&outcome.data_uri);
    assert_eq!(kind, ImageKind::WebP);
    assert_eq!(img.dimensions(), (800, 200));
}

#[test]
fn sniffing_beats_misleading_extension() {
    let (tmp, reader) = setup();
    // PNG bytes under a .jpg name
    write_image(tmp.path(), "actually-png.jpg", ImageKind::Png, 50, 50);

    let outcome = reader.read(&ImageRequest::new("actually-png.jpg")).unwrap();
    assert_eq!(outcome.format, ImageKind::Png);
    assert!(outcome.data_uri.starts_with("data:image/png;base64,"));
}

#[test]
fn absolute_path_inside_root_is_accepted() {
    let (tmp, reader) = setup();
    fs::create_dir(tmp.path().join("nested")).unwrap();
    write_image(&tmp.path().join("nested"), "pic.png", ImageKind::Png, 30, 60);

    let absolute = reader.root().path().join("nested/pic.png");
    let outcome = reader
        .read(&ImageRequest::new(absolute.to_str().unwrap()))
        .unwrap();
    assert_eq!(outcome.output.as_tuple(), (30, 60));
}

#[cfg(unix)]
#[test]
fn root_configured_through_symlink_serves_its_own_paths() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("real")).unwrap();
    write_image(&tmp.path().join("real"), "logo.png", ImageKind::Png, 400, 100);
    let link = tmp.path().join("link");
    std::os::unix::fs::symlink(tmp.path().join("real"), &link).unwrap();
    let reader = ImageReader::new(AllowedRoot::new(&link).unwrap(), ReaderSettings::default());

    let spelled = link.join("logo.png");
    let outcome = reader
        .read(&ImageRequest::new(spelled.to_str().unwrap()))
        .unwrap();
    assert_eq!(outcome.output.as_tuple(), (400, 100));
    assert_eq!(outcome.source, reader.root().path().join("logo.png"));
}

#[test]
fn outputs_always_land_in_width_window() {
    let (tmp, reader) = setup();
    let cases = [(1, 5), (19, 19), (20, 7), (800, 3), (801, 801), (3000, 10)];
    for (i, &(w, h)) in cases.iter().enumerate() {
        let name = format!("case-{i}.png");
        write_image(tmp.path(), &name, ImageKind::Png, w, h);

        let outcome = reader.read(&ImageRequest::new(name.as_str())).unwrap();
        let (_, img) = decode_uri(&outcome.data_uri);
        assert!(
            (20..=800).contains(&img.width()),
            "{w}x{h} produced width {}",
            img.width()
        );
        let expected = h as f64 * img.width() as f64 / w as f64;
        assert!(
            (img.height() as f64 - expected).abs() <= 1.0 || img.height() == 1,
            "{w}x{h} produced height {}, expected ≈ {expected}",
            img.height()
        );
    }
}

#[test]
fn reader_serves_concurrent_calls() {
    let (tmp, reader) = setup();
    write_image(tmp.path(), "a.png", ImageKind::Png, 900, 300);
    write_image(tmp.path(), "b.gif", ImageKind::Gif, 5, 5);

    std::thread::scope(|s| {
        let a = s.spawn(|| reader.read(&ImageRequest::new("a.png")));
        let b = s.spawn(|| reader.read(&ImageRequest::new("b.gif")));
        assert_eq!(a.join().unwrap().unwrap().output.as_tuple(), (800, 267));
        assert_eq!(b.join().unwrap().unwrap().output.as_tuple(), (20, 20));
    });
}
