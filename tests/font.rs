//! Font loading and rendering.
//!
//! Rendering tests need `tests/fixtures/font.ttf` and are skipped without it.

use std::path::Path;

use image::{Rgba, RgbaImage};
use subgif::{FontRasterizer, SubgifError, TextRasterizer};

fn sample_font_path() -> &'static str {
    "tests/fixtures/font.ttf"
}

#[test]
fn missing_font_is_a_font_error() {
    let result = FontRasterizer::load("tests/fixtures/does-not-exist.ttf", 14.0);
    assert!(matches!(result, Err(SubgifError::FontError { .. })));
}

#[test]
fn garbage_font_is_a_font_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.ttf");
    std::fs::write(&path, b"not a font").unwrap();

    let result = FontRasterizer::load(&path, 14.0);
    assert!(matches!(result, Err(SubgifError::FontError { .. })));
}

#[test]
fn non_positive_size_is_rejected() {
    let path = sample_font_path();
    if !Path::new(path).exists() {
        return;
    }
    assert!(FontRasterizer::load(path, 0.0).is_err());
}

#[test]
fn width_depends_on_content() {
    let path = sample_font_path();
    if !Path::new(path).exists() {
        return;
    }
    let font = FontRasterizer::load(path, 14.0).unwrap();

    let short = font.measure("Hi");
    let long = font.measure("Hi there, how are you?");

    assert!(long.width > short.width);
    assert_eq!(short.height, long.height);
    assert!(font.line_height() > 0.0);
    assert_eq!(font.measure("Hi"), short);
}

#[test]
fn larger_size_measures_wider() {
    let path = sample_font_path();
    if !Path::new(path).exists() {
        return;
    }
    let small = FontRasterizer::load(path, 14.0).unwrap();
    let large = FontRasterizer::load(path, 28.0).unwrap();

    assert!(large.measure("Caption").width > small.measure("Caption").width);
}

#[test]
fn drawing_touches_pixels_near_the_baseline() {
    let path = sample_font_path();
    if !Path::new(path).exists() {
        return;
    }
    let font = FontRasterizer::load(path, 20.0).unwrap();
    let mut canvas = RgbaImage::from_pixel(120, 40, Rgba([0, 0, 0, 255]));

    font.draw(&mut canvas, 10.0, 30.0, "Hello", Rgba([255, 255, 255, 255]));

    let lit: Vec<(u32, u32)> = canvas
        .enumerate_pixels()
        .filter(|(_, _, pixel)| pixel[0] > 128)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!lit.is_empty());
    assert!(lit.iter().all(|&(x, y)| x >= 8 && y <= 34));
}
