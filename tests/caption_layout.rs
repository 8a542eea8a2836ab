//! Caption placement and outline drawing.

mod common;

use common::{BlockRasterizer, CHAR_WIDTH, LINE_HEIGHT};
use image::{Rgba, RgbaImage};
use subgif::caption::OUTLINE_DIRECTIONS;
use subgif::cue::caption_lines;
use subgif::{CaptionStyle, draw_caption, layout_caption};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

#[test]
fn lines_are_centred() {
    let rasterizer = BlockRasterizer::default();
    let lines = caption_lines("Short\nA much longer line");

    let placements = layout_caption(&lines, WIDTH, HEIGHT, &rasterizer, &CaptionStyle::default());

    for placement in &placements {
        let text_width = placement.text.chars().count() as f32 * CHAR_WIDTH;
        assert_eq!(placement.metrics.width, text_width);
        assert_eq!(placement.x, WIDTH as f32 / 2.0 - text_width / 2.0);
    }
}

#[test]
fn lines_stack_up_from_the_bottom() {
    let rasterizer = BlockRasterizer::default();
    let lines = caption_lines("one\ntwo\nthree");
    let style = CaptionStyle::default();

    let placements = layout_caption(&lines, WIDTH, HEIGHT, &rasterizer, &style);

    assert_eq!(placements.len(), 3);
    for pair in placements.windows(2) {
        assert_eq!(pair[1].y - pair[0].y, LINE_HEIGHT);
    }
    let last = placements.last().unwrap();
    assert_eq!(last.y, HEIGHT as f32 - LINE_HEIGHT - style.bottom_margin);
    assert_eq!(placements[0].y, HEIGHT as f32 - 3.0 * LINE_HEIGHT - 5.0);
}

#[test]
fn outline_then_fill() {
    let rasterizer = BlockRasterizer::default();
    let lines = caption_lines("Hi");
    let style = CaptionStyle::default();
    let placements = layout_caption(&lines, WIDTH, HEIGHT, &rasterizer, &style);
    let mut canvas = RgbaImage::new(WIDTH, HEIGHT);

    draw_caption(&mut canvas, &placements, &rasterizer, &style);

    let calls = rasterizer.calls();
    assert_eq!(calls.len(), 5);
    let (x, y) = (placements[0].x, placements[0].y);
    for (call, (dx, dy)) in calls.iter().zip(OUTLINE_DIRECTIONS) {
        assert_eq!(call.color, Rgba([0, 0, 0, 255]));
        assert_eq!((call.x, call.y), (x + dx, y + dy));
    }
    let fill = &calls[4];
    assert_eq!(fill.color, Rgba([255, 255, 255, 255]));
    assert_eq!((fill.x, fill.y), (x, y));
}

#[test]
fn every_line_gets_five_passes() {
    let rasterizer = BlockRasterizer::default();
    let lines = caption_lines("first\nsecond");
    let style = CaptionStyle::default();
    let placements = layout_caption(&lines, WIDTH, HEIGHT, &rasterizer, &style);

    draw_caption(&mut RgbaImage::new(WIDTH, HEIGHT), &placements, &rasterizer, &style);

    let calls = rasterizer.calls();
    assert_eq!(calls.len(), 10);
    assert!(calls[..5].iter().all(|call| call.text == "first"));
    assert!(calls[5..].iter().all(|call| call.text == "second"));
}

#[test]
fn empty_caption_draws_nothing() {
    let rasterizer = BlockRasterizer::default();
    let lines = caption_lines("<i></i>\n   \n");
    let style = CaptionStyle::default();
    let mut canvas = RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba([10, 20, 30, 255]));
    let before = canvas.clone();

    let placements = layout_caption(&lines, WIDTH, HEIGHT, &rasterizer, &style);
    draw_caption(&mut canvas, &placements, &rasterizer, &style);

    assert!(lines.is_empty());
    assert!(placements.is_empty());
    assert!(rasterizer.calls().is_empty());
    assert_eq!(canvas, before);
}

#[test]
fn custom_style_is_honoured() {
    let rasterizer = BlockRasterizer::default();
    let lines = caption_lines("x");
    let style = CaptionStyle {
        fill: Rgba([255, 255, 0, 255]),
        outline: Rgba([0, 0, 255, 255]),
        outline_offset: 2.0,
        bottom_margin: 20.0,
    };
    let placements = layout_caption(&lines, WIDTH, HEIGHT, &rasterizer, &style);

    draw_caption(&mut RgbaImage::new(WIDTH, HEIGHT), &placements, &rasterizer, &style);

    let calls = rasterizer.calls();
    assert_eq!(placements[0].y, HEIGHT as f32 - LINE_HEIGHT - 20.0);
    assert_eq!(calls[0].x, placements[0].x - 2.0);
    assert_eq!(calls[0].color, style.outline);
    assert_eq!(calls[4].color, style.fill);
}

#[test]
fn subset_of_lines_is_laid_out_by_position() {
    let rasterizer = BlockRasterizer::default();
    let style = CaptionStyle::default();
    let all = caption_lines("one\ntwo\nthree");
    let tail = &all[2..];

    let placements = layout_caption(tail, WIDTH, HEIGHT, &rasterizer, &style);

    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].line_index, 2);
    assert_eq!(placements[0].y, HEIGHT as f32 - LINE_HEIGHT - style.bottom_margin);
}
