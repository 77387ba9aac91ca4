//! Built-in 5x7 bitmap glyphs, used when no TrueType font can be loaded.
//!
//! Only the characters a timestamp needs are covered; anything else renders
//! as blank space of the same advance.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance per character, in cells (glyph plus one column gap)
pub const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

const BLANK: [u8; 7] = [0; 7];

/// Rows top to bottom; bit 4 is the leftmost column.
pub fn glyph_rows(ch: char) -> [u8; 7] {
    match ch {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        _ => BLANK,
    }
}

/// Edge length in pixels of one glyph cell at the given font size.
pub fn cell_size(font_size: f32) -> u32 {
    ((font_size / (GLYPH_HEIGHT + 1) as f32).round() as u32).max(1)
}

pub fn text_size(font_size: f32, text: &str) -> (u32, u32) {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return (0, 0);
    }
    let cell = cell_size(font_size);
    // No gap after the last glyph
    let width = (chars * GLYPH_ADVANCE - 1) * cell;
    (width, GLYPH_HEIGHT * cell)
}

pub fn draw_text_mut(
    canvas: &mut RgbaImage,
    color: Rgba<u8>,
    x: i32,
    y: i32,
    font_size: f32,
    text: &str,
) {
    let cell = cell_size(font_size);
    for (index, ch) in text.chars().enumerate() {
        let glyph_x = x + (index as u32 * GLYPH_ADVANCE * cell) as i32;
        for (row, bits) in glyph_rows(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let rect = Rect::at(
                    glyph_x + (col * cell) as i32,
                    y + (row as u32 * cell) as i32,
                )
                .of_size(cell, cell);
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
    }
}
