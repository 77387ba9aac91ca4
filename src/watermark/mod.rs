// Watermark rendering - sizing, placement and drawing of the timestamp text
pub mod bitmap;
mod font;

pub use font::{FontError, LoadedFont, SYSTEM_FONT_CANDIDATES};

use image::{DynamicImage, Rgba};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{trace, warn};

pub const GOLD: Rgba<u8> = Rgba([255, 215, 0, 255]);

/// Share of the image area the text should roughly cover when sizing adaptively
const TARGET_AREA_RATIO: f64 = 0.03;
/// Average glyph width relative to the font size
const CHAR_WIDTH_RATIO: f64 = 0.6;
const TEXT_DENSITY_FACTOR: f64 = 2.0;
pub const MIN_FONT_SIZE: u32 = 20;
pub const MIN_MARGIN: u32 = 10;

/// Visual style of the watermark, fixed for a whole run
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatermarkStyle {
    /// Fill color as `#RRGGBB`
    pub color: String,
    /// User-supplied TrueType/OpenType font
    pub font_path: Option<PathBuf>,
    /// Try well-known system fonts before the built-in bitmap font
    pub system_fonts: bool,
    /// Fixed font size in pixels; adaptive to the image when unset
    pub font_size: Option<f32>,
    /// Fixed margin in pixels; adaptive to the image when unset
    pub margin: Option<u32>,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            color: "#FFD700".to_string(),
            font_path: None,
            system_fonts: true,
            font_size: None,
            margin: None,
        }
    }
}

impl WatermarkStyle {
    pub fn fill_color(&self) -> Rgba<u8> {
        match parse_hex_color(&self.color) {
            Some(color) => color,
            None => {
                warn!("Invalid watermark color {:?}, using gold", self.color);
                GOLD
            }
        }
    }
}

pub fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]))
}

/// Font size giving the text about 3% of the image area, clamped to
/// `[20, min(w, h) / 10]` with the lower bound taking precedence.
pub fn adaptive_font_size(text: &str, width: u32, height: u32) -> f32 {
    let target_area = width as f64 * height as f64 * TARGET_AREA_RATIO;
    let chars = text.chars().count().max(1) as f64;
    let size = (target_area / (chars * CHAR_WIDTH_RATIO * TEXT_DENSITY_FACTOR)).sqrt() as u32;
    let max_size = width.min(height) / 10;
    size.min(max_size).max(MIN_FONT_SIZE) as f32
}

pub fn adaptive_margin(width: u32, height: u32) -> u32 {
    (width.min(height) / 100).max(MIN_MARGIN)
}

/// Where the text lands on a given image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkLayout {
    pub x: i32,
    pub y: i32,
    pub text_width: u32,
    pub text_height: u32,
    pub font_size: f32,
    pub margin: u32,
}

/// Compute the bottom-right placement of `text` on a `width` x `height` image.
pub fn layout(
    width: u32,
    height: u32,
    text: &str,
    font: &LoadedFont,
    style: &WatermarkStyle,
) -> WatermarkLayout {
    let font_size = style
        .font_size
        .unwrap_or_else(|| adaptive_font_size(text, width, height));
    let margin = style.margin.unwrap_or_else(|| adaptive_margin(width, height));
    let (text_width, text_height) = font.text_size(font_size, text);

    let mut x = width as i64 - margin as i64 - text_width as i64;
    let mut y = height as i64 - margin as i64 - text_height as i64;

    // Keep the text inside the image when it is too large for the margin
    if x < 0 {
        x = (width / 20) as i64;
    }
    if y < 0 {
        y = (height / 20) as i64;
    }

    WatermarkLayout {
        x: x as i32,
        y: y as i32,
        text_width,
        text_height,
        font_size,
        margin,
    }
}

/// Draw `text` onto a copy of `image` at its bottom-right corner.
///
/// The image is normalized to RGBA8 before drawing. The result is RGBA8 if
/// the source carried an alpha channel and RGB8 otherwise, so palette,
/// grayscale and high bit depth inputs all come out as 8-bit RGB(A).
pub fn render(
    image: &DynamicImage,
    text: &str,
    font: &LoadedFont,
    style: &WatermarkStyle,
) -> DynamicImage {
    let has_alpha = image.color().has_alpha();
    let mut canvas = image.to_rgba8();
    let (width, height) = canvas.dimensions();

    let placement = layout(width, height, text, font, style);
    trace!("Watermark layout for {}x{}: {:?}", width, height, placement);

    font.draw_text(
        &mut canvas,
        style.fill_color(),
        placement.x,
        placement.y,
        placement.font_size,
        text,
    );

    if has_alpha {
        DynamicImage::ImageRgba8(canvas)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }
}
