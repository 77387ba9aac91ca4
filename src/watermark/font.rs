use super::WatermarkStyle;
use super::bitmap;
use ab_glyph::{Font, FontVec, GlyphId, OutlinedGlyph, PxScale, ScaleFont, point};
use image::{Rgba, RgbaImage};
use imageproc::pixelops::weighted_sum;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fonts tried, in order, when no user font is given or it fails to load
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\verdana.ttf",
];

/// Coverage at or above this counts as a fully covered pixel
const FULL_COVERAGE: f32 = 0.999;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse font")]
    InvalidFont,
}

/// The font used for the whole run. Loaded once, scaled per image.
pub enum LoadedFont {
    TrueType { font: FontVec, origin: PathBuf },
    Builtin,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoadedFont({})", self.describe())
    }
}

/// Ink extent of laid-out text, relative to the layout origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InkBounds {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

/// Lay out `text` on a single line with the baseline at the font's ascent.
/// Measuring and drawing both go through here so they cannot disagree.
fn layout_glyphs(font: &FontVec, font_size: f32, text: &str) -> Vec<OutlinedGlyph> {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0;
    let mut previous: Option<GlyphId> = None;
    let mut glyphs = Vec::new();

    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(previous) = previous {
            caret += scaled.kern(previous, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
        caret += scaled.h_advance(id);
        previous = Some(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            glyphs.push(outlined);
        }
    }

    glyphs
}

fn ink_bounds(glyphs: &[OutlinedGlyph]) -> Option<InkBounds> {
    glyphs.iter().map(|g| g.px_bounds()).fold(None, |acc, bb| {
        let next = InkBounds {
            left: bb.min.x as i32,
            top: bb.min.y as i32,
            right: bb.max.x as i32,
            bottom: bb.max.y as i32,
        };
        Some(match acc {
            None => next,
            Some(acc) => InkBounds {
                left: acc.left.min(next.left),
                top: acc.top.min(next.top),
                right: acc.right.max(next.right),
                bottom: acc.bottom.max(next.bottom),
            },
        })
    })
}

impl LoadedFont {
    /// Resolve the font for a run. Never fails: a missing or broken font
    /// degrades to the next candidate and finally to the built-in glyphs.
    pub fn load(style: &WatermarkStyle) -> Self {
        if let Some(path) = &style.font_path {
            match Self::from_file(path) {
                Ok(font) => {
                    info!("Using font {}", path.display());
                    return font;
                }
                Err(e) => warn!(
                    "Could not load font {}: {}, falling back",
                    path.display(),
                    e
                ),
            }
        }

        if style.system_fonts
            && let Some(font) = Self::first_system_font()
        {
            return font;
        }

        info!("Using built-in bitmap font");
        LoadedFont::Builtin
    }

    pub fn first_system_font() -> Option<Self> {
        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(font) => {
                    info!("Using system font {}", path.display());
                    return Some(font);
                }
                Err(e) => debug!("Skipping system font {}: {}", path.display(), e),
            }
        }
        None
    }

    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let font_data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(font_data).map_err(|_| FontError::InvalidFont)?;
        Ok(LoadedFont::TrueType {
            font,
            origin: path.to_path_buf(),
        })
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, LoadedFont::Builtin)
    }

    pub fn describe(&self) -> String {
        match self {
            LoadedFont::TrueType { origin, .. } => origin.display().to_string(),
            LoadedFont::Builtin => "built-in".to_string(),
        }
    }

    /// Width and height of the inked area of `text` at `font_size`.
    pub fn text_size(&self, font_size: f32, text: &str) -> (u32, u32) {
        match self {
            LoadedFont::TrueType { font, .. } => {
                match ink_bounds(&layout_glyphs(font, font_size, text)) {
                    Some(bounds) => (
                        (bounds.right - bounds.left) as u32,
                        (bounds.bottom - bounds.top) as u32,
                    ),
                    None => (0, 0),
                }
            }
            LoadedFont::Builtin => bitmap::text_size(font_size, text),
        }
    }

    /// Draw `text` so that its inked area starts at (`x`, `y`) and spans
    /// exactly `text_size`.
    pub fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        color: Rgba<u8>,
        x: i32,
        y: i32,
        font_size: f32,
        text: &str,
    ) {
        match self {
            LoadedFont::TrueType { font, .. } => {
                let glyphs = layout_glyphs(font, font_size, text);
                let Some(bounds) = ink_bounds(&glyphs) else {
                    return;
                };
                let (width, height) = canvas.dimensions();

                for glyph in &glyphs {
                    let bb = glyph.px_bounds();
                    let glyph_x = x - bounds.left + bb.min.x as i32;
                    let glyph_y = y - bounds.top + bb.min.y as i32;

                    glyph.draw(|gx, gy, coverage| {
                        if coverage <= 0.0 {
                            return;
                        }
                        let px = glyph_x + gx as i32;
                        let py = glyph_y + gy as i32;
                        if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                            return;
                        }
                        let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                        *pixel = if coverage >= FULL_COVERAGE {
                            color
                        } else {
                            weighted_sum(*pixel, color, 1.0 - coverage, coverage)
                        };
                    });
                }
            }
            LoadedFont::Builtin => bitmap::draw_text_mut(canvas, color, x, y, font_size, text),
        }
    }
}
