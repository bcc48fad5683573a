//! Text measurement and glyph rasterization with ab_glyph

use std::path::{Path, PathBuf};

use ab_glyph::{Font as _, FontArc, PxScale, ScaleFont as _};
use anyhow::{Context, Result};
use tiny_skia::{Pixmap, PremultipliedColorU8};

use crate::config::SnapConfig;

/// Fonts tried when no explicit font file is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Per-character width estimate used without a font, as a fraction of the size
const FALLBACK_ADVANCE: f32 = 0.6;
/// Line height estimate used without a font, as a fraction of the size
const FALLBACK_LINE_HEIGHT: f32 = 1.2;

/// The font used for text annotations, number labels and the dimension label
#[derive(Clone, Default)]
pub struct FontBook {
    font: Option<FontArc>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("loaded", &self.font.is_some())
            .finish()
    }
}

impl FontBook {
    /// A book without any font: text measures by estimate and draws nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = FontArc::try_from_vec(bytes).context("Invalid font data")?;
        Ok(Self { font: Some(font) })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;
        Self::from_bytes(bytes).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load the configured font, then fall back to well-known system fonts
    pub fn load(config: &SnapConfig) -> Self {
        let candidates = config
            .font_path
            .iter()
            .cloned()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(book) => {
                    log::debug!("Using font {}", path.display());
                    return book;
                }
                Err(err) => log::warn!("Skipping font: {:?}", err),
            }
        }

        log::warn!("No usable font found, text annotations will not be rasterized");
        Self::empty()
    }

    /// Pixel size of multi-line text at `size`
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        let lines = text.split('\n').count().max(1) as f32;
        let Some(font) = &self.font else {
            let widest = text
                .split('\n')
                .map(|line| line.chars().count())
                .max()
                .unwrap_or(0) as f32;
            return (
                (widest * size * FALLBACK_ADVANCE).round() as u32,
                (lines * size * FALLBACK_LINE_HEIGHT).round() as u32,
            );
        };

        let scaled = font.as_scaled(PxScale::from(size));
        let widest = text
            .split('\n')
            .map(|line| line_width(font, size, line))
            .fold(0.0_f32, f32::max);
        let height = scaled.height() * lines + scaled.line_gap() * (lines - 1.0);
        (widest.ceil() as u32, height.ceil() as u32)
    }

    /// Rasterize text with its top-left corner at (`x`, `y`) in device pixels
    pub fn draw(&self, pixmap: &mut Pixmap, text: &str, x: f32, y: f32, size: f32, rgba: [u8; 4]) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = PxScale::from(size);
        let scaled = font.as_scaled(scale);
        let line_advance = scaled.height() + scaled.line_gap();
        let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);

        for (row, line) in text.split('\n').enumerate() {
            let baseline = y + scaled.ascent() + row as f32 * line_advance;
            let mut caret = x;
            let mut prev = None;
            for ch in line.chars() {
                let id = font.glyph_id(ch);
                if let Some(prev) = prev {
                    caret += scaled.kern(prev, id);
                }
                prev = Some(id);
                let glyph = id.with_scale_and_position(scale, ab_glyph::point(caret, baseline));
                caret += scaled.h_advance(id);

                let Some(outlined) = font.outline_glyph(glyph) else {
                    continue;
                };
                let bounds = outlined.px_bounds();
                let pixels = pixmap.pixels_mut();
                outlined.draw(|gx, gy, coverage| {
                    let px = gx as i32 + bounds.min.x as i32;
                    let py = gy as i32 + bounds.min.y as i32;
                    if px < 0 || py < 0 || px >= width || py >= height {
                        return;
                    }
                    let idx = (py * width + px) as usize;
                    pixels[idx] = blend(pixels[idx], rgba, coverage);
                });
            }
        }
    }
}

fn line_width(font: &FontArc, size: f32, line: &str) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0;
    let mut prev = None;
    for ch in line.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Source-over blend of a straight color with glyph coverage onto a premultiplied pixel
pub(crate) fn blend(dst: PremultipliedColorU8, rgba: [u8; 4], coverage: f32) -> PremultipliedColorU8 {
    let alpha = (rgba[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return dst;
    }
    let inv = 1.0 - alpha;
    let mix = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * inv).round().min(255.0) as u8;
    let a = (255.0 * alpha + dst.alpha() as f32 * inv).round().min(255.0) as u8;
    let r = mix(rgba[0], dst.red()).min(a);
    let g = mix(rgba[1], dst.green()).min(a);
    let b = mix(rgba[2], dst.blue()).min(a);
    PremultipliedColorU8::from_rgba(r, g, b, a).unwrap_or(dst)
}
