//! Collaborators supplied by the surrounding application
//!
//! The session core never talks to the OS directly. Screen grabs, window
//! lookup, inline text entry and the clipboard/file hand-off all go through
//! the traits here. File-backed implementations drive the CLI and tests.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use image::RgbaImage;

use crate::config::ImageFormat;
use crate::domain::{FontSpec, Point, Rect, ShapeColor};
use crate::render::export;

pub use crate::domain::WindowLocator;

/// One-shot screen grab performed at session start
pub trait ScreenCapturer {
    /// Capture the screen, optionally restricted to `bounds`
    fn capture_screen(&self, bounds: Option<Rect>) -> Result<RgbaImage>;
}

/// Inline text entry widget
///
/// The editor reports back through `Msg::Text` once the user confirms or
/// dismisses the edit.
pub trait TextEditor {
    /// Open the editor at `anchor`
    fn begin_edit(&mut self, anchor: Point, color: ShapeColor, font: &FontSpec);

    /// Style changed while the editor is open
    fn restyle(&mut self, _color: ShapeColor, _font: &FontSpec) {}

    /// Close the editor without waiting for the user
    fn end_edit(&mut self) {}
}

/// Destination for the exported bitmap
pub trait ImageSink {
    fn set_clipboard_image(&mut self, image: &RgbaImage) -> Result<()>;
    fn save_image(&mut self, image: &RgbaImage, path: &Path) -> Result<()>;
}

// ============================================================================
// File-backed implementations
// ============================================================================

/// Uses an image file as the "screen"
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScreenCapturer for FileCapture {
    fn capture_screen(&self, bounds: Option<Rect>) -> Result<RgbaImage> {
        let image = image::open(&self.path)
            .with_context(|| format!("Failed to load capture from {}", self.path.display()))?
            .to_rgba8();
        let Some(bounds) = bounds else {
            return Ok(image);
        };
        let full = Rect::new(0, 0, image.width() as i32, image.height() as i32);
        let Some(area) = bounds.intersect(full) else {
            bail!("Capture bounds {:?} are outside the image", bounds);
        };
        Ok(image::imageops::crop_imm(
            &image,
            area.x as u32,
            area.y as u32,
            area.width as u32,
            area.height as u32,
        )
        .to_image())
    }
}

/// A fixed list of window rectangles, topmost first
#[derive(Debug, Clone, Default)]
pub struct StaticWindows {
    rects: Vec<Rect>,
}

impl StaticWindows {
    pub fn new(rects: Vec<Rect>) -> Self {
        Self { rects }
    }
}

impl WindowLocator for StaticWindows {
    fn window_rect_at(&self, point: Point) -> Option<Rect> {
        self.rects.iter().copied().find(|r| r.contains_point(point))
    }
}

/// Text editor for headless sessions: edits are never confirmed
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextEditor;

impl TextEditor for NoTextEditor {
    fn begin_edit(&mut self, anchor: Point, _color: ShapeColor, _font: &FontSpec) {
        log::debug!("No inline editor available for text at {:?}", anchor);
    }
}

/// Writes exports to disk; the "clipboard" is an optional file
#[derive(Debug, Clone)]
pub struct FileSink {
    clipboard: Option<PathBuf>,
    format: ImageFormat,
    jpeg_quality: u8,
}

impl FileSink {
    pub fn new(format: ImageFormat, jpeg_quality: u8) -> Self {
        Self {
            clipboard: None,
            format,
            jpeg_quality,
        }
    }

    /// Write clipboard hand-offs to this PNG file
    pub fn with_clipboard_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.clipboard = Some(path.into());
        self
    }
}

impl ImageSink for FileSink {
    fn set_clipboard_image(&mut self, image: &RgbaImage) -> Result<()> {
        let Some(path) = &self.clipboard else {
            bail!("No clipboard available");
        };
        export::save_image(image, path, ImageFormat::Png, self.jpeg_quality)
            .context("Failed to write clipboard image")
    }

    fn save_image(&mut self, image: &RgbaImage, path: &Path) -> Result<()> {
        export::save_image(image, path, self.format, self.jpeg_quality)
            .with_context(|| format!("Failed to save {}", path.display()))
    }
}
