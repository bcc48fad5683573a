//! Export composition and image encoding
//!
//! The exported image is the capture cropped to the finalized selection with
//! every shape re-rendered in selection-local coordinates. Dimming, chrome and
//! the magnifier never reach the export.

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use tiny_skia::{IntSize, Pixmap};

use super::image::Canvas;
use super::text::FontBook;
use crate::capture::CaptureBuffer;
use crate::config::{ImageFormat, SaveLocation};
use crate::domain::{Point, Rect, SelectionState, Shape};

/// Errors that can occur while producing or writing an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No finalized selection to export")]
    NoSelection,

    #[error("Selection {0:?} is not inside the captured area")]
    OutsideCapture(Rect),

    #[error("Could not allocate a {0}x{1} image")]
    Allocation(u32, u32),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Build the export bitmap for a finalized selection
pub fn compose_export(
    capture: &CaptureBuffer,
    selection: SelectionState,
    shapes: &[Shape],
    fonts: &FontBook,
) -> Result<RgbaImage, ExportError> {
    let SelectionState::Finalized(rect) = selection else {
        return Err(ExportError::NoSelection);
    };
    if rect.intersect(capture.bounds()) != Some(rect) {
        return Err(ExportError::OutsideCapture(rect));
    }

    let cropped = capture
        .crop(rect)
        .ok_or(ExportError::OutsideCapture(rect))?;
    let (width, height) = cropped.dimensions();
    let mut pixmap = IntSize::from_wh(width, height)
        .and_then(|size| Pixmap::from_vec(cropped.into_raw(), size))
        .ok_or(ExportError::Allocation(width, height))?;

    {
        let mut canvas = Canvas::new(&mut pixmap, Point::new(rect.x, rect.y), fonts);
        for shape in shapes {
            shape.render(&mut canvas);
        }
    }

    let image = RgbaImage::from_raw(width, height, pixmap.take_demultiplied())
        .ok_or(ExportError::Allocation(width, height))?;
    log::info!(
        "Composed export {}x{} with {} shapes",
        width,
        height,
        shapes.len()
    );
    Ok(image)
}

pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

pub fn write_jpeg<W: io::Write>(w: W, image: &RgbaImage, quality: u8) -> Result<(), ExportError> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    JpegEncoder::new_with_quality(w, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(())
}

/// Write the image to `path`, picking the format from its extension
pub fn save_image(
    image: &RgbaImage,
    path: &Path,
    fallback: ImageFormat,
    quality: u8,
) -> Result<(), ExportError> {
    let format = ImageFormat::from_path(path).unwrap_or(fallback);
    let io_err = |source: io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    let writer = BufWriter::new(file);
    match format {
        ImageFormat::Png => write_png(writer, image)?,
        ImageFormat::Jpeg => write_jpeg(writer, image, quality)?,
    }
    log::info!("Saved {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Timestamped file name in the configured save directory
pub fn default_save_path(location: &SaveLocation, format: ImageFormat) -> PathBuf {
    let name = chrono::Local::now()
        .format("Screenshot_%Y-%m-%d_%H-%M-%S")
        .to_string();
    location
        .directory()
        .join(format!("{}.{}", name, format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::image::gradient;
    use crate::domain::{FreehandShape, LineShape, MosaicShape, NumberShape, RectShape, ShapeColor};
    use crate::render::frame::{RenderScene, render_frame};

    fn sample_shapes(capture: &CaptureBuffer) -> Vec<Shape> {
        vec![
            Shape::Mosaic(MosaicShape {
                rect: Rect::new(60, 60, 50, 40),
                block_size: 9,
                source: capture.clone(),
            }),
            Shape::Rectangle(RectShape {
                rect: Rect::new(30, 40, 90, 70),
                color: ShapeColor::GREEN,
                stroke_width: 3.0,
            }),
            Shape::Arrow(LineShape {
                start: Point::new(40, 120),
                end: Point::new(140, 50),
                color: ShapeColor::RED,
                stroke_width: 5.0,
            }),
            Shape::Freehand(FreehandShape {
                points: vec![Point::new(50, 50), Point::new(70, 90), Point::new(110, 80)],
                color: ShapeColor::BLUE,
                stroke_width: 2.0,
            }),
            Shape::Number(NumberShape {
                center: Point::new(100, 100),
                number: 1,
                radius: 22,
                color: ShapeColor::RED,
            }),
        ]
    }

    #[test]
    fn empty_model_exports_capture_region() {
        let capture = gradient(300, 200);
        let sel = Rect::new(0, 0, 100, 100);
        let out = compose_export(
            &capture,
            SelectionState::Finalized(sel),
            &[],
            &FontBook::empty(),
        )
        .unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out, capture.crop(sel).unwrap());
    }

    #[test]
    fn export_matches_screen_inside_selection() {
        let capture = gradient(200, 160);
        let shapes = sample_shapes(&capture);
        let sel = Rect::new(25, 35, 120, 90);
        let fonts = FontBook::empty();

        let scene = RenderScene {
            capture: &capture,
            selection: SelectionState::Finalized(sel),
            shapes: &shapes,
            in_progress: None,
            hover: None,
            magnifier: false,
            pointer: None,
        };
        let frame = render_frame(&scene, &fonts).unwrap();
        let out = compose_export(&capture, SelectionState::Finalized(sel), &shapes, &fonts).unwrap();

        // Skip the one-pixel selection border drawn on screen
        for y in 1..(sel.height - 1) {
            for x in 1..(sel.width - 1) {
                let screen = frame
                    .pixel((x + sel.x) as u32, (y + sel.y) as u32)
                    .unwrap()
                    .demultiply();
                let local = out.get_pixel(x as u32, y as u32);
                assert_eq!(
                    [screen.red(), screen.green(), screen.blue(), screen.alpha()],
                    local.0,
                    "pixel ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn export_requires_finalized_selection() {
        let capture = gradient(10, 10);
        let err = compose_export(&capture, SelectionState::Empty, &[], &FontBook::empty());
        assert!(matches!(err, Err(ExportError::NoSelection)));

        let dragging = SelectionState::Dragging {
            anchor: Point::new(0, 0),
            rect: Rect::new(0, 0, 5, 5),
        };
        let err = compose_export(&capture, dragging, &[], &FontBook::empty());
        assert!(matches!(err, Err(ExportError::NoSelection)));
    }

    #[test]
    fn export_rejects_selection_outside_capture() {
        let capture = gradient(10, 10);
        let sel = SelectionState::Finalized(Rect::new(5, 5, 10, 10));
        let err = compose_export(&capture, sel, &[], &FontBook::empty());
        assert!(matches!(err, Err(ExportError::OutsideCapture(_))));
    }

    #[test]
    fn png_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots").join("out.png");
        let image = gradient(32, 16).rgba().clone();
        save_image(&image, &path, ImageFormat::Jpeg, 90).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn jpeg_is_chosen_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let image = gradient(16, 16).rgba().clone();
        save_image(&image, &path, ImageFormat::Png, 80).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn default_path_uses_format_extension() {
        let dir = tempfile::tempdir().unwrap();
        let location = SaveLocation::Custom(dir.path().to_path_buf());
        let path = default_save_path(&location, ImageFormat::Jpeg);
        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("Screenshot_") && name.ends_with(".jpg"));
    }
}
