//! Screen snapshot taken once at session start

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::domain::{Point, Rect};

/// Immutable RGBA snapshot of the captured screen area
///
/// Cloning is cheap: all clones share the same pixel storage. Pixels are stored
/// fully opaque so they can be handed to tiny-skia as premultiplied data unchanged.
#[derive(Clone, Debug)]
pub struct CaptureBuffer {
    rgba: Arc<RgbaImage>,
}

impl CaptureBuffer {
    /// Wrap a captured image, forcing every pixel opaque
    pub fn new(mut rgba: RgbaImage) -> Self {
        for pixel in rgba.pixels_mut() {
            pixel[3] = 255;
        }
        log::debug!(
            "CaptureBuffer created: {}x{} pixels",
            rgba.width(),
            rgba.height()
        );
        Self {
            rgba: Arc::new(rgba),
        }
    }

    /// Get the width of the image
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    /// Get the height of the image
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    /// Full capture area in session coordinates
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width() as i32, self.height() as i32)
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    /// Pixel at a session coordinate, or `None` outside the capture
    pub fn get(&self, point: Point) -> Option<Rgba<u8>> {
        if point.x < 0 || point.y < 0 {
            return None;
        }
        let (x, y) = (point.x as u32, point.y as u32);
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(*self.rgba.get_pixel(x, y))
    }

    /// Pixel at a coordinate clamped into the capture bounds
    pub fn sample_clamped(&self, x: i32, y: i32) -> Rgba<u8> {
        let cx = x.clamp(0, self.width().saturating_sub(1) as i32) as u32;
        let cy = y.clamp(0, self.height().saturating_sub(1) as i32) as u32;
        *self.rgba.get_pixel(cx, cy)
    }

    /// Copy of the sub-rectangle intersecting the capture, if any
    pub fn crop(&self, rect: Rect) -> Option<RgbaImage> {
        let area = rect.intersect(self.bounds())?;
        Some(
            image::imageops::crop_imm(
                self.rgba.as_ref(),
                area.x as u32,
                area.y as u32,
                area.width as u32,
                area.height as u32,
            )
            .to_image(),
        )
    }

    /// Whether two handles share the same snapshot
    pub fn same_snapshot(&self, other: &CaptureBuffer) -> bool {
        Arc::ptr_eq(&self.rgba, &other.rgba)
    }
}

impl PartialEq for CaptureBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.same_snapshot(other)
    }
}

#[cfg(test)]
pub(crate) fn gradient(width: u32, height: u32) -> CaptureBuffer {
    CaptureBuffer::new(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    }))
}
