//! Magnified preview of the capture around the pointer

use tiny_skia::PathBuilder;

use super::geometry::magnifier::{CROSSHAIR, OFFSET, SIZE, ZOOM};
use super::image::{Canvas, rect_path};
use crate::capture::CaptureBuffer;
use crate::domain::{Point, Rect};

const CROSSHAIR_COLOR: [u8; 4] = [255, 0, 0, 255];
const BORDER_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Capture region shown in the magnifier, centered on the pointer
pub fn source_rect(pointer: Point) -> Rect {
    let span = SIZE / ZOOM;
    Rect::new(pointer.x - span / 2, pointer.y - span / 2, span, span)
}

/// Where the magnifier panel goes for a pointer inside `frame`
///
/// The panel sits below-right of the pointer, flips to the other side of
/// the pointer on an axis where it would overflow, and is finally clamped
/// so it never leaves the frame.
pub fn panel_rect(pointer: Point, frame: Rect) -> Rect {
    let place = |p: i32, far_edge: i32| {
        let after = p + OFFSET;
        if after + SIZE > far_edge {
            p - SIZE - OFFSET
        } else {
            after
        }
    };
    let clamp = |v: i32, near: i32, far: i32| v.min(far - SIZE).max(near);

    let x = clamp(place(pointer.x, frame.right()), frame.left(), frame.right());
    let y = clamp(place(pointer.y, frame.bottom()), frame.top(), frame.bottom());
    Rect::new(x, y, SIZE, SIZE)
}

/// Paint the magnifier panel for `pointer` onto a frame canvas
pub fn draw(canvas: &mut Canvas<'_>, capture: &CaptureBuffer, pointer: Point) {
    let panel = panel_rect(pointer, canvas.area());
    let source = source_rect(pointer);

    for py in 0..SIZE {
        for px in 0..SIZE {
            let pixel = capture.sample_clamped(source.x + px / ZOOM, source.y + py / ZOOM);
            canvas.put(panel.x + px, panel.y + py, [pixel[0], pixel[1], pixel[2]]);
        }
    }

    let cx = (panel.x + SIZE / 2) as f32;
    let cy = (panel.y + SIZE / 2) as f32;
    let mut pb = PathBuilder::new();
    pb.move_to(cx - CROSSHAIR, cy);
    pb.line_to(cx + CROSSHAIR, cy);
    pb.move_to(cx, cy - CROSSHAIR);
    pb.line_to(cx, cy + CROSSHAIR);
    if let Some(path) = pb.finish() {
        canvas.stroke(&path, CROSSHAIR_COLOR, 1.0);
    }

    if let Some(border) = rect_path(panel) {
        canvas.stroke(&border, BORDER_COLOR, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Rect = Rect::new(0, 0, 1920, 1080);

    #[test]
    fn panel_sits_below_right_of_pointer() {
        assert_eq!(
            panel_rect(Point::new(100, 100), FRAME),
            Rect::new(120, 120, SIZE, SIZE)
        );
    }

    #[test]
    fn panel_flips_near_far_edges() {
        let panel = panel_rect(Point::new(1900, 1070), FRAME);
        assert_eq!(panel, Rect::new(1900 - SIZE - OFFSET, 1070 - SIZE - OFFSET, SIZE, SIZE));
    }

    #[test]
    fn panel_never_leaves_frame() {
        let small = Rect::new(0, 0, 200, 160);
        for pointer in [
            Point::new(0, 0),
            Point::new(199, 159),
            Point::new(100, 80),
            Point::new(60, 150),
        ] {
            let panel = panel_rect(pointer, small);
            assert!(panel.left() >= 0 && panel.top() >= 0, "{pointer:?} -> {panel:?}");
            assert!(panel.right() <= 200 && panel.bottom() <= 160, "{pointer:?} -> {panel:?}");
        }
    }

    #[test]
    fn source_is_centered_on_pointer() {
        let src = source_rect(Point::new(500, 400));
        assert_eq!(src.width, SIZE / ZOOM);
        assert!(src.contains_point(Point::new(500, 400)));
        assert_eq!(src.x, 500 - (SIZE / ZOOM) / 2);
    }
}
