//! Layered frame renderer
//!
//! Produces the full-screen overlay image from session state. Rendering never
//! mutates the session; every input is borrowed for the duration of one frame.
//!
//! Layers, bottom to top:
//! 1. capture
//! 2. dimming outside the selection
//! 3. selection border and dimension label
//! 4. hovered window border (only with no selection and no drag)
//! 5. committed shapes
//! 6. in-progress shape
//! 7. magnifier (only with no selection)

use tiny_skia::{IntSize, Pixmap, StrokeDash};

use super::geometry::overlay::{
    DIM_ALPHA, HOVER_BORDER, LABEL_ALPHA, LABEL_FONT_SIZE, LABEL_GAP, LABEL_PADDING,
    SELECTION_BORDER, SELECTION_DASH,
};
use super::image::{Canvas, rect_path};
use super::magnifier;
use super::text::FontBook;
use crate::capture::CaptureBuffer;
use crate::domain::{Point, Rect, SelectionState, Shape};

const HOVER_COLOR: [u8; 4] = [0, 255, 255, 255];
const SELECTION_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Everything one frame depends on
#[derive(Clone, Copy, Debug)]
pub struct RenderScene<'a> {
    pub capture: &'a CaptureBuffer,
    pub selection: SelectionState,
    pub shapes: &'a [Shape],
    pub in_progress: Option<&'a Shape>,
    pub hover: Option<Rect>,
    pub magnifier: bool,
    pub pointer: Option<Point>,
}

impl RenderScene<'_> {
    fn selection_rect(&self) -> Option<Rect> {
        match self.selection {
            SelectionState::Empty => None,
            SelectionState::Dragging { rect, .. } | SelectionState::Finalized(rect) => {
                Some(rect).filter(|r| !r.is_empty())
            }
        }
    }
}

/// Render one frame at the capture's size
///
/// Returns `None` only for an empty capture.
pub fn render_frame(scene: &RenderScene<'_>, fonts: &FontBook) -> Option<Pixmap> {
    let capture = scene.capture;
    let size = IntSize::from_wh(capture.width(), capture.height())?;
    // Capture pixels are opaque, so straight RGBA is valid premultiplied data
    let mut pixmap = Pixmap::from_vec(capture.rgba().as_raw().clone(), size)?;

    {
        let mut canvas = Canvas::new(&mut pixmap, Point::default(), fonts);
        let frame = canvas.area();
        let selection = scene.selection_rect();

        draw_dimming(&mut canvas, frame, selection);

        if let Some(sel) = selection {
            draw_selection_chrome(&mut canvas, frame, sel);
        } else if let Some(hover) = scene.hover
            && !matches!(scene.selection, SelectionState::Dragging { .. })
        {
            if let Some(path) = rect_path(hover) {
                canvas.stroke(&path, HOVER_COLOR, HOVER_BORDER);
            }
        }

        for shape in scene.shapes {
            shape.render(&mut canvas);
        }
        if let Some(shape) = scene.in_progress {
            shape.render(&mut canvas);
        }

        if selection.is_none()
            && scene.magnifier
            && let Some(pointer) = scene.pointer
        {
            magnifier::draw(&mut canvas, capture, pointer);
        }
    }

    Some(pixmap)
}

/// Darken everything except the selection
fn draw_dimming(canvas: &mut Canvas<'_>, frame: Rect, selection: Option<Rect>) {
    let dim = [0, 0, 0, DIM_ALPHA];
    let Some(sel) = selection.and_then(|s| s.intersect(frame)) else {
        if let Some(path) = rect_path(frame) {
            canvas.fill(&path, dim);
        }
        return;
    };

    // Four bands around the selection
    let bands = [
        Rect::from_edges(frame.left(), frame.top(), frame.right(), sel.top()),
        Rect::from_edges(frame.left(), sel.bottom(), frame.right(), frame.bottom()),
        Rect::from_edges(frame.left(), sel.top(), sel.left(), sel.bottom()),
        Rect::from_edges(sel.right(), sel.top(), frame.right(), sel.bottom()),
    ];
    for band in bands.into_iter().flatten().filter(|r| !r.is_empty()) {
        if let Some(path) = rect_path(band) {
            canvas.fill(&path, dim);
        }
    }
}

fn draw_selection_chrome(canvas: &mut Canvas<'_>, frame: Rect, sel: Rect) {
    // Half-pixel inset keeps the 1px border on whole pixels
    let mut pb = tiny_skia::PathBuilder::new();
    let (l, t) = (sel.left() as f32 + 0.5, sel.top() as f32 + 0.5);
    let (r, b) = (sel.right() as f32 - 0.5, sel.bottom() as f32 - 0.5);
    pb.move_to(l, t);
    pb.line_to(r, t);
    pb.line_to(r, b);
    pb.line_to(l, b);
    pb.close();
    if let Some(path) = pb.finish() {
        let dashed = StrokeDash::new(SELECTION_DASH.to_vec(), 0.0)
            .and_then(|dash| path.dash(&dash, 1.0))
            .unwrap_or(path);
        canvas.stroke(&dashed, SELECTION_COLOR, SELECTION_BORDER);
    }

    let label = dimension_label(sel);
    let (tw, th) = canvas.fonts().measure(&label, LABEL_FONT_SIZE);
    let padded = (tw as i32 + LABEL_PADDING * 2, th as i32 + LABEL_PADDING * 2);
    let bg = dimension_label_rect(sel, padded, frame);
    if let Some(path) = rect_path(bg) {
        canvas.fill(&path, [0, 0, 0, LABEL_ALPHA]);
    }
    canvas.text(
        &label,
        Point::new(bg.x + LABEL_PADDING, bg.y + LABEL_PADDING),
        LABEL_FONT_SIZE,
        [255, 255, 255, 255],
    );
}

/// Text of the selection size label
pub fn dimension_label(sel: Rect) -> String {
    format!("{} x {}", sel.width, sel.height)
}

/// Placement of the dimension label box
///
/// Right-aligned to the selection, just above its top edge. When that would
/// leave the frame the label moves just inside the top edge, then it is
/// clamped horizontally into the frame.
pub fn dimension_label_rect(sel: Rect, label: (i32, i32), frame: Rect) -> Rect {
    let (w, h) = label;
    let mut y = sel.top() - h - LABEL_GAP;
    if y < frame.top() {
        y = sel.top() + LABEL_GAP;
    }
    let x = (sel.right() - w).min(frame.right() - w).max(frame.left());
    Rect::new(x, y, w, h)
}
