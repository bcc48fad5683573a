//! Shape rasterization using tiny-skia
//!
//! Shapes are stored in session coordinates. A [`Canvas`] carries the
//! session point that maps to its top-left pixel, so the same drawing code
//! serves the full-screen frame (origin 0,0) and the selection-sized export
//! (origin = selection corner). Only integer translations are ever applied,
//! which keeps both renderings pixel-identical.

use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8,
    Stroke, Transform,
};

use super::geometry::{arrow, tool};
use super::text::FontBook;
use crate::capture::CaptureBuffer;
use crate::domain::{
    BlurShape, FreehandShape, LineShape, MosaicShape, NumberShape, Point, Rect, RectShape, Shape,
    TextShape,
};

/// Placeholder stripe width for blur/mosaic regions outside the capture
const HATCH: i32 = 4;

/// A pixmap positioned somewhere in session coordinates
pub struct Canvas<'a> {
    pixmap: &'a mut Pixmap,
    origin: Point,
    fonts: &'a FontBook,
}

impl<'a> Canvas<'a> {
    pub fn new(pixmap: &'a mut Pixmap, origin: Point, fonts: &'a FontBook) -> Self {
        Self {
            pixmap,
            origin,
            fonts,
        }
    }

    /// Session-space rectangle covered by the pixmap
    pub fn area(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.pixmap.width() as i32,
            self.pixmap.height() as i32,
        )
    }

    pub fn fonts(&self) -> &FontBook {
        self.fonts
    }

    fn transform(&self) -> Transform {
        Transform::from_translate(-self.origin.x as f32, -self.origin.y as f32)
    }

    /// Overwrite one session pixel with an opaque color, if it is on the canvas
    pub(crate) fn put(&mut self, x: i32, y: i32, rgb: [u8; 3]) {
        let width = self.pixmap.width() as i32;
        let (dx, dy) = (x - self.origin.x, y - self.origin.y);
        if dx < 0 || dy < 0 || dx >= width || dy >= self.pixmap.height() as i32 {
            return;
        }
        if let Some(color) = PremultipliedColorU8::from_rgba(rgb[0], rgb[1], rgb[2], 255) {
            self.pixmap.pixels_mut()[(dy * width + dx) as usize] = color;
        }
    }

    pub(crate) fn stroke(&mut self, path: &tiny_skia::Path, rgba: [u8; 4], width: f32) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
        paint.anti_alias = true;

        let stroke = Stroke {
            width: width.max(1.0),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        let transform = self.transform();
        self.pixmap.stroke_path(path, &paint, &stroke, transform, None);
    }

    pub(crate) fn fill(&mut self, path: &tiny_skia::Path, rgba: [u8; 4]) {
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
        paint.anti_alias = true;
        let transform = self.transform();
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, None);
    }

    /// Draw text with its top-left corner at a session point
    pub fn text(&mut self, text: &str, at: Point, size: f32, rgba: [u8; 4]) {
        let (x, y) = (
            (at.x - self.origin.x) as f32,
            (at.y - self.origin.y) as f32,
        );
        self.fonts.draw(self.pixmap, text, x, y, size, rgba);
    }
}

impl Shape {
    /// Paint this shape onto the canvas
    pub fn render(&self, canvas: &mut Canvas<'_>) {
        match self {
            Shape::Freehand(f) => draw_freehand(canvas, f),
            Shape::Line(l) => draw_line(canvas, l, false),
            Shape::Arrow(l) => draw_line(canvas, l, true),
            Shape::Rectangle(r) => draw_rect_outline(canvas, r),
            Shape::Highlight(r) => draw_highlight(canvas, r),
            Shape::Blur(b) => draw_blur(canvas, b),
            Shape::Mosaic(m) => draw_mosaic(canvas, m),
            Shape::Text(t) => draw_text(canvas, t),
            Shape::Number(n) => draw_number(canvas, n),
        }
    }
}

fn draw_freehand(canvas: &mut Canvas<'_>, shape: &FreehandShape) {
    let rgba = shape.color.to_rgba_u8();
    let Some((first, rest)) = shape.points.split_first() else {
        return;
    };

    if rest.is_empty() {
        // A click without movement still leaves a dot
        let radius = (shape.stroke_width / 2.0).max(0.5);
        if let Some(dot) = PathBuilder::from_circle(first.x as f32, first.y as f32, radius) {
            canvas.fill(&dot, rgba);
        }
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if let Some(path) = pb.finish() {
        canvas.stroke(&path, rgba, shape.stroke_width);
    }
}

/// Build the shaft and, for arrows, the two barbs at the end point
fn build_line_path(shape: &LineShape, with_head: bool) -> Option<tiny_skia::Path> {
    let (sx, sy) = (shape.start.x as f32, shape.start.y as f32);
    let (ex, ey) = (shape.end.x as f32, shape.end.y as f32);

    let mut pb = PathBuilder::new();
    pb.move_to(sx, sy);
    pb.line_to(ex, ey);

    if with_head
        && let Some((h1x, h1y, h2x, h2y)) =
            arrow::head_points(sx, sy, ex, ey, arrow::head_size(shape.stroke_width))
    {
        pb.move_to(ex, ey);
        pb.line_to(h1x, h1y);
        pb.move_to(ex, ey);
        pb.line_to(h2x, h2y);
    }

    pb.finish()
}

fn draw_line(canvas: &mut Canvas<'_>, shape: &LineShape, with_head: bool) {
    if shape.start == shape.end {
        return;
    }
    if let Some(path) = build_line_path(shape, with_head) {
        canvas.stroke(&path, shape.color.to_rgba_u8(), shape.stroke_width);
    }
}

pub(crate) fn rect_path(rect: Rect) -> Option<tiny_skia::Path> {
    let (x1, y1) = (rect.left() as f32, rect.top() as f32);
    let (x2, y2) = (rect.right() as f32, rect.bottom() as f32);
    let mut pb = PathBuilder::new();
    pb.move_to(x1, y1);
    pb.line_to(x2, y1);
    pb.line_to(x2, y2);
    pb.line_to(x1, y2);
    pb.close();
    pb.finish()
}

fn draw_rect_outline(canvas: &mut Canvas<'_>, shape: &RectShape) {
    if shape.rect.is_empty() {
        return;
    }
    if let Some(path) = rect_path(shape.rect) {
        canvas.stroke(&path, shape.color.to_rgba_u8(), shape.stroke_width);
    }
}

fn draw_highlight(canvas: &mut Canvas<'_>, shape: &RectShape) {
    if shape.rect.is_empty() {
        return;
    }
    let [r, g, b, _] = shape.color.to_rgba_u8();
    if let Some(path) = rect_path(shape.rect) {
        canvas.fill(&path, [r, g, b, tool::HIGHLIGHT_ALPHA]);
    }
}

/// Part of `rect` that lands on the canvas, or `None` when nothing is visible
fn visible_part(canvas: &Canvas<'_>, rect: Rect) -> Option<Rect> {
    if rect.is_empty() {
        return None;
    }
    rect.intersect(canvas.area())
}

/// Striped placeholder for regions with no capture pixels underneath
fn draw_hatch(canvas: &mut Canvas<'_>, area: Rect) {
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            let light = (x + y).rem_euclid(HATCH * 2) < HATCH;
            let v = if light { 160 } else { 96 };
            canvas.put(x, y, [v, v, v]);
        }
    }
}

fn draw_blur(canvas: &mut Canvas<'_>, shape: &BlurShape) {
    let Some(area) = visible_part(canvas, shape.rect) else {
        return;
    };
    let source = &shape.source;
    if shape.rect.intersect(source.bounds()).is_none() {
        draw_hatch(canvas, area);
        return;
    }

    // A window wider than the capture averages the same pixels as one that
    // just covers it
    let span = source.width().max(source.height()) as i32;
    let radius = i32::try_from(shape.radius).unwrap_or(i32::MAX).min(span);
    let Some(region) = area.inflate(radius).intersect(source.bounds()) else {
        draw_hatch(canvas, area);
        return;
    };
    let table = SummedArea::build(source, region);

    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            let (sum, count) = table.sum(x - radius, y - radius, x + radius + 1, y + radius + 1);
            let avg = if count == 0 {
                let [r, g, b, _] = source.sample_clamped(x, y).0;
                [r, g, b]
            } else {
                sum.map(|c| (c / count) as u8)
            };
            canvas.put(x, y, avg);
        }
    }
}

fn draw_mosaic(canvas: &mut Canvas<'_>, shape: &MosaicShape) {
    let Some(area) = visible_part(canvas, shape.rect) else {
        return;
    };
    let source = &shape.source;
    if shape.rect.intersect(source.bounds()).is_none() {
        draw_hatch(canvas, area);
        return;
    }

    // Blocks are laid out from the shape's own corner so the grid does not
    // depend on which canvas it lands on.
    let rect = shape.rect;
    // One block covering the whole rect is the coarsest useful grid
    let block = i32::try_from(shape.block_size)
        .unwrap_or(i32::MAX)
        .clamp(1, rect.width.max(rect.height).max(1));
    let first_col = (area.left() - rect.left()) / block;
    let first_row = (area.top() - rect.top()) / block;

    let mut by = rect.top() + first_row * block;
    while by < area.bottom() {
        let mut bx = rect.left() + first_col * block;
        while bx < area.right() {
            let cell = Rect::new(bx, by, block, block);
            if let Some(cell) = cell.intersect(rect) {
                let avg = average(source, cell);
                if let Some(visible) = cell.intersect(area) {
                    for y in visible.top()..visible.bottom() {
                        for x in visible.left()..visible.right() {
                            canvas.put(x, y, avg);
                        }
                    }
                }
            }
            bx += block;
        }
        by += block;
    }
}

/// Average color of a block, sampling clamped to the capture
fn average(source: &CaptureBuffer, cell: Rect) -> [u8; 3] {
    let mut total = [0_u64; 3];
    let mut count = 0_u64;
    for y in cell.top()..cell.bottom() {
        for x in cell.left()..cell.right() {
            let pixel = source.sample_clamped(x, y);
            total[0] += pixel[0] as u64;
            total[1] += pixel[1] as u64;
            total[2] += pixel[2] as u64;
            count += 1;
        }
    }
    if count == 0 {
        return [0, 0, 0];
    }
    total.map(|c| (c / count) as u8)
}

/// Summed-area table over a region of the capture for constant-time box sums
struct SummedArea {
    area: Rect,
    stride: usize,
    sums: Vec<[u64; 3]>,
}

impl SummedArea {
    fn build(source: &CaptureBuffer, area: Rect) -> Self {
        let w = area.width.max(0) as usize;
        let h = area.height.max(0) as usize;
        let stride = w + 1;
        let mut sums = vec![[0_u64; 3]; stride * (h + 1)];

        for row in 0..h {
            let mut line = [0_u64; 3];
            for col in 0..w {
                let pixel = source.sample_clamped(area.x + col as i32, area.y + row as i32);
                for c in 0..3 {
                    line[c] += pixel[c] as u64;
                }
                let above = sums[row * stride + col + 1];
                sums[(row + 1) * stride + col + 1] =
                    [above[0] + line[0], above[1] + line[1], above[2] + line[2]];
            }
        }

        Self { area, stride, sums }
    }

    /// Sum and pixel count over the half-open session rectangle
    /// [x0, x1) x [y0, y1), restricted to the table's area
    fn sum(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> ([u64; 3], u64) {
        let clamp_x = |x: i32| (x - self.area.x).clamp(0, self.area.width) as usize;
        let clamp_y = |y: i32| (y - self.area.y).clamp(0, self.area.height) as usize;
        let (l, r) = (clamp_x(x0), clamp_x(x1));
        let (t, b) = (clamp_y(y0), clamp_y(y1));
        let at = |row: usize, col: usize| self.sums[row * self.stride + col];
        let (br, tr, bl, tl) = (at(b, r), at(t, r), at(b, l), at(t, l));
        let count = ((r - l) * (b - t)) as u64;
        ([0, 1, 2].map(|c| br[c] + tl[c] - tr[c] - bl[c]), count)
    }
}

fn draw_text(canvas: &mut Canvas<'_>, shape: &TextShape) {
    canvas.text(
        &shape.text,
        shape.anchor,
        shape.font.size,
        shape.color.to_rgba_u8(),
    );
}

fn draw_number(canvas: &mut Canvas<'_>, shape: &NumberShape) {
    let (cx, cy) = (shape.center.x as f32, shape.center.y as f32);
    if let Some(circle) = PathBuilder::from_circle(cx, cy, shape.radius.max(1) as f32) {
        canvas.fill(&circle, shape.color.to_rgba_u8());
    }

    let label = shape.number.to_string();
    let size = shape.radius as f32;
    let (w, h) = canvas.fonts().measure(&label, size);
    let at = Point::new(
        shape.center.x - w as i32 / 2,
        shape.center.y - h as i32 / 2,
    );
    canvas.text(&label, at, size, [255, 255, 255, 255]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::image::gradient;
    use crate::domain::ShapeColor;

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let p = pixmap.pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    fn render_at(shape: &Shape, origin: Point, w: u32, h: u32) -> Pixmap {
        let mut pixmap = Pixmap::new(w, h).unwrap();
        let fonts = FontBook::empty();
        let mut canvas = Canvas::new(&mut pixmap, origin, &fonts);
        shape.render(&mut canvas);
        pixmap
    }

    #[test]
    fn translated_canvas_matches_screen_pixels() {
        let shape = Shape::Arrow(LineShape {
            start: Point::new(30, 30),
            end: Point::new(80, 55),
            color: ShapeColor::RED,
            stroke_width: 3.0,
        });
        let screen = render_at(&shape, Point::new(0, 0), 120, 100);
        let local = render_at(&shape, Point::new(20, 10), 80, 70);
        for y in 0..70 {
            for x in 0..80 {
                assert_eq!(pixel(&local, x, y), pixel(&screen, x + 20, y + 10));
            }
        }
    }

    #[test]
    fn mosaic_blocks_are_uniform() {
        let source = gradient(64, 64);
        let shape = Shape::Mosaic(MosaicShape {
            rect: Rect::new(8, 8, 16, 16),
            block_size: 8,
            source,
        });
        let pixmap = render_at(&shape, Point::new(0, 0), 64, 64);
        let corner = pixel(&pixmap, 8, 8);
        assert_eq!(pixel(&pixmap, 15, 15), corner);
        assert_ne!(pixel(&pixmap, 16, 8), corner);
        assert_eq!(pixel(&pixmap, 7, 7)[3], 0);
        // Average of x and y over 8..16 is 11
        assert_eq!(corner, [11, 11, 23, 255]);
    }

    #[test]
    fn mosaic_grid_is_independent_of_canvas_origin() {
        let shape = Shape::Mosaic(MosaicShape {
            rect: Rect::new(5, 5, 30, 30),
            block_size: 7,
            source: gradient(50, 50),
        });
        let screen = render_at(&shape, Point::new(0, 0), 50, 50);
        let local = render_at(&shape, Point::new(13, 9), 20, 20);
        for y in 0..20 {
            for x in 0..20 {
                assert_eq!(pixel(&local, x, y), pixel(&screen, x + 13, y + 9));
            }
        }
    }

    #[test]
    fn blur_of_flat_region_keeps_color() {
        let source = CaptureBuffer::new(image::RgbaImage::from_pixel(
            40,
            40,
            image::Rgba([90, 120, 30, 255]),
        ));
        let shape = Shape::Blur(BlurShape {
            rect: Rect::new(0, 0, 40, 40),
            radius: 5,
            source,
        });
        let pixmap = render_at(&shape, Point::new(0, 0), 40, 40);
        assert_eq!(pixel(&pixmap, 0, 0), [90, 120, 30, 255]);
        assert_eq!(pixel(&pixmap, 20, 39), [90, 120, 30, 255]);
    }

    #[test]
    fn blur_outside_capture_draws_placeholder() {
        let shape = Shape::Blur(BlurShape {
            rect: Rect::new(100, 100, 10, 10),
            radius: 3,
            source: gradient(50, 50),
        });
        let pixmap = render_at(&shape, Point::new(100, 100), 10, 10);
        assert_eq!(pixel(&pixmap, 0, 0), [160, 160, 160, 255]);
        assert_eq!(pixel(&pixmap, 4, 0), [96, 96, 96, 255]);
    }

    #[test]
    fn highlight_is_translucent() {
        let shape = Shape::Highlight(RectShape {
            rect: Rect::new(2, 2, 6, 6),
            color: ShapeColor::YELLOW,
            stroke_width: 3.0,
        });
        let pixmap = render_at(&shape, Point::new(0, 0), 10, 10);
        assert_eq!(pixel(&pixmap, 4, 4)[3], tool::HIGHLIGHT_ALPHA);
        assert_eq!(pixel(&pixmap, 0, 0)[3], 0);
    }

    #[test]
    fn oversized_blur_and_mosaic_stay_bounded() {
        let source = gradient(40, 30);
        let blur = Shape::Blur(BlurShape {
            rect: Rect::new(5, 5, 10, 10),
            radius: u32::MAX,
            source: source.clone(),
        });
        let pixmap = render_at(&blur, Point::new(0, 0), 40, 30);
        // Every window covers the whole capture, so the area is one flat color
        assert_eq!(pixel(&pixmap, 5, 5), pixel(&pixmap, 14, 14));
        assert_eq!(pixel(&pixmap, 5, 5)[3], 255);

        let mosaic = Shape::Mosaic(MosaicShape {
            rect: Rect::new(8, 8, 16, 16),
            block_size: u32::MAX,
            source,
        });
        let pixmap = render_at(&mosaic, Point::new(0, 0), 40, 30);
        assert_eq!(pixel(&pixmap, 8, 8), pixel(&pixmap, 23, 23));
        // Single block: average over 8..24 on both axes
        assert_eq!(pixel(&pixmap, 8, 8), [15, 15, 31, 255]);
    }

    #[test]
    fn summed_area_sums_only_covered_pixels() {
        let source = gradient(20, 20);
        let table = SummedArea::build(&source, Rect::new(0, 0, 20, 20));
        let (sum, count) = table.sum(-3, -3, 2, 2);
        assert_eq!(count, 4);
        assert_eq!(sum, [2, 2, 4]);
    }

    #[test]
    fn summed_area_matches_direct_sum() {
        let source = gradient(20, 20);
        let table = SummedArea::build(&source, Rect::new(2, 3, 10, 10));
        let (sum, count) = table.sum(4, 5, 7, 8);
        assert_eq!(count, 9);
        let mut expected = [0_u64; 3];
        for y in 5..8 {
            for x in 4..7 {
                let p = source.sample_clamped(x, y);
                for c in 0..3 {
                    expected[c] += p[c] as u64;
                }
            }
        }
        assert_eq!(sum, expected);
    }
}
