//! Annotation types for drawing on a capture
//!
//! All shape geometry is stored in session (screen) coordinates. Export shifts
//! it into selection-local coordinates at render time, never by mutating shapes.

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect};
use crate::capture::CaptureBuffer;

/// Serializable color representation for shapes and config storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for ShapeColor {
    fn default() -> Self {
        Self::RED
    }
}

impl ShapeColor {
    pub const RED: ShapeColor = ShapeColor::new(1.0, 0.0, 0.0);
    pub const GREEN: ShapeColor = ShapeColor::new(0.0, 0.8, 0.0);
    pub const BLUE: ShapeColor = ShapeColor::new(0.0, 0.4, 1.0);
    pub const YELLOW: ShapeColor = ShapeColor::new(1.0, 1.0, 0.0);
    pub const WHITE: ShapeColor = ShapeColor::new(1.0, 1.0, 1.0);
    pub const BLACK: ShapeColor = ShapeColor::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ]
    }
}

/// Font descriptor reported by the inline text editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Family name as shown by the editor (e.g. "Sans")
    pub family: String,
    /// Font size in pixels
    pub size: f32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

/// Annotation tool selected in the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    /// Pointer mode: clicks pick and move existing text
    #[default]
    None,
    Pen,
    Line,
    Arrow,
    Rectangle,
    Text,
    Highlight,
    Blur,
    Number,
    Mosaic,
}

/// Freehand stroke through the traced pointer positions
#[derive(Clone, Debug, PartialEq)]
pub struct FreehandShape {
    pub points: Vec<Point>,
    pub color: ShapeColor,
    pub stroke_width: f32,
}

/// Two-point segment, shared by plain lines and arrows
#[derive(Clone, Debug, PartialEq)]
pub struct LineShape {
    pub start: Point,
    pub end: Point,
    pub color: ShapeColor,
    pub stroke_width: f32,
}

/// Rectangle outline or highlight fill
#[derive(Clone, Debug, PartialEq)]
pub struct RectShape {
    /// Always normalized
    pub rect: Rect,
    pub color: ShapeColor,
    pub stroke_width: f32,
}

/// Box blur of the capture underneath the rectangle
#[derive(Clone, Debug, PartialEq)]
pub struct BlurShape {
    pub rect: Rect,
    /// Blur radius in pixels
    pub radius: u32,
    /// Read-only pixel source
    pub source: CaptureBuffer,
}

/// Pixelation of the capture underneath the rectangle
#[derive(Clone, Debug, PartialEq)]
pub struct MosaicShape {
    pub rect: Rect,
    /// Block size for this pixelation
    pub block_size: u32,
    /// Read-only pixel source
    pub source: CaptureBuffer,
}

/// Committed text annotation
#[derive(Clone, Debug, PartialEq)]
pub struct TextShape {
    /// Top-left corner of the text box
    pub anchor: Point,
    pub text: String,
    pub font: FontSpec,
    /// Measured size (width, height) in pixels
    pub size: (u32, u32),
    pub color: ShapeColor,
}

/// Numbered step marker
#[derive(Clone, Debug, PartialEq)]
pub struct NumberShape {
    pub center: Point,
    pub number: u32,
    pub radius: i32,
    pub color: ShapeColor,
}

/// Unified annotation type for ordered drawing and undo
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Freehand(FreehandShape),
    Line(LineShape),
    Arrow(LineShape),
    Rectangle(RectShape),
    Highlight(RectShape),
    Blur(BlurShape),
    Mosaic(MosaicShape),
    Text(TextShape),
    Number(NumberShape),
}

impl Shape {
    /// Axis-aligned bounds in session coordinates
    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Freehand(f) => Rect::bounding(&f.points)
                .map(|r| r.inflate(stroke_padding(f.stroke_width)))
                .unwrap_or_default(),
            Shape::Line(l) | Shape::Arrow(l) => {
                Rect::from_points(l.start, l.end).inflate(stroke_padding(l.stroke_width))
            }
            Shape::Rectangle(r) | Shape::Highlight(r) => r.rect,
            Shape::Blur(b) => b.rect,
            Shape::Mosaic(m) => m.rect,
            Shape::Text(t) => Rect::new(
                t.anchor.x,
                t.anchor.y,
                t.size.0 as i32,
                t.size.1 as i32,
            ),
            Shape::Number(n) => Rect::new(
                n.center.x - n.radius,
                n.center.y - n.radius,
                n.radius * 2,
                n.radius * 2,
            ),
        }
    }

    /// Only text annotations can be dragged around after commit
    pub fn is_movable(&self) -> bool {
        matches!(self, Shape::Text(_))
    }

    /// Replace the rectangle of a rectangle-family shape
    ///
    /// Returns false for shapes that are not rectangle based.
    pub fn set_rect(&mut self, rect: Rect) -> bool {
        match self {
            Shape::Rectangle(r) | Shape::Highlight(r) => r.rect = rect,
            Shape::Blur(b) => b.rect = rect,
            Shape::Mosaic(m) => m.rect = rect,
            _ => return false,
        }
        true
    }

    /// Anchor used for drag offsets, for movable shapes
    pub fn anchor(&self) -> Option<Point> {
        match self {
            Shape::Text(t) => Some(t.anchor),
            _ => None,
        }
    }

    /// Move a movable shape so its anchor sits at `anchor`
    pub fn set_anchor(&mut self, anchor: Point) -> bool {
        match self {
            Shape::Text(t) => {
                t.anchor = anchor;
                true
            }
            _ => false,
        }
    }
}

fn stroke_padding(stroke_width: f32) -> i32 {
    ((stroke_width / 2.0).ceil() as i32).max(1)
}

/// Ordered shape list: insertion order is paint order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeModel {
    shapes: Vec<Shape>,
}

impl ShapeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed shape on top of everything else
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Remove the most recently appended shape; no-op when empty
    pub fn undo(&mut self) -> Option<Shape> {
        self.shapes.pop()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Shape> {
        self.shapes.get_mut(index)
    }

    /// Move the shape at `index` to the top of the paint order
    ///
    /// Returns the shape's new index.
    pub fn bring_to_front(&mut self, index: usize) -> Option<usize> {
        if index >= self.shapes.len() {
            return None;
        }
        let shape = self.shapes.remove(index);
        self.shapes.push(shape);
        Some(self.shapes.len() - 1)
    }
}
