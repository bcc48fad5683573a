//! Tool state machine
//!
//! Turns pointer gestures into shapes for the active tool. The in-progress
//! shape itself lives in the session's [`Interaction`] so only one can exist.
//!
//! [`Interaction`]: crate::session::state::Interaction

use crate::capture::CaptureBuffer;
use crate::domain::{
    BlurShape, FontSpec, FreehandShape, LineShape, MosaicShape, NumberShape, Point, Rect,
    RectShape, Shape, ShapeColor, TextShape, Tool,
};
use crate::render::geometry::tool;
use crate::session::state::ToolSettings;

/// What a pointer-down produced for the active tool
#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    /// A shape is now in progress and follows the pointer until release
    Drawing(Shape),
    /// A complete shape that goes straight into the model
    Committed(Shape),
    /// The inline text editor should open at this point
    TextEdit(Point),
    /// Pointer mode: the caller should hit-test existing shapes
    Pick,
}

#[derive(Clone, Debug)]
pub struct ToolStateMachine {
    tool: Tool,
    next_number: u32,
    source: CaptureBuffer,
}

impl ToolStateMachine {
    /// Tool machine sampling blur and mosaic pixels from `source`
    pub fn new(source: CaptureBuffer) -> Self {
        Self {
            tool: Tool::None,
            next_number: 1,
            source,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools; returns true when the tool actually changed
    pub fn set_tool(&mut self, tool: Tool) -> bool {
        if self.tool == tool {
            return false;
        }
        log::debug!("Tool changed: {:?} -> {:?}", self.tool, tool);
        self.tool = tool;
        true
    }

    /// Toolbar semantics: picking the active tool again returns to pointer mode
    pub fn toggle_tool(&mut self, tool: Tool) -> Tool {
        let next = if self.tool == tool { Tool::None } else { tool };
        self.set_tool(next);
        next
    }

    /// Label the next number marker will receive
    pub fn next_number(&self) -> u32 {
        self.next_number
    }

    /// Start a gesture at `anchor` with the current settings
    pub fn begin(&mut self, anchor: Point, settings: &ToolSettings) -> Gesture {
        let color = settings.color;
        let stroke_width = settings.stroke_width;
        let empty = Rect::at(anchor);

        match self.tool {
            Tool::None => Gesture::Pick,
            Tool::Text => Gesture::TextEdit(anchor),
            Tool::Number => {
                let number = self.next_number;
                self.next_number += 1;
                Gesture::Committed(Shape::Number(NumberShape {
                    center: anchor,
                    number,
                    radius: tool::number_radius(stroke_width),
                    color,
                }))
            }
            Tool::Pen => Gesture::Drawing(Shape::Freehand(FreehandShape {
                points: vec![anchor],
                color,
                stroke_width,
            })),
            Tool::Line => Gesture::Drawing(Shape::Line(segment(anchor, color, stroke_width))),
            Tool::Arrow => Gesture::Drawing(Shape::Arrow(segment(anchor, color, stroke_width))),
            Tool::Rectangle => Gesture::Drawing(Shape::Rectangle(RectShape {
                rect: empty,
                color,
                stroke_width,
            })),
            Tool::Highlight => Gesture::Drawing(Shape::Highlight(RectShape {
                rect: empty,
                color,
                stroke_width,
            })),
            Tool::Blur => Gesture::Drawing(Shape::Blur(BlurShape {
                rect: empty,
                radius: tool::blur_radius(stroke_width),
                source: self.source.clone(),
            })),
            Tool::Mosaic => Gesture::Drawing(Shape::Mosaic(MosaicShape {
                rect: empty,
                block_size: tool::mosaic_block(stroke_width),
                source: self.source.clone(),
            })),
        }
    }

    /// Follow the pointer with an in-progress shape
    ///
    /// Returns true when the shape changed.
    pub fn update(shape: &mut Shape, anchor: Point, current: Point) -> bool {
        match shape {
            Shape::Freehand(f) => {
                if f.points.last() == Some(&current) {
                    return false;
                }
                f.points.push(current);
                true
            }
            Shape::Line(l) | Shape::Arrow(l) => {
                let changed = l.end != current;
                l.end = current;
                changed
            }
            Shape::Rectangle(_) | Shape::Highlight(_) | Shape::Blur(_) | Shape::Mosaic(_) => {
                let rect = Rect::from_points(anchor, current);
                let changed = shape.bounds() != rect;
                shape.set_rect(rect);
                changed
            }
            Shape::Text(_) | Shape::Number(_) => false,
        }
    }

    /// Build the text shape for a confirmed inline edit
    ///
    /// Whitespace-only text yields `None` and must not reach the model.
    pub fn text_shape(
        anchor: Point,
        text: &str,
        font: FontSpec,
        measured: (u32, u32),
        color: ShapeColor,
    ) -> Option<Shape> {
        if text.trim().is_empty() {
            log::debug!("Empty text edit discarded");
            return None;
        }
        Some(Shape::Text(TextShape {
            anchor,
            text: text.to_string(),
            font,
            size: measured,
            color,
        }))
    }
}

fn segment(anchor: Point, color: ShapeColor, stroke_width: f32) -> LineShape {
    LineShape {
        start: anchor,
        end: anchor,
        color,
        stroke_width,
    }
}
