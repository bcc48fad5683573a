//! Message types for a capture session
//!
//! This module contains:
//! - Msg enum with nested sub-enums for organized message handling
//! - SessionEvent enum for notifications back to the surrounding UI

use std::path::PathBuf;

use crate::domain::{FontSpec, Point, Rect, ShapeColor, Tool};

// ============================================================================
// Input Types
// ============================================================================

/// Pointer input in session coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerMsg {
    /// Primary button pressed
    Down(Point),
    /// Pointer moved, with or without a button held
    Move(Point),
    /// Primary button released
    Up(Point),
}

/// Toolbar tool and style messages
#[derive(Debug, Clone, PartialEq)]
pub enum ToolMsg {
    /// Make this tool active
    Set(Tool),
    /// Toolbar button: activate, or return to pointer mode if already active
    Toggle(Tool),
    /// Set annotation color
    SetColor(ShapeColor),
    /// Set annotation stroke width
    SetStrokeWidth(f32),
    /// Step the text font size up (positive) or down (negative)
    StepFontSize(i32),
}

/// Annotation history messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMsg {
    /// Remove the most recent annotation
    Undo,
}

/// Results reported by the inline text editor
#[derive(Debug, Clone, PartialEq)]
pub enum TextMsg {
    /// The user confirmed the edit
    Commit {
        text: String,
        font: FontSpec,
        /// Measured size of the text box in pixels
        size: (u32, u32),
    },
    /// The user dismissed the edit
    Cancel,
}

// ============================================================================
// Capture/Output Types
// ============================================================================

/// Copy, save and close workflow messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureMsg {
    /// Copy the export to the clipboard and close
    Copy,
    /// Save the export (default location when `None`) and close
    Save(Option<PathBuf>),
    /// Close without exporting
    Close,
}

/// Session preference messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsMsg {
    /// Flip the magnifier on or off
    ToggleMagnifier,
    /// Show or hide the magnifier
    SetMagnifier(bool),
}

// ============================================================================
// Main Message Enum
// ============================================================================

/// Single command type flowing from the UI into the session
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Pointer(PointerMsg),
    Tool(ToolMsg),
    Draw(DrawMsg),
    Text(TextMsg),
    Capture(CaptureMsg),
    Settings(SettingsMsg),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl Msg {
    pub fn pointer_down(x: i32, y: i32) -> Self {
        Msg::Pointer(PointerMsg::Down(Point::new(x, y)))
    }
    pub fn pointer_move(x: i32, y: i32) -> Self {
        Msg::Pointer(PointerMsg::Move(Point::new(x, y)))
    }
    pub fn pointer_up(x: i32, y: i32) -> Self {
        Msg::Pointer(PointerMsg::Up(Point::new(x, y)))
    }

    pub fn set_tool(tool: Tool) -> Self {
        Msg::Tool(ToolMsg::Set(tool))
    }
    pub fn toggle_tool(tool: Tool) -> Self {
        Msg::Tool(ToolMsg::Toggle(tool))
    }
    pub fn set_color(color: ShapeColor) -> Self {
        Msg::Tool(ToolMsg::SetColor(color))
    }
    pub fn set_stroke_width(width: f32) -> Self {
        Msg::Tool(ToolMsg::SetStrokeWidth(width))
    }
    pub fn font_size_up() -> Self {
        Msg::Tool(ToolMsg::StepFontSize(1))
    }
    pub fn font_size_down() -> Self {
        Msg::Tool(ToolMsg::StepFontSize(-1))
    }

    pub fn undo() -> Self {
        Msg::Draw(DrawMsg::Undo)
    }

    pub fn text_commit(text: impl Into<String>, font: FontSpec, size: (u32, u32)) -> Self {
        Msg::Text(TextMsg::Commit {
            text: text.into(),
            font,
            size,
        })
    }
    pub fn text_cancel() -> Self {
        Msg::Text(TextMsg::Cancel)
    }

    pub fn copy() -> Self {
        Msg::Capture(CaptureMsg::Copy)
    }
    pub fn save() -> Self {
        Msg::Capture(CaptureMsg::Save(None))
    }
    pub fn save_to(path: impl Into<PathBuf>) -> Self {
        Msg::Capture(CaptureMsg::Save(Some(path.into())))
    }
    pub fn close() -> Self {
        Msg::Capture(CaptureMsg::Close)
    }

    pub fn toggle_magnifier() -> Self {
        Msg::Settings(SettingsMsg::ToggleMagnifier)
    }
}

// ============================================================================
// Outgoing Events
// ============================================================================

/// Where an export was delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Clipboard,
    File(PathBuf),
}

/// Notifications emitted by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Selection locked in; place the toolbar next to it
    SelectionFinalized(Rect),
    /// Number of committed shapes changed (undo enablement)
    ShapeCountChanged(usize),
    /// Export handed off successfully
    Exported(ExportTarget),
    /// Export or hand-off failed; the session stays open
    ExportFailed(String),
    /// Session finished; no further messages are processed
    Closed,
}
