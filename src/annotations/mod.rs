//! Annotation gestures
//!
//! This module provides:
//! - The tool state machine that turns pointer gestures into shapes
//! - Hit-testing and drag relocation of committed text

pub mod handlers;
pub mod mover;

pub use handlers::{Gesture, ToolStateMachine};
pub use mover::{CursorHint, Grab};
