//! Capture session
//!
//! This module contains:
//! - Message types flowing into and out of a session
//! - Interaction mode and tool settings
//! - Keyboard shortcut mapping
//! - The session controller that owns all mutable state

pub mod controller;
pub mod messages;
pub mod shortcuts;
pub mod state;

pub use controller::{CaptureSession, Host};
pub use messages::{ExportTarget, Msg, SessionEvent};
