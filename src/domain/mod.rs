//! Pure domain types with minimal dependencies
//!
//! This module contains core types used throughout the crate.
//! Types here have no rendering dependencies so that the renderer,
//! the tool state machine and the session can all share them.

pub mod annotation;
pub mod geometry;
pub mod selection;

pub use annotation::*;
pub use geometry::*;
pub use selection::*;
