//! Captured screen pixels
//!
//! This module provides the immutable snapshot every render and export reads from.

pub mod image;

pub use image::CaptureBuffer;
