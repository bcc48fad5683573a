//! Annotation rendering module
//!
//! This module contains:
//! - Geometry calculations and constants shared by every layer
//! - Per-shape rasterization using tiny-skia
//! - Font loading and text rasterization
//! - The layered frame renderer and the magnifier
//! - Export composition and encoding

pub mod export;
pub mod frame;
pub mod geometry;
pub mod image;
pub mod magnifier;
pub mod text;
