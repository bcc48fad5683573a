//! Region capture and annotation session core

pub mod annotations;
pub mod capture;
pub mod config;
pub mod domain;
pub mod host;
pub mod render;
pub mod session;
