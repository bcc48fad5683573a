//! Configuration persistence for snapink settings

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::ShapeColor;

/// Stroke widths offered by the toolbar
pub const STROKE_PRESETS: [f32; 4] = [1.0, 3.0, 5.0, 8.0];
/// Widest stroke accepted from any source
pub const MAX_STROKE_WIDTH: f32 = 64.0;

/// Smallest font size reachable with the size buttons
pub const MIN_FONT_SIZE: f32 = 6.0;
/// Largest font size reachable with the size buttons
pub const MAX_FONT_SIZE: f32 = 72.0;
/// Increment applied by a single font size step
pub const FONT_SIZE_STEP: f32 = 2.0;

/// Where to save screenshots
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveLocation {
    #[default]
    Pictures,
    Documents,
    Custom(PathBuf),
}

impl SaveLocation {
    /// Resolve the directory, falling back to the home directory
    pub fn directory(&self) -> PathBuf {
        let dir = match self {
            SaveLocation::Pictures => dirs::picture_dir(),
            SaveLocation::Documents => dirs::document_dir(),
            SaveLocation::Custom(path) => Some(path.clone()),
        };
        dir.or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Encoded format for saved images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// Format implied by a path's extension, if recognized
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Whether to show the magnifier before a selection is made
    pub magnifier_enabled: bool,
    /// Color for new annotations
    pub shape_color: ShapeColor,
    /// Stroke width for new annotations
    pub stroke_width: f32,
    /// Font size for the inline text editor
    pub font_size: f32,
    /// Font family reported to the inline text editor
    pub font_family: String,
    /// TTF/OTF file used to rasterize text (None = search the system font folders)
    pub font_path: Option<PathBuf>,
    /// Where to save screenshots
    pub save_location: SaveLocation,
    /// Format used when the target path has no recognized extension
    pub image_format: ImageFormat,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            magnifier_enabled: true,
            shape_color: ShapeColor::RED,
            stroke_width: 3.0,
            font_size: 12.0,
            font_family: "Sans".to_string(),
            font_path: None,
            save_location: SaveLocation::Pictures,
            image_format: ImageFormat::Png,
            jpeg_quality: 90,
        }
    }
}

impl SnapConfig {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("No config directory available")?;
        Ok(dir.join("snapink").join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(err) => {
                log::warn!("Could not locate config file: {:?}", err);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file, or return defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::read(path) {
            Ok(config) => config.sanitized(),
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        self.font_size = clamp_font_size(self.font_size);
        self.stroke_width = clamp_stroke_width(self.stroke_width);
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self
    }
}

/// Clamp a font size into the supported range
pub fn clamp_font_size(size: f32) -> f32 {
    if size.is_finite() {
        size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    } else {
        SnapConfig::default().font_size
    }
}

/// Clamp a stroke width between the thinnest preset and [`MAX_STROKE_WIDTH`]
///
/// Non-finite or non-positive widths fall back to the default.
pub fn clamp_stroke_width(width: f32) -> f32 {
    if width.is_finite() && width > 0.0 {
        width.clamp(STROKE_PRESETS[0], MAX_STROKE_WIDTH)
    } else {
        SnapConfig::default().stroke_width
    }
}
