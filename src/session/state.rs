use crate::config::{FONT_SIZE_STEP, SnapConfig, clamp_font_size, clamp_stroke_width};
use crate::domain::{FontSpec, Point, Shape, ShapeColor};

/// The one interactive mode the session is in
///
/// Only fields relevant to the active mode exist, so a drag can never
/// coexist with a text edit or a move.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    /// Dragging out the capture region
    Selecting,
    /// A shape is in progress; `anchor` is where the gesture began
    Drawing { shape: Shape, anchor: Point },
    /// A committed shape follows the pointer
    Moving { index: usize, offset: Point },
    /// The inline text editor is open at `anchor`
    TextEditing { anchor: Point },
}

impl Interaction {
    pub fn in_progress(&self) -> Option<&Shape> {
        match self {
            Interaction::Drawing { shape, .. } => Some(shape),
            _ => None,
        }
    }

    pub fn is_text_editing(&self) -> bool {
        matches!(self, Interaction::TextEditing { .. })
    }
}

/// Session-wide settings applied to newly created shapes
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSettings {
    pub color: ShapeColor,
    pub stroke_width: f32,
    pub font_size: f32,
    pub font_family: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_config(&SnapConfig::default())
    }
}

impl ToolSettings {
    pub fn from_config(config: &SnapConfig) -> Self {
        Self {
            color: config.shape_color,
            stroke_width: clamp_stroke_width(config.stroke_width),
            font_size: clamp_font_size(config.font_size),
            font_family: config.font_family.clone(),
        }
    }

    pub fn font(&self) -> FontSpec {
        FontSpec::new(self.font_family.clone(), self.font_size)
    }

    /// Step the font size up or down, staying inside the supported range
    pub fn step_font_size(&mut self, steps: i32) -> f32 {
        self.font_size = clamp_font_size(self.font_size + steps as f32 * FONT_SIZE_STEP);
        self.font_size
    }

    /// Write the mutable settings back into a config for persistence
    pub fn apply_to(&self, config: &mut SnapConfig) {
        config.shape_color = self.color;
        config.stroke_width = self.stroke_width;
        config.font_size = self.font_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_steps_are_clamped() {
        let mut settings = ToolSettings::default();
        assert_eq!(settings.step_font_size(1), 14.0);
        assert_eq!(settings.step_font_size(-1), 12.0);
        assert_eq!(settings.step_font_size(-10), 6.0);
        assert_eq!(settings.step_font_size(100), 72.0);
    }

    #[test]
    fn settings_follow_config() {
        let config = SnapConfig {
            shape_color: ShapeColor::GREEN,
            stroke_width: 8.0,
            ..SnapConfig::default()
        };
        let settings = ToolSettings::from_config(&config);
        assert_eq!(settings.color, ShapeColor::GREEN);
        assert_eq!(settings.stroke_width, 8.0);
        assert_eq!(settings.font(), FontSpec::new("Sans", 12.0));
    }
}
