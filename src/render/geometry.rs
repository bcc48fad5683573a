//! Shared geometry calculations for annotations
//!
//! This module contains constants and math shared between the
//! tool state machine, the frame renderer and the export composer.

/// Arrow geometry constants
pub mod arrow {
    /// Arrowhead angle from shaft in radians (30 degrees)
    pub const HEAD_ANGLE: f32 = std::f32::consts::FRAC_PI_6;
    /// Minimum arrow length before a head is drawn
    pub const MIN_LENGTH: f32 = 2.0;

    /// Arrowhead length for a given stroke width
    pub fn head_size(stroke_width: f32) -> f32 {
        (stroke_width * 4.0).max(10.0)
    }

    /// Calculate arrow head points given start, end, and head size
    /// Returns (head1_x, head1_y, head2_x, head2_y) for the two barbs
    pub fn head_points(
        start_x: f32,
        start_y: f32,
        end_x: f32,
        end_y: f32,
        head_size: f32,
    ) -> Option<(f32, f32, f32, f32)> {
        let dx = end_x - start_x;
        let dy = end_y - start_y;
        let length = (dx * dx + dy * dy).sqrt();
        if length < MIN_LENGTH {
            return None;
        }

        // Angle pointing back from the tip towards the start
        let back = (-dy).atan2(-dx);
        let (s1, c1) = (back + HEAD_ANGLE).sin_cos();
        let (s2, c2) = (back - HEAD_ANGLE).sin_cos();

        Some((
            end_x + c1 * head_size,
            end_y + s1 * head_size,
            end_x + c2 * head_size,
            end_y + s2 * head_size,
        ))
    }
}

/// Tool sizing derived from the current stroke width
pub mod tool {
    /// Base radius of a number marker
    pub const NUMBER_BASE_RADIUS: f32 = 16.0;
    /// Radius added per stroke pixel
    pub const NUMBER_RADIUS_SCALE: f32 = 2.0;
    /// Base mosaic block size
    pub const MOSAIC_BASE_BLOCK: f32 = 8.0;
    /// Base blur radius
    pub const BLUR_BASE_RADIUS: f32 = 4.0;
    /// Highlight fill alpha (0-255)
    pub const HIGHLIGHT_ALPHA: u8 = 100;

    pub fn number_radius(stroke_width: f32) -> i32 {
        (NUMBER_BASE_RADIUS + stroke_width * NUMBER_RADIUS_SCALE).round() as i32
    }

    pub fn mosaic_block(stroke_width: f32) -> u32 {
        (MOSAIC_BASE_BLOCK + stroke_width).round().max(1.0) as u32
    }

    pub fn blur_radius(stroke_width: f32) -> u32 {
        (BLUR_BASE_RADIUS + stroke_width).round().max(1.0) as u32
    }
}

/// Overlay chrome constants
pub mod overlay {
    /// Dimming layer alpha (black)
    pub const DIM_ALPHA: u8 = 120;
    /// Selection border width
    pub const SELECTION_BORDER: f32 = 1.0;
    /// Dash pattern of the selection border
    pub const SELECTION_DASH: [f32; 2] = [4.0, 4.0];
    /// Hovered window border width
    pub const HOVER_BORDER: f32 = 2.0;
    /// Dimension label background alpha (black)
    pub const LABEL_ALPHA: u8 = 180;
    /// Gap between the dimension label and the selection edge
    pub const LABEL_GAP: i32 = 5;
    /// Dimension label font size
    pub const LABEL_FONT_SIZE: f32 = 12.0;
    /// Padding around the dimension label text
    pub const LABEL_PADDING: i32 = 3;
}

/// Magnifier constants
pub mod magnifier {
    /// Zoom factor of the magnified view
    pub const ZOOM: i32 = 2;
    /// Side length of the square panel
    pub const SIZE: i32 = 150;
    /// Distance between the pointer and the panel
    pub const OFFSET: i32 = 20;
    /// Crosshair arm length
    pub const CROSSHAIR: f32 = 10.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_head_is_behind_the_tip() {
        let (x1, y1, x2, y2) = arrow::head_points(0.0, 0.0, 100.0, 0.0, 10.0).unwrap();
        assert!(x1 < 100.0 && x2 < 100.0);
        assert!((y1 + y2).abs() < 1e-3);
        assert!((y1 - y2).abs() > 1.0);
    }

    #[test]
    fn short_arrow_has_no_head() {
        assert!(arrow::head_points(5.0, 5.0, 5.5, 5.0, 10.0).is_none());
    }

    #[test]
    fn tool_sizes_follow_stroke() {
        assert_eq!(tool::number_radius(3.0), 22);
        assert_eq!(tool::mosaic_block(3.0), 11);
        assert_eq!(tool::blur_radius(1.0), 5);
    }
}
