//! Editor configuration.

use serde::Deserialize;

/// Visual and interaction constants for the path editor.
///
/// Lengths are in screen pixels; the editor divides them by the current view
/// scale before comparing against path coordinates, so snapping and picking
/// feel the same at every zoom level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap radius for attaching the cursor to an existing endpoint.
    pub attach_space: f64,
    /// Side length of the drawing cursor marker.
    pub point_size: f64,
    /// Radius of an endpoint marker.
    pub endpoint_radius: f64,
    /// Side length of a control-point marker.
    pub control_point_size: f64,
    /// Radius of the attach indicator shown next to the cursor.
    pub attach_point_radius: f64,
    pub stroke_width: f64,
    /// Points closer than this to the previous point are ignored.
    /// Path units, not scaled.
    pub min_spacing: f64,
    /// Releasing the button farther than this from the last endpoint drags
    /// out a curve handle.
    pub drag_threshold: f64,
    /// Pick radius for pre-highlighting and selecting a segment body.
    pub hover_tolerance: f64,
    pub theme_color: String,
    pub guide_color: String,
    pub stroke_color: String,
    /// Undo depth of `History`.
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            attach_space: 8.0,
            point_size: 12.0,
            endpoint_radius: 2.0,
            control_point_size: 4.0,
            attach_point_radius: 4.0,
            stroke_width: 1.0,
            min_spacing: 1e-6,
            drag_threshold: 2.0,
            hover_tolerance: 6.0,
            theme_color: "#1890ff".to_string(),
            guide_color: "red".to_string(),
            stroke_color: "black".to_string(),
            history_depth: 100,
        }
    }
}

impl EditorConfig {
    /// Half the cursor marker size: the pick radius of an endpoint marker.
    pub fn point_radius(&self) -> f64 {
        self.point_size / 2.0
    }
}
