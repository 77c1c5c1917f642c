//! Distance-proportional label scaling.
//!
//! A billboard shrinks with distance like any other geometry; scaling it by
//! `distance / k` every frame keeps its apparent size roughly constant.

use glam::{Vec2, Vec3};

use crate::registry::SolarScene;

/// Label font size as a share of the label square's side.
pub const LABEL_FONT_SHARE: f32 = 0.2;

/// Height of one text line as a share of the label square's side.
pub const LABEL_LINE_SHARE: f32 = LABEL_FONT_SHARE * 1.2;

/// Average sans-serif advance in ems.
const AVERAGE_ADVANCE_EM: f32 = 0.6;

/// Share of the label square a one-line `text` covers, before the glyphs have
/// been shaped. The label renderer replaces it with the measured extent.
pub fn estimated_text_extent(text: &str) -> Vec2 {
    let chars = text.trim().chars().count();
    if chars == 0 {
        return Vec2::ZERO;
    }
    let width = chars as f32 * AVERAGE_ADVANCE_EM * LABEL_FONT_SHARE;
    Vec2::new(width.min(1.0), LABEL_LINE_SHARE)
}

/// Label scale for a body at `body_position` seen from `camera_position`.
///
/// `k` must be positive; a non-positive `k` leaves the scale at 1.
pub fn label_scale(body_position: Vec3, camera_position: Vec3, k: f32) -> f32 {
    if k <= 0.0 {
        return 1.0;
    }
    body_position.distance(camera_position) / k
}

/// Rescale every body's label from this frame's body and camera positions.
pub fn update_label_scales(scene: &mut SolarScene, camera_position: Vec3, k: f32) {
    for body in scene.registry.iter() {
        let body_position = scene.graph.world_translation(body.node);
        if let Some(label) = scene.graph.get_mut(body.label) {
            label.scale = label_scale(body_position, camera_position, k);
        }
    }
}
