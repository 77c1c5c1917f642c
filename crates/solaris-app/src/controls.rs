//! Orbit camera controller: drag to orbit the origin, wheel to zoom.

use glam::{Vec2, Vec3};
use solaris_config::CameraConfig;
use solaris_render::Camera;
use winit::event::MouseScrollDelta;

/// Keeps the eye off the poles, where the look-at basis degenerates.
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Trackpad pixels per wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    start: Vec2,
    last: Vec2,
}

/// Spherical camera around a fixed look-at target at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    /// Horizontal angle in radians. 0 places the eye on +Z.
    pub yaw: f32,
    /// Elevation above the orbital plane in radians.
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub orbit_sensitivity: f32,
    pub zoom_sensitivity: f32,
    /// Press/release travel (pixels) below which a drag counts as a click.
    pub click_drag_threshold: f32,
    cursor: Vec2,
    drag: Option<Drag>,
}

impl OrbitControls {
    pub fn from_config(config: &CameraConfig) -> Self {
        let min_distance = config.min_distance.max(0.0);
        let max_distance = config.max_distance.max(min_distance);
        Self {
            yaw: 0.0,
            pitch: config
                .start_pitch_degrees
                .to_radians()
                .clamp(-PITCH_LIMIT, PITCH_LIMIT),
            distance: config.start_distance.clamp(min_distance, max_distance),
            min_distance,
            max_distance,
            orbit_sensitivity: config.orbit_sensitivity,
            zoom_sensitivity: config.zoom_sensitivity,
            click_drag_threshold: config.click_drag_threshold,
            cursor: Vec2::ZERO,
            drag: None,
        }
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Track the pointer; orbits while the button is held. Returns whether
    /// the camera moved.
    pub fn cursor_moved(&mut self, position: Vec2) -> bool {
        self.cursor = position;
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let delta = position - drag.last;
        drag.last = position;
        if delta == Vec2::ZERO {
            return false;
        }
        self.yaw -= delta.x * self.orbit_sensitivity;
        self.pitch = (self.pitch + delta.y * self.orbit_sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        true
    }

    pub fn button_pressed(&mut self) {
        self.drag = Some(Drag {
            start: self.cursor,
            last: self.cursor,
        });
    }

    /// End the drag. Returns the pointer position when the gesture was a
    /// click rather than an orbit.
    pub fn button_released(&mut self) -> Option<Vec2> {
        let drag = self.drag.take()?;
        (drag.start.distance(self.cursor) < self.click_drag_threshold).then_some(self.cursor)
    }

    /// Positive `lines` zoom in.
    pub fn zoom(&mut self, lines: f32) -> bool {
        let distance = (self.distance - lines * self.zoom_sensitivity)
            .clamp(self.min_distance, self.max_distance);
        let changed = distance != self.distance;
        self.distance = distance;
        changed
    }

    pub fn eye_position(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(
            self.distance * cos_pitch * sin_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * cos_yaw,
        )
    }

    /// Place `camera` on the orbit, facing the origin.
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.eye_position();
        camera.look_at(Vec3::ZERO);
    }
}

/// Wheel delta in lines, positive when scrolling away from the user.
pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
    }
}
