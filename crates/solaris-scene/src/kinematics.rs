//! Orbital positions and planetary spin.
//!
//! Positions are a pure function of session time. Spin is the one piece of
//! integrated state: it advances by a fixed step every frame.

use glam::Vec3;

use crate::registry::SolarScene;
use crate::session::FrameTime;

const SECONDS_PER_HOUR: f32 = 3600.0;

/// Point on the circular orbit at time `t`, in the XZ plane.
pub fn orbital_position(orbit_radius: f32, angular_speed: f32, t: f32) -> Vec3 {
    let angle = t * angular_speed;
    Vec3::new(orbit_radius * angle.cos(), 0.0, orbit_radius * angle.sin())
}

/// Spin increment per frame for a day of `rotation_period_hours`.
///
/// Periods shorter than `min_period_hours` (including zero, negative and NaN)
/// are clamped to it.
pub fn spin_rate_per_frame(
    rotation_period_hours: f32,
    speedup: f32,
    min_period_hours: f32,
) -> f32 {
    let floor = min_period_hours.max(f32::EPSILON);
    let hours = if rotation_period_hours.is_finite() {
        rotation_period_hours.max(floor)
    } else {
        floor
    };
    std::f32::consts::TAU / (hours * SECONDS_PER_HOUR) * speedup
}

/// Process-wide animation state read by every per-frame update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationState {
    /// Seconds since the session started, read once per frame.
    pub elapsed: f32,
    /// Shared clock of the noise sphere and the sun surface.
    pub sun_time: f32,
    pub frame: u64,
}

impl SimulationState {
    pub fn begin_frame(&mut self, time: &FrameTime) {
        self.elapsed = time.elapsed;
        self.frame = time.frame;
    }

    pub fn advance_sun(&mut self, delta: f32, time_scale: f32) {
        self.sun_time += delta * time_scale;
    }
}

/// Place every body on its orbit for this frame and advance its spin.
pub fn update_bodies(
    scene: &mut SolarScene,
    state: &SimulationState,
    speedup: f32,
    min_period_hours: f32,
) {
    for body in scene.registry.iter_mut() {
        let d = &body.descriptor;
        let position = orbital_position(d.orbit_radius, d.angular_speed, state.elapsed);
        body.spin_angle = (body.spin_angle
            + spin_rate_per_frame(d.rotation_period_hours, speedup, min_period_hours))
            % std::f32::consts::TAU;

        if let Some(node) = scene.graph.get_mut(body.node) {
            node.translation = position;
            node.spin = body.spin_angle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::default_manifest;
    use crate::registry::{SceneSettings, compose_scene};
    use std::f32::consts::{FRAC_PI_2, TAU};

    #[test]
    fn test_position_at_time_zero() {
        assert_eq!(orbital_position(30.0, 4.0, 0.0), Vec3::new(30.0, 0.0, 0.0));
    }

    #[test]
    fn test_position_at_quarter_turn() {
        let t = FRAC_PI_2 / 4.0;
        let p = orbital_position(30.0, 4.0, t);
        assert!(p.x.abs() < 1e-4, "x should be ~0, got {}", p.x);
        assert_eq!(p.y, 0.0);
        assert!((p.z - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_position_is_idempotent() {
        for t in [0.0, 1.5, 123.456, 9_999.0] {
            let a = orbital_position(62.0, 0.25, t);
            let b = orbital_position(62.0, 0.25, t);
            assert_eq!(a.to_array().map(f32::to_bits), b.to_array().map(f32::to_bits));
        }
    }

    #[test]
    fn test_update_bodies_does_not_drift() {
        let mut scene = compose_scene(&default_manifest(), &SceneSettings::default());
        let state = SimulationState {
            elapsed: 42.0,
            ..Default::default()
        };
        update_bodies(&mut scene, &state, 500.0, 0.1);
        let first: Vec<Vec3> = scene
            .registry
            .iter()
            .map(|b| scene.graph.world_translation(b.node))
            .collect();
        for _ in 0..100 {
            update_bodies(&mut scene, &state, 500.0, 0.1);
        }
        let later: Vec<Vec3> = scene
            .registry
            .iter()
            .map(|b| scene.graph.world_translation(b.node))
            .collect();
        assert_eq!(first, later);
    }

    #[test]
    fn test_spin_accumulates_per_frame() {
        let mut scene = compose_scene(&default_manifest(), &SceneSettings::default());
        let state = SimulationState::default();
        let earth = scene.registry.find_by_name("Earth").unwrap().id;
        let rate = spin_rate_per_frame(24.0, 500.0, 0.1);

        update_bodies(&mut scene, &state, 500.0, 0.1);
        update_bodies(&mut scene, &state, 500.0, 0.1);
        let body = scene.registry.get(earth).unwrap();
        assert!((body.spin_angle - 2.0 * rate).abs() < 1e-6);
        assert_eq!(scene.graph.get(body.node).unwrap().spin, body.spin_angle);
    }

    #[test]
    fn test_spin_rate_formula() {
        let rate = spin_rate_per_frame(24.0, 1.0, 0.1);
        assert!((rate - TAU / 86_400.0).abs() < 1e-9);
        // Shorter days spin faster.
        assert!(spin_rate_per_frame(9.9, 500.0, 0.1) > spin_rate_per_frame(24.0, 500.0, 0.1));
    }

    #[test]
    fn test_degenerate_period_is_clamped() {
        let clamped = spin_rate_per_frame(0.1, 500.0, 0.1);
        for hours in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            let rate = spin_rate_per_frame(hours, 500.0, 0.1);
            assert!(rate.is_finite() && rate > 0.0, "{hours} gave {rate}");
            assert_eq!(rate, clamped);
        }
        assert!(spin_rate_per_frame(0.0, 500.0, 0.0).is_finite());
    }

    #[test]
    fn test_sun_time_advances_with_scale() {
        let mut state = SimulationState::default();
        state.advance_sun(0.5, 2.0);
        state.advance_sun(0.25, 2.0);
        assert!((state.sun_time - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_begin_frame_copies_clock() {
        let mut state = SimulationState::default();
        state.begin_frame(&FrameTime {
            elapsed: 3.0,
            delta: 0.016,
            frame: 7,
        });
        assert_eq!(state.elapsed, 3.0);
        assert_eq!(state.frame, 7);
    }
}
