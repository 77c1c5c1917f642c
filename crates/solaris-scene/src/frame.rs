//! Fixed stage order of one main-scene frame.

use crate::session::FrameTime;

/// The stages of a main-scene frame, implemented by the host renderer.
pub trait FrameStages {
    fn update_kinematics(&mut self, time: &FrameTime);
    fn update_labels(&mut self);
    fn set_sun_visible(&mut self, visible: bool);
    /// Render the turbulence sphere into all six cube faces.
    fn capture_sun_surface(&mut self);
    /// Point the sun surface at the freshly captured cube.
    fn bind_turbulence(&mut self);
    fn advance_sun_time(&mut self, delta: f32);
    fn render_main(&mut self);
}

/// Run every stage once, in order. The capture always completes with the sun
/// hidden and before the main render.
pub fn run_frame<S: FrameStages + ?Sized>(stages: &mut S, time: &FrameTime) {
    stages.update_kinematics(time);
    stages.update_labels();
    stages.set_sun_visible(false);
    stages.capture_sun_surface();
    stages.set_sun_visible(true);
    stages.bind_turbulence();
    stages.advance_sun_time(time.delta);
    stages.render_main();
}
