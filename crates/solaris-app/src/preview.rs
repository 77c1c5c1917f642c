//! Isolated detail preview: one spinning planet with an edge glow, in its own
//! window with its own GPU context.

use std::sync::Arc;

use glam::Vec3;
use solaris_config::Config;
use solaris_render::{
    Camera, DepthBuffer, FrameEncoder, RenderContext, RenderPassBuilder, SurfaceError,
    init_render_context_blocking,
};
use solaris_scene::{
    BodyId, CelestialBody, FrameTask, FrameTime, PreviewError, PreviewLauncher,
};
use solaris_space::{AtmosphereRenderer, CameraBinding, PlanetLight, PlanetRenderer};
use tracing::{debug, error, info, warn};
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::scheduler::WinitScheduler;

/// Camera distance in planet radii.
const VIEW_DISTANCE: f32 = 3.2;

/// Key light from the upper right, slightly in front.
const LIGHT_DIRECTION: Vec3 = Vec3::new(1.0, 0.4, 0.8);

pub fn preview_camera(radius: f32, width: u32, height: u32) -> Camera {
    let mut camera = Camera {
        position: Vec3::new(0.0, 0.0, radius * VIEW_DISTANCE),
        near: radius * 0.05,
        far: radius * VIEW_DISTANCE * 4.0,
        ..Camera::default()
    };
    camera.set_aspect_ratio(width as f32, height as f32);
    camera.look_at(Vec3::ZERO);
    camera
}

/// Spin after `delta` seconds at `speed` radians per second, wrapped to one turn.
pub fn advance_spin(spin: f32, speed: f32, delta: f32) -> f32 {
    (spin + speed * delta).rem_euclid(std::f32::consts::TAU)
}

pub struct PreviewScene {
    window: Arc<Window>,
    gpu: RenderContext,
    depth: DepthBuffer,
    camera: Camera,
    camera_binding: CameraBinding,
    planet: PlanetRenderer,
    atmosphere: AtmosphereRenderer,
    body: BodyId,
    name: String,
    radius: f32,
    spin: f32,
    spin_speed: f32,
}

impl PreviewScene {
    pub fn new(
        window: Arc<Window>,
        config: &Config,
        body: &CelestialBody,
    ) -> Result<Self, PreviewError> {
        let gpu = init_render_context_blocking(window.clone(), config.window.vsync)
            .map_err(|e| PreviewError::Render(e.to_string()))?;
        let (width, height) = gpu.size();
        let device = &gpu.device;
        let format = gpu.surface_format;

        let camera_binding = CameraBinding::new(device, "preview-camera");
        let mut planet = PlanetRenderer::new(
            device,
            format,
            &camera_binding.layout,
            PlanetLight::Directional(LIGHT_DIRECTION),
        );
        let texture = config.resolve_texture_path(&body.descriptor.texture_path);
        planet.add_body(device, &gpu.queue, body, &texture);

        let atmosphere = AtmosphereRenderer::new(
            device,
            format,
            &camera_binding.layout,
            config.preview.glow_color,
            config.preview.glow_power,
        );
        let radius = body.descriptor.display_size;
        atmosphere.set_planet(&gpu.queue, Vec3::ZERO, radius);

        let depth = DepthBuffer::new(device, width, height);
        debug!("Preview for {} ready at {}x{}", body.name(), width, height);

        Ok(Self {
            window,
            camera: preview_camera(radius, width, height),
            gpu,
            depth,
            camera_binding,
            planet,
            atmosphere,
            body: body.id,
            name: body.name().to_string(),
            radius,
            spin: 0.0,
            spin_speed: config.preview.spin_speed,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        let (width, height) = self.gpu.size();
        self.depth.resize(&self.gpu.device, width, height);
        self.camera = preview_camera(self.radius, width, height);
    }
}

impl FrameTask for PreviewScene {
    fn frame(&mut self, time: &FrameTime) {
        self.spin = advance_spin(self.spin, self.spin_speed, time.delta);
        let queue = &self.gpu.queue;
        self.planet.set_transform(queue, self.body, Vec3::ZERO, self.spin);
        self.camera_binding.update(queue, &self.camera);

        let surface_texture = match self.gpu.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Lost) => {
                let (width, height) = self.gpu.size();
                self.resize(width, height);
                return;
            }
            Err(e) => {
                warn!("{} preview skipped a frame: {e}", self.name);
                return;
            }
        };

        let mut frame = FrameEncoder::new(&self.gpu.device, &self.gpu.queue, surface_texture);
        let builder = RenderPassBuilder::new()
            .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
            .label("preview-pass");
        if let Some(mut pass) = frame.begin_render_pass(&builder) {
            pass.set_bind_group(0, &self.camera_binding.bind_group, &[]);
            self.planet.render(&mut pass);
            self.atmosphere.render(&mut pass);
        }
        frame.submit();
    }
}

impl Drop for PreviewScene {
    fn drop(&mut self) {
        info!("Preview for {} released", self.name);
    }
}

/// Opens preview windows on the running event loop.
pub struct WinitPreviewLauncher<'a> {
    pub event_loop: &'a ActiveEventLoop,
    pub config: &'a Config,
}

pub fn preview_window_attributes(config: &Config, body: &CelestialBody) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(format!("{} - {}", config.window.title, body.name()))
        .with_inner_size(LogicalSize::new(
            config.preview.width.max(1) as f64,
            config.preview.height.max(1) as f64,
        ))
}

impl PreviewLauncher for WinitPreviewLauncher<'_> {
    type Task = PreviewScene;
    type Scheduler = WinitScheduler;

    fn launch(
        &mut self,
        body: &CelestialBody,
    ) -> Result<(PreviewScene, WinitScheduler), PreviewError> {
        let window = self
            .event_loop
            .create_window(preview_window_attributes(self.config, body))
            .map(Arc::new)
            .map_err(|e| {
                error!("Preview window for {} failed: {e}", body.name());
                PreviewError::Window(e.to_string())
            })?;
        let scene = PreviewScene::new(window.clone(), self.config, body)?;
        Ok((scene, WinitScheduler::new(window)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solaris_scene::{SceneSettings, compose_scene, default_manifest};

    #[test]
    fn test_camera_frames_the_planet() {
        let camera = preview_camera(2.0, 400, 400);
        assert!((camera.position.length() - 2.0 * VIEW_DISTANCE).abs() < 1e-5);
        assert!(camera.forward().dot(Vec3::NEG_Z) > 0.9999);
        assert!(camera.near < camera.position.length() - 2.0 * 1.15);
        assert!(camera.far > camera.position.length() + 2.0 * 1.15);
    }

    #[test]
    fn test_spin_advances_and_wraps() {
        let spin = advance_spin(0.0, 0.5, 2.0);
        assert!((spin - 1.0).abs() < 1e-6);
        let wrapped = advance_spin(6.0, 1.0, 1.0);
        assert!(wrapped >= 0.0 && wrapped < std::f32::consts::TAU);
        assert!((wrapped - (7.0 - std::f32::consts::TAU)).abs() < 1e-5);
        assert_eq!(advance_spin(1.0, 0.4, 0.0), 1.0);
    }

    #[test]
    fn test_window_attributes_name_the_body() {
        let config = Config::default();
        let scene = compose_scene(&default_manifest(), &SceneSettings::default());
        let body = scene.registry.find_by_name("Saturn").unwrap();
        let attributes = preview_window_attributes(&config, body);
        assert_eq!(attributes.title, "Solaris - Saturn");
    }

    #[test]
    fn test_window_size_is_in_logical_pixels() {
        let mut config = Config::default();
        config.preview.width = 500;
        config.preview.height = 0;
        let scene = compose_scene(&default_manifest(), &SceneSettings::default());
        let body = scene.registry.find_by_name("Mars").unwrap();
        let attributes = preview_window_attributes(&config, body);
        assert_eq!(
            attributes.inner_size,
            Some(winit::dpi::Size::Logical(LogicalSize::new(500.0, 1.0)))
        );
    }
}
