//! The main orrery view: starfield, sun, planets, orbit guides and labels.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use solaris_config::Config;
use solaris_render::{
    Camera, DepthBuffer, FrameEncoder, RenderContext, RenderPassBuilder, SurfaceError,
    init_render_context_blocking,
};
use solaris_scene::{
    BodyDescriptor, FrameStages, FrameTask, FrameTime, PickHit, SceneSettings, SimulationState,
    SolarScene, compose_scene, pick, run_frame, update_bodies, update_label_scales,
};
use solaris_space::{
    CameraBinding, LabelRasterizer, LabelRenderer, OrbitGuideRenderer, PlanetLight,
    PlanetRenderer, ProceduralSun, SkyboxRenderer, StarfieldCubemap, StarfieldGenerator,
    SunSettings,
};
use tracing::{error, info, instrument, warn};
use winit::window::{Window, WindowId};

use crate::error::AppError;

const NEAR_PLANE: f32 = 0.5;
const FAR_PLANE: f32 = 10_000.0;

/// Per-frame tunables copied out of the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    pub spin_speedup: f32,
    pub min_rotation_period_hours: f32,
    pub label_scale_divisor: f32,
    pub sun_time_scale: f32,
}

impl SimulationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            spin_speedup: config.scene.spin_speedup,
            min_rotation_period_hours: config.scene.min_rotation_period_hours,
            label_scale_divisor: config.scene.label_scale_divisor,
            sun_time_scale: config.sun.time_scale,
        }
    }
}

pub fn scene_settings(config: &Config) -> SceneSettings {
    SceneSettings {
        sun_radius: config.sun.radius,
        orbit_guide_segments: config.scene.orbit_guide_segments,
        ..SceneSettings::default()
    }
}

pub fn main_camera(config: &Config, width: u32, height: u32) -> Camera {
    let mut camera = Camera {
        fov_y: config.camera.fov_degrees.to_radians(),
        near: NEAR_PLANE,
        far: FAR_PLANE,
        ..Camera::default()
    };
    camera.set_aspect_ratio(width as f32, height as f32);
    camera
}

pub struct MainScene {
    window: Arc<Window>,
    gpu: RenderContext,
    depth: DepthBuffer,
    camera: Camera,
    camera_binding: CameraBinding,
    skybox: SkyboxRenderer,
    sun: ProceduralSun,
    planets: PlanetRenderer,
    guides: OrbitGuideRenderer,
    labels: LabelRenderer,
    scene: SolarScene,
    state: SimulationState,
    settings: SimulationSettings,
    out_of_memory: bool,
}

impl MainScene {
    /// Initialise the GPU for `window` and upload every renderer.
    #[instrument(skip_all)]
    pub fn new(
        window: Arc<Window>,
        config: &Config,
        manifest: &[BodyDescriptor],
    ) -> Result<Self, AppError> {
        let gpu = init_render_context_blocking(window.clone(), config.window.vsync)?;
        let (width, height) = gpu.size();
        let device = &gpu.device;
        let queue = &gpu.queue;
        let format = gpu.surface_format;

        let mut scene = compose_scene(manifest, &scene_settings(config));
        let camera_binding = CameraBinding::new(device, "main-camera");
        let layout = &camera_binding.layout;

        let stars =
            StarfieldGenerator::new(config.starfield.seed, config.starfield.star_count).generate();
        let cubemap = StarfieldCubemap::render(&stars, config.starfield.face_size);
        let skybox = SkyboxRenderer::new(device, queue, format, &cubemap);

        let sun = ProceduralSun::new(
            device,
            format,
            layout,
            SunSettings {
                center: scene.graph.world_translation(scene.sun),
                radius: config.sun.radius,
                cube_resolution: config.sun.cube_resolution,
                corona_scale: config.sun.corona_scale,
                noise_octaves: config.sun.noise_octaves,
            },
        );

        let mut planets = PlanetRenderer::new(device, format, layout, PlanetLight::Point(Vec3::ZERO));
        for body in scene.registry.iter() {
            let path = config.resolve_texture_path(&body.descriptor.texture_path);
            planets.add_body(device, queue, body, &path);
        }

        let guides = OrbitGuideRenderer::new(device, format, layout, &scene.guides);
        let mut rasterizer = LabelRasterizer::new(config.scene.label_canvas_size);
        let labels = LabelRenderer::new(device, queue, format, layout, &mut rasterizer, &mut scene);
        let depth = DepthBuffer::new(device, width, height);

        info!(
            "Main scene ready: {} bodies, {} stars, {}x{}",
            planets.len(),
            stars.len(),
            width,
            height
        );

        Ok(Self {
            window,
            camera: main_camera(config, width, height),
            gpu,
            depth,
            camera_binding,
            skybox,
            sun,
            planets,
            guides,
            labels,
            scene,
            state: SimulationState::default(),
            settings: SimulationSettings::from_config(config),
            out_of_memory: false,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn scene(&self) -> &SolarScene {
        &self.scene
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Whether rendering hit an unrecoverable GPU error.
    pub fn out_of_memory(&self) -> bool {
        self.out_of_memory
    }

    /// Match the surface, depth buffer and camera aspect to the window.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        let (width, height) = self.gpu.size();
        self.depth.resize(&self.gpu.device, width, height);
        self.camera.set_aspect_ratio(width as f32, height as f32);
    }

    /// The closest body under the pointer, in normalized device coordinates.
    pub fn pick(&self, ndc: Vec2) -> Option<PickHit> {
        pick(&self.scene.graph, &self.camera.ray_from_ndc(ndc))
    }
}

impl FrameStages for MainScene {
    fn update_kinematics(&mut self, time: &FrameTime) {
        self.state.begin_frame(time);
        update_bodies(
            &mut self.scene,
            &self.state,
            self.settings.spin_speedup,
            self.settings.min_rotation_period_hours,
        );
        self.planets.update_from_scene(&self.gpu.queue, &self.scene);
    }

    fn update_labels(&mut self) {
        update_label_scales(
            &mut self.scene,
            self.camera.position,
            self.settings.label_scale_divisor,
        );
        self.labels.update(&self.gpu.queue, &self.scene);
    }

    fn set_sun_visible(&mut self, visible: bool) {
        self.sun.set_visible(visible);
        self.scene.graph.set_visible(self.scene.sun, visible);
    }

    fn capture_sun_surface(&mut self) {
        self.sun
            .capture(&self.gpu.device, &self.gpu.queue, self.state.sun_time);
    }

    fn bind_turbulence(&mut self) {
        self.sun.bind_turbulence(&self.gpu.device);
    }

    fn advance_sun_time(&mut self, delta: f32) {
        self.state.advance_sun(delta, self.settings.sun_time_scale);
        self.sun.advance_corona(delta);
    }

    fn render_main(&mut self) {
        let queue = &self.gpu.queue;
        self.camera_binding.update(queue, &self.camera);
        self.skybox.update(queue, &self.camera);
        self.sun.update(queue, self.state.sun_time);

        let surface_texture = match self.gpu.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Lost) => {
                let (width, height) = self.gpu.size();
                self.resize(width, height);
                return;
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                self.out_of_memory = true;
                return;
            }
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
                return;
            }
        };

        let mut frame = FrameEncoder::new(&self.gpu.device, &self.gpu.queue, surface_texture);

        // Pass 1: stars at infinity, no depth.
        if let Some(mut pass) = frame.begin_render_pass(&RenderPassBuilder::new().label("skybox-pass"))
        {
            self.skybox.render(&mut pass);
        }

        // Pass 2: the solar system over the stars.
        let scene_pass = RenderPassBuilder::new()
            .load_color()
            .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
            .label("solar-system-pass");
        if let Some(mut pass) = frame.begin_render_pass(&scene_pass) {
            pass.set_bind_group(0, &self.camera_binding.bind_group, &[]);
            self.planets.render(&mut pass);
            self.guides.render(&mut pass);
            self.sun.render(&mut pass);
            self.labels.render(&mut pass);
        }

        frame.submit();
    }
}

impl FrameTask for MainScene {
    fn frame(&mut self, time: &FrameTime) {
        run_frame(self, time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_follows_config() {
        let config = Config::default();
        let camera = main_camera(&config, 1600, 800);
        assert!((camera.fov_y - config.camera.fov_degrees.to_radians()).abs() < 1e-6);
        assert!((camera.aspect_ratio - 2.0).abs() < 1e-6);
        assert!(camera.far > config.camera.max_distance * 2.0);
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = Config::default();
        config.scene.spin_speedup = 42.0;
        config.sun.time_scale = 0.5;
        config.sun.radius = 20.0;
        config.scene.orbit_guide_segments = 64;

        let sim = SimulationSettings::from_config(&config);
        assert_eq!(sim.spin_speedup, 42.0);
        assert_eq!(sim.sun_time_scale, 0.5);
        assert_eq!(sim.label_scale_divisor, config.scene.label_scale_divisor);

        let scene = scene_settings(&config);
        assert_eq!(scene.sun_radius, 20.0);
        assert_eq!(scene.orbit_guide_segments, 64);
    }

    #[test]
    fn test_far_plane_covers_outermost_orbit() {
        let config = Config::default();
        let outermost = solaris_scene::default_manifest()
            .iter()
            .map(|b| b.orbit_radius)
            .fold(0.0_f32, f32::max);
        assert!(config.camera.max_distance + outermost < FAR_PLANE);
    }
}
