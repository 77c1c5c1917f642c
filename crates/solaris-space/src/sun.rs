//! Procedural sun.
//!
//! Every frame a hidden turbulence sphere is rendered into the six faces of
//! an offscreen cube from the sun's center. The visible surface samples that
//! cube by direction, so the animated pattern wraps the sphere without seams.
//! An enlarged back-face shell adds the corona on top.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use solaris_render::{
    CubeCaptureRig, CubeFace, CubeRenderTarget, GpuMesh, RenderPassBuilder, SphereVertex,
    generate_sphere,
};
use wgpu::util::DeviceExt;

use crate::camera_binding::CameraBinding;
use crate::pipeline::{
    ADDITIVE, DepthMode, PipelineSpec, build_pipeline, sampler_entry, shader_module,
    texture_entry, uniform_entry,
};

/// Upper bound on fbm octaves evaluated per fragment.
pub const MAX_NOISE_OCTAVES: u32 = 8;

const CORONA_FRESNEL_POWER: f32 = 2.5;
const SURFACE_INTENSITY: f32 = 1.4;

/// Per-draw parameters of every sun shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SunUniform {
    pub model: [[f32; 4]; 4],
    pub time: f32,
    pub octaves: u32,
    pub fresnel_power: f32,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunSettings {
    pub center: Vec3,
    pub radius: f32,
    pub cube_resolution: u32,
    /// Corona radius relative to `radius`.
    pub corona_scale: f32,
    pub noise_octaves: u32,
}

pub const NOISE_SHADER_SOURCE: &str = r#"
struct SunUniform {
    model: mat4x4<f32>,
    time: f32,
    octaves: u32,
    fresnel_power: f32,
    intensity: f32,
};

@group(1) @binding(0)
var<uniform> sun: SunUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec3<f32>,
};

@vertex
fn vs_noise(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * sun.model * vec4<f32>(in.position, 1.0);
    out.local = in.position;
    return out;
}

fn hash(p: vec3<f32>) -> f32 {
    let q = fract(p * 0.3183099 + vec3<f32>(0.71, 0.113, 0.419)) * 17.0;
    return fract(q.x * q.y * q.z * (q.x + q.y + q.z));
}

fn value_noise(p: vec3<f32>) -> f32 {
    let i = floor(p);
    let f = fract(p);
    let u = f * f * (3.0 - 2.0 * f);
    let x00 = mix(hash(i), hash(i + vec3<f32>(1.0, 0.0, 0.0)), u.x);
    let x10 = mix(hash(i + vec3<f32>(0.0, 1.0, 0.0)), hash(i + vec3<f32>(1.0, 1.0, 0.0)), u.x);
    let x01 = mix(hash(i + vec3<f32>(0.0, 0.0, 1.0)), hash(i + vec3<f32>(1.0, 0.0, 1.0)), u.x);
    let x11 = mix(hash(i + vec3<f32>(0.0, 1.0, 1.0)), hash(i + vec3<f32>(1.0, 1.0, 1.0)), u.x);
    return mix(mix(x00, x10, u.y), mix(x01, x11, u.y), u.z);
}

// Ridged fbm in [0, 1).
fn turbulence(p: vec3<f32>, octaves: u32) -> f32 {
    var sum = 0.0;
    var amplitude = 0.5;
    var frequency = 1.0;
    for (var i = 0u; i < octaves; i = i + 1u) {
        sum += amplitude * abs(value_noise(p * frequency) * 2.0 - 1.0);
        frequency *= 2.0;
        amplitude *= 0.5;
    }
    return sum;
}

@fragment
fn fs_noise(in: VertexOutput) -> @location(0) vec4<f32> {
    let dir = normalize(in.local);
    let t = sun.time;
    let warp = vec3<f32>(
        value_noise(dir * 3.0 + vec3<f32>(t * 0.15, 0.0, 0.0)),
        value_noise(dir * 3.0 + vec3<f32>(7.1, -t * 0.11, 0.0)),
        value_noise(dir * 3.0 + vec3<f32>(3.7, 0.0, t * 0.13)),
    );
    let n = turbulence(dir * 4.0 + warp * 1.5 + vec3<f32>(0.0, t * 0.05, 0.0), sun.octaves);
    return vec4<f32>(n, n * n, 1.0 - n, 1.0);
}

@fragment
fn fs_occluder(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(0.02, 0.01, 0.0, 1.0);
}
"#;

pub const SURFACE_SHADER_SOURCE: &str = r#"
struct SunUniform {
    model: mat4x4<f32>,
    time: f32,
    octaves: u32,
    fresnel_power: f32,
    intensity: f32,
};

@group(1) @binding(0)
var<uniform> sun: SunUniform;
@group(1) @binding(1)
var turbulence: texture_cube<f32>;
@group(1) @binding(2)
var turbulence_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec3<f32>,
    @location(1) world: vec3<f32>,
    @location(2) normal: vec3<f32>,
};

@vertex
fn vs_sun(in: VertexInput) -> VertexOutput {
    let world = sun.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.local = in.position;
    out.world = world.xyz;
    out.normal = normalize((sun.model * vec4<f32>(in.normal, 0.0)).xyz);
    return out;
}

fn ramp(n: f32) -> vec3<f32> {
    let deep = vec3<f32>(0.55, 0.12, 0.0);
    let mid = vec3<f32>(1.0, 0.55, 0.08);
    let hot = vec3<f32>(1.0, 0.95, 0.7);
    return mix(mix(deep, mid, smoothstep(0.1, 0.5, n)), hot, smoothstep(0.5, 0.9, n));
}

@fragment
fn fs_surface(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = textureSample(turbulence, turbulence_sampler, normalize(in.local)).r;
    let view = normalize(camera.position.xyz - in.world);
    let mu = max(dot(normalize(in.normal), view), 0.0);
    let limb = 0.55 + 0.45 * mu;
    let pulse = 0.95 + 0.05 * sin(sun.time * 0.8);
    return vec4<f32>(ramp(n) * limb * pulse * sun.intensity, 1.0);
}

@fragment
fn fs_corona(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = textureSample(turbulence, turbulence_sampler, normalize(in.local)).r;
    let view = normalize(camera.position.xyz - in.world);
    let fresnel = pow(1.0 - abs(dot(normalize(in.normal), view)), sun.fresnel_power);
    let flicker = 0.75 + 0.25 * sin(sun.time * 1.7 + n * 6.2831);
    let glow = vec3<f32>(1.0, 0.6, 0.2) * fresnel * (0.4 + n) * flicker * sun.intensity;
    return vec4<f32>(glow, fresnel);
}
"#;

/// Model matrix of a sphere of `radius` centered at `center`.
pub fn sphere_model(center: Vec3, radius: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::splat(radius), Quat::IDENTITY, center)
}

pub struct ProceduralSun {
    settings: SunSettings,
    mesh: GpuMesh,
    rig: CubeCaptureRig,
    target: CubeRenderTarget,
    face_cameras: Vec<CameraBinding>,
    noise_pipeline: wgpu::RenderPipeline,
    occluder_pipeline: wgpu::RenderPipeline,
    surface_pipeline: wgpu::RenderPipeline,
    corona_pipeline: wgpu::RenderPipeline,
    turbulence_bgl: wgpu::BindGroupLayout,
    noise_uniform: wgpu::Buffer,
    noise_bind_group: wgpu::BindGroup,
    surface_uniform: wgpu::Buffer,
    corona_uniform: wgpu::Buffer,
    surface_bind_group: Option<wgpu::BindGroup>,
    corona_bind_group: Option<wgpu::BindGroup>,
    visible: bool,
    corona_time: f32,
}

impl ProceduralSun {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        settings: SunSettings,
    ) -> Self {
        let mesh = GpuMesh::from_sphere(device, "sun-sphere", &generate_sphere(4));
        let rig = CubeCaptureRig::new(
            settings.center,
            settings.radius * 0.05,
            settings.radius * 4.0,
        );
        let target =
            CubeRenderTarget::new(device, settings.cube_resolution, "sun-turbulence-cube");
        let face_cameras = CubeFace::ALL
            .iter()
            .map(|face| {
                CameraBinding::with_layout(device, camera_layout, &format!("sun-capture-{face:?}"))
            })
            .collect();

        let uniform_size = std::mem::size_of::<SunUniform>() as u64;
        let noise_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sun-noise-bgl"),
            entries: &[uniform_entry(0, uniform_size)],
        });
        let turbulence_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sun-turbulence-bgl"),
            entries: &[
                uniform_entry(0, uniform_size),
                texture_entry(1, wgpu::TextureViewDimension::Cube),
                sampler_entry(2),
            ],
        });

        let noise_shader = shader_module(device, "sun-noise-shader", NOISE_SHADER_SOURCE);
        let surface_shader = shader_module(device, "sun-surface-shader", SURFACE_SHADER_SOURCE);
        let vertex_buffers = [SphereVertex::layout()];
        let capture_layouts = [camera_layout, &noise_bgl];

        // The rig sits inside both spheres, so nothing is culled and no depth is needed.
        let capture_spec = |label: &'static str, fs_entry: &'static str| PipelineSpec {
            label,
            shader: &noise_shader,
            vs_entry: "vs_noise",
            fs_entry,
            bind_group_layouts: &capture_layouts,
            vertex_buffers: &vertex_buffers,
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            depth: DepthMode::None,
            format: CubeRenderTarget::FORMAT,
            blend: None,
        };
        let noise_pipeline =
            build_pipeline(device, &capture_spec("sun-noise-pipeline", "fs_noise"));
        let occluder_pipeline =
            build_pipeline(device, &capture_spec("sun-occluder-pipeline", "fs_occluder"));

        let surface_pipeline = build_pipeline(
            device,
            &PipelineSpec {
                label: "sun-surface-pipeline",
                shader: &surface_shader,
                vs_entry: "vs_sun",
                fs_entry: "fs_surface",
                bind_group_layouts: &[camera_layout, &turbulence_bgl],
                vertex_buffers: &vertex_buffers,
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                depth: DepthMode::Opaque,
                format: surface_format,
                blend: None,
            },
        );
        let corona_pipeline = build_pipeline(
            device,
            &PipelineSpec {
                label: "sun-corona-pipeline",
                shader: &surface_shader,
                vs_entry: "vs_sun",
                fs_entry: "fs_corona",
                bind_group_layouts: &[camera_layout, &turbulence_bgl],
                vertex_buffers: &vertex_buffers,
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Front),
                depth: DepthMode::Translucent,
                format: surface_format,
                blend: Some(ADDITIVE),
            },
        );

        let create_uniform = |label: &str, uniform: SunUniform| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let noise_uniform = create_uniform("sun-noise-uniform", noise_params(&settings, 0.0));
        let surface_uniform =
            create_uniform("sun-surface-uniform", surface_params(&settings, 0.0));
        let corona_uniform = create_uniform("sun-corona-uniform", corona_params(&settings, 0.0));

        let noise_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sun-noise-bg"),
            layout: &noise_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: noise_uniform.as_entire_binding(),
            }],
        });

        log::info!(
            "Procedural sun initialized: radius {}, {}x{} turbulence cube, {} octaves",
            settings.radius,
            target.resolution(),
            target.resolution(),
            effective_octaves(&settings)
        );

        Self {
            settings,
            mesh,
            rig,
            target,
            face_cameras,
            noise_pipeline,
            occluder_pipeline,
            surface_pipeline,
            corona_pipeline,
            turbulence_bgl,
            noise_uniform,
            noise_bind_group,
            surface_uniform,
            corona_uniform,
            surface_bind_group: None,
            corona_bind_group: None,
            visible: true,
            corona_time: 0.0,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn settings(&self) -> &SunSettings {
        &self.settings
    }

    /// Render the turbulence sphere into all six cube faces and submit.
    ///
    /// A visible sun would enclose the rig and cover every face, so it is
    /// drawn over the turbulence when the caller forgot to hide it.
    pub fn capture(&self, device: &wgpu::Device, queue: &wgpu::Queue, sun_time: f32) {
        queue.write_buffer(
            &self.noise_uniform,
            0,
            bytemuck::bytes_of(&noise_params(&self.settings, sun_time)),
        );
        for (face, vp) in CubeFace::ALL.iter().zip(self.rig.face_view_projections()) {
            let binding = &self.face_cameras[face.layer() as usize];
            binding.write(queue, &capture_camera_uniform(self.rig.position, vp));
        }

        if self.visible {
            log::warn!("Sun is visible during turbulence capture; faces will be occluded");
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sun-capture-encoder"),
        });
        let builder = RenderPassBuilder::new()
            .clear_color(wgpu::Color::BLACK)
            .label("sun-capture");
        for face in CubeFace::ALL {
            let mut pass = builder.begin(&mut encoder, self.target.face_view(face));
            pass.set_bind_group(0, &self.face_cameras[face.layer() as usize].bind_group, &[]);
            pass.set_bind_group(1, &self.noise_bind_group, &[]);
            pass.set_pipeline(&self.noise_pipeline);
            self.mesh.draw(&mut pass, 0..1);
            if self.visible {
                pass.set_pipeline(&self.occluder_pipeline);
                self.mesh.draw(&mut pass, 0..1);
            }
        }
        queue.submit([encoder.finish()]);
    }

    /// Point the surface and corona at the captured cube. Binding twice is a no-op.
    pub fn bind_turbulence(&mut self, device: &wgpu::Device) {
        if self.surface_bind_group.is_some() && self.corona_bind_group.is_some() {
            return;
        }
        let bind = |label: &str, uniform: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.turbulence_bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&self.target.cube_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&self.target.sampler),
                    },
                ],
            })
        };
        let surface = bind("sun-surface-bg", &self.surface_uniform);
        let corona = bind("sun-corona-bg", &self.corona_uniform);
        self.surface_bind_group = Some(surface);
        self.corona_bind_group = Some(corona);
        log::debug!("Sun surface bound to turbulence cube");
    }

    pub fn is_turbulence_bound(&self) -> bool {
        self.surface_bind_group.is_some()
    }

    /// The corona flickers on its own clock.
    pub fn advance_corona(&mut self, delta: f32) {
        self.corona_time += delta;
    }

    pub fn corona_time(&self) -> f32 {
        self.corona_time
    }

    pub fn update(&self, queue: &wgpu::Queue, sun_time: f32) {
        queue.write_buffer(
            &self.surface_uniform,
            0,
            bytemuck::bytes_of(&surface_params(&self.settings, sun_time)),
        );
        queue.write_buffer(
            &self.corona_uniform,
            0,
            bytemuck::bytes_of(&corona_params(&self.settings, self.corona_time)),
        );
    }

    /// Draw the surface then the corona. Expects the camera at group 0.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.visible {
            return;
        }
        let (Some(surface), Some(corona)) = (&self.surface_bind_group, &self.corona_bind_group)
        else {
            return;
        };
        pass.set_pipeline(&self.surface_pipeline);
        pass.set_bind_group(1, surface, &[]);
        self.mesh.draw(pass, 0..1);

        pass.set_pipeline(&self.corona_pipeline);
        pass.set_bind_group(1, corona, &[]);
        self.mesh.draw(pass, 0..1);
    }
}

/// Octaves the turbulence shader actually sums.
fn effective_octaves(settings: &SunSettings) -> u32 {
    settings.noise_octaves.clamp(1, MAX_NOISE_OCTAVES)
}

fn noise_params(settings: &SunSettings, time: f32) -> SunUniform {
    SunUniform {
        model: sphere_model(settings.center, settings.radius).to_cols_array_2d(),
        time,
        octaves: effective_octaves(settings),
        fresnel_power: 0.0,
        intensity: 1.0,
    }
}

fn surface_params(settings: &SunSettings, time: f32) -> SunUniform {
    SunUniform {
        intensity: SURFACE_INTENSITY,
        ..noise_params(settings, time)
    }
}

fn corona_params(settings: &SunSettings, time: f32) -> SunUniform {
    SunUniform {
        model: sphere_model(settings.center, settings.radius * settings.corona_scale.max(1.0))
            .to_cols_array_2d(),
        fresnel_power: CORONA_FRESNEL_POWER,
        ..noise_params(settings, time)
    }
}

fn capture_camera_uniform(position: Vec3, view_proj: Mat4) -> solaris_render::CameraUniform {
    solaris_render::CameraUniform {
        view_proj: view_proj.to_cols_array_2d(),
        position: position.extend(1.0).to_array(),
        right: [1.0, 0.0, 0.0, 0.0],
        up: [0.0, 1.0, 0.0, 0.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn settings() -> SunSettings {
        SunSettings {
            center: Vec3::ZERO,
            radius: 16.0,
            cube_resolution: 64,
            corona_scale: 1.2,
            noise_octaves: 5,
        }
    }

    #[test]
    fn test_uniform_is_16_byte_aligned() {
        let size = std::mem::size_of::<SunUniform>();
        assert_eq!(size, 80);
        assert_eq!(size % 16, 0);
    }

    #[test]
    fn test_corona_encloses_surface() {
        let s = settings();
        let surface = Mat4::from_cols_array_2d(&surface_params(&s, 0.0).model);
        let corona = Mat4::from_cols_array_2d(&corona_params(&s, 0.0).model);
        let edge = Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((surface * edge).x < (corona * edge).x);
        assert!(((corona * edge).x - 19.2).abs() < 1e-4);
    }

    #[test]
    fn test_corona_never_shrinks_inside_surface() {
        let s = SunSettings {
            corona_scale: 0.5,
            ..settings()
        };
        let corona = Mat4::from_cols_array_2d(&corona_params(&s, 0.0).model);
        assert!(((corona * Vec4::new(1.0, 0.0, 0.0, 1.0)).x - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_octaves_are_clamped() {
        let many = SunSettings {
            noise_octaves: 40,
            ..settings()
        };
        let none = SunSettings {
            noise_octaves: 0,
            ..settings()
        };
        assert_eq!(noise_params(&many, 0.0).octaves, MAX_NOISE_OCTAVES);
        assert_eq!(noise_params(&none, 0.0).octaves, 1);
        // The startup log reports the same count the shader runs.
        assert_eq!(effective_octaves(&none), noise_params(&none, 0.0).octaves);
        assert_eq!(effective_octaves(&settings()), 5);
    }

    #[test]
    fn test_noise_and_surface_share_time() {
        let s = settings();
        assert_eq!(noise_params(&s, 3.5).time, surface_params(&s, 3.5).time);
    }

    #[test]
    fn test_capture_camera_covers_sphere_from_center() {
        let rig = CubeCaptureRig::new(Vec3::ZERO, 0.8, 64.0);
        let model = sphere_model(Vec3::ZERO, 16.0);
        for face in CubeFace::ALL {
            let (forward, _, _) = face.basis();
            let point = model.transform_point3(forward);
            let clip = rig.view_projection(face) * point.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4, "{face:?}: {ndc}");
            assert!((0.0..=1.0).contains(&ndc.z), "{face:?} depth {}", ndc.z);
        }
    }
}
