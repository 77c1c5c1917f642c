//! Textured, lit planet spheres sharing one mesh.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use solaris_render::{GpuMesh, GpuTexture, SphereVertex, generate_sphere, load_texture_or_fallback};
use solaris_scene::{BodyId, CelestialBody, SolarScene};
use wgpu::util::DeviceExt;

use crate::pipeline::{
    DepthMode, PipelineSpec, build_pipeline, sampler_entry, shader_module, texture_entry,
    uniform_entry,
};

const AMBIENT: f32 = 0.06;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PlanetUniform {
    pub model: [[f32; 4]; 4],
    /// xyz: light position (w = 1) or direction towards the light (w = 0).
    pub light: [f32; 4],
    pub ambient: f32,
    pub _padding: [f32; 3],
}

/// Where planet lighting comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanetLight {
    /// Point light, e.g. the sun at the origin.
    Point(Vec3),
    /// Direction towards a light at infinity.
    Directional(Vec3),
}

impl PlanetLight {
    fn to_uniform(self) -> [f32; 4] {
        match self {
            PlanetLight::Point(p) => p.extend(1.0).to_array(),
            PlanetLight::Directional(d) => d.normalize_or(Vec3::Y).extend(0.0).to_array(),
        }
    }
}

pub const PLANET_SHADER_SOURCE: &str = r#"
struct PlanetUniform {
    model: mat4x4<f32>,
    light: vec4<f32>,
    ambient: f32,
};

@group(1) @binding(0)
var albedo: texture_2d<f32>;
@group(1) @binding(1)
var albedo_sampler: sampler;
@group(1) @binding(2)
var<uniform> planet: PlanetUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_planet(in: VertexInput) -> VertexOutput {
    let world = planet.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world = world.xyz;
    out.normal = normalize((planet.model * vec4<f32>(in.normal, 0.0)).xyz);
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_planet(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(albedo, albedo_sampler, in.uv).rgb;
    let to_light = select(
        planet.light.xyz,
        planet.light.xyz - in.world,
        planet.light.w > 0.5,
    );
    let diffuse = max(dot(normalize(in.normal), normalize(to_light)), 0.0);
    let lit = planet.ambient + (1.0 - planet.ambient) * diffuse;
    return vec4<f32>(color * lit, 1.0);
}
"#;

/// `T · RotY(spin) · S`.
pub fn planet_model(translation: Vec3, spin: f32, radius: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(radius),
        Quat::from_rotation_y(spin),
        translation,
    )
}

struct PlanetEntry {
    body: BodyId,
    radius: f32,
    _texture: GpuTexture,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct PlanetRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    mesh: GpuMesh,
    entries: Vec<PlanetEntry>,
    light: PlanetLight,
}

impl PlanetRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        light: PlanetLight,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("planet-bgl"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                sampler_entry(1),
                uniform_entry(2, std::mem::size_of::<PlanetUniform>() as u64),
            ],
        });
        let shader = shader_module(device, "planet-shader", PLANET_SHADER_SOURCE);
        let pipeline = build_pipeline(
            device,
            &PipelineSpec {
                label: "planet-pipeline",
                shader: &shader,
                vs_entry: "vs_planet",
                fs_entry: "fs_planet",
                bind_group_layouts: &[camera_layout, &bind_group_layout],
                vertex_buffers: &[SphereVertex::layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                depth: DepthMode::Opaque,
                format: surface_format,
                blend: None,
            },
        );
        let mesh = GpuMesh::from_sphere(device, "planet-sphere", &generate_sphere(4));

        Self {
            pipeline,
            bind_group_layout,
            mesh,
            entries: Vec::new(),
            light,
        }
    }

    /// Upload the body's texture, falling back to its flat color when the
    /// image cannot be loaded.
    pub fn add_body(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        body: &CelestialBody,
        texture_path: &Path,
    ) {
        let [r, g, b] = body.descriptor.fallback_color;
        let texture = load_texture_or_fallback(device, queue, texture_path, [r, g, b, 255]);
        let radius = body.descriptor.display_size;

        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("planet-uniform-{}", body.name())),
            contents: bytemuck::bytes_of(&self.uniform(Vec3::ZERO, 0.0, radius)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("planet-bg-{}", body.name())),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });

        self.entries.push(PlanetEntry {
            body: body.id,
            radius,
            _texture: texture,
            uniform,
            bind_group,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_transform(&self, queue: &wgpu::Queue, body: BodyId, translation: Vec3, spin: f32) {
        if let Some(entry) = self.entries.iter().find(|e| e.body == body) {
            let uniform = self.uniform(translation, spin, entry.radius);
            queue.write_buffer(&entry.uniform, 0, bytemuck::bytes_of(&uniform));
        }
    }

    /// Copy every body's position and spin from the scene graph.
    pub fn update_from_scene(&self, queue: &wgpu::Queue, scene: &SolarScene) {
        for body in scene.registry.iter() {
            let spin = scene.graph.get(body.node).map_or(0.0, |n| n.spin);
            let translation = scene.graph.world_translation(body.node);
            self.set_transform(queue, body.id, translation, spin);
        }
    }

    /// Expects the camera at group 0.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.entries.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        for entry in &self.entries {
            pass.set_bind_group(1, &entry.bind_group, &[]);
            self.mesh.draw(pass, 0..1);
        }
    }

    fn uniform(&self, translation: Vec3, spin: f32, radius: f32) -> PlanetUniform {
        PlanetUniform {
            model: planet_model(translation, spin, radius).to_cols_array_2d(),
            light: self.light.to_uniform(),
            ambient: AMBIENT,
            _padding: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size_is_aligned() {
        assert_eq!(std::mem::size_of::<PlanetUniform>(), 96);
    }

    #[test]
    fn test_model_translates_after_spin_and_scale() {
        let model = planet_model(Vec3::new(30.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2, 2.0);
        let p = model.transform_point3(Vec3::X);
        // +X spun a quarter turn about Y lands on -Z, scaled by 2, then offset.
        assert!((p - Vec3::new(30.0, 0.0, -2.0)).length() < 1e-5, "{p}");
    }

    #[test]
    fn test_model_keeps_center_fixed_under_spin() {
        let center = Vec3::new(-12.0, 0.0, 40.0);
        for spin in [0.0, 1.0, 3.0, 6.0] {
            let model = planet_model(center, spin, 5.0);
            assert!((model.transform_point3(Vec3::ZERO) - center).length() < 1e-5);
        }
    }

    #[test]
    fn test_light_encoding() {
        assert_eq!(
            PlanetLight::Point(Vec3::new(1.0, 2.0, 3.0)).to_uniform(),
            [1.0, 2.0, 3.0, 1.0]
        );
        let dir = PlanetLight::Directional(Vec3::new(0.0, 0.0, 4.0)).to_uniform();
        assert_eq!(dir, [0.0, 0.0, 1.0, 0.0]);
        let degenerate = PlanetLight::Directional(Vec3::ZERO).to_uniform();
        assert_eq!(degenerate, [0.0, 1.0, 0.0, 0.0]);
    }
}
