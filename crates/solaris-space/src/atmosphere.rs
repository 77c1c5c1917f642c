//! Edge-glow shell around a previewed planet.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use solaris_render::{GpuMesh, SphereVertex, generate_sphere};
use wgpu::util::DeviceExt;

use crate::pipeline::{
    ADDITIVE, DepthMode, PipelineSpec, build_pipeline, shader_module, uniform_entry,
};
use crate::sun::sphere_model;

/// Shell radius relative to the planet.
pub const SHELL_SCALE: f32 = 1.15;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct AtmosphereUniform {
    pub model: [[f32; 4]; 4],
    /// Linear RGB glow color.
    pub color: [f32; 3],
    /// Fresnel exponent; higher values hug the silhouette.
    pub power: f32,
}

pub const ATMOSPHERE_SHADER_SOURCE: &str = r#"
struct AtmosphereUniform {
    model: mat4x4<f32>,
    color: vec3<f32>,
    power: f32,
};

@group(1) @binding(0)
var<uniform> atmosphere: AtmosphereUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_atmosphere(in: VertexInput) -> VertexOutput {
    let world = atmosphere.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world = world.xyz;
    out.normal = normalize((atmosphere.model * vec4<f32>(in.normal, 0.0)).xyz);
    return out;
}

@fragment
fn fs_atmosphere(in: VertexOutput) -> @location(0) vec4<f32> {
    let view = normalize(camera.position.xyz - in.world);
    let rim = pow(1.0 - abs(dot(normalize(in.normal), view)), atmosphere.power);
    return vec4<f32>(atmosphere.color * rim, rim);
}
"#;

pub struct AtmosphereRenderer {
    pipeline: wgpu::RenderPipeline,
    mesh: GpuMesh,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    color: [f32; 3],
    power: f32,
}

impl AtmosphereRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        color: [f32; 3],
        power: f32,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("atmosphere-bgl"),
            entries: &[uniform_entry(
                0,
                std::mem::size_of::<AtmosphereUniform>() as u64,
            )],
        });
        let shader = shader_module(device, "atmosphere-shader", ATMOSPHERE_SHADER_SOURCE);
        // Back faces of the enlarged shell, so the glow surrounds the planet's limb.
        let pipeline = build_pipeline(
            device,
            &PipelineSpec {
                label: "atmosphere-pipeline",
                shader: &shader,
                vs_entry: "vs_atmosphere",
                fs_entry: "fs_atmosphere",
                bind_group_layouts: &[camera_layout, &bind_group_layout],
                vertex_buffers: &[SphereVertex::layout()],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Front),
                depth: DepthMode::Translucent,
                format: surface_format,
                blend: Some(ADDITIVE),
            },
        );

        let power = power.max(0.1);
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("atmosphere-uniform"),
            contents: bytemuck::bytes_of(&atmosphere_uniform(Vec3::ZERO, 1.0, color, power)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atmosphere-bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            mesh: GpuMesh::from_sphere(device, "atmosphere-sphere", &generate_sphere(3)),
            uniform,
            bind_group,
            color,
            power,
        }
    }

    /// Wrap the shell around a planet of `radius` at `center`.
    pub fn set_planet(&self, queue: &wgpu::Queue, center: Vec3, radius: f32) {
        let uniform = atmosphere_uniform(center, radius, self.color, self.power);
        queue.write_buffer(&self.uniform, 0, bytemuck::bytes_of(&uniform));
    }

    /// Expects the camera at group 0.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.bind_group, &[]);
        self.mesh.draw(pass, 0..1);
    }
}

fn atmosphere_uniform(center: Vec3, radius: f32, color: [f32; 3], power: f32) -> AtmosphereUniform {
    AtmosphereUniform {
        model: sphere_model(center, radius * SHELL_SCALE).to_cols_array_2d(),
        color,
        power,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<AtmosphereUniform>(), 80);
    }

    #[test]
    fn test_shell_is_slightly_larger_than_planet() {
        let uniform = atmosphere_uniform(Vec3::new(3.0, 0.0, 0.0), 2.0, [0.3, 0.6, 1.0], 3.0);
        let model = Mat4::from_cols_array_2d(&uniform.model);
        let edge = model.transform_point3(Vec3::X);
        assert!((edge.x - (3.0 + 2.0 * SHELL_SCALE)).abs() < 1e-5);
        assert_eq!(uniform.color, [0.3, 0.6, 1.0]);
    }
}
