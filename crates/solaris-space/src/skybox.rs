//! Starfield backdrop drawn as a fullscreen triangle sampling a cube map.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use solaris_render::Camera;
use wgpu::util::DeviceExt;

use crate::pipeline::{
    DepthMode, PipelineSpec, build_pipeline, sampler_entry, texture_entry, uniform_entry,
};
use crate::starfield::StarfieldCubemap;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SkyboxUniform {
    /// Inverse of projection × rotation-only view.
    pub inv_view_proj: [[f32; 4]; 4],
}

pub const SKYBOX_SHADER_SOURCE: &str = r#"
struct Sky {
    inv_view_proj: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> sky: Sky;
@group(0) @binding(1) var star_map: texture_cube<f32>;
@group(0) @binding(2) var star_sampler: sampler;

struct SkyVarying {
    @builtin(position) clip: vec4<f32>,
    @location(0) ray: vec3<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> SkyVarying {
    let corner = vec2<f32>(f32(index / 2u), f32(index % 2u)) * 4.0 - 1.0;
    // Rotation-only view: every depth along the pixel ray gives the same direction.
    let far = sky.inv_view_proj * vec4<f32>(corner, 0.5, 1.0);

    var v: SkyVarying;
    v.clip = vec4<f32>(corner, 0.0, 1.0);
    v.ray = far.xyz / far.w;
    return v;
}

@fragment
fn fs_main(v: SkyVarying) -> @location(0) vec4<f32> {
    return vec4<f32>(textureSample(star_map, star_sampler, normalize(v.ray)).rgb, 1.0);
}
"#;

pub struct SkyboxRenderer {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl SkyboxRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        cubemap: &StarfieldCubemap,
    ) -> Self {
        let layout = sky_layout(device);
        let pipeline = sky_pipeline(device, &layout, surface_format);

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky-uniforms"),
            contents: bytemuck::bytes_of(&SkyboxUniform {
                inv_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let star_view = upload_cubemap(device, queue, cubemap);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sky-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky-bind-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&star_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        log::info!(
            "Starfield uploaded: six {0}x{0} faces, {1} lit pixels",
            cubemap.face_size,
            cubemap.lit_pixels()
        );

        Self {
            pipeline,
            uniforms,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera) {
        let uniform = SkyboxUniform {
            inv_view_proj: sky_inverse_view_projection(camera).to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// Camera translation is dropped so the stars sit at infinity.
pub fn sky_inverse_view_projection(camera: &Camera) -> Mat4 {
    let rotation_only = Mat4::from_quat(camera.rotation.inverse());
    (camera.projection_matrix() * rotation_only).inverse()
}

fn sky_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("sky-layout"),
        entries: &[
            uniform_entry(0, size_of::<SkyboxUniform>() as u64),
            texture_entry(1, wgpu::TextureViewDimension::Cube),
            sampler_entry(2),
        ],
    })
}

/// No depth attachment: the sky has its own pass before the scene. The shader
/// binds its own group 0, so it skips the shared camera prelude.
fn sky_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("sky-shader"),
        source: wgpu::ShaderSource::Wgsl(SKYBOX_SHADER_SOURCE.into()),
    });
    build_pipeline(
        device,
        &PipelineSpec {
            label: "sky-pipeline",
            shader: &shader,
            vs_entry: "vs_main",
            fs_entry: "fs_main",
            bind_group_layouts: &[layout],
            vertex_buffers: &[],
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            depth: DepthMode::None,
            format,
            blend: None,
        },
    )
}

/// Six faces in +X, -X, +Y, -Y, +Z, -Z order, viewed as a cube.
fn upload_cubemap(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    cubemap: &StarfieldCubemap,
) -> wgpu::TextureView {
    let side = cubemap.face_size;
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("starfield"),
            size: wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &cubemap.faces.concat(),
    );
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("starfield-cube"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}
