//! Body name labels: text rasterized once onto square canvases, drawn as
//! camera-facing billboards above each body.

use bytemuck::{Pod, Zeroable};
use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};
use glam::{Vec2, Vec3};
use solaris_render::GpuTexture;
use solaris_scene::{BodyId, LABEL_FONT_SHARE, LABEL_LINE_SHARE, Shape, SolarScene};
use wgpu::util::DeviceExt;

use crate::pipeline::{
    DepthMode, PipelineSpec, build_pipeline, sampler_entry, shader_module, texture_entry,
    uniform_entry,
};

/// Straight-alpha RGBA8 image of one label.
#[derive(Debug, Clone)]
pub struct LabelCanvas {
    pub size: u32,
    pub pixels: Vec<u8>,
    /// Share of the canvas the shaped text spans, centered.
    pub text_extent: Vec2,
}

impl LabelCanvas {
    fn blank(size: u32) -> Self {
        Self {
            size,
            pixels: vec![0; (size * size * 4) as usize],
            text_extent: Vec2::ZERO,
        }
    }

    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.pixels[((y * self.size + x) * 4 + 3) as usize]
    }

    pub fn coverage(&self) -> usize {
        self.pixels.chunks(4).filter(|px| px[3] > 0).count()
    }

    /// Source-over blend of one straight-alpha pixel.
    fn blend(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.size as i32 || y >= self.size as i32 {
            return;
        }
        let alpha = color.a() as u32;
        if alpha == 0 {
            return;
        }
        let i = ((y as u32 * self.size + x as u32) * 4) as usize;
        let px = &mut self.pixels[i..i + 4];
        let inv = 255 - alpha;
        for (channel, src) in px.iter_mut().zip([color.r(), color.g(), color.b()]) {
            *channel = ((src as u32 * alpha + *channel as u32 * inv) / 255) as u8;
        }
        px[3] = (alpha + px[3] as u32 * inv / 255).min(255) as u8;
    }
}

/// Text shaping and glyph rasterization for label canvases.
pub struct LabelRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    canvas_size: u32,
}

impl LabelRasterizer {
    pub fn new(canvas_size: u32) -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            canvas_size: canvas_size.max(16),
        }
    }

    pub fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    /// White text centered on a transparent canvas.
    pub fn rasterize(&mut self, text: &str) -> LabelCanvas {
        let size = self.canvas_size;
        let mut canvas = LabelCanvas::blank(size);
        if text.trim().is_empty() {
            return canvas;
        }

        let font_size = size as f32 * LABEL_FONT_SHARE;
        let line_height = size as f32 * LABEL_LINE_SHARE;
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(font_size, line_height));
        buffer.set_size(&mut self.font_system, Some(size as f32), Some(size as f32));
        buffer.set_text(
            &mut self.font_system,
            text,
            Attrs::new().family(Family::SansSerif),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let (lines, widest) = buffer
            .layout_runs()
            .fold((0usize, 0.0f32), |(n, w), run| (n + 1, w.max(run.line_w)));
        if lines == 0 {
            log::warn!("Label '{text}' produced no glyph runs");
            return canvas;
        }
        let text_height = lines as f32 * line_height;
        canvas.text_extent = (Vec2::new(widest, text_height) / size as f32).min(Vec2::ONE);
        let offset_x = ((size as f32 - widest) * 0.5).round() as i32;
        let offset_y = ((size as f32 - text_height) * 0.5).round() as i32;

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgba(255, 255, 255, 255),
            |x, y, w, h, color| {
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        canvas.blend(offset_x + x + dx, offset_y + y + dy, color);
                    }
                }
            },
        );
        canvas
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LabelUniform {
    /// World-space center of the billboard.
    pub center: [f32; 3],
    /// Full edge length in world units.
    pub size: f32,
}

pub const LABEL_SHADER_SOURCE: &str = r#"
struct LabelUniform {
    center: vec3<f32>,
    size: f32,
};

@group(1) @binding(0)
var label_texture: texture_2d<f32>;
@group(1) @binding(1)
var label_sampler: sampler;
@group(1) @binding(2)
var<uniform> label: LabelUniform;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_label(@builtin(vertex_index) idx: u32) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, 1.0), vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[idx];
    let half = label.size * 0.5;
    let world = label.center
        + camera.right.xyz * corner.x * half
        + camera.up.xyz * corner.y * half;

    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(world, 1.0);
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    return out;
}

@fragment
fn fs_label(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(label_texture, label_sampler, in.uv);
    if (color.a < 0.02) {
        discard;
    }
    return color;
}
"#;

struct LabelEntry {
    body: BodyId,
    _texture: GpuTexture,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    visible: bool,
}

pub struct LabelRenderer {
    pipeline: wgpu::RenderPipeline,
    entries: Vec<LabelEntry>,
}

impl LabelRenderer {
    /// Rasterize and upload one label per registered body, then narrow each
    /// label's pick shape to the text it actually shows.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        rasterizer: &mut LabelRasterizer,
        scene: &mut SolarScene,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("label-bgl"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                sampler_entry(1),
                uniform_entry(2, std::mem::size_of::<LabelUniform>() as u64),
            ],
        });
        let shader = shader_module(device, "label-shader", LABEL_SHADER_SOURCE);
        let pipeline = build_pipeline(
            device,
            &PipelineSpec {
                label: "label-pipeline",
                shader: &shader,
                vs_entry: "vs_label",
                fs_entry: "fs_label",
                bind_group_layouts: &[camera_layout, &bind_group_layout],
                vertex_buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                depth: DepthMode::Translucent,
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            },
        );

        let mut entries = Vec::with_capacity(scene.registry.len());
        let mut extents = Vec::with_capacity(scene.registry.len());
        for body in scene.registry.iter() {
            let canvas = rasterizer.rasterize(body.name());
            extents.push((body.id, canvas.text_extent));
            let texture = match GpuTexture::from_rgba8(
                device,
                queue,
                &format!("label-{}", body.name()),
                canvas.size,
                canvas.size,
                &canvas.pixels,
            ) {
                Ok(texture) => texture,
                Err(e) => {
                    log::warn!("Skipping label for {}: {e}", body.name());
                    continue;
                }
            };
            let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("label-uniform-{}", body.name())),
                contents: bytemuck::bytes_of(&LabelUniform {
                    center: [0.0; 3],
                    size: 0.0,
                }),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("label-bg-{}", body.name())),
                layout: &bind_group_layout,
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
            entries.push(LabelEntry {
                body: body.id,
                _texture: texture,
                uniform,
                bind_group,
                visible: true,
            });
        }

        for (id, extent) in extents {
            scene.set_label_text_extent(id, extent);
        }

        log::info!(
            "Label renderer initialized: {} labels on {}px canvases",
            entries.len(),
            rasterizer.canvas_size()
        );
        Self { pipeline, entries }
    }

    /// Copy each label's world position, scaled size and visibility from the scene.
    pub fn update(&mut self, queue: &wgpu::Queue, scene: &SolarScene) {
        for entry in &mut self.entries {
            let Some(body) = scene.registry.get(entry.body) else {
                continue;
            };
            entry.visible = scene.graph.is_visible(body.label);
            if let Some(uniform) = label_uniform(scene, body.label) {
                queue.write_buffer(&entry.uniform, 0, bytemuck::bytes_of(&uniform));
            }
        }
    }

    /// Expects the camera at group 0.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        for entry in self.entries.iter().filter(|e| e.visible) {
            pass.set_bind_group(1, &entry.bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
    }
}

/// Billboard placement of a label node.
pub fn label_uniform(scene: &SolarScene, label: solaris_scene::NodeId) -> Option<LabelUniform> {
    let node = scene.graph.get(label)?;
    let Shape::Billboard { size, .. } = node.shape? else {
        return None;
    };
    let center: Vec3 = scene.graph.world_translation(label);
    Some(LabelUniform {
        center: center.to_array(),
        size: size * node.scale,
    })
}
