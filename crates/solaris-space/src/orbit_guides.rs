//! Orbit guide rings drawn as one line list.

use bytemuck::{Pod, Zeroable};
use solaris_scene::OrbitGuide;
use wgpu::util::DeviceExt;

use crate::pipeline::{DepthMode, PipelineSpec, build_pipeline, shader_module};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GuideVertex {
    pub position: [f32; 3],
}

impl GuideVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GuideVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

pub const GUIDE_SHADER_SOURCE: &str = r#"
@vertex
fn vs_guide(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return camera.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_guide() -> @location(0) vec4<f32> {
    return vec4<f32>(0.45, 0.5, 0.6, 0.35);
}
"#;

/// Segment endpoint pairs for every ring.
pub fn guide_line_vertices(guides: &[OrbitGuide]) -> Vec<GuideVertex> {
    let mut vertices = Vec::new();
    for guide in guides {
        let points = guide.points();
        for pair in points.windows(2) {
            vertices.push(GuideVertex {
                position: pair[0].to_array(),
            });
            vertices.push(GuideVertex {
                position: pair[1].to_array(),
            });
        }
    }
    vertices
}

pub struct OrbitGuideRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
}

impl OrbitGuideRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        guides: &[OrbitGuide],
    ) -> Self {
        let shader = shader_module(device, "orbit-guide-shader", GUIDE_SHADER_SOURCE);
        let pipeline = build_pipeline(
            device,
            &PipelineSpec {
                label: "orbit-guide-pipeline",
                shader: &shader,
                vs_entry: "vs_guide",
                fs_entry: "fs_guide",
                bind_group_layouts: &[camera_layout],
                vertex_buffers: &[GuideVertex::layout()],
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
                depth: DepthMode::Translucent,
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            },
        );

        let vertices = guide_line_vertices(guides);
        let vertex_buffer = (!vertices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("orbit-guide-vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });
        log::debug!(
            "Orbit guides: {} rings, {} line vertices",
            guides.len(),
            vertices.len()
        );

        Self {
            pipeline,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    /// Expects the camera at group 0.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(buffer) = &self.vertex_buffer else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solaris_scene::{SceneSettings, compose_scene, default_manifest};

    #[test]
    fn test_two_vertices_per_segment() {
        let scene = compose_scene(&default_manifest(), &SceneSettings::default());
        let vertices = guide_line_vertices(&scene.guides);
        let expected: u32 = scene.guides.iter().map(|g| g.segments * 2).sum();
        assert_eq!(vertices.len() as u32, expected);
    }

    #[test]
    fn test_rings_close_on_themselves() {
        let scene = compose_scene(&default_manifest(), &SceneSettings::default());
        let guide = &scene.guides[0];
        let vertices = guide_line_vertices(std::slice::from_ref(guide));
        let first = glam::Vec3::from(vertices[0].position);
        let last = glam::Vec3::from(vertices[vertices.len() - 1].position);
        assert!((first - last).length() < 1e-3, "{first} vs {last}");
    }

    #[test]
    fn test_vertices_lie_on_orbit_radius_in_plane() {
        let scene = compose_scene(&default_manifest(), &SceneSettings::default());
        let vertices = guide_line_vertices(&scene.guides);
        let mut offset = 0;
        for guide in &scene.guides {
            let count = (guide.segments * 2) as usize;
            for v in &vertices[offset..offset + count] {
                let p = glam::Vec3::from(v.position);
                assert!(p.y.abs() < 1e-6);
                assert!((p.length() - guide.radius).abs() < guide.radius * 1e-4);
            }
            offset += count;
        }
    }

    #[test]
    fn test_degenerate_ring_still_draws_a_triangle() {
        assert!(guide_line_vertices(&[]).is_empty());
        let scene = compose_scene(&default_manifest(), &SceneSettings::default());
        let degenerate = OrbitGuide {
            segments: 0,
            ..scene.guides[0].clone()
        };
        assert_eq!(guide_line_vertices(&[degenerate]).len(), 6);
    }
}
