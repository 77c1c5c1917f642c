//! Camera uniform at bind group 0, shared by every space renderer.

use solaris_render::{Camera, CameraUniform};
use wgpu::util::DeviceExt;

use crate::pipeline::uniform_entry;

/// Uniform buffer plus bind group holding one [`CameraUniform`].
pub struct CameraBinding {
    pub layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        Self::with_layout(device, &Self::create_layout(device), label)
    }

    /// Bind against an existing layout, so several bindings can feed one pipeline.
    pub fn with_layout(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
    ) -> Self {
        let layout = layout.clone();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&Camera::default().to_uniform()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            layout,
            buffer,
            bind_group,
        }
    }

    pub fn create_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera-bgl"),
            entries: &[uniform_entry(
                0,
                std::mem::size_of::<CameraUniform>() as u64,
            )],
        })
    }

    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera) {
        self.write(queue, &camera.to_uniform());
    }

    pub fn write(&self, queue: &wgpu::Queue, uniform: &CameraUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }
}
