//! Render pass helpers.
//!
//! [`RenderPassBuilder`] describes the attachments of one pass and
//! [`FrameEncoder`] owns the command encoder and surface texture of one frame,
//! presenting on submit.

/// Near-black clear color of deep space.
pub const SPACE_BLACK: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.005,
    a: 1.0,
};

/// Depth attachment of a pass.
#[derive(Debug)]
struct DepthAttachment {
    view: wgpu::TextureView,
    clear_value: f32,
}

/// Fluent description of a render pass targeting the frame's surface.
#[derive(Debug)]
pub struct RenderPassBuilder {
    /// `None` keeps the existing color contents.
    clear_color: Option<wgpu::Color>,
    depth: Option<DepthAttachment>,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    /// A pass that clears to [`SPACE_BLACK`] with no depth attachment.
    pub fn new() -> Self {
        Self {
            clear_color: Some(SPACE_BLACK),
            depth: None,
            label: None,
        }
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = Some(color);
        self
    }

    /// Draw over whatever earlier passes wrote.
    pub fn load_color(mut self) -> Self {
        self.clear_color = None;
        self
    }

    /// Attach a depth buffer, cleared to `clear_value` at pass start.
    pub fn depth(mut self, view: wgpu::TextureView, clear_value: f32) -> Self {
        self.depth = Some(DepthAttachment { view, clear_value });
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Begin the described pass on `color_view`.
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let load = match self.clear_color {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };
        let depth_stencil_attachment =
            self.depth
                .as_ref()
                .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(depth.clear_value),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// One frame's command encoder and surface texture.
pub struct FrameEncoder {
    queue: wgpu::Queue,
    target: wgpu::TextureView,
    /// Taken on submit; present exactly once.
    pending: Option<(wgpu::CommandEncoder, wgpu::SurfaceTexture)>,
}

impl FrameEncoder {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_texture: wgpu::SurfaceTexture,
    ) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame"),
        });
        let target = surface_texture.texture.create_view(&Default::default());
        Self {
            queue: queue.clone(),
            target,
            pending: Some((encoder, surface_texture)),
        }
    }

    /// Begin a pass on the surface. Returns `None` once submitted.
    pub fn begin_render_pass(
        &mut self,
        builder: &RenderPassBuilder,
    ) -> Option<wgpu::RenderPass<'_>> {
        let (encoder, _) = self.pending.as_mut()?;
        Some(builder.begin(encoder, &self.target))
    }

    /// Submit the recorded commands and present.
    pub fn submit(mut self) {
        self.present();
    }

    fn present(&mut self) {
        if let Some((encoder, surface_texture)) = self.pending.take() {
            self.queue.submit([encoder.finish()]);
            surface_texture.present();
        }
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        if self.pending.is_some() {
            log::warn!("Frame dropped before submit; presenting what was recorded");
            self.present();
        }
    }
}
