//! Reverse-Z depth buffer.
//!
//! The near plane maps to 1.0 and the far plane to 0.0, so float precision is
//! spent on distant geometry where the orbits live.

/// Depth attachment sized to one window surface.
pub struct DepthBuffer {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    size: (u32, u32),
}

impl DepthBuffer {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// The far plane.
    pub const CLEAR_VALUE: f32 = 0.0;

    /// Nearer fragments have larger depth.
    pub const COMPARE_FUNCTION: wgpu::CompareFunction = wgpu::CompareFunction::GreaterEqual;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = attachment_size(width, height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scene-depth"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        Self {
            texture,
            view,
            size,
        }
    }

    /// Reallocate when the clamped size differs from the current one.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if attachment_size(width, height) != self.size {
            *self = Self::new(device, width, height);
        }
    }

    pub fn width(&self) -> u32 {
        self.size.0
    }

    pub fn height(&self) -> u32 {
        self.size.1
    }

    /// Reverse-Z pipeline state. Translucent passes pass `false` to test
    /// without writing.
    pub fn stencil_state(depth_write_enabled: bool) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: Self::FORMAT,
            depth_write_enabled,
            depth_compare: Self::COMPARE_FUNCTION,
            stencil: Default::default(),
            bias: Default::default(),
        }
    }
}

/// Minimized windows report 0x0; textures need at least one texel.
fn attachment_size(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless_device() -> Option<wgpu::Device> {
        let instance = wgpu::Instance::default();
        pollster::block_on(async {
            let adapter = instance.request_adapter(&Default::default()).await.ok()?;
            let (device, _queue) = adapter.request_device(&Default::default()).await.ok()?;
            Some(device)
        })
    }

    #[test]
    fn test_reverse_z_state() {
        let opaque = DepthBuffer::stencil_state(true);
        assert!(opaque.depth_write_enabled);
        assert_eq!(opaque.format, wgpu::TextureFormat::Depth32Float);
        assert_eq!(opaque.depth_compare, wgpu::CompareFunction::GreaterEqual);
        assert_eq!(DepthBuffer::CLEAR_VALUE, 0.0);

        assert!(!DepthBuffer::stencil_state(false).depth_write_enabled);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        assert_eq!(attachment_size(0, 0), (1, 1));
        assert_eq!(attachment_size(800, 0), (800, 1));
        assert_eq!(attachment_size(640, 480), (640, 480));
    }

    #[test]
    fn test_depth_buffer_follows_window_size() {
        let Some(device) = headless_device() else {
            return;
        };
        let mut depth = DepthBuffer::new(&device, 640, 480);
        depth.resize(&device, 1920, 1080);
        assert_eq!((depth.width(), depth.height()), (1920, 1080));
        assert_eq!(depth.texture.size().width, 1920);

        depth.resize(&device, 0, 0);
        assert_eq!((depth.width(), depth.height()), (1, 1));
    }
}
