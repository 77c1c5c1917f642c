//! Sampled 2D textures loaded from image files, with solid-color fallbacks.

use std::path::{Path, PathBuf};

/// Errors that can occur while decoding or uploading a texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture data size ({actual}) does not match expected ({expected}) for {width}x{height}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone)]
pub struct RgbaPixels {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Decode a PNG or JPEG file into RGBA8 pixels.
pub fn decode_rgba_image(path: &Path) -> Result<RgbaPixels, TextureError> {
    let image = image::open(path)
        .map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Ok(RgbaPixels {
        width,
        height,
        data: image.into_raw(),
    })
}

/// An sRGB texture with its view and a repeating linear sampler.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    width: u32,
    height: u32,
}

impl GpuTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Upload tightly packed RGBA8 pixels.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<Self, TextureError> {
        check_rgba_len(width, height, data.len())?;
        Ok(Self::upload(device, queue, label, width, height, data))
    }

    /// 1x1 texture of a single color.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, rgba: [u8; 4]) -> Self {
        Self::upload(device, queue, label, 1, 1, &rgba)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Callers have validated `data` against the size.
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Self {
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            texture.as_image_copy(),
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: None,
            },
            extent,
        );

        // Longitude wraps, latitude stops at the poles.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            view: texture.create_view(&Default::default()),
            texture,
            sampler,
            width,
            height,
        }
    }
}

fn check_rgba_len(width: u32, height: u32, len: usize) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if len != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: len,
            expected,
            width,
            height,
        });
    }
    Ok(())
}

/// Load `path`, or log a warning and return a solid `fallback` texture.
///
/// A missing or corrupt body texture never stops the scene from starting.
pub fn load_texture_or_fallback(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: &Path,
    fallback: [u8; 4],
) -> GpuTexture {
    let label = path.display().to_string();
    let uploaded = decode_rgba_image(path).and_then(|pixels| {
        GpuTexture::from_rgba8(
            device,
            queue,
            &label,
            pixels.width,
            pixels.height,
            &pixels.data,
        )
    });
    match uploaded {
        Ok(texture) => {
            log::debug!(
                "Loaded texture {} ({}x{})",
                label,
                texture.width,
                texture.height
            );
            texture
        }
        Err(e) => {
            log::warn!("Using fallback color for {label}: {e}");
            GpuTexture::solid(device, queue, &label, fallback)
        }
    }
}
