//! wgpu rendering foundation: GPU context, surfaces, depth, render passes,
//! cameras and rays, sphere meshes, textures, and offscreen cube targets.

pub mod camera;
pub mod cube;
pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod pass;
pub mod ray;
pub mod surface;
pub mod texture;

pub use camera::{Camera, CameraUniform};
pub use cube::{CubeCaptureRig, CubeFace, CubeRenderTarget, direction_to_cube_face_uv};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh::{GpuMesh, SphereMesh, SphereVertex, generate_sphere};
pub use pass::{FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use ray::Ray;
pub use surface::{PhysicalSize, SurfaceWrapper};
pub use texture::{GpuTexture, RgbaPixels, TextureError, decode_rgba_image, load_texture_or_fallback};
