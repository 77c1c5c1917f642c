//! Offscreen cube render targets and the six-face capture rig that fills them.
//!
//! Face order and orientation follow the wgpu cube-map convention:
//! +X, -X, +Y, -Y, +Z, -Z, with texture `v` growing downward.

use glam::{Mat4, Vec3, Vec4};

/// One face of a cube map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// All faces in array-layer order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Array layer of this face.
    pub fn layer(self) -> u32 {
        self as u32
    }

    /// `(forward, right, up)` of the face: `right` follows texture `u`, `up`
    /// is opposite to texture `v`.
    pub fn basis(self) -> (Vec3, Vec3, Vec3) {
        match self {
            CubeFace::PositiveX => (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            CubeFace::NegativeX => (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            CubeFace::PositiveY => (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            CubeFace::NegativeY => (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            CubeFace::PositiveZ => (Vec3::Z, Vec3::X, Vec3::Y),
            CubeFace::NegativeZ => (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        }
    }
}

/// Map a direction to `(face layer, u, v)` with `u`, `v` in [0, 1].
pub fn direction_to_cube_face_uv(dir: Vec3) -> (usize, f32, f32) {
    let abs = dir.abs();
    let face = if abs.x >= abs.y && abs.x >= abs.z {
        if dir.x > 0.0 {
            CubeFace::PositiveX
        } else {
            CubeFace::NegativeX
        }
    } else if abs.y >= abs.z {
        if dir.y > 0.0 {
            CubeFace::PositiveY
        } else {
            CubeFace::NegativeY
        }
    } else if dir.z > 0.0 {
        CubeFace::PositiveZ
    } else {
        CubeFace::NegativeZ
    };

    let (forward, right, up) = face.basis();
    let major = dir.dot(forward);
    let u = dir.dot(right) / major;
    let v = -dir.dot(up) / major;
    (face.layer() as usize, u * 0.5 + 0.5, v * 0.5 + 0.5)
}

/// A 90° square-frustum camera rig placed at one point, rendering all six faces.
#[derive(Clone, Copy, Debug)]
pub struct CubeCaptureRig {
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

impl CubeCaptureRig {
    pub fn new(position: Vec3, near: f32, far: f32) -> Self {
        Self {
            position,
            near,
            far,
        }
    }

    /// View matrix of one face: camera space is (right, up, forward), left-handed.
    pub fn view_matrix(&self, face: CubeFace) -> Mat4 {
        let (forward, right, up) = face.basis();
        let p = self.position;
        Mat4::from_cols(
            Vec4::new(right.x, up.x, forward.x, 0.0),
            Vec4::new(right.y, up.y, forward.y, 0.0),
            Vec4::new(right.z, up.z, forward.z, 0.0),
            Vec4::new(-right.dot(p), -up.dot(p), -forward.dot(p), 1.0),
        )
    }

    /// 90° field of view, aspect 1.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(std::f32::consts::FRAC_PI_2, 1.0, self.near, self.far)
    }

    pub fn view_projection(&self, face: CubeFace) -> Mat4 {
        self.projection_matrix() * self.view_matrix(face)
    }

    /// View-projection matrices for every face in layer order.
    pub fn face_view_projections(&self) -> [Mat4; 6] {
        CubeFace::ALL.map(|face| self.view_projection(face))
    }
}

/// Six-layer color texture rendered face by face and sampled as a cube.
pub struct CubeRenderTarget {
    pub texture: wgpu::Texture,
    face_views: Vec<wgpu::TextureView>,
    pub cube_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    resolution: u32,
}

impl CubeRenderTarget {
    /// Filterable HDR format so turbulence values above 1.0 survive the capture.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    pub fn new(device: &wgpu::Device, resolution: u32, label: &str) -> Self {
        let resolution = resolution.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let face_views = CubeFace::ALL
            .iter()
            .map(|face| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("cube-face-view"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: face.layer(),
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("cube-view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cube-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        log::debug!("Cube render target '{label}' created: {resolution}x{resolution}x6");

        Self {
            texture,
            face_views,
            cube_view,
            sampler,
            resolution,
        }
    }

    /// Render-attachment view of one face.
    pub fn face_view(&self, face: CubeFace) -> &wgpu::TextureView {
        &self.face_views[face.layer() as usize]
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ndc_to_uv(ndc: glam::Vec3) -> (f32, f32) {
        (ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5)
    }

    #[test]
    fn test_axis_directions_map_to_face_centers() {
        for face in CubeFace::ALL {
            let (forward, _, _) = face.basis();
            let (layer, u, v) = direction_to_cube_face_uv(forward);
            assert_eq!(layer, face.layer() as usize);
            assert!((u - 0.5).abs() < 1e-6 && (v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_face_bases_are_orthonormal() {
        for face in CubeFace::ALL {
            let (f, r, u) = face.basis();
            assert!(f.dot(r).abs() < 1e-6 && f.dot(u).abs() < 1e-6 && r.dot(u).abs() < 1e-6);
        }
    }

    #[test]
    fn test_capture_matches_cube_sampling() {
        // A direction rendered by the rig must land where a cube sampler reads it.
        let rig = CubeCaptureRig::new(Vec3::ZERO, 0.1, 100.0);
        let directions = [
            Vec3::new(1.0, 0.3, -0.2),
            Vec3::new(-1.0, -0.4, 0.5),
            Vec3::new(0.2, 1.0, 0.6),
            Vec3::new(-0.3, -1.0, -0.7),
            Vec3::new(0.5, 0.25, 1.0),
            Vec3::new(-0.6, 0.1, -1.0),
        ];
        for dir in directions {
            let (layer, u, v) = direction_to_cube_face_uv(dir);
            let face = CubeFace::ALL[layer];
            let ndc = rig.view_projection(face).project_point3(dir * 10.0);
            let (cu, cv) = ndc_to_uv(ndc);
            assert!(
                (cu - u).abs() < 1e-4 && (cv - v).abs() < 1e-4,
                "{face:?}: rendered at ({cu}, {cv}), sampled at ({u}, {v})"
            );
            assert!((0.0..=1.0).contains(&ndc.z), "depth out of range: {}", ndc.z);
        }
    }

    #[test]
    fn test_rig_follows_its_position() {
        let center = Vec3::new(5.0, -2.0, 3.0);
        let rig = CubeCaptureRig::new(center, 0.1, 100.0);
        let ndc = rig
            .view_projection(CubeFace::PositiveZ)
            .project_point3(center + Vec3::Z * 4.0);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }

    #[test]
    fn test_all_six_matrices_are_distinct() {
        let rig = CubeCaptureRig::new(Vec3::ZERO, 0.1, 10.0);
        let matrices = rig.face_view_projections();
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_ne!(matrices[i], matrices[j], "faces {i} and {j} share a matrix");
            }
        }
    }
}
