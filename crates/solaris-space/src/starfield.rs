//! Seeded backdrop stars, baked once into an RGBA8 cube map.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use solaris_render::direction_to_cube_face_uv;

/// Spectral class with its surface temperature and relative abundance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpectralClass {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
}

impl SpectralClass {
    pub const ALL: [SpectralClass; 7] = [
        SpectralClass::O,
        SpectralClass::B,
        SpectralClass::A,
        SpectralClass::F,
        SpectralClass::G,
        SpectralClass::K,
        SpectralClass::M,
    ];

    pub fn temperature_k(self) -> f32 {
        match self {
            SpectralClass::O => 32_000.0,
            SpectralClass::B => 18_000.0,
            SpectralClass::A => 8_800.0,
            SpectralClass::F => 6_800.0,
            SpectralClass::G => 5_600.0,
            SpectralClass::K => 4_400.0,
            SpectralClass::M => 3_100.0,
        }
    }

    /// Share of visible stars; hot classes are rare but overrepresented
    /// compared to their true abundance because they are bright.
    fn weight(self) -> f32 {
        match self {
            SpectralClass::O => 0.01,
            SpectralClass::B => 0.05,
            SpectralClass::A => 0.10,
            SpectralClass::F => 0.14,
            SpectralClass::G => 0.20,
            SpectralClass::K => 0.25,
            SpectralClass::M => 0.25,
        }
    }

    fn pick(roll: f32) -> Self {
        let mut acc = 0.0;
        for class in Self::ALL {
            acc += class.weight();
            if roll < acc {
                return class;
            }
        }
        SpectralClass::M
    }
}

/// One backdrop star.
#[derive(Clone, Debug)]
pub struct Star {
    /// Unit direction on the sky sphere.
    pub direction: Vec3,
    /// Brightness in [0, 1].
    pub brightness: f32,
    pub class: SpectralClass,
    /// Linear RGB in [0, 1].
    pub color: [f32; 3],
}

/// Deterministic star catalog from a seed.
pub struct StarfieldGenerator {
    seed: u64,
    star_count: u32,
}

impl StarfieldGenerator {
    pub fn new(seed: u64, star_count: u32) -> Self {
        Self { seed, star_count }
    }

    pub fn generate(&self) -> Vec<Star> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..self.star_count)
            .map(|_| {
                // Uniform on the sphere: uniform z and azimuth.
                let z = 1.0 - 2.0 * rng.random::<f32>();
                let azimuth = rng.random::<f32>() * std::f32::consts::TAU;
                let ring = (1.0 - z * z).max(0.0).sqrt();
                let direction = Vec3::new(ring * azimuth.cos(), z, ring * azimuth.sin());

                let brightness = rng.random::<f32>().powf(5.0);
                let class = SpectralClass::pick(rng.random());
                Star {
                    direction,
                    brightness,
                    class,
                    color: blackbody_to_rgb(class.temperature_k()),
                }
            })
            .collect()
    }
}

/// Approximate sRGB color of a blackbody at `temperature_k` (Tanner Helland fit).
pub fn blackbody_to_rgb(temperature_k: f32) -> [f32; 3] {
    let t = temperature_k / 100.0;
    let r = if t <= 66.0 {
        255.0
    } else {
        329.698_73 * (t - 60.0).powf(-0.133_204_76)
    };
    let g = if t <= 66.0 {
        99.470_8 * t.ln() - 161.119_57
    } else {
        288.122_17 * (t - 60.0).powf(-0.075_514_85)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_73 * (t - 10.0).ln() - 305.044_8
    };
    [r, g, b].map(|c| (c / 255.0).clamp(0.0, 1.0))
}

/// Six RGBA8 faces in cube layer order.
pub struct StarfieldCubemap {
    pub face_size: u32,
    pub faces: [Vec<u8>; 6],
}

impl StarfieldCubemap {
    /// Splat every star onto its face. Bright stars get a small cross-shaped halo.
    pub fn render(stars: &[Star], face_size: u32) -> Self {
        let face_size = face_size.max(1);
        let pixels = (face_size * face_size) as usize;
        let mut faces: [Vec<[f32; 3]>; 6] = std::array::from_fn(|_| vec![[0.0; 3]; pixels]);

        for star in stars {
            let (face, u, v) = direction_to_cube_face_uv(star.direction);
            let max = face_size as f32 - 1.0;
            let px = (u * face_size as f32).min(max) as i32;
            let py = (v * face_size as f32).min(max) as i32;

            let core = 0.35 + star.brightness * 6.0;
            splat(&mut faces[face], face_size, px, py, star.color, core);
            if star.brightness > 0.25 {
                let halo = star.brightness * 0.6;
                for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                    splat(&mut faces[face], face_size, px + dx, py + dy, star.color, halo);
                }
            }
        }

        let faces = faces.map(|face| {
            face.iter()
                .flat_map(|[r, g, b]| [to_unorm(*r), to_unorm(*g), to_unorm(*b), 255])
                .collect()
        });
        Self { face_size, faces }
    }

    pub fn lit_pixels(&self) -> usize {
        self.faces
            .iter()
            .map(|face| face.chunks(4).filter(|px| px[..3].iter().any(|&c| c > 0)).count())
            .sum()
    }
}

fn splat(face: &mut [[f32; 3]], size: u32, x: i32, y: i32, color: [f32; 3], intensity: f32) {
    if x < 0 || y < 0 || x >= size as i32 || y >= size as i32 {
        return;
    }
    let pixel = &mut face[(y as u32 * size + x as u32) as usize];
    for (channel, c) in pixel.iter_mut().zip(color) {
        *channel += c * intensity;
    }
}

fn to_unorm(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_requested_count() {
        assert_eq!(StarfieldGenerator::new(42, 3000).generate().len(), 3000);
    }

    #[test]
    fn test_directions_are_unit_vectors() {
        for (i, star) in StarfieldGenerator::new(7, 2000).generate().iter().enumerate() {
            let len = star.direction.length();
            assert!((len - 1.0).abs() < 1e-4, "star {i} has length {len}");
        }
    }

    #[test]
    fn test_same_seed_same_sky() {
        let a = StarfieldGenerator::new(99, 500).generate();
        let b = StarfieldGenerator::new(99, 500).generate();
        for (sa, sb) in a.iter().zip(&b) {
            assert_eq!(sa.direction, sb.direction);
            assert_eq!(sa.class, sb.class);
        }
    }

    #[test]
    fn test_different_seed_different_sky() {
        let a = StarfieldGenerator::new(1, 500).generate();
        let b = StarfieldGenerator::new(2, 500).generate();
        let moved = a
            .iter()
            .zip(&b)
            .filter(|(sa, sb)| (sa.direction - sb.direction).length() > 0.01)
            .count();
        assert!(moved > 400, "only {moved}/500 stars differ");
    }

    #[test]
    fn test_stars_cover_both_hemispheres() {
        let stars = StarfieldGenerator::new(42, 4000).generate();
        let north = stars.iter().filter(|s| s.direction.y > 0.0).count();
        assert!(
            (1600..=2400).contains(&north),
            "expected roughly half the stars above the plane, got {north}"
        );
    }

    #[test]
    fn test_dim_stars_dominate() {
        let stars = StarfieldGenerator::new(42, 4000).generate();
        let dim = stars.iter().filter(|s| s.brightness < 0.1).count();
        let bright = stars.iter().filter(|s| s.brightness > 0.5).count();
        assert!(dim > bright * 5, "dim {dim}, bright {bright}");
    }

    #[test]
    fn test_class_colors_run_blue_to_red() {
        let o = SpectralClass::O.temperature_k();
        let m = SpectralClass::M.temperature_k();
        assert!(blackbody_to_rgb(o)[2] > blackbody_to_rgb(o)[0]);
        assert!(blackbody_to_rgb(m)[0] > blackbody_to_rgb(m)[2] * 1.5);
    }

    #[test]
    fn test_class_weights_sum_to_one() {
        let total: f32 = SpectralClass::ALL.iter().map(|c| c.weight()).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(SpectralClass::pick(0.999_99), SpectralClass::M);
        assert_eq!(SpectralClass::pick(0.0), SpectralClass::O);
    }

    #[test]
    fn test_cubemap_faces_are_rgba8_and_lit() {
        let stars = StarfieldGenerator::new(42, 2000).generate();
        let cubemap = StarfieldCubemap::render(&stars, 64);
        for face in &cubemap.faces {
            assert_eq!(face.len(), 64 * 64 * 4);
            assert!(face.chunks(4).all(|px| px[3] == 255));
        }
        assert!(cubemap.lit_pixels() > 500);
    }

    #[test]
    fn test_star_lands_on_matching_face() {
        let star = Star {
            direction: Vec3::NEG_Y,
            brightness: 1.0,
            class: SpectralClass::G,
            color: [1.0, 1.0, 1.0],
        };
        let cubemap = StarfieldCubemap::render(&[star], 8);
        let lit: Vec<usize> = (0..6)
            .filter(|&f| cubemap.faces[f].chunks(4).any(|px| px[0] > 0))
            .collect();
        assert_eq!(lit, vec![3], "only the -Y face is lit");
    }
}
