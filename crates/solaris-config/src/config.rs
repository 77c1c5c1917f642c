//! Every tunable of the orrery, persisted as `config.ron`.
//!
//! Each section is `#[serde(default)]`: a file that omits a section or a key
//! still loads, and keys this build does not know are ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Main window settings.
    pub window: WindowConfig,
    /// Orbit camera settings.
    pub camera: CameraConfig,
    /// Orbital scene settings.
    pub scene: SceneConfig,
    /// Procedural sun settings.
    pub sun: SunConfig,
    /// Starfield backdrop settings.
    pub starfield: StarfieldConfig,
    /// Detail preview window settings.
    pub preview: PreviewConfig,
    /// Diagnostics.
    pub debug: DebugConfig,
}

/// Main window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Inner width, logical pixels.
    pub width: u32,
    /// Inner height, logical pixels.
    pub height: u32,
    /// Present with Fifo.
    pub vsync: bool,
    /// Base title; overlay text is appended to it.
    pub title: String,
}

/// Orbit camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Initial distance from the look-at target.
    pub start_distance: f32,
    /// Initial elevation above the orbital plane in degrees.
    pub start_pitch_degrees: f32,
    /// Closest the camera may zoom to the target.
    pub min_distance: f32,
    /// Farthest the camera may zoom from the target.
    pub max_distance: f32,
    /// Radians of orbit per pixel of drag.
    pub orbit_sensitivity: f32,
    /// Scene units of zoom per wheel line.
    pub zoom_sensitivity: f32,
    /// Pointer travel in pixels below which a press/release counts as a click.
    pub click_drag_threshold: f32,
}

/// Orbital scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Multiplier applied to every body's real-world spin rate.
    pub spin_speedup: f32,
    /// Rotation periods below this many hours are clamped up to it.
    pub min_rotation_period_hours: f32,
    /// Label scale divisor `k` in `scale = distance / k`.
    pub label_scale_divisor: f32,
    /// Side length of the square label canvas in pixels.
    pub label_canvas_size: u32,
    /// Line segments per orbit guide ring.
    pub orbit_guide_segments: u32,
    /// Optional RON body manifest; the built-in table is used when unset.
    pub manifest_path: Option<PathBuf>,
    /// Directory that relative texture paths resolve against.
    pub texture_dir: PathBuf,
}

/// Procedural sun configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SunConfig {
    /// Radius of the visible sun sphere.
    pub radius: f32,
    /// Face resolution of the turbulence cube capture.
    pub cube_resolution: u32,
    /// Corona shell radius relative to the sun radius.
    pub corona_scale: f32,
    /// Seconds of turbulence animation per second of wall time.
    pub time_scale: f32,
    /// Noise octaves layered by the turbulence shader.
    pub noise_octaves: u32,
}

/// Starfield backdrop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarfieldConfig {
    /// Seed for deterministic star placement.
    pub seed: u64,
    /// Number of stars to generate.
    pub star_count: u32,
    /// Cube map face size in pixels.
    pub face_size: u32,
}

/// Detail preview window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreviewConfig {
    /// Preview window width in logical pixels.
    pub width: u32,
    /// Preview window height in logical pixels.
    pub height: u32,
    /// Preview spin in radians per second.
    pub spin_speed: f32,
    /// Edge glow color in linear RGB.
    pub glow_color: [f32; 3],
    /// Fresnel exponent of the edge glow.
    pub glow_power: f32,
}

/// Diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Default tracing level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Solaris".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            start_distance: 260.0,
            start_pitch_degrees: 25.0,
            min_distance: 40.0,
            max_distance: 600.0,
            orbit_sensitivity: 0.005,
            zoom_sensitivity: 8.0,
            click_drag_threshold: 4.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            spin_speedup: 500.0,
            min_rotation_period_hours: 0.1,
            label_scale_divisor: 8.0,
            label_canvas_size: 256,
            orbit_guide_segments: 128,
            manifest_path: None,
            texture_dir: PathBuf::from("assets/textures"),
        }
    }
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            radius: 16.0,
            cube_resolution: 256,
            corona_scale: 1.2,
            time_scale: 1.0,
            noise_octaves: 5,
        }
    }
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            star_count: 8000,
            face_size: 1024,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: 420,
            height: 420,
            spin_speed: 0.4,
            glow_color: [0.3, 0.6, 1.0],
            glow_power: 3.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Read `config.ron` from `config_dir`. A missing file is replaced by the
    /// defaults, which are written back so the user has something to edit.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let defaults = Self::default();
            defaults.save(config_dir)?;
            log::info!("Wrote default settings to {}", path.display());
            return Ok(defaults);
        }

        let config = read_config(&path)?;
        log::info!("Settings read from {}", path.display());
        Ok(config)
    }

    /// Write `config.ron` into `config_dir`, creating the directory first.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ConfigError::Write { path, source }
        };
        std::fs::create_dir_all(config_dir).map_err(write_error(config_dir))?;

        let text = ron::ser::to_string_pretty(self, pretty_layout())
            .map_err(ConfigError::Serialize)?;
        let path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, text).map_err(write_error(&path))
    }

    /// Resolve a manifest texture path against `scene.texture_dir`.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve_texture_path(&self, texture_path: &Path) -> PathBuf {
        if texture_path.is_absolute() {
            texture_path.to_path_buf()
        } else {
            self.scene.texture_dir.join(texture_path)
        }
    }
}

/// One section per line group; arrays such as colors stay on one line.
fn pretty_layout() -> ron::ser::PrettyConfig {
    ron::ser::PrettyConfig::new()
        .depth_limit(2)
        .enumerate_arrays(false)
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_raw(dir: &Path, text: &str) {
        std::fs::write(dir.join(CONFIG_FILE_NAME), text).unwrap();
    }

    #[test]
    fn test_pretty_output_is_readable_ron() {
        let text = ron::ser::to_string_pretty(&Config::default(), pretty_layout()).unwrap();
        assert!(text.contains("label_scale_divisor: 8.0"));
        let back: Config = ron::from_str(&text).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn test_manifest_path_survives_serialization() {
        let mut config = Config::default();
        config.scene.manifest_path = Some(PathBuf::from("bodies.ron"));
        let back: Config = ron::from_str(&ron::to_string(&config).unwrap()).unwrap();
        assert_eq!(back.scene.manifest_path, config.scene.manifest_path);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config: Config = ron::from_str("(window: (), camera: (min_distance: 10.0))").unwrap();
        assert_eq!(config.sun, SunConfig::default());
        assert_eq!(config.camera.min_distance, 10.0);
        assert_eq!(config.camera.max_distance, 600.0);
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        let config: Result<Config, _> = ron::from_str("(future_setting: true, sun: (glare: 2))");
        assert!(config.is_ok());
    }

    #[test]
    fn test_zoom_bounds_are_ordered() {
        let camera = CameraConfig::default();
        assert!(camera.min_distance < camera.start_distance);
        assert!(camera.start_distance < camera.max_distance);
    }

    #[test]
    fn test_first_run_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("solaris");
        let config = Config::load_or_create(&nested).unwrap();
        assert_eq!(config, Config::default());
        assert!(nested.join(CONFIG_FILE_NAME).is_file());
    }

    #[test]
    fn test_edits_persist_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_or_create(dir.path()).unwrap();
        config.window.width = 1920;
        config.scene.spin_speedup = 42.0;
        config.save(dir.path()).unwrap();

        assert_eq!(Config::load_or_create(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_hand_edited_file_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(dir.path(), "(sun: (cube_resolution: 512))");
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config.sun.cube_resolution, 512);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_broken_file_names_its_path() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(dir.path(), "{{not valid}}");
        match Config::load_or_create(dir.path()) {
            Err(ConfigError::Parse { path, .. }) => {
                assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_texture_path_resolution() {
        let config = Config::default();
        let resolved = config.resolve_texture_path(Path::new("earth.jpg"));
        assert_eq!(resolved, PathBuf::from("assets/textures").join("earth.jpg"));

        let absolute = std::env::temp_dir().join("mars.jpg");
        assert_eq!(config.resolve_texture_path(&absolute), absolute);
    }
}
