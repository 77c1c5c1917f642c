//! The body manifest: the fixed table of planets the scene is built from.
//!
//! A built-in eight-planet table ships with the crate; an externally authored
//! RON list of [`BodyDescriptor`]s can replace it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Descriptive payload shown verbatim in the detail overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyInfo {
    pub day_length: String,
    pub gravity: String,
    pub diameter: String,
    pub facts: Vec<String>,
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    /// Unique, user-facing, and the picking key.
    pub name: String,
    /// Sphere radius in scene units.
    pub display_size: f32,
    pub orbit_radius: f32,
    /// Orbit rate in radians per second of session time.
    pub angular_speed: f32,
    /// Relative paths resolve against the configured texture directory.
    pub texture_path: PathBuf,
    /// Real-world day length.
    pub rotation_period_hours: f32,
    /// Surface color used when the texture cannot be loaded.
    #[serde(default = "default_fallback_color")]
    pub fallback_color: [u8; 3],
    #[serde(default)]
    pub info: BodyInfo,
}

fn default_fallback_color() -> [u8; 3] {
    [160, 160, 160]
}

/// Errors from loading or validating a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("manifest contains no bodies")]
    Empty,

    #[error("duplicate body name '{0}'")]
    DuplicateName(String),

    #[error("body '{body}' has invalid {field}: {value}")]
    InvalidValue {
        body: String,
        field: &'static str,
        value: f32,
    },
}

/// Read and validate a RON manifest (a list of descriptors).
pub fn load_manifest(path: &Path) -> Result<Vec<BodyDescriptor>, ManifestError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let bodies: Vec<BodyDescriptor> =
        ron::from_str(&contents).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    validate_manifest(&bodies)?;
    tracing::info!("Loaded {} bodies from {}", bodies.len(), path.display());
    Ok(bodies)
}

/// Non-empty, unique names, and positive finite size, radius and speed.
///
/// Rotation periods are accepted as-is and clamped when the spin rate is derived.
pub fn validate_manifest(bodies: &[BodyDescriptor]) -> Result<(), ManifestError> {
    if bodies.is_empty() {
        return Err(ManifestError::Empty);
    }

    let mut names = HashSet::new();
    for body in bodies {
        if !names.insert(body.name.as_str()) {
            return Err(ManifestError::DuplicateName(body.name.clone()));
        }
        for (field, value) in [
            ("display_size", body.display_size),
            ("orbit_radius", body.orbit_radius),
            ("angular_speed", body.angular_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ManifestError::InvalidValue {
                    body: body.name.clone(),
                    field,
                    value,
                });
            }
        }
    }
    Ok(())
}

struct Entry {
    name: &'static str,
    display_size: f32,
    orbit_radius: f32,
    angular_speed: f32,
    texture: &'static str,
    rotation_period_hours: f32,
    color: [u8; 3],
    day_length: &'static str,
    gravity: &'static str,
    diameter: &'static str,
    facts: &'static [&'static str],
}

const PLANETS: [Entry; 8] = [
    Entry {
        name: "Mercury",
        display_size: 3.2,
        orbit_radius: 28.0,
        angular_speed: 0.4,
        texture: "mercury.jpg",
        rotation_period_hours: 1407.6,
        color: [151, 151, 159],
        day_length: "58.6 Earth days",
        gravity: "3.7 m/s²",
        diameter: "4,879 km",
        facts: &[
            "Smallest planet in the solar system.",
            "A year on Mercury lasts just 88 Earth days.",
            "Surface temperatures swing from -180 °C to 430 °C.",
        ],
    },
    Entry {
        name: "Venus",
        display_size: 5.8,
        orbit_radius: 44.0,
        angular_speed: 0.3,
        texture: "venus.jpg",
        rotation_period_hours: 5832.5,
        color: [227, 187, 118],
        day_length: "243 Earth days",
        gravity: "8.87 m/s²",
        diameter: "12,104 km",
        facts: &[
            "Hottest planet, with a runaway greenhouse atmosphere.",
            "Spins backwards compared to most planets.",
            "A day on Venus is longer than its year.",
        ],
    },
    Entry {
        name: "Earth",
        display_size: 6.0,
        orbit_radius: 62.0,
        angular_speed: 0.25,
        texture: "earth.jpg",
        rotation_period_hours: 24.0,
        color: [70, 110, 190],
        day_length: "24 hours",
        gravity: "9.81 m/s²",
        diameter: "12,742 km",
        facts: &[
            "The only known world with liquid surface water.",
            "About 71% of the surface is ocean.",
            "Its magnetic field shields life from the solar wind.",
        ],
    },
    Entry {
        name: "Mars",
        display_size: 4.0,
        orbit_radius: 78.0,
        angular_speed: 0.2,
        texture: "mars.jpg",
        rotation_period_hours: 24.6,
        color: [193, 68, 14],
        day_length: "24.6 hours",
        gravity: "3.71 m/s²",
        diameter: "6,779 km",
        facts: &[
            "Home to Olympus Mons, the tallest volcano known.",
            "Iron oxide dust gives it a red color.",
            "Has two small moons, Phobos and Deimos.",
        ],
    },
    Entry {
        name: "Jupiter",
        display_size: 12.0,
        orbit_radius: 100.0,
        angular_speed: 0.1,
        texture: "jupiter.jpg",
        rotation_period_hours: 9.9,
        color: [201, 144, 57],
        day_length: "9.9 hours",
        gravity: "24.79 m/s²",
        diameter: "139,820 km",
        facts: &[
            "Largest planet, more than twice the mass of all others combined.",
            "The Great Red Spot is a storm larger than Earth.",
            "Has the shortest day of any planet.",
        ],
    },
    Entry {
        name: "Saturn",
        display_size: 10.0,
        orbit_radius: 138.0,
        angular_speed: 0.08,
        texture: "saturn.jpg",
        rotation_period_hours: 10.7,
        color: [226, 191, 125],
        day_length: "10.7 hours",
        gravity: "10.44 m/s²",
        diameter: "116,460 km",
        facts: &[
            "Its rings are made mostly of ice.",
            "Less dense than water.",
            "Titan, its largest moon, has a thick atmosphere.",
        ],
    },
    Entry {
        name: "Uranus",
        display_size: 7.0,
        orbit_radius: 176.0,
        angular_speed: 0.06,
        texture: "uranus.jpg",
        rotation_period_hours: 17.2,
        color: [172, 229, 238],
        day_length: "17.2 hours",
        gravity: "8.69 m/s²",
        diameter: "50,724 km",
        facts: &[
            "Rotates on its side with a 98° axial tilt.",
            "Methane in the atmosphere gives it a cyan tint.",
            "First planet found with a telescope.",
        ],
    },
    Entry {
        name: "Neptune",
        display_size: 7.0,
        orbit_radius: 200.0,
        angular_speed: 0.05,
        texture: "neptune.jpg",
        rotation_period_hours: 16.1,
        color: [62, 84, 232],
        day_length: "16.1 hours",
        gravity: "11.15 m/s²",
        diameter: "49,244 km",
        facts: &[
            "Has the fastest winds in the solar system.",
            "Takes 165 Earth years to orbit the Sun.",
            "Found by mathematical prediction before it was observed.",
        ],
    },
];

/// The built-in eight-planet table, Mercury through Neptune.
pub fn default_manifest() -> Vec<BodyDescriptor> {
    PLANETS
        .iter()
        .map(|entry| BodyDescriptor {
            name: entry.name.to_string(),
            display_size: entry.display_size,
            orbit_radius: entry.orbit_radius,
            angular_speed: entry.angular_speed,
            texture_path: PathBuf::from(entry.texture),
            rotation_period_hours: entry.rotation_period_hours,
            fallback_color: entry.color,
            info: BodyInfo {
                day_length: entry.day_length.to_string(),
                gravity: entry.gravity.to_string(),
                diameter: entry.diameter.to_string(),
                facts: entry.facts.iter().map(|f| f.to_string()).collect(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(bodies: &'a [BodyDescriptor], name: &str) -> &'a BodyDescriptor {
        bodies.iter().find(|b| b.name == name).expect("body present")
    }

    #[test]
    fn test_default_manifest_has_eight_valid_bodies() {
        let bodies = default_manifest();
        assert_eq!(bodies.len(), 8);
        validate_manifest(&bodies).expect("built-in manifest must validate");
    }

    #[test]
    fn test_mercury_orbits_faster_than_neptune() {
        let bodies = default_manifest();
        let mercury = find(&bodies, "Mercury");
        let neptune = find(&bodies, "Neptune");
        assert!(mercury.orbit_radius < neptune.orbit_radius);
        assert!(
            mercury.angular_speed > neptune.angular_speed,
            "closer bodies must orbit faster"
        );
    }

    #[test]
    fn test_speed_decreases_with_orbit_radius() {
        let bodies = default_manifest();
        for pair in bodies.windows(2) {
            assert!(pair[0].orbit_radius < pair[1].orbit_radius);
            assert!(
                pair[0].angular_speed > pair[1].angular_speed,
                "{} should orbit faster than {}",
                pair[0].name,
                pair[1].name
            );
        }
    }

    #[test]
    fn test_empty_manifest_rejected() {
        assert!(matches!(validate_manifest(&[]), Err(ManifestError::Empty)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut bodies = default_manifest();
        bodies[1].name = "Mercury".into();
        assert!(matches!(
            validate_manifest(&bodies),
            Err(ManifestError::DuplicateName(name)) if name == "Mercury"
        ));
    }

    #[test]
    fn test_non_positive_radius_rejected() {
        let mut bodies = default_manifest();
        bodies[2].orbit_radius = 0.0;
        let err = validate_manifest(&bodies).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::InvalidValue { field: "orbit_radius", .. }
        ));
    }

    #[test]
    fn test_nan_speed_rejected() {
        let mut bodies = default_manifest();
        bodies[0].angular_speed = f32::NAN;
        assert!(validate_manifest(&bodies).is_err());
    }

    #[test]
    fn test_zero_rotation_period_accepted() {
        let mut bodies = default_manifest();
        bodies[0].rotation_period_hours = 0.0;
        assert!(validate_manifest(&bodies).is_ok());
    }

    #[test]
    fn test_load_manifest_from_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bodies.ron");
        std::fs::write(
            &path,
            r#"[
                (
                    name: "Vulcan",
                    display_size: 2.0,
                    orbit_radius: 20.0,
                    angular_speed: 0.9,
                    texture_path: "vulcan.png",
                    rotation_period_hours: 30.0,
                ),
            ]"#,
        )
        .unwrap();

        let bodies = load_manifest(&path).unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].name, "Vulcan");
        assert_eq!(bodies[0].fallback_color, [160, 160, 160]);
        assert!(bodies[0].info.facts.is_empty());
    }

    #[test]
    fn test_load_manifest_roundtrips_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bodies.ron");
        let serialized =
            ron::ser::to_string_pretty(&default_manifest(), ron::ser::PrettyConfig::new())
                .unwrap();
        std::fs::write(&path, serialized).unwrap();
        assert_eq!(load_manifest(&path).unwrap(), default_manifest());
    }

    #[test]
    fn test_load_missing_manifest() {
        let err = load_manifest(Path::new("/nonexistent/bodies.ron")).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }

    #[test]
    fn test_load_invalid_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bodies.ron");
        std::fs::write(&path, "[ ( name: ").unwrap();
        assert!(matches!(
            load_manifest(&path),
            Err(ManifestError::Parse { .. })
        ));
    }
}
