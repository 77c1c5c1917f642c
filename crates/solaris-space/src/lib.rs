//! Space rendering for the orrery: the starfield skybox, the procedural sun
//! with its turbulence capture and corona, textured planets, orbit guides,
//! name labels, and the preview's atmosphere glow.

pub mod atmosphere;
pub mod camera_binding;
pub mod labels;
pub mod orbit_guides;
pub mod pipeline;
pub mod planets;
pub mod skybox;
pub mod starfield;
pub mod sun;

pub use atmosphere::AtmosphereRenderer;
pub use camera_binding::CameraBinding;
pub use labels::{LabelCanvas, LabelRasterizer, LabelRenderer};
pub use orbit_guides::OrbitGuideRenderer;
pub use planets::{PlanetLight, PlanetRenderer, planet_model};
pub use skybox::SkyboxRenderer;
pub use starfield::{SpectralClass, Star, StarfieldCubemap, StarfieldGenerator, blackbody_to_rgb};
pub use sun::{ProceduralSun, SunSettings};
