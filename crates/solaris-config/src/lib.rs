//! Configuration for the Solaris orrery.
//!
//! Settings persist to disk as RON, accept command-line overrides via clap,
//! and tolerate missing or unknown keys so older files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, CameraConfig, Config, DebugConfig, PreviewConfig, SceneConfig,
    StarfieldConfig, SunConfig, WindowConfig,
};
pub use error::ConfigError;
