use solaris_config::ConfigError;
use solaris_render::RenderContextError;
use solaris_scene::ManifestError;

use crate::platform::PlatformError;

/// Everything that can stop the application from starting.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("GPU initialisation failed: {0}")]
    Render(#[from] RenderContextError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
