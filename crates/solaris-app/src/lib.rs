//! The Solaris application: windows, input, overlays and the two render
//! sessions (main orrery and detail preview).

pub mod controls;
pub mod error;
pub mod main_scene;
pub mod overlay;
pub mod platform;
pub mod preview;
pub mod scheduler;
pub mod window;

pub use error::AppError;
pub use window::{SolarApp, run};
