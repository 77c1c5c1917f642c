//! OS-specific directory resolution.
//!
//! Config and log locations follow platform conventions (XDG on Linux, Known
//! Folders on Windows, Library on macOS) through the `dirs` crate.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while preparing platform directories.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,

    /// Directory creation failed.
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

pub const APP_NAME: &str = "solaris";

/// Where Solaris keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// `config.ron` lives here.
    pub config_dir: PathBuf,
    /// Debug builds write the JSON log here.
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve platform-specific directories without creating them on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NoConfigDir`] if the OS does not expose a
    /// configuration directory.
    pub fn resolve() -> Result<Self, PlatformError> {
        let app_config = dirs::config_dir()
            .ok_or(PlatformError::NoConfigDir)?
            .join(APP_NAME);
        let log_dir = dirs::data_local_dir()
            .map(|dir| dir.join(APP_NAME).join("logs"))
            .unwrap_or_else(|| app_config.join("logs"));

        Ok(Self {
            config_dir: app_config,
            log_dir,
        })
    }

    /// Resolve directories rooted under a custom base path.
    pub fn resolve_with_root(root: &Path) -> Self {
        let app_dir = root.join(APP_NAME);
        Self {
            config_dir: app_dir.join("config"),
            log_dir: app_dir.join("logs"),
        }
    }

    /// Replace the config directory, e.g. from `--config`.
    pub fn with_config_dir(mut self, config_dir: Option<&Path>) -> Self {
        if let Some(dir) = config_dir {
            self.config_dir = dir.to_path_buf();
        }
        self
    }

    /// Create all directories on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Io`] if any directory cannot be created.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_with_root_stays_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs::resolve_with_root(tmp.path());
        assert!(dirs.config_dir.starts_with(tmp.path()));
        assert!(dirs.log_dir.starts_with(tmp.path()));
        assert_ne!(dirs.config_dir, dirs.log_dir);
    }

    #[test]
    fn test_directory_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs::resolve_with_root(tmp.path());
        dirs.create_dirs().expect("create_dirs failed for temp root");
        assert!(dirs.config_dir.is_dir(), "config_dir was not created");
        assert!(dirs.log_dir.is_dir(), "log_dir was not created");

        // Creating twice is fine.
        dirs.create_dirs().unwrap();
    }

    #[test]
    fn test_config_override() {
        let tmp = tempfile::tempdir().unwrap();
        let custom = tmp.path().join("elsewhere");
        let dirs = PlatformDirs::resolve_with_root(tmp.path()).with_config_dir(Some(&custom));
        assert_eq!(dirs.config_dir, custom);
        assert!(dirs.log_dir.ends_with("logs"));

        let unchanged = PlatformDirs::resolve_with_root(tmp.path()).with_config_dir(None);
        assert_eq!(unchanged, PlatformDirs::resolve_with_root(tmp.path()));
    }

    #[test]
    fn test_resolved_dirs_are_named_after_app() {
        let Ok(dirs) = PlatformDirs::resolve() else {
            return;
        };
        assert!(dirs.config_dir.ends_with(APP_NAME));
        assert!(dirs.log_dir.to_string_lossy().contains(APP_NAME));
    }
}
