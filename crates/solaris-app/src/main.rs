//! The binary entry point for the Solaris orrery.

use std::process::ExitCode;

use clap::Parser;
use solaris_app::AppError;
use solaris_app::platform::PlatformDirs;
use solaris_config::{CliArgs, Config};
use solaris_scene::{default_manifest, load_manifest};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match start(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("solaris: {e}");
            ExitCode::FAILURE
        }
    }
}

fn start(args: &CliArgs) -> Result<(), AppError> {
    let dirs = PlatformDirs::resolve()?.with_config_dir(args.config.as_deref());
    dirs.create_dirs()?;

    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(args);
    solaris_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    info!(
        "Solaris starting (config: {}, logs: {})",
        dirs.config_dir.display(),
        dirs.log_dir.display()
    );

    let manifest = match &config.scene.manifest_path {
        Some(path) => load_manifest(path)?,
        None => default_manifest(),
    };
    solaris_app::run(config, manifest)
}
