//! Command-line flags layered over `config.ron`.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Every flag is optional; an absent flag leaves the file's value alone.
#[derive(Parser, Debug, Default)]
#[command(name = "solaris", version, about = "Interactive solar system orrery")]
pub struct CliArgs {
    /// Main window width in logical pixels.
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Main window height in logical pixels.
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Present without waiting for vertical blank.
    #[arg(long)]
    pub no_vsync: bool,

    /// Tracing level used when `RUST_LOG` is unset.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Read and write `config.ron` here instead of the platform config dir.
    #[arg(short, long, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Body manifest (RON) to load instead of the built-in planets.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Where relative texture paths in the manifest are looked up.
    #[arg(long, value_name = "DIR")]
    pub textures: Option<PathBuf>,

    /// Multiplier on every body's real rotation rate.
    #[arg(long, value_name = "FACTOR")]
    pub spin_speedup: Option<f32>,
}

impl Config {
    /// Overwrite the settings named on the command line.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let window = &mut self.window;
        window.width = args.width.unwrap_or(window.width);
        window.height = args.height.unwrap_or(window.height);
        window.vsync &= !args.no_vsync;

        if let Some(level) = &args.log_level {
            self.debug.log_level.clone_from(level);
        }

        let scene = &mut self.scene;
        if args.manifest.is_some() {
            scene.manifest_path.clone_from(&args.manifest);
        }
        if let Some(dir) = &args.textures {
            scene.texture_dir.clone_from(dir);
        }
        scene.spin_speedup = args.spin_speedup.unwrap_or(scene.spin_speedup);
    }
}
