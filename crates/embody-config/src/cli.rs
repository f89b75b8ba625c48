//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, is_valid_fixed_dt};

/// Embody command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "embody", about = "Standard/drone character controller sandbox")]
pub struct CliArgs {
    /// Play phase at startup (standard or drone).
    #[arg(long)]
    pub start_phase: Option<String>,

    /// Fixed simulation step in seconds.
    #[arg(long)]
    pub fixed_dt: Option<f64>,

    /// Number of frames to simulate before exiting.
    #[arg(long, default_value_t = 600)]
    pub frames: u32,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref phase) = args.start_phase {
            self.start_phase = phase.clone();
        }
        if let Some(dt) = args.fixed_dt {
            if is_valid_fixed_dt(dt) {
                self.physics.fixed_dt = dt;
            } else {
                log::warn!("Ignoring invalid --fixed-dt {dt}");
            }
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
