//! The binary entry point for the embody sandbox.

use std::path::PathBuf;

use clap::Parser;
use embody_app::{EmbodyApp, demo_script};
use embody_config::{CliArgs, Config, default_config_dir};
use embody_log::init_logging;
use tracing::{error, info};

fn log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("embody").join("logs"))
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().map(Ok).unwrap_or_else(default_config_dir);
    let (mut config, config_error) = match config_dir.and_then(|dir| Config::load_or_create(&dir)) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_cli_overrides(&args);

    init_logging(log_dir().as_deref(), cfg!(debug_assertions), Some(&config));
    if let Some(e) = config_error {
        error!("Failed to load config, using defaults: {e}");
    }

    info!(
        start_phase = %config.start_phase,
        fixed_dt = config.physics.fixed_dt,
        frames = args.frames,
        "Starting embody sandbox"
    );

    let mut app = EmbodyApp::new(&config, demo_script());
    app.run_frames(args.frames);

    let stats = app.stats();
    info!(
        phase = %app.coordinator().phase(),
        switches = stats.switches,
        standard_ticks = stats.standard_ticks,
        drone_ticks = stats.drone_ticks,
        airborne_ticks = stats.airborne_ticks,
        transition_frames = stats.transition_frames,
        "Simulation finished"
    );
}
