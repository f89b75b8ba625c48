//! Configuration for the embody character controller.
//!
//! Movement, look, camera, and visual-profile tuning for both embodiments,
//! transition timing, and the physics layer table. Persists to disk as RON,
//! supports CLI overrides via clap and validates values on load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BodyConfig, CameraConfig, Config, DebugConfig, EmbodimentConfig, LookConfig, MovementConfig,
    PhysicsConfig, TransitionConfig, VisualValue, YawRouting, default_config_dir,
    is_valid_fixed_dt,
};
pub use error::ConfigError;
