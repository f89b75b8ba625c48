//! Configuration structs with sensible defaults and RON persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Play phase at startup (`"standard"` or `"drone"`).
    pub start_phase: String,
    /// The grounded walking body.
    pub standard: EmbodimentConfig,
    /// The free-flying drone body.
    pub drone: EmbodimentConfig,
    /// Hand-off timing between the two embodiments.
    pub transition: TransitionConfig,
    /// Simulation clock and collision layers.
    pub physics: PhysicsConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Everything that parameterizes one embodiment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbodimentConfig {
    /// Physical body shape and spawn point.
    pub body: BodyConfig,
    /// Locomotion tuning.
    pub movement: MovementConfig,
    /// Camera-look tuning.
    pub look: LookConfig,
    /// Camera placement and projection.
    pub camera: CameraConfig,
    /// Post-processing profile shown while this embodiment is active.
    pub visual: BTreeMap<String, VisualValue>,
}

/// Rigid body shape and spawn point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    /// Radius of the ball collider in meters. Kept below the movement
    /// `ground_offset` so the ground snap lifts the body onto a walkable
    /// slope before the collider reaches it.
    pub radius: f32,
    /// Spawn position in world space.
    pub spawn: [f32; 3],
}

/// Per-embodiment locomotion constants. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MovementConfig {
    /// Velocity change per tick at full input.
    pub acceleration: f32,
    /// Horizontal speed ceiling in m/s.
    pub max_speed: f32,
    /// Fraction of horizontal velocity removed each tick.
    pub friction: f32,
    /// Horizontal speed below which friction snaps velocity to zero.
    pub friction_epsilon: f32,
    /// Downward acceleration while airborne, m/s².
    pub gravity: f32,
    /// Ground probe reach while grounded.
    pub ground_probe_distance: f32,
    /// Ground probe reach while airborne (landing check).
    pub airborne_probe_distance: f32,
    /// Radius of the probe ring around the body.
    pub probe_radius: f32,
    /// Probe origin relative to the body position.
    pub probe_offset: [f32; 3],
    /// Steepest surface still considered walkable, in degrees.
    pub max_slope_deg: f32,
    /// Height of the body origin above the supporting surface.
    pub ground_offset: f32,
    /// Vertical speed below which an airborne body may land.
    pub landing_speed: f32,
    /// Layer names the ground probe considers.
    pub ground_layers: Vec<String>,
}

/// How horizontal look input turns the body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum YawRouting {
    /// The look controller rotates the body itself.
    #[default]
    Direct,
    /// Yaw is forwarded to the body's movement controller.
    Companion,
}

/// Camera-look constants. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LookConfig {
    /// Degrees of rotation per unit of look input.
    pub sensitivity: f32,
    /// Lowest allowed pitch in degrees (looking down).
    pub low_clamp: f32,
    /// Highest allowed pitch in degrees (looking up).
    pub high_clamp: f32,
    /// Extra multiplier on horizontal input.
    pub yaw_scale: f32,
    /// Where yaw is applied.
    pub yaw_routing: YawRouting,
}

/// Camera placement relative to its body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera offset in the body's local frame.
    pub offset: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
}

/// A single post-processing parameter value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VisualValue {
    /// Plain scalar (intensity, exposure, ...).
    Scalar(f32),
    /// Three-component vector.
    Vector([f32; 3]),
    /// sRGB color with linear alpha.
    Color([f32; 4]),
    /// On/off switch.
    Toggle(bool),
    /// Named mode with no fractional meaning (tonemapper, LUT, ...).
    Mode(String),
}

/// Hand-off timing between embodiments, in frame ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransitionConfig {
    /// Ticks spent fading the effect volume in.
    pub fade_in_ticks: u32,
    /// Ticks spent blending pose, FOV, and visual parameters.
    pub blend_ticks: u32,
    /// Ticks spent fading the effect volume out.
    pub fade_out_ticks: u32,
    /// Easing curve name for the blend (`"cosine-in-out"`, `"linear"`, ...).
    pub easing: String,
}

/// Simulation clock and collision layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed simulation step in seconds.
    pub fixed_dt: f64,
    /// Layer table; a layer's bit index is its position in this list.
    pub layers: Vec<String>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            start_phase: "standard".to_string(),
            standard: EmbodimentConfig::standard(),
            drone: EmbodimentConfig::drone(),
            transition: TransitionConfig::default(),
            physics: PhysicsConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl EmbodimentConfig {
    /// Walking body: heavier gravity, tight pitch range, camera at eye height.
    pub fn standard() -> Self {
        Self {
            body: BodyConfig::default(),
            movement: MovementConfig::default(),
            look: LookConfig::default(),
            camera: CameraConfig::default(),
            visual: BTreeMap::from([
                ("exposure".to_string(), VisualValue::Scalar(0.0)),
                ("vignette".to_string(), VisualValue::Scalar(0.2)),
                ("chromatic_aberration".to_string(), VisualValue::Scalar(0.0)),
                ("lens_shift".to_string(), VisualValue::Vector([0.0, 0.0, 0.0])),
                ("color_filter".to_string(), VisualValue::Color([1.0, 1.0, 1.0, 1.0])),
                ("film_grain".to_string(), VisualValue::Toggle(false)),
                ("tonemapper".to_string(), VisualValue::Mode("aces".to_string())),
            ]),
        }
    }

    /// Drone body: light and fast, wide FOV, yaw routed through movement.
    pub fn drone() -> Self {
        Self {
            body: BodyConfig {
                radius: 0.2,
                spawn: [2.0, 0.25, 0.0],
            },
            movement: MovementConfig {
                acceleration: 0.8,
                max_speed: 10.0,
                friction: 0.05,
                gravity: 4.0,
                ground_probe_distance: 0.4,
                airborne_probe_distance: 0.3,
                probe_radius: 0.15,
                max_slope_deg: 60.0,
                ground_offset: 0.25,
                ..MovementConfig::default()
            },
            look: LookConfig {
                low_clamp: -85.0,
                high_clamp: 85.0,
                yaw_scale: 0.5,
                yaw_routing: YawRouting::Companion,
                ..LookConfig::default()
            },
            camera: CameraConfig {
                offset: [0.0, 0.0, 0.0],
                fov_deg: 90.0,
            },
            visual: BTreeMap::from([
                ("exposure".to_string(), VisualValue::Scalar(0.4)),
                ("vignette".to_string(), VisualValue::Scalar(0.45)),
                ("chromatic_aberration".to_string(), VisualValue::Scalar(0.35)),
                ("lens_shift".to_string(), VisualValue::Vector([0.0, 0.02, 0.0])),
                ("color_filter".to_string(), VisualValue::Color([0.7, 0.9, 1.0, 1.0])),
                ("film_grain".to_string(), VisualValue::Toggle(true)),
                ("tonemapper".to_string(), VisualValue::Mode("neutral".to_string())),
            ]),
        }
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            radius: 0.4,
            spawn: [0.0, 0.5, 0.0],
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            acceleration: 1.2,
            max_speed: 6.0,
            friction: 0.15,
            friction_epsilon: 0.05,
            gravity: 15.0,
            ground_probe_distance: 0.75,
            airborne_probe_distance: 0.6,
            probe_radius: 0.3,
            probe_offset: [0.0, 0.0, 0.0],
            max_slope_deg: 40.0,
            ground_offset: 0.5,
            landing_speed: 0.1,
            ground_layers: vec!["ground".to_string()],
        }
    }
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            sensitivity: 2.0,
            low_clamp: -80.0,
            high_clamp: 80.0,
            yaw_scale: 1.0,
            yaw_routing: YawRouting::Direct,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.6, 0.0],
            fov_deg: 70.0,
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            fade_in_ticks: 12,
            blend_ticks: 45,
            fade_out_ticks: 12,
            easing: "cosine-in-out".to_string(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 0.02,
            layers: vec![
                "default".to_string(),
                "ground".to_string(),
                "player".to_string(),
            ],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for embody (`~/.config/embody` on Linux).
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("embody"))
        .ok_or(ConfigError::NoConfigDir)
}

/// A fixed step must be a positive, finite number of seconds.
pub fn is_valid_fixed_dt(dt: f64) -> bool {
    dt.is_finite() && dt > 0.0
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let mut config: Config =
                ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate();
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Replace out-of-range values with their defaults.
    pub fn validate(&mut self) {
        let fixed_dt = self.physics.fixed_dt;
        if !is_valid_fixed_dt(fixed_dt) {
            let fallback = PhysicsConfig::default().fixed_dt;
            log::warn!("Invalid physics.fixed_dt {fixed_dt}, using {fallback}");
            self.physics.fixed_dt = fallback;
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}
