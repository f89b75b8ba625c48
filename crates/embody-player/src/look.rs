//! Camera look: pitch with a clamp, unclamped yaw.
//!
//! Input is sampled on the frame tick into pending deltas and applied on the
//! fixed tick. Angles are in degrees. Positive look_y pitches up, positive
//! look_x turns right.

use embody_config::{LookConfig, YawRouting};
use glam::Quat;
use tracing::warn;

/// Wrap an angle in degrees into (-180, 180].
pub fn normalize_angle(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Per-embodiment look accumulator.
#[derive(Clone, Debug)]
pub struct LookController {
    config: LookConfig,
    low_clamp: f32,
    high_clamp: f32,
    pitch_deg: f32,
    heading_deg: f32,
    pending_pitch_deg: f32,
    pending_yaw_deg: f32,
    disabled: bool,
}

impl LookController {
    pub fn new(config: LookConfig) -> Self {
        let (mut low_clamp, mut high_clamp) = (config.low_clamp, config.high_clamp);
        if low_clamp > high_clamp {
            warn!(low_clamp, high_clamp, "Pitch clamp bounds reversed, swapping");
            std::mem::swap(&mut low_clamp, &mut high_clamp);
        }
        Self {
            config,
            low_clamp,
            high_clamp,
            pitch_deg: 0.0,
            heading_deg: 0.0,
            pending_pitch_deg: 0.0,
            pending_yaw_deg: 0.0,
            disabled: false,
        }
    }

    /// Applied pitch in degrees.
    pub fn pitch(&self) -> f32 {
        self.pitch_deg
    }

    /// Accumulated applied yaw in degrees, normalized.
    pub fn heading(&self) -> f32 {
        self.heading_deg
    }

    pub fn pending_pitch(&self) -> f32 {
        self.pending_pitch_deg
    }

    pub fn pending_yaw(&self) -> f32 {
        self.pending_yaw_deg
    }

    /// Effective pitch bounds `(low, high)`.
    pub fn clamp_range(&self) -> (f32, f32) {
        (self.low_clamp, self.high_clamp)
    }

    pub fn yaw_routing(&self) -> YawRouting {
        self.config.yaw_routing
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Disabling also drops any pending input.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.pending_pitch_deg = 0.0;
            self.pending_yaw_deg = 0.0;
        }
    }

    /// Frame tick: accumulate one frame of look input.
    pub fn sample(&mut self, look_x: f32, look_y: f32) {
        if self.disabled {
            return;
        }

        let yaw = look_x * self.config.sensitivity * self.config.yaw_scale;
        self.pending_yaw_deg = normalize_angle(self.pending_yaw_deg + yaw);

        // Limit the delta so applied + pending never leaves the clamp range.
        let committed = self.pitch_deg + self.pending_pitch_deg;
        let requested = look_y * self.config.sensitivity;
        let allowed = (committed + requested).clamp(self.low_clamp, self.high_clamp) - committed;
        self.pending_pitch_deg += allowed;
    }

    /// Fixed tick: commit pending pitch and hand back the yaw delta for routing.
    pub fn apply(&mut self) -> Option<f32> {
        if self.disabled {
            return None;
        }

        self.pitch_deg = normalize_angle(self.pitch_deg + self.pending_pitch_deg);
        self.pending_pitch_deg = 0.0;

        let yaw = self.pending_yaw_deg;
        self.pending_yaw_deg = 0.0;
        self.heading_deg = normalize_angle(self.heading_deg + yaw);
        Some(yaw)
    }

    /// Rotation for the applied pitch, around the local X axis.
    pub fn pitch_rotation(&self) -> Quat {
        Quat::from_rotation_x(self.pitch_deg.to_radians())
    }
}

/// Body rotation after turning right by `yaw_deg`.
pub fn turn_right(rotation: Quat, yaw_deg: f32) -> Quat {
    (Quat::from_rotation_y(-yaw_deg.to_radians()) * rotation).normalize()
}
