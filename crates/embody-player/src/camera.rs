//! Embodiment cameras and the pose snapshots the transition blends between.

use glam::{Quat, Vec3};

/// A snapshot of camera state for interpolation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSnapshot {
    /// World-space position.
    pub position: Vec3,
    /// Orientation as a unit quaternion.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl CameraSnapshot {
    /// Interpolate toward `to`: position lerp, rotation slerp, FOV lerp.
    pub fn interpolate(&self, to: &CameraSnapshot, t: f32) -> CameraSnapshot {
        CameraSnapshot {
            position: self.position.lerp(to.position, t),
            rotation: self.rotation.slerp(to.rotation, t),
            fov_y: self.fov_y + (to.fov_y - self.fov_y) * t,
        }
    }
}

/// A view into the world. Only enabled cameras render.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    enabled: bool,
}

impl Camera {
    pub fn new(fov_y_deg: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_deg.to_radians(),
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            position: self.position,
            rotation: self.rotation,
            fov_y: self.fov_y,
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: &CameraSnapshot) {
        self.position = snapshot.position;
        self.rotation = snapshot.rotation;
        self.fov_y = snapshot.fov_y;
    }

    /// Place the camera at `offset` in the body frame, looking along body yaw tilted by `pitch`.
    pub fn follow(&mut self, body_position: Vec3, body_rotation: Quat, offset: Vec3, pitch: Quat) {
        self.position = body_position + body_rotation * offset;
        self.rotation = (body_rotation * pitch).normalize();
    }
}
