//! The physics-world contract that the controllers are written against.
//!
//! Controllers never reach into an engine directly. They read body state,
//! request velocity changes, and run layered ground queries through
//! [`PhysicsWorld`]. [`RapierWorld`](crate::RapierWorld) is the engine-backed
//! implementation.

use std::ops::BitOr;

use glam::{Quat, Vec3};
use rapier3d::prelude::RigidBodyHandle;
use tracing::warn;

/// Opaque handle to a simulated body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub RigidBodyHandle);

/// Bit set of collision layers. Layer `n` is bit `n`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Matches every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Mask containing the single layer at `index`. Indices past 31 yield [`LayerMask::NONE`].
    pub fn layer(index: u32) -> Self {
        1u32.checked_shl(index).map_or(Self::NONE, Self)
    }

    /// Whether the two masks share at least one layer.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Resolve layer names against the layer table once at setup.
    ///
    /// A name's layer index is its position in `table`. Unknown names are
    /// reported and skipped.
    pub fn from_names<S: AsRef<str>>(names: &[S], table: &[String]) -> Self {
        names.iter().fold(Self::NONE, |mask, name| {
            let name = name.as_ref();
            match table.iter().position(|layer| layer == name) {
                Some(index) if index < 32 => mask | Self::layer(index as u32),
                Some(index) => {
                    warn!("Layer '{name}' at index {index} exceeds the 32-layer limit");
                    mask
                }
                None => {
                    warn!("Unknown collision layer '{name}', ignoring");
                    mask
                }
            }
        })
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Movement constraints reported to the engine on gravity-state changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyConstraints {
    /// Rotation locked; translation free on all axes.
    Airborne,
    /// Rotation and vertical translation locked.
    Grounded,
}

/// One surface found by a ground query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    /// Closest point on the surface along the probe.
    pub point: Vec3,
    /// Unit surface normal at `point`.
    pub normal: Vec3,
}

/// Parameters of a downward ground query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundQuery {
    /// Probe origin in world space.
    pub origin: Vec3,
    /// Maximum reach below the origin.
    pub max_distance: f32,
    /// Radius of the probe footprint around the origin.
    pub radius: f32,
    /// Only surfaces on these layers are reported.
    pub layers: LayerMask,
    /// Body whose own colliders are ignored.
    pub exclude: Option<BodyHandle>,
}

/// Read/write access to simulated bodies plus spatial queries.
///
/// Unknown handles read as zero/identity and writes to them are ignored.
pub trait PhysicsWorld {
    /// World-space position of the body origin.
    fn position(&self, body: BodyHandle) -> Vec3;

    /// Teleport the body. Reserved for controlled resets.
    fn set_position(&mut self, body: BodyHandle, position: Vec3);

    /// Body orientation.
    fn rotation(&self, body: BodyHandle) -> Quat;

    /// Replace the body orientation.
    fn set_rotation(&mut self, body: BodyHandle, rotation: Quat);

    /// Linear velocity.
    fn velocity(&self, body: BodyHandle) -> Vec3;

    /// Overwrite linear velocity.
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Angular velocity.
    fn angular_velocity(&self, body: BodyHandle) -> Vec3;

    /// Overwrite angular velocity.
    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: Vec3);

    /// Instantaneous velocity change, independent of mass.
    fn apply_velocity_change(&mut self, body: BodyHandle, delta: Vec3) {
        let velocity = self.velocity(body);
        self.set_velocity(body, velocity + delta);
    }

    /// Constant acceleration over one step of `dt` seconds, independent of mass.
    fn apply_acceleration(&mut self, body: BodyHandle, acceleration: Vec3, dt: f32) {
        self.apply_velocity_change(body, acceleration * dt);
    }

    /// Surfaces below `query.origin`, in query order.
    fn query_ground(&self, query: &GroundQuery) -> Vec<SurfaceHit>;

    /// Freeze (zero velocity, suspend integration) or wake a body.
    fn set_frozen(&mut self, body: BodyHandle, frozen: bool);

    /// Whether the body is currently frozen.
    fn is_frozen(&self, body: BodyHandle) -> bool;

    /// Apply a movement constraint profile.
    fn set_constraints(&mut self, body: BodyHandle, constraints: BodyConstraints);
}
