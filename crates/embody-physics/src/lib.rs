//! Physics for embody: the [`PhysicsWorld`] contract, its Rapier backend,
//! ground sensing, and the ground/airborne locomotion controller.

mod ground_sensor;
mod locomotion;
mod rapier_world;
mod world;

pub use ground_sensor::{Contact, ContactResult, GroundSensor, slope_angle_deg};
pub use locomotion::{
    GravityState, LocomotionController, LocomotionTick, MoveInput, MoveState, planar_axes,
};
pub use rapier_world::{PROBE_RING_SAMPLES, RapierWorld, StaticHandle, probe_origins};
pub use world::{BodyConstraints, BodyHandle, GroundQuery, LayerMask, PhysicsWorld, SurfaceHit};
