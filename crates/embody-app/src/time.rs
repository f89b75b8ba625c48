//! Time resource for the ECS world.

use bevy_ecs::prelude::*;

/// Frame timing, updated by [`TickSchedules`](crate::TickSchedules) before each frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct TimeRes {
    /// Clamped seconds elapsed since the previous frame.
    pub delta: f32,
    /// Fixed tick length in seconds.
    pub fixed_dt: f32,
    /// Frames run so far.
    pub frame: u64,
    /// Fixed ticks run so far.
    pub fixed_ticks: u64,
}
