//! ECS systems wiring the coordinator and physics world into the tick schedules.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::IntoSystemConfigs;
use embody_physics::{GravityState, RapierWorld};
use embody_player::{InputFrame, InputSource, ModeTransitionCoordinator, PlayPhase};
use tracing::{debug, info};

use crate::schedule::{TickSchedule, TickSchedules};

/// The input device polled once per frame.
#[derive(Resource)]
pub struct InputRes(pub Box<dyn InputSource + Send + Sync>);

/// Input polled for the current frame.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct CurrentInput(pub InputFrame);

/// Running counters for the session summary.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SimStats {
    /// Completed embodiment hand-offs.
    pub switches: u32,
    pub standard_ticks: u64,
    pub drone_ticks: u64,
    pub airborne_ticks: u64,
    /// Frames spent in the transitioning phase.
    pub transition_frames: u64,
    pub last_phase: PlayPhase,
}

pub fn poll_input_system(mut input: ResMut<'_, InputRes>, mut current: ResMut<'_, CurrentInput>) {
    current.0 = input.0.poll();
}

pub fn frame_tick_system(
    mut coordinator: ResMut<'_, ModeTransitionCoordinator>,
    mut physics: ResMut<'_, RapierWorld>,
    current: Res<'_, CurrentInput>,
) {
    coordinator.on_frame_tick(&mut *physics, &current.0);
}

pub fn fixed_tick_system(
    mut coordinator: ResMut<'_, ModeTransitionCoordinator>,
    mut physics: ResMut<'_, RapierWorld>,
    mut stats: ResMut<'_, SimStats>,
) {
    let dt = physics.dt();
    if let Some(tick) = coordinator.on_fixed_tick(&mut *physics, dt) {
        match coordinator.phase() {
            PlayPhase::Standard => stats.standard_ticks += 1,
            PlayPhase::Drone => stats.drone_ticks += 1,
            PlayPhase::Transitioning => {}
        }
        if tick.state == GravityState::Airborne {
            stats.airborne_ticks += 1;
        }
    }
    physics.step();
}

pub fn late_frame_system(
    mut coordinator: ResMut<'_, ModeTransitionCoordinator>,
    physics: Res<'_, RapierWorld>,
    mut stats: ResMut<'_, SimStats>,
) {
    coordinator.on_late_frame(&*physics);

    let phase = coordinator.phase();
    if phase == PlayPhase::Transitioning {
        stats.transition_frames += 1;
    }
    if phase != stats.last_phase {
        debug!(from = %stats.last_phase, to = %phase, "Play phase changed");
        if stats.last_phase == PlayPhase::Transitioning {
            stats.switches += 1;
            info!(phase = %phase, switches = stats.switches, "Now controlling {phase}");
        }
        stats.last_phase = phase;
    }
}

/// Register every system in its stage.
pub fn register_systems(schedules: &mut TickSchedules) {
    schedules.add_system(
        TickSchedule::FrameTick,
        (poll_input_system, frame_tick_system).chain(),
    );
    schedules.add_system(TickSchedule::FixedTick, fixed_tick_system);
    schedules.add_system(TickSchedule::LateFrame, late_frame_system);
}
