//! Tick schedule labels and the fixed-timestep schedule runner.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::{IntoSystemConfigs, ScheduleLabel};
use tracing::warn;

use crate::time::TimeRes;

/// Maximum number of fixed steps per frame to prevent spiral-of-death.
pub const MAX_FIXED_STEPS_PER_FRAME: u32 = 10;

/// Frames longer than this are clamped (seconds).
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Labels for each stage of a frame, run in the order listed.
#[derive(ScheduleLabel, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSchedule {
    /// Input poll, look sampling, switch handling, transition step.
    FrameTick,
    /// Locomotion, look application, physics step. Zero or more times per frame.
    FixedTick,
    /// Camera follow.
    LateFrame,
}

/// Ordered [`Schedule`]s driving one frame, with an accumulator for the fixed tick.
pub struct TickSchedules {
    schedules: Vec<(TickSchedule, Schedule)>,
    fixed_accumulator: f64,
    fixed_dt: f64,
}

impl TickSchedules {
    /// `fixed_dt` is the fixed tick length in seconds.
    pub fn new(fixed_dt: f64) -> Self {
        let schedules = [
            TickSchedule::FrameTick,
            TickSchedule::FixedTick,
            TickSchedule::LateFrame,
        ]
        .into_iter()
        .map(|label| (label, Schedule::new(label)))
        .collect();

        Self {
            schedules,
            fixed_accumulator: 0.0,
            fixed_dt,
        }
    }

    /// Register a system (or system tuple) into a stage.
    pub fn add_system<M>(&mut self, stage: TickSchedule, system: impl IntoSystemConfigs<M>) {
        if let Some(schedule) = self.get_schedule_mut(stage) {
            schedule.add_systems(system);
        }
    }

    /// Run one frame of `frame_dt` seconds. Returns how many fixed ticks ran.
    pub fn run(&mut self, world: &mut World, frame_dt: f64) -> u32 {
        let mut frame_dt = frame_dt.max(0.0);
        if frame_dt > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_dt * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_dt = MAX_FRAME_TIME;
        }

        if let Some(mut time) = world.get_resource_mut::<TimeRes>() {
            time.delta = frame_dt as f32;
            time.fixed_dt = self.fixed_dt as f32;
            time.frame += 1;
        }

        self.run_stage(TickSchedule::FrameTick, world);

        self.fixed_accumulator += frame_dt;
        let mut steps: u32 = 0;
        while self.fixed_accumulator >= self.fixed_dt && steps < MAX_FIXED_STEPS_PER_FRAME {
            self.run_stage(TickSchedule::FixedTick, world);
            self.fixed_accumulator -= self.fixed_dt;
            steps += 1;
        }
        if steps == MAX_FIXED_STEPS_PER_FRAME && self.fixed_accumulator >= self.fixed_dt {
            // Drop the backlog rather than catching up next frame.
            self.fixed_accumulator %= self.fixed_dt;
        }
        if let Some(mut time) = world.get_resource_mut::<TimeRes>() {
            time.fixed_ticks += u64::from(steps);
        }

        self.run_stage(TickSchedule::LateFrame, world);
        steps
    }

    pub fn fixed_accumulator(&self) -> f64 {
        self.fixed_accumulator
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn get_schedule_mut(&mut self, stage: TickSchedule) -> Option<&mut Schedule> {
        self.schedules
            .iter_mut()
            .find(|(label, _)| *label == stage)
            .map(|(_, schedule)| schedule)
    }

    fn run_stage(&mut self, target: TickSchedule, world: &mut World) {
        if let Some(schedule) = self.get_schedule_mut(target) {
            schedule.run(world);
        }
    }
}
