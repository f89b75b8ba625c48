//! Headless embody sandbox: tick schedules on a bevy_ecs world, a demo
//! level, and scripted input driving the mode coordinator.

pub mod scene;
pub mod schedule;
pub mod systems;
pub mod time;

use bevy_ecs::prelude::*;
use embody_config::Config;
use embody_player::{InputSource, ModeTransitionCoordinator};

pub use scene::{DemoLevel, build_level, build_simulation, create_world, demo_script};
pub use schedule::{MAX_FIXED_STEPS_PER_FRAME, MAX_FRAME_TIME, TickSchedule, TickSchedules};
pub use systems::{CurrentInput, InputRes, SimStats, register_systems};
pub use time::TimeRes;

/// A fully wired simulation: ECS world plus its schedules.
pub struct EmbodyApp {
    pub world: World,
    pub schedules: TickSchedules,
}

impl EmbodyApp {
    pub fn new(config: &Config, input: impl InputSource + Send + Sync + 'static) -> Self {
        let mut config = config.clone();
        config.validate();
        let world = create_world(&config, input);
        let mut schedules = TickSchedules::new(config.physics.fixed_dt);
        register_systems(&mut schedules);
        Self { world, schedules }
    }

    /// Run a single frame of `frame_dt` seconds. Returns the fixed ticks run.
    pub fn run_frame(&mut self, frame_dt: f64) -> u32 {
        self.schedules.run(&mut self.world, frame_dt)
    }

    /// Run `frames` frames of exactly one fixed tick each.
    pub fn run_frames(&mut self, frames: u32) {
        let dt = self.schedules.fixed_dt();
        for _ in 0..frames {
            self.run_frame(dt);
        }
    }

    pub fn coordinator(&self) -> &ModeTransitionCoordinator {
        self.world.resource::<ModeTransitionCoordinator>()
    }

    pub fn stats(&self) -> &SimStats {
        self.world.resource::<SimStats>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embody_physics::{GravityState, PhysicsWorld, RapierWorld};
    use glam::{Quat, Vec3};
    use embody_player::{EmbodimentKind, InputFrame, PlayPhase, ScriptedInput};

    fn test_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_app_starts_in_configured_phase() {
        let config = Config {
            start_phase: "drone".to_string(),
            ..test_config()
        };
        let app = EmbodyApp::new(&config, ScriptedInput::default());
        assert_eq!(app.coordinator().phase(), PlayPhase::Drone);
        assert_eq!(app.stats().last_phase, PlayPhase::Drone);
    }

    #[test]
    fn test_idle_bodies_stay_on_the_floor() {
        let mut app = EmbodyApp::new(&test_config(), ScriptedInput::default());
        app.run_frames(100);

        let physics = app.world.resource::<RapierWorld>();
        let coordinator = app.coordinator();
        let standard = coordinator.embodiment(EmbodimentKind::Standard).body();
        let drone = coordinator.embodiment(EmbodimentKind::Drone).body();
        assert!((physics.position(standard) - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-3);
        assert!((physics.position(drone) - Vec3::new(2.0, 0.25, 0.0)).length() < 1e-3);
        assert_eq!(app.stats().standard_ticks, 100);
        assert_eq!(app.stats().airborne_ticks, 0);
    }

    #[test]
    fn test_demo_script_switches_there_and_back() {
        let script = demo_script();
        let frames = script.remaining() as u32 + 10;
        let mut app = EmbodyApp::new(&test_config(), script);
        app.run_frames(frames);

        let stats = app.stats().clone();
        assert_eq!(stats.switches, 2);
        assert_eq!(stats.transition_frames, 2 * (12 + 45 + 12));
        assert!(stats.drone_ticks > 0);
        assert_eq!(app.coordinator().phase(), PlayPhase::Standard);
        assert_eq!(app.coordinator().volume().weight, 0.0);

        let physics = app.world.resource::<RapierWorld>();
        let standard = app.coordinator().embodiment(EmbodimentKind::Standard);
        assert!(physics.position(standard.body()).z < -1.0, "standard should have walked");
        assert!(standard.camera().is_enabled());
        assert!(!app.coordinator().embodiment(EmbodimentKind::Drone).camera().is_enabled());
    }

    #[test]
    fn test_camera_follows_active_body_each_frame() {
        let walk = InputFrame {
            forward: 1.0,
            ..InputFrame::default()
        };
        let mut app = EmbodyApp::new(&test_config(), ScriptedInput::default().then(walk, 20));
        app.run_frames(20);

        let physics = app.world.resource::<RapierWorld>();
        let standard = app.coordinator().embodiment(EmbodimentKind::Standard);
        let expected = physics.position(standard.body()) + Vec3::new(0.0, 0.6, 0.0);
        assert!((standard.camera().position - expected).length() < 1e-4);
    }

    #[test]
    fn test_long_frame_runs_capped_fixed_ticks() {
        let mut app = EmbodyApp::new(&test_config(), ScriptedInput::default());
        // 0.25s clamp over a 20ms tick allows at most the per-frame cap.
        let steps = app.run_frame(1.0);
        assert!(steps <= MAX_FIXED_STEPS_PER_FRAME);
        assert!(steps >= 10);
        assert_eq!(app.world.resource::<TimeRes>().fixed_ticks, u64::from(steps));
    }

    #[test]
    fn test_standard_walks_up_demo_ramp() {
        let walk = InputFrame {
            forward: 1.0,
            ..InputFrame::default()
        };
        let mut app = EmbodyApp::new(&test_config(), ScriptedInput::default().then(walk, 200));
        let body = app.coordinator().embodiment(EmbodimentKind::Standard).body();
        {
            // Foot of the ramp is at x = 10.54, rising towards +x.
            let mut physics = app.world.resource_mut::<RapierWorld>();
            physics.set_position(body, Vec3::new(6.0, 0.5, 12.0));
            physics.set_rotation(body, Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2));
        }

        let dt = app.schedules.fixed_dt();
        let mut position = Vec3::ZERO;
        for _ in 0..200 {
            app.run_frame(dt);
            position = app.world.resource::<RapierWorld>().position(body);
            let state = app
                .coordinator()
                .embodiment(EmbodimentKind::Standard)
                .locomotion()
                .state();
            assert_eq!(state, GravityState::Ground, "left the ground at {position}");
            if position.x > 14.0 {
                break;
            }
        }

        assert!(position.x > 14.0, "stopped at {position}");
        assert!(position.y > 1.5, "did not climb: {position}");
        assert_eq!(app.stats().airborne_ticks, 0);
    }

    #[test]
    fn test_zero_fixed_dt_keeps_ticking() {
        let mut config = test_config();
        config.physics.fixed_dt = 0.0;
        let mut app = EmbodyApp::new(&config, ScriptedInput::default());
        assert_eq!(app.schedules.fixed_dt(), 0.02);
        assert_eq!(app.world.resource::<RapierWorld>().dt(), 0.02);

        let steps: Vec<u32> = (0..3).map(|_| app.run_frame(0.02)).collect();
        assert_eq!(steps, vec![1, 1, 1]);
        assert!(app.schedules.fixed_accumulator().is_finite());
    }
}
