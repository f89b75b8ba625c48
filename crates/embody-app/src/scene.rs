//! Demo level and scripted input for the headless sandbox.

use bevy_ecs::prelude::*;
use embody_config::Config;
use embody_physics::{LayerMask, RapierWorld, StaticHandle};
use embody_player::{
    Embodiment, EmbodimentKind, InputFrame, InputSource, ModeTransitionCoordinator, ScriptedInput,
};
use glam::Vec3;
use tracing::info;

use crate::systems::{CurrentInput, InputRes, SimStats};
use crate::time::TimeRes;

/// Static geometry of the demo level.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DemoLevel {
    pub floor: StaticHandle,
    pub ramp: StaticHandle,
}

/// Add a flat floor (top at y = 0) and a 20 degree ramp on the ground layer.
pub fn build_level(physics: &mut RapierWorld, config: &Config) -> DemoLevel {
    let ground = LayerMask::from_names(&["ground"], &config.physics.layers);
    let floor = physics.add_static_box(
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(40.0, 0.5, 40.0),
        Vec3::ZERO,
        ground,
    );
    let ramp = physics.add_static_box(
        Vec3::new(12.0, 0.0, 12.0),
        Vec3::new(3.0, 0.5, 2.0),
        Vec3::new(0.0, 0.0, 20f32.to_radians()),
        ground,
    );
    DemoLevel { floor, ramp }
}

/// Build the physics world, both embodiments and the coordinator from `config`.
pub fn build_simulation(config: &Config) -> (RapierWorld, ModeTransitionCoordinator, DemoLevel) {
    let table = &config.physics.layers;
    let mut physics = RapierWorld::new(config.physics.fixed_dt as f32);
    let level = build_level(&mut physics, config);

    let standard = Embodiment::spawn(&mut physics, EmbodimentKind::Standard, &config.standard, table);
    let drone = Embodiment::spawn(&mut physics, EmbodimentKind::Drone, &config.drone, table);
    // Populate the broad phase so the first ground probe sees the level.
    physics.step();

    let mut coordinator = ModeTransitionCoordinator::new(standard, drone, config);
    coordinator.initialize(&mut physics);
    (physics, coordinator, level)
}

/// Create the ECS world holding every resource the systems need.
pub fn create_world(config: &Config, input: impl InputSource + Send + Sync + 'static) -> World {
    let (physics, coordinator, level) = build_simulation(config);
    let stats = SimStats {
        last_phase: coordinator.phase(),
        ..SimStats::default()
    };
    info!(phase = %coordinator.phase(), "Simulation ready");

    let mut world = World::new();
    world.insert_resource(TimeRes::default());
    world.insert_resource(InputRes(Box::new(input)));
    world.insert_resource(CurrentInput::default());
    world.insert_resource(stats);
    world.insert_resource(level);
    world.insert_resource(physics);
    world.insert_resource(coordinator);
    world
}

/// Walk, switch to the drone, fly around, switch back.
pub fn demo_script() -> ScriptedInput {
    let walk = InputFrame {
        forward: 1.0,
        ..InputFrame::default()
    };
    let walk_turning = InputFrame {
        forward: 1.0,
        look_x: 1.5,
        look_y: 0.2,
        ..InputFrame::default()
    };
    let fly = InputFrame {
        forward: 1.0,
        strafe: 0.3,
        look_x: -2.0,
        ..InputFrame::default()
    };
    let idle = InputFrame::default();

    ScriptedInput::default()
        .then(walk, 60)
        .then(walk_turning, 30)
        .then(idle, 30)
        .then_switch()
        .then(idle, 80)
        .then(fly, 90)
        .then(idle, 30)
        .then_switch()
        .then(idle, 80)
}
