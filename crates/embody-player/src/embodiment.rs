//! One controllable body with its locomotion, look, camera and visual profile.

use std::fmt;

use embody_config::{EmbodimentConfig, YawRouting};
use embody_physics::{
    BodyHandle, GroundSensor, LayerMask, LocomotionController, LocomotionTick, PhysicsWorld,
    RapierWorld, planar_axes,
};
use glam::Vec3;

use crate::camera::Camera;
use crate::input::InputFrame;
use crate::look::{LookController, turn_right};
use crate::visual::VisualSnapshot;

/// Collision layer controllable bodies are placed on.
pub const BODY_LAYER: &str = "player";

/// Which of the two bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmbodimentKind {
    Standard,
    Drone,
}

impl EmbodimentKind {
    pub fn other(self) -> Self {
        match self {
            Self::Standard => Self::Drone,
            Self::Drone => Self::Standard,
        }
    }
}

impl fmt::Display for EmbodimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Drone => f.write_str("drone"),
        }
    }
}

#[derive(Debug)]
pub struct Embodiment {
    kind: EmbodimentKind,
    body: BodyHandle,
    locomotion: LocomotionController,
    look: LookController,
    camera: Camera,
    camera_offset: Vec3,
    visual_profile: VisualSnapshot,
}

impl Embodiment {
    /// Wire controllers for an existing body.
    pub fn new(
        kind: EmbodimentKind,
        body: BodyHandle,
        config: &EmbodimentConfig,
        layer_table: &[String],
    ) -> Self {
        let sensor = GroundSensor::from_config(&config.movement, layer_table);
        Self {
            kind,
            body,
            locomotion: LocomotionController::new(body, config.movement.clone(), sensor),
            look: LookController::new(config.look.clone()),
            camera: Camera::new(config.camera.fov_deg),
            camera_offset: Vec3::from_array(config.camera.offset),
            visual_profile: VisualSnapshot::from(config.visual.clone()),
        }
    }

    /// Spawn the body described by `config` and wire controllers for it.
    pub fn spawn(
        world: &mut RapierWorld,
        kind: EmbodimentKind,
        config: &EmbodimentConfig,
        layer_table: &[String],
    ) -> Self {
        let layers = LayerMask::from_names(&[BODY_LAYER], layer_table);
        let body = world.spawn_body(
            Vec3::from_array(config.body.spawn),
            config.body.radius,
            layers,
        );
        Self::new(kind, body, config, layer_table)
    }

    pub fn kind(&self) -> EmbodimentKind {
        self.kind
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    pub fn look(&self) -> &LookController {
        &self.look
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn visual_profile(&self) -> &VisualSnapshot {
        &self.visual_profile
    }

    /// Report initial constraints and place the camera.
    pub fn initialize<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        self.locomotion.initialize(world);
        self.sync_camera(world);
    }

    /// Frame tick: sample look input and latch movement input.
    pub fn on_frame_tick(&mut self, input: &InputFrame) {
        self.look.sample(input.look_x, input.look_y);
        self.locomotion.set_input(input.movement());
    }

    /// Fixed tick: apply look, route yaw, run locomotion.
    pub fn on_fixed_tick<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        dt: f32,
    ) -> Option<LocomotionTick> {
        if let Some(yaw) = self.look.apply()
            && yaw != 0.0
        {
            match self.look.yaw_routing() {
                YawRouting::Direct => {
                    let rotation = world.rotation(self.body);
                    world.set_rotation(self.body, turn_right(rotation, yaw));
                }
                YawRouting::Companion => self.locomotion.queue_yaw(yaw),
            }
        }
        self.locomotion.on_fixed_tick(world, dt)
    }

    /// Move the camera to the body: offset in the body frame, body yaw with look pitch.
    pub fn sync_camera<W: PhysicsWorld + ?Sized>(&mut self, world: &W) {
        self.camera.follow(
            world.position(self.body),
            world.rotation(self.body),
            self.camera_offset,
            self.look.pitch_rotation(),
        );
    }

    pub fn set_controls_enabled(&mut self, enabled: bool) {
        self.locomotion.set_enabled(enabled);
        self.look.set_disabled(!enabled);
    }

    pub fn controls_enabled(&self) -> bool {
        self.locomotion.is_enabled() && !self.look.is_disabled()
    }

    pub fn set_frozen<W: PhysicsWorld + ?Sized>(&self, world: &mut W, frozen: bool) {
        world.set_frozen(self.body, frozen);
    }

    pub fn vertical_velocity<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f32 {
        world.velocity(self.body).y
    }

    /// Horizontal facing direction.
    pub fn planar_forward<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Vec3 {
        planar_axes(world.rotation(self.body)).0
    }

    /// Horizontal right direction.
    pub fn planar_right<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Vec3 {
        planar_axes(world.rotation(self.body)).1
    }
}
