//! Ground/airborne locomotion.
//!
//! One controller shape drives both embodiments; only the [`MovementConfig`]
//! differs. Each fixed tick runs queued yaw, ground probe, input, friction,
//! state logic (snap, landing, gravity), then the horizontal speed clamp.

use embody_config::MovementConfig;
use glam::{Quat, Vec3};
use tracing::{debug, trace};

use crate::ground_sensor::{ContactResult, GroundSensor};
use crate::world::{BodyConstraints, BodyHandle, PhysicsWorld};

/// Whether the body is supported by ground.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GravityState {
    #[default]
    Ground,
    Airborne,
}

impl GravityState {
    /// Constraint profile the physics world applies in this state.
    pub fn constraints(self) -> BodyConstraints {
        match self {
            Self::Ground => BodyConstraints::Grounded,
            Self::Airborne => BodyConstraints::Airborne,
        }
    }
}

/// Whether the body currently has horizontal motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MoveState {
    #[default]
    Idle,
    Moving,
}

/// Horizontal movement input. Positive forward walks along the facing, positive strafe to the right.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoveInput {
    pub forward: f32,
    pub strafe: f32,
}

impl MoveInput {
    pub fn new(forward: f32, strafe: f32) -> Self {
        Self { forward, strafe }
    }

    pub fn is_zero(&self) -> bool {
        self.forward == 0.0 && self.strafe == 0.0
    }

    /// Same direction with magnitude at most 1.
    pub fn clamped(self) -> Self {
        let v = glam::Vec2::new(self.strafe, self.forward).clamp_length_max(1.0);
        Self {
            forward: v.y,
            strafe: v.x,
        }
    }
}

/// Planar forward and right axes for a body orientation (y = 0, normalized).
pub fn planar_axes(rotation: Quat) -> (Vec3, Vec3) {
    let forward = rotation * Vec3::NEG_Z;
    let right = rotation * Vec3::X;
    (
        Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero(),
        Vec3::new(right.x, 0.0, right.z).normalize_or_zero(),
    )
}

/// What happened during one fixed tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocomotionTick {
    pub state: GravityState,
    /// The gravity state changed this tick.
    pub transitioned: bool,
    pub contact: bool,
    /// Advisory slope check on the nearest contact.
    pub walkable: bool,
    pub friction_lock: bool,
    /// A ground snap moved the body.
    pub snapped: bool,
    pub move_state: MoveState,
}

/// Per-embodiment ground/airborne state machine.
#[derive(Debug, Clone)]
pub struct LocomotionController {
    body: BodyHandle,
    config: MovementConfig,
    sensor: GroundSensor,
    state: GravityState,
    move_state: MoveState,
    enabled: bool,
    input: MoveInput,
    pending_yaw_deg: f32,
    friction_lock: bool,
}

impl LocomotionController {
    pub fn new(body: BodyHandle, config: MovementConfig, sensor: GroundSensor) -> Self {
        Self {
            body,
            config,
            sensor,
            state: GravityState::Ground,
            move_state: MoveState::Idle,
            enabled: true,
            input: MoveInput::default(),
            pending_yaw_deg: 0.0,
            friction_lock: false,
        }
    }

    /// Start in `state` instead of `Ground`.
    pub fn with_initial_state(mut self, state: GravityState) -> Self {
        self.state = state;
        self
    }

    /// Report the initial constraint profile to the physics world.
    pub fn initialize<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        world.set_constraints(self.body, self.state.constraints());
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn sensor(&self) -> &GroundSensor {
        &self.sensor
    }

    pub fn state(&self) -> GravityState {
        self.state
    }

    pub fn move_state(&self) -> MoveState {
        self.move_state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn friction_lock(&self) -> bool {
        self.friction_lock
    }

    /// Enable or disable ticking. Disabling discards pending input and yaw.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.input = MoveInput::default();
            self.pending_yaw_deg = 0.0;
        }
    }

    /// Latest movement input, consumed on each fixed tick until replaced.
    pub fn set_input(&mut self, input: MoveInput) {
        if self.enabled {
            self.input = input;
        }
    }

    /// Queue a yaw delta (degrees, positive turns right) applied on the next tick.
    pub fn queue_yaw(&mut self, yaw_deg: f32) {
        if self.enabled {
            self.pending_yaw_deg += yaw_deg;
        }
    }

    /// Advance one fixed tick. Returns `None` while disabled.
    pub fn on_fixed_tick<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        dt: f32,
    ) -> Option<LocomotionTick> {
        if !self.enabled {
            return None;
        }

        self.apply_queued_yaw(world);

        let distance = match self.state {
            GravityState::Ground => self.config.ground_probe_distance,
            GravityState::Airborne => self.config.airborne_probe_distance,
        };
        let contacts = self.sensor.probe(world, self.body, distance);

        self.apply_input(world);
        self.friction_lock = self.apply_friction(world);

        let previous = self.state;
        let snapped = match self.state {
            GravityState::Ground => self.ground_update(world, &contacts),
            GravityState::Airborne => {
                self.airborne_update(world, &contacts, dt);
                false
            }
        };

        self.clamp_speed(world);

        let velocity = world.velocity(self.body);
        self.move_state = if Vec3::new(velocity.x, 0.0, velocity.z) == Vec3::ZERO {
            MoveState::Idle
        } else {
            MoveState::Moving
        };

        let walkable = contacts.is_walkable(self.config.max_slope_deg);
        if self.state == GravityState::Ground && contacts.has_contact() && !walkable {
            trace!(body = ?self.body, "Standing on a surface steeper than the walkable limit");
        }

        Some(LocomotionTick {
            state: self.state,
            transitioned: previous != self.state,
            contact: contacts.has_contact(),
            walkable,
            friction_lock: self.friction_lock,
            snapped,
            move_state: self.move_state,
        })
    }

    fn apply_queued_yaw<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        if self.pending_yaw_deg == 0.0 {
            return;
        }
        let turn = Quat::from_rotation_y(-self.pending_yaw_deg.to_radians());
        let rotation = world.rotation(self.body);
        world.set_rotation(self.body, turn * rotation);
        self.pending_yaw_deg = 0.0;
    }

    fn apply_input<W: PhysicsWorld + ?Sized>(&self, world: &mut W) {
        let input = self.input.clamped();
        if input.is_zero() {
            return;
        }
        let (forward, right) = planar_axes(world.rotation(self.body));
        let mut delta = (forward * input.forward + right * input.strafe) * self.config.acceleration;
        delta.y = 0.0;
        world.apply_velocity_change(self.body, delta);
    }

    /// Returns whether horizontal velocity was snapped to zero this tick.
    fn apply_friction<W: PhysicsWorld + ?Sized>(&self, world: &mut W) -> bool {
        let velocity = world.velocity(self.body);
        let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);

        let mut damping = -horizontal * self.config.friction;
        if damping.length() >= self.config.max_speed {
            damping = -horizontal;
        }

        if (horizontal + damping).length() < self.config.friction_epsilon {
            if horizontal != Vec3::ZERO {
                world.set_velocity(self.body, Vec3::new(0.0, velocity.y, 0.0));
            }
            return true;
        }

        world.apply_velocity_change(self.body, damping);
        false
    }

    /// Returns whether a snap moved the body.
    fn ground_update<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        contacts: &ContactResult,
    ) -> bool {
        let Some(nearest) = contacts.nearest() else {
            self.set_state(world, GravityState::Airborne);
            return false;
        };
        if self.friction_lock {
            return false;
        }

        let position = world.position(self.body);
        let target = nearest.point.y + self.config.ground_offset;
        if position.y == target {
            return false;
        }
        world.set_position(self.body, Vec3::new(position.x, target, position.z));
        true
    }

    fn airborne_update<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        contacts: &ContactResult,
        dt: f32,
    ) {
        let velocity = world.velocity(self.body);
        if contacts.has_contact() && velocity.y.abs() < self.config.landing_speed {
            world.set_velocity(self.body, Vec3::new(velocity.x, 0.0, velocity.z));
            self.set_state(world, GravityState::Ground);
        } else {
            world.apply_acceleration(self.body, Vec3::NEG_Y * self.config.gravity, dt);
        }
    }

    fn clamp_speed<W: PhysicsWorld + ?Sized>(&self, world: &mut W) {
        let velocity = world.velocity(self.body);
        let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
        if horizontal.length() > self.config.max_speed {
            let clamped = horizontal.clamp_length_max(self.config.max_speed);
            world.set_velocity(self.body, Vec3::new(clamped.x, velocity.y, clamped.z));
        }
    }

    fn set_state<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, state: GravityState) {
        if self.state == state {
            return;
        }
        debug!(body = ?self.body, from = ?self.state, to = ?state, "Gravity state changed");
        self.state = state;
        world.set_constraints(self.body, state.constraints());
    }
}

#[cfg(test)]
#[path = "locomotion_tests.rs"]
mod tests;
