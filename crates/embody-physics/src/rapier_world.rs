//! Rapier-backed [`PhysicsWorld`].
//!
//! Owns all Rapier simulation state. World gravity is zero: each
//! locomotion controller applies its own embodiment's gravity while airborne.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::world::{BodyConstraints, BodyHandle, GroundQuery, LayerMask, PhysicsWorld, SurfaceHit};

/// Number of rays on the probe ring around the central ground ray.
pub const PROBE_RING_SAMPLES: usize = 8;

fn vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

/// Handle to a fixed (static) piece of level geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StaticHandle(pub RigidBodyHandle);

/// Central physics simulation resource owning all Rapier state.
#[derive(Resource)]
pub struct RapierWorld {
    /// Timestep and solver configuration.
    pub integration_parameters: IntegrationParameters,
    /// The main simulation pipeline.
    pub physics_pipeline: PhysicsPipeline,
    /// Tracks sleeping/awake body islands.
    pub island_manager: IslandManager,
    /// Broad-phase collision detection (also provides query pipeline).
    pub broad_phase: BroadPhaseBvh,
    /// Narrow-phase collision detection (contact manifolds).
    pub narrow_phase: NarrowPhase,
    /// All rigid bodies in the simulation.
    pub rigid_body_set: RigidBodySet,
    /// All colliders in the simulation.
    pub collider_set: ColliderSet,
    /// Impulse-based joints.
    pub impulse_joint_set: ImpulseJointSet,
    /// Multibody joints.
    pub multibody_joint_set: MultibodyJointSet,
    /// Continuous collision detection solver.
    pub ccd_solver: CCDSolver,
    collider_layers: FxHashMap<ColliderHandle, LayerMask>,
    // Controlled bodies have rotation locked in Rapier, so facing lives here.
    facing: FxHashMap<RigidBodyHandle, Quat>,
}

impl RapierWorld {
    /// Creates an empty world stepping at `dt` seconds.
    pub fn new(dt: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt,
            ..Default::default()
        };

        Self {
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collider_layers: FxHashMap::default(),
            facing: FxHashMap::default(),
        }
    }

    /// Advances the simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            Vector::new(0.0, 0.0, 0.0),
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Fixed timestep in seconds.
    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Spawns a controllable body: dynamic, rotation-locked, undamped ball.
    pub fn spawn_body(&mut self, position: Vec3, radius: f32, layers: LayerMask) -> BodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector(position))
            .lock_rotations()
            .linear_damping(0.0)
            .can_sleep(false)
            .build();
        let handle = self.rigid_body_set.insert(body);

        // Controllers own friction; contacts with level geometry stay frictionless.
        let collider = ColliderBuilder::ball(radius)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.collider_layers.insert(collider_handle, layers);
        self.facing.insert(handle, Quat::IDENTITY);
        debug!(?position, radius, "Spawned controllable body");
        BodyHandle(handle)
    }

    /// Adds a fixed box. `tilt` is an axis-angle rotation (radians).
    pub fn add_static_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        tilt: Vec3,
        layers: LayerMask,
    ) -> StaticHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector(center))
            .rotation(vector(tilt))
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.collider_layers.insert(collider_handle, layers);
        StaticHandle(handle)
    }

    /// Removes a piece of static geometry and its colliders.
    pub fn remove_static(&mut self, handle: StaticHandle) {
        let colliders: Vec<ColliderHandle> = self
            .rigid_body_set
            .get(handle.0)
            .map(|body| body.colliders().to_vec())
            .unwrap_or_default();
        for collider in colliders {
            self.collider_layers.remove(&collider);
        }
        self.rigid_body_set.remove(
            handle.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}

/// Ray origins for a ground probe: the center first, then a ring at `radius`.
pub fn probe_origins(center: Vec3, radius: f32) -> Vec<Vec3> {
    let mut origins = vec![center];
    if radius > 0.0 {
        origins.extend((0..PROBE_RING_SAMPLES).map(|i| {
            let angle = (i as f32 / PROBE_RING_SAMPLES as f32) * std::f32::consts::TAU;
            let (s, c) = angle.sin_cos();
            center + Vec3::new(c * radius, 0.0, s * radius)
        }));
    }
    origins
}

impl PhysicsWorld for RapierWorld {
    fn position(&self, body: BodyHandle) -> Vec3 {
        self.rigid_body_set.get(body.0).map_or(Vec3::ZERO, |b| {
            let t = b.translation();
            Vec3::new(t.x, t.y, t.z)
        })
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(b) = self.rigid_body_set.get_mut(body.0) {
            b.set_translation(vector(position), true);
        }
    }

    fn rotation(&self, body: BodyHandle) -> Quat {
        self.facing.get(&body.0).copied().unwrap_or(Quat::IDENTITY)
    }

    fn set_rotation(&mut self, body: BodyHandle, rotation: Quat) {
        if self.rigid_body_set.contains(body.0) {
            self.facing.insert(body.0, rotation.normalize());
        }
    }

    fn velocity(&self, body: BodyHandle) -> Vec3 {
        self.rigid_body_set.get(body.0).map_or(Vec3::ZERO, |b| {
            let v = b.linvel();
            Vec3::new(v.x, v.y, v.z)
        })
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.rigid_body_set.get_mut(body.0) {
            b.set_linvel(vector(velocity), true);
        }
    }

    fn angular_velocity(&self, body: BodyHandle) -> Vec3 {
        self.rigid_body_set.get(body.0).map_or(Vec3::ZERO, |b| {
            let w = b.angvel();
            Vec3::new(w.x, w.y, w.z)
        })
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: Vec3) {
        if let Some(b) = self.rigid_body_set.get_mut(body.0) {
            b.set_angvel(vector(angular_velocity), true);
        }
    }

    fn query_ground(&self, query: &GroundQuery) -> Vec<SurfaceHit> {
        let layers = query.layers;
        let layer_filter = |handle: ColliderHandle, _collider: &Collider| {
            self.collider_layers
                .get(&handle)
                .is_some_and(|mask| mask.intersects(layers))
        };

        let mut filter = QueryFilter::new().predicate(&layer_filter);
        if let Some(body) = query.exclude {
            filter = filter.exclude_rigid_body(body.0);
        }

        let query_pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.rigid_body_set,
            &self.collider_set,
            filter,
        );

        let down = Vector::new(0.0, -1.0, 0.0);
        probe_origins(query.origin, query.radius)
            .into_iter()
            .filter_map(|origin| {
                let ray = Ray::new(vector(origin), down);
                query_pipeline
                    .cast_ray_and_get_normal(&ray, query.max_distance, true)
                    .map(|(_, hit)| {
                        let n = hit.normal;
                        SurfaceHit {
                            point: origin - Vec3::Y * hit.time_of_impact,
                            normal: Vec3::new(n.x, n.y, n.z),
                        }
                    })
            })
            .collect()
    }

    fn set_frozen(&mut self, body: BodyHandle, frozen: bool) {
        let Some(b) = self.rigid_body_set.get_mut(body.0) else {
            return;
        };
        if frozen {
            b.set_linvel(Vector::new(0.0, 0.0, 0.0), false);
            b.set_angvel(Vector::new(0.0, 0.0, 0.0), false);
            b.set_body_type(RigidBodyType::KinematicPositionBased, false);
        } else {
            b.set_body_type(RigidBodyType::Dynamic, true);
        }
    }

    fn is_frozen(&self, body: BodyHandle) -> bool {
        self.rigid_body_set
            .get(body.0)
            .is_some_and(|b| b.is_kinematic())
    }

    fn set_constraints(&mut self, body: BodyHandle, constraints: BodyConstraints) {
        let Some(b) = self.rigid_body_set.get_mut(body.0) else {
            return;
        };
        match constraints {
            BodyConstraints::Airborne => {
                b.set_locked_axes(LockedAxes::ROTATION_LOCKED, true);
            }
            BodyConstraints::Grounded => {
                b.set_locked_axes(
                    LockedAxes::ROTATION_LOCKED | LockedAxes::TRANSLATION_LOCKED_Y,
                    true,
                );
                let (vx, vz) = {
                    let v = b.linvel();
                    (v.x, v.z)
                };
                b.set_linvel(Vector::new(vx, 0.0, vz), true);
            }
        }
    }
}
