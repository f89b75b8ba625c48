use super::*;
use crate::world::LayerMask;
use crate::{RapierWorld, StaticHandle};

const DT: f32 = 0.02;
const GROUND: LayerMask = LayerMask(0b10);
const PLAYER: LayerMask = LayerMask(0b100);

fn add_floor(world: &mut RapierWorld) -> StaticHandle {
    world.add_static_box(
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(50.0, 0.5, 50.0),
        Vec3::ZERO,
        GROUND,
    )
}

fn controller(body: BodyHandle) -> LocomotionController {
    LocomotionController::new(
        body,
        MovementConfig::default(),
        GroundSensor::new(Vec3::ZERO, 0.3, GROUND),
    )
}

/// Floor with its top at y = 0 and a standard body resting on it.
fn resting_scene() -> (RapierWorld, LocomotionController) {
    let mut world = RapierWorld::new(DT);
    add_floor(&mut world);
    let body = world.spawn_body(Vec3::new(0.0, 0.5, 0.0), 0.5, PLAYER);
    world.step();
    let mut controller = controller(body);
    controller.initialize(&mut world);
    (world, controller)
}

fn horizontal_speed(world: &RapierWorld, body: BodyHandle) -> f32 {
    let v = world.velocity(body);
    Vec3::new(v.x, 0.0, v.z).length()
}

#[test]
fn test_rest_on_flat_ground() {
    let (mut world, mut controller) = resting_scene();
    let body = controller.body();
    let before = world.position(body);

    let tick = controller.on_fixed_tick(&mut world, DT).unwrap();

    assert_eq!(tick.state, GravityState::Ground);
    assert!(!tick.transitioned);
    assert!(tick.contact);
    assert!(tick.walkable);
    assert!(!tick.snapped);
    assert_eq!(tick.move_state, MoveState::Idle);
    assert_eq!(world.velocity(body), Vec3::ZERO);
    assert!((world.position(body) - before).length() < 1e-6);
}

#[test]
fn test_airborne_gravity_increment() {
    let mut world = RapierWorld::new(DT);
    let body = world.spawn_body(Vec3::new(0.0, 10.0, 0.0), 0.5, PLAYER);
    let mut controller = controller(body).with_initial_state(GravityState::Airborne);
    controller.initialize(&mut world);
    world.set_velocity(body, Vec3::new(0.0, -2.0, 0.0));

    let tick = controller.on_fixed_tick(&mut world, DT).unwrap();

    assert_eq!(tick.state, GravityState::Airborne);
    assert!(!tick.transitioned);
    assert!((world.velocity(body).y - -2.3).abs() < 1e-5);
}

#[test]
fn test_zero_input_converges_to_exact_zero() {
    let (mut world, mut controller) = resting_scene();
    let body = controller.body();
    world.set_velocity(body, Vec3::new(3.0, 0.0, -1.5));

    let mut locked = false;
    for _ in 0..100 {
        let tick = controller.on_fixed_tick(&mut world, DT).unwrap();
        world.step();
        if tick.friction_lock {
            locked = true;
            break;
        }
    }

    assert!(locked, "friction never locked");
    let v = world.velocity(body);
    assert_eq!(v.x, 0.0);
    assert_eq!(v.z, 0.0);
    assert_eq!(controller.move_state(), MoveState::Idle);
}

#[test]
fn test_friction_preserves_vertical_velocity() {
    let mut world = RapierWorld::new(DT);
    let body = world.spawn_body(Vec3::new(0.0, 10.0, 0.0), 0.5, PLAYER);
    let mut controller = controller(body).with_initial_state(GravityState::Airborne);
    controller.initialize(&mut world);
    world.set_velocity(body, Vec3::new(2.0, -1.0, 0.0));

    controller.on_fixed_tick(&mut world, DT).unwrap();

    let v = world.velocity(body);
    assert!((v.x - 1.7).abs() < 1e-5);
    // Only gravity touches the vertical axis.
    assert!((v.y - (-1.0 - 15.0 * DT)).abs() < 1e-5);
}

#[test]
fn test_speed_clamped_to_max() {
    let (mut world, mut controller) = resting_scene();
    let body = controller.body();
    controller.set_input(MoveInput::new(1.0, 0.0));

    let max_speed = controller.config().max_speed;
    for _ in 0..200 {
        controller.on_fixed_tick(&mut world, DT).unwrap();
        assert!(horizontal_speed(&world, body) <= max_speed + 1e-4);
        world.step();
    }
    assert!((horizontal_speed(&world, body) - max_speed).abs() < 1e-3);
    assert_eq!(controller.move_state(), MoveState::Moving);
}

#[test]
fn test_input_follows_planar_facing() {
    let (mut world, mut controller) = resting_scene();
    let body = controller.body();
    // Quarter turn to the right: forward becomes +X.
    world.set_rotation(body, Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2));
    controller.set_input(MoveInput::new(1.0, 0.0));

    controller.on_fixed_tick(&mut world, DT).unwrap();

    let v = world.velocity(body);
    assert!((v.x - 1.2 * 0.85).abs() < 1e-4, "got {v:?}");
    assert!(v.z.abs() < 1e-4);
    assert_eq!(v.y, 0.0);
}

#[test]
fn test_diagonal_input_magnitude_is_clamped() {
    let input = MoveInput::new(1.0, 1.0).clamped();
    let magnitude = (input.forward * input.forward + input.strafe * input.strafe).sqrt();
    assert!((magnitude - 1.0).abs() < 1e-5);
    assert_eq!(MoveInput::new(0.3, 0.0).clamped(), MoveInput::new(0.3, 0.0));
}

#[test]
fn test_queued_yaw_rotates_body() {
    let (mut world, mut controller) = resting_scene();
    let body = controller.body();
    controller.queue_yaw(90.0);

    controller.on_fixed_tick(&mut world, DT).unwrap();

    let (forward, right) = planar_axes(world.rotation(body));
    assert!((forward - Vec3::X).length() < 1e-4, "forward {forward:?}");
    assert!((right - Vec3::Z).length() < 1e-4, "right {right:?}");

    // Consumed: a second tick does not turn further.
    controller.on_fixed_tick(&mut world, DT).unwrap();
    let (forward, _) = planar_axes(world.rotation(body));
    assert!((forward - Vec3::X).length() < 1e-4);
}

#[test]
fn test_ground_snap_when_moving() {
    let mut world = RapierWorld::new(DT);
    add_floor(&mut world);
    let body = world.spawn_body(Vec3::new(0.0, 0.7, 0.0), 0.5, PLAYER);
    world.step();
    let mut controller = controller(body);
    controller.initialize(&mut world);
    world.set_velocity(body, Vec3::new(2.0, 0.0, 0.0));

    let tick = controller.on_fixed_tick(&mut world, DT).unwrap();

    assert!(tick.snapped);
    assert!(!tick.friction_lock);
    assert!((world.position(body).y - 0.5).abs() < 1e-4);
}

#[test]
fn test_no_snap_while_friction_locked() {
    let mut world = RapierWorld::new(DT);
    add_floor(&mut world);
    let body = world.spawn_body(Vec3::new(0.0, 0.7, 0.0), 0.5, PLAYER);
    world.step();
    let mut controller = controller(body);
    controller.initialize(&mut world);

    let tick = controller.on_fixed_tick(&mut world, DT).unwrap();

    assert!(tick.friction_lock);
    assert!(!tick.snapped);
    assert!((world.position(body).y - 0.7).abs() < 1e-4);
}

#[test]
fn test_floor_removed_goes_airborne() {
    let mut world = RapierWorld::new(DT);
    let floor = add_floor(&mut world);
    let body = world.spawn_body(Vec3::new(0.0, 0.5, 0.0), 0.5, PLAYER);
    world.step();
    let mut controller = controller(body);
    controller.initialize(&mut world);
    assert_eq!(controller.on_fixed_tick(&mut world, DT).unwrap().state, GravityState::Ground);

    world.remove_static(floor);
    world.step();
    let tick = controller.on_fixed_tick(&mut world, DT).unwrap();

    assert_eq!(tick.state, GravityState::Airborne);
    assert!(tick.transitioned);
    assert!(!tick.contact);

    // Gravity takes over from the following tick.
    controller.on_fixed_tick(&mut world, DT).unwrap();
    assert!(world.velocity(body).y < 0.0);
}

#[test]
fn test_lands_when_slow_and_close() {
    let mut world = RapierWorld::new(DT);
    add_floor(&mut world);
    let body = world.spawn_body(Vec3::new(0.0, 0.55, 0.0), 0.5, PLAYER);
    world.step();
    let mut controller = controller(body).with_initial_state(GravityState::Airborne);
    controller.initialize(&mut world);
    world.set_velocity(body, Vec3::new(0.0, -0.05, 0.0));

    let tick = controller.on_fixed_tick(&mut world, DT).unwrap();

    assert_eq!(tick.state, GravityState::Ground);
    assert!(tick.transitioned);
    assert_eq!(world.velocity(body).y, 0.0);
}

#[test]
fn test_fast_fall_does_not_land() {
    let mut world = RapierWorld::new(DT);
    add_floor(&mut world);
    let body = world.spawn_body(Vec3::new(0.0, 0.55, 0.0), 0.5, PLAYER);
    world.step();
    let mut controller = controller(body).with_initial_state(GravityState::Airborne);
    controller.initialize(&mut world);
    world.set_velocity(body, Vec3::new(0.0, -3.0, 0.0));

    let tick = controller.on_fixed_tick(&mut world, DT).unwrap();

    assert_eq!(tick.state, GravityState::Airborne);
    assert!(tick.contact);
    assert!(world.velocity(body).y < -3.0);
}

#[test]
fn test_falls_and_lands_on_floor() {
    let mut world = RapierWorld::new(DT);
    add_floor(&mut world);
    let body = world.spawn_body(Vec3::new(0.0, 2.0, 0.0), 0.5, PLAYER);
    world.step();
    let mut controller = controller(body).with_initial_state(GravityState::Airborne);
    controller.initialize(&mut world);

    let mut landed = false;
    for _ in 0..300 {
        let tick = controller.on_fixed_tick(&mut world, DT).unwrap();
        // Ground only while the probe reports contact.
        if tick.state == GravityState::Ground {
            assert!(tick.contact);
            landed = true;
            break;
        }
        world.step();
    }
    assert!(landed, "body never landed");
    assert!(world.position(body).y < 0.7);
}

#[test]
fn test_disabled_controller_does_nothing() {
    let (mut world, mut controller) = resting_scene();
    let body = controller.body();
    world.set_velocity(body, Vec3::new(4.0, 0.0, 0.0));
    controller.set_enabled(false);
    controller.set_input(MoveInput::new(1.0, 0.0));
    controller.queue_yaw(45.0);

    assert!(controller.on_fixed_tick(&mut world, DT).is_none());
    assert_eq!(world.velocity(body), Vec3::new(4.0, 0.0, 0.0));
    assert_eq!(world.rotation(body), Quat::IDENTITY);

    // Input sent while disabled was discarded.
    controller.set_enabled(true);
    world.set_velocity(body, Vec3::ZERO);
    let tick = controller.on_fixed_tick(&mut world, DT).unwrap();
    assert_eq!(tick.move_state, MoveState::Idle);
}

#[test]
fn test_gravity_state_constraint_profiles() {
    assert_eq!(GravityState::Ground.constraints(), BodyConstraints::Grounded);
    assert_eq!(GravityState::Airborne.constraints(), BodyConstraints::Airborne);
}
