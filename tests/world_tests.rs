use std::cell::RefCell;
use std::rc::Rc;

use kinetica::*;

const DT: f32 = 1.0 / 60.0;

fn world_without_gravity() -> PhysicsWorld {
    PhysicsWorld::new(
        WorldConfig {
            gravity: Vec3::ZERO,
            ..WorldConfig::default()
        },
        SolverConfig::default(),
    )
}

fn add_ground_plane(world: &mut PhysicsWorld) -> EntityId {
    let body = world.add_body(RigidBody::fixed(Transform::default()));
    world.add_collider(Collider::new(
        body,
        ColliderShape::Plane {
            normal: Vec3::Y,
            offset: 0.0,
        },
    ));
    body
}

#[test]
fn bodies_fall_under_gravity() {
    let mut world = PhysicsWorld::default();
    let body = world.add_body(RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
        MassProperties::default(),
    ));

    world.step(DT);

    let y = world.body(body).expect("body should exist").transform.position.y;
    assert!(y < 10.0, "body should start falling, y = {y}");
}

#[test]
fn zero_or_negative_dt_is_a_noop() {
    let mut world = PhysicsWorld::default();
    let body = world.add_body(RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
        MassProperties::default(),
    ));

    assert_eq!(world.step(0.0), 0);
    assert_eq!(world.step(-0.25), 0);
    assert_eq!(world.body(body).unwrap().transform.position.y, 10.0);
}

#[test]
fn wall_clock_time_is_subdivided_into_fixed_substeps() {
    let mut world = PhysicsWorld::default();
    world.add_body(RigidBody::default());

    // Less than one substep accumulates, then spills over.
    assert_eq!(world.step(DT * 0.5), 0);
    assert_eq!(world.step(DT * 0.6), 1);
    // A large frame is capped at max_substeps.
    assert_eq!(world.step(1.0), world.config.max_substeps);
}

#[test]
fn resting_box_does_not_sink_into_the_ground() {
    let mut world = PhysicsWorld::default();
    add_ground_plane(&mut world);

    let half = Vec3::splat(0.5);
    let box_body = world.add_body(RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 0.5, 0.0)),
        MassProperties::solid_box(half, 4.0),
    ));
    world.add_collider(Collider::new(box_body, ColliderShape::Box { half_extents: half }));

    // Warm-up: let the solver settle the stack of one.
    for _ in 0..10 {
        world.step(DT);
    }

    for _ in 0..60 {
        world.step(DT);
        let y = world.body(box_body).unwrap().transform.position.y;
        assert!(y > 0.44, "box sank to y = {y}");
        assert!(y < 0.56, "box launched to y = {y}");
    }
}

#[test]
fn resting_contact_keeps_one_persistent_manifold() {
    let mut world = PhysicsWorld::default();
    add_ground_plane(&mut world);

    let half = Vec3::splat(0.5);
    let box_body = world.add_body(RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 0.5, 0.0)),
        MassProperties::solid_box(half, 4.0),
    ));
    world.add_collider(Collider::new(box_body, ColliderShape::Box { half_extents: half }));

    for _ in 0..30 {
        world.step(DT);
    }

    assert_eq!(world.manifold_count(), 1);
    let manifold = world.manifold(0).unwrap();
    assert!(manifold.point_count() >= 1);
    assert!(manifold.point_count() <= MAX_MANIFOLD_POINTS);

    // Persistence across steps is what feeds warm starting.
    let seasoned = manifold.points().iter().any(|p| p.lifetime > 5);
    assert!(seasoned, "no contact point survived multiple steps");
    let loaded = manifold.points().iter().any(|p| p.applied_impulse > 0.0);
    assert!(loaded, "resting contact carries no normal impulse");
}

#[test]
fn sub_threshold_body_sleeps_and_an_impulse_wakes_it() {
    let mut world = world_without_gravity();
    let body = world.add_body(RigidBody::new(
        Transform::default(),
        MassProperties::solid_sphere(1.0, 1.0),
    ));

    // Default deactivation time is 2 s.
    for _ in 0..140 {
        world.step(DT);
    }
    assert!(world.body(body).unwrap().is_sleeping());

    assert!(world.apply_impulse(body, Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO));
    assert!(!world.body(body).unwrap().is_sleeping());

    let x_before = world.body(body).unwrap().transform.position.x;
    world.step(DT);
    assert!(world.body(body).unwrap().transform.position.x > x_before);
}

#[test]
fn waking_one_island_member_wakes_the_rest() {
    let mut world = world_without_gravity();
    let a = world.add_body(RigidBody::new(
        Transform::default(),
        MassProperties::solid_sphere(1.0, 1.0),
    ));
    let b = world.add_body(RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 0.0, 3.0)),
        MassProperties::solid_sphere(1.0, 1.0),
    ));
    world.create_constraint(Constraint::Distance {
        body_a: a,
        body_b: b,
        pivot_a: Vec3::ZERO,
        pivot_b: Vec3::ZERO,
        rest_length: 3.0,
    });

    for _ in 0..140 {
        world.step(DT);
    }
    assert!(world.body(a).unwrap().is_sleeping());
    assert!(world.body(b).unwrap().is_sleeping());

    world.apply_impulse(a, Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO);
    world.step(DT);

    assert!(!world.body(a).unwrap().is_sleeping());
    assert!(
        !world.body(b).unwrap().is_sleeping(),
        "island member stayed asleep after its neighbor was woken"
    );
}

#[test]
fn constraints_can_be_created_and_removed() {
    let mut world = world_without_gravity();
    let a = world.add_body(RigidBody::default());
    let b = world.add_body(RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 0.0, 2.0)),
        MassProperties::default(),
    ));

    let id = world.create_constraint(Constraint::Point {
        body_a: a,
        body_b: b,
        pivot_a: Vec3::ZERO,
        pivot_b: Vec3::ZERO,
    });

    assert!(world.remove_constraint(id));
    assert!(!world.remove_constraint(id));
}

#[test]
fn ccd_stops_a_fast_body_before_it_tunnels() {
    let mut world = PhysicsWorld::new(
        WorldConfig {
            gravity: Vec3::ZERO,
            ccd_motion_threshold: 0.5,
            ..WorldConfig::default()
        },
        SolverConfig::default(),
    );

    let bullet = world.add_body(RigidBody::new(
        Transform::default(),
        MassProperties::solid_sphere(0.1, 1.0),
    ));
    world.add_collider(Collider::new(bullet, ColliderShape::Sphere { radius: 0.1 }));
    world.body_mut(bullet).unwrap().velocity.linear = Vec3::new(600.0, 0.0, 0.0);

    let obstacle = world.add_body(RigidBody::fixed(Transform::from_position(Vec3::new(
        5.0, 0.0, 0.0,
    ))));
    world.add_collider(Collider::new(obstacle, ColliderShape::Sphere { radius: 0.5 }));

    for _ in 0..10 {
        world.step(DT);
    }
    let x = world.body(bullet).unwrap().transform.position.x;
    assert!(x < 5.0, "bullet tunneled through the obstacle, x = {x}");
}

#[test]
fn without_ccd_the_same_body_tunnels() {
    let mut world = world_without_gravity();
    let bullet = world.add_body(RigidBody::new(
        Transform::default(),
        MassProperties::solid_sphere(0.1, 1.0),
    ));
    world.add_collider(Collider::new(bullet, ColliderShape::Sphere { radius: 0.1 }));
    world.body_mut(bullet).unwrap().velocity.linear = Vec3::new(600.0, 0.0, 0.0);

    let obstacle = world.add_body(RigidBody::fixed(Transform::from_position(Vec3::new(
        5.0, 0.0, 0.0,
    ))));
    world.add_collider(Collider::new(obstacle, ColliderShape::Sphere { radius: 0.5 }));

    for _ in 0..3 {
        world.step(DT);
    }
    assert!(world.body(bullet).unwrap().transform.position.x > 5.0);
}

#[derive(Clone)]
struct SharedTransform(Rc<RefCell<Transform>>);

impl MotionState for SharedTransform {
    fn get_world_transform(&self) -> Transform {
        *self.0.borrow()
    }

    fn set_world_transform(&mut self, transform: Transform) {
        *self.0.borrow_mut() = transform;
    }
}

#[test]
fn dynamic_bodies_push_their_transform_to_the_motion_state() {
    let mut world = PhysicsWorld::default();
    let body = world.add_body(RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 10.0, 0.0)),
        MassProperties::default(),
    ));

    let shared = Rc::new(RefCell::new(Transform::default()));
    world.set_motion_state(body, SharedTransform(shared.clone()));

    for _ in 0..5 {
        world.step(DT);
    }

    let synced = *shared.borrow();
    let actual = world.body(body).unwrap().transform;
    assert!(synced.position.y < 10.0);
    assert_eq!(synced.position, actual.position);
}

#[test]
fn kinematic_bodies_pull_their_transform_from_the_motion_state() {
    let mut world = world_without_gravity();
    let platform = world.add_body(RigidBody::kinematic(Transform::default()));

    let shared = Rc::new(RefCell::new(Transform::from_position(Vec3::new(
        0.0, 3.0, 0.0,
    ))));
    world.set_motion_state(platform, SharedTransform(shared.clone()));

    world.step(DT);

    assert_eq!(
        world.body(platform).unwrap().transform.position,
        Vec3::new(0.0, 3.0, 0.0)
    );
}

#[test]
fn spheres_at_rest_on_a_plane_report_contact_points() {
    let mut world = PhysicsWorld::default();
    add_ground_plane(&mut world);

    let ball = world.add_body(RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
        MassProperties::solid_sphere(1.0, 1.0),
    ));
    world.add_collider(Collider::new(ball, ColliderShape::Sphere { radius: 1.0 }));

    for _ in 0..20 {
        world.step(DT);
    }

    assert_eq!(world.manifold_count(), 1);
    assert!(world.last_max_impulse() > 0.0);
    let y = world.body(ball).unwrap().transform.position.y;
    assert!(y > 0.9, "sphere sank to y = {y}");
}
