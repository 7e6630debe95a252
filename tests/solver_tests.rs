use kinetica::*;

const DT: f32 = 1.0 / 60.0;

fn unit_sphere(z: f32) -> RigidBody {
    RigidBody::new(
        Transform::from_position(Vec3::new(0.0, 0.0, z)),
        MassProperties::solid_sphere(1.0, 1.0),
    )
}

/// Manifold for two unit spheres overlapping by 0.1 along +Z, with the
/// contact normal pointing from the lower body toward the upper one.
fn overlapping_sphere_manifold(upper: EntityId, lower: EntityId) -> PersistentManifold {
    let mut manifold = PersistentManifold::new(
        upper,
        lower,
        CombinedMaterial {
            friction: 0.5,
            restitution: 0.0,
        },
    );
    let world = Vec3::new(0.0, 0.0, 0.95);
    manifold.add_point(
        ContactPoint::new(
            Vec3::new(0.0, 0.0, -0.95),
            Vec3::new(0.0, 0.0, 0.95),
            world,
            world,
            Vec3::Z,
            -0.1,
        ),
        0.0004,
    );
    manifold
}

#[test]
fn one_iteration_resolves_the_sphere_overlap() {
    let mut bodies = Arena::new();
    let upper = bodies.insert(unit_sphere(1.9));
    let lower = bodies.insert(unit_sphere(0.0));

    let mut manifolds = vec![overlapping_sphere_manifold(upper, lower)];
    let constraints: Arena<Constraint> = Arena::new();

    let solver_config = SolverConfig {
        iterations: 1,
        erp: 1.0,
        damping: 1.0,
        relaxation: 1.0,
        friction_scaling: 1.0,
    };
    let info = SolverInfo::new(&solver_config, DT);

    let solver = SequentialImpulseSolver::new();
    let max_impulse =
        solver.solve_island(&mut bodies, &mut manifolds, &[0], &constraints, &[], &info);

    assert!(max_impulse > 0.0, "solver reported no impulse");
    assert!(
        manifolds[0].point(0).applied_impulse > 0.0,
        "normal impulse must be positive"
    );

    let upper_vel = bodies.get(upper).unwrap().velocity.linear;
    let lower_vel = bodies.get(lower).unwrap().velocity.linear;
    let rel_vel = (upper_vel - lower_vel).dot(Vec3::Z);
    assert!(
        rel_vel >= 0.0,
        "residual approach velocity after solve: {rel_vel}"
    );
}

#[test]
fn normal_impulse_stays_non_negative_across_iterations() {
    let mut bodies = Arena::new();
    let upper = bodies.insert(unit_sphere(1.9));
    let lower = bodies.insert(unit_sphere(0.0));
    // Separating hard: every raw normal impulse would come out negative.
    bodies.get_mut(upper).unwrap().velocity.linear = Vec3::new(0.0, 0.0, 40.0);

    let mut manifolds = vec![overlapping_sphere_manifold(upper, lower)];
    let constraints: Arena<Constraint> = Arena::new();
    let info = SolverInfo::new(&SolverConfig::default(), DT);

    let solver = SequentialImpulseSolver::new();
    solver.solve_island(&mut bodies, &mut manifolds, &[0], &constraints, &[], &info);

    for point in manifolds[0].points() {
        assert!(point.applied_impulse >= 0.0);
    }
}

#[test]
fn friction_impulses_stay_inside_the_cone() {
    let mut bodies = Arena::new();
    let upper = bodies.insert(unit_sphere(1.9));
    let lower = bodies.insert(unit_sphere(0.0));
    // Sliding sideways while pressed together.
    bodies.get_mut(upper).unwrap().velocity.linear = Vec3::new(6.0, 0.0, -1.0);

    let mut manifolds = vec![overlapping_sphere_manifold(upper, lower)];
    let constraints: Arena<Constraint> = Arena::new();
    let info = SolverInfo::new(&SolverConfig::default(), DT);

    let solver = SequentialImpulseSolver::new();
    solver.solve_island(&mut bodies, &mut manifolds, &[0], &constraints, &[], &info);

    let point = manifolds[0].point(0);
    let tangent_magnitude = (point.applied_impulse_lateral1.powi(2)
        + point.applied_impulse_lateral2.powi(2))
    .sqrt();
    let limit = manifolds[0].material.friction * point.applied_impulse;
    assert!(
        tangent_magnitude <= limit + 1e-4,
        "|tangent| = {tangent_magnitude}, limit = {limit}"
    );
}

#[test]
fn missing_bodies_are_skipped_without_panicking() {
    let mut bodies = Arena::new();
    let upper = bodies.insert(unit_sphere(1.9));
    let lower = bodies.insert(unit_sphere(0.0));
    let mut manifolds = vec![overlapping_sphere_manifold(upper, lower)];
    bodies.remove(lower);

    let constraints: Arena<Constraint> = Arena::new();
    let info = SolverInfo::new(&SolverConfig::default(), DT);
    let solver = SequentialImpulseSolver::new();
    let max_impulse =
        solver.solve_island(&mut bodies, &mut manifolds, &[0], &constraints, &[], &info);

    assert_eq!(max_impulse, 0.0);
    assert_eq!(bodies.get(upper).unwrap().velocity.linear, Vec3::ZERO);
}

#[test]
fn point_constraint_pulls_the_anchors_together() {
    let mut bodies = Arena::new();
    let anchor = bodies.insert(RigidBody::fixed(Transform::default()));
    let hanging = bodies.insert(RigidBody::new(
        Transform::from_position(Vec3::new(2.5, 0.0, 0.0)),
        MassProperties::solid_sphere(0.5, 1.0),
    ));

    let mut constraints: Arena<Constraint> = Arena::new();
    let id = constraints.insert(Constraint::Point {
        body_a: anchor,
        body_b: hanging,
        pivot_a: Vec3::new(1.0, 0.0, 0.0),
        pivot_b: Vec3::new(-1.0, 0.0, 0.0),
    });

    let info = SolverInfo::new(&SolverConfig::default(), DT);
    let solver = SequentialImpulseSolver::new();
    let mut manifolds: Vec<PersistentManifold> = Vec::new();
    solver.solve_island(&mut bodies, &mut manifolds, &[], &constraints, &[id], &info);

    // Anchor gap is +0.5 along X; the hanging body must be pulled back.
    assert!(bodies.get(hanging).unwrap().velocity.linear.x < 0.0);
    assert_eq!(bodies.get(anchor).unwrap().velocity.linear, Vec3::ZERO);
}

#[test]
fn distance_constraint_restores_the_rest_length() {
    let mut bodies = Arena::new();
    let a = bodies.insert(unit_sphere(0.0));
    let b = bodies.insert(unit_sphere(4.0));

    let mut constraints: Arena<Constraint> = Arena::new();
    let id = constraints.insert(Constraint::Distance {
        body_a: a,
        body_b: b,
        pivot_a: Vec3::ZERO,
        pivot_b: Vec3::ZERO,
        rest_length: 3.0,
    });

    let info = SolverInfo::new(&SolverConfig::default(), DT);
    let solver = SequentialImpulseSolver::new();
    let mut manifolds: Vec<PersistentManifold> = Vec::new();
    solver.solve_island(&mut bodies, &mut manifolds, &[], &constraints, &[id], &info);

    // Over-stretched by 1: the pair must start closing along +Z/-Z.
    assert!(bodies.get(a).unwrap().velocity.linear.z > 0.0);
    assert!(bodies.get(b).unwrap().velocity.linear.z < 0.0);
}
