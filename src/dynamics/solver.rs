//! Sequential-impulse constraint solver, run once per island per substep.

use glam::Vec3;

use crate::collision::manifold::PersistentManifold;
use crate::config::SolverInfo;
use crate::core::constraints::Constraint;
use crate::core::rigidbody::RigidBody;
use crate::dynamics::contact_math::{
    prepare_contact_point, resolve_single_bilateral, resolve_single_collision,
    resolve_single_friction, warm_start_contact_point,
};
use crate::utils::allocator::{Arena, EntityId};

/// Projected Gauss-Seidel over one island's manifolds and constraints.
///
/// The pass structure is fixed: prepare + warm start once, then per
/// iteration a sweep of the auxiliary bilateral constraints, a normal-impulse
/// sweep over every contact point, and a friction sweep consuming the normal
/// impulses the same iteration produced. Traversal direction alternates every
/// other iteration over both the manifold list and the points within a
/// manifold.
#[derive(Debug, Default)]
pub struct SequentialImpulseSolver;

impl SequentialImpulseSolver {
    pub fn new() -> Self {
        Self
    }

    /// Solves one island and returns the largest single impulse applied,
    /// a diagnostic for callers, not a correctness signal.
    pub fn solve_island(
        &self,
        bodies: &mut Arena<RigidBody>,
        manifolds: &mut [PersistentManifold],
        island_manifolds: &[usize],
        constraints: &Arena<Constraint>,
        island_constraints: &[EntityId],
        info: &SolverInfo,
    ) -> f32 {
        self.prepare(bodies, manifolds, island_manifolds, info);

        let mut max_impulse = 0.0f32;

        for iteration in 0..info.iterations {
            let reverse = iteration % 2 == 1;

            for &constraint_id in island_constraints {
                if let Some(constraint) = constraints.get(constraint_id) {
                    let applied = Self::solve_constraint(bodies, constraint, info);
                    max_impulse = max_impulse.max(applied);
                }
            }

            let applied = Self::sweep(
                bodies,
                manifolds,
                island_manifolds,
                reverse,
                |body_a, body_b, point, material| {
                    resolve_single_collision(body_a, body_b, point, material, info)
                },
            );
            max_impulse = max_impulse.max(applied);

            // Friction consumes the normal impulses this iteration just
            // updated; the sweep order is load-bearing, not stylistic.
            let applied = Self::sweep(
                bodies,
                manifolds,
                island_manifolds,
                reverse,
                |body_a, body_b, point, material| {
                    resolve_single_friction(body_a, body_b, point, material, info)
                },
            );
            max_impulse = max_impulse.max(applied);
        }

        max_impulse
    }

    /// Recomputes per-point effective masses and re-applies last step's
    /// impulses scaled by the warm-start relaxation.
    fn prepare(
        &self,
        bodies: &mut Arena<RigidBody>,
        manifolds: &mut [PersistentManifold],
        island_manifolds: &[usize],
        info: &SolverInfo,
    ) {
        for &index in island_manifolds {
            let Some(manifold) = manifolds.get_mut(index) else {
                continue;
            };
            let Some((body_a, body_b)) = bodies.get2_mut(manifold.body_a, manifold.body_b) else {
                continue;
            };
            for i in 0..manifold.point_count() {
                let point = manifold.point_mut(i);
                prepare_contact_point(body_a, body_b, point);
                warm_start_contact_point(body_a, body_b, point, info.relaxation);
            }
        }
    }

    /// One full traversal of the island's contact points through `resolve`.
    fn sweep<F>(
        bodies: &mut Arena<RigidBody>,
        manifolds: &mut [PersistentManifold],
        island_manifolds: &[usize],
        reverse: bool,
        mut resolve: F,
    ) -> f32
    where
        F: FnMut(
            &mut RigidBody,
            &mut RigidBody,
            &mut crate::collision::manifold::ContactPoint,
            &crate::core::types::CombinedMaterial,
        ) -> f32,
    {
        let mut max_impulse = 0.0f32;
        let manifold_count = island_manifolds.len();

        for j in 0..manifold_count {
            let pick = if reverse { manifold_count - 1 - j } else { j };
            let Some(manifold) = manifolds.get_mut(island_manifolds[pick]) else {
                continue;
            };
            let material = manifold.material;
            // A pair whose body was removed mid-step has nothing to solve.
            let Some((body_a, body_b)) = bodies.get2_mut(manifold.body_a, manifold.body_b) else {
                continue;
            };

            let count = manifold.point_count();
            for k in 0..count {
                let i = if reverse { count - 1 - k } else { k };
                let applied = resolve(&mut *body_a, &mut *body_b, manifold.point_mut(i), &material);
                max_impulse = max_impulse.max(applied);
            }
        }
        max_impulse
    }

    /// Auxiliary bilateral constraints: position error fed back as a target
    /// relative velocity at the anchors.
    fn solve_constraint(
        bodies: &mut Arena<RigidBody>,
        constraint: &Constraint,
        info: &SolverInfo,
    ) -> f32 {
        match constraint {
            Constraint::Point {
                body_a,
                body_b,
                pivot_a,
                pivot_b,
            } => {
                let Some((a, b)) = bodies.get2_mut(*body_a, *body_b) else {
                    return 0.0;
                };
                if a.is_fixed() && b.is_fixed() {
                    return 0.0;
                }

                let pos_a = a.transform.transform_point(*pivot_a);
                let pos_b = b.transform.transform_point(*pivot_b);
                let error = pos_b - pos_a;

                let mut max_impulse = 0.0f32;
                for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
                    let target = error.dot(axis) * info.erp * info.inv_dt();
                    let impulse = resolve_single_bilateral(a, b, pos_a, pos_b, axis, target);
                    if impulse == 0.0 {
                        continue;
                    }
                    let rel_a = pos_a - a.transform.position;
                    let rel_b = pos_b - b.transform.position;
                    a.apply_impulse_internal(axis * impulse, rel_a);
                    b.apply_impulse_internal(-(axis * impulse), rel_b);
                    max_impulse = max_impulse.max(impulse.abs());
                }
                max_impulse
            }
            Constraint::Distance {
                body_a,
                body_b,
                pivot_a,
                pivot_b,
                rest_length,
            } => {
                let Some((a, b)) = bodies.get2_mut(*body_a, *body_b) else {
                    return 0.0;
                };
                if a.is_fixed() && b.is_fixed() {
                    return 0.0;
                }

                let pos_a = a.transform.transform_point(*pivot_a);
                let pos_b = b.transform.transform_point(*pivot_b);
                let delta = pos_b - pos_a;
                let length = delta.length();
                if length < 1e-6 {
                    return 0.0;
                }
                let direction = delta / length;

                let target = (length - rest_length) * info.erp * info.inv_dt();
                let impulse = resolve_single_bilateral(a, b, pos_a, pos_b, direction, target);
                if impulse == 0.0 {
                    return 0.0;
                }
                let rel_a = pos_a - a.transform.position;
                let rel_b = pos_b - b.transform.position;
                a.apply_impulse_internal(direction * impulse, rel_a);
                b.apply_impulse_internal(-(direction * impulse), rel_b);
                impulse.abs()
            }
        }
    }
}
