//! Stateless impulse math for one contact or bilateral constraint.
//!
//! Every function here reads the two bodies' velocity and inertia state,
//! computes one impulse, and (for the contact paths) applies it. No state
//! outlives a call except the accumulators cached on the contact point.

use glam::Vec3;

use crate::collision::manifold::ContactPoint;
use crate::config::SolverInfo;
use crate::core::rigidbody::RigidBody;
use crate::core::types::CombinedMaterial;
use crate::utils::math::plane_space;

/// Effective-mass denominator below which an axis is treated as degenerate.
const EFFECTIVE_MASS_EPSILON: f32 = 1e-9;

/// Jacobian diagonal for an impulse along `axis` at the given anchor offsets:
/// the denominator `1/m_a + 1/m_b + angular terms`.
pub fn effective_mass_denominator(
    body_a: &RigidBody,
    body_b: &RigidBody,
    rel_a: Vec3,
    rel_b: Vec3,
    axis: Vec3,
) -> f32 {
    let angular_a = body_a.inverse_inertia_world() * rel_a.cross(axis);
    let angular_b = body_b.inverse_inertia_world() * rel_b.cross(axis);
    body_a.inverse_mass()
        + body_b.inverse_mass()
        + axis.dot(angular_a.cross(rel_a))
        + axis.dot(angular_b.cross(rel_b))
}

fn inverse_or_zero(denominator: f32) -> f32 {
    if denominator > EFFECTIVE_MASS_EPSILON {
        1.0 / denominator
    } else {
        0.0
    }
}

/// Restitution response for a contact.
///
/// Contacts are resolved perfectly inelastic: the combined restitution does
/// not feed the velocity error. The hook stays so callers keep the term in
/// their error sum.
pub fn restitution_curve(_rel_vel: f32, _combined_restitution: f32) -> f32 {
    0.0
}

/// Fills the point's friction frame and per-axis inverse effective masses.
///
/// A degenerate axis gets a zero inverse so the resolution passes skip it.
pub fn prepare_contact_point(body_a: &RigidBody, body_b: &RigidBody, point: &mut ContactPoint) {
    let rel_a = point.position_world_on_a - body_a.transform.position;
    let rel_b = point.position_world_on_b - body_b.transform.position;

    point.jac_diag_inv = inverse_or_zero(effective_mass_denominator(
        body_a,
        body_b,
        rel_a,
        rel_b,
        point.normal_world,
    ));

    let (tangent1, tangent2) = plane_space(point.normal_world);
    point.lateral_friction_dir1 = tangent1;
    point.lateral_friction_dir2 = tangent2;
    point.jac_diag_inv_lateral1 = inverse_or_zero(effective_mass_denominator(
        body_a, body_b, rel_a, rel_b, tangent1,
    ));
    point.jac_diag_inv_lateral2 = inverse_or_zero(effective_mass_denominator(
        body_a, body_b, rel_a, rel_b, tangent2,
    ));
}

/// Re-applies the previous step's accumulated impulses, scaled by the
/// warm-start relaxation, to seed the iteration near the converged solution.
pub fn warm_start_contact_point(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    point: &ContactPoint,
    relaxation: f32,
) {
    let impulse = (point.normal_world * point.applied_impulse
        + point.lateral_friction_dir1 * point.applied_impulse_lateral1
        + point.lateral_friction_dir2 * point.applied_impulse_lateral2)
        * relaxation;
    if impulse.length_squared() <= f32::EPSILON {
        return;
    }

    let rel_a = point.position_world_on_a - body_a.transform.position;
    let rel_b = point.position_world_on_b - body_b.transform.position;
    body_a.apply_impulse_internal(impulse, rel_a);
    body_b.apply_impulse_internal(-impulse, rel_b);
}

/// Impulse that drives the relative velocity of two anchor points along
/// `direction` to `target_rel_vel`. The caller applies it (positively to
/// body A). Returns zero on a degenerate effective mass.
pub fn resolve_single_bilateral(
    body_a: &RigidBody,
    body_b: &RigidBody,
    world_pos_a: Vec3,
    world_pos_b: Vec3,
    direction: Vec3,
    target_rel_vel: f32,
) -> f32 {
    let rel_a = world_pos_a - body_a.transform.position;
    let rel_b = world_pos_b - body_b.transform.position;

    let denominator = effective_mass_denominator(body_a, body_b, rel_a, rel_b, direction);
    if denominator <= EFFECTIVE_MASS_EPSILON {
        return 0.0;
    }

    let rel_vel =
        (body_a.velocity.at_point(rel_a) - body_b.velocity.at_point(rel_b)).dot(direction);
    (target_rel_vel - rel_vel) / denominator
}

/// One normal-impulse resolution for a contact point.
///
/// Baumgarte positional feedback plus damped velocity error, multiplied by
/// the cached effective mass; the accumulated impulse is clamped to stay
/// non-negative (non-penetration pushes, never pulls). Returns the impulse
/// delta actually applied.
pub fn resolve_single_collision(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    point: &mut ContactPoint,
    material: &CombinedMaterial,
    info: &SolverInfo,
) -> f32 {
    if point.jac_diag_inv == 0.0 {
        return 0.0;
    }

    let rel_a = point.position_world_on_a - body_a.transform.position;
    let rel_b = point.position_world_on_b - body_b.transform.position;
    let rel_vel = (body_a.velocity.at_point(rel_a) - body_b.velocity.at_point(rel_b))
        .dot(point.normal_world);
    if !rel_vel.is_finite() {
        return 0.0;
    }

    let positional_error = info.erp * info.inv_dt() * (-point.depth).max(0.0);
    let velocity_error =
        restitution_curve(rel_vel, material.restitution) - info.damping * rel_vel;

    let impulse = (positional_error + velocity_error) * point.jac_diag_inv;
    let accumulated = (point.applied_impulse + impulse).max(0.0);
    let delta = accumulated - point.applied_impulse;
    point.applied_impulse = accumulated;

    let applied = point.normal_world * delta;
    body_a.apply_impulse_internal(applied, rel_a);
    body_b.apply_impulse_internal(-applied, rel_b);
    delta.abs()
}

/// One friction resolution for a contact point, using the normal impulse
/// already accumulated this step.
///
/// Both tangent axes accumulate the impulse that would zero the tangential
/// relative velocity, then the pair is clamped to the Coulomb cone. The
/// normal and friction solves stay sequential, not a coupled LCP.
pub fn resolve_single_friction(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    point: &mut ContactPoint,
    material: &CombinedMaterial,
    info: &SolverInfo,
) -> f32 {
    let limit = material.friction * info.friction_scaling * point.applied_impulse;
    if limit <= 0.0 {
        point.applied_impulse_lateral1 = 0.0;
        point.applied_impulse_lateral2 = 0.0;
        return 0.0;
    }

    let rel_a = point.position_world_on_a - body_a.transform.position;
    let rel_b = point.position_world_on_b - body_b.transform.position;
    let rel_vel = body_a.velocity.at_point(rel_a) - body_b.velocity.at_point(rel_b);
    if !rel_vel.is_finite() {
        return 0.0;
    }

    let mut target1 = point.applied_impulse_lateral1;
    if point.jac_diag_inv_lateral1 != 0.0 {
        let tangential = rel_vel.dot(point.lateral_friction_dir1);
        target1 -= info.damping * tangential * point.jac_diag_inv_lateral1;
    }
    let mut target2 = point.applied_impulse_lateral2;
    if point.jac_diag_inv_lateral2 != 0.0 {
        let tangential = rel_vel.dot(point.lateral_friction_dir2);
        target2 -= info.damping * tangential * point.jac_diag_inv_lateral2;
    }

    // Project the accumulated pair back onto the friction cone.
    let magnitude = (target1 * target1 + target2 * target2).sqrt();
    if magnitude > limit {
        let scale = limit / magnitude;
        target1 *= scale;
        target2 *= scale;
    }

    let delta1 = target1 - point.applied_impulse_lateral1;
    let delta2 = target2 - point.applied_impulse_lateral2;
    point.applied_impulse_lateral1 = target1;
    point.applied_impulse_lateral2 = target2;

    let applied =
        point.lateral_friction_dir1 * delta1 + point.lateral_friction_dir2 * delta2;
    if applied.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    body_a.apply_impulse_internal(applied, rel_a);
    body_b.apply_impulse_internal(-applied, rel_b);
    applied.length()
}
