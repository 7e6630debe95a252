//! Continuous collision: swept bounding-sphere time of impact.

use glam::Vec3;

use crate::core::collider::Collider;
use crate::core::rigidbody::RigidBody;
use crate::core::types::Transform;
use crate::utils::allocator::{Arena, EntityId};

/// Fraction of a motion step at which two swept spheres first touch.
///
/// `motion_a`/`motion_b` are the full displacements over the step. Returns
/// `None` when the spheres start overlapping (the discrete pass owns that
/// case) or never touch within the step.
pub fn time_of_impact(
    from_a: Vec3,
    motion_a: Vec3,
    radius_a: f32,
    from_b: Vec3,
    motion_b: Vec3,
    radius_b: f32,
) -> Option<f32> {
    let p = from_a - from_b;
    let v = motion_a - motion_b;
    let r = radius_a + radius_b;

    let c = p.length_squared() - r * r;
    if c <= 0.0 {
        return None;
    }

    let a = v.length_squared();
    if a < 1e-12 {
        return None;
    }
    let b = p.dot(v);
    if b >= 0.0 {
        // Moving apart.
        return None;
    }

    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / a;
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Clamps the motion of fast bodies so they cannot tunnel through thin
/// geometry between discrete steps.
pub struct CcdDetector {
    enabled: bool,
    /// Displacement per substep below which a body skips the sweep.
    motion_threshold: f32,
}

impl CcdDetector {
    pub fn new(motion_threshold: f32) -> Self {
        Self {
            enabled: motion_threshold > 0.0,
            motion_threshold,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_motion_threshold(&mut self, threshold: f32) {
        self.motion_threshold = threshold;
        self.enabled = threshold > 0.0;
    }

    /// Earliest impact fraction in `[0, 1]` for a body moving from its
    /// current transform to `predicted`, swept against every other collider's
    /// bounding sphere. Returns `1.0` when the full motion is safe.
    pub fn clamp_motion(
        &self,
        body_id: EntityId,
        body: &RigidBody,
        predicted: &Transform,
        bodies: &Arena<RigidBody>,
        colliders: &Arena<Collider>,
    ) -> f32 {
        if !self.enabled {
            return 1.0;
        }
        let motion = predicted.position - body.transform.position;
        if motion.length() < self.motion_threshold {
            return 1.0;
        }

        let Some(own_radius) = colliders
            .iter()
            .filter(|c| c.body == body_id)
            .map(|c| c.shape.bounding_radius())
            .fold(None, |acc: Option<f32>, r| Some(acc.map_or(r, |a| a.max(r))))
        else {
            return 1.0;
        };
        if !own_radius.is_finite() {
            return 1.0;
        }

        let mut fraction = 1.0f32;
        for other in colliders.iter() {
            if other.body == body_id {
                continue;
            }
            let Some(other_body) = bodies.get(other.body) else {
                continue;
            };
            let other_radius = other.shape.bounding_radius();
            if !other_radius.is_finite() {
                continue;
            }
            let other_center = other.world_transform(&other_body.transform).position;

            if let Some(t) = time_of_impact(
                body.transform.position,
                motion,
                own_radius,
                other_center,
                Vec3::ZERO,
                other_radius,
            ) {
                fraction = fraction.min(t);
            }
        }
        fraction
    }
}

impl Default for CcdDetector {
    fn default() -> Self {
        Self::new(0.0)
    }
}
