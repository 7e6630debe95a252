//! Semi-implicit Euler integration split around the solver: forces feed
//! velocities before the solve, velocities move transforms after it.

use glam::Vec3;
use log::warn;

use crate::core::rigidbody::RigidBody;
use crate::core::types::Transform;
use crate::utils::math::angular_velocity_to_quat;

#[derive(Debug, Default)]
pub struct Integrator;

impl Integrator {
    pub fn new() -> Self {
        Self
    }

    /// Folds accumulated forces, torques, gravity, and damping into the
    /// body's velocity, then clears the accumulators.
    pub fn integrate_forces(&self, body: &mut RigidBody, gravity: Vec3, dt: f32) {
        if body.is_fixed() || body.is_sleeping() {
            body.clear_accumulators();
            return;
        }

        let acceleration =
            gravity * body.gravity_scale + body.accumulated_force() * body.inverse_mass();
        body.velocity.linear += acceleration * dt;
        body.velocity.angular += body.inverse_inertia_world() * body.accumulated_torque() * dt;

        body.velocity.linear *= (1.0 - body.linear_damping * dt).max(0.0);
        body.velocity.angular *= (1.0 - body.angular_damping * dt).max(0.0);

        // A non-finite velocity poisons every downstream transform; zero it
        // and keep stepping.
        if !body.velocity.linear.is_finite() || !body.velocity.angular.is_finite() {
            warn!("non-finite velocity on body {:?}, resetting", body.id);
            body.velocity.linear = Vec3::ZERO;
            body.velocity.angular = Vec3::ZERO;
        }

        body.clear_accumulators();
    }

    /// Transform the body would reach after `dt` at its current velocity.
    pub fn predict_transform(&self, body: &RigidBody, dt: f32) -> Transform {
        Transform {
            position: body.transform.position + body.velocity.linear * dt,
            rotation: (angular_velocity_to_quat(body.velocity.angular, dt)
                * body.transform.rotation)
                .normalize(),
        }
    }

    /// Commits the motion over `dt`, already scaled by any impact fraction.
    pub fn commit(&self, body: &mut RigidBody, dt: f32) {
        if body.is_static() || body.is_sleeping() {
            return;
        }
        body.transform = self.predict_transform(body, dt);
    }
}
