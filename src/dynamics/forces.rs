//! Force generators applied before integration each substep.

use glam::Vec3;

use crate::core::rigidbody::RigidBody;
use crate::utils::allocator::{Arena, EntityId};

/// A persistent force source evaluated once per substep.
pub trait ForceGenerator: Send + Sync {
    fn apply(&self, bodies: &mut Arena<RigidBody>, dt: f32);
}

/// Extra per-body acceleration on top of world gravity.
pub struct GravityForce {
    pub body: EntityId,
    pub acceleration: Vec3,
}

impl ForceGenerator for GravityForce {
    fn apply(&self, bodies: &mut Arena<RigidBody>, _dt: f32) {
        if let Some(body) = bodies.get_mut(self.body) {
            if body.inverse_mass() > 0.0 && !body.is_sleeping() {
                let mass = 1.0 / body.inverse_mass();
                body.apply_force(self.acceleration * mass);
            }
        }
    }
}

/// Velocity-proportional drag with a quadratic term.
pub struct DragForce {
    pub body: EntityId,
    pub linear_coefficient: f32,
    pub quadratic_coefficient: f32,
}

impl ForceGenerator for DragForce {
    fn apply(&self, bodies: &mut Arena<RigidBody>, _dt: f32) {
        if let Some(body) = bodies.get_mut(self.body) {
            if body.is_sleeping() {
                return;
            }
            let speed = body.velocity.linear.length();
            if speed < 1e-6 {
                return;
            }
            let magnitude =
                self.linear_coefficient * speed + self.quadratic_coefficient * speed * speed;
            let force = -body.velocity.linear / speed * magnitude;
            body.apply_force(force);
        }
    }
}

/// Hookean spring between two body centers with relative-velocity damping.
pub struct SpringForce {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub rest_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl ForceGenerator for SpringForce {
    fn apply(&self, bodies: &mut Arena<RigidBody>, _dt: f32) {
        let Some((a, b)) = bodies.get2_mut(self.body_a, self.body_b) else {
            return;
        };
        let delta = b.transform.position - a.transform.position;
        let length = delta.length();
        if length < 1e-6 {
            return;
        }
        let direction = delta / length;

        let stretch = length - self.rest_length;
        let relative_speed = (b.velocity.linear - a.velocity.linear).dot(direction);
        let magnitude = self.stiffness * stretch + self.damping * relative_speed;

        let force = direction * magnitude;
        a.apply_force(force);
        b.apply_force(-force);
    }
}

/// Holds the world's registered generators.
#[derive(Default)]
pub struct ForceRegistry {
    generators: Vec<Box<dyn ForceGenerator>>,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<G>(&mut self, generator: G)
    where
        G: ForceGenerator + 'static,
    {
        self.generators.push(Box::new(generator));
    }

    pub fn clear(&mut self) {
        self.generators.clear();
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn apply_all(&self, bodies: &mut Arena<RigidBody>, dt: f32) {
        for generator in &self.generators {
            generator.apply(bodies, dt);
        }
    }
}
