use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of a rigid body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.conjugate() * (point - self.position)
    }

    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.transform_point(other.position),
            rotation: (self.rotation * other.rotation).normalize(),
        }
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    /// Velocity of a point at `rel_pos` from the center of mass.
    pub fn at_point(&self, rel_pos: Vec3) -> Vec3 {
        self.linear + self.angular.cross(rel_pos)
    }
}

/// Mass and local-space inertia tensor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f32,
    pub inertia: Mat3,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: Mat3::IDENTITY,
        }
    }
}

impl MassProperties {
    /// Zero-mass properties marking a non-simulated (static) body.
    pub fn fixed() -> Self {
        Self {
            mass: 0.0,
            inertia: Mat3::ZERO,
        }
    }

    pub fn solid_sphere(radius: f32, mass: f32) -> Self {
        Self {
            mass,
            inertia: Mat3::for_solid_sphere(radius, mass),
        }
    }

    pub fn solid_box(half_extents: Vec3, mass: f32) -> Self {
        Self {
            mass,
            inertia: Mat3::for_solid_box(half_extents, mass),
        }
    }
}

/// Surface coefficients affecting contact response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

impl Material {
    /// Geometric-mean combination of two surfaces' coefficients.
    pub fn combine(a: &Material, b: &Material) -> CombinedMaterial {
        CombinedMaterial {
            friction: (a.friction.max(0.0) * b.friction.max(0.0)).sqrt(),
            restitution: (a.restitution.max(0.0) * b.restitution.max(0.0)).sqrt(),
        }
    }
}

/// Pair coefficients cached on a manifold for the solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinedMaterial {
    pub friction: f32,
    pub restitution: f32,
}

/// Inertia tensor constructors for common solids.
pub trait InertiaTensorExt {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Mat3;
    fn for_solid_sphere(radius: f32, mass: f32) -> Mat3;
}

impl InertiaTensorExt for Mat3 {
    fn for_solid_box(half_extents: Vec3, mass: f32) -> Mat3 {
        let extents = half_extents * 2.0;
        let factor = mass / 12.0;
        Mat3::from_diagonal(Vec3::new(
            factor * (extents.y * extents.y + extents.z * extents.z),
            factor * (extents.x * extents.x + extents.z * extents.z),
            factor * (extents.x * extents.x + extents.y * extents.y),
        ))
    }

    fn for_solid_sphere(radius: f32, mass: f32) -> Mat3 {
        Mat3::from_diagonal(Vec3::splat(0.4 * mass * radius * radius))
    }
}
