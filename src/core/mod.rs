//! Core types describing physics entities and shared data.

pub mod collider;
pub mod constraints;
pub mod rigidbody;
pub mod types;

pub use collider::{Collider, ColliderShape, CollisionFilter, ShapeKind};
pub use constraints::Constraint;
pub use rigidbody::{ActivationState, BodyKind, RigidBody};
pub use types::{CombinedMaterial, MassProperties, Material, Transform, Velocity};
