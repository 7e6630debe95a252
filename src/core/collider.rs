use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::Transform;
use crate::utils::allocator::EntityId;

/// Collider geometries the shipped narrowphase algorithms understand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ColliderShape {
    Sphere {
        radius: f32,
    },
    Box {
        half_extents: Vec3,
    },
    /// Infinite half-space `normal · x <= offset`; static geometry only.
    Plane {
        normal: Vec3,
        offset: f32,
    },
}

impl ColliderShape {
    /// Kind tag keying the collision-algorithm registry.
    pub fn kind(&self) -> ShapeKind {
        match self {
            ColliderShape::Sphere { .. } => ShapeKind::Sphere,
            ColliderShape::Box { .. } => ShapeKind::Box,
            ColliderShape::Plane { .. } => ShapeKind::Plane,
        }
    }

    /// Radius of a bounding sphere around the shape's origin.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            ColliderShape::Sphere { radius } => *radius,
            ColliderShape::Box { half_extents } => half_extents.length(),
            ColliderShape::Plane { .. } => f32::INFINITY,
        }
    }
}

/// Discriminant used as a registry key; one per shape variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Sphere,
    Box,
    Plane,
}

/// Layer/mask filtering; two colliders interact when each mask admits the
/// other's layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub layer: u32,
    pub mask: u32,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            layer: 1,
            mask: u32::MAX,
        }
    }
}

impl CollisionFilter {
    pub fn matches(&self, other: &CollisionFilter) -> bool {
        (self.mask & other.layer) != 0 && (other.mask & self.layer) != 0
    }
}

/// Collider component attached to a rigid body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collider {
    pub id: EntityId,
    pub body: EntityId,
    pub shape: ColliderShape,
    /// Body-local placement of the shape.
    pub offset: Transform,
    pub filter: CollisionFilter,
}

impl Collider {
    pub fn new(body: EntityId, shape: ColliderShape) -> Self {
        Self {
            id: EntityId::default(),
            body,
            shape,
            offset: Transform::default(),
            filter: CollisionFilter::default(),
        }
    }

    pub fn with_offset(mut self, offset: Transform) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn world_transform(&self, body_transform: &Transform) -> Transform {
        body_transform.combine(&self.offset)
    }

    /// World-space AABB fed to the broadphase, inflated by `margin` so
    /// proxies keep overlapping while their manifold is still alive.
    pub fn aabb(&self, body_transform: &Transform, margin: f32) -> (Vec3, Vec3) {
        let transform = self.world_transform(body_transform);
        match &self.shape {
            ColliderShape::Sphere { radius } => {
                let extent = Vec3::splat(radius + margin);
                (transform.position - extent, transform.position + extent)
            }
            ColliderShape::Box { half_extents } => {
                // Rotation-independent bound from the projected extents.
                let basis = glam::Mat3::from_quat(transform.rotation);
                let extent = Vec3::new(
                    basis.row(0).abs().dot(*half_extents),
                    basis.row(1).abs().dot(*half_extents),
                    basis.row(2).abs().dot(*half_extents),
                ) + Vec3::splat(margin);
                (transform.position - extent, transform.position + extent)
            }
            ColliderShape::Plane { .. } => {
                (Vec3::splat(f32::NEG_INFINITY), Vec3::splat(f32::INFINITY))
            }
        }
    }
}
