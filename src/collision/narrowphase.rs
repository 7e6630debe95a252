//! Narrowphase boundary: shape-pair algorithms behind a registry.
//!
//! Algorithm selection is a capability-keyed map from shape-kind pairs to
//! implementations, resolved once at startup. Pairs without a registered
//! algorithm produce no contacts.

use std::collections::HashMap;

use glam::Vec3;

use crate::core::collider::{ColliderShape, ShapeKind};
use crate::core::types::Transform;

/// One closest-point result from a shape-pair query, world space.
///
/// The normal points from shape B toward shape A; depth is negative while
/// the shapes overlap.
#[derive(Debug, Clone, Copy)]
pub struct ContactSample {
    pub point_on_a: Vec3,
    pub point_on_b: Vec3,
    pub normal: Vec3,
    pub depth: f32,
}

impl ContactSample {
    fn flipped(self) -> Self {
        Self {
            point_on_a: self.point_on_b,
            point_on_b: self.point_on_a,
            normal: -self.normal,
            depth: self.depth,
        }
    }
}

/// A shape-vs-shape closest-points routine.
pub trait CollisionAlgorithm: Send + Sync {
    /// Appends samples with depth below `max_distance` to `out`.
    fn closest_points(
        &self,
        shape_a: &ColliderShape,
        transform_a: &Transform,
        shape_b: &ColliderShape,
        transform_b: &Transform,
        max_distance: f32,
        out: &mut Vec<ContactSample>,
    );
}

/// Registry resolving a shape-kind pair to its algorithm.
pub struct AlgorithmRegistry {
    algorithms: HashMap<(ShapeKind, ShapeKind), Box<dyn CollisionAlgorithm>>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AlgorithmRegistry {
    pub fn empty() -> Self {
        Self {
            algorithms: HashMap::new(),
        }
    }

    /// Registry populated with the shipped algorithms.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ShapeKind::Sphere, ShapeKind::Sphere, SphereSphere);
        registry.register(ShapeKind::Sphere, ShapeKind::Plane, SphereHalfspace);
        registry.register(ShapeKind::Box, ShapeKind::Plane, BoxHalfspace);
        registry
    }

    pub fn register<A>(&mut self, kind_a: ShapeKind, kind_b: ShapeKind, algorithm: A)
    where
        A: CollisionAlgorithm + 'static,
    {
        self.algorithms.insert((kind_a, kind_b), Box::new(algorithm));
    }

    pub fn supports(&self, kind_a: ShapeKind, kind_b: ShapeKind) -> bool {
        self.algorithms.contains_key(&(kind_a, kind_b))
            || self.algorithms.contains_key(&(kind_b, kind_a))
    }

    /// Runs the registered algorithm for the pair, flipping arguments and
    /// results when only the mirrored key exists.
    pub fn closest_points(
        &self,
        shape_a: &ColliderShape,
        transform_a: &Transform,
        shape_b: &ColliderShape,
        transform_b: &Transform,
        max_distance: f32,
        out: &mut Vec<ContactSample>,
    ) {
        let key = (shape_a.kind(), shape_b.kind());
        if let Some(algorithm) = self.algorithms.get(&key) {
            algorithm.closest_points(shape_a, transform_a, shape_b, transform_b, max_distance, out);
            return;
        }

        let mirrored = (shape_b.kind(), shape_a.kind());
        if let Some(algorithm) = self.algorithms.get(&mirrored) {
            let start = out.len();
            algorithm.closest_points(shape_b, transform_b, shape_a, transform_a, max_distance, out);
            for sample in &mut out[start..] {
                *sample = sample.flipped();
            }
        }
    }
}

/// World-space plane from a local half-space definition.
fn world_plane(normal: Vec3, offset: f32, transform: &Transform) -> (Vec3, f32) {
    let world_normal = transform.transform_vector(normal);
    let world_offset = offset + world_normal.dot(transform.position);
    (world_normal, world_offset)
}

pub struct SphereSphere;

impl CollisionAlgorithm for SphereSphere {
    fn closest_points(
        &self,
        shape_a: &ColliderShape,
        transform_a: &Transform,
        shape_b: &ColliderShape,
        transform_b: &Transform,
        max_distance: f32,
        out: &mut Vec<ContactSample>,
    ) {
        let (ColliderShape::Sphere { radius: radius_a }, ColliderShape::Sphere { radius: radius_b }) =
            (shape_a, shape_b)
        else {
            return;
        };

        let delta = transform_a.position - transform_b.position;
        let center_distance = delta.length();
        let depth = center_distance - (radius_a + radius_b);
        if depth >= max_distance {
            return;
        }

        // Concentric spheres have no defined axis; pick one.
        let normal = if center_distance > 1e-6 {
            delta / center_distance
        } else {
            Vec3::Z
        };

        out.push(ContactSample {
            point_on_a: transform_a.position - normal * *radius_a,
            point_on_b: transform_b.position + normal * *radius_b,
            normal,
            depth,
        });
    }
}

pub struct SphereHalfspace;

impl CollisionAlgorithm for SphereHalfspace {
    fn closest_points(
        &self,
        shape_a: &ColliderShape,
        transform_a: &Transform,
        shape_b: &ColliderShape,
        transform_b: &Transform,
        max_distance: f32,
        out: &mut Vec<ContactSample>,
    ) {
        let (ColliderShape::Sphere { radius }, ColliderShape::Plane { normal, offset }) =
            (shape_a, shape_b)
        else {
            return;
        };

        let (plane_normal, plane_offset) = world_plane(*normal, *offset, transform_b);
        let center_distance = plane_normal.dot(transform_a.position) - plane_offset;
        let depth = center_distance - radius;
        if depth >= max_distance {
            return;
        }

        out.push(ContactSample {
            point_on_a: transform_a.position - plane_normal * *radius,
            point_on_b: transform_a.position - plane_normal * center_distance,
            normal: plane_normal,
            depth,
        });
    }
}

pub struct BoxHalfspace;

impl CollisionAlgorithm for BoxHalfspace {
    fn closest_points(
        &self,
        shape_a: &ColliderShape,
        transform_a: &Transform,
        shape_b: &ColliderShape,
        transform_b: &Transform,
        max_distance: f32,
        out: &mut Vec<ContactSample>,
    ) {
        let (ColliderShape::Box { half_extents }, ColliderShape::Plane { normal, offset }) =
            (shape_a, shape_b)
        else {
            return;
        };

        let (plane_normal, plane_offset) = world_plane(*normal, *offset, transform_b);

        // Every corner below the margin becomes a sample; the manifold
        // reduction trims the set to four.
        for sx in [-1.0f32, 1.0] {
            for sy in [-1.0f32, 1.0] {
                for sz in [-1.0f32, 1.0] {
                    let corner = transform_a.transform_point(Vec3::new(
                        sx * half_extents.x,
                        sy * half_extents.y,
                        sz * half_extents.z,
                    ));
                    let depth = plane_normal.dot(corner) - plane_offset;
                    if depth >= max_distance {
                        continue;
                    }
                    out.push(ContactSample {
                        point_on_a: corner,
                        point_on_b: corner - plane_normal * depth,
                        normal: plane_normal,
                        depth,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn overlapping_spheres_report_penetration_along_the_center_axis() {
        let registry = AlgorithmRegistry::with_defaults();
        let sphere = ColliderShape::Sphere { radius: 1.0 };
        let ta = Transform::from_position(Vec3::new(0.0, 0.0, 1.9));
        let tb = Transform::default();

        let mut samples = Vec::new();
        registry.closest_points(&sphere, &ta, &sphere, &tb, 0.02, &mut samples);

        assert_eq!(samples.len(), 1);
        let sample = &samples[0];
        assert_relative_eq!(sample.depth, -0.1, epsilon = 1e-5);
        assert_relative_eq!(sample.normal.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn mirrored_pair_flips_the_normal() {
        let registry = AlgorithmRegistry::with_defaults();
        let sphere = ColliderShape::Sphere { radius: 0.5 };
        let plane = ColliderShape::Plane {
            normal: Vec3::Y,
            offset: 0.0,
        };
        let sphere_at = Transform::from_position(Vec3::new(0.0, 0.4, 0.0));
        let origin = Transform::default();

        // Plane listed first: the registry only has (Sphere, Plane).
        let mut samples = Vec::new();
        registry.closest_points(&plane, &origin, &sphere, &sphere_at, 0.02, &mut samples);

        assert_eq!(samples.len(), 1);
        // Normal points from B (sphere) toward A (plane).
        assert_relative_eq!(samples[0].normal.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(samples[0].depth, -0.1, epsilon = 1e-5);
    }

    #[test]
    fn resting_box_touches_on_four_corners() {
        let registry = AlgorithmRegistry::with_defaults();
        let cube = ColliderShape::Box {
            half_extents: Vec3::splat(0.5),
        };
        let plane = ColliderShape::Plane {
            normal: Vec3::Y,
            offset: 0.0,
        };
        let resting = Transform::from_position(Vec3::new(0.0, 0.49, 0.0));

        let mut samples = Vec::new();
        registry.closest_points(&cube, &resting, &plane, &Transform::default(), 0.02, &mut samples);

        assert_eq!(samples.len(), 4);
        for sample in &samples {
            assert_relative_eq!(sample.depth, -0.01, epsilon = 1e-5);
            assert_relative_eq!(sample.normal.y, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn unregistered_pairs_are_skipped() {
        let registry = AlgorithmRegistry::with_defaults();
        let cube = ColliderShape::Box {
            half_extents: Vec3::splat(0.5),
        };
        let mut samples = Vec::new();
        registry.closest_points(
            &cube,
            &Transform::default(),
            &cube,
            &Transform::default(),
            0.02,
            &mut samples,
        );
        assert!(samples.is_empty());
        assert!(!registry.supports(ShapeKind::Box, ShapeKind::Box));
    }
}
