//! Collision dispatcher: runs narrowphase per candidate pair and owns the
//! persistent manifold pool.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::collision::manifold::{ContactPoint, PersistentManifold};
use crate::collision::narrowphase::{AlgorithmRegistry, ContactSample};
use crate::config::WorldConfig;
use crate::core::collider::Collider;
use crate::core::rigidbody::RigidBody;
use crate::core::types::Material;
use crate::utils::allocator::{Arena, EntityId};

/// Canonically ordered body pair keying the manifold pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyPairKey {
    pub body_a: EntityId,
    pub body_b: EntityId,
}

impl BodyPairKey {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        if a <= b {
            Self { body_a: a, body_b: b }
        } else {
            Self { body_a: b, body_b: a }
        }
    }
}

/// Owns all persistent manifolds and runs the narrowphase pass.
pub struct CollisionDispatcher {
    registry: AlgorithmRegistry,
    manifolds: Vec<PersistentManifold>,
    pair_index: HashMap<BodyPairKey, usize>,
    scratch_samples: Vec<ContactSample>,
}

impl Default for CollisionDispatcher {
    fn default() -> Self {
        Self::new(AlgorithmRegistry::with_defaults())
    }
}

impl CollisionDispatcher {
    pub fn new(registry: AlgorithmRegistry) -> Self {
        Self {
            registry,
            manifolds: Vec::new(),
            pair_index: HashMap::new(),
            scratch_samples: Vec::new(),
        }
    }

    pub fn registry_mut(&mut self) -> &mut AlgorithmRegistry {
        &mut self.registry
    }

    pub fn manifold_count(&self) -> usize {
        self.manifolds.len()
    }

    pub fn manifold(&self, index: usize) -> Option<&PersistentManifold> {
        self.manifolds.get(index)
    }

    pub fn manifolds(&self) -> &[PersistentManifold] {
        &self.manifolds
    }

    pub fn manifolds_mut(&mut self) -> &mut [PersistentManifold] {
        &mut self.manifolds
    }

    /// Index of the pair's manifold, creating an empty one on first overlap.
    pub fn get_or_create_manifold(
        &mut self,
        body_a: EntityId,
        body_b: EntityId,
        material_a: &Material,
        material_b: &Material,
    ) -> usize {
        let key = BodyPairKey::new(body_a, body_b);
        if let Some(&index) = self.pair_index.get(&key) {
            return index;
        }

        let index = self.manifolds.len();
        self.manifolds.push(PersistentManifold::new(
            key.body_a,
            key.body_b,
            Material::combine(material_a, material_b),
        ));
        self.pair_index.insert(key, index);
        debug!("manifold created for pair {key:?}");
        index
    }

    /// Drops the pair's manifold; the last manifold is swapped into its slot.
    pub fn release_manifold(&mut self, body_a: EntityId, body_b: EntityId) {
        let key = BodyPairKey::new(body_a, body_b);
        let Some(index) = self.pair_index.remove(&key) else {
            return;
        };
        self.manifolds.swap_remove(index);
        if index < self.manifolds.len() {
            let moved = &self.manifolds[index];
            let moved_key = BodyPairKey::new(moved.body_a, moved.body_b);
            self.pair_index.insert(moved_key, index);
        }
        debug!("manifold released for pair {key:?}");
    }

    /// Narrowphase pass over the broadphase candidates, then refresh and
    /// garbage collection of the pool.
    pub fn dispatch(
        &mut self,
        candidate_pairs: &[(EntityId, EntityId)],
        colliders: &Arena<Collider>,
        bodies: &mut Arena<RigidBody>,
        config: &WorldConfig,
    ) {
        let mut touched: HashSet<BodyPairKey> = HashSet::with_capacity(candidate_pairs.len());

        for &(collider_a_id, collider_b_id) in candidate_pairs {
            let Some(collider_a) = colliders.get(collider_a_id) else {
                continue;
            };
            let Some(collider_b) = colliders.get(collider_b_id) else {
                continue;
            };
            if !collider_a.filter.matches(&collider_b.filter) {
                continue;
            }
            if collider_a.body == collider_b.body {
                continue;
            }
            let Some(body_a) = bodies.get(collider_a.body) else {
                continue;
            };
            let Some(body_b) = bodies.get(collider_b.body) else {
                continue;
            };
            if body_a.is_fixed() && body_b.is_fixed() {
                continue;
            }
            // A pair of sleeping bodies keeps its manifold untouched.
            if body_a.is_sleeping() && body_b.is_sleeping() {
                touched.insert(BodyPairKey::new(collider_a.body, collider_b.body));
                continue;
            }
            if !self
                .registry
                .supports(collider_a.shape.kind(), collider_b.shape.kind())
            {
                continue;
            }

            touched.insert(BodyPairKey::new(collider_a.body, collider_b.body));

            let transform_a = collider_a.world_transform(&body_a.transform);
            let transform_b = collider_b.world_transform(&body_b.transform);

            self.scratch_samples.clear();
            self.registry.closest_points(
                &collider_a.shape,
                &transform_a,
                &collider_b.shape,
                &transform_b,
                config.contact_breaking_threshold,
                &mut self.scratch_samples,
            );
            if self.scratch_samples.is_empty() {
                continue;
            }

            let body_transform_a = body_a.transform;
            let body_transform_b = body_b.transform;
            let material_a = body_a.material;
            let material_b = body_b.material;
            let index = self.get_or_create_manifold(
                collider_a.body,
                collider_b.body,
                &material_a,
                &material_b,
            );
            let manifold = &mut self.manifolds[index];
            let was_empty = manifold.is_empty();

            // The manifold is stored with canonical body order; samples are
            // produced in collider order.
            let flip = manifold.body_a != collider_a.body;
            for sample in self.scratch_samples.drain(..) {
                let (on_a, on_b, normal) = if flip {
                    (sample.point_on_b, sample.point_on_a, -sample.normal)
                } else {
                    (sample.point_on_a, sample.point_on_b, sample.normal)
                };
                let (anchor_a, anchor_b) = if flip {
                    (
                        body_transform_b.inverse_transform_point(on_a),
                        body_transform_a.inverse_transform_point(on_b),
                    )
                } else {
                    (
                        body_transform_a.inverse_transform_point(on_a),
                        body_transform_b.inverse_transform_point(on_b),
                    )
                };
                manifold.add_point(
                    ContactPoint::new(anchor_a, anchor_b, on_a, on_b, normal, sample.depth),
                    config.contact_merge_threshold_sq,
                );
            }

            // First touch wakes a sleeping partner (kinematic bodies never
            // union into islands, so this is their wake path).
            if was_empty && !manifold.is_empty() {
                for id in [collider_a.body, collider_b.body] {
                    if let Some(body) = bodies.get_mut(id) {
                        if body.is_sleeping() {
                            body.activate();
                        }
                    }
                }
            }
        }

        self.refresh_and_collect(bodies, config, &touched);
    }

    /// Refreshes every surviving manifold against current transforms and
    /// releases the ones whose proxies stopped overlapping.
    fn refresh_and_collect(
        &mut self,
        bodies: &Arena<RigidBody>,
        config: &WorldConfig,
        touched: &HashSet<BodyPairKey>,
    ) {
        let mut index = 0;
        while index < self.manifolds.len() {
            let manifold = &mut self.manifolds[index];
            let key = BodyPairKey::new(manifold.body_a, manifold.body_b);

            let transforms = bodies
                .get(manifold.body_a)
                .zip(bodies.get(manifold.body_b))
                .map(|(a, b)| (a.transform, b.transform));

            let keep = match transforms {
                Some((ta, tb)) if touched.contains(&key) => {
                    let both_sleeping = bodies.get(manifold.body_a).is_some_and(RigidBody::is_sleeping)
                        && bodies.get(manifold.body_b).is_some_and(RigidBody::is_sleeping);
                    if !both_sleeping {
                        manifold.refresh(&ta, &tb, config.contact_breaking_threshold);
                    }
                    true
                }
                // Proxies separated or a body was removed.
                _ => false,
            };

            if keep {
                index += 1;
            } else {
                self.pair_index.remove(&key);
                self.manifolds.swap_remove(index);
                if index < self.manifolds.len() {
                    let moved = &self.manifolds[index];
                    self.pair_index
                        .insert(BodyPairKey::new(moved.body_a, moved.body_b), index);
                }
                debug!("manifold expired for pair {key:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collider::ColliderShape;
    use crate::core::types::{MassProperties, Transform};
    use glam::Vec3;

    fn sphere_body(world: &mut Arena<RigidBody>, colliders: &mut Arena<Collider>, z: f32) -> EntityId {
        let body = RigidBody::new(
            Transform::from_position(Vec3::new(0.0, 0.0, z)),
            MassProperties::solid_sphere(1.0, 1.0),
        );
        let body_id = world.insert(body);
        world.get_mut(body_id).unwrap().id = body_id;
        let collider_id = colliders.insert(Collider::new(body_id, ColliderShape::Sphere { radius: 1.0 }));
        colliders.get_mut(collider_id).unwrap().id = collider_id;
        body_id
    }

    #[test]
    fn overlapping_pair_grows_a_manifold_and_separation_releases_it() {
        let mut bodies = Arena::new();
        let mut colliders = Arena::new();
        let config = WorldConfig::default();

        let a = sphere_body(&mut bodies, &mut colliders, 0.0);
        let b = sphere_body(&mut bodies, &mut colliders, 1.9);
        let pair: Vec<_> = {
            let mut ids = colliders.ids();
            vec![(ids.next().unwrap(), ids.next().unwrap())]
        };

        let mut dispatcher = CollisionDispatcher::default();
        dispatcher.dispatch(&pair, &colliders, &mut bodies, &config);

        assert_eq!(dispatcher.manifold_count(), 1);
        assert_eq!(dispatcher.manifold(0).unwrap().point_count(), 1);

        // Move B away; the pair is gone from the candidate list.
        bodies.get_mut(b).unwrap().transform.position.z = 10.0;
        dispatcher.dispatch(&[], &colliders, &mut bodies, &config);
        assert_eq!(dispatcher.manifold_count(), 0);

        let _ = a;
    }

    #[test]
    fn fresh_contact_wakes_a_sleeping_body() {
        let mut bodies = Arena::new();
        let mut colliders = Arena::new();
        let config = WorldConfig::default();

        let a = sphere_body(&mut bodies, &mut colliders, 0.0);
        let b = sphere_body(&mut bodies, &mut colliders, 1.9);
        bodies.get_mut(b).unwrap().put_to_sleep();

        let pair: Vec<_> = {
            let mut ids = colliders.ids();
            vec![(ids.next().unwrap(), ids.next().unwrap())]
        };
        let mut dispatcher = CollisionDispatcher::default();
        dispatcher.dispatch(&pair, &colliders, &mut bodies, &config);

        assert!(!bodies.get(b).unwrap().is_sleeping());
        assert!(!bodies.get(a).unwrap().is_sleeping());
    }
}
