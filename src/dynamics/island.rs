//! Simulation islands: union-find clustering and island-wide sleep/wake.

use std::collections::HashMap;

use log::debug;

use crate::collision::manifold::PersistentManifold;
use crate::core::constraints::Constraint;
use crate::core::rigidbody::{ActivationState, RigidBody};
use crate::utils::allocator::{Arena, EntityId};

/// Union-find over arena indices with path halving.
///
/// Resized explicitly once per step to the arena's slot count; nothing grows
/// mid-traversal.
#[derive(Debug, Default)]
pub struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self { parent: Vec::new() }
    }

    /// Resets to `count` singleton sets.
    pub fn reset(&mut self, count: usize) {
        self.parent.clear();
        self.parent.extend(0..count as u32);
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&mut self, mut index: usize) -> usize {
        debug_assert!(index < self.parent.len());
        while self.parent[index] as usize != index {
            let grandparent = self.parent[self.parent[index] as usize];
            self.parent[index] = grandparent;
            index = grandparent as usize;
        }
        index
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent[root_a] = root_b as u32;
        }
    }

    pub fn same_set(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}

/// Maximal set of bodies transitively connected through contacts or
/// constraints; solved and slept as a unit.
#[derive(Debug, Default)]
pub struct Island {
    pub bodies: Vec<EntityId>,
    /// Indices into the dispatcher's manifold pool, valid for this step.
    pub manifolds: Vec<usize>,
    pub constraints: Vec<EntityId>,
    pub is_awake: bool,
}

/// Rebuilds islands each substep and arbitrates island-wide activation.
#[derive(Debug, Default)]
pub struct IslandManager {
    union_find: UnionFind,
    islands: Vec<Island>,
}

impl IslandManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    /// Resets the union-find and unions the bodies of every manifold with at
    /// least one live contact point, plus every constraint pair. Static and
    /// kinematic bodies anchor islands without merging them.
    pub fn find_unions(
        &mut self,
        bodies: &Arena<RigidBody>,
        manifolds: &[PersistentManifold],
        constraints: &Arena<Constraint>,
    ) {
        self.union_find.reset(bodies.capacity());

        let mut union_pair = |union_find: &mut UnionFind, id_a: EntityId, id_b: EntityId| {
            let (Some(a), Some(b)) = (bodies.get(id_a), bodies.get(id_b)) else {
                return;
            };
            if a.is_fixed() || b.is_fixed() {
                return;
            }
            union_find.union(id_a.index(), id_b.index());
        };

        for manifold in manifolds {
            if manifold.point_count() > 0 {
                union_pair(&mut self.union_find, manifold.body_a, manifold.body_b);
            }
        }
        for constraint in constraints.iter() {
            let (id_a, id_b) = constraint.bodies();
            union_pair(&mut self.union_find, id_a, id_b);
        }
    }

    /// Groups bodies, manifold indices, and constraints by union-find root.
    ///
    /// Every dynamic body lands in exactly one island (singletons included,
    /// they still need sleep management). An island with any `Active` member
    /// is forced fully awake.
    pub fn build_islands(
        &mut self,
        bodies: &mut Arena<RigidBody>,
        manifolds: &[PersistentManifold],
        constraints: &Arena<Constraint>,
    ) {
        self.islands.clear();
        let mut root_to_island: HashMap<usize, usize> = HashMap::new();

        for id in bodies.ids() {
            let Some(body) = bodies.get(id) else { continue };
            if body.is_fixed() {
                continue;
            }
            let root = self.union_find.find(id.index());
            let island_index = *root_to_island.entry(root).or_insert_with(|| {
                self.islands.push(Island::default());
                self.islands.len() - 1
            });
            self.islands[island_index].bodies.push(id);
        }

        for (manifold_index, manifold) in manifolds.iter().enumerate() {
            if manifold.point_count() == 0 {
                continue;
            }
            let Some(anchor) = self.dynamic_anchor(bodies, manifold.body_a, manifold.body_b) else {
                continue;
            };
            let root = self.union_find.find(anchor.index());
            if let Some(&island_index) = root_to_island.get(&root) {
                self.islands[island_index].manifolds.push(manifold_index);
            }
        }

        for constraint_id in constraints.ids() {
            let Some(constraint) = constraints.get(constraint_id) else {
                continue;
            };
            let (id_a, id_b) = constraint.bodies();
            let Some(anchor) = self.dynamic_anchor(bodies, id_a, id_b) else {
                continue;
            };
            let root = self.union_find.find(anchor.index());
            if let Some(&island_index) = root_to_island.get(&root) {
                self.islands[island_index].constraints.push(constraint_id);
            }
        }

        // A single forced-active member reverts its whole island to active.
        for island in &mut self.islands {
            let any_active = island.bodies.iter().any(|id| {
                bodies
                    .get(*id)
                    .map(|b| b.activation_state() == ActivationState::Active)
                    .unwrap_or(false)
            });
            if any_active {
                for id in &island.bodies {
                    if let Some(body) = bodies.get_mut(*id) {
                        match body.activation_state() {
                            ActivationState::Sleeping => body.activate(),
                            ActivationState::WantsDeactivation => body.revert_to_active(),
                            ActivationState::Active => {}
                        }
                    }
                }
                island.is_awake = true;
            } else {
                island.is_awake = island.bodies.iter().any(|id| {
                    bodies.get(*id).map(|b| !b.is_sleeping()).unwrap_or(false)
                });
            }
        }
    }

    /// Rebuilds islands and hands each awake one to `process`. Islands never
    /// share a call, which is what lets them sleep independently.
    pub fn build_and_process_islands<F>(
        &mut self,
        bodies: &mut Arena<RigidBody>,
        manifolds: &mut [PersistentManifold],
        constraints: &Arena<Constraint>,
        mut process: F,
    ) where
        F: FnMut(&Island, &mut Arena<RigidBody>, &mut [PersistentManifold]),
    {
        self.find_unions(bodies, manifolds, constraints);
        self.build_islands(bodies, manifolds, constraints);

        for island in &self.islands {
            if !island.is_awake {
                continue;
            }
            process(island, bodies, manifolds);
        }
    }

    /// Demotes islands whose members all want deactivation. Runs after the
    /// per-body activation timers were advanced for this substep.
    pub fn update_sleeping(&mut self, bodies: &mut Arena<RigidBody>) {
        for island in &mut self.islands {
            if island.bodies.is_empty() {
                continue;
            }
            let all_agree = island.bodies.iter().all(|id| {
                bodies
                    .get(*id)
                    .map(|b| b.activation_state() != ActivationState::Active)
                    .unwrap_or(true)
            });
            if !all_agree {
                continue;
            }
            let newly_slept = island
                .bodies
                .iter()
                .filter(|id| bodies.get(**id).map(|b| !b.is_sleeping()).unwrap_or(false))
                .count();
            for id in &island.bodies {
                if let Some(body) = bodies.get_mut(*id) {
                    body.put_to_sleep();
                }
            }
            island.is_awake = false;
            if newly_slept > 0 {
                debug!("island of {} bodies went to sleep", island.bodies.len());
            }
        }
    }

    /// The non-fixed body of a pair, preferring A.
    fn dynamic_anchor(
        &self,
        bodies: &Arena<RigidBody>,
        id_a: EntityId,
        id_b: EntityId,
    ) -> Option<EntityId> {
        if bodies.get(id_a).map(|b| !b.is_fixed()).unwrap_or(false) {
            return Some(id_a);
        }
        if bodies.get(id_b).map(|b| !b.is_fixed()).unwrap_or(false) {
            return Some(id_b);
        }
        None
    }
}
