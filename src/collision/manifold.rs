use glam::Vec3;

use crate::core::types::{CombinedMaterial, Transform};
use crate::utils::allocator::EntityId;

/// Hard cap on cached contact points per body pair.
pub const MAX_MANIFOLD_POINTS: usize = 4;

/// One persistent contact record between two bodies.
///
/// Depth is signed along the normal: negative while penetrating, positive
/// when separated. The normal points from body B toward body A.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactPoint {
    /// Anchor in body A local space; survives across steps.
    pub local_point_a: Vec3,
    /// Anchor in body B local space.
    pub local_point_b: Vec3,
    pub position_world_on_a: Vec3,
    pub position_world_on_b: Vec3,
    /// Unit contact normal, world space, pointing from B to A.
    pub normal_world: Vec3,
    pub depth: f32,
    /// Steps this point has survived; fresh points start at zero.
    pub lifetime: u32,
    /// Accumulated impulses carried across steps for warm starting.
    pub applied_impulse: f32,
    pub applied_impulse_lateral1: f32,
    pub applied_impulse_lateral2: f32,
    /// Friction frame, rebuilt by the solver prepare pass each step.
    pub lateral_friction_dir1: Vec3,
    pub lateral_friction_dir2: Vec3,
    /// Cached inverse effective mass per axis (normal, two tangents);
    /// zero marks a degenerate axis the solver must skip.
    pub jac_diag_inv: f32,
    pub jac_diag_inv_lateral1: f32,
    pub jac_diag_inv_lateral2: f32,
}

impl ContactPoint {
    pub fn new(
        local_point_a: Vec3,
        local_point_b: Vec3,
        position_world_on_a: Vec3,
        position_world_on_b: Vec3,
        normal_world: Vec3,
        depth: f32,
    ) -> Self {
        Self {
            local_point_a,
            local_point_b,
            position_world_on_a,
            position_world_on_b,
            normal_world,
            depth,
            ..Self::default()
        }
    }
}

/// Fixed-capacity cache of contact points for one body pair.
///
/// The manifold holds body handles, never body state: callers resolve the
/// handles against their arena. Point indices are stable only within one
/// step; removal swaps the last point into the hole.
#[derive(Debug, Clone)]
pub struct PersistentManifold {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub material: CombinedMaterial,
    points: [ContactPoint; MAX_MANIFOLD_POINTS],
    count: usize,
}

impl PersistentManifold {
    pub fn new(body_a: EntityId, body_b: EntityId, material: CombinedMaterial) -> Self {
        Self {
            body_a,
            body_b,
            material,
            points: [ContactPoint::default(); MAX_MANIFOLD_POINTS],
            count: 0,
        }
    }

    pub fn point_count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn point(&self, index: usize) -> &ContactPoint {
        &self.points[index]
    }

    pub fn point_mut(&mut self, index: usize) -> &mut ContactPoint {
        &mut self.points[index]
    }

    pub fn points(&self) -> &[ContactPoint] {
        &self.points[..self.count]
    }

    /// Swap-with-last removal; the index of the former last point changes.
    pub fn remove_point(&mut self, index: usize) {
        debug_assert!(index < self.count);
        self.count -= 1;
        self.points[index] = self.points[self.count];
    }

    /// Overwrites the geometry of `index` while keeping its accumulated
    /// impulses and lifetime, so warm starting survives the merge.
    pub fn replace_point(&mut self, index: usize, point: ContactPoint) {
        debug_assert!(index < self.count);
        let old = &self.points[index];
        let mut merged = point;
        merged.applied_impulse = old.applied_impulse;
        merged.applied_impulse_lateral1 = old.applied_impulse_lateral1;
        merged.applied_impulse_lateral2 = old.applied_impulse_lateral2;
        merged.lifetime = old.lifetime;
        self.points[index] = merged;
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Index of the cached point nearest to `point` on body A, if within
    /// `merge_threshold_sq`. Matching is positional only; normals are not
    /// compared, which can misclassify contacts on sharp edges.
    pub fn closest_cached_point(&self, point: &ContactPoint, merge_threshold_sq: f32) -> Option<usize> {
        let mut best = None;
        let mut best_dist = merge_threshold_sq;
        for (i, cached) in self.points[..self.count].iter().enumerate() {
            let dist = (cached.local_point_a - point.local_point_a).length_squared();
            if dist < best_dist {
                best_dist = dist;
                best = Some(i);
            }
        }
        best
    }

    /// Inserts a narrowphase sample, merging with a nearby cached point or
    /// running the four-point reduction when the cache is full.
    pub fn add_point(&mut self, point: ContactPoint, merge_threshold_sq: f32) {
        if let Some(index) = self.closest_cached_point(&point, merge_threshold_sq) {
            self.replace_point(index, point);
            return;
        }

        if self.count < MAX_MANIFOLD_POINTS {
            self.points[self.count] = point;
            self.count += 1;
            return;
        }

        let index = self.reduction_target(&point);
        // Full replacement: the displaced point's impulse history does not
        // belong to the new geometry.
        self.points[index] = point;
    }

    /// Chooses which cached point the candidate displaces: the deepest point
    /// is immune, and among the rest the slot whose replacement maximizes
    /// the spanned contact area wins.
    fn reduction_target(&self, candidate: &ContactPoint) -> usize {
        let mut protect = None;
        let mut max_penetration = candidate.depth;
        for (i, p) in self.points.iter().enumerate() {
            if p.depth < max_penetration {
                max_penetration = p.depth;
                protect = Some(i);
            }
        }

        let p = candidate.local_point_a;
        let [p0, p1, p2, p3] = [
            self.points[0].local_point_a,
            self.points[1].local_point_a,
            self.points[2].local_point_a,
            self.points[3].local_point_a,
        ];

        let area = |slot: usize| -> f32 {
            let (a, b) = match slot {
                0 => (p - p1, p3 - p2),
                1 => (p - p0, p3 - p2),
                2 => (p - p0, p3 - p1),
                _ => (p - p0, p2 - p1),
            };
            a.cross(b).length_squared()
        };

        let mut best_slot = usize::MAX;
        let mut best_area = f32::NEG_INFINITY;
        for slot in 0..MAX_MANIFOLD_POINTS {
            if Some(slot) == protect {
                continue;
            }
            let value = area(slot);
            if value > best_area {
                best_area = value;
                best_slot = slot;
            }
        }
        best_slot
    }

    /// Re-projects every cached point through the bodies' current transforms
    /// and evicts the ones that broke.
    ///
    /// A point breaks when its separation exceeds `breaking_threshold` or
    /// when the anchors have slid apart tangentially by more than it. A point
    /// whose recomputed geometry diverges from the cached normal is kept as
    /// long as those bounds hold.
    pub fn refresh(
        &mut self,
        transform_a: &Transform,
        transform_b: &Transform,
        breaking_threshold: f32,
    ) {
        let threshold_sq = breaking_threshold * breaking_threshold;

        let mut i = 0;
        while i < self.count {
            let point = &mut self.points[i];
            point.position_world_on_a = transform_a.transform_point(point.local_point_a);
            point.position_world_on_b = transform_b.transform_point(point.local_point_b);
            point.depth =
                (point.position_world_on_a - point.position_world_on_b).dot(point.normal_world);

            if point.depth > breaking_threshold {
                self.remove_point(i);
                continue;
            }

            let projected =
                point.position_world_on_a - point.normal_world * point.depth;
            let drift = projected - point.position_world_on_b;
            if drift.length_squared() > threshold_sq {
                self.remove_point(i);
                continue;
            }

            point.lifetime += 1;
            i += 1;
        }
    }
}
