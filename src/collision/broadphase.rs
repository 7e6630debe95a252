//! Broadphase boundary: AABB bookkeeping producing candidate pairs.

use std::collections::{HashMap, HashSet};

use glam::Vec3;

use crate::utils::allocator::EntityId;

/// Interface the stepping loop consumes. Proxies are collider ids; AABBs are
/// pushed in before pairs are queried.
pub trait BroadPhase {
    fn set_aabb(&mut self, proxy: EntityId, min: Vec3, max: Vec3);
    fn remove_proxy(&mut self, proxy: EntityId);
    /// Candidate pairs whose AABBs currently overlap, canonically ordered.
    fn overlapping_pairs(&mut self) -> Vec<(EntityId, EntityId)>;
}

fn aabbs_overlap(min_a: Vec3, max_a: Vec3, min_b: Vec3, max_b: Vec3) -> bool {
    min_a.x <= max_b.x
        && min_b.x <= max_a.x
        && min_a.y <= max_b.y
        && min_b.y <= max_a.y
        && min_a.z <= max_b.z
        && min_b.z <= max_a.z
}

/// Uniform-grid spatial hash over proxy AABBs.
pub struct UniformGridBroadPhase {
    cell_size: f32,
    aabbs: HashMap<EntityId, (Vec3, Vec3)>,
}

impl UniformGridBroadPhase {
    /// A proxy spanning more cells than this per axis is treated as unbounded.
    const MAX_CELL_SPAN: i32 = 64;

    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1e-3),
            aabbs: HashMap::new(),
        }
    }

    fn cell_of(&self, pos: Vec3) -> (i32, i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
            (pos.z / self.cell_size).floor() as i32,
        )
    }

    fn is_unbounded(min: Vec3, max: Vec3) -> bool {
        !(min.is_finite() && max.is_finite())
    }
}

impl Default for UniformGridBroadPhase {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl BroadPhase for UniformGridBroadPhase {
    fn set_aabb(&mut self, proxy: EntityId, min: Vec3, max: Vec3) {
        self.aabbs.insert(proxy, (min, max));
    }

    fn remove_proxy(&mut self, proxy: EntityId) {
        self.aabbs.remove(&proxy);
    }

    fn overlapping_pairs(&mut self) -> Vec<(EntityId, EntityId)> {
        let mut grid: HashMap<(i32, i32, i32), Vec<EntityId>> = HashMap::new();
        let mut unbounded: Vec<EntityId> = Vec::new();

        for (&proxy, &(min, max)) in &self.aabbs {
            if Self::is_unbounded(min, max) {
                unbounded.push(proxy);
                continue;
            }

            let min_cell = self.cell_of(min);
            let max_cell = self.cell_of(max);
            if max_cell.0 - min_cell.0 > Self::MAX_CELL_SPAN
                || max_cell.1 - min_cell.1 > Self::MAX_CELL_SPAN
                || max_cell.2 - min_cell.2 > Self::MAX_CELL_SPAN
            {
                unbounded.push(proxy);
                continue;
            }

            for x in min_cell.0..=max_cell.0 {
                for y in min_cell.1..=max_cell.1 {
                    for z in min_cell.2..=max_cell.2 {
                        grid.entry((x, y, z)).or_default().push(proxy);
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        let mut pairs = Vec::new();

        let mut push_pair = |a: EntityId, b: EntityId, aabbs: &HashMap<EntityId, (Vec3, Vec3)>| {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            if !seen.insert((lo, hi)) {
                return;
            }
            let (min_a, max_a) = aabbs[&lo];
            let (min_b, max_b) = aabbs[&hi];
            if aabbs_overlap(min_a, max_a, min_b, max_b) {
                pairs.push((lo, hi));
            }
        };

        for bucket in grid.values() {
            for i in 0..bucket.len() {
                for j in (i + 1)..bucket.len() {
                    push_pair(bucket[i], bucket[j], &self.aabbs);
                }
            }
        }

        // Unbounded proxies are candidates against everything.
        for &proxy in &unbounded {
            for &other in self.aabbs.keys() {
                if other != proxy {
                    push_pair(proxy, other, &self.aabbs);
                }
            }
        }

        pairs.sort_unstable();
        pairs
    }
}
