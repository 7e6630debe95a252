use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::utils::allocator::EntityId;

/// Auxiliary bilateral constraints solved alongside contacts.
///
/// Pivots are body-local; world positions are recomputed from the current
/// transforms every solver iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Constraint {
    /// Pins a point of one body to a point of the other (ball socket).
    Point {
        body_a: EntityId,
        body_b: EntityId,
        pivot_a: Vec3,
        pivot_b: Vec3,
    },
    /// Keeps two anchor points at a fixed distance.
    Distance {
        body_a: EntityId,
        body_b: EntityId,
        pivot_a: Vec3,
        pivot_b: Vec3,
        rest_length: f32,
    },
}

impl Constraint {
    pub fn bodies(&self) -> (EntityId, EntityId) {
        match self {
            Constraint::Point { body_a, body_b, .. }
            | Constraint::Distance { body_a, body_b, .. } => (*body_a, *body_b),
        }
    }
}
