//! Collision modules: broadphase boundary, narrowphase registry, persistent
//! manifolds, dispatcher, and continuous collision.

pub mod broadphase;
pub mod ccd;
pub mod dispatcher;
pub mod manifold;
pub mod narrowphase;

pub use broadphase::{BroadPhase, UniformGridBroadPhase};
pub use ccd::CcdDetector;
pub use dispatcher::{BodyPairKey, CollisionDispatcher};
pub use manifold::{ContactPoint, PersistentManifold, MAX_MANIFOLD_POINTS};
pub use narrowphase::{AlgorithmRegistry, CollisionAlgorithm, ContactSample};
