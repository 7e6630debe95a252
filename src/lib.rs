//! Kinetica – a rigid body dynamics kernel for Rust.
//!
//! The crate is built around three pieces: persistent contact manifolds that
//! cache up to four points per body pair across steps, a sequential-impulse
//! constraint solver with warm starting, and a fixed-substep stepping loop
//! that ties collision dispatch, island/sleep management, and integration
//! together. Broadphase and narrowphase plug in behind small trait
//! boundaries; default implementations ship for both.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod utils;
pub mod world;

pub use glam::{Mat3, Quat, Vec3};

pub use collision::{
    broadphase::{BroadPhase, UniformGridBroadPhase},
    ccd::CcdDetector,
    dispatcher::CollisionDispatcher,
    manifold::{ContactPoint, PersistentManifold, MAX_MANIFOLD_POINTS},
    narrowphase::{AlgorithmRegistry, CollisionAlgorithm, ContactSample},
};
pub use config::{SolverConfig, SolverInfo, WorldConfig};
pub use core::{
    collider::{Collider, ColliderShape, CollisionFilter, ShapeKind},
    constraints::Constraint,
    rigidbody::{ActivationState, BodyKind, RigidBody},
    types::{CombinedMaterial, MassProperties, Material, Transform, Velocity},
};
pub use dynamics::{
    forces::{DragForce, ForceGenerator, ForceRegistry, GravityForce, SpringForce},
    island::{Island, IslandManager, UnionFind},
    solver::SequentialImpulseSolver,
};
pub use utils::allocator::{Arena, EntityId};
pub use world::{MotionState, PhysicsWorld};

/// High-level convenience wrapper that owns a [`PhysicsWorld`].
pub struct PhysicsEngine {
    world: PhysicsWorld,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new(WorldConfig::default(), SolverConfig::default())
    }
}

impl PhysicsEngine {
    pub fn new(config: WorldConfig, solver_config: SolverConfig) -> Self {
        Self {
            world: PhysicsWorld::new(config, solver_config),
        }
    }

    /// Adds a rigid body and returns its handle.
    pub fn add_body(&mut self, body: RigidBody) -> EntityId {
        self.world.add_body(body)
    }

    /// Adds a collider referencing a previously added body.
    pub fn add_collider(&mut self, collider: Collider) -> EntityId {
        self.world.add_collider(collider)
    }

    /// Advances the simulation by wall-clock `dt`.
    pub fn step(&mut self, dt: f32) -> u32 {
        self.world.step(dt)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }
}
