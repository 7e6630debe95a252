//! Dynamics modules: contact impulse math, the sequential-impulse solver,
//! islands and sleeping, integration, and force generators.

pub mod contact_math;
pub mod forces;
pub mod integrator;
pub mod island;
pub mod solver;

pub use forces::{DragForce, ForceGenerator, ForceRegistry, GravityForce, SpringForce};
pub use integrator::Integrator;
pub use island::{Island, IslandManager, UnionFind};
pub use solver::SequentialImpulseSolver;
