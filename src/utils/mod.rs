//! Utility helpers: generational allocator, logging, math extensions.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, EntityId};
pub use math::{angular_velocity_to_quat, plane_space, skew_symmetric};
