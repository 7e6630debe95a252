//! Tuning configuration for the world and the constraint solver.
//!
//! All tuning lives in explicit structs owned by the [`crate::PhysicsWorld`]
//! and passed by reference into subsystems; nothing here is global state.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Default integration timestep (seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// World-level tuning: integration, contact persistence, sleeping, CCD.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: Vec3,
    /// Fixed substep length; wall-clock time is accumulated against it.
    pub time_step: f32,
    /// Upper bound on substeps run per `step` call.
    pub max_substeps: u32,
    /// Contacts whose separation exceeds this are dropped from a manifold.
    pub contact_breaking_threshold: f32,
    /// Squared distance under which an incoming point merges with a cached one.
    pub contact_merge_threshold_sq: f32,
    pub linear_sleep_threshold: f32,
    pub angular_sleep_threshold: f32,
    /// Seconds a body must stay under the sleep thresholds before it may sleep.
    pub deactivation_time: f32,
    /// Motion per substep beyond which a body gets a time-of-impact pass.
    pub ccd_motion_threshold: f32,
    /// Real-time budget for one substep; overrun logs a warning.
    pub frame_budget_ms: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            time_step: DEFAULT_TIME_STEP,
            max_substeps: 4,
            contact_breaking_threshold: 0.02,
            contact_merge_threshold_sq: 0.02 * 0.02,
            linear_sleep_threshold: 0.8,
            angular_sleep_threshold: 1.0,
            deactivation_time: 2.0,
            ccd_motion_threshold: 0.0,
            frame_budget_ms: 8.0,
            linear_damping: 0.02,
            angular_damping: 0.02,
        }
    }
}

impl WorldConfig {
    /// Clamps out-of-range values instead of reporting them; the stepping
    /// loop has no failure path.
    pub fn sanitized(mut self) -> Self {
        if self.time_step <= 0.0 {
            self.time_step = DEFAULT_TIME_STEP;
        }
        self.max_substeps = self.max_substeps.max(1);
        self.contact_breaking_threshold = self.contact_breaking_threshold.max(0.0);
        self.contact_merge_threshold_sq = self.contact_merge_threshold_sq.max(0.0);
        self.deactivation_time = self.deactivation_time.max(0.0);
        self
    }
}

/// Solver tuning carried across steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub iterations: u32,
    /// Error reduction parameter for Baumgarte penetration correction.
    pub erp: f32,
    /// Global damping applied to the velocity error term.
    pub damping: f32,
    /// Scale on re-applied warm-start impulses.
    pub relaxation: f32,
    /// Scale on the Coulomb friction limit.
    pub friction_scaling: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            erp: 0.2,
            damping: 1.0,
            relaxation: 1.0,
            friction_scaling: 1.0,
        }
    }
}

/// Per-substep view handed to the solver; built from [`SolverConfig`] plus
/// the substep length and never persisted.
#[derive(Debug, Clone, Copy)]
pub struct SolverInfo {
    pub dt: f32,
    pub iterations: u32,
    pub erp: f32,
    pub damping: f32,
    pub relaxation: f32,
    pub friction_scaling: f32,
}

impl SolverInfo {
    pub fn new(config: &SolverConfig, dt: f32) -> Self {
        Self {
            dt,
            iterations: config.iterations.max(1),
            erp: config.erp,
            damping: config.damping,
            relaxation: config.relaxation,
            friction_scaling: config.friction_scaling,
        }
    }

    pub fn inv_dt(&self) -> f32 {
        if self.dt > 0.0 {
            1.0 / self.dt
        } else {
            0.0
        }
    }
}
