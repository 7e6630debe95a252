//! The physics world: owns all simulation state and runs the stepping loop.

use std::collections::HashMap;

use glam::Vec3;

use crate::collision::broadphase::{BroadPhase, UniformGridBroadPhase};
use crate::collision::ccd::CcdDetector;
use crate::collision::dispatcher::CollisionDispatcher;
use crate::collision::manifold::PersistentManifold;
use crate::config::{SolverConfig, SolverInfo, WorldConfig};
use crate::core::collider::Collider;
use crate::core::constraints::Constraint;
use crate::core::rigidbody::RigidBody;
use crate::core::types::Transform;
use crate::dynamics::forces::ForceRegistry;
use crate::dynamics::integrator::Integrator;
use crate::dynamics::island::IslandManager;
use crate::dynamics::solver::SequentialImpulseSolver;
use crate::utils::allocator::{Arena, EntityId};
use crate::utils::logging::{warn_if_budget_exceeded, ScopedTimer};

/// Synchronization boundary toward the caller's scene representation.
///
/// Kinematic bodies pull their transform from here at substep start;
/// non-sleeping dynamic bodies push theirs at substep end.
pub trait MotionState {
    fn get_world_transform(&self) -> Transform;
    fn set_world_transform(&mut self, transform: Transform);
}

/// Central simulation container orchestrating one physics world.
///
/// Single-threaded by design: a step runs to completion before anything else
/// may touch the world, so no internal locking exists.
pub struct PhysicsWorld {
    pub config: WorldConfig,
    pub solver_config: SolverConfig,
    bodies: Arena<RigidBody>,
    colliders: Arena<Collider>,
    constraints: Arena<Constraint>,
    broadphase: Box<dyn BroadPhase>,
    dispatcher: CollisionDispatcher,
    islands: IslandManager,
    solver: SequentialImpulseSolver,
    integrator: Integrator,
    ccd: CcdDetector,
    force_registry: ForceRegistry,
    motion_states: HashMap<EntityId, Box<dyn MotionState>>,
    accumulator: f32,
    last_max_impulse: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(WorldConfig::default(), SolverConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: WorldConfig, solver_config: SolverConfig) -> Self {
        let config = config.sanitized();
        Self {
            ccd: CcdDetector::new(config.ccd_motion_threshold),
            config,
            solver_config,
            bodies: Arena::new(),
            colliders: Arena::new(),
            constraints: Arena::new(),
            broadphase: Box::new(UniformGridBroadPhase::default()),
            dispatcher: CollisionDispatcher::default(),
            islands: IslandManager::new(),
            solver: SequentialImpulseSolver::new(),
            integrator: Integrator::new(),
            force_registry: ForceRegistry::new(),
            motion_states: HashMap::new(),
            accumulator: 0.0,
            last_max_impulse: 0.0,
        }
    }

    pub fn set_broadphase<B>(&mut self, broadphase: B)
    where
        B: BroadPhase + 'static,
    {
        self.broadphase = Box::new(broadphase);
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
    }

    pub fn set_ccd_motion_threshold(&mut self, threshold: f32) {
        self.config.ccd_motion_threshold = threshold;
        self.ccd.set_motion_threshold(threshold);
    }

    pub fn add_body(&mut self, body: RigidBody) -> EntityId {
        let id = self.bodies.insert(body);
        if let Some(stored) = self.bodies.get_mut(id) {
            stored.id = id;
        }
        id
    }

    pub fn remove_body(&mut self, id: EntityId) -> Option<RigidBody> {
        let removed = self.bodies.remove(id)?;
        let stale: Vec<EntityId> = self
            .colliders
            .ids()
            .filter(|cid| {
                self.colliders
                    .get(*cid)
                    .map(|c| c.body == id)
                    .unwrap_or(false)
            })
            .collect();
        for cid in stale {
            self.colliders.remove(cid);
            self.broadphase.remove_proxy(cid);
        }
        self.motion_states.remove(&id);
        Some(removed)
    }

    pub fn add_collider(&mut self, collider: Collider) -> EntityId {
        let id = self.colliders.insert(collider);
        if let Some(stored) = self.colliders.get_mut(id) {
            stored.id = id;
        }
        id
    }

    pub fn body(&self, id: EntityId) -> Option<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(id)
    }

    pub fn bodies(&self) -> &Arena<RigidBody> {
        &self.bodies
    }

    pub fn collider(&self, id: EntityId) -> Option<&Collider> {
        self.colliders.get(id)
    }

    pub fn force_registry_mut(&mut self) -> &mut ForceRegistry {
        &mut self.force_registry
    }

    pub fn set_motion_state<M>(&mut self, body: EntityId, state: M)
    where
        M: MotionState + 'static,
    {
        self.motion_states.insert(body, Box::new(state));
    }

    /// Applies an impulse at `rel_pos` from the body's center of mass,
    /// waking it. Returns false for an unknown id.
    pub fn apply_impulse(&mut self, body: EntityId, impulse: Vec3, rel_pos: Vec3) -> bool {
        match self.bodies.get_mut(body) {
            Some(body) => {
                body.apply_impulse(impulse, rel_pos);
                true
            }
            None => false,
        }
    }

    pub fn apply_force(&mut self, body: EntityId, force: Vec3) -> bool {
        match self.bodies.get_mut(body) {
            Some(body) => {
                body.apply_force(force);
                true
            }
            None => false,
        }
    }

    pub fn apply_torque(&mut self, body: EntityId, torque: Vec3) -> bool {
        match self.bodies.get_mut(body) {
            Some(body) => {
                body.apply_torque(torque);
                true
            }
            None => false,
        }
    }

    /// Registers an auxiliary constraint and wakes both bodies.
    pub fn create_constraint(&mut self, constraint: Constraint) -> EntityId {
        let (id_a, id_b) = constraint.bodies();
        for id in [id_a, id_b] {
            if let Some(body) = self.bodies.get_mut(id) {
                body.activate();
            }
        }
        self.constraints.insert(constraint)
    }

    pub fn remove_constraint(&mut self, id: EntityId) -> bool {
        self.constraints.remove(id).is_some()
    }

    /// Read access to the persistent manifolds, for diagnostics and contact
    /// rendering.
    pub fn manifold_count(&self) -> usize {
        self.dispatcher.manifold_count()
    }

    pub fn manifold(&self, index: usize) -> Option<&PersistentManifold> {
        self.dispatcher.manifold(index)
    }

    pub fn dispatcher_mut(&mut self) -> &mut CollisionDispatcher {
        &mut self.dispatcher
    }

    /// Largest impulse the solver applied during the most recent substep.
    pub fn last_max_impulse(&self) -> f32 {
        self.last_max_impulse
    }

    /// Advances the simulation by wall-clock `dt`, running up to
    /// `max_substeps` fixed substeps. Returns the substeps executed; zero or
    /// negative `dt` is an explicit no-op.
    pub fn step(&mut self, dt: f32) -> u32 {
        if dt <= 0.0 {
            return 0;
        }

        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= self.config.time_step && substeps < self.config.max_substeps {
            self.substep(self.config.time_step);
            self.accumulator -= self.config.time_step;
            substeps += 1;
        }
        // Cap the backlog so a stalled caller cannot demand ever more
        // substeps per frame.
        if self.accumulator > self.config.time_step {
            self.accumulator = self.config.time_step;
        }
        substeps
    }

    /// One fixed substep: forces, collision, islands + solve, integration
    /// with optional TOI clamping, activation upkeep, motion-state sync.
    fn substep(&mut self, dt: f32) {
        let frame_timer = ScopedTimer::new("world::substep");

        // Kinematic bodies follow their externally-driven motion state.
        for (id, state) in &self.motion_states {
            if let Some(body) = self.bodies.get_mut(*id) {
                if body.is_kinematic() {
                    body.transform = state.get_world_transform();
                }
            }
        }

        {
            let _timer = ScopedTimer::new("forces::integrate");
            self.force_registry.apply_all(&mut self.bodies, dt);
            let gravity = self.config.gravity;
            for body in self.bodies.iter_mut() {
                body.update_world_inertia();
                self.integrator.integrate_forces(body, gravity, dt);
            }
        }

        let pairs = {
            let _timer = ScopedTimer::new("broadphase");
            let margin = self.config.contact_breaking_threshold;
            for id in self.colliders.ids().collect::<Vec<_>>() {
                let Some(collider) = self.colliders.get(id) else {
                    continue;
                };
                let Some(body) = self.bodies.get(collider.body) else {
                    continue;
                };
                let (min, max) = collider.aabb(&body.transform, margin);
                self.broadphase.set_aabb(id, min, max);
            }
            self.broadphase.overlapping_pairs()
        };

        {
            let _timer = ScopedTimer::new("narrowphase::dispatch");
            self.dispatcher
                .dispatch(&pairs, &self.colliders, &mut self.bodies, &self.config);
        }

        {
            let _timer = ScopedTimer::new("islands::solve");
            let info = SolverInfo::new(&self.solver_config, dt);
            let solver = &self.solver;
            let constraints = &self.constraints;
            let mut max_impulse = 0.0f32;
            self.islands.build_and_process_islands(
                &mut self.bodies,
                self.dispatcher.manifolds_mut(),
                constraints,
                |island, bodies, manifolds| {
                    let applied = solver.solve_island(
                        bodies,
                        manifolds,
                        &island.manifolds,
                        constraints,
                        &island.constraints,
                        &info,
                    );
                    max_impulse = max_impulse.max(applied);
                },
            );
            self.last_max_impulse = max_impulse;
        }

        {
            let _timer = ScopedTimer::new("integrate::commit");
            for id in self.bodies.ids().collect::<Vec<_>>() {
                let Some(body) = self.bodies.get(id) else {
                    continue;
                };
                if body.is_static() || body.is_sleeping() {
                    continue;
                }

                let fraction = if body.is_kinematic() {
                    1.0
                } else {
                    let predicted = self.integrator.predict_transform(body, dt);
                    self.ccd
                        .clamp_motion(id, body, &predicted, &self.bodies, &self.colliders)
                };

                if let Some(body) = self.bodies.get_mut(id) {
                    self.integrator.commit(body, dt * fraction);
                }
            }
        }

        {
            let _timer = ScopedTimer::new("activation::update");
            for body in self.bodies.iter_mut() {
                body.update_activation(dt, &self.config);
            }
            self.islands.update_sleeping(&mut self.bodies);
        }

        for (id, state) in &mut self.motion_states {
            if let Some(body) = self.bodies.get(*id) {
                if !body.is_fixed() && !body.is_sleeping() {
                    state.set_world_transform(body.transform);
                }
            }
        }

        warn_if_budget_exceeded(frame_timer.elapsed(), self.config.frame_budget_ms);
    }
}
