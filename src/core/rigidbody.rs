use glam::{Mat3, Vec3};

use super::types::{MassProperties, Material, Transform, Velocity};
use crate::config::WorldConfig;
use crate::utils::allocator::EntityId;

/// Per-body activation state machine.
///
/// Bodies demote through `Active -> WantsDeactivation -> Sleeping`; the last
/// transition happens only island-wide (see `dynamics::island`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    #[default]
    Active,
    WantsDeactivation,
    Sleeping,
}

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    #[default]
    Dynamic,
    /// Infinite mass, moved externally through its motion state.
    Kinematic,
    /// Infinite mass, never moves.
    Static,
}

/// Rigid body: kinematic state, mass data, and activation bookkeeping.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub id: EntityId,
    pub kind: BodyKind,
    pub transform: Transform,
    pub velocity: Velocity,
    pub material: Material,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    force: Vec3,
    torque: Vec3,
    mass_properties: MassProperties,
    inverse_mass: f32,
    inverse_inertia_local: Mat3,
    /// World-space inverse inertia, refreshed from the orientation each substep.
    inverse_inertia_world: Mat3,
    activation: ActivationState,
    deactivation_timer: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        let mut body = Self {
            id: EntityId::default(),
            kind: BodyKind::Dynamic,
            transform: Transform::default(),
            velocity: Velocity::default(),
            material: Material::default(),
            gravity_scale: 1.0,
            linear_damping: 0.02,
            angular_damping: 0.02,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            mass_properties: MassProperties::default(),
            inverse_mass: 1.0,
            inverse_inertia_local: Mat3::IDENTITY,
            inverse_inertia_world: Mat3::IDENTITY,
            activation: ActivationState::Active,
            deactivation_timer: 0.0,
        };
        body.recompute_inverses();
        body
    }
}

impl RigidBody {
    pub fn new(transform: Transform, mass_properties: MassProperties) -> Self {
        let mut body = Self {
            transform,
            mass_properties,
            ..Self::default()
        };
        body.recompute_inverses();
        body
    }

    pub fn fixed(transform: Transform) -> Self {
        let mut body = Self::new(transform, MassProperties::fixed());
        body.kind = BodyKind::Static;
        body
    }

    pub fn kinematic(transform: Transform) -> Self {
        let mut body = Self::new(transform, MassProperties::fixed());
        body.kind = BodyKind::Kinematic;
        body
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, BodyKind::Static)
    }

    pub fn is_kinematic(&self) -> bool {
        matches!(self.kind, BodyKind::Kinematic)
    }

    /// Static or kinematic: does not respond to impulses.
    pub fn is_fixed(&self) -> bool {
        !matches!(self.kind, BodyKind::Dynamic)
    }

    pub fn mass_properties(&self) -> MassProperties {
        self.mass_properties
    }

    pub fn set_mass_properties(&mut self, props: MassProperties) {
        self.mass_properties = props;
        self.recompute_inverses();
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    pub fn inverse_inertia_world(&self) -> Mat3 {
        self.inverse_inertia_world
    }

    /// Refreshes the world-space inverse inertia from the current orientation.
    pub fn update_world_inertia(&mut self) {
        let basis = Mat3::from_quat(self.transform.rotation);
        self.inverse_inertia_world = basis * self.inverse_inertia_local * basis.transpose();
    }

    pub fn activation_state(&self) -> ActivationState {
        self.activation
    }

    pub fn is_sleeping(&self) -> bool {
        self.activation == ActivationState::Sleeping
    }

    pub fn deactivation_timer(&self) -> f32 {
        self.deactivation_timer
    }

    /// Forces the body awake and resets its deactivation timer.
    pub fn activate(&mut self) {
        if self.is_static() {
            return;
        }
        self.activation = ActivationState::Active;
        self.deactivation_timer = 0.0;
    }

    /// Island-wide wake that keeps the deactivation timer, so a settled body
    /// dragged awake by a neighbor can demote again without re-counting.
    pub(crate) fn revert_to_active(&mut self) {
        if !self.is_static() {
            self.activation = ActivationState::Active;
        }
    }

    /// Island-wide demotion; velocities are zeroed so a sleeping body carries
    /// no residual motion into its wake-up.
    pub fn put_to_sleep(&mut self) {
        self.activation = ActivationState::Sleeping;
        self.velocity = Velocity::default();
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    pub fn apply_force(&mut self, force: Vec3) {
        if self.is_fixed() {
            return;
        }
        self.force += force;
        self.activate();
    }

    pub fn apply_torque(&mut self, torque: Vec3) {
        if self.is_fixed() {
            return;
        }
        self.torque += torque;
        self.activate();
    }

    /// Applies an impulse at `rel_pos` from the center of mass.
    pub fn apply_impulse(&mut self, impulse: Vec3, rel_pos: Vec3) {
        if self.is_fixed() {
            return;
        }
        self.velocity.linear += impulse * self.inverse_mass;
        self.velocity.angular += self.inverse_inertia_world * rel_pos.cross(impulse);
        self.activate();
    }

    /// Impulse application without the wake side effect; the solver calls
    /// this on bodies it already knows are awake.
    pub(crate) fn apply_impulse_internal(&mut self, impulse: Vec3, rel_pos: Vec3) {
        if self.is_fixed() {
            return;
        }
        self.velocity.linear += impulse * self.inverse_mass;
        self.velocity.angular += self.inverse_inertia_world * rel_pos.cross(impulse);
    }

    pub(crate) fn accumulated_force(&self) -> Vec3 {
        self.force
    }

    pub(crate) fn accumulated_torque(&self) -> Vec3 {
        self.torque
    }

    pub(crate) fn clear_accumulators(&mut self) {
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }

    /// Advances the deactivation timer from the current speeds.
    ///
    /// Only handles `Active <-> WantsDeactivation`; the sleeping transition
    /// requires island-wide agreement.
    pub fn update_activation(&mut self, dt: f32, config: &WorldConfig) {
        if self.is_fixed() || self.is_sleeping() {
            return;
        }

        let slow = self.velocity.linear.length_squared()
            < config.linear_sleep_threshold * config.linear_sleep_threshold
            && self.velocity.angular.length_squared()
                < config.angular_sleep_threshold * config.angular_sleep_threshold;

        if slow {
            self.deactivation_timer += dt;
            if self.deactivation_timer > config.deactivation_time {
                self.activation = ActivationState::WantsDeactivation;
            }
        } else {
            self.deactivation_timer = 0.0;
            self.activation = ActivationState::Active;
        }
    }

    fn recompute_inverses(&mut self) {
        self.inverse_mass = if self.mass_properties.mass <= f32::EPSILON {
            0.0
        } else {
            1.0 / self.mass_properties.mass
        };

        self.inverse_inertia_local = if self.inverse_mass == 0.0
            || self.mass_properties.inertia.determinant().abs() < f32::EPSILON
        {
            Mat3::ZERO
        } else {
            self.mass_properties.inertia.inverse()
        };
        self.update_world_inertia();
    }
}
