use crate::error::PhysicsError;
use crate::types::{BaseVelocity, DebugItemId, DebugLine, JointState, Pose};
use glam::Vec3;

/// The command/query surface a controller needs from a physics backend.
///
/// Joint indices are actuated-joint indices. Queries are fallible so callers
/// can decide how to degrade when a backend cannot answer.
pub trait World {
    /// Number of actuated joints.
    fn joint_count(&self) -> usize;

    fn total_mass(&self) -> f32;

    fn set_gravity(&mut self, gravity: Vec3);

    /// Sets the position-control target of one joint.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::JointIndex`] if `joint` is not an actuated joint.
    fn set_joint_target(&mut self, joint: usize, position: f32) -> Result<(), PhysicsError>;

    /// Advances the simulation by one fixed substep.
    fn step_substep(&mut self);

    /// Pose of the base link in the world frame.
    ///
    /// # Errors
    ///
    /// Backend-specific; the reference simulator reports [`PhysicsError::Diverged`].
    fn base_pose(&self) -> Result<Pose, PhysicsError>;

    /// Velocity of the base link origin in the world frame.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn base_velocity(&self) -> Result<BaseVelocity, PhysicsError>;

    /// State of every actuated joint.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn joint_states(&self) -> Result<Vec<JointState>, PhysicsError>;

    /// Link indices currently touching the ground plane.
    ///
    /// # Errors
    ///
    /// Backend-specific.
    fn ground_contacts(&self) -> Result<Vec<usize>, PhysicsError>;

    /// Teleports the base and clears its velocity.
    fn reset_base(&mut self, pose: Pose);

    /// Sets joint positions, zeroes joint velocities and holds the new positions.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::JointCount`] if `positions` has the wrong length.
    fn reset_joints(&mut self, positions: &[f32]) -> Result<(), PhysicsError>;

    /// Overwrites the velocity of the base link origin.
    fn set_base_velocity(&mut self, velocity: BaseVelocity);

    /// Applies an instantaneous linear and angular impulse to the base.
    fn apply_base_impulse(&mut self, linear: Vec3, angular: Vec3);

    fn add_debug_line(&mut self, line: DebugLine) -> DebugItemId;

    fn remove_debug_item(&mut self, id: DebugItemId);

    fn clear_debug_items(&mut self);
}
