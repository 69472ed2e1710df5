//! # Observations
//!
//! A [`KinematicSnapshot`] is everything the environment reads back from the
//! physics world after a control step. [`ObservationLayout`] flattens a
//! snapshot and the current target into the policy's input vector:
//!
//! | offset   | len | field                                  |
//! |----------|-----|----------------------------------------|
//! | 0        | 1   | base height                            |
//! | 1        | 4   | base orientation quaternion (x, y, z, w) |
//! | 5        | 3   | base linear velocity                   |
//! | 8        | 3   | base angular velocity                  |
//! | 11       | 3   | target velocity                        |
//! | 14       | 4   | target heading quaternion (x, y, z, w) |
//! | 18       | n   | joint positions                        |
//! | 18 + n   | n   | joint velocities                       |

use crate::error::EnvError;
use crate::target::Target;
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

pub type Observation = Vec<f32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicSnapshot {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub joint_positions: Vec<f32>,
    pub joint_velocities: Vec<f32>,
}

impl KinematicSnapshot {
    /// A robot at rest at `position` with identity orientation.
    #[must_use]
    pub fn at_rest(position: Vec3, joint_positions: Vec<f32>) -> Self {
        let joint_velocities = vec![0.0; joint_positions.len()];
        Self {
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            joint_positions,
            joint_velocities,
        }
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.position.z
    }

    /// Vertical component of the body's up axis: 1 upright, 0 on its side,
    /// -1 upside down.
    #[must_use]
    pub fn up_z(&self) -> f32 {
        (self.orientation * Vec3::Z).z
    }

    /// Roll and pitch in radians.
    #[must_use]
    pub fn roll_pitch(&self) -> (f32, f32) {
        let (_yaw, pitch, roll) = self.orientation.to_euler(EulerRot::ZYX);
        (roll, pitch)
    }

    /// Body-frame `axis` expressed in the world frame.
    #[must_use]
    pub fn world_axis(&self, axis: Vec3) -> Vec3 {
        self.orientation * axis
    }
}

/// Describes the observation vector for a robot with `joints` actuated joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationLayout {
    joints: usize,
}

impl ObservationLayout {
    pub const HEIGHT: usize = 0;
    pub const ORIENTATION: usize = 1;
    pub const LINEAR_VELOCITY: usize = 5;
    pub const ANGULAR_VELOCITY: usize = 8;
    pub const TARGET_VELOCITY: usize = 11;
    pub const TARGET_HEADING: usize = 14;
    pub const JOINT_POSITIONS: usize = 18;

    #[must_use]
    pub const fn new(joints: usize) -> Self {
        Self { joints }
    }

    #[must_use]
    pub const fn joints(&self) -> usize {
        self.joints
    }

    #[must_use]
    pub const fn joint_velocities(&self) -> usize {
        Self::JOINT_POSITIONS + self.joints
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        Self::JOINT_POSITIONS + 2 * self.joints
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// `(name, offset, len)` of every field, in order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, usize, usize); 8] {
        [
            ("height", Self::HEIGHT, 1),
            ("orientation", Self::ORIENTATION, 4),
            ("linear_velocity", Self::LINEAR_VELOCITY, 3),
            ("angular_velocity", Self::ANGULAR_VELOCITY, 3),
            ("target_velocity", Self::TARGET_VELOCITY, 3),
            ("target_heading", Self::TARGET_HEADING, 4),
            ("joint_positions", Self::JOINT_POSITIONS, self.joints),
            ("joint_velocities", self.joint_velocities(), self.joints),
        ]
    }

    /// # Errors
    ///
    /// [`EnvError::ObservationMismatch`] if `len` is not this layout's length.
    pub fn check(&self, len: usize) -> Result<(), EnvError> {
        if len == self.len() {
            Ok(())
        } else {
            Err(EnvError::ObservationMismatch { expected: self.len(), actual: len })
        }
    }

    /// Flattens a snapshot and target.
    ///
    /// # Panics
    ///
    /// Debug builds panic if the snapshot's joint count differs from the layout's.
    #[must_use]
    pub fn build(&self, snapshot: &KinematicSnapshot, target: &Target) -> Observation {
        debug_assert_eq!(snapshot.joint_positions.len(), self.joints);
        debug_assert_eq!(snapshot.joint_velocities.len(), self.joints);
        let mut obs = Vec::with_capacity(self.len());
        obs.push(snapshot.height());
        obs.extend_from_slice(&snapshot.orientation.to_array());
        obs.extend_from_slice(&snapshot.linear_velocity.to_array());
        obs.extend_from_slice(&snapshot.angular_velocity.to_array());
        obs.extend_from_slice(&target.velocity.to_array());
        obs.extend_from_slice(&target.heading.to_array());
        obs.extend_from_slice(&snapshot.joint_positions);
        obs.extend_from_slice(&snapshot.joint_velocities);
        obs
    }
}
