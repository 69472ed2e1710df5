//! # Spawn Clearance
//!
//! How far a robot has to be lifted so that, at its rest pose, none of its
//! collision geometry starts below the ground plane.

use crate::error::GeometryError;
use crate::RobotDescription;
use physics::Pose;

/// Minimum non-negative base height at which every collider of the robot is
/// at or above `z = 0`, with the base at the origin, identity orientation and
/// all joints at their home positions.
///
/// # Errors
///
/// Fails when the description has no usable collision geometry or cannot be
/// turned into a valid joint tree.
pub fn compute_min_clearance(description: &RobotDescription) -> Result<f32, GeometryError> {
    let articulation = description.to_articulation()?;
    let home = articulation.home_positions();

    let lowest = articulation
        .collider_poses(&Pose::IDENTITY, &home)
        .iter()
        .map(|(_, pose, shape)| shape.lowest_point(pose))
        .fold(f32::INFINITY, f32::min);

    if !lowest.is_finite() {
        return Err(GeometryError::Malformed(format!(
            "robot '{}' has non-finite collision geometry at its rest pose",
            description.name
        )));
    }
    Ok((-lowest).max(0.0))
}
