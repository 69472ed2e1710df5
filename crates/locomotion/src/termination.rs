//! # Termination
//!
//! A robot has fallen once its base drops below `FALL_HEIGHT` or its up
//! axis tips below `FALL_UP_THRESHOLD`. Both comparisons are strict. An
//! episode that reaches `MAX_EPISODE_STEPS` without falling is truncated.

use crate::config::RobotConfig;
use crate::observation::KinematicSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Running,
    /// The robot fell.
    Terminated,
    /// The step cap was reached.
    Truncated,
}

/// Fall check on a single snapshot.
#[must_use]
pub fn has_fallen(snapshot: &KinematicSnapshot, config: &RobotConfig) -> bool {
    snapshot.height() < config.fall_height || snapshot.up_z() < config.fall_up_threshold
}

/// Verdict after `steps` completed steps. A fall outranks truncation, and a
/// robot that has already fallen stays fallen.
#[must_use]
pub fn evaluate(
    snapshot: &KinematicSnapshot,
    already_fallen: bool,
    steps: u32,
    config: &RobotConfig,
) -> Outcome {
    if already_fallen || has_fallen(snapshot, config) {
        Outcome::Terminated
    } else if steps >= config.max_episode_steps {
        Outcome::Truncated
    } else {
        Outcome::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn at_height(z: f32) -> KinematicSnapshot {
        KinematicSnapshot::at_rest(Vec3::new(0.0, 0.0, z), Vec::new())
    }

    #[test]
    fn threshold_is_strict() {
        let config = RobotConfig { fall_height: 0.1, ..RobotConfig::default() };
        assert!(!has_fallen(&at_height(0.1), &config));
        assert!(has_fallen(&at_height(0.099), &config));
        assert!(!has_fallen(&at_height(0.3), &config));
    }

    #[test]
    fn tipping_over_is_a_fall() {
        let config = RobotConfig::default();
        let mut snap = at_height(0.3);
        snap.orientation = Quat::from_rotation_y(1.2);
        assert!(snap.up_z() < 0.5);
        assert!(has_fallen(&snap, &config));
        // cos(1.0) is about 0.54.
        snap.orientation = Quat::from_rotation_y(1.0);
        assert!(!has_fallen(&snap, &config));
    }

    #[test]
    fn fall_on_cap_step_is_terminated() {
        let config = RobotConfig { max_episode_steps: 5, ..RobotConfig::default() };
        assert_eq!(evaluate(&at_height(0.3), false, 4, &config), Outcome::Running);
        assert_eq!(evaluate(&at_height(0.3), false, 5, &config), Outcome::Truncated);
        assert_eq!(evaluate(&at_height(0.0), false, 5, &config), Outcome::Terminated);
    }

    #[test]
    fn fallen_is_absorbing() {
        let config = RobotConfig::default();
        assert_eq!(evaluate(&at_height(0.3), true, 1, &config), Outcome::Terminated);
    }
}
