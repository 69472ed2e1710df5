//! # Reward Shaping
//!
//! One scalar reward per control step, built from independently weighted
//! terms. Positive terms are bounded by their weights (the velocity term by
//! twice its weight) using the Gaussian [`kernel`]; penalties are
//! non-negative magnitudes scaled by their weights and subtracted. A term
//! whose weight is zero is left out of the breakdown entirely.

use crate::action::clamp_action;
use crate::config::RobotConfig;
use crate::episode::EpisodeState;
use crate::observation::KinematicSnapshot;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `exp(-(err / tol)²)`: 1 at zero error, falling off over `tol`.
#[must_use]
pub fn kernel(err: f32, tol: f32) -> f32 {
    let x = err / tol;
    (-x * x).exp()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardTerm {
    ForwardVelocity,
    Orientation,
    Upright,
    Survival,
    ActionPenalty,
    ShakePenalty,
    JumpPenalty,
    HighAltitudePenalty,
    HomePositionPenalty,
    TiltPenalty,
    Fallen,
}

impl RewardTerm {
    pub const ALL: [RewardTerm; 11] = [
        RewardTerm::ForwardVelocity,
        RewardTerm::Orientation,
        RewardTerm::Upright,
        RewardTerm::Survival,
        RewardTerm::ActionPenalty,
        RewardTerm::ShakePenalty,
        RewardTerm::JumpPenalty,
        RewardTerm::HighAltitudePenalty,
        RewardTerm::HomePositionPenalty,
        RewardTerm::TiltPenalty,
        RewardTerm::Fallen,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            RewardTerm::ForwardVelocity => "forward_velocity",
            RewardTerm::Orientation => "orientation",
            RewardTerm::Upright => "upright",
            RewardTerm::Survival => "survival",
            RewardTerm::ActionPenalty => "action_penalty",
            RewardTerm::ShakePenalty => "shake_penalty",
            RewardTerm::JumpPenalty => "jump_penalty",
            RewardTerm::HighAltitudePenalty => "high_altitude_penalty",
            RewardTerm::HomePositionPenalty => "home_position_penalty",
            RewardTerm::TiltPenalty => "tilt_penalty",
            RewardTerm::Fallen => "fallen",
        }
    }
}

impl fmt::Display for RewardTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signed contribution of every active term. Sums to the step reward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardBreakdown {
    terms: BTreeMap<RewardTerm, f32>,
}

impl RewardBreakdown {
    pub fn insert(&mut self, term: RewardTerm, value: f32) {
        self.terms.insert(term, value);
    }

    #[must_use]
    pub fn get(&self, term: RewardTerm) -> Option<f32> {
        self.terms.get(&term).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RewardTerm, f32)> + '_ {
        self.terms.iter().map(|(&term, &value)| (term, value))
    }

    #[must_use]
    pub fn total(&self) -> f32 {
        self.terms.values().sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn mean(values: impl ExactSizeIterator<Item = f32>) -> f32 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = n as f32;
    values.sum::<f32>() / n
}

fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

/// Reward for the step that moved the robot from `prev` to `curr`.
///
/// `fell` is true only on the step where the robot first counts as fallen;
/// that step pays [`RobotConfig::fallen_penalty`] and no survival bonus.
#[must_use]
pub fn compute_reward(
    prev: &KinematicSnapshot,
    curr: &KinematicSnapshot,
    episode: &EpisodeState,
    config: &RobotConfig,
    action: &[f32],
    fell: bool,
) -> (f32, RewardBreakdown) {
    let mut breakdown = RewardBreakdown::default();
    let mut add = |term: RewardTerm, weight: f32, magnitude: f32| {
        if weight > 0.0 {
            breakdown.insert(term, weight * magnitude);
        }
    };

    let velocity = horizontal(curr.linear_velocity);
    let target = horizontal(episode.target.velocity);
    let speed = target.length();
    let progress = if speed > 1e-6 {
        (velocity.dot(target) / (speed * speed)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let tracking = kernel((velocity - target).length(), config.velocity_tolerance);
    add(RewardTerm::ForwardVelocity, config.forward_vel_weight, tracking + progress);

    let forward = horizontal(curr.world_axis(config.forward_axis)).normalize_or_zero();
    let misalignment = 1.0 - forward.dot(episode.target.heading_direction());
    add(
        RewardTerm::Orientation,
        config.orientation_reward_weight,
        kernel(misalignment, config.orientation_tolerance),
    );

    add(RewardTerm::Upright, config.upright_reward_weight, curr.up_z().clamp(0.0, 1.0));

    if !fell {
        add(RewardTerm::Survival, config.survival_weight, 1.0);
    }

    let action_cost = mean(action.iter().map(|&a| clamp_action(a).powi(2)));
    add(RewardTerm::ActionPenalty, config.action_penalty_weight, -action_cost);

    let shake = mean(
        curr.joint_velocities
            .iter()
            .zip(&prev.joint_velocities)
            .map(|(now, before)| (now - before).abs()),
    );
    add(RewardTerm::ShakePenalty, config.shake_penalty_weight, -shake);

    let jump = (curr.linear_velocity.z.abs() - config.jump_neutral_band).max(0.0);
    add(RewardTerm::JumpPenalty, config.jump_penalty_weight, -jump);

    let nominal = config.target_height.unwrap_or(episode.spawn_height);
    let altitude = (curr.height() - nominal).max(0.0);
    add(RewardTerm::HighAltitudePenalty, config.high_altitude_penalty_weight, -altitude);

    let drift = mean(
        curr.joint_positions
            .iter()
            .zip(&episode.home)
            .map(|(q, home)| (q - home).abs()),
    );
    add(RewardTerm::HomePositionPenalty, config.home_position_penalty_weight, -drift);

    let (roll, pitch) = curr.roll_pitch();
    add(RewardTerm::TiltPenalty, config.tilt_penalty_weight, -(roll.abs() + pitch.abs()));

    if fell {
        add(RewardTerm::Fallen, config.fallen_penalty, -1.0);
    }

    (breakdown.total(), breakdown)
}
