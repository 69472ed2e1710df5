//! Per-episode bookkeeping owned by the environment.

use crate::observation::KinematicSnapshot;
use crate::target::Target;
use serde::{Deserialize, Serialize};

/// Lifecycle of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Constructed, never reset.
    Ready,
    Running,
    /// The robot fell. Absorbing until the next reset.
    Terminated,
    /// The step cap was reached.
    Truncated,
}

impl Phase {
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Phase::Terminated | Phase::Truncated)
    }
}

/// Mutable state of one episode. Rebuilt from scratch by every reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeState {
    pub steps: u32,
    pub target: Target,
    pub episode_reward: f32,
    pub fallen: bool,
    /// Base height the episode started at.
    pub spawn_height: f32,
    /// Joint posture the episode started from.
    pub home: Vec<f32>,
    /// Snapshot taken after the previous step (or at reset).
    pub prev: KinematicSnapshot,
    /// Clamped action applied on the previous step.
    pub last_action: Vec<f32>,
}

impl EpisodeState {
    #[must_use]
    pub fn new(target: Target, spawn_height: f32, home: Vec<f32>, snapshot: KinematicSnapshot) -> Self {
        let last_action = vec![0.0; home.len()];
        Self {
            steps: 0,
            target,
            episode_reward: 0.0,
            fallen: false,
            spawn_height,
            home,
            prev: snapshot,
            last_action,
        }
    }
}
