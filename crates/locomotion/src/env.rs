use crate::error::EnvError;
use crate::observation::Observation;
use crate::reward::RewardBreakdown;
use serde::{Deserialize, Serialize};

/// Reinforcement learning environment trait.
///
/// In the style of classic Gym interfaces: [`reset`] starts an episode and
/// returns its first observation, [`step`] applies one action and reports
/// the new observation, the reward and whether the episode ended.
///
/// [`reset`]: Env::reset
/// [`step`]: Env::step
pub trait Env {
    /// Starts a new episode. A seed makes the episode reproducible.
    fn reset(&mut self, seed: Option<u64>) -> Observation;

    /// Advances the environment by one control step.
    ///
    /// # Errors
    ///
    /// Implementation-defined; see [`EnvError`].
    fn step(&mut self, action: &[f32]) -> Result<Step, EnvError>;

    /// Size of the observation vector.
    fn obs_size(&self) -> usize;

    /// Size of the action vector.
    fn action_size(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub observation: Observation,
    pub reward: f32,
    /// The robot fell.
    pub terminated: bool,
    /// The step cap was reached.
    pub truncated: bool,
    pub info: StepInfo,
}

impl Step {
    #[must_use]
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Which physics call failed during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    BasePose,
    BaseVelocity,
    JointStates,
    GroundContacts,
    JointTarget,
}

/// A physics call that failed; the step went on with the last known value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFault {
    pub query: Query,
    pub message: String,
}

/// Diagnostics attached to every step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub breakdown: RewardBreakdown,
    /// Steps taken in this episode, including this one.
    pub steps: u32,
    pub episode_reward: f32,
    /// Number of links touching the ground.
    pub contacts: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<QueryFault>,
}
