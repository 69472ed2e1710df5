#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Locomotion
//!
//! A reinforcement learning environment for legged robots: per-robot
//! configuration, target sampling, action scaling, observations, reward
//! shaping and fall detection, tied together by [`LocomotionEnv`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use locomotion::{Env, LocomotionEnv, RobotRegistry};
//!
//! let registry = RobotRegistry::load("robots/robots.json")?;
//! let config = registry.get("simple_quadruped")?.clone();
//! let mut env = LocomotionEnv::from_config(config, 0)?;
//! let mut obs = env.reset(Some(42));
//! loop {
//!     let action = vec![0.0; env.action_size()];
//!     let step = env.step(&action)?;
//!     if step.done() {
//!         break;
//!     }
//!     obs = step.observation;
//! }
//! ```

pub mod action;
pub mod config;
pub mod env;
pub mod episode;
pub mod error;
pub mod observation;
pub mod recorder;
pub mod reward;
pub mod target;
pub mod termination;
pub mod walker;

pub use action::scale_action;
pub use config::{RobotConfig, RobotRegistry, MAX_STEP_REWARD_BOUND};
pub use env::{Env, Query, QueryFault, Step, StepInfo};
pub use episode::{EpisodeState, Phase};
pub use error::{ConfigError, EnvError};
pub use observation::{KinematicSnapshot, Observation, ObservationLayout};
pub use recorder::{EpisodeRecorder, JsonLinesRecorder, MemoryRecorder, RewardStats, StepRecord};
pub use reward::{compute_reward, kernel, RewardBreakdown, RewardTerm};
pub use target::{
    sample_target, ControlReadError, ControlSource, ExternalTargets, RandomTargets, SliderPanel,
    Target, TargetControls, TargetSampler,
};
pub use termination::{has_fallen, Outcome};
pub use walker::LocomotionEnv;
