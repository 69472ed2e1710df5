//! # Robot Configuration
//!
//! Per-robot reward weights and episode parameters, loaded once from a JSON
//! table keyed by robot name:
//!
//! ```json
//! {
//!   "simple_quadruped": {
//!     "description": "simple_quadruped.json",
//!     "FORWARD_VEL_WEIGHT": 10.0,
//!     "UPRIGHT_REWARD_WEIGHT": 0.5,
//!     "FALLEN_PENALTY": 20.0
//!   }
//! }
//! ```
//!
//! Weights that are not listed are zero, which removes the term. Penalties
//! are positive magnitudes; the reward engine subtracts them.

use crate::error::ConfigError;
use glam::Vec3;
use phenotype::{DescriptionError, RobotDescription};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Upper bound on [`RobotConfig::max_step_reward`] accepted at load time.
pub const MAX_STEP_REWARD_BOUND: f32 = 25.0;

const fn default_target_speed() -> f32 {
    0.5
}
const fn default_velocity_tolerance() -> f32 {
    0.25
}
const fn default_orientation_tolerance() -> f32 {
    0.5
}
const fn default_jump_neutral_band() -> f32 {
    0.2
}
const fn default_fall_height() -> f32 {
    0.1
}
const fn default_fall_up_threshold() -> f32 {
    0.5
}
const fn default_max_episode_steps() -> u32 {
    1000
}
const fn default_substeps() -> u32 {
    10
}
const fn default_timestep() -> f32 {
    1.0 / 240.0
}
const fn default_gravity() -> Vec3 {
    Vec3::new(0.0, 0.0, -9.81)
}
const fn default_forward_axis() -> Vec3 {
    Vec3::X
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct RobotConfig {
    /// Robot description file (JSON or URDF). Relative paths are resolved
    /// against the directory of the config file.
    #[serde(rename = "description")]
    pub description: PathBuf,
    #[serde(rename = "save_path", default)]
    pub save_path: Option<PathBuf>,
    #[serde(rename = "save_prefix", default)]
    pub save_prefix: Option<String>,

    #[serde(default)]
    pub upright_reward_weight: f32,
    #[serde(default)]
    pub forward_vel_weight: f32,
    #[serde(default)]
    pub orientation_reward_weight: f32,
    #[serde(default)]
    pub survival_weight: f32,
    #[serde(default)]
    pub action_penalty_weight: f32,
    #[serde(default)]
    pub shake_penalty_weight: f32,
    #[serde(default)]
    pub jump_penalty_weight: f32,
    #[serde(default)]
    pub high_altitude_penalty_weight: f32,
    #[serde(default)]
    pub home_position_penalty_weight: f32,
    #[serde(default)]
    pub tilt_penalty_weight: f32,
    #[serde(default)]
    pub fallen_penalty: f32,

    /// Fraction of each joint's native range usable around home; 0 means
    /// the whole native range.
    #[serde(default)]
    pub action_limit: f32,
    /// Scale of the random push applied at reset, in `[0, 1]`.
    #[serde(default)]
    pub initial_momentum: f32,
    /// Nominal body height for the high-altitude penalty. Defaults to the
    /// spawn height.
    #[serde(default)]
    pub target_height: Option<f32>,
    #[serde(default = "default_target_speed")]
    pub target_speed: f32,
    #[serde(default = "default_velocity_tolerance")]
    pub velocity_tolerance: f32,
    #[serde(default = "default_orientation_tolerance")]
    pub orientation_tolerance: f32,
    #[serde(default = "default_jump_neutral_band")]
    pub jump_neutral_band: f32,
    #[serde(default = "default_fall_height")]
    pub fall_height: f32,
    #[serde(default = "default_fall_up_threshold")]
    pub fall_up_threshold: f32,
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,
    /// Physics substeps per control step.
    #[serde(default = "default_substeps")]
    pub substeps: u32,
    /// Physics substep length in seconds.
    #[serde(default = "default_timestep")]
    pub timestep: f32,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    /// Added to the computed spawn position.
    #[serde(default)]
    pub start_offset: Vec3,
    /// Body-frame axis that counts as "forward" for heading tracking.
    #[serde(default = "default_forward_axis")]
    pub forward_axis: Vec3,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            description: PathBuf::new(),
            save_path: None,
            save_prefix: None,
            upright_reward_weight: 0.0,
            forward_vel_weight: 0.0,
            orientation_reward_weight: 0.0,
            survival_weight: 0.0,
            action_penalty_weight: 0.0,
            shake_penalty_weight: 0.0,
            jump_penalty_weight: 0.0,
            high_altitude_penalty_weight: 0.0,
            home_position_penalty_weight: 0.0,
            tilt_penalty_weight: 0.0,
            fallen_penalty: 0.0,
            action_limit: 0.0,
            initial_momentum: 0.0,
            target_height: None,
            target_speed: default_target_speed(),
            velocity_tolerance: default_velocity_tolerance(),
            orientation_tolerance: default_orientation_tolerance(),
            jump_neutral_band: default_jump_neutral_band(),
            fall_height: default_fall_height(),
            fall_up_threshold: default_fall_up_threshold(),
            max_episode_steps: default_max_episode_steps(),
            substeps: default_substeps(),
            timestep: default_timestep(),
            gravity: default_gravity(),
            start_offset: Vec3::ZERO,
            forward_axis: default_forward_axis(),
        }
    }
}

impl RobotConfig {
    /// Largest reward a single step can earn: the sum of the positive terms
    /// at their kernel maxima. The velocity term peaks at twice its weight.
    #[must_use]
    pub fn max_step_reward(&self) -> f32 {
        self.upright_reward_weight
            + 2.0 * self.forward_vel_weight
            + self.orientation_reward_weight
            + self.survival_weight
    }

    /// Every named weight with its value, in a fixed order.
    #[must_use]
    pub fn weights(&self) -> [(&'static str, f32); 11] {
        [
            ("UPRIGHT_REWARD_WEIGHT", self.upright_reward_weight),
            ("FORWARD_VEL_WEIGHT", self.forward_vel_weight),
            ("ORIENTATION_REWARD_WEIGHT", self.orientation_reward_weight),
            ("SURVIVAL_WEIGHT", self.survival_weight),
            ("ACTION_PENALTY_WEIGHT", self.action_penalty_weight),
            ("SHAKE_PENALTY_WEIGHT", self.shake_penalty_weight),
            ("JUMP_PENALTY_WEIGHT", self.jump_penalty_weight),
            ("HIGH_ALTITUDE_PENALTY_WEIGHT", self.high_altitude_penalty_weight),
            ("HOME_POSITION_PENALTY_WEIGHT", self.home_position_penalty_weight),
            ("TILT_PENALTY_WEIGHT", self.tilt_penalty_weight),
            ("FALLEN_PENALTY", self.fallen_penalty),
        ]
    }

    /// Control period in seconds.
    #[must_use]
    pub fn control_dt(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let substeps = self.substeps as f32;
        self.timestep * substeps
    }

    /// Rejects values the environment cannot run with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the offending key, or
    /// [`ConfigError::RewardBound`] if [`Self::max_step_reward`] exceeds
    /// [`MAX_STEP_REWARD_BOUND`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.weights() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(name, value, "must be a finite non-negative number"));
            }
        }
        for (name, value) in [
            ("ACTION_LIMIT", self.action_limit),
            ("INITIAL_MOMENTUM", self.initial_momentum),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(name, value, "must lie in [0, 1]"));
            }
        }
        if let Some(height) = self.target_height {
            if !(height.is_finite() && height >= 0.0) {
                return Err(invalid("TARGET_HEIGHT", height, "must be a finite non-negative number"));
            }
        }
        for (name, value) in [
            ("TARGET_SPEED", self.target_speed),
            ("JUMP_NEUTRAL_BAND", self.jump_neutral_band),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(name, value, "must be a finite non-negative number"));
            }
        }
        for (name, value) in [
            ("VELOCITY_TOLERANCE", self.velocity_tolerance),
            ("ORIENTATION_TOLERANCE", self.orientation_tolerance),
            ("TIMESTEP", self.timestep),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, value, "must be positive"));
            }
        }
        if !self.fall_height.is_finite() {
            return Err(invalid("FALL_HEIGHT", self.fall_height, "must be finite"));
        }
        if !(-1.0..=1.0).contains(&self.fall_up_threshold) {
            return Err(invalid("FALL_UP_THRESHOLD", self.fall_up_threshold, "must lie in [-1, 1]"));
        }
        if self.substeps == 0 {
            return Err(ConfigError::Invalid("SUBSTEPS must be at least 1".into()));
        }
        if self.max_episode_steps == 0 {
            return Err(ConfigError::Invalid("MAX_EPISODE_STEPS must be at least 1".into()));
        }
        if !(self.gravity.is_finite() && self.start_offset.is_finite()) {
            return Err(ConfigError::Invalid("GRAVITY and START_OFFSET must be finite".into()));
        }
        if !(self.forward_axis.is_finite() && self.forward_axis.length_squared() > 1e-12) {
            return Err(ConfigError::Invalid("FORWARD_AXIS must be a non-zero vector".into()));
        }

        let bound = self.max_step_reward();
        if bound > MAX_STEP_REWARD_BOUND {
            return Err(ConfigError::RewardBound { bound, limit: MAX_STEP_REWARD_BOUND });
        }
        Ok(())
    }

    /// Loads the robot description this config points at.
    ///
    /// # Errors
    ///
    /// See [`RobotDescription::load`].
    pub fn load_description(&self) -> Result<RobotDescription, DescriptionError> {
        RobotDescription::load(&self.description)
    }
}

fn invalid(name: &str, value: f32, requirement: &str) -> ConfigError {
    ConfigError::Invalid(format!("{name} = {value} {requirement}"))
}

/// All robot configurations from one config file.
#[derive(Debug, Clone, Default)]
pub struct RobotRegistry {
    robots: BTreeMap<String, RobotConfig>,
}

impl RobotRegistry {
    /// Reads and validates a config table. Description paths are resolved
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// I/O and JSON errors, or the first robot that fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let registry = Self::from_json(&json, base)?;
        tracing::info!(
            robots = registry.robots.len(),
            "loaded robot configs from {}",
            path.display()
        );
        Ok(registry)
    }

    /// Parses a config table, resolving relative description paths against `base`.
    ///
    /// # Errors
    ///
    /// JSON errors or the first robot that fails validation.
    pub fn from_json(json: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut robots: BTreeMap<String, RobotConfig> = serde_json::from_str(json)?;
        for (name, config) in &mut robots {
            config.validate().map_err(|source| ConfigError::Robot {
                name: name.clone(),
                source: Box::new(source),
            })?;
            if config.description.is_relative() {
                config.description = base.join(&config.description);
            }
            tracing::debug!(
                robot = %name,
                bound = config.max_step_reward(),
                "validated robot config"
            );
        }
        Ok(Self { robots })
    }

    /// # Errors
    ///
    /// [`ConfigError::UnknownRobot`] if `name` is not in the table.
    pub fn get(&self, name: &str) -> Result<&RobotConfig, ConfigError> {
        self.robots
            .get(name)
            .ok_or_else(|| ConfigError::UnknownRobot(name.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RobotConfig)> {
        self.robots.iter().map(|(name, config)| (name.as_str(), config))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.robots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }
}
