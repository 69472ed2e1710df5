//! # Locomotion Environment
//!
//! [`LocomotionEnv`] drives a legged robot in any [`World`]. Every control
//! step it
//!
//! 1. refreshes the target if the sampler is live,
//! 2. scales the action into joint targets,
//! 3. runs `SUBSTEPS` physics substeps,
//! 4. reads one kinematic snapshot,
//! 5. checks for a fall or the step cap,
//! 6. computes the reward once.
//!
//! A physics query that fails mid-episode does not abort the step: the last
//! known value stands in, the failure is logged and reported in
//! [`StepInfo::degraded`].

use crate::action::{clamp_action, scale_action};
use crate::config::RobotConfig;
use crate::env::{Env, Query, QueryFault, Step, StepInfo};
use crate::episode::{EpisodeState, Phase};
use crate::error::EnvError;
use crate::observation::{KinematicSnapshot, Observation, ObservationLayout};
use crate::reward::compute_reward;
use crate::target::{RandomTargets, TargetSampler};
use crate::termination::{evaluate, Outcome};
use glam::{Quat, Vec3};
use phenotype::{compute_min_clearance, RobotDescription};
use physics::{ArticulatedSim, BaseVelocity, JointLimits, PhysicsError, Pose, SimParams, World};
use std::f32::consts::TAU;
use tracing::{debug, info, warn};

/// Horizontal speed of the reset push at `INITIAL_MOMENTUM = 1`, in m/s.
pub const MAX_INITIAL_SPEED: f32 = 0.5;
/// Yaw rate of the reset push at `INITIAL_MOMENTUM = 1`, in rad/s.
pub const MAX_INITIAL_YAW_RATE: f32 = 0.5;

pub struct LocomotionEnv<W, S = RandomTargets> {
    config: RobotConfig,
    world: W,
    sampler: S,
    rng: fastrand::Rng,

    layout: ObservationLayout,
    home: Vec<f32>,
    limits: Vec<JointLimits>,
    min_clearance: f32,

    phase: Phase,
    episode: Option<EpisodeState>,
    snapshot: KinematicSnapshot,
    contacts: usize,
}

impl LocomotionEnv<ArticulatedSim> {
    /// Loads the configured description into the reference simulator with
    /// random per-episode targets.
    ///
    /// # Errors
    ///
    /// Invalid config, unreadable or malformed description.
    pub fn from_config(config: RobotConfig, seed: u64) -> Result<Self, EnvError> {
        config.validate()?;
        let description = config.load_description()?;
        let params = SimParams {
            gravity: config.gravity,
            dt: config.timestep,
            ..SimParams::default()
        };
        let world = description.clone().into_sim(params)?;
        Self::new(config, &description, world, RandomTargets, seed)
    }
}

impl<W: World, S: TargetSampler> LocomotionEnv<W, S> {
    /// Builds an environment in the [`Phase::Ready`] state.
    ///
    /// # Errors
    ///
    /// Invalid config, bad collision geometry, or a world whose joint count
    /// differs from the description's.
    pub fn new(
        config: RobotConfig,
        description: &RobotDescription,
        mut world: W,
        sampler: S,
        seed: u64,
    ) -> Result<Self, EnvError> {
        config.validate()?;
        let min_clearance = compute_min_clearance(description)?;
        let articulation = description.to_articulation()?;
        if articulation.dof() != world.joint_count() {
            return Err(EnvError::JointCountMismatch {
                description: articulation.dof(),
                world: world.joint_count(),
            });
        }
        world.set_gravity(config.gravity);

        let home = articulation.home_positions();
        let spawn = Vec3::new(0.0, 0.0, min_clearance) + config.start_offset;
        debug!(
            robot = %description.name,
            joints = home.len(),
            min_clearance,
            "created locomotion environment"
        );
        Ok(Self {
            layout: ObservationLayout::new(home.len()),
            limits: articulation.limits(),
            snapshot: KinematicSnapshot::at_rest(spawn, home.clone()),
            home,
            min_clearance,
            config,
            world,
            sampler,
            rng: fastrand::Rng::with_seed(seed),
            phase: Phase::Ready,
            episode: None,
            contacts: 0,
        })
    }

    #[must_use]
    pub fn observation_layout(&self) -> ObservationLayout {
        self.layout
    }

    /// Spawn height above the ground before `START_OFFSET`.
    #[must_use]
    pub fn min_clearance(&self) -> f32 {
        self.min_clearance
    }

    #[must_use]
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The current episode, `None` before the first reset.
    #[must_use]
    pub fn episode(&self) -> Option<&EpisodeState> {
        self.episode.as_ref()
    }

    /// Most recent kinematic snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &KinematicSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    #[must_use]
    pub fn home(&self) -> &[f32] {
        &self.home
    }

    #[must_use]
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Starts a new episode: teleports the robot to its spawn pose with
    /// joints at home, gives it a random push scaled by `INITIAL_MOMENTUM`
    /// and draws a new target.
    pub fn reset(&mut self, seed: Option<u64>) -> Observation {
        if let Some(seed) = seed {
            self.rng.seed(seed);
        }
        let spawn = Vec3::new(0.0, 0.0, self.min_clearance) + self.config.start_offset;
        self.world.reset_base(Pose::from_translation(spawn));
        if let Err(e) = self.world.reset_joints(&self.home) {
            warn!("failed to reset joints: {e}");
        }

        let push = self.initial_velocity();
        if self.config.initial_momentum > 0.0 {
            self.world.set_base_velocity(push);
        }

        let target = self.sampler.sample(&self.config, &mut self.rng);

        let mut rest = KinematicSnapshot::at_rest(spawn, self.home.clone());
        rest.linear_velocity = push.linear;
        rest.angular_velocity = push.angular;
        let mut faults = Vec::new();
        let snapshot = read_snapshot(&self.world, &rest, &mut faults);
        self.contacts = 0;

        let observation = self.layout.build(&snapshot, &target);
        self.episode = Some(EpisodeState::new(
            target,
            spawn.z,
            self.home.clone(),
            snapshot.clone(),
        ));
        self.snapshot = snapshot;
        self.phase = Phase::Running;
        debug!(
            spawn_height = spawn.z,
            target_speed = target.velocity.length(),
            degraded = faults.len(),
            "episode reset"
        );
        observation
    }

    fn initial_velocity(&mut self) -> BaseVelocity {
        let scale = self.config.initial_momentum;
        if scale <= 0.0 {
            return BaseVelocity::default();
        }
        let direction = self.rng.f32() * TAU;
        let speed = self.rng.f32() * MAX_INITIAL_SPEED * scale;
        let yaw_rate = (self.rng.f32() * 2.0 - 1.0) * MAX_INITIAL_YAW_RATE * scale;
        BaseVelocity {
            linear: Quat::from_rotation_z(direction) * Vec3::new(speed, 0.0, 0.0),
            angular: Vec3::new(0.0, 0.0, yaw_rate),
        }
    }

    /// Applies one action and advances the episode by one control step.
    ///
    /// # Errors
    ///
    /// [`EnvError::NotReset`] before the first reset, [`EnvError::EpisodeOver`]
    /// once the episode has ended and [`EnvError::ActionSize`] if `action`
    /// does not have one value per actuated joint.
    pub fn step(&mut self, action: &[f32]) -> Result<Step, EnvError> {
        match self.phase {
            Phase::Ready => return Err(EnvError::NotReset),
            Phase::Terminated | Phase::Truncated => return Err(EnvError::EpisodeOver),
            Phase::Running => {}
        }
        if action.len() != self.home.len() {
            return Err(EnvError::ActionSize { expected: self.home.len(), actual: action.len() });
        }
        let Some(episode) = self.episode.as_mut() else {
            return Err(EnvError::NotReset);
        };

        if self.sampler.live() {
            episode.target = self.sampler.sample(&self.config, &mut self.rng);
        }

        let mut faults = Vec::new();
        let targets = scale_action(action, &self.config, &self.home, &self.limits);
        for (joint, &target) in targets.iter().enumerate() {
            if let Err(e) = self.world.set_joint_target(joint, target) {
                record_fault(&mut faults, Query::JointTarget, &e);
            }
        }
        for _ in 0..self.config.substeps {
            self.world.step_substep();
        }

        let snapshot = read_snapshot(&self.world, &self.snapshot, &mut faults);
        match self.world.ground_contacts() {
            Ok(links) => self.contacts = links.len(),
            Err(e) => record_fault(&mut faults, Query::GroundContacts, &e),
        }

        episode.steps += 1;
        let outcome = evaluate(&snapshot, episode.fallen, episode.steps, &self.config);
        let fell = outcome == Outcome::Terminated;
        let (reward, breakdown) =
            compute_reward(&episode.prev, &snapshot, episode, &self.config, action, fell);

        episode.episode_reward += reward;
        episode.fallen = fell;
        episode.last_action = action.iter().copied().map(clamp_action).collect();
        episode.prev = snapshot.clone();
        let observation = self.layout.build(&snapshot, &episode.target);
        let info = StepInfo {
            breakdown,
            steps: episode.steps,
            episode_reward: episode.episode_reward,
            contacts: self.contacts,
            degraded: faults,
        };
        self.snapshot = snapshot;

        self.phase = match outcome {
            Outcome::Running => Phase::Running,
            Outcome::Terminated => Phase::Terminated,
            Outcome::Truncated => Phase::Truncated,
        };
        if outcome != Outcome::Running {
            info!(
                steps = info.steps,
                episode_reward = info.episode_reward,
                ?outcome,
                "episode finished"
            );
        }

        Ok(Step {
            observation,
            reward,
            terminated: outcome == Outcome::Terminated,
            truncated: outcome == Outcome::Truncated,
            info,
        })
    }
}

fn record_fault(faults: &mut Vec<QueryFault>, query: Query, error: &PhysicsError) {
    warn!(?query, "physics query failed, using last known value: {error}");
    faults.push(QueryFault { query, message: error.to_string() });
}

/// Reads a snapshot from the world, filling any failed query from `last`.
fn read_snapshot<W: World>(
    world: &W,
    last: &KinematicSnapshot,
    faults: &mut Vec<QueryFault>,
) -> KinematicSnapshot {
    let mut snapshot = last.clone();
    match world.base_pose() {
        Ok(pose) => {
            snapshot.position = pose.translation;
            snapshot.orientation = pose.rotation;
        }
        Err(e) => record_fault(faults, Query::BasePose, &e),
    }
    match world.base_velocity() {
        Ok(velocity) => {
            snapshot.linear_velocity = velocity.linear;
            snapshot.angular_velocity = velocity.angular;
        }
        Err(e) => record_fault(faults, Query::BaseVelocity, &e),
    }
    match world.joint_states() {
        Ok(states) if states.len() == last.joint_positions.len() => {
            snapshot.joint_positions = states.iter().map(|s| s.position).collect();
            snapshot.joint_velocities = states.iter().map(|s| s.velocity).collect();
        }
        Ok(states) => record_fault(
            faults,
            Query::JointStates,
            &PhysicsError::JointCount { expected: last.joint_positions.len(), actual: states.len() },
        ),
        Err(e) => record_fault(faults, Query::JointStates, &e),
    }
    snapshot
}

impl<W: World, S: TargetSampler> Env for LocomotionEnv<W, S> {
    fn reset(&mut self, seed: Option<u64>) -> Observation {
        LocomotionEnv::reset(self, seed)
    }

    fn step(&mut self, action: &[f32]) -> Result<Step, EnvError> {
        LocomotionEnv::step(self, action)
    }

    fn obs_size(&self) -> usize {
        self.layout.len()
    }

    fn action_size(&self) -> usize {
        self.home.len()
    }
}
