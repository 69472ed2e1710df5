use locomotion::{
    EnvError, ExternalTargets, LocomotionEnv, ObservationLayout, Phase, Query, RandomTargets,
    RewardTerm, RobotConfig, SliderPanel, TargetControls, TargetSampler,
};
use phenotype::RobotDescription;
use physics::{
    ArticulatedSim, BaseVelocity, DebugItemId, DebugLine, JointState, PhysicsError, Pose,
    SimParams, Vec3, World,
};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

fn robots(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../robots").join(name)
}

/// Velocity tracking, orientation, upright and survival, plus the fall penalty.
fn quadruped_config() -> RobotConfig {
    RobotConfig {
        description: robots("simple_quadruped.json"),
        forward_vel_weight: 10.0,
        orientation_reward_weight: 1.0,
        upright_reward_weight: 0.5,
        survival_weight: 0.02,
        fallen_penalty: 20.0,
        action_limit: 0.2,
        ..RobotConfig::default()
    }
}

fn sim_for(config: &RobotConfig, description: &RobotDescription) -> ArticulatedSim {
    let params = SimParams { gravity: config.gravity, dt: config.timestep, ..SimParams::default() };
    description.clone().into_sim(params).unwrap()
}

fn env_with<S: TargetSampler>(
    config: RobotConfig,
    sampler: S,
    seed: u64,
) -> LocomotionEnv<ArticulatedSim, S> {
    let description = config.load_description().unwrap();
    let world = sim_for(&config, &description);
    LocomotionEnv::new(config, &description, world, sampler, seed).unwrap()
}

/// Sliders at zero: stand still, face +x.
fn standing_env(config: RobotConfig) -> LocomotionEnv<ArticulatedSim, ExternalTargets<SliderPanel>> {
    env_with(config, ExternalTargets::new(SliderPanel::new(TargetControls::default())), 0)
}

#[test]
fn step_before_reset_is_rejected() {
    let mut env = standing_env(quadruped_config());
    assert_eq!(env.phase(), Phase::Ready);
    assert!(matches!(env.step(&[0.0; 8]), Err(EnvError::NotReset)));
}

#[test]
fn wrong_action_length_is_rejected() {
    let mut env = standing_env(quadruped_config());
    env.reset(Some(0));
    let err = env.step(&[0.0; 3]).unwrap_err();
    assert!(matches!(err, EnvError::ActionSize { expected: 8, actual: 3 }));
    // A rejected action does not advance the episode.
    assert_eq!(env.episode().unwrap().steps, 0);
}

#[test]
fn reset_starts_a_clean_episode() {
    let mut env = standing_env(quadruped_config());
    let obs = env.reset(Some(1));
    let layout = env.observation_layout();
    assert_eq!(obs.len(), layout.len());
    assert_eq!(layout.len(), 18 + 2 * 8);
    assert!(layout.check(obs.len()).is_ok());
    assert!((obs[ObservationLayout::HEIGHT] - env.min_clearance()).abs() < 1e-4);

    let episode = env.episode().unwrap();
    assert_eq!(episode.steps, 0);
    assert!(!episode.fallen);
    assert_eq!(episode.episode_reward, 0.0);
    assert_eq!(env.phase(), Phase::Running);
}

#[test]
fn reset_twice_in_a_row_is_fine() {
    let mut env = standing_env(quadruped_config());
    env.reset(None);
    for _ in 0..3 {
        env.step(&[0.0; 8]).unwrap();
    }
    let first = env.reset(Some(9));
    let second = env.reset(Some(9));
    assert_eq!(first, second);
    assert_eq!(env.episode().unwrap().steps, 0);
    assert_eq!(env.episode().unwrap().episode_reward, 0.0);
}

#[test]
fn standing_still_earns_bounded_reward() {
    let config = quadruped_config();
    let bound = config.max_step_reward();
    let mut env = standing_env(config);
    env.reset(Some(2));

    let mut total = 0.0;
    for i in 1..=10 {
        let step = env.step(&[0.0; 8]).unwrap();
        assert!(!step.done());
        assert_eq!(step.info.steps, i);
        assert!(step.reward >= 0.0 && step.reward <= bound, "reward {}", step.reward);
        // Zero target: the tracking kernel pays but progress does not.
        let velocity = step.info.breakdown.get(RewardTerm::ForwardVelocity).unwrap();
        assert!(velocity <= 10.0 + 1e-4);
        assert_eq!(step.info.breakdown.get(RewardTerm::Survival), Some(0.02));
        assert_eq!(step.info.breakdown.get(RewardTerm::Fallen), None);
        assert!((step.info.breakdown.total() - step.reward).abs() < 1e-5);
        assert!(step.info.degraded.is_empty());
        total += step.reward;
    }
    assert!((env.episode().unwrap().episode_reward - total).abs() < 1e-3);
    assert!(env.snapshot().height() > 0.2);
}

/// Velocity tracking, upright, survival and the fall penalty only.
fn four_term_config() -> RobotConfig {
    RobotConfig {
        description: robots("simple_quadruped.json"),
        forward_vel_weight: 10.0,
        upright_reward_weight: 0.5,
        survival_weight: 0.02,
        fallen_penalty: 20.0,
        ..RobotConfig::default()
    }
}

#[test]
fn four_term_rollout_stays_in_range() {
    let mut env = standing_env(four_term_config());
    env.reset(Some(5));
    for _ in 0..10 {
        let step = env.step(&[0.0; 8]).unwrap();
        assert!(!step.terminated);
        assert!((0.0..=11.0).contains(&step.reward), "reward {}", step.reward);
        assert_eq!(step.info.breakdown.len(), 3);
    }

    let config = RobotConfig { fall_height: 0.5, ..four_term_config() };
    let mut env = standing_env(config);
    env.reset(Some(5));
    let step = env.step(&[0.0; 8]).unwrap();
    assert!(step.terminated);
    assert_eq!(step.info.breakdown.get(RewardTerm::Fallen), Some(-20.0));
    let others = step.reward + 20.0;
    assert!((0.0..=10.5 + 1e-4).contains(&others), "other terms {others}");
}

#[test]
fn falling_terminates_with_penalty() {
    // Any spawn height is already below the fall line.
    let config = RobotConfig { fall_height: 0.5, ..quadruped_config() };
    let mut env = standing_env(config);
    env.reset(Some(3));

    let step = env.step(&[0.0; 8]).unwrap();
    assert!(step.terminated);
    assert!(!step.truncated);
    assert_eq!(step.info.breakdown.get(RewardTerm::Fallen), Some(-20.0));
    assert_eq!(step.info.breakdown.get(RewardTerm::Survival), None);
    assert!(step.reward < 0.0);
    assert!(env.episode().unwrap().fallen);
    assert_eq!(env.phase(), Phase::Terminated);

    assert!(matches!(env.step(&[0.0; 8]), Err(EnvError::EpisodeOver)));
    env.reset(None);
    assert_eq!(env.phase(), Phase::Running);
}

#[test]
fn step_cap_truncates() {
    let config = RobotConfig { max_episode_steps: 3, ..quadruped_config() };
    let mut env = standing_env(config);
    env.reset(Some(4));
    assert!(!env.step(&[0.0; 8]).unwrap().done());
    assert!(!env.step(&[0.0; 8]).unwrap().done());
    let last = env.step(&[0.0; 8]).unwrap();
    assert!(last.truncated);
    assert!(!last.terminated);
    assert_eq!(env.phase(), Phase::Truncated);
}

#[test]
fn mismatched_world_is_rejected() {
    let config = quadruped_config();
    let description = config.load_description().unwrap();
    let other = RobotDescription::load(robots("arachne.json")).unwrap();
    let world = sim_for(&config, &other);
    let err = LocomotionEnv::new(config, &description, world, RandomTargets, 0).err().unwrap();
    assert!(matches!(err, EnvError::JointCountMismatch { description: 8, world: 12 }));
}

#[test]
fn oversized_rewards_are_rejected_at_construction() {
    let config = RobotConfig { forward_vel_weight: 20.0, ..quadruped_config() };
    let err = LocomotionEnv::from_config(config, 0).err().unwrap();
    assert!(matches!(err, EnvError::Config(_)));
}

#[test]
fn same_seed_same_rollout() {
    let config = RobotConfig { initial_momentum: 1.0, ..quadruped_config() };
    let rollout = |seed| {
        let mut env = LocomotionEnv::from_config(config.clone(), 0).unwrap();
        let mut observations = vec![env.reset(Some(seed))];
        for _ in 0..5 {
            observations.push(env.step(&[0.3; 8]).unwrap().observation);
        }
        observations
    };
    assert_eq!(rollout(11), rollout(11));
    assert_ne!(rollout(11)[0], rollout(12)[0]);
}

#[test]
fn sliders_steer_the_live_target() {
    let panel = SliderPanel::new(TargetControls::default());
    let mut env = env_with(quadruped_config(), ExternalTargets::new(panel.clone()), 0);
    let obs = env.reset(Some(0));
    assert_eq!(obs[ObservationLayout::TARGET_VELOCITY], 0.0);

    panel.set(TargetControls { direction: 0.0, magnitude: 1.0, heading: 0.0 });
    let step = env.step(&[0.0; 8]).unwrap();
    let speed = env.config().target_speed;
    assert!((step.observation[ObservationLayout::TARGET_VELOCITY] - speed).abs() < 1e-6);

    // A closed panel keeps the last target.
    panel.disconnect();
    let step = env.step(&[0.0; 8]).unwrap();
    assert!((step.observation[ObservationLayout::TARGET_VELOCITY] - speed).abs() < 1e-6);
}

/// Delegates to a real world but can be told to fail base pose queries.
struct Flaky<W> {
    inner: W,
    fail_pose: Rc<Cell<bool>>,
}

impl<W: World> World for Flaky<W> {
    fn joint_count(&self) -> usize {
        self.inner.joint_count()
    }

    fn total_mass(&self) -> f32 {
        self.inner.total_mass()
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.inner.set_gravity(gravity);
    }

    fn set_joint_target(&mut self, joint: usize, position: f32) -> Result<(), PhysicsError> {
        self.inner.set_joint_target(joint, position)
    }

    fn step_substep(&mut self) {
        self.inner.step_substep();
    }

    fn base_pose(&self) -> Result<Pose, PhysicsError> {
        if self.fail_pose.get() {
            Err(PhysicsError::Diverged)
        } else {
            self.inner.base_pose()
        }
    }

    fn base_velocity(&self) -> Result<BaseVelocity, PhysicsError> {
        self.inner.base_velocity()
    }

    fn joint_states(&self) -> Result<Vec<JointState>, PhysicsError> {
        self.inner.joint_states()
    }

    fn ground_contacts(&self) -> Result<Vec<usize>, PhysicsError> {
        self.inner.ground_contacts()
    }

    fn reset_base(&mut self, pose: Pose) {
        self.inner.reset_base(pose);
    }

    fn reset_joints(&mut self, positions: &[f32]) -> Result<(), PhysicsError> {
        self.inner.reset_joints(positions)
    }

    fn set_base_velocity(&mut self, velocity: BaseVelocity) {
        self.inner.set_base_velocity(velocity);
    }

    fn apply_base_impulse(&mut self, linear: Vec3, angular: Vec3) {
        self.inner.apply_base_impulse(linear, angular);
    }

    fn add_debug_line(&mut self, line: DebugLine) -> DebugItemId {
        self.inner.add_debug_line(line)
    }

    fn remove_debug_item(&mut self, id: DebugItemId) {
        self.inner.remove_debug_item(id);
    }

    fn clear_debug_items(&mut self) {
        self.inner.clear_debug_items();
    }
}

#[test]
fn failed_query_degrades_instead_of_aborting() {
    let config = quadruped_config();
    let description = config.load_description().unwrap();
    let fail_pose = Rc::new(Cell::new(false));
    let world = Flaky { inner: sim_for(&config, &description), fail_pose: fail_pose.clone() };
    let sampler = ExternalTargets::new(SliderPanel::new(TargetControls::default()));
    let mut env = LocomotionEnv::new(config, &description, world, sampler, 0).unwrap();
    env.reset(Some(0));
    let before = env.step(&[0.0; 8]).unwrap();
    assert!(before.info.degraded.is_empty());

    fail_pose.set(true);
    let step = env.step(&[0.0; 8]).unwrap();
    assert_eq!(step.info.degraded.len(), 1);
    assert_eq!(step.info.degraded[0].query, Query::BasePose);
    // Height is carried over from the last good reading.
    assert_eq!(
        step.observation[ObservationLayout::HEIGHT],
        before.observation[ObservationLayout::HEIGHT]
    );
    assert!(!step.done());

    fail_pose.set(false);
    assert!(env.step(&[0.0; 8]).unwrap().info.degraded.is_empty());
}
