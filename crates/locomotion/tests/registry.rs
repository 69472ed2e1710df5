use locomotion::{ConfigError, Env, LocomotionEnv, RobotRegistry, MAX_STEP_REWARD_BOUND};
use std::path::PathBuf;

fn robots_json() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../robots/robots.json")
}

#[test]
fn shipped_configs_load_and_respect_the_bound() -> anyhow::Result<()> {
    let registry = RobotRegistry::load(robots_json())?;
    assert_eq!(registry.len(), 3);
    for (name, config) in registry.iter() {
        assert!(config.max_step_reward() <= MAX_STEP_REWARD_BOUND, "{name}");
        assert!(config.description.is_absolute() || config.description.exists(), "{name}");
    }
    let quadruped = registry.get("simple_quadruped")?;
    assert!((quadruped.max_step_reward() - 21.52).abs() < 1e-4);
    assert_eq!(quadruped.save_prefix.as_deref(), Some("quadruped_ppo"));
    Ok(())
}

#[test]
fn every_shipped_robot_runs_an_episode_start() -> anyhow::Result<()> {
    let registry = RobotRegistry::load(robots_json())?;
    for (name, config) in registry.iter() {
        let mut env = LocomotionEnv::from_config(config.clone(), 0)?;
        let obs = env.reset(Some(0));
        assert_eq!(obs.len(), env.obs_size(), "{name}");
        assert_eq!(env.obs_size(), 18 + 2 * env.action_size(), "{name}");
        let step = env.step(&vec![0.0; env.action_size()])?;
        assert!(step.reward.is_finite(), "{name}");
        assert!(step.reward <= config.max_step_reward() + 1e-4, "{name}");
    }
    Ok(())
}

#[test]
fn unknown_robot_is_reported() {
    let registry = RobotRegistry::load(robots_json()).unwrap();
    assert!(matches!(registry.get("biped"), Err(ConfigError::UnknownRobot(name)) if name == "biped"));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = RobotRegistry::load("/nonexistent/robots.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
