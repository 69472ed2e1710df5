//! Scripted rollouts for checking reward scale.

use anyhow::{Context, Result};
use clap::ValueEnum;
use locomotion::recorder::Severity;
use locomotion::{
    EpisodeRecorder, JsonLinesRecorder, LocomotionEnv, MemoryRecorder, RewardStats, RobotConfig,
    StepRecord,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Hold the home posture.
    Zero,
    /// Uniform random actions in `[-1, 1]`.
    Random,
}

impl Policy {
    fn act(self, rng: &mut fastrand::Rng, action: &mut [f32]) {
        match self {
            Policy::Zero => action.fill(0.0),
            Policy::Random => action.iter_mut().for_each(|a| *a = rng.f32() * 2.0 - 1.0),
        }
    }
}

pub struct RolloutArgs {
    pub steps: u32,
    pub episodes: u32,
    pub seed: u64,
    pub policy: Policy,
    pub record: Option<PathBuf>,
}

/// Runs `args.episodes` episodes of at most `args.steps` steps each.
pub fn run(config: RobotConfig, args: &RolloutArgs) -> Result<RewardStats> {
    let mut env = LocomotionEnv::from_config(config, args.seed)?;
    let mut rng = fastrand::Rng::with_seed(args.seed);
    let mut memory = MemoryRecorder::new();
    let mut file = match &args.record {
        Some(path) => {
            let f = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Some(JsonLinesRecorder::new(BufWriter::new(f)))
        }
        None => None,
    };

    let mut action = vec![0.0; env.home().len()];
    for episode in 0..args.episodes {
        env.reset(Some(args.seed.wrapping_add(u64::from(episode))));
        for _ in 0..args.steps {
            args.policy.act(&mut rng, &mut action);
            let step = env.step(&action)?;
            let record = StepRecord::new(episode, &step);
            memory.record(&record);
            if let Some(file) = file.as_mut() {
                file.record(&record);
            }
            if step.done() {
                break;
            }
        }
    }

    if let Some(file) = file {
        let errors = file.errors();
        file.into_inner();
        if errors > 0 {
            warn!(errors, "some step records were not written");
        }
    }

    let stats = memory.stats();
    for warning in stats.assess() {
        match warning.severity {
            Severity::Critical => error!("{}", warning.message),
            Severity::Warning => warn!("{}", warning.message),
        }
    }
    info!(
        steps = stats.steps,
        episodes = stats.episodes,
        falls = stats.falls,
        "rollout finished"
    );
    Ok(stats)
}

pub fn print_summary(robot: &str, stats: &RewardStats) {
    println!("{robot}: {} steps, {} episodes, {} falls", stats.steps, stats.episodes, stats.falls);
    if let Some(per_step) = stats.per_step {
        println!(
            "  step reward  mean {:>8.3}  min {:>8.3}  max {:>8.3}",
            per_step.mean, per_step.min, per_step.max
        );
    }
    for (term, summary) in &stats.per_term {
        println!(
            "  {:<22} mean {:>8.3}  min {:>8.3}  max {:>8.3}",
            term.name(),
            summary.mean,
            summary.min,
            summary.max
        );
    }
    if let Some(episode) = stats.estimated_episode_reward() {
        println!("  estimated episode reward {episode:.1}");
    }
}
