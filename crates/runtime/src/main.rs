#![deny(clippy::all, clippy::pedantic)]
//! # Ambulate
//!
//! Command-line front end for the locomotion environments: validates robot
//! configs, reports spawn clearances and runs scripted rollouts to check
//! reward scales before training.

mod rollout;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use locomotion::{RobotRegistry, MAX_STEP_REWARD_BOUND};
use phenotype::{compute_min_clearance, RobotDescription};
use rollout::{Policy, RolloutArgs};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ambulate")]
#[command(about = "Legged locomotion environments", long_about = None)]
#[command(version)]
struct Cli {
    /// Robot config table
    #[arg(long, global = true, default_value = "robots/robots.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every robot in the config table
    Check,

    /// Print how far a robot must be lifted to clear the ground
    Clearance {
        /// Robot name in the config table
        #[arg(long)]
        robot: Option<String>,

        /// Robot description file (JSON or URDF), bypassing the config table
        #[arg(long, conflicts_with = "robot")]
        description: Option<PathBuf>,
    },

    /// Run episodes with a scripted policy and report reward statistics
    Rollout {
        /// Robot name in the config table
        #[arg(long)]
        robot: String,

        /// Step cap per episode
        #[arg(long, default_value_t = 200)]
        steps: u32,

        #[arg(long, default_value_t = 1)]
        episodes: u32,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, value_enum, default_value_t = Policy::Zero)]
        policy: Policy,

        /// Write every step as a JSON line to this file
        #[arg(long)]
        record: Option<PathBuf>,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check => check(&cli.config),
        Commands::Clearance { robot, description } => {
            let path = match (robot, description) {
                (_, Some(path)) => path,
                (Some(robot), None) => RobotRegistry::load(&cli.config)?.get(&robot)?.description.clone(),
                (None, None) => anyhow::bail!("pass --robot or --description"),
            };
            clearance(&path)
        }
        Commands::Rollout { robot, steps, episodes, seed, policy, record, json } => {
            let registry = RobotRegistry::load(&cli.config)?;
            let config = registry.get(&robot)?.clone();
            let args = RolloutArgs { steps, episodes, seed, policy, record };
            let stats = rollout::run(config, &args)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                rollout::print_summary(&robot, &stats);
            }
            Ok(())
        }
    }
}

fn check(config: &Path) -> Result<()> {
    let registry = RobotRegistry::load(config)?;
    println!("{:<20} {:>6} {:>10} {:>10}", "robot", "joints", "bound", "clearance");
    for (name, robot) in registry.iter() {
        let description = robot
            .load_description()
            .with_context(|| format!("robot '{name}'"))?;
        let clearance =
            compute_min_clearance(&description).with_context(|| format!("robot '{name}'"))?;
        println!(
            "{name:<20} {:>6} {:>10.2} {clearance:>10.3}",
            description.actuated_joint_count(),
            robot.max_step_reward(),
        );
    }
    tracing::info!(robots = registry.len(), limit = MAX_STEP_REWARD_BOUND, "all robot configs are valid");
    Ok(())
}

fn clearance(path: &Path) -> Result<()> {
    let description = RobotDescription::load(path)?;
    let clearance = compute_min_clearance(&description)?;
    println!("{clearance:.4}");
    Ok(())
}
