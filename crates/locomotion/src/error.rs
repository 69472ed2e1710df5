use phenotype::{DescriptionError, GeometryError};
use physics::PhysicsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
    #[error("maximum step reward {bound} exceeds the allowed bound {limit}")]
    RewardBound { bound: f32, limit: f32 },
    #[error("unknown robot '{0}'")]
    UnknownRobot(String),
    #[error("robot '{name}': {source}")]
    Robot {
        name: String,
        #[source]
        source: Box<ConfigError>,
    },
}

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("step called before reset")]
    NotReset,
    #[error("episode is over; call reset")]
    EpisodeOver,
    #[error("expected {expected} action values, got {actual}")]
    ActionSize { expected: usize, actual: usize },
    #[error("observation has length {actual}, layout expects {expected}")]
    ObservationMismatch { expected: usize, actual: usize },
    #[error("description has {description} actuated joints but the world has {world}")]
    JointCountMismatch { description: usize, world: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Description(#[from] DescriptionError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}
