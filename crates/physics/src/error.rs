use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("invalid articulation: {0}")]
    InvalidArticulation(String),
    #[error("joint index {index} out of range for {count} actuated joints")]
    JointIndex { index: usize, count: usize },
    #[error("expected {expected} joint values, got {actual}")]
    JointCount { expected: usize, actual: usize },
    #[error("simulation state diverged (non-finite values)")]
    Diverged,
}
