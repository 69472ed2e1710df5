//! # Target Sampling
//!
//! Each episode tracks a goal: a horizontal velocity and a heading about the
//! vertical axis. [`RandomTargets`] draws a fresh goal per episode;
//! [`ExternalTargets`] follows an interactive control source (for example a
//! slider panel in a viewer) and is re-read every step.

use crate::config::RobotConfig;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Goal base velocity; always horizontal.
    pub velocity: Vec3,
    /// Goal heading, a rotation about +z.
    pub heading: Quat,
}

impl Target {
    pub const ZERO: Self = Self { velocity: Vec3::ZERO, heading: Quat::IDENTITY };

    /// Builds a target from a speed, a direction of travel and a heading,
    /// both angles in radians about +z.
    #[must_use]
    pub fn new(speed: f32, direction: f32, heading: f32) -> Self {
        let (sin, cos) = direction.sin_cos();
        Self {
            velocity: Vec3::new(speed * cos, speed * sin, 0.0),
            heading: Quat::from_rotation_z(heading),
        }
    }

    /// Unit vector in the ground plane the robot should face.
    #[must_use]
    pub fn heading_direction(&self) -> Vec3 {
        let dir = self.heading * Vec3::X;
        Vec3::new(dir.x, dir.y, 0.0).try_normalize().unwrap_or(Vec3::X)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Draws a target uniformly: speed in `[0, TARGET_SPEED]`, direction and
/// heading in `[0, 2π)`.
pub fn sample_target(config: &RobotConfig, rng: &mut fastrand::Rng) -> Target {
    let speed = rng.f32() * config.target_speed;
    let direction = rng.f32() * TAU;
    let heading = rng.f32() * TAU;
    Target::new(speed, direction, heading)
}

pub trait TargetSampler {
    fn sample(&mut self, config: &RobotConfig, rng: &mut fastrand::Rng) -> Target;

    /// Whether the target should be refreshed every step rather than once
    /// per episode.
    fn live(&self) -> bool {
        false
    }
}

/// One random target per episode.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTargets;

impl TargetSampler for RandomTargets {
    fn sample(&mut self, config: &RobotConfig, rng: &mut fastrand::Rng) -> Target {
        sample_target(config, rng)
    }
}

/// Normalised slider positions, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetControls {
    /// Direction of travel as a fraction of a full turn.
    pub direction: f32,
    /// Speed as a fraction of `TARGET_SPEED`.
    pub magnitude: f32,
    /// Heading as a fraction of a full turn.
    pub heading: f32,
}

impl TargetControls {
    #[must_use]
    pub fn to_target(self, config: &RobotConfig) -> Target {
        let unit = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Target::new(
            unit(self.magnitude) * config.target_speed,
            unit(self.direction) * TAU,
            unit(self.heading) * TAU,
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to read target controls: {0}")]
pub struct ControlReadError(pub String);

/// Somewhere target controls can be read from.
pub trait ControlSource {
    /// # Errors
    ///
    /// Implementation-defined; the caller falls back to its previous target.
    fn read(&mut self) -> Result<TargetControls, ControlReadError>;
}

impl<F> ControlSource for F
where
    F: FnMut() -> Result<TargetControls, ControlReadError>,
{
    fn read(&mut self) -> Result<TargetControls, ControlReadError> {
        self()
    }
}

/// Shared slider state. Clones see the same values, so a viewer can hold one
/// handle and move the sliders while the environment reads through another.
#[derive(Debug, Clone, Default)]
pub struct SliderPanel {
    state: Rc<Cell<Option<TargetControls>>>,
}

impl SliderPanel {
    #[must_use]
    pub fn new(initial: TargetControls) -> Self {
        Self { state: Rc::new(Cell::new(Some(initial))) }
    }

    pub fn set(&self, controls: TargetControls) {
        self.state.set(Some(controls));
    }

    /// Marks the panel unreadable, as when the viewer window is closed.
    pub fn disconnect(&self) {
        self.state.set(None);
    }
}

impl ControlSource for SliderPanel {
    fn read(&mut self) -> Result<TargetControls, ControlReadError> {
        self.state
            .get()
            .ok_or_else(|| ControlReadError("slider panel is not connected".into()))
    }
}

/// Targets taken from a [`ControlSource`]. A failed read keeps the last good
/// target, which starts out as [`Target::ZERO`].
#[derive(Debug, Clone)]
pub struct ExternalTargets<S> {
    source: S,
    held: Target,
}

impl<S: ControlSource> ExternalTargets<S> {
    pub fn new(source: S) -> Self {
        Self { source, held: Target::ZERO }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: ControlSource> TargetSampler for ExternalTargets<S> {
    fn sample(&mut self, config: &RobotConfig, _rng: &mut fastrand::Rng) -> Target {
        match self.source.read() {
            Ok(controls) => self.held = controls.to_target(config),
            Err(e) => tracing::warn!("{e}; keeping previous target"),
        }
        self.held
    }

    fn live(&self) -> bool {
        true
    }
}

impl<T: TargetSampler + ?Sized> TargetSampler for Box<T> {
    fn sample(&mut self, config: &RobotConfig, rng: &mut fastrand::Rng) -> Target {
        (**self).sample(config, rng)
    }

    fn live(&self) -> bool {
        (**self).live()
    }
}
