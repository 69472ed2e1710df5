//! # Physics Types
//!
//! Plain data describing an articulated body: poses, collision shapes, links,
//! joints and the per-step state reported through [`World`](crate::World).

use glam::{Quat, Vec3};
use std::ops::Mul;

/// Rigid transform (rotation followed by translation).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation }
    }

    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self { translation, rotation: Quat::IDENTITY }
    }

    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    #[must_use]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            translation: self.transform_point(rhs.translation),
            rotation: (self.rotation * rhs.rotation).normalize(),
        }
    }
}

/// Primitive collision geometry, expressed in its collider frame.
///
/// Cylinders are aligned with the local z axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Cylinder { radius: f32, length: f32 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collider {
    /// Collider frame relative to the owning link frame.
    pub origin: Pose,
    pub shape: Shape,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub name: String,
    pub mass: f32,
    pub colliders: Vec<Collider>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JointKind {
    Revolute,
    Continuous,
    Prismatic,
    Fixed,
}

impl JointKind {
    #[must_use]
    pub const fn is_actuated(self) -> bool {
        !matches!(self, JointKind::Fixed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointLimits {
    pub lower: f32,
    pub upper: f32,
    /// Maximum servo speed; non-positive means the simulator default.
    pub velocity: f32,
}

impl JointLimits {
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.lower, self.upper)
    }

    #[must_use]
    pub fn span(&self) -> f32 {
        self.upper - self.lower
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    pub name: String,
    pub kind: JointKind,
    pub parent: usize,
    pub child: usize,
    /// Child frame relative to the parent link frame at zero joint position.
    pub origin: Pose,
    pub axis: Vec3,
    pub limits: JointLimits,
    /// Rest (home) position of the joint.
    pub home: f32,
}

/// Position and velocity of one actuated joint.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct JointState {
    pub position: f32,
    pub velocity: f32,
}

/// World-frame velocity of the base link origin.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BaseVelocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactParams {
    /// Normal stiffness per unit body mass, shared across touching points.
    pub stiffness: f32,
    /// Normal damping per unit body mass, shared across touching points.
    pub damping: f32,
    /// Tangential damping per unit body mass, shared across touching points.
    pub tangential_damping: f32,
    pub friction: f32,
}

impl Default for ContactParams {
    fn default() -> Self {
        Self {
            stiffness: 3000.0,
            damping: 60.0,
            tangential_damping: 40.0,
            friction: 0.8,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ServoParams {
    /// Proportional gain mapping position error to commanded speed (1/s).
    pub gain: f32,
    /// Speed cap used when a joint declares no velocity limit.
    pub default_max_velocity: f32,
}

impl Default for ServoParams {
    fn default() -> Self {
        Self {
            gain: 20.0,
            default_max_velocity: 5.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimParams {
    pub gravity: Vec3,
    pub dt: f32,
    pub contact: ContactParams,
    pub servo: ServoParams,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.81),
            dt: 1.0 / 240.0,
            contact: ContactParams::default(),
            servo: ServoParams::default(),
        }
    }
}

/// Line segment drawn by visualisation front-ends. Ignored by the dynamics.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DebugLine {
    pub from: Vec3,
    pub to: Vec3,
    pub color: [f32; 3],
    pub width: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DebugItemId(pub u64);
