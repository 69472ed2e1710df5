#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Physics
//!
//! The physics layer consumed by the locomotion environment.
//!
//! ## Key Components
//!
//! -   **[`World`]:** the command/query interface a controller drives: joint
//!     targets, substeps, base and joint state, ground contacts, and debug
//!     primitives for visualisation front-ends.
//! -   **[`Articulation`]:** a tree of [`Link`]s joined by [`Joint`]s with
//!     primitive collision [`Shape`]s, plus forward kinematics.
//! -   **[`ArticulatedSim`]:** a small reference [`World`] with a floating
//!     base, position-servoed joints and penalty ground contact.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use physics::{ArticulatedSim, SimParams, World};
//!
//! let mut sim = ArticulatedSim::new(articulation, SimParams::default())?;
//! sim.set_joint_target(0, 0.3)?;
//! sim.run(10);
//! let pose = sim.base_pose()?;
//! ```

pub mod contact;
pub mod error;
pub mod integrator;
pub mod kinematics;
pub mod shapes;
pub mod simulation;
pub mod types;
pub mod world;

pub use error::PhysicsError;
pub use kinematics::Articulation;
pub use simulation::ArticulatedSim;
pub use types::{
    BaseVelocity, Collider, ContactParams, DebugItemId, DebugLine, Joint, JointKind, JointLimits,
    JointState, Link, Pose, ServoParams, Shape, SimParams,
};
pub use world::World;

pub use glam::{Quat, Vec3};
