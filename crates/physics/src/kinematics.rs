//! # Articulation Kinematics
//!
//! A tree of links connected by joints, rooted at the floating base link.
//! Joint positions are indexed by *actuated* joint (every non-fixed joint, in
//! declaration order), which is also the order used for actions and
//! observations.

use crate::error::PhysicsError;
use crate::types::{Collider, Joint, JointKind, JointLimits, Link, Pose, Shape};
use glam::{Quat, Vec3};
use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct Articulation {
    links: Vec<Link>,
    joints: Vec<Joint>,
    root: usize,
    /// Joint indices ordered parent-before-child.
    order: Vec<usize>,
    /// Actuated index of each joint, `None` for fixed joints.
    dof_index: Vec<Option<usize>>,
    /// Joint index of each actuated degree of freedom.
    actuated: Vec<usize>,
}

impl Articulation {
    /// Builds an articulation and checks that the joints form a single tree.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidArticulation`] if a joint references a
    /// missing link, a link has two parents, the tree has no unique root or
    /// some link is unreachable from the root.
    pub fn new(links: Vec<Link>, joints: Vec<Joint>) -> Result<Self, PhysicsError> {
        if links.is_empty() {
            return Err(PhysicsError::InvalidArticulation("no links".into()));
        }
        let mut parent_of: Vec<Option<usize>> = vec![None; links.len()];
        for (j, joint) in joints.iter().enumerate() {
            if joint.parent >= links.len() || joint.child >= links.len() {
                return Err(PhysicsError::InvalidArticulation(format!(
                    "joint '{}' references a missing link",
                    joint.name
                )));
            }
            if joint.parent == joint.child {
                return Err(PhysicsError::InvalidArticulation(format!(
                    "joint '{}' connects link to itself",
                    joint.name
                )));
            }
            if parent_of[joint.child].replace(j).is_some() {
                return Err(PhysicsError::InvalidArticulation(format!(
                    "link '{}' has more than one parent joint",
                    links[joint.child].name
                )));
            }
            let axis_ok = joint.axis.is_finite() && joint.axis.length_squared() > 1e-12;
            if joint.kind.is_actuated() && !axis_ok {
                return Err(PhysicsError::InvalidArticulation(format!(
                    "joint '{}' has a degenerate axis",
                    joint.name
                )));
            }
        }

        let roots: Vec<usize> = (0..links.len()).filter(|&l| parent_of[l].is_none()).collect();
        let &[root] = roots.as_slice() else {
            return Err(PhysicsError::InvalidArticulation(format!(
                "expected exactly one root link, found {}",
                roots.len()
            )));
        };

        let mut order = Vec::with_capacity(joints.len());
        let mut queue = VecDeque::from([root]);
        while let Some(link) = queue.pop_front() {
            for (j, joint) in joints.iter().enumerate() {
                if joint.parent == link {
                    order.push(j);
                    queue.push_back(joint.child);
                }
            }
        }
        if order.len() != joints.len() {
            return Err(PhysicsError::InvalidArticulation(
                "joint graph contains a cycle or disconnected links".into(),
            ));
        }

        let mut dof_index = vec![None; joints.len()];
        let mut actuated = Vec::new();
        for (j, joint) in joints.iter().enumerate() {
            if joint.kind.is_actuated() {
                dof_index[j] = Some(actuated.len());
                actuated.push(j);
            }
        }

        let joints = joints
            .into_iter()
            .map(|mut joint| {
                joint.axis = joint.axis.normalize_or_zero();
                joint
            })
            .collect();

        Ok(Self { links, joints, root, order, dof_index, actuated })
    }

    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[must_use]
    pub const fn root(&self) -> usize {
        self.root
    }

    /// Number of actuated joints.
    #[must_use]
    pub fn dof(&self) -> usize {
        self.actuated.len()
    }

    /// Actuated joints in degree-of-freedom order.
    pub fn actuated_joints(&self) -> impl Iterator<Item = &Joint> {
        self.actuated.iter().map(|&j| &self.joints[j])
    }

    #[must_use]
    pub fn home_positions(&self) -> Vec<f32> {
        self.actuated_joints().map(|j| j.home).collect()
    }

    /// Native range of each actuated joint. Continuous joints report `[-π, π]`.
    #[must_use]
    pub fn limits(&self) -> Vec<JointLimits> {
        self.actuated_joints()
            .map(|j| match j.kind {
                JointKind::Continuous => JointLimits {
                    lower: -std::f32::consts::PI,
                    upper: std::f32::consts::PI,
                    velocity: j.limits.velocity,
                },
                _ => j.limits,
            })
            .collect()
    }

    #[must_use]
    pub fn total_mass(&self) -> f32 {
        self.links.iter().map(|l| l.mass).sum()
    }

    /// Pose of every link relative to the root link frame.
    ///
    /// # Panics
    ///
    /// Panics if `positions` is shorter than [`Articulation::dof`].
    #[must_use]
    pub fn link_poses(&self, positions: &[f32]) -> Vec<Pose> {
        let mut poses = vec![Pose::IDENTITY; self.links.len()];
        for &j in &self.order {
            let joint = &self.joints[j];
            let q = self.dof_index[j].map_or(0.0, |d| positions[d]);
            let motion = match joint.kind {
                JointKind::Revolute | JointKind::Continuous => {
                    Pose::new(Vec3::ZERO, Quat::from_axis_angle(joint.axis, q))
                }
                JointKind::Prismatic => Pose::from_translation(joint.axis * q),
                JointKind::Fixed => Pose::IDENTITY,
            };
            poses[joint.child] = poses[joint.parent] * joint.origin * motion;
        }
        poses
    }

    /// World-space pose of every collider given the base pose and joint positions.
    #[must_use]
    pub fn collider_poses(&self, base: &Pose, positions: &[f32]) -> Vec<(usize, Pose, Shape)> {
        let links = self.link_poses(positions);
        self.colliders()
            .map(|(link, collider)| (link, *base * links[link] * collider.origin, collider.shape))
            .collect()
    }

    /// Every collider tagged with its link index.
    pub fn colliders(&self) -> impl Iterator<Item = (usize, &Collider)> {
        self.links
            .iter()
            .enumerate()
            .flat_map(|(i, link)| link.colliders.iter().map(move |c| (i, c)))
    }

    /// Point masses `(mass, centre, gyration²)` in the root frame at `positions`.
    ///
    /// Link mass is spread evenly over its colliders; a link without colliders
    /// is treated as a point mass at its origin.
    #[must_use]
    pub fn mass_points(&self, positions: &[f32]) -> Vec<(f32, Vec3, f32)> {
        let poses = self.link_poses(positions);
        let mut points = Vec::new();
        for (i, link) in self.links.iter().enumerate() {
            if link.colliders.is_empty() {
                points.push((link.mass, poses[i].translation, 0.0));
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let share = link.mass / link.colliders.len() as f32;
            for collider in &link.colliders {
                let center = (poses[i] * collider.origin).translation;
                points.push((share, center, collider.shape.gyration_sq()));
            }
        }
        points
    }
}
