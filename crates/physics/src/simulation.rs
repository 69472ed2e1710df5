//! # Physics Simulation Core
//!
//! [`ArticulatedSim`] is a reduced-coordinate reference simulator: a single
//! floating rigid base carrying kinematically servoed joints. Each substep
//!
//! 1. moves every joint toward its target at a bounded speed,
//! 2. samples collider contact points and their velocities,
//! 3. accumulates gravity and ground reaction forces,
//! 4. integrates the base.
//!
//! Joint motion feeds back into the base only through contact, which is
//! enough for legs to push the body around.

use crate::contact::ground_wrench;
use crate::error::PhysicsError;
use crate::integrator::{apply_inverse_inertia, integrate_body, BodyState};
use crate::kinematics::Articulation;
use crate::types::{
    BaseVelocity, DebugItemId, DebugLine, JointLimits, JointState, Pose, SimParams,
};
use crate::world::World;
use glam::{Quat, Vec3};

/// Inertia floor, as a fraction of total mass, for degenerate bodies.
const MIN_INERTIA_PER_MASS: f32 = 1e-4;

pub struct ArticulatedSim {
    articulation: Articulation,
    pub params: SimParams,

    mass: f32,
    inertia: Vec3,
    /// Centre of mass in the base link frame at the home posture.
    com_local: Vec3,
    body: BodyState,

    limits: Vec<JointLimits>,
    positions: Vec<f32>,
    velocities: Vec<f32>,
    targets: Vec<f32>,

    prev_points: Vec<Vec3>,
    point_links: Vec<usize>,
    contacts: Vec<usize>,

    debug_items: Vec<(DebugItemId, DebugLine)>,
    next_debug_id: u64,
}

impl ArticulatedSim {
    /// Creates a simulator with the base at the origin and joints at home.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::InvalidArticulation`] if the total mass is not positive.
    pub fn new(articulation: Articulation, params: SimParams) -> Result<Self, PhysicsError> {
        let mass = articulation.total_mass();
        if !(mass.is_finite() && mass > 0.0) {
            return Err(PhysicsError::InvalidArticulation(format!(
                "total mass must be positive, got {mass}"
            )));
        }
        let home = articulation.home_positions();
        let points = articulation.mass_points(&home);
        let com_local = points.iter().map(|(m, c, _)| *c * *m).sum::<Vec3>() / mass;

        let mut inertia = Vec3::ZERO;
        for (m, c, gyration) in &points {
            let r = *c - com_local;
            let r2 = r * r;
            inertia += *m * (Vec3::new(r2.y + r2.z, r2.x + r2.z, r2.x + r2.y) + Vec3::splat(*gyration));
        }
        let inertia = inertia.max(Vec3::splat(MIN_INERTIA_PER_MASS * mass));

        let limits = articulation.limits();
        let point_links = articulation
            .colliders()
            .flat_map(|(link, c)| std::iter::repeat(link).take(c.shape.contact_point_count()))
            .collect();

        let mut sim = Self {
            mass,
            inertia,
            com_local,
            body: BodyState {
                com: com_local,
                orientation: Quat::IDENTITY,
                linear_vel: Vec3::ZERO,
                angular_vel: Vec3::ZERO,
            },
            velocities: vec![0.0; home.len()],
            targets: home.clone(),
            positions: home,
            limits,
            prev_points: Vec::new(),
            point_links,
            contacts: Vec::new(),
            debug_items: Vec::new(),
            next_debug_id: 0,
            articulation,
            params,
        };
        sim.prev_points = sim.contact_points();
        tracing::debug!(
            links = sim.articulation.links().len(),
            joints = sim.positions.len(),
            contact_points = sim.point_links.len(),
            mass,
            "created articulated simulation"
        );
        Ok(sim)
    }

    #[must_use]
    pub fn articulation(&self) -> &Articulation {
        &self.articulation
    }

    #[must_use]
    pub fn debug_lines(&self) -> impl Iterator<Item = &DebugLine> {
        self.debug_items.iter().map(|(_, line)| line)
    }

    /// Runs `substeps` substeps.
    pub fn run(&mut self, substeps: usize) {
        for _ in 0..substeps {
            self.step_substep();
        }
    }

    fn base(&self) -> Pose {
        let origin = self.body.com - self.body.orientation * self.com_local;
        Pose::new(origin, self.body.orientation)
    }

    fn contact_points(&self) -> Vec<Vec3> {
        let mut points = Vec::with_capacity(self.point_links.len());
        for (_, pose, shape) in self.articulation.collider_poses(&self.base(), &self.positions) {
            shape.contact_points(&pose, &mut points);
        }
        points
    }

    fn advance_joints(&mut self, dt: f32) {
        let servo = self.params.servo;
        for i in 0..self.positions.len() {
            let limits = self.limits[i];
            let max_speed = if limits.velocity > 0.0 {
                limits.velocity
            } else {
                servo.default_max_velocity
            };
            let before = self.positions[i];
            let speed = (servo.gain * (self.targets[i] - before)).clamp(-max_speed, max_speed);
            let after = limits.clamp(before + speed * dt);
            self.positions[i] = after;
            self.velocities[i] = (after - before) / dt;
        }
    }

    fn check_finite(&self) -> Result<(), PhysicsError> {
        if self.body.is_finite() && self.positions.iter().all(|q| q.is_finite()) {
            Ok(())
        } else {
            Err(PhysicsError::Diverged)
        }
    }
}

impl World for ArticulatedSim {
    fn joint_count(&self) -> usize {
        self.positions.len()
    }

    fn total_mass(&self) -> f32 {
        self.mass
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.params.gravity = gravity;
    }

    fn set_joint_target(&mut self, joint: usize, position: f32) -> Result<(), PhysicsError> {
        let count = self.targets.len();
        let limits = self
            .limits
            .get(joint)
            .ok_or(PhysicsError::JointIndex { index: joint, count })?;
        self.targets[joint] = limits.clamp(position);
        Ok(())
    }

    fn step_substep(&mut self) {
        let dt = self.params.dt;
        self.advance_joints(dt);

        let points = self.contact_points();
        let velocities: Vec<Vec3> = points
            .iter()
            .zip(&self.prev_points)
            .map(|(p, prev)| (*p - *prev) / dt)
            .collect();
        let (wrench, touching) = ground_wrench(
            &points,
            &velocities,
            self.body.com,
            self.mass,
            &self.params.contact,
        );
        self.contacts = touching
            .iter()
            .zip(&self.point_links)
            .filter_map(|(&t, &link)| t.then_some(link))
            .collect();
        self.contacts.dedup();

        let force = wrench.force + self.params.gravity * self.mass;
        integrate_body(&mut self.body, self.mass, self.inertia, force, wrench.torque, dt);
        self.prev_points = points;
    }

    fn base_pose(&self) -> Result<Pose, PhysicsError> {
        self.check_finite()?;
        Ok(self.base())
    }

    fn base_velocity(&self) -> Result<BaseVelocity, PhysicsError> {
        self.check_finite()?;
        let offset = self.base().translation - self.body.com;
        Ok(BaseVelocity {
            linear: self.body.linear_vel + self.body.angular_vel.cross(offset),
            angular: self.body.angular_vel,
        })
    }

    fn joint_states(&self) -> Result<Vec<JointState>, PhysicsError> {
        self.check_finite()?;
        Ok(self
            .positions
            .iter()
            .zip(&self.velocities)
            .map(|(&position, &velocity)| JointState { position, velocity })
            .collect())
    }

    fn ground_contacts(&self) -> Result<Vec<usize>, PhysicsError> {
        self.check_finite()?;
        Ok(self.contacts.clone())
    }

    fn reset_base(&mut self, pose: Pose) {
        self.body = BodyState {
            com: pose.transform_point(self.com_local),
            orientation: pose.rotation.normalize(),
            linear_vel: Vec3::ZERO,
            angular_vel: Vec3::ZERO,
        };
        self.contacts.clear();
        self.prev_points = self.contact_points();
    }

    fn reset_joints(&mut self, positions: &[f32]) -> Result<(), PhysicsError> {
        if positions.len() != self.positions.len() {
            return Err(PhysicsError::JointCount {
                expected: self.positions.len(),
                actual: positions.len(),
            });
        }
        for (i, &q) in positions.iter().enumerate() {
            let q = self.limits[i].clamp(q);
            self.positions[i] = q;
            self.targets[i] = q;
            self.velocities[i] = 0.0;
        }
        self.prev_points = self.contact_points();
        Ok(())
    }

    fn set_base_velocity(&mut self, velocity: BaseVelocity) {
        let lever = self.body.com - self.base().translation;
        self.body.linear_vel = velocity.linear + velocity.angular.cross(lever);
        self.body.angular_vel = velocity.angular;
    }

    fn apply_base_impulse(&mut self, linear: Vec3, angular: Vec3) {
        self.body.linear_vel += linear / self.mass;
        self.body.angular_vel +=
            apply_inverse_inertia(self.body.orientation, self.inertia, angular);
    }

    fn add_debug_line(&mut self, line: DebugLine) -> DebugItemId {
        let id = DebugItemId(self.next_debug_id);
        self.next_debug_id += 1;
        self.debug_items.push((id, line));
        id
    }

    fn remove_debug_item(&mut self, id: DebugItemId) {
        self.debug_items.retain(|(item, _)| *item != id);
    }

    fn clear_debug_items(&mut self) {
        self.debug_items.clear();
    }
}
