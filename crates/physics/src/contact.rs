//! # Ground Contact
//!
//! Penalty contact between sampled collider points and the `z = 0` plane.
//! Each penetrating point gets a spring-damper normal force and a tangential
//! damping force limited by Coulomb friction.

use crate::types::ContactParams;
use glam::Vec3;

/// Net force and torque (about `center`) produced by one contact pass.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ContactWrench {
    pub force: Vec3,
    pub torque: Vec3,
    pub touching: usize,
}

/// Accumulates ground reaction forces for the given points.
///
/// `velocities[i]` is the world velocity of `points[i]`. Gains in `params` are
/// per unit mass and are split evenly across the points currently below the
/// plane.
#[must_use]
pub fn ground_wrench(
    points: &[Vec3],
    velocities: &[Vec3],
    center: Vec3,
    mass: f32,
    params: &ContactParams,
) -> (ContactWrench, Vec<bool>) {
    let mut wrench = ContactWrench::default();
    let touching: Vec<bool> = points.iter().map(|p| p.z < 0.0).collect();
    let count = touching.iter().filter(|&&t| t).count();
    if count == 0 {
        return (wrench, touching);
    }
    #[allow(clippy::cast_precision_loss)]
    let per_point = mass / count as f32;
    let k = params.stiffness * per_point;
    let c = params.damping * per_point;
    let ct = params.tangential_damping * per_point;

    for ((&p, &v), &t) in points.iter().zip(velocities).zip(&touching) {
        if !t {
            continue;
        }
        let depth = -p.z;
        let normal = (k * depth - c * v.z).max(0.0);
        let slip = Vec3::new(v.x, v.y, 0.0);
        let mut tangential = -slip * ct;
        let limit = params.friction * normal;
        let magnitude = tangential.length();
        if magnitude > limit {
            tangential *= limit / magnitude;
        }
        let f = tangential + Vec3::Z * normal;
        wrench.force += f;
        wrench.torque += (p - center).cross(f);
    }
    wrench.touching = count;
    (wrench, touching)
}
