//! # Physics Integration
//!
//! Semi-implicit Euler integration of the floating base.

use glam::{Quat, Vec3};

/// Slight angular damping to keep the explicit contact model stable.
const DAMPING_FACTOR: f32 = 0.999;

/// Rigid-body state of the base, tracked at its centre of mass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyState {
    pub com: Vec3,
    pub orientation: Quat,
    pub linear_vel: Vec3,
    pub angular_vel: Vec3,
}

impl BodyState {
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.com.is_finite()
            && self.orientation.is_finite()
            && self.linear_vel.is_finite()
            && self.angular_vel.is_finite()
    }
}

/// World-frame inverse inertia applied to `v` for a body with diagonal
/// body-frame inertia `inertia`.
#[must_use]
pub fn apply_inverse_inertia(orientation: Quat, inertia: Vec3, v: Vec3) -> Vec3 {
    let local = orientation.inverse() * v;
    orientation * (local / inertia)
}

/// Advances the body by `dt` under the given net force and torque.
pub fn integrate_body(
    body: &mut BodyState,
    mass: f32,
    inertia: Vec3,
    force: Vec3,
    torque: Vec3,
    dt: f32,
) {
    body.linear_vel += force / mass * dt;
    body.angular_vel += apply_inverse_inertia(body.orientation, inertia, torque) * dt;

    body.angular_vel *= DAMPING_FACTOR;

    body.com += body.linear_vel * dt;
    let spin = Quat::from_scaled_axis(body.angular_vel * dt);
    body.orientation = (spin * body.orientation).normalize();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_spin_rotates_about_axis() {
        let mut body = BodyState {
            com: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_vel: Vec3::ZERO,
            angular_vel: Vec3::new(0.0, 0.0, 1.0),
        };
        integrate_body(&mut body, 1.0, Vec3::ONE, Vec3::ZERO, Vec3::ZERO, 0.1);
        let (axis, angle) = body.orientation.to_axis_angle();
        assert!((axis - Vec3::Z).length() < 1e-4);
        assert!((angle - 0.0999).abs() < 1e-4);
    }
}
