use crate::types::{Pose, Shape};
use glam::Vec3;

/// Number of rim samples per cylinder cap used for ground contact.
const CYLINDER_RIM_SAMPLES: usize = 8;

impl Shape {
    /// Lowest world-space z reached by the shape when placed at `pose`.
    #[must_use]
    pub fn lowest_point(&self, pose: &Pose) -> f32 {
        let c = pose.translation.z;
        match *self {
            Shape::Sphere { radius } => c - radius,
            Shape::Box { half_extents } => {
                // Extent along world z is the sum of the rotated half axes' z components.
                let ex = pose.transform_vector(Vec3::X * half_extents.x).z.abs();
                let ey = pose.transform_vector(Vec3::Y * half_extents.y).z.abs();
                let ez = pose.transform_vector(Vec3::Z * half_extents.z).z.abs();
                c - (ex + ey + ez)
            }
            Shape::Cylinder { radius, length } => {
                let az = pose.transform_vector(Vec3::Z).z.clamp(-1.0, 1.0);
                c - (az.abs() * length * 0.5 + radius * (1.0 - az * az).max(0.0).sqrt())
            }
        }
    }

    /// Number of points [`Shape::contact_points`] produces.
    #[must_use]
    pub const fn contact_point_count(&self) -> usize {
        match self {
            Shape::Sphere { .. } => 1,
            Shape::Box { .. } => 8,
            Shape::Cylinder { .. } => 2 * CYLINDER_RIM_SAMPLES,
        }
    }

    /// Appends the world-space points used for ground contact.
    ///
    /// Spheres contribute their current lowest point, boxes their corners and
    /// cylinders a ring of samples on each cap rim.
    pub fn contact_points(&self, pose: &Pose, out: &mut Vec<Vec3>) {
        match *self {
            Shape::Sphere { radius } => {
                out.push(pose.translation - Vec3::Z * radius);
            }
            Shape::Box { half_extents } => {
                for sx in [-1.0, 1.0] {
                    for sy in [-1.0, 1.0] {
                        for sz in [-1.0, 1.0] {
                            let local = half_extents * Vec3::new(sx, sy, sz);
                            out.push(pose.transform_point(local));
                        }
                    }
                }
            }
            Shape::Cylinder { radius, length } => {
                for cap in [-0.5, 0.5] {
                    for i in 0..CYLINDER_RIM_SAMPLES {
                        #[allow(clippy::cast_precision_loss)]
                        let angle = std::f32::consts::TAU * i as f32 / CYLINDER_RIM_SAMPLES as f32;
                        let local = Vec3::new(radius * angle.cos(), radius * angle.sin(), cap * length);
                        out.push(pose.transform_point(local));
                    }
                }
            }
        }
    }

    /// Squared radius of gyration of a solid of this shape about its centre.
    #[must_use]
    pub fn gyration_sq(&self) -> f32 {
        match *self {
            Shape::Sphere { radius } => 0.4 * radius * radius,
            Shape::Box { half_extents } => half_extents.length_squared() * (2.0 / 9.0),
            Shape::Cylinder { radius, length } => 0.5 * radius * radius + length * length / 12.0,
        }
    }

    /// Whether every dimension is finite and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            Shape::Sphere { radius } => positive(radius),
            Shape::Box { half_extents } => {
                positive(half_extents.x) && positive(half_extents.y) && positive(half_extents.z)
            }
            Shape::Cylinder { radius, length } => positive(radius) && positive(length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn sphere_lowest_point() {
        let s = Shape::Sphere { radius: 0.5 };
        let pose = Pose::from_translation(Vec3::new(0.0, 0.0, 2.0));
        assert!((s.lowest_point(&pose) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn rotated_box_matches_corners() {
        let b = Shape::Box { half_extents: Vec3::new(0.3, 0.1, 0.2) };
        let pose = Pose::new(Vec3::new(0.0, 0.0, 1.0), Quat::from_rotation_x(0.7) * Quat::from_rotation_y(0.3));
        let mut pts = Vec::new();
        b.contact_points(&pose, &mut pts);
        let min = pts.iter().map(|p| p.z).fold(f32::INFINITY, f32::min);
        assert!((b.lowest_point(&pose) - min).abs() < 1e-5);
    }

    #[test]
    fn lying_cylinder_rests_on_radius() {
        let c = Shape::Cylinder { radius: 0.05, length: 0.4 };
        let pose = Pose::new(Vec3::ZERO, Quat::from_rotation_x(std::f32::consts::FRAC_PI_2));
        assert!((c.lowest_point(&pose) + 0.05).abs() < 1e-5);
    }
}
