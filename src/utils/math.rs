//! Math helpers layered on top of `glam`.

use glam::{Mat3, Quat, Vec3};

/// Builds an orthonormal basis of the plane perpendicular to `normal`.
///
/// The returned pair spans the tangent plane used for friction. `normal`
/// must be unit length.
pub fn plane_space(normal: Vec3) -> (Vec3, Vec3) {
    // Branch on the dominant axis so the cross product stays well conditioned.
    let tangent = if normal.z.abs() > std::f32::consts::FRAC_1_SQRT_2 {
        let len = (normal.y * normal.y + normal.z * normal.z).sqrt();
        Vec3::new(0.0, -normal.z, normal.y) / len
    } else {
        let len = (normal.x * normal.x + normal.y * normal.y).sqrt();
        Vec3::new(-normal.y, normal.x, 0.0) / len
    };
    (tangent, normal.cross(tangent))
}

/// Skew-symmetric matrix such that `skew(v) * w == v.cross(w)`.
pub fn skew_symmetric(v: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, v.z, -v.y),
        Vec3::new(-v.z, 0.0, v.x),
        Vec3::new(v.y, -v.x, 0.0),
    )
}

/// Converts an angular velocity (radians/sec) into a quaternion increment.
pub fn angular_velocity_to_quat(angular: Vec3, dt: f32) -> Quat {
    let angle = angular.length() * dt;
    if angle < 1e-6 {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(angular.normalize(), angle)
}
