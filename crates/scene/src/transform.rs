//! Transform component for scene objects.
//!
//! Rotation is stored as Tait-Bryan angles applied in Y, X, Z order
//! (yaw, then pitch, then roll), the convention the camera controller and
//! view matrices share.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// Translation, YXZ-euler rotation, and scale of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Position in world space.
    pub translation: Vec3,
    /// Per-axis scale factor.
    pub scale: Vec3,
    /// Euler angles in radians, applied in Y, X, Z order.
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

impl Transform {
    /// Creates an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation as a quaternion (Y, then X, then Z).
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        )
    }

    /// The object-to-world matrix: translate * rotate(Y X Z) * scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.translation)
    }

    /// The 3x3 normal transform: rotation applied to inverse scale.
    ///
    /// Correctly transforms normals under non-uniform scaling; equals the
    /// rotation alone when the scale is uniform 1.
    pub fn normal_matrix(&self) -> Mat3 {
        let inv_scale = 1.0 / self.scale;
        Mat3::from_quat(self.rotation_quat()) * Mat3::from_diagonal(inv_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.matrix(), Mat4::IDENTITY);
        assert_eq!(t.normal_matrix(), Mat3::IDENTITY);
    }

    #[test]
    fn test_translation_lands_in_last_column() {
        let t = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let m = t.matrix();
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_matrix_composition_order() {
        // Scale must apply before rotation: a point on the x-axis scaled
        // by 2 and yawed 90 degrees lands at (0, 0, -2)
        let t = Transform {
            scale: Vec3::splat(2.0),
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            ..Default::default()
        };
        let p = t.matrix().transform_point3(Vec3::X);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_normal_matrix_uniform_scale_is_rotation() {
        let t = Transform {
            rotation: Vec3::new(0.3, 0.7, 0.1),
            ..Default::default()
        };
        let n = t.normal_matrix();
        let r = Mat3::from_quat(t.rotation_quat());
        for (a, b) in n.to_cols_array().iter().zip(r.to_cols_array()) {
            assert_relative_eq!(*a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_normal_matrix_matches_inverse_transpose() {
        let t = Transform {
            scale: Vec3::new(1.0, 2.0, 0.5),
            rotation: Vec3::new(0.2, 1.1, -0.4),
            ..Default::default()
        };
        let n = t.normal_matrix();
        let expected = Mat3::from_mat4(t.matrix()).inverse().transpose();
        for (a, b) in n.to_cols_array().iter().zip(expected.to_cols_array()) {
            assert_relative_eq!(*a, b, epsilon = 1e-5);
        }
    }
}
