//! Camera with Vulkan-convention projection and view matrices.
//!
//! Projections map depth to `[0, 1]` with Y pointing down in clip space,
//! matching the swapchain's framebuffer orientation, so no post-flip of the
//! projection matrix is needed.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3, Vec4};

/// World-up for the view helpers. Y points down in this coordinate system.
const DEFAULT_UP: Vec3 = Vec3::new(0.0, -1.0, 0.0);

/// Projection and view matrices for rendering.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    /// Creates a camera with identity projection and view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an orthographic projection with depth mapped to `[0, 1]`.
    pub fn set_orthographic_projection(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) {
        self.projection = Mat4::from_cols(
            Vec4::new(2.0 / (right - left), 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / (bottom - top), 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0 / (far - near), 0.0),
            Vec4::new(
                -(right + left) / (right - left),
                -(bottom + top) / (bottom - top),
                -near / (far - near),
                1.0,
            ),
        );
    }

    /// Sets a perspective projection with depth mapped to `[0, 1]`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `aspect` is not a positive finite value.
    pub fn set_perspective_projection(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        debug_assert!(aspect > 0.0 && aspect.is_finite());
        let tan_half_fovy = (fovy / 2.0).tan();
        self.projection = Mat4::from_cols(
            Vec4::new(1.0 / (aspect * tan_half_fovy), 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0 / tan_half_fovy, 0.0, 0.0),
            Vec4::new(0.0, 0.0, far / (far - near), 1.0),
            Vec4::new(0.0, 0.0, -(far * near) / (far - near), 0.0),
        );
    }

    /// Points the camera from `position` along `direction`.
    ///
    /// `direction` need not be normalized but must be non-zero.
    pub fn set_view_direction(&mut self, position: Vec3, direction: Vec3, up: Vec3) {
        let w = direction.normalize();
        let u = w.cross(up).normalize();
        let v = w.cross(u);

        self.view = Mat4::from_cols(
            Vec4::new(u.x, v.x, w.x, 0.0),
            Vec4::new(u.y, v.y, w.y, 0.0),
            Vec4::new(u.z, v.z, w.z, 0.0),
            Vec4::new(-u.dot(position), -v.dot(position), -w.dot(position), 1.0),
        );
    }

    /// Points the camera from `position` at `target`.
    pub fn set_view_target(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.set_view_direction(position, target - position, up);
    }

    /// Builds the view from a position and YXZ euler rotation, the inverse
    /// of the corresponding [`Transform`](crate::transform::Transform) matrix
    /// without scale.
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let basis = Mat3::from_quat(Quat::from_euler(
            EulerRot::YXZ,
            rotation.y,
            rotation.x,
            rotation.z,
        ));
        let u = basis.x_axis;
        let v = basis.y_axis;
        let w = basis.z_axis;

        self.view = Mat4::from_cols(
            Vec4::new(u.x, v.x, w.x, 0.0),
            Vec4::new(u.y, v.y, w.y, 0.0),
            Vec4::new(u.z, v.z, w.z, 0.0),
            Vec4::new(-u.dot(position), -v.dot(position), -w.dot(position), 1.0),
        );
    }

    /// Returns the projection matrix.
    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Returns the view matrix.
    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }
}

/// World-up direction used by view helpers when no explicit up is wanted.
pub fn default_up() -> Vec3 {
    DEFAULT_UP
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_mat4_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array()) {
            assert_relative_eq!(*x, y, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_perspective_depth_range() {
        let mut camera = Camera::new();
        camera.set_perspective_projection(50.0_f32.to_radians(), 1.0, 0.5, 100.0);
        let proj = camera.projection();

        // A point at the near plane projects to depth 0
        let near = proj.project_point3(Vec3::new(0.0, 0.0, 0.5));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-5);

        // A point at the far plane projects to depth 1
        let far = proj.project_point3(Vec3::new(0.0, 0.0, 100.0));
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_perspective_aspect_scales_x() {
        let mut camera = Camera::new();
        camera.set_perspective_projection(std::f32::consts::FRAC_PI_2, 2.0, 0.1, 10.0);
        let proj = camera.projection();
        // Wider aspect squeezes x, leaves y
        assert_relative_eq!(proj.x_axis.x * 2.0, proj.y_axis.y, epsilon = 1e-6);
    }

    #[test]
    fn test_orthographic_maps_bounds_to_ndc() {
        let mut camera = Camera::new();
        camera.set_orthographic_projection(-2.0, 2.0, -1.0, 1.0, 0.0, 10.0);
        let proj = camera.projection();

        let p = proj.transform_point3(Vec3::new(2.0, 1.0, 10.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-5);

        let p = proj.transform_point3(Vec3::new(-2.0, -1.0, 0.0));
        assert_relative_eq!(p.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_view_direction_moves_world_opposite() {
        let mut camera = Camera::new();
        camera.set_view_direction(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, default_up());

        // The camera sits 5 units behind the origin looking along +Z,
        // so the origin appears 5 units ahead in view space
        let p = camera.view().transform_point3(Vec3::ZERO);
        assert_relative_eq!(p.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_view_target_matches_view_direction() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let target = Vec3::new(4.0, 0.0, -1.0);

        let mut a = Camera::new();
        a.set_view_target(position, target, default_up());

        let mut b = Camera::new();
        b.set_view_direction(position, target - position, default_up());

        assert_mat4_eq(a.view(), b.view());
    }

    #[test]
    fn test_view_yxz_is_inverse_of_rotation_translation() {
        let position = Vec3::new(1.0, -2.0, 3.0);
        let rotation = Vec3::new(0.3, 1.2, -0.5);

        let mut camera = Camera::new();
        camera.set_view_yxz(position, rotation);

        let forward = Mat4::from_rotation_translation(
            Quat::from_euler(EulerRot::YXZ, rotation.y, rotation.x, rotation.z),
            position,
        );

        assert_mat4_eq(camera.view(), forward.inverse());
    }

    #[test]
    fn test_view_yxz_zero_rotation_is_translation_only() {
        let mut camera = Camera::new();
        camera.set_view_yxz(Vec3::new(0.0, 0.0, 2.5), Vec3::ZERO);

        let p = camera.view().transform_point3(Vec3::new(0.0, 0.0, 2.5));
        assert_relative_eq!(p.length(), 0.0, epsilon = 1e-6);
    }
}
