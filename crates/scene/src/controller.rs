//! Keyboard-driven viewer movement.

use glam::Vec3;

use glimmer_platform::{InputState, KeyCode};

use crate::transform::Transform;

/// Moves a transform through the XZ plane from keyboard input.
///
/// WASD translates in the view plane, Q/E move up and down, and the arrow
/// keys turn the view. Pitch is clamped so the view never flips over.
pub struct KeyboardController {
    /// Translation speed in units per second.
    pub move_speed: f32,
    /// Rotation speed in radians per second.
    pub look_speed: f32,
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            look_speed: 1.5,
        }
    }
}

impl KeyboardController {
    /// Creates a controller with the default speeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one tick of input to `transform`.
    ///
    /// Movement is relative to the current yaw only, so looking up or down
    /// never changes the travel direction. Inputs are normalized before
    /// scaling so diagonals are not faster.
    pub fn move_in_plane_xz(&self, input: &InputState, dt: f32, transform: &mut Transform) {
        let mut rotate = Vec3::ZERO;
        if input.is_key_pressed(KeyCode::ArrowRight) {
            rotate.y += 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowLeft) {
            rotate.y -= 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowUp) {
            rotate.x += 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowDown) {
            rotate.x -= 1.0;
        }

        if rotate.length_squared() > f32::EPSILON {
            transform.rotation += self.look_speed * dt * rotate.normalize();
        }

        // Keep pitch short of vertical and yaw bounded
        transform.rotation.x = transform.rotation.x.clamp(-1.5, 1.5);
        transform.rotation.y %= std::f32::consts::TAU;

        let yaw = transform.rotation.y;
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        let right = Vec3::new(forward.z, 0.0, -forward.x);
        let up = Vec3::new(0.0, -1.0, 0.0);

        let mut direction = Vec3::ZERO;
        if input.is_key_pressed(KeyCode::KeyW) {
            direction += forward;
        }
        if input.is_key_pressed(KeyCode::KeyS) {
            direction -= forward;
        }
        if input.is_key_pressed(KeyCode::KeyD) {
            direction += right;
        }
        if input.is_key_pressed(KeyCode::KeyA) {
            direction -= right;
        }
        if input.is_key_pressed(KeyCode::KeyE) {
            direction += up;
        }
        if input.is_key_pressed(KeyCode::KeyQ) {
            direction -= up;
        }

        if direction.length_squared() > f32::EPSILON {
            transform.translation += self.move_speed * dt * direction.normalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_moves_along_plus_z_at_zero_yaw() {
        let controller = KeyboardController::new();
        let mut input = InputState::new();
        let mut transform = Transform::default();

        input.on_key_pressed(KeyCode::KeyW);
        controller.move_in_plane_xz(&input, 1.0, &mut transform);

        assert_relative_eq!(transform.translation.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(transform.translation.z, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let controller = KeyboardController::new();
        let mut input = InputState::new();
        let mut transform = Transform::default();

        input.on_key_pressed(KeyCode::KeyW);
        input.on_key_pressed(KeyCode::KeyD);
        controller.move_in_plane_xz(&input, 1.0, &mut transform);

        // Speed 3.0 regardless of direction
        assert_relative_eq!(transform.translation.length(), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_opposed_keys_cancel() {
        let controller = KeyboardController::new();
        let mut input = InputState::new();
        let mut transform = Transform::default();

        input.on_key_pressed(KeyCode::KeyW);
        input.on_key_pressed(KeyCode::KeyS);
        controller.move_in_plane_xz(&input, 1.0, &mut transform);

        assert_eq!(transform.translation, Vec3::ZERO);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let controller = KeyboardController::new();
        let mut input = InputState::new();
        let mut transform = Transform::default();

        input.on_key_pressed(KeyCode::ArrowUp);
        // Many seconds of looking up must not pass the clamp
        for _ in 0..100 {
            controller.move_in_plane_xz(&input, 0.1, &mut transform);
        }

        assert!(transform.rotation.x <= 1.5);
    }

    #[test]
    fn test_pitch_does_not_affect_travel_direction() {
        let controller = KeyboardController::new();
        let mut input = InputState::new();
        let mut transform = Transform::default();
        transform.rotation.x = 1.0;

        input.on_key_pressed(KeyCode::KeyW);
        controller.move_in_plane_xz(&input, 1.0, &mut transform);

        // Movement stays in the XZ plane
        assert_relative_eq!(transform.translation.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(transform.translation.length(), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_no_input_is_a_no_op() {
        let controller = KeyboardController::new();
        let input = InputState::new();
        let mut transform = Transform::default();

        controller.move_in_plane_xz(&input, 1.0, &mut transform);

        assert_eq!(transform.translation, Vec3::ZERO);
        assert_eq!(transform.rotation, Vec3::ZERO);
    }
}
