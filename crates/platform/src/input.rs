//! Keyboard input state tracking.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Tracks the current state of keyboard input.
///
/// Fed from winit key events by the application handler; queried by camera
/// controllers each frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Currently pressed keys
    pressed_keys: HashSet<KeyCode>,
    /// Keys that were first pressed this frame
    just_pressed_keys: HashSet<KeyCode>,
    /// Keys that were released this frame
    just_released_keys: HashSet<KeyCode>,
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the beginning of each frame to clear per-frame state.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.just_released_keys.clear();
    }

    /// Handle a key press event.
    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    /// Handle a key release event.
    pub fn on_key_released(&mut self, key: KeyCode) {
        if self.pressed_keys.remove(&key) {
            self.just_released_keys.insert(key);
        }
    }

    /// Check if a key is currently pressed.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if a key was first pressed this frame.
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Check if a key was released this frame.
    pub fn is_key_just_released(&self, key: KeyCode) -> bool {
        self.just_released_keys.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_cleared_on_begin_frame() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyW);
        assert!(input.is_key_just_pressed(KeyCode::KeyW));
        assert!(input.is_key_pressed(KeyCode::KeyW));

        input.begin_frame();
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));
        assert!(input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_repeat_press_is_not_just_pressed() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyA);
        input.begin_frame();
        // OS key repeat delivers another press for a held key
        input.on_key_pressed(KeyCode::KeyA);
        assert!(!input.is_key_just_pressed(KeyCode::KeyA));
    }

    #[test]
    fn test_release_tracking() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyD);
        input.begin_frame();
        input.on_key_released(KeyCode::KeyD);
        assert!(!input.is_key_pressed(KeyCode::KeyD));
        assert!(input.is_key_just_released(KeyCode::KeyD));
    }
}
