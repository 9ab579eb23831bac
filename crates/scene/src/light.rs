//! Light components.

/// Point light component for a game object.
///
/// The light's position and color come from the owning object's transform
/// and color; the component only carries the intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    /// Light intensity multiplier.
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

impl PointLight {
    /// Creates a point light with the given intensity.
    pub fn new(intensity: f32) -> Self {
        Self { intensity }
    }
}
