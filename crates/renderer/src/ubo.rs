//! Uniform buffer object definitions for shaders.
//!
//! These structures must match the GLSL uniform buffer layouts exactly.
//! All structures use `#[repr(C)]` for predictable memory layout and implement
//! `Pod` and `Zeroable` for safe byte casting.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Global per-frame uniform buffer data.
///
/// This structure matches the GLSL `GlobalUbo` uniform block (set 0, binding 0)
/// shared by all render systems.
///
/// # Memory Layout
///
/// - Offset 0: projection matrix (64 bytes)
/// - Offset 64: view matrix (64 bytes)
/// - Offset 128: ambient light color, w = intensity (16 bytes)
/// - Offset 144: point light position, w unused (16 bytes)
/// - Offset 160: point light color, w = intensity (16 bytes)
/// - Total size: 176 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUbo {
    /// Projection matrix (view to clip space).
    pub projection: Mat4,
    /// View matrix (world to view space).
    pub view: Mat4,
    /// Ambient light color; w holds the intensity.
    pub ambient_light_color: Vec4,
    /// Point light position in world space; w is unused.
    pub light_position: Vec4,
    /// Point light color; w holds the intensity.
    pub light_color: Vec4,
}

impl GlobalUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

impl Default for GlobalUbo {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            ambient_light_color: Vec4::new(1.0, 1.0, 1.0, 0.02),
            light_position: Vec4::new(-1.0, -1.0, -1.0, 0.0),
            light_color: Vec4::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_ubo_size() {
        // 2 Mat4 (2 * 64) + 3 Vec4 (3 * 16) = 176 bytes
        assert_eq!(GlobalUbo::SIZE, 176);
    }

    #[test]
    fn test_global_ubo_alignment() {
        // Mat4 requires 16-byte alignment on the GPU
        assert_eq!(std::mem::align_of::<GlobalUbo>(), 16);
    }

    #[test]
    fn test_global_ubo_default() {
        let ubo = GlobalUbo::default();
        assert_eq!(ubo.projection, Mat4::IDENTITY);
        assert_eq!(ubo.view, Mat4::IDENTITY);
        assert_eq!(ubo.ambient_light_color.w, 0.02);
        assert_eq!(ubo.light_color, Vec4::ONE);
    }

    #[test]
    fn test_global_ubo_pod() {
        let ubo = GlobalUbo::default();
        let bytes: &[u8] = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), GlobalUbo::SIZE);
    }
}
