//! Vertex data structures and input descriptions.
//!
//! This module defines the vertex format used by the mesh pipelines.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Standard vertex format with position, color, normal, and UV.
///
/// Each vertex contains:
/// - `position` (Vec3): 3D position in object space
/// - `color` (Vec3): RGB vertex color
/// - `normal` (Vec3): Surface normal vector (should be normalized)
/// - `uv` (Vec2): Texture coordinates
///
/// # Memory Layout
///
/// The struct uses `#[repr(C)]` to ensure predictable memory layout:
/// - Offset 0: position (12 bytes)
/// - Offset 12: color (12 bytes)
/// - Offset 24: normal (12 bytes)
/// - Offset 36: uv (8 bytes)
/// - Total size: 44 bytes
///
/// # Shader Locations
///
/// - location 0: position (vec3)
/// - location 1: color (vec3)
/// - location 2: normal (vec3)
/// - location 3: uv (vec2)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 3D position in object space.
    pub position: Vec3,
    /// RGB vertex color.
    pub color: Vec3,
    /// Surface normal vector (should be normalized).
    pub normal: Vec3,
    /// Texture coordinates.
    pub uv: Vec2,
}

impl Vertex {
    /// Creates a new vertex with the specified attributes.
    #[inline]
    pub const fn new(position: Vec3, color: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            color,
            normal,
            uv,
        }
    }

    /// Returns the size of the vertex in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Get the vertex input binding description.
    ///
    /// Returns a binding description for binding 0 with per-vertex input rate.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 4] {
        [
            // Position at location 0
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            // Color at location 1
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            // Normal at location 2
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 24,
            },
            // UV at location 3
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32_SFLOAT,
                offset: 36,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        // Vertex: Vec3 (12) + Vec3 (12) + Vec3 (12) + Vec2 (8) = 44 bytes
        assert_eq!(std::mem::size_of::<Vertex>(), 44);
        assert_eq!(Vertex::size(), 44);
    }

    #[test]
    fn test_vertex_binding_description() {
        let binding = Vertex::binding_description();
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.stride, 44);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
    }

    #[test]
    fn test_vertex_attribute_descriptions() {
        let attrs = Vertex::attribute_descriptions();
        assert_eq!(attrs.len(), 4);

        // Position attribute (location 0)
        assert_eq!(attrs[0].binding, 0);
        assert_eq!(attrs[0].location, 0);
        assert_eq!(attrs[0].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[0].offset, 0);

        // Color attribute (location 1)
        assert_eq!(attrs[1].binding, 0);
        assert_eq!(attrs[1].location, 1);
        assert_eq!(attrs[1].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[1].offset, 12);

        // Normal attribute (location 2)
        assert_eq!(attrs[2].binding, 0);
        assert_eq!(attrs[2].location, 2);
        assert_eq!(attrs[2].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[2].offset, 24);

        // UV attribute (location 3)
        assert_eq!(attrs[3].binding, 0);
        assert_eq!(attrs[3].location, 3);
        assert_eq!(attrs[3].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attrs[3].offset, 36);
    }

    #[test]
    fn test_vertex_new() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let color = Vec3::new(0.5, 0.6, 0.7);
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let uv = Vec2::new(0.5, 0.5);

        let vertex = Vertex::new(position, color, normal, uv);

        assert_eq!(vertex.position, position);
        assert_eq!(vertex.color, color);
        assert_eq!(vertex.normal, normal);
        assert_eq!(vertex.uv, uv);
    }

    #[test]
    fn test_vertex_pod_zeroable() {
        let vertex = Vertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec2::new(0.5, 0.5),
        );

        // Test bytemuck cast to bytes and back
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 44);

        let vertex_back: &Vertex = bytemuck::from_bytes(bytes);
        assert_eq!(vertex_back.position, vertex.position);
        assert_eq!(vertex_back.color, vertex.color);
        assert_eq!(vertex_back.normal, vertex.normal);
        assert_eq!(vertex_back.uv, vertex.uv);
    }

    #[test]
    fn test_vertex_offsets() {
        // Verify field offsets match what we specify in attribute descriptions
        use std::mem::offset_of;

        assert_eq!(offset_of!(Vertex, position), 0);
        assert_eq!(offset_of!(Vertex, color), 12);
        assert_eq!(offset_of!(Vertex, normal), 24);
        assert_eq!(offset_of!(Vertex, uv), 36);
    }
}
