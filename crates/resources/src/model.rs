//! Mesh data and device-local models.
//!
//! [`ModelData`] holds vertices and optional indices on the CPU;
//! [`Model`] owns the uploaded device-local buffers and records the
//! bind and draw commands.

use std::sync::Arc;

use ash::vk;
use glam::{Vec2, Vec3};
use tracing::{debug, info};

use glimmer_rhi::buffer::{Buffer, BufferUsage};
use glimmer_rhi::device::Device;
use glimmer_rhi::vertex::Vertex;

use crate::error::{ResourceError, ResourceResult};

/// CPU-side mesh data.
#[derive(Clone, Debug, Default)]
pub struct ModelData {
    /// Vertex data.
    pub vertices: Vec<Vertex>,
    /// Index data; when absent the model is drawn non-indexed.
    pub indices: Option<Vec<u32>>,
}

impl ModelData {
    /// Builds a unit cube centered at `offset` with per-face colors.
    ///
    /// Y points down, so the orange face at `-y` is the top. Each face has
    /// its own four vertices so normals and colors stay flat.
    pub fn cube(offset: Vec3) -> Self {
        fn v(position: [f32; 3], color: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
            Vertex::new(
                Vec3::from_array(position),
                Vec3::from_array(color),
                Vec3::from_array(normal),
                Vec2::from_array(uv),
            )
        }

        const WHITE: [f32; 3] = [0.9, 0.9, 0.9];
        const YELLOW: [f32; 3] = [0.8, 0.8, 0.1];
        const ORANGE: [f32; 3] = [0.9, 0.6, 0.1];
        const RED: [f32; 3] = [0.8, 0.1, 0.1];
        const BLUE: [f32; 3] = [0.1, 0.1, 0.8];
        const GREEN: [f32; 3] = [0.1, 0.8, 0.1];

        let mut vertices = vec![
            // Left face (white), normal -x
            v([-0.5, -0.5, -0.5], WHITE, [-1.0, 0.0, 0.0], [0.0, 0.0]),
            v([-0.5, 0.5, 0.5], WHITE, [-1.0, 0.0, 0.0], [1.0, 1.0]),
            v([-0.5, -0.5, 0.5], WHITE, [-1.0, 0.0, 0.0], [1.0, 0.0]),
            v([-0.5, 0.5, -0.5], WHITE, [-1.0, 0.0, 0.0], [0.0, 1.0]),
            // Right face (yellow), normal +x
            v([0.5, -0.5, -0.5], YELLOW, [1.0, 0.0, 0.0], [0.0, 0.0]),
            v([0.5, 0.5, 0.5], YELLOW, [1.0, 0.0, 0.0], [1.0, 1.0]),
            v([0.5, -0.5, 0.5], YELLOW, [1.0, 0.0, 0.0], [1.0, 0.0]),
            v([0.5, 0.5, -0.5], YELLOW, [1.0, 0.0, 0.0], [0.0, 1.0]),
            // Top face (orange), normal -y
            v([-0.5, -0.5, -0.5], ORANGE, [0.0, -1.0, 0.0], [0.0, 0.0]),
            v([0.5, -0.5, 0.5], ORANGE, [0.0, -1.0, 0.0], [1.0, 1.0]),
            v([-0.5, -0.5, 0.5], ORANGE, [0.0, -1.0, 0.0], [0.0, 1.0]),
            v([0.5, -0.5, -0.5], ORANGE, [0.0, -1.0, 0.0], [1.0, 0.0]),
            // Bottom face (red), normal +y
            v([-0.5, 0.5, -0.5], RED, [0.0, 1.0, 0.0], [0.0, 0.0]),
            v([0.5, 0.5, 0.5], RED, [0.0, 1.0, 0.0], [1.0, 1.0]),
            v([-0.5, 0.5, 0.5], RED, [0.0, 1.0, 0.0], [0.0, 1.0]),
            v([0.5, 0.5, -0.5], RED, [0.0, 1.0, 0.0], [1.0, 0.0]),
            // Front face (blue), normal +z
            v([-0.5, -0.5, 0.5], BLUE, [0.0, 0.0, 1.0], [0.0, 0.0]),
            v([0.5, 0.5, 0.5], BLUE, [0.0, 0.0, 1.0], [1.0, 1.0]),
            v([-0.5, 0.5, 0.5], BLUE, [0.0, 0.0, 1.0], [0.0, 1.0]),
            v([0.5, -0.5, 0.5], BLUE, [0.0, 0.0, 1.0], [1.0, 0.0]),
            // Back face (green), normal -z
            v([-0.5, -0.5, -0.5], GREEN, [0.0, 0.0, -1.0], [0.0, 0.0]),
            v([0.5, 0.5, -0.5], GREEN, [0.0, 0.0, -1.0], [1.0, 1.0]),
            v([-0.5, 0.5, -0.5], GREEN, [0.0, 0.0, -1.0], [0.0, 1.0]),
            v([0.5, -0.5, -0.5], GREEN, [0.0, 0.0, -1.0], [1.0, 0.0]),
        ];

        for vertex in &mut vertices {
            vertex.position += offset;
        }

        let indices = vec![
            0, 1, 2, 0, 3, 1, // left
            4, 5, 6, 4, 7, 5, // right
            8, 9, 10, 8, 11, 9, // top
            12, 13, 14, 12, 15, 13, // bottom
            16, 17, 18, 16, 19, 17, // front
            20, 21, 22, 20, 23, 21, // back
        ];

        Self {
            vertices,
            indices: Some(indices),
        }
    }
}

/// A mesh uploaded to device-local memory.
pub struct Model {
    device: Arc<Device>,
    vertex_buffer: Buffer,
    vertex_count: u32,
    index_buffer: Option<Buffer>,
    index_count: u32,
}

impl Model {
    /// Uploads `data` into device-local vertex and index buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty or buffer creation fails.
    pub fn new(device: Arc<Device>, data: &ModelData) -> ResourceResult<Self> {
        if data.vertices.len() < 3 {
            return Err(ResourceError::InvalidModel(format!(
                "Need at least 3 vertices, got {}",
                data.vertices.len()
            )));
        }

        let vertex_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&data.vertices),
        )?;
        let vertex_count = data.vertices.len() as u32;

        let (index_buffer, index_count) = match &data.indices {
            Some(indices) if !indices.is_empty() => {
                let buffer = Buffer::new_with_data(
                    device.clone(),
                    BufferUsage::Index,
                    bytemuck::cast_slice(indices),
                )?;
                (Some(buffer), indices.len() as u32)
            }
            _ => (None, 0),
        };

        info!(
            "Model uploaded: {} vertices, {} indices",
            vertex_count, index_count
        );

        Ok(Self {
            device,
            vertex_buffer,
            vertex_count,
            index_buffer,
            index_count,
        })
    }

    /// Binds the vertex buffer and, if present, the index buffer.
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.handle().cmd_bind_vertex_buffers(
                command_buffer,
                0,
                &[self.vertex_buffer.handle()],
                &[0],
            );

            if let Some(index_buffer) = &self.index_buffer {
                self.device.handle().cmd_bind_index_buffer(
                    command_buffer,
                    index_buffer.handle(),
                    0,
                    vk::IndexType::UINT32,
                );
            }
        }
    }

    /// Records the draw, indexed when an index buffer is present.
    pub fn draw(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            if self.index_buffer.is_some() {
                self.device
                    .handle()
                    .cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
            } else {
                self.device
                    .handle()
                    .cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
            }
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices, 0 for non-indexed models.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        debug!("Model destroyed ({} vertices)", self.vertex_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_has_24_vertices_and_36_indices() {
        let cube = ModelData::cube(Vec3::ZERO);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.as_ref().unwrap().len(), 36);
    }

    #[test]
    fn test_cube_indices_in_bounds() {
        let cube = ModelData::cube(Vec3::ZERO);
        let count = cube.vertices.len() as u32;
        for &index in cube.indices.as_ref().unwrap() {
            assert!(index < count);
        }
    }

    #[test]
    fn test_cube_offset_applied() {
        let offset = Vec3::new(0.0, 0.0, 2.5);
        let cube = ModelData::cube(offset);
        for vertex in &cube.vertices {
            let local = vertex.position - offset;
            assert!(local.x.abs() <= 0.5 + 1e-6);
            assert!(local.y.abs() <= 0.5 + 1e-6);
            assert!(local.z.abs() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn test_cube_normals_are_unit_axis_aligned() {
        let cube = ModelData::cube(Vec3::ZERO);
        for vertex in &cube.vertices {
            let n = vertex.normal;
            assert!((n.length() - 1.0).abs() < 1e-6);
            // Each normal lies on exactly one axis
            let nonzero = [n.x, n.y, n.z].iter().filter(|c| c.abs() > 0.0).count();
            assert_eq!(nonzero, 1);
        }
    }
}
