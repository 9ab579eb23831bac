//! Mesh rendering system.
//!
//! Draws every game object that carries a model, pushing its transform
//! through push constants.

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use tracing::info;

use glimmer_rhi::device::Device;
use glimmer_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use glimmer_rhi::shader::{Shader, ShaderStage};
use glimmer_rhi::vertex::Vertex;
use glimmer_rhi::RhiResult;

use crate::frame::FrameContext;

/// Per-object push constant block.
///
/// Matches the GLSL push constant block in the mesh shaders. The full
/// 128 bytes fit the minimum push constant budget Vulkan guarantees.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PushConstantData {
    /// Object-to-world transform.
    pub model_matrix: Mat4,
    /// Normal transform, the inverse-scale rotation widened to 4x4.
    pub normal_matrix: Mat4,
}

/// Renders game objects with models through the mesh pipeline.
pub struct SimpleRenderSystem {
    device: Arc<Device>,
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
}

impl SimpleRenderSystem {
    /// Creates the system and its pipeline.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `render_pass` - The swapchain render pass the pipeline targets
    /// * `global_set_layout` - Layout of the per-frame global descriptor set
    ///
    /// # Errors
    ///
    /// Returns an error if shader loading or pipeline creation fails.
    pub fn new(
        device: Arc<Device>,
        render_pass: vk::RenderPass,
        global_set_layout: vk::DescriptorSetLayout,
    ) -> RhiResult<Self> {
        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/simple.vert.spv"),
            ShaderStage::Vertex,
            "main",
        )?;

        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/simple.frag.spv"),
            ShaderStage::Fragment,
            "main",
        )?;

        let push_constant_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(std::mem::size_of::<PushConstantData>() as u32);

        let pipeline_layout = PipelineLayout::new(
            device.clone(),
            &[global_set_layout],
            &[push_constant_range],
        )?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .render_pass(render_pass)
            .build(device.clone(), &pipeline_layout)?;

        info!("Simple render system created");

        Ok(Self {
            device,
            pipeline,
            pipeline_layout,
        })
    }

    /// Records draws for every game object that has a model.
    pub fn render(&self, ctx: &FrameContext) {
        let cmd = ctx.command_buffer;

        unsafe {
            self.pipeline.bind(cmd);

            self.device.handle().cmd_bind_descriptor_sets(
                cmd,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.handle(),
                0,
                &[ctx.global_descriptor_set],
                &[],
            );
        }

        for object in ctx.game_objects.iter() {
            let model = match &object.model {
                Some(model) => model,
                None => continue,
            };

            let push = PushConstantData {
                model_matrix: object.transform.matrix(),
                normal_matrix: Mat4::from_mat3(object.transform.normal_matrix()),
            };

            unsafe {
                self.device.handle().cmd_push_constants(
                    cmd,
                    self.pipeline_layout.handle(),
                    vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                    0,
                    bytemuck::bytes_of(&push),
                );
            }

            model.bind(cmd);
            model.draw(cmd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_constant_size() {
        // 2 Mat4 = 128 bytes, the guaranteed minimum push constant budget
        assert_eq!(std::mem::size_of::<PushConstantData>(), 128);
    }

    #[test]
    fn test_push_constant_alignment() {
        assert_eq!(std::mem::align_of::<PushConstantData>(), 16);
    }

    #[test]
    fn test_push_constant_pod() {
        let push = PushConstantData {
            model_matrix: Mat4::IDENTITY,
            normal_matrix: Mat4::IDENTITY,
        };
        let bytes: &[u8] = bytemuck::bytes_of(&push);
        assert_eq!(bytes.len(), 128);
    }
}
