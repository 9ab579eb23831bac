//! Point light billboard system.
//!
//! Draws a camera-facing quad at the global point light's position. The
//! quad's six vertices are generated in the vertex shader from
//! `gl_VertexIndex`, so the pipeline has no vertex input.

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::info;

use glimmer_rhi::device::Device;
use glimmer_rhi::pipeline::{
    ColorBlendAttachment, GraphicsPipelineBuilder, Pipeline, PipelineLayout,
};
use glimmer_rhi::shader::{Shader, ShaderStage};
use glimmer_rhi::RhiResult;

use crate::frame::FrameContext;

/// Renders the point light billboard.
pub struct PointLightSystem {
    device: Arc<Device>,
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
}

impl PointLightSystem {
    /// Creates the system and its pipeline.
    ///
    /// The pipeline has no vertex input and blends the billboard over the
    /// scene with standard alpha blending.
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
            Path::new("shaders/spirv/point_light.vert.spv"),
            ShaderStage::Vertex,
            "main",
        )?;

        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new("shaders/spirv/point_light.frag.spv"),
            ShaderStage::Fragment,
            "main",
        )?;

        let pipeline_layout = PipelineLayout::new(device.clone(), &[global_set_layout], &[])?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .color_blend_attachment(ColorBlendAttachment::alpha_blend())
            .render_pass(render_pass)
            .build(device.clone(), &pipeline_layout)?;

        info!("Point light system created");

        Ok(Self {
            device,
            pipeline,
            pipeline_layout,
        })
    }

    /// Records the billboard draw.
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

            // Two triangles forming the billboard quad
            self.device.handle().cmd_draw(cmd, 6, 1, 0, 0);
        }
    }
}
