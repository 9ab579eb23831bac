//! Render systems.
//!
//! Each system owns a graphics pipeline built against the swapchain render
//! pass and records its draws into the frame's command buffer from the
//! shared [`FrameContext`](crate::frame::FrameContext).

pub mod point_light;
pub mod simple;

pub use point_light::PointLightSystem;
pub use simple::SimpleRenderSystem;
