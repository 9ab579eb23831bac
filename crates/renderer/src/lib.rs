//! Frame lifecycle and render systems.
//!
//! This crate drives rendering on top of `glimmer-rhi`:
//! - [`Renderer`] owns the Vulkan stack and the acquire/submit/present loop
//! - [`frame`] tracks the frame state machine and carries per-frame context
//! - [`systems`] hold the graphics pipelines and record draw commands
//! - [`ubo`] defines the global uniform buffer layout shared by the shaders

pub mod frame;
pub mod renderer;
pub mod systems;
pub mod ubo;

pub use frame::{FrameContext, FrameLifecycle};
pub use renderer::Renderer;
pub use systems::{PointLightSystem, SimpleRenderSystem};
pub use ubo::GlobalUbo;
