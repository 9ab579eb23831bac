//! Platform abstraction layer for the Glimmer renderer.
//!
//! This crate provides platform-specific functionality:
//! - Window management via winit, including the framebuffer-resize flag
//! - Keyboard input state
//! - Vulkan surface creation through ash-window

mod input;
mod window;

pub use input::{InputState, KeyCode};
pub use window::{Surface, Window, get_required_extensions};

// Re-export winit types that users might need
pub use winit::event::WindowEvent;
pub use winit::event_loop::EventLoop;
