//! Vulkan hardware interface for the Glimmer renderer.
//!
//! This crate provides a safe abstraction over Vulkan using the `ash` crate.
//! It handles:
//! - Instance and device creation
//! - Swapchain management, including the frame-in-flight scheduling state
//! - Buffer and image management via gpu-allocator
//! - Descriptor, shader, and pipeline creation
//! - Synchronization primitives

mod error;

pub mod buffer;
pub mod descriptor;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
