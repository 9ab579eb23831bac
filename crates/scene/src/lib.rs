//! Scene data and components.
//!
//! This crate provides the world-side pieces of the renderer:
//! - Transforms with YXZ-euler rotation
//! - A camera with Vulkan-convention projections
//! - Game objects with an owning store and explicit id allocation
//! - Light components and keyboard movement

pub mod camera;
pub mod controller;
pub mod game_object;
pub mod light;
pub mod transform;

pub use camera::Camera;
pub use controller::KeyboardController;
pub use game_object::{GameObject, GameObjectId, GameObjectMap, IdAllocator};
pub use light::PointLight;
pub use transform::Transform;
