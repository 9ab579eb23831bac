//! Asset loading and GPU resource creation.
//!
//! This crate builds GPU-resident assets:
//! - Mesh data and device-local models
//! - Image decoding and texture upload

pub mod error;
pub mod model;
pub mod texture;

pub use error::{ResourceError, ResourceResult};
pub use model::{Model, ModelData};
pub use texture::Texture;
