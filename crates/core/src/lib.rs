//! Core utilities for the Glimmer renderer.
//!
//! This crate provides foundational pieces used across the workspace:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing

mod error;
mod logging;
mod timer;

pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::Timer;
