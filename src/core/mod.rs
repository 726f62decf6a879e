//! Core types, errors, configuration and utilities

pub mod types;
pub mod error;
pub mod logging;
pub mod config;
pub mod camera;

pub use types::*;
pub use error::Error;
pub use config::{EngineConfig, RenderConfig};
pub use camera::Camera;
