//! Mastering CLI Library
//!
//! Configuration loading for the `mastering-cli` binary.
//!
//! This library exposes the configuration types for testing purposes.

pub mod config;
pub mod error;

pub use config::{MasteringConfig, RendererSettings};
pub use error::{ConfigError, Result};
