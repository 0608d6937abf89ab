//! Configuration management module
//!
//! This module handles configuration loading and validation from
//! command-line arguments, environment variables, a TOML configuration
//! file, and default values.

pub mod settings;

pub use settings::*;
