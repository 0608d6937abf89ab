//! CLI module for netapp-deleter
//!
//! Argument parsing and the top-level command flow.

pub mod commands;

pub use commands::*;
