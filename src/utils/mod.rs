//! Utility functions module
//!
//! Retry logic, HTTP client construction, output formatting and
//! interactive prompts.

pub mod format;
pub mod interactive;
pub mod network;
pub mod retry;

pub use format::*;
pub use interactive::*;
pub use network::*;
pub use retry::*;
