//! Azure Resource Manager access
//!
//! REST plumbing shared by the NetApp and resource group operations.

pub mod client;
pub mod poller;

pub use client::*;
pub use poller::*;
