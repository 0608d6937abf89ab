//! netapp-deleter - Azure NetApp Files bulk teardown
//!
//! Enumerates every NetApp account in a subscription and deletes each one
//! children first (backups, volumes, capacity pools and backup vaults, the
//! account, then its emptied resource group), several accounts at a time.

pub mod arm;
pub mod auth;
pub mod cli;
pub mod config;
pub mod deleter;
pub mod error;
pub mod netapp;
pub mod utils;

// Re-export commonly used types
pub use error::{NetappDeleterError, Result};
