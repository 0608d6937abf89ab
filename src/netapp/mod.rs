//! NetApp resource module
//!
//! Resource identifiers, the account hierarchy, and the ARM operations
//! used to enumerate and delete it.

pub mod models;
pub mod operations;

pub use models::*;
pub use operations::*;
