//! Authentication module for Azure services
//!
//! Credential providers built on azure_identity and the subscription
//! session used by every ARM call.

pub mod provider;
pub mod session;

pub use provider::*;
pub use session::*;
