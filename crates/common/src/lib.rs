//! Shared building blocks for the storefront workspace.
//! - Wire names (storage keys, event name, request carriers) and payload types.
//! - Tracing subscriber initialisation.
//! - Runtime environment checks.

pub mod types;
pub mod utils;
pub mod env;
