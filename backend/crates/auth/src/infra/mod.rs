//! Infrastructure Layer
//!
//! Collaborator implementations that need no external service.

pub mod memory;

pub use memory::{InMemoryUserProvider, MemorySession, StaticTenantContext};
