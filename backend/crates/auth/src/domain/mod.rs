//! Domain Layer
//!
//! Contains entities, value objects, collaborator traits and the tenant
//! permission evaluator.

pub mod authorization;
pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use authorization::TenantPermissionEvaluator;
pub use entity::{tenant_membership::TenantMembership, user::User};
pub use repository::{SessionStore, TenantContext, UserProvider};
