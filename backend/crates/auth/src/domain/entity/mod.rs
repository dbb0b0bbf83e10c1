//! Entity Module

pub mod tenant_membership;
pub mod user;
