//! Value Object Module

pub mod credentials;
pub mod permission;
pub mod remember_token;
pub mod signing_secret;
pub mod user_password;
pub mod user_status;
