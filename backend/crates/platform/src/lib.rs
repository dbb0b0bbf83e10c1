//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, base64url, random tokens)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Failed-attempt throttling with temporary lockout
//! - Injectable time source

pub mod clock;
pub mod crypto;
pub mod password;
pub mod rate_limit;
