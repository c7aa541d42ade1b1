//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Opaque token generation from a fixed 64-symbol alphabet
//! - Constant-time comparison
//! - Password hashing (Argon2id) and password policy
//! - Cookie management
//! - Injectable clock for deterministic expiry logic

pub mod clock;
pub mod cookie;
pub mod crypto;
pub mod password;
