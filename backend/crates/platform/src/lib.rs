//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Cryptographic utilities (SHA-256, HMAC, Base64, signed tokens)
//! - Password hashing (Argon2id, NIST SP 800-63B policy)
//! - Cookie management and client fingerprinting
//! - Outbound mail
//! - Image type detection for uploads

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod mail;
pub mod media;
pub mod password;
