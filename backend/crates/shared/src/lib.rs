//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the vocabulary every domain crate agrees on:
//! - Common error types and result aliases
//! - Typed ID wrappers
//! - The request principal (`CurrentUser`) and its `Role`
//! - The `{ "success": true }` response envelope
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod principal;
pub mod response;
