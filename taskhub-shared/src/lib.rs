//! # Taskhub Shared Library
//!
//! This crate contains the types and business rules shared between the
//! Taskhub API server and any future transports (RPC, CLI).
//!
//! ## Module Organization
//!
//! - `models`: Database models, membership rows, and change history
//! - `auth`: Password hashing, JWT tokens, and access policy
//! - `db`: Connection pool and migrations
//! - `email`: Outbound transactional email
//! - `pagination`: Paginated result envelope

pub mod auth;
pub mod db;
pub mod email;
pub mod models;
pub mod pagination;

/// Current version of the Taskhub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
