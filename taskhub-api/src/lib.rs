//! # Taskhub API Server
//!
//! REST backend for multi-tenant project and task management: JWT
//! authentication, role- and membership-based access control, and an
//! append-only audit history for every project and task mutation.
//!
//! ## Module Organization
//!
//! - `app`: Application state, router, auth middleware
//! - `config`: Environment-driven configuration
//! - `error`: Unified API error type and HTTP mapping
//! - `routes`: HTTP handlers and request DTOs
//! - `services`: Domain services (auth, users, projects, tasks)

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
