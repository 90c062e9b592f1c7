//! Keyway console server library.
//!
//! Exposes the access gateway, the security header set, configuration, and
//! the router so they can be used by `main.rs` and by integration tests.

pub mod config;
pub mod error;
pub mod gateway;
pub mod headers;
pub mod routes;
