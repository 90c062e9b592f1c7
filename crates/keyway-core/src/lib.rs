//! Core library for the Keyway console.
//!
//! Holds everything the access gateway and the typed API client share:
//!
//! - [`config`]: process-wide [`ConsoleConfig`] loaded once at startup
//! - [`models`]: the stable domain shapes the console consumes
//! - [`derived`]: pure helpers computing grouping, staleness, and plan-limit
//!   state over already-translated vaults
//!
//! Nothing here performs I/O.

pub mod config;
pub mod derived;
pub mod error;
pub mod models;

pub use config::{source_origin, ConsoleConfig, Integrations, PostHogConfig};
pub use error::{ConfigError, UnknownVariant};
