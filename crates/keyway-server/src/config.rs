//! Server configuration for the Keyway console.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The shared [`ConsoleConfig`] is loaded here too so the gateway and any
//! API client built by the server see the same backend origin.

use std::net::SocketAddr;
use std::path::PathBuf;

use keyway_core::{ConfigError, ConsoleConfig};

/// Login page path; also the target of authentication redirects.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Cookie the backend sets after a successful sign-in.
pub const DEFAULT_SESSION_COOKIE: &str = "keyway_logged_in";

/// Paths reachable without a session. The login page loads its scripts,
/// styles and icon from the built asset directory, so those stay public.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/auth/callback",
    "/healthz",
    "/assets",
    "/favicon.ico",
];

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Directory holding the built console (`index.html` + assets).
    pub static_dir: PathBuf,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Gateway routing rules.
    pub gateway: GatewaySettings,
    /// Backend origin and integrations, shared with the API client.
    pub console: ConsoleConfig,
}

/// Routing rules enforced by the access gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    pub login_path: String,
    pub session_cookie: String,
    pub public_paths: Vec<String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_owned(),
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| (*p).to_owned()).collect(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on (binds to `0.0.0.0`)
    /// - `KEYWAY_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:3000`)
    /// - `KEYWAY_STATIC_DIR`: built console directory (default: `./dist`)
    /// - `KEYWAY_LOG_LEVEL`: log filter (default: `info`)
    /// - everything read by [`ConsoleConfig::from_env`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an unparsable bind address or port,
    /// or a malformed `KEYWAY_API_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Priority: KEYWAY_BIND_ADDR > PORT > default 127.0.0.1:3000
        let bind_addr = if let Some(addr) = lookup("KEYWAY_BIND_ADDR") {
            addr.parse().map_err(|e| ConfigError::Invalid {
                var: "KEYWAY_BIND_ADDR",
                reason: format!("{e}"),
            })?
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: format!("{e}"),
            })?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 3000))
        };

        let static_dir = lookup("KEYWAY_STATIC_DIR")
            .map_or_else(|| PathBuf::from("./dist"), PathBuf::from);

        let log_level = lookup("KEYWAY_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let console = ConsoleConfig::from_lookup(&lookup)?;

        Ok(Self {
            bind_addr,
            static_dir,
            log_level,
            gateway: GatewaySettings::default(),
            console,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.static_dir, PathBuf::from("./dist"));
        assert_eq!(config.gateway, GatewaySettings::default());
    }

    #[test]
    fn port_binds_all_interfaces() {
        let config = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "8080".to_owned()))
            .unwrap();
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "http".to_owned()));
        assert!(result.is_err());
    }
}
