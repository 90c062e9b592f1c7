//! Process-wide console configuration.
//!
//! A single [`ConsoleConfig`] is built at startup and handed to both the
//! access gateway (for the Content-Security-Policy) and the API client (for
//! the backend origin). Business logic never reads the environment directly.

use url::{Host, Url};

use crate::error::ConfigError;

/// Backend origin used when `KEYWAY_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.keyway.sh";

/// PostHog ingestion host used when only the project key is configured.
pub const DEFAULT_POSTHOG_HOST: &str = "https://us.i.posthog.com";

/// Immutable configuration shared by the gateway and the API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    api_url: Url,
    /// Optional third-party integrations. Each one is active only when its
    /// identifying value is present.
    pub integrations: Integrations,
}

/// Optional browser integrations that widen the CSP when enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Integrations {
    /// Product analytics (enabled by `KEYWAY_POSTHOG_KEY`).
    pub posthog: Option<PostHogConfig>,
    /// Error reporting DSN (`KEYWAY_SENTRY_DSN`).
    pub sentry_dsn: Option<String>,
    /// Support chat widget (`KEYWAY_CRISP_WEBSITE_ID`).
    pub crisp_website_id: Option<String>,
}

/// PostHog project key and ingestion host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostHogConfig {
    pub key: String,
    pub host: String,
}

impl ConsoleConfig {
    /// Build a configuration for `api_url` with every integration disabled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `api_url` is not an absolute
    /// `http`/`https` URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            integrations: Integrations::default(),
        })
    }

    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `KEYWAY_API_URL`: backend origin (default: `https://api.keyway.sh`)
    /// - `KEYWAY_POSTHOG_KEY`, `KEYWAY_POSTHOG_HOST`: analytics
    /// - `KEYWAY_SENTRY_DSN`: error reporting
    /// - `KEYWAY_CRISP_WEBSITE_ID`: support chat
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `KEYWAY_API_URL` is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `KEYWAY_API_URL` is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = var("KEYWAY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        let posthog = match var("KEYWAY_POSTHOG_KEY") {
            Some(key) => {
                let raw = var("KEYWAY_POSTHOG_HOST")
                    .unwrap_or_else(|| DEFAULT_POSTHOG_HOST.to_owned());
                let host = source_origin(&raw).ok_or_else(|| ConfigError::Invalid {
                    var: "KEYWAY_POSTHOG_HOST",
                    reason: format!("expected an http(s) origin, got '{raw}'"),
                })?;
                Some(PostHogConfig { key, host })
            }
            None => None,
        };

        Ok(Self {
            api_url: parse_api_url(&api_url)?,
            integrations: Integrations {
                posthog,
                sentry_dsn: var("KEYWAY_SENTRY_DSN"),
                crisp_website_id: var("KEYWAY_CRISP_WEBSITE_ID"),
            },
        })
    }

    /// Replace the integration set.
    #[must_use]
    pub fn with_integrations(mut self, integrations: Integrations) -> Self {
        self.integrations = integrations;
        self
    }

    /// Base URL for API calls, without a trailing slash.
    pub fn api_base_url(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }

    /// Serialized origin of the backend (`scheme://host[:port]`).
    pub fn api_origin(&self) -> String {
        self.api_url.origin().ascii_serialization()
    }
}

/// Reduce `raw` to a `scheme://host[:port]` origin usable as a CSP source.
///
/// Only `http`/`https` URLs whose host is an IP address or a plain DNS name
/// (letters, digits, `-`, `.`) qualify; anything else yields `None`.
pub fn source_origin(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    match url.host()? {
        Host::Domain(name)
            if !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.') => {}
        Host::Domain(_) => return None,
        Host::Ipv4(_) | Host::Ipv6(_) => {}
    }

    Some(url.origin().ascii_serialization())
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        var: "KEYWAY_API_URL",
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid {
            var: "KEYWAY_API_URL",
            reason: format!("expected an http(s) origin, got '{raw}'"),
        });
    }

    Ok(url)
}
