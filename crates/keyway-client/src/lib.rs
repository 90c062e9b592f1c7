//! Typed client for the Keyway API.
//!
//! A shared [`ApiClient`] performs credentialed transport and error
//! normalization; per-domain wrappers translate the backend's camelCase wire
//! shapes into the stable models of [`keyway_core::models`].
//!
//! # Example
//!
//! ```rust,no_run
//! use keyway_client::KeywayClient;
//! use keyway_core::{derived, ConsoleConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConsoleConfig::from_env()?;
//! let client = KeywayClient::from_env(&config)?;
//!
//! let me = client.users().me().await?;
//! let vaults = client.vaults().list().await?;
//! let limited = derived::count_plan_limited(&vaults);
//! let groups = derived::group_vaults(vaults, &me.login);
//! # let _ = (limited, groups);
//! # Ok(())
//! # }
//! ```

mod collaborators;
mod error;
mod orgs;
mod secrets;
mod security;
mod translate;
mod transport;
mod users;
mod vaults;

pub use collaborators::CollaboratorsApi;
pub use error::ApiError;
pub use orgs::OrgsApi;
pub use secrets::SecretsApi;
pub use security::SecurityApi;
pub use transport::{ApiClient, Credentials, Payload, DEFAULT_TIMEOUT};
pub use users::UsersApi;
pub use vaults::VaultsApi;

pub use reqwest::Method;

use std::time::Duration;

use keyway_core::ConsoleConfig;

/// Entry point bundling the transport with the per-domain wrappers.
#[derive(Debug, Clone)]
pub struct KeywayClient {
    api: ApiClient,
}

impl KeywayClient {
    /// Create a client against the configured backend origin.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn new(config: &ConsoleConfig, credentials: Credentials) -> Result<Self, ApiError> {
        Self::with_timeout(config, credentials, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn with_timeout(
        config: &ConsoleConfig,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(config.api_base_url(), credentials, timeout)?;
        Ok(Self { api })
    }

    /// Create a client whose credentials and timeout come from the environment.
    ///
    /// - `KEYWAY_TOKEN`: bearer token (anonymous if unset)
    /// - `KEYWAY_API_TIMEOUT_SECS`: request timeout (default: `10`)
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if `KEYWAY_API_TIMEOUT_SECS` is not a number.
    pub fn from_env(config: &ConsoleConfig) -> Result<Self, ApiError> {
        let credentials = std::env::var("KEYWAY_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map_or(Credentials::Anonymous, Credentials::Bearer);

        let timeout = match std::env::var("KEYWAY_API_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map(Duration::from_secs).map_err(|_| {
                ApiError::Config(format!("KEYWAY_API_TIMEOUT_SECS must be whole seconds, got '{raw}'"))
            })?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        Self::with_timeout(config, credentials, timeout)
    }

    /// The underlying transport.
    pub fn transport(&self) -> &ApiClient {
        &self.api
    }

    /// Vault endpoints.
    pub fn vaults(&self) -> VaultsApi<'_> {
        VaultsApi::new(&self.api)
    }

    /// Secret endpoints of one vault.
    pub fn secrets<'a>(&'a self, owner: &'a str, repo: &'a str) -> SecretsApi<'a> {
        SecretsApi::new(&self.api, owner, repo)
    }

    /// Organization endpoints.
    pub fn orgs(&self) -> OrgsApi<'_> {
        OrgsApi::new(&self.api)
    }

    /// Repository contributor endpoints.
    pub fn collaborators(&self) -> CollaboratorsApi<'_> {
        CollaboratorsApi::new(&self.api)
    }

    /// Current-user endpoints.
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(&self.api)
    }

    /// Security telemetry endpoints.
    pub fn security(&self) -> SecurityApi<'_> {
        SecurityApi::new(&self.api)
    }
}
