//! Vault endpoints: `/v1/vaults`.

use chrono::{DateTime, Utc};
use keyway_core::models::{Permission, ReadonlyReason, Repository, Vault, VaultSync};
use reqwest::Method;
use serde::Deserialize;

use crate::error::ApiError;
use crate::transport::{segment, ApiClient};
use crate::translate::{non_empty, parse_enum, split_full_name, Translate};

/// Vault wire shape shared by the list and detail endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VaultWire {
    id: String,
    repo_full_name: String,
    #[serde(default)]
    repo_avatar: Option<String>,
    permission: String,
    #[serde(default)]
    environments: Vec<String>,
    #[serde(default)]
    secret_count: u32,
    #[serde(default)]
    is_private: bool,
    #[serde(default)]
    is_read_only: bool,
    #[serde(default)]
    readonly_reason: Option<String>,
    #[serde(default)]
    syncs: Vec<SyncWire>,
    /// Omitted by the list endpoint.
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SyncWire {
    provider: String,
    project_id: String,
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    last_synced_at: Option<DateTime<Utc>>,
}

impl Translate for VaultWire {
    type Output = Vault;

    fn translate(self) -> Result<Vault, ApiError> {
        let (owner, name) = split_full_name("vault", &self.repo_full_name)?;
        let readonly_reason = non_empty(self.readonly_reason).map(|r| ReadonlyReason::from_wire(&r));

        Ok(Vault {
            repository: Repository {
                owner: owner.to_owned(),
                name: name.to_owned(),
                avatar_url: non_empty(self.repo_avatar),
            },
            permission: parse_enum::<Permission>("vault", &self.permission)?,
            environments: self.environments,
            secret_count: self.secret_count,
            is_private: self.is_private,
            is_read_only: self.is_read_only || readonly_reason.is_some(),
            readonly_reason,
            syncs: self.syncs.into_iter().map(SyncWire::into_domain).collect(),
            created_at: self.created_at.unwrap_or(self.updated_at),
            updated_at: self.updated_at,
            id: self.id,
        })
    }
}

impl SyncWire {
    fn into_domain(self) -> VaultSync {
        VaultSync {
            provider: self.provider,
            project_id: self.project_id,
            project_name: non_empty(self.project_name),
            last_synced_at: self.last_synced_at,
        }
    }
}

/// Vault operations.
#[derive(Debug, Clone, Copy)]
pub struct VaultsApi<'a> {
    api: &'a ApiClient,
}

impl<'a> VaultsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /v1/vaults`: every vault visible to the caller.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`]; `Translation` if a vault does not match the wire shape.
    pub async fn list(&self) -> Result<Vec<Vault>, ApiError> {
        self.api
            .fetch::<Vec<VaultWire>>(Method::GET, "/v1/vaults", "vault list")
            .await?
            .translate()
    }

    /// `GET /v1/vaults/{owner}/{repo}`.
    ///
    /// # Errors
    ///
    /// `Rejected` with status 404 if the vault does not exist.
    pub async fn get(&self, owner: &str, repo: &str) -> Result<Vault, ApiError> {
        self.api
            .fetch::<VaultWire>(Method::GET, &vault_path(owner, repo), "vault")
            .await?
            .translate()
    }

    /// `DELETE /v1/vaults/{owner}/{repo}`. Requires admin permission.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn delete(&self, owner: &str, repo: &str) -> Result<(), ApiError> {
        self.api
            .send(Method::DELETE, &vault_path(owner, repo))
            .await
            .map(drop)
    }
}

pub(crate) fn vault_path(owner: &str, repo: &str) -> String {
    format!("/v1/vaults/{}/{}", segment(owner), segment(repo))
}
