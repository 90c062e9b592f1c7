//! Secret endpoints: `/v1/vaults/{owner}/{repo}/secrets`, including trash.

use chrono::{DateTime, Utc};
use keyway_core::models::{NewSecret, Secret, SecretUpdate, SecretValue, TrashedSecret};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::transport::{segment, ApiClient};
use crate::translate::{non_empty, Translate};
use crate::vaults::vault_path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecretWire {
    id: String,
    name: String,
    environment: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    last_modified_by: Option<String>,
}

impl Translate for SecretWire {
    type Output = Secret;

    fn translate(self) -> Result<Secret, ApiError> {
        Ok(Secret {
            id: self.id,
            name: self.name,
            environment: self.environment,
            created_at: self.created_at.unwrap_or(self.updated_at),
            updated_at: self.updated_at,
            last_modified_by: non_empty(self.last_modified_by),
        })
    }
}

#[derive(Deserialize)]
struct SecretValueWire {
    value: String,
}

impl Translate for SecretValueWire {
    type Output = SecretValue;

    fn translate(self) -> Result<SecretValue, ApiError> {
        Ok(SecretValue { value: self.value })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrashedSecretWire {
    id: String,
    name: String,
    environment: String,
    deleted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Translate for TrashedSecretWire {
    type Output = TrashedSecret;

    fn translate(self) -> Result<TrashedSecret, ApiError> {
        if self.expires_at < self.deleted_at {
            return Err(ApiError::translation(
                "trashed secret",
                format!("secret {} expires before it was deleted", self.id),
            ));
        }

        Ok(TrashedSecret {
            id: self.id,
            name: self.name,
            environment: self.environment,
            deleted_at: self.deleted_at,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Serialize)]
struct CreateSecretBody<'a> {
    name: &'a str,
    value: &'a str,
    environment: &'a str,
}

#[derive(Serialize)]
struct UpdateSecretBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment: Option<&'a str>,
}

/// Secret operations scoped to one vault.
#[derive(Debug, Clone, Copy)]
pub struct SecretsApi<'a> {
    api: &'a ApiClient,
    owner: &'a str,
    repo: &'a str,
}

impl<'a> SecretsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient, owner: &'a str, repo: &'a str) -> Self {
        Self { api, owner, repo }
    }

    fn base(&self) -> String {
        format!("{}/secrets", vault_path(self.owner, self.repo))
    }

    /// `GET .../secrets`, optionally filtered to one environment.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn list(&self, environment: Option<&str>) -> Result<Vec<Secret>, ApiError> {
        let path = match environment {
            Some(env) => format!("{}?environment={}", self.base(), segment(env)),
            None => self.base(),
        };
        self.api
            .fetch::<Vec<SecretWire>>(Method::GET, &path, "secret list")
            .await?
            .translate()
    }

    /// `POST .../secrets`.
    ///
    /// # Errors
    ///
    /// `Rejected` with status 409 if the name already exists in the environment.
    pub async fn create(&self, secret: &NewSecret) -> Result<Secret, ApiError> {
        let body = CreateSecretBody {
            name: &secret.name,
            value: &secret.value,
            environment: &secret.environment,
        };
        self.api
            .fetch_with::<SecretWire, _>(Method::POST, &self.base(), &body, "secret")
            .await?
            .translate()
    }

    /// `PATCH .../secrets/{id}`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the update changes nothing (nothing is sent),
    /// otherwise any [`ApiError`].
    pub async fn update(&self, id: &str, update: &SecretUpdate) -> Result<Secret, ApiError> {
        if update.name.is_none() && update.value.is_none() && update.environment.is_none() {
            return Err(ApiError::InvalidInput(
                "secret update has no changes".to_owned(),
            ));
        }

        let body = UpdateSecretBody {
            name: update.name.as_deref(),
            value: update.value.as_deref(),
            environment: update.environment.as_deref(),
        };
        let path = format!("{}/{}", self.base(), segment(id));
        self.api
            .fetch_with::<SecretWire, _>(Method::PATCH, &path, &body, "secret")
            .await?
            .translate()
    }

    /// `GET .../secrets/{id}/value`: reveal one value.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn reveal(&self, id: &str) -> Result<SecretValue, ApiError> {
        let path = format!("{}/{}/value", self.base(), segment(id));
        self.api
            .fetch::<SecretValueWire>(Method::GET, &path, "secret value")
            .await?
            .translate()
    }

    /// `DELETE .../secrets/{id}`: move a secret to the trash.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("{}/{}", self.base(), segment(id));
        self.api.send(Method::DELETE, &path).await.map(drop)
    }

    /// `GET .../secrets/trash`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn trash(&self) -> Result<Vec<TrashedSecret>, ApiError> {
        let path = format!("{}/trash", self.base());
        self.api
            .fetch::<Vec<TrashedSecretWire>>(Method::GET, &path, "trash list")
            .await?
            .translate()
    }

    /// `POST .../secrets/trash/{id}/restore`.
    ///
    /// # Errors
    ///
    /// `Rejected` with status 409 if a live secret now holds the name.
    pub async fn restore(&self, id: &str) -> Result<Secret, ApiError> {
        let path = format!("{}/trash/{}/restore", self.base(), segment(id));
        self.api
            .fetch::<SecretWire>(Method::POST, &path, "restored secret")
            .await?
            .translate()
    }

    /// `DELETE .../secrets/trash/{id}`: delete permanently.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn purge(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("{}/trash/{}", self.base(), segment(id));
        self.api.send(Method::DELETE, &path).await.map(drop)
    }

    /// `DELETE .../secrets/trash`: empty the trash.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn empty_trash(&self) -> Result<(), ApiError> {
        let path = format!("{}/trash", self.base());
        self.api.send(Method::DELETE, &path).await.map(drop)
    }
}
