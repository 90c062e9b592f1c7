//! Repository contributors: `/v1/vaults/{owner}/{repo}/contributors`.

use keyway_core::models::Collaborator;
use reqwest::Method;
use serde::Deserialize;

use crate::error::ApiError;
use crate::transport::ApiClient;
use crate::translate::{non_empty, Translate};
use crate::vaults::vault_path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollaboratorWire {
    login: String,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    contributions: u32,
}

impl Translate for CollaboratorWire {
    type Output = Collaborator;

    fn translate(self) -> Result<Collaborator, ApiError> {
        if self.login.is_empty() {
            return Err(ApiError::translation("collaborator", "empty login"));
        }

        Ok(Collaborator {
            login: self.login,
            avatar_url: non_empty(self.avatar_url),
            profile_url: non_empty(self.html_url),
            contributions: self.contributions,
        })
    }
}

/// Collaborator lookups.
#[derive(Debug, Clone, Copy)]
pub struct CollaboratorsApi<'a> {
    api: &'a ApiClient,
}

impl<'a> CollaboratorsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /v1/vaults/{owner}/{repo}/contributors`, most active first.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn list(&self, owner: &str, repo: &str) -> Result<Vec<Collaborator>, ApiError> {
        let path = format!("{}/contributors", vault_path(owner, repo));
        let mut collaborators = self
            .api
            .fetch::<Vec<CollaboratorWire>>(Method::GET, &path, "collaborator list")
            .await?
            .translate()?;
        collaborators.sort_by(|a, b| b.contributions.cmp(&a.contributions));
        Ok(collaborators)
    }
}
