//! The signed-in user: `/v1/users/me`.

use keyway_core::models::{CurrentUser, Plan};
use reqwest::Method;
use serde::Deserialize;

use crate::error::ApiError;
use crate::transport::ApiClient;
use crate::translate::{non_empty, parse_enum, Translate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserWire {
    id: String,
    github_login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    plan: String,
}

impl Translate for UserWire {
    type Output = CurrentUser;

    fn translate(self) -> Result<CurrentUser, ApiError> {
        Ok(CurrentUser {
            plan: parse_enum::<Plan>("current user", &self.plan)?,
            id: self.id,
            login: self.github_login,
            name: non_empty(self.name),
            avatar_url: non_empty(self.avatar_url),
        })
    }
}

/// Current-user operations.
#[derive(Debug, Clone, Copy)]
pub struct UsersApi<'a> {
    api: &'a ApiClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /v1/users/me`.
    ///
    /// # Errors
    ///
    /// `Rejected` with status 401 when the session has expired.
    pub async fn me(&self) -> Result<CurrentUser, ApiError> {
        self.api
            .fetch::<UserWire>(Method::GET, "/v1/users/me", "current user")
            .await?
            .translate()
    }
}
