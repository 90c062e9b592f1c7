//! Access telemetry: `/v1/security/overview`.

use chrono::{DateTime, Utc};
use keyway_core::models::{SecurityAlert, SecurityOverview};
use reqwest::Method;
use serde::Deserialize;

use crate::error::ApiError;
use crate::transport::ApiClient;
use crate::translate::{non_empty, Translate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecurityOverviewWire {
    #[serde(default)]
    access_count: u64,
    #[serde(default)]
    unique_users: u32,
    #[serde(default)]
    last_access_at: Option<DateTime<Utc>>,
    #[serde(default)]
    alerts: Vec<SecurityAlertWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecurityAlertWire {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    message: String,
    #[serde(default)]
    vault_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl Translate for SecurityOverviewWire {
    type Output = SecurityOverview;

    fn translate(self) -> Result<SecurityOverview, ApiError> {
        let mut alerts: Vec<SecurityAlert> = self
            .alerts
            .into_iter()
            .map(|a| SecurityAlert {
                id: a.id,
                kind: a.kind,
                message: a.message,
                vault: non_empty(a.vault_name),
                created_at: a.created_at,
            })
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(SecurityOverview {
            total_accesses: self.access_count,
            unique_accessors: self.unique_users,
            last_access_at: self.last_access_at,
            alerts,
        })
    }
}

/// Security telemetry lookups.
#[derive(Debug, Clone, Copy)]
pub struct SecurityApi<'a> {
    api: &'a ApiClient,
}

impl<'a> SecurityApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /v1/security/overview`; alerts are returned newest first.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn overview(&self) -> Result<SecurityOverview, ApiError> {
        self.api
            .fetch::<SecurityOverviewWire>(Method::GET, "/v1/security/overview", "security overview")
            .await?
            .translate()
    }
}
