//! Organization endpoints: `/v1/orgs` and `/v1/github/available-orgs`.

use chrono::{DateTime, Utc};
use keyway_core::models::{
    AvailableOrg, MemberSyncResult, OrgMember, OrgRole, OrgSettingsUpdate, Organization,
    OrganizationDetail, Permission, Plan,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::transport::{segment, ApiClient};
use crate::translate::{non_empty, parse_enum, Translate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrganizationWire {
    id: String,
    login: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    plan: String,
    role: String,
    #[serde(default)]
    vault_count: u32,
    #[serde(default)]
    member_count: u32,
}

impl Translate for OrganizationWire {
    type Output = Organization;

    fn translate(self) -> Result<Organization, ApiError> {
        Ok(Organization {
            plan: parse_enum::<Plan>("organization", &self.plan)?,
            role: parse_enum::<OrgRole>("organization", &self.role)?,
            display_name: non_empty(self.display_name).unwrap_or_else(|| self.login.clone()),
            avatar_url: non_empty(self.avatar_url),
            vault_count: self.vault_count,
            member_count: self.member_count,
            id: self.id,
            login: self.login,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrganizationDetailWire {
    #[serde(flatten)]
    organization: OrganizationWire,
    default_permission: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    members_synced_at: Option<DateTime<Utc>>,
}

impl Translate for OrganizationDetailWire {
    type Output = OrganizationDetail;

    fn translate(self) -> Result<OrganizationDetail, ApiError> {
        Ok(OrganizationDetail {
            default_permission: parse_enum::<Permission>(
                "organization detail",
                &self.default_permission,
            )?,
            organization: self.organization.translate()?,
            created_at: self.created_at,
            members_synced_at: self.members_synced_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrgMemberWire {
    id: String,
    login: String,
    #[serde(default)]
    avatar_url: Option<String>,
    role: String,
    #[serde(default)]
    joined_at: Option<DateTime<Utc>>,
}

impl Translate for OrgMemberWire {
    type Output = OrgMember;

    fn translate(self) -> Result<OrgMember, ApiError> {
        Ok(OrgMember {
            role: parse_enum::<OrgRole>("organization member", &self.role)?,
            id: self.id,
            login: self.login,
            avatar_url: non_empty(self.avatar_url),
            joined_at: self.joined_at,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MemberSyncWire {
    added: u32,
    updated: u32,
    removed: u32,
}

impl Translate for MemberSyncWire {
    type Output = MemberSyncResult;

    fn translate(self) -> Result<MemberSyncResult, ApiError> {
        Ok(MemberSyncResult {
            added: self.added,
            updated: self.updated,
            removed: self.removed,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AvailableOrgWire {
    login: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    user_role: String,
    #[serde(default)]
    already_connected: bool,
}

impl Translate for AvailableOrgWire {
    type Output = AvailableOrg;

    fn translate(self) -> Result<AvailableOrg, ApiError> {
        Ok(AvailableOrg {
            user_role: parse_enum::<OrgRole>("available organization", &self.user_role)?,
            display_name: non_empty(self.display_name).unwrap_or_else(|| self.login.clone()),
            avatar_url: non_empty(self.avatar_url),
            already_connected: self.already_connected,
            login: self.login,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOrgBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_permission: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectOrgBody<'a> {
    org_login: &'a str,
}

/// Organization operations.
#[derive(Debug, Clone, Copy)]
pub struct OrgsApi<'a> {
    api: &'a ApiClient,
}

impl<'a> OrgsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// `GET /v1/orgs`: organizations connected to Keyway.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn list(&self) -> Result<Vec<Organization>, ApiError> {
        self.api
            .fetch::<Vec<OrganizationWire>>(Method::GET, "/v1/orgs", "organization list")
            .await?
            .translate()
    }

    /// `GET /v1/orgs/{login}`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn get(&self, login: &str) -> Result<OrganizationDetail, ApiError> {
        self.api
            .fetch::<OrganizationDetailWire>(Method::GET, &org_path(login), "organization detail")
            .await?
            .translate()
    }

    /// `PUT /v1/orgs/{login}`: change organization settings.
    ///
    /// # Errors
    ///
    /// `Rejected` with status 403 unless the caller can manage the organization.
    pub async fn update(
        &self,
        login: &str,
        update: &OrgSettingsUpdate,
    ) -> Result<OrganizationDetail, ApiError> {
        let body = UpdateOrgBody {
            display_name: update.display_name.as_deref(),
            default_permission: update.default_permission.map(|p| p.to_string()),
        };
        self.api
            .fetch_with::<OrganizationDetailWire, _>(
                Method::PUT,
                &org_path(login),
                &body,
                "organization detail",
            )
            .await?
            .translate()
    }

    /// `GET /v1/orgs/{login}/members`.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn members(&self, login: &str) -> Result<Vec<OrgMember>, ApiError> {
        let path = format!("{}/members", org_path(login));
        self.api
            .fetch::<Vec<OrgMemberWire>>(Method::GET, &path, "organization members")
            .await?
            .translate()
    }

    /// `POST /v1/orgs/{login}/members/sync`: re-import members from GitHub.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn sync_members(&self, login: &str) -> Result<MemberSyncResult, ApiError> {
        let path = format!("{}/members/sync", org_path(login));
        self.api
            .fetch::<MemberSyncWire>(Method::POST, &path, "member sync")
            .await?
            .translate()
    }

    /// `GET /v1/github/available-orgs`: GitHub organizations the user could connect.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`].
    pub async fn available(&self) -> Result<Vec<AvailableOrg>, ApiError> {
        self.api
            .fetch::<Vec<AvailableOrgWire>>(
                Method::GET,
                "/v1/github/available-orgs",
                "available organizations",
            )
            .await?
            .translate()
    }

    /// `POST /v1/orgs/connect`.
    ///
    /// # Errors
    ///
    /// `Rejected` with status 409 if the organization is already connected.
    pub async fn connect(&self, org_login: &str) -> Result<Organization, ApiError> {
        let body = ConnectOrgBody { org_login };
        self.api
            .fetch_with::<OrganizationWire, _>(Method::POST, "/v1/orgs/connect", &body, "organization")
            .await?
            .translate()
    }
}

fn org_path(login: &str) -> String {
    format!("/v1/orgs/{}", segment(login))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn display_name_defaults_to_login() {
        let wire: OrganizationWire = serde_json::from_value(json!({
            "id": "o1",
            "login": "acme",
            "displayName": "",
            "plan": "team",
            "role": "owner"
        }))
        .unwrap();
        let org = wire.translate().unwrap();
        assert_eq!(org.display_name, "acme");
        assert_eq!(org.plan, Plan::Team);
        assert!(org.role.can_manage());
    }

    #[test]
    fn detail_flattens_organization_fields() {
        let wire: OrganizationDetailWire = serde_json::from_value(json!({
            "id": "o1",
            "login": "acme",
            "plan": "free",
            "role": "member",
            "memberCount": 12,
            "defaultPermission": "read",
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let detail = wire.translate().unwrap();
        assert_eq!(detail.organization.member_count, 12);
        assert_eq!(detail.default_permission, Permission::Read);
        assert_eq!(detail.members_synced_at, None);
    }

    #[test]
    fn unknown_plan_is_rejected() {
        let wire: OrganizationWire = serde_json::from_value(json!({
            "id": "o1",
            "login": "acme",
            "plan": "platinum",
            "role": "owner"
        }))
        .unwrap();
        assert!(matches!(wire.translate(), Err(ApiError::Translation { .. })));
    }

    #[test]
    fn update_body_serializes_permission_lowercase() {
        let body = UpdateOrgBody {
            display_name: None,
            default_permission: Some(Permission::Write.to_string()),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "defaultPermission": "write" })
        );
    }
}
