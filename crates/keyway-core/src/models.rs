//! Console domain models.
//!
//! These are the stable shapes the console consumes after the API client has
//! translated the backend's wire format. Field names are snake_case and every
//! optional wire field has already been resolved to an explicit default, so
//! downstream code never re-validates.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::UnknownVariant;

// ── Enumerations ─────────────────────────────────────────────────────

/// Access level the current user holds on a vault's repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Permission {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownVariant::new("permission", other)),
        }
    }
}

/// Why a vault is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadonlyReason {
    /// The owner's plan no longer covers this private vault.
    PlanLimitExceeded,
    /// Any other reason reported by the backend, kept verbatim.
    Other(String),
}

impl ReadonlyReason {
    /// Wire sentinel for [`ReadonlyReason::PlanLimitExceeded`].
    pub const PLAN_LIMIT_EXCEEDED: &'static str = "plan_limit_exceeded";

    /// Map a wire value onto a reason.
    pub fn from_wire(value: &str) -> Self {
        if value == Self::PLAN_LIMIT_EXCEEDED {
            Self::PlanLimitExceeded
        } else {
            Self::Other(value.to_owned())
        }
    }
}

/// Billing plan of a user or organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
    Team,
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
            Self::Team => write!(f, "team"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "team" => Ok(Self::Team),
            other => Err(UnknownVariant::new("plan", other)),
        }
    }
}

/// Role of a user inside a GitHub organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
}

impl OrgRole {
    /// Whether this role may change organization settings.
    pub const fn can_manage(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl std::str::FromStr for OrgRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(UnknownVariant::new("organization role", other)),
        }
    }
}

// ── Users ────────────────────────────────────────────────────────────

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: String,
    /// GitHub login; the key personal vaults are grouped under.
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub plan: Plan,
}

// ── Vaults ───────────────────────────────────────────────────────────

/// The GitHub repository a vault belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl Repository {
    /// `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A link between a vault and an external provider project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultSync {
    /// Provider identifier, e.g. `vercel`.
    pub provider: String,
    pub project_id: String,
    pub project_name: Option<String>,
    /// `None` if the sync has never run.
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// A secrets vault attached to one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vault {
    pub id: String,
    pub repository: Repository,
    pub permission: Permission,
    pub environments: Vec<String>,
    pub secret_count: u32,
    pub is_private: bool,
    /// Always `true` when `readonly_reason` is set.
    pub is_read_only: bool,
    pub readonly_reason: Option<ReadonlyReason>,
    pub syncs: Vec<VaultSync>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vault {
    /// Whether secrets in this vault may be created or edited.
    pub fn can_write(&self) -> bool {
        !self.is_read_only && matches!(self.permission, Permission::Write | Permission::Admin)
    }

    /// Whether destructive vault actions (deleting the vault) are offered.
    /// Only repository admins ever see them.
    pub fn can_delete(&self) -> bool {
        self.permission == Permission::Admin
    }

    /// Whether the vault is read-only because of the plan limit.
    pub fn is_plan_limited(&self) -> bool {
        self.is_read_only && self.readonly_reason == Some(ReadonlyReason::PlanLimitExceeded)
    }
}

/// Vaults sharing one repository owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultGroup {
    /// Lowercased owner login; unique across groups.
    pub owner_key: String,
    /// Owner login as first seen.
    pub owner: String,
    pub avatar_url: Option<String>,
    pub vaults: Vec<Vault>,
}

// ── Secrets ──────────────────────────────────────────────────────────

/// Secret metadata. Values are only returned by an explicit reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Secret {
    pub id: String,
    pub name: String,
    pub environment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_modified_by: Option<String>,
}

/// A revealed secret value.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SecretValue {
    pub value: String,
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretValue")
            .field("value", &"[redacted]")
            .finish()
    }
}

/// Input for creating a secret.
#[derive(Clone, PartialEq, Eq)]
pub struct NewSecret {
    pub name: String,
    pub value: String,
    pub environment: String,
}

impl std::fmt::Debug for NewSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewSecret")
            .field("name", &self.name)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// Partial update of a secret. `None` fields are left unchanged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretUpdate {
    pub name: Option<String>,
    pub value: Option<String>,
    pub environment: Option<String>,
}

impl std::fmt::Debug for SecretUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretUpdate")
            .field("name", &self.name)
            .field("value", &self.value.as_ref().map(|_| "[redacted]"))
            .field("environment", &self.environment)
            .finish()
    }
}

/// A deleted secret awaiting permanent removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrashedSecret {
    pub id: String,
    pub name: String,
    pub environment: String,
    pub deleted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TrashedSecret {
    /// Whole days left before permanent deletion, never negative.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).max(Duration::zero()).num_days()
    }
}

// ── Organizations ────────────────────────────────────────────────────

/// A connected GitHub organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub id: String,
    pub login: String,
    /// Falls back to `login` when the backend has no display name.
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub plan: Plan,
    pub role: OrgRole,
    pub vault_count: u32,
    pub member_count: u32,
}

/// Organization with its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationDetail {
    pub organization: Organization,
    pub default_permission: Permission,
    pub created_at: DateTime<Utc>,
    pub members_synced_at: Option<DateTime<Utc>>,
}

/// Settings change for an organization. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgSettingsUpdate {
    pub display_name: Option<String>,
    pub default_permission: Option<Permission>,
}

/// A member of a connected organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgMember {
    pub id: String,
    pub login: String,
    pub avatar_url: Option<String>,
    pub role: OrgRole,
    pub joined_at: Option<DateTime<Utc>>,
}

/// Outcome of re-syncing members from GitHub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberSyncResult {
    pub added: u32,
    pub updated: u32,
    pub removed: u32,
}

/// A GitHub organization the user belongs to, connectable to Keyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableOrg {
    pub login: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub user_role: OrgRole,
    pub already_connected: bool,
}

// ── Collaborators ────────────────────────────────────────────────────

/// A contributor to a vault's repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collaborator {
    pub login: String,
    pub avatar_url: Option<String>,
    pub profile_url: Option<String>,
    pub contributions: u32,
}

// ── Security ─────────────────────────────────────────────────────────

/// Access telemetry summary for the current user's vaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityOverview {
    pub total_accesses: u64,
    pub unique_accessors: u32,
    pub last_access_at: Option<DateTime<Utc>>,
    pub alerts: Vec<SecurityAlert>,
}

/// A security event worth surfacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityAlert {
    pub id: String,
    /// Backend alert type, e.g. `new_device`.
    pub kind: String,
    pub message: String,
    pub vault: Option<String>,
    pub created_at: DateTime<Utc>,
}
