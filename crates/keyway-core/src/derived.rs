//! Derived vault state.
//!
//! Pure functions over already-translated [`Vault`]s: ownership grouping,
//! plan-limit counting, and sync staleness. No network access.

use std::collections::HashMap;

use crate::models::{ReadonlyReason, Vault, VaultGroup, VaultSync};

/// Partition vaults by repository owner, case-insensitively.
///
/// Vaults keep their input order within a group and each group keeps the
/// owner spelling of its first vault. The group owned by `current_user` comes
/// first; the rest are sorted alphabetically, ignoring case.
pub fn group_vaults<I>(vaults: I, current_user: &str) -> Vec<VaultGroup>
where
    I: IntoIterator<Item = Vault>,
{
    let mut groups: Vec<VaultGroup> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for vault in vaults {
        let owner_key = vault.repository.owner.to_lowercase();
        let slot = *slots.entry(owner_key.clone()).or_insert_with(|| {
            groups.push(VaultGroup {
                owner_key,
                owner: vault.repository.owner.clone(),
                avatar_url: None,
                vaults: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        if group.avatar_url.is_none() {
            group.avatar_url.clone_from(&vault.repository.avatar_url);
        }
        group.vaults.push(vault);
    }

    let personal_key = current_user.to_lowercase();
    groups.sort_by(|a, b| {
        let a_personal = a.owner_key == personal_key;
        let b_personal = b.owner_key == personal_key;
        b_personal
            .cmp(&a_personal)
            .then_with(|| a.owner_key.cmp(&b.owner_key))
    });

    groups
}

/// Number of vaults that are read-only because of the plan limit.
///
/// Vaults that are read-only for any other reason are not counted.
pub fn count_plan_limited(vaults: &[Vault]) -> usize {
    vaults.iter().filter(|v| v.is_plan_limited()).count()
}

/// Whether `sync` is behind `vault`.
///
/// A sync that never ran is stale, as is one whose last run is not strictly
/// after the vault's last update.
pub fn is_sync_stale(vault: &Vault, sync: &VaultSync) -> bool {
    sync.last_synced_at
        .is_none_or(|synced_at| synced_at <= vault.updated_at)
}

/// Whether any of the vault's syncs is stale. `false` for unsynced vaults.
pub fn has_stale_sync(vault: &Vault) -> bool {
    vault.syncs.iter().any(|sync| is_sync_stale(vault, sync))
}

/// The single warning shown on a vault card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultWarning {
    /// Secrets changed since at least one provider sync.
    StaleSync,
    /// Read-only because the owner's plan limit is exceeded.
    PlanLimit,
    /// Read-only for some other reason.
    ReadOnly,
}

impl VaultWarning {
    /// User-facing warning text.
    pub const fn message(self) -> &'static str {
        match self {
            Self::StaleSync => "Secrets changed since the last sync",
            Self::PlanLimit => "Read-only: plan limit exceeded. Upgrade to edit secrets.",
            Self::ReadOnly => "This vault is read-only",
        }
    }
}

/// Pick the warning to display for `vault`, if any.
///
/// A stale sync outranks the read-only warning.
pub fn vault_warning(vault: &Vault) -> Option<VaultWarning> {
    if has_stale_sync(vault) {
        return Some(VaultWarning::StaleSync);
    }

    if !vault.is_read_only {
        return None;
    }

    match vault.readonly_reason {
        Some(ReadonlyReason::PlanLimitExceeded) => Some(VaultWarning::PlanLimit),
        _ => Some(VaultWarning::ReadOnly),
    }
}
