// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role reconciliation.
//!
//! After reconciling, a user's roles are exactly:
//!
//! ```text
//! (current roles outside the scope) ∪ (claimed roles)
//! ```
//!
//! The scope only bounds what may be removed. With
//! [`RoleManagementScope::All`] every role is inside the scope, so the result
//! is just the claimed set.

use std::collections::BTreeSet;

use crate::directory::{RepositoryResult, RoleRepository, User};

/// Which roles this integration may add or remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RoleManagementScope {
    /// Every role on file
    #[default]
    All,
    /// Only these role names may be removed; others on a user are left alone
    Only(BTreeSet<String>),
}

impl RoleManagementScope {
    /// `None` or an empty set means all roles.
    pub fn from_names<I, S>(names: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names
            .into_iter()
            .flatten()
            .map(Into::into)
            .collect();
        if names.is_empty() {
            RoleManagementScope::All
        } else {
            RoleManagementScope::Only(names)
        }
    }

    /// Whether `role` may be removed from a user.
    pub fn contains(&self, role: &str) -> bool {
        match self {
            RoleManagementScope::All => true,
            RoleManagementScope::Only(names) => names.contains(role),
        }
    }
}

/// What a reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChanges {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl RoleChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Bring `user`'s roles in line with `claimed` within `scope`.
///
/// Mutates the user in place; the caller persists it. Roles to attach are
/// looked up (or created) through `roles`.
pub fn reconcile<R>(
    user: &mut User,
    claimed: &BTreeSet<String>,
    scope: &RoleManagementScope,
    roles: &mut R,
) -> RepositoryResult<RoleChanges>
where
    R: RoleRepository + ?Sized,
{
    let mut desired = claimed.clone();
    let mut changes = RoleChanges::default();

    // Walk a snapshot; the live list shrinks as roles are detached.
    let current = user.roles.clone();
    for role in &current {
        if scope.contains(&role.name) && !claimed.contains(&role.name) {
            user.roles.retain(|r| r.name != role.name);
            changes.removed.insert(role.name.clone());
        } else {
            desired.remove(&role.name);
        }
    }

    for name in desired {
        user.roles.push(roles.find_role(&name)?);
        changes.added.insert(name);
    }

    Ok(changes)
}
