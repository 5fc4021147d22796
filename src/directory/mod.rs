// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Directory
//!
//! Records the gate reads and writes (users, roles, permission grants) and
//! the repository traits it consumes them through. Two backends implement
//! the traits:
//!
//! - [`InMemoryDirectory`] for tests and ephemeral deployments
//! - [`FileDirectory`](crate::storage::FileDirectory) persisting to `DATA_DIR`
//!
//! Writes are staged until `commit()`; only committed state survives.

pub mod memory;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

pub use memory::InMemoryDirectory;

/// Named permission grouping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Local user record provisioned from token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub first_name: String,
    /// Always empty for users provisioned by the gate
    pub last_name: String,
    pub email: String,
    pub active: bool,
    pub roles: Vec<Role>,
}

impl User {
    /// Active user with no roles and an empty last name.
    pub fn new(
        username: impl Into<String>,
        first_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            first_name: first_name.into(),
            last_name: String::new(),
            email: email.into(),
            active: true,
            roles: Vec::new(),
        }
    }

    pub fn role_names(&self) -> BTreeSet<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }
}

/// Fields for a user that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub email: String,
    pub roles: Vec<Role>,
}

/// A permission on a view, e.g. `can_userinfo` on `UserDBModelView`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionView {
    pub permission: String,
    pub view: String,
}

impl PermissionView {
    pub fn new(permission: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
            view: view.into(),
        }
    }
}

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// User persistence.
pub trait UserRepository {
    fn find_user(&self, username: &str) -> RepositoryResult<Option<User>>;

    /// Build a user record. Nothing is stored until `add` + `commit`.
    fn create_user(&mut self, fields: NewUser) -> RepositoryResult<User>;

    /// Stage an insert or update of `user`.
    fn add(&mut self, user: &User) -> RepositoryResult<()>;

    /// Make all staged changes durable.
    fn commit(&mut self) -> RepositoryResult<()>;

    /// Discard all staged changes.
    fn rollback(&mut self);
}

/// Role persistence.
pub trait RoleRepository {
    /// Find a role by name, creating it if it does not exist yet.
    fn find_role(&mut self, name: &str) -> RepositoryResult<Role>;
}

/// Permission-to-role grants.
pub trait PermissionRepository {
    /// `None` when the view or permission is not installed.
    fn find_permission_view(&self, permission: &str, view: &str)
        -> RepositoryResult<Option<PermissionView>>;

    /// Stage `permission` on `view` as installed. No-op if it already is.
    fn add_permission_view(&mut self, permission: &str, view: &str)
        -> RepositoryResult<PermissionView>;

    fn add_permission_role(&mut self, role: &Role, permission: &PermissionView)
        -> RepositoryResult<()>;
}

/// Everything the gate needs from a backend.
pub trait Directory: UserRepository + RoleRepository + PermissionRepository + Send + Sync {}

impl<T> Directory for T where T: UserRepository + RoleRepository + PermissionRepository + Send + Sync {}

/// Complete directory contents, shared by both backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub users: BTreeMap<String, User>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub permission_views: BTreeSet<PermissionView>,
    #[serde(default)]
    pub grants: BTreeMap<String, BTreeSet<PermissionView>>,
}
