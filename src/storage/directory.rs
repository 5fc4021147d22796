// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed directory.
//!
//! Holds the directory in memory and rewrites `directory.json` on every
//! commit. Staged changes that are never committed are lost on restart.

use crate::directory::{
    DirectorySnapshot, InMemoryDirectory, NewUser, PermissionRepository, PermissionView,
    RepositoryResult, Role, RoleRepository, User, UserRepository,
};

use super::{JsonStorage, StoragePaths, StorageResult};

#[derive(Debug)]
pub struct FileDirectory {
    storage: JsonStorage,
    inner: InMemoryDirectory,
}

impl FileDirectory {
    /// Open the directory under `paths`, starting empty if no file exists.
    pub fn open(paths: StoragePaths) -> StorageResult<Self> {
        let mut storage = JsonStorage::new(paths);
        storage.initialize()?;

        let file = storage.paths().directory_file();
        let snapshot: DirectorySnapshot = if storage.exists(&file) {
            storage.read_json(&file)?
        } else {
            DirectorySnapshot::default()
        };

        tracing::info!(
            path = %file.display(),
            users = snapshot.users.len(),
            "Opened user directory"
        );

        Ok(Self {
            storage,
            inner: InMemoryDirectory::from_snapshot(snapshot),
        })
    }

}

impl UserRepository for FileDirectory {
    fn find_user(&self, username: &str) -> RepositoryResult<Option<User>> {
        self.inner.find_user(username)
    }

    fn create_user(&mut self, fields: NewUser) -> RepositoryResult<User> {
        self.inner.create_user(fields)
    }

    fn add(&mut self, user: &User) -> RepositoryResult<()> {
        self.inner.add(user)
    }

    fn commit(&mut self) -> RepositoryResult<()> {
        let path = self.storage.paths().directory_file();
        if let Err(e) = self.storage.write_json(&path, self.inner.working()) {
            self.inner.rollback();
            return Err(e.into());
        }
        self.inner.commit()
    }

    fn rollback(&mut self) {
        self.inner.rollback()
    }
}

impl RoleRepository for FileDirectory {
    fn find_role(&mut self, name: &str) -> RepositoryResult<Role> {
        self.inner.find_role(name)
    }
}

impl PermissionRepository for FileDirectory {
    fn find_permission_view(
        &self,
        permission: &str,
        view: &str,
    ) -> RepositoryResult<Option<PermissionView>> {
        self.inner.find_permission_view(permission, view)
    }

    fn add_permission_view(&mut self, permission: &str, view: &str) -> RepositoryResult<PermissionView> {
        self.inner.add_permission_view(permission, view)
    }

    fn add_permission_role(
        &mut self,
        role: &Role,
        permission: &PermissionView,
    ) -> RepositoryResult<()> {
        self.inner.add_permission_role(role, permission)
    }
}
