// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory directory.
//!
//! Keeps a working copy that staged writes go to and a committed copy that
//! `commit()` publishes. Lookups read the working copy.

use std::collections::BTreeSet;

use super::{
    DirectorySnapshot, NewUser, PermissionRepository, PermissionView, RepositoryResult, Role,
    RoleRepository, User, UserRepository,
};

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    working: DirectorySnapshot,
    committed: DirectorySnapshot,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously committed contents.
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            working: snapshot.clone(),
            committed: snapshot,
        }
    }

    /// Staged contents, including uncommitted changes.
    pub fn working(&self) -> &DirectorySnapshot {
        &self.working
    }

    /// Contents as of the last commit.
    pub fn committed(&self) -> &DirectorySnapshot {
        &self.committed
    }

    /// Committed permissions granted to `role`.
    pub fn role_permissions(&self, role: &str) -> BTreeSet<PermissionView> {
        self.committed.grants.get(role).cloned().unwrap_or_default()
    }
}

impl UserRepository for InMemoryDirectory {
    fn find_user(&self, username: &str) -> RepositoryResult<Option<User>> {
        Ok(self.working.users.get(username).cloned())
    }

    fn create_user(&mut self, fields: NewUser) -> RepositoryResult<User> {
        let mut user = User::new(fields.username, fields.first_name, fields.email);
        user.roles = fields.roles;
        Ok(user)
    }

    fn add(&mut self, user: &User) -> RepositoryResult<()> {
        for role in &user.roles {
            self.working.roles.insert(role.name.clone());
        }
        self.working.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn commit(&mut self) -> RepositoryResult<()> {
        self.committed = self.working.clone();
        Ok(())
    }

    fn rollback(&mut self) {
        self.working = self.committed.clone();
    }
}

impl RoleRepository for InMemoryDirectory {
    fn find_role(&mut self, name: &str) -> RepositoryResult<Role> {
        self.working.roles.insert(name.to_string());
        Ok(Role::new(name))
    }
}

impl PermissionRepository for InMemoryDirectory {
    fn find_permission_view(
        &self,
        permission: &str,
        view: &str,
    ) -> RepositoryResult<Option<PermissionView>> {
        let wanted = PermissionView::new(permission, view);
        Ok(self.working.permission_views.get(&wanted).cloned())
    }

    fn add_permission_view(&mut self, permission: &str, view: &str) -> RepositoryResult<PermissionView> {
        let pv = PermissionView::new(permission, view);
        self.working.permission_views.insert(pv.clone());
        Ok(pv)
    }

    fn add_permission_role(
        &mut self,
        role: &Role,
        permission: &PermissionView,
    ) -> RepositoryResult<()> {
        self.working.roles.insert(role.name.clone());
        self.working
            .grants
            .entry(role.name.clone())
            .or_default()
            .insert(permission.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_user_is_visible_before_commit_but_not_committed() {
        let mut dir = InMemoryDirectory::new();
        let user = User::new("alice", "Alice", "alice@example.com");
        dir.add(&user).unwrap();

        assert_eq!(dir.find_user("alice").unwrap(), Some(user.clone()));
        assert!(dir.committed().users.get("alice").is_none());

        dir.commit().unwrap();
        assert_eq!(dir.committed().users.get("alice"), Some(&user));
    }

    #[test]
    fn uncommitted_permission_views_are_rolled_back() {
        let mut dir = InMemoryDirectory::new();
        dir.add_permission_view("varexport", "VariableModelView").unwrap();
        dir.rollback();
        assert!(dir
            .find_permission_view("varexport", "VariableModelView")
            .unwrap()
            .is_none());
    }

    #[test]
    fn rollback_discards_staged_changes() {
        let mut dir = InMemoryDirectory::new();
        dir.add(&User::new("bob", "Bob", "bob@example.com")).unwrap();
        dir.rollback();
        assert!(dir.find_user("bob").unwrap().is_none());
    }

    #[test]
    fn create_user_is_not_stored_until_added() {
        let mut dir = InMemoryDirectory::new();
        let role = dir.find_role("Op").unwrap();
        let user = dir
            .create_user(NewUser {
                username: "carol".to_string(),
                first_name: "Carol".to_string(),
                email: "carol@example.com".to_string(),
                roles: vec![role],
            })
            .unwrap();

        assert!(user.active);
        assert_eq!(user.last_name, "");
        assert!(dir.find_user("carol").unwrap().is_none());
    }

    #[test]
    fn permission_views_must_be_registered() {
        let mut dir = InMemoryDirectory::new();
        assert!(dir
            .find_permission_view("can_userinfo", "UserDBModelView")
            .unwrap()
            .is_none());

        let installed = dir
            .add_permission_view("can_userinfo", "UserDBModelView")
            .unwrap();
        let pv = dir
            .find_permission_view("can_userinfo", "UserDBModelView")
            .unwrap()
            .unwrap();
        assert_eq!(pv, installed);

        dir.add_permission_role(&Role::new("User"), &pv).unwrap();
        dir.commit().unwrap();
        assert!(dir.role_permissions("User").contains(&pv));
        assert!(dir.committed().permission_views.contains(&pv));
    }
}
