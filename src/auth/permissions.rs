// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission bootstrapping.
//!
//! Grants a fixed table of view permissions to named roles. Purely additive
//! and safe to repeat. Permissions whose view is not installed (for example
//! the database user views when only remote-user auth is enabled) are
//! skipped.
//!
//! At startup the gate first installs [`APP_PERMISSION_VIEWS`], the views
//! the application exposes behind it, then applies [`DEFAULT_GRANTS`].

use crate::directory::{PermissionRepository, RepositoryResult, RoleRepository, UserRepository};

/// One `(view, permission, role)` grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGrant {
    pub view: &'static str,
    pub permission: &'static str,
    pub role: &'static str,
}

const fn grant(view: &'static str, permission: &'static str, role: &'static str) -> PermissionGrant {
    PermissionGrant {
        view,
        permission,
        role,
    }
}

/// Grants applied at startup.
pub const DEFAULT_GRANTS: &[PermissionGrant] = &[
    // Users may view and edit their own profile.
    grant("UserDBModelView", "can_userinfo", "User"),
    grant("UserDBModelView", "can_userinfo", "Op"),
    grant("UserDBModelView", "can_userinfo", "Viewer"),
    grant("UserDBModelView", "userinfoedit", "User"),
    grant("UserDBModelView", "userinfoedit", "Op"),
    grant("UserDBModelView", "userinfoedit", "Viewer"),
    grant("UserRemoteUserModelView", "can_userinfo", "User"),
    grant("UserRemoteUserModelView", "can_userinfo", "Op"),
    grant("UserRemoteUserModelView", "can_userinfo", "Viewer"),
    grant("UserRemoteUserModelView", "userinfoedit", "User"),
    grant("UserRemoteUserModelView", "userinfoedit", "Op"),
    grant("UserRemoteUserModelView", "userinfoedit", "Viewer"),
    grant("UserInfoEditView", "can_this_form_get", "User"),
    grant("UserInfoEditView", "can_this_form_get", "Op"),
    grant("UserInfoEditView", "can_this_form_get", "Viewer"),
    grant("UserInfoEditView", "can_this_form_post", "User"),
    grant("UserInfoEditView", "can_this_form_post", "Op"),
    grant("UserInfoEditView", "can_this_form_post", "Viewer"),
    // Marking runs as succeeded or failed.
    grant("Airflow", "can_dagrun_success", "User"),
    grant("Airflow", "can_dagrun_success", "Op"),
    grant("Airflow", "can_dagrun_failed", "User"),
    grant("Airflow", "can_dagrun_failed", "Op"),
    grant("Airflow", "can_failed", "User"),
    grant("Airflow", "can_failed", "Op"),
    grant("VariableModelView", "varexport", "Op"),
];

/// `(permission, view)` pairs exposed behind the gate.
///
/// Only the remote-user views: the database user views belong to password
/// login, which the gate replaces.
pub const APP_PERMISSION_VIEWS: &[(&str, &str)] = &[
    ("can_userinfo", "UserRemoteUserModelView"),
    ("userinfoedit", "UserRemoteUserModelView"),
    ("can_this_form_get", "UserInfoEditView"),
    ("can_this_form_post", "UserInfoEditView"),
    ("can_dagrun_success", "Airflow"),
    ("can_dagrun_failed", "Airflow"),
    ("can_failed", "Airflow"),
    ("varexport", "VariableModelView"),
];

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub granted: usize,
    pub skipped: usize,
}

/// Apply `grants` and commit.
pub fn bootstrap_permissions<R>(repo: &mut R, grants: &[PermissionGrant]) -> RepositoryResult<BootstrapReport>
where
    R: PermissionRepository + RoleRepository + UserRepository + ?Sized,
{
    let mut report = BootstrapReport::default();

    for grant in grants {
        let Some(permission) = repo.find_permission_view(grant.permission, grant.view)? else {
            tracing::debug!(
                view = grant.view,
                permission = grant.permission,
                "Permission view not installed, skipping"
            );
            report.skipped += 1;
            continue;
        };

        let role = repo.find_role(grant.role)?;
        repo.add_permission_role(&role, &permission)?;
        report.granted += 1;
    }

    repo.commit()?;

    tracing::info!(
        granted = report.granted,
        skipped = report.skipped,
        "Bootstrapped role permissions"
    );
    Ok(report)
}

/// Install `views` and commit. Returns how many were not installed before.
pub fn install_permission_views<R>(repo: &mut R, views: &[(&str, &str)]) -> RepositoryResult<usize>
where
    R: PermissionRepository + UserRepository + ?Sized,
{
    let mut added = 0;
    for (permission, view) in views {
        if repo.find_permission_view(permission, view)?.is_none() {
            repo.add_permission_view(permission, view)?;
            added += 1;
        }
    }
    repo.commit()?;

    tracing::debug!(added, total = views.len(), "Installed permission views");
    Ok(added)
}

/// Install the application's views, then apply [`DEFAULT_GRANTS`].
pub fn bootstrap_app_permissions<R>(repo: &mut R) -> RepositoryResult<BootstrapReport>
where
    R: PermissionRepository + RoleRepository + UserRepository + ?Sized,
{
    install_permission_views(repo, APP_PERMISSION_VIEWS)?;
    bootstrap_permissions(repo, DEFAULT_GRANTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{InMemoryDirectory, PermissionView};
    use crate::storage::{FileDirectory, StoragePaths};
    use tempfile::TempDir;

    #[test]
    fn grants_installed_permissions_and_skips_missing() {
        let mut dir = InMemoryDirectory::new();
        install_permission_views(
            &mut dir,
            &[
                ("can_userinfo", "UserRemoteUserModelView"),
                ("varexport", "VariableModelView"),
            ],
        )
        .unwrap();

        let report = bootstrap_permissions(&mut dir, DEFAULT_GRANTS).unwrap();

        assert_eq!(report.granted, 4);
        assert_eq!(report.skipped, DEFAULT_GRANTS.len() - 4);

        let userinfo = PermissionView::new("can_userinfo", "UserRemoteUserModelView");
        let varexport = PermissionView::new("varexport", "VariableModelView");
        for role in ["User", "Op", "Viewer"] {
            assert!(dir.role_permissions(role).contains(&userinfo), "{role}");
        }
        assert!(dir.role_permissions("Op").contains(&varexport));
        assert!(!dir.role_permissions("User").contains(&varexport));
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let mut dir = InMemoryDirectory::new();
        install_permission_views(&mut dir, &[("can_failed", "Airflow")]).unwrap();

        bootstrap_permissions(&mut dir, DEFAULT_GRANTS).unwrap();
        let first = dir.committed().clone();
        bootstrap_permissions(&mut dir, DEFAULT_GRANTS).unwrap();

        assert_eq!(dir.committed(), &first);
        assert_eq!(dir.role_permissions("Op").len(), 1);
    }

    #[test]
    fn nothing_installed_grants_nothing() {
        let mut dir = InMemoryDirectory::new();
        let report = bootstrap_permissions(&mut dir, DEFAULT_GRANTS).unwrap();
        assert_eq!(report.granted, 0);
        assert!(dir.committed().grants.is_empty());
    }

    #[test]
    fn fresh_store_gets_app_grants() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp_dir.path());

        {
            let mut dir = FileDirectory::open(paths.clone()).unwrap();
            let report = bootstrap_app_permissions(&mut dir).unwrap();
            assert_eq!(report.granted, 19);
            // Only the database user views are missing.
            assert_eq!(report.skipped, 6);
        }

        let dir = FileDirectory::open(paths).unwrap();
        let userinfo = dir
            .find_permission_view("can_userinfo", "UserRemoteUserModelView")
            .unwrap()
            .unwrap();
        assert!(dir
            .find_permission_view("can_userinfo", "UserDBModelView")
            .unwrap()
            .is_none());

        let mut memory = InMemoryDirectory::new();
        bootstrap_app_permissions(&mut memory).unwrap();
        for role in ["User", "Op", "Viewer"] {
            assert!(memory.role_permissions(role).contains(&userinfo), "{role}");
        }
        assert_eq!(memory.role_permissions("Op").len(), 8);
        assert_eq!(memory.role_permissions("User").len(), 7);
        assert_eq!(memory.role_permissions("Viewer").len(), 4);
    }

    #[test]
    fn installing_views_is_idempotent() {
        let mut dir = InMemoryDirectory::new();
        assert_eq!(install_permission_views(&mut dir, APP_PERMISSION_VIEWS).unwrap(), 8);
        assert_eq!(install_permission_views(&mut dir, APP_PERMISSION_VIEWS).unwrap(), 0);
        assert_eq!(dir.committed().permission_views.len(), 8);
    }
}
