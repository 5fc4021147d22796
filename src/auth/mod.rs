// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! JWT authentication in front of the web application.
//!
//! ## Auth Flow
//!
//! 1. An upstream identity provider signs a JWT and the client sends
//!    `Authorization: Bearer <JWT>`
//! 2. The gate:
//!    - Reloads the signing key if the PEM file changed on disk
//!    - Verifies signature, audience, required claims and the validity window
//!    - Creates or updates the local user from the claims
//!    - Reconciles the user's roles and records a login session
//!
//! ## Security
//!
//! - All requests except the health check require a token or a live session
//! - Every rejection is a bare `403`; the reason is only logged
//! - Clock skew tolerance defaults to 60 seconds

pub mod certificate;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod validator;

pub use certificate::{CertificateLoader, SigningCertificate};
pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::{AuthError, KeyLoadError, SessionLoginError};
pub use extractor::Auth;
pub use middleware::{authenticate, AuthGate, GateError};
pub use permissions::{
    bootstrap_app_permissions, bootstrap_permissions, install_permission_views, BootstrapReport,
    PermissionGrant, APP_PERMISSION_VIEWS, DEFAULT_GRANTS,
};
pub use roles::{reconcile, RoleChanges, RoleManagementScope};
pub use session::{SessionStore, SESSION_COOKIE};
pub use validator::{TokenValidator, DEFAULT_LEEWAY_SECS};
