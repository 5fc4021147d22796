// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate middleware for Axum.
//!
//! Runs before every request:
//!
//! 1. The health-check path passes straight through.
//! 2. A request carrying a live session cookie passes through as that user.
//! 3. Otherwise the signing key is refreshed (skipped for static assets), the
//!    bearer token validated, the user provisioned from its claims and a
//!    session recorded.
//!
//! Any validation failure aborts the request with `403 Forbidden`.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), authenticate));
//! ```

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;

use super::certificate::CertificateLoader;
use super::claims::TokenClaims;
use super::error::{AuthError, KeyLoadError, SessionLoginError};
use super::roles::{reconcile, RoleManagementScope};
use super::session::{SessionLogin, SessionStore};
use super::validator::TokenValidator;
use crate::config::SecurityConfig;
use crate::directory::{Directory, NewUser, RepositoryError, User};
use crate::error::ApiError;
use crate::state::AppState;

/// Why the gate could not let a request through.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("failed to provision user: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Session(#[from] SessionLoginError),
}

/// Per-request authentication and user provisioning.
pub struct AuthGate {
    loader: CertificateLoader,
    validator: TokenValidator,
    scope: RoleManagementScope,
    directory: Mutex<Box<dyn Directory>>,
    sessions: SessionStore,
    health_path: String,
    static_prefix: String,
}

impl AuthGate {
    pub fn new(
        loader: CertificateLoader,
        validator: TokenValidator,
        scope: RoleManagementScope,
        directory: Box<dyn Directory>,
    ) -> Self {
        Self {
            loader,
            validator,
            scope,
            directory: Mutex::new(directory),
            sessions: SessionStore::new(),
            health_path: "/health".to_string(),
            static_prefix: "/static/".to_string(),
        }
    }

    /// Build the gate from configuration, loading the signing key.
    pub fn from_config(
        config: &SecurityConfig,
        directory: Box<dyn Directory>,
    ) -> Result<Self, KeyLoadError> {
        let loader = CertificateLoader::from_path(&config.signing_cert_path)?;
        let validator = TokenValidator::new(&config.allowed_audience, config.validity_leeway_secs);
        Ok(Self::new(loader, validator, config.roles_to_manage.clone(), directory)
            .with_paths(&config.health_path, &config.static_path_prefix))
    }

    /// Issue `Secure` session cookies, for deployments served over TLS.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.sessions = self.sessions.with_secure_cookies(secure);
        self
    }

    /// Override the health-check path and the static asset prefix.
    pub fn with_paths(mut self, health_path: &str, static_prefix: &str) -> Self {
        self.health_path = health_path.to_string();
        self.static_prefix = static_prefix.to_string();
        self
    }

    pub fn loader(&self) -> &CertificateLoader {
        &self.loader
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    pub fn static_prefix(&self) -> &str {
        &self.static_prefix
    }

    /// Validate the token for a request to `path` and log the user in.
    pub async fn authenticate_request(
        &self,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<SessionLogin, GateError> {
        let key = if path.starts_with(&self.static_prefix) {
            self.loader.cached()
        } else {
            self.loader.current_key().unwrap_or_else(|e| {
                tracing::error!(error = %e, "Signing key reload failed, keeping previous key");
                self.loader.cached()
            })
        };

        let claims = self.validator.validate(authorization, &key)?;
        let user = self.provision(&claims).await?;

        let leeway = i64::try_from(self.validator.leeway_secs()).unwrap_or(i64::MAX);
        let login = self
            .sessions
            .login(&user, claims.expires_at.saturating_add(leeway))
            .await?;
        Ok(login)
    }

    /// Create or update the local user for `claims` and commit.
    async fn provision(&self, claims: &TokenClaims) -> Result<User, RepositoryError> {
        let mut directory = self.directory.lock().await;
        let result = self.provision_locked(&mut **directory, claims);
        if result.is_err() {
            directory.rollback();
        }
        result
    }

    fn provision_locked(
        &self,
        directory: &mut dyn Directory,
        claims: &TokenClaims,
    ) -> Result<User, RepositoryError> {
        let email = claims.email.clone().unwrap_or_default();

        let user = match directory.find_user(&claims.subject)? {
            None => {
                tracing::info!(username = %claims.subject, email = %email, "Creating user from JWT");
                let roles = claims
                    .role_names()
                    .iter()
                    .map(|name| directory.find_role(name))
                    .collect::<Result<Vec<_>, _>>()?;
                directory.create_user(NewUser {
                    username: claims.subject.clone(),
                    first_name: claims.display_name(),
                    email,
                    roles,
                })?
            }
            Some(mut user) => {
                tracing::info!(username = %claims.subject, email = %email, "Updating user from JWT");
                user.username = claims.subject.clone();
                user.first_name = claims.display_name();
                user.last_name.clear();
                user.active = true;
                let changes = reconcile(&mut user, &claims.role_names(), &self.scope, &mut *directory)?;
                if !changes.is_empty() {
                    tracing::info!(
                        username = %user.username,
                        added = ?changes.added,
                        removed = ?changes.removed,
                        "Reconciled user roles"
                    );
                }
                user
            }
        };

        directory.add(&user)?;
        directory.commit()?;
        Ok(user)
    }
}

/// Authentication middleware function.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let gate = &state.gate;
    let path = request.uri().path().to_string();

    if path == gate.health_path() {
        return next.run(request).await;
    }

    if let Some(user) = gate.sessions().current(request.headers()).await {
        request.extensions_mut().insert(user);
        return next.run(request).await;
    }

    let authorization = match request.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(s) => Some(s.to_string()),
            Err(_) => return reject(&path, AuthError::MalformedHeader),
        },
    };

    match gate.authenticate_request(&path, authorization.as_deref()).await {
        Ok(login) => {
            request.extensions_mut().insert(login.user.clone());
            let mut response = next.run(request).await;
            response.headers_mut().append(SET_COOKIE, login.cookie());
            response
        }
        Err(GateError::Auth(e)) => reject(&path, e),
        Err(GateError::Repository(e)) => {
            tracing::error!(path = %path, error = %e, "User provisioning failed");
            ApiError::internal("Internal server error").into_response()
        }
        Err(GateError::Session(e)) => {
            // The user was just provisioned as active; a refusal here means
            // the session layer and the directory disagree.
            tracing::error!(path = %path, error = %e, "Session login refused");
            panic!("{e}");
        }
    }
}

fn reject(path: &str, error: AuthError) -> Response {
    tracing::warn!(
        path = %path,
        reason = error.error_code(),
        detail = %error,
        "Rejected unauthenticated request"
    );
    error.into_response()
}
