// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, AuthenticatedUser};
use crate::error::ApiError;

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// Local username (the token's `sub`)
    pub username: String,
    pub email: String,
    /// Role names currently attached to the user
    pub roles: Vec<String>,
}

impl From<AuthenticatedUser> for UserMeResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            username: user.username,
            email: user.email,
            roles: user.roles,
        }
    }
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "No authenticated user on the request"),
        (status = 403, description = "Missing or invalid token"),
    )
)]
pub async fn current_user(Auth(user): Auth) -> Json<UserMeResponse> {
    Json(user.into())
}

/// Landing page for users without access.
///
/// Always answers `403`; login redirects point here when remote-user
/// authentication is in use.
#[utoipa::path(
    get,
    path = "/access-denied",
    tag = "Users",
    responses(
        (status = 403, description = "Access denied"),
    )
)]
pub async fn access_denied() -> ApiError {
    ApiError::forbidden("Access denied")
}
