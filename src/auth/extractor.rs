// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! The gate middleware attaches an [`AuthenticatedUser`] to every request it
//! lets through. API handlers take it with `Auth`:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! Unlike the gate, which answers `403`, an anonymous API request gets
//! `401 Unauthorized` with a `WWW-Authenticate: Basic` challenge.

use axum::{
    extract::FromRequestParts,
    http::{header::WWW_AUTHENTICATE, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use super::AuthenticatedUser;

/// Extractor for authenticated users.
#[derive(Debug, Clone)]
pub struct Auth(pub AuthenticatedUser);

/// Rejection for requests that reached a handler without a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
        response
    }
}

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or(Unauthorized)
    }
}
