// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Reasons a bearer token is rejected.
///
/// Every variant maps to the same `403 Forbidden` response. The specific
/// reason is only ever logged server side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingHeader,
    /// Header is not of the form `Bearer <token>`
    MalformedHeader,
    /// Token could not be parsed or its signature does not verify
    InvalidSignature,
    /// Token expired (beyond leeway)
    ExpiredToken,
    /// Token is not valid yet (beyond leeway)
    NotYetValid,
    /// `aud` does not match the configured audience
    AudienceMismatch,
    /// A required claim is absent or unusable
    MissingClaim(&'static str),
    /// `roles` is not a list of strings
    InvalidRolesClaim,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    error_code: &'static str,
}

impl AuthError {
    /// Get the error code for this error (for logs).
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_header",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::ExpiredToken => "expired_token",
            AuthError::NotYetValid => "not_yet_valid",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::MissingClaim(_) => "missing_claim",
            AuthError::InvalidRolesClaim => "invalid_roles_claim",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingHeader => write!(f, "Authorization header is required"),
            AuthError::MalformedHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::InvalidSignature => write!(f, "Token is malformed or its signature is invalid"),
            AuthError::ExpiredToken => write!(f, "Token has expired"),
            AuthError::NotYetValid => write!(f, "Token is not yet valid"),
            AuthError::AudienceMismatch => write!(f, "Token audience is invalid"),
            AuthError::MissingClaim(claim) => write!(f, "Token is missing the '{claim}' claim"),
            AuthError::InvalidRolesClaim => write!(f, "Token 'roles' claim must be a list of strings"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Reason stays in the logs; the client only learns it was forbidden.
        let body = Json(AuthErrorBody {
            error: "Forbidden",
            error_code: "forbidden",
        });
        (self.status_code(), body).into_response()
    }
}

/// The signing key could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum KeyLoadError {
    #[error("failed to read signing key {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("signing key {path} is not a supported PEM public key")]
    Unparsable { path: PathBuf },
}

/// The session layer refused to record a login.
#[derive(Debug, thiserror::Error)]
#[error("session layer refused to log in user '{username}': {reason}")]
pub struct SessionLoginError {
    pub username: String,
    pub reason: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn every_kind_returns_403_without_detail() {
        let kinds = [
            AuthError::MissingHeader,
            AuthError::MalformedHeader,
            AuthError::InvalidSignature,
            AuthError::ExpiredToken,
            AuthError::NotYetValid,
            AuthError::AudienceMismatch,
            AuthError::MissingClaim("sub"),
            AuthError::InvalidRolesClaim,
        ];

        for kind in kinds {
            let response = kind.into_response();
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert!(response.headers().get("www-authenticate").is_none());

            let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
            assert_eq!(body["error_code"], "forbidden");
        }
    }

    #[test]
    fn display_names_missing_claim() {
        assert_eq!(
            AuthError::MissingClaim("email").to_string(),
            "Token is missing the 'email' claim"
        );
        assert_eq!(AuthError::MissingClaim("email").error_code(), "missing_claim");
    }
}
