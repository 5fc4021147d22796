// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token validation.
//!
//! `jsonwebtoken` only checks the signature here. Claim checks are done by
//! hand on the decoded JSON object so each failure maps to a precise
//! [`AuthError`] and the time window is inclusive at both ends:
//!
//! ```text
//! nbf - leeway <= now <= exp + leeway
//! ```
//!
//! Check order: header, signature, audience, required claims, expiry,
//! not-before, roles shape.

use chrono::Utc;
use jsonwebtoken::{decode, Validation};
use serde_json::{Map, Value};

use super::certificate::SigningCertificate;
use super::claims::TokenClaims;
use super::error::AuthError;

/// Default clock skew tolerance (60 seconds).
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

const BEARER_PREFIX: &str = "Bearer ";

type ClaimMap = Map<String, Value>;

/// Validates platform tokens against an expected audience.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    audience: String,
    leeway_secs: u64,
}

impl TokenValidator {
    pub fn new(audience: impl Into<String>, leeway_secs: u64) -> Self {
        Self {
            audience: audience.into(),
            leeway_secs,
        }
    }

    pub fn leeway_secs(&self) -> u64 {
        self.leeway_secs
    }

    /// Validate the raw `Authorization` header value against `key`.
    pub fn validate(
        &self,
        authorization: Option<&str>,
        key: &SigningCertificate,
    ) -> Result<TokenClaims, AuthError> {
        self.validate_at(authorization, key, Utc::now().timestamp())
    }

    /// Same as [`validate`](Self::validate) with an explicit current time.
    pub fn validate_at(
        &self,
        authorization: Option<&str>,
        key: &SigningCertificate,
        now: i64,
    ) -> Result<TokenClaims, AuthError> {
        let header = match authorization {
            Some(h) if !h.is_empty() => h,
            _ => return Err(AuthError::MissingHeader),
        };
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::MalformedHeader)?;

        let claims = verify_signature(token, key)?;
        self.check_claims(&claims, now)
    }

    fn check_claims(&self, claims: &ClaimMap, now: i64) -> Result<TokenClaims, AuthError> {
        if !audience_matches(claims.get("aud"), &self.audience) {
            return Err(AuthError::AudienceMismatch);
        }

        let subject = subject(claims)?;
        let email = optional_string(claims, "email")?;
        let full_name = optional_string(claims, "full_name")?;
        if !claims.contains_key("roles") {
            return Err(AuthError::MissingClaim("roles"));
        }
        let expires_at = timestamp(claims, "exp")?;
        let not_before = timestamp(claims, "nbf")?;

        let leeway = i64::try_from(self.leeway_secs).unwrap_or(i64::MAX);
        if expires_at.saturating_add(leeway) < now {
            return Err(AuthError::ExpiredToken);
        }
        if not_before.saturating_sub(leeway) > now {
            return Err(AuthError::NotYetValid);
        }

        let roles = role_list(&claims["roles"])?;

        Ok(TokenClaims {
            subject,
            email,
            full_name,
            roles,
            expires_at,
            not_before,
        })
    }
}

/// Decode the token, checking only the signature and algorithm.
fn verify_signature(token: &str, key: &SigningCertificate) -> Result<ClaimMap, AuthError> {
    let algorithms = key.algorithms();
    let mut validation = Validation::new(algorithms[0]);
    validation.algorithms = algorithms.to_vec();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<ClaimMap>(token, key.decoding_key(), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token failed signature verification");
            AuthError::InvalidSignature
        })
}

/// A string `aud` must match exactly; an array must contain the audience.
fn audience_matches(aud: Option<&Value>, expected: &str) -> bool {
    match aud {
        Some(Value::String(s)) => s == expected,
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(expected)),
        _ => false,
    }
}

/// `sub` must be present. `null` becomes an empty username and other
/// scalars their JSON text.
fn subject(claims: &ClaimMap) -> Result<String, AuthError> {
    match claims.get("sub") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) => Ok(String::new()),
        Some(other) => Ok(other.to_string()),
        None => Err(AuthError::MissingClaim("sub")),
    }
}

/// Claim must be present; `null` is allowed.
fn optional_string(claims: &ClaimMap, name: &'static str) -> Result<Option<String>, AuthError> {
    match claims.get(name) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) => Ok(None),
        _ => Err(AuthError::MissingClaim(name)),
    }
}

fn timestamp(claims: &ClaimMap, name: &'static str) -> Result<i64, AuthError> {
    claims
        .get(name)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.floor() as i64)))
        .ok_or(AuthError::MissingClaim(name))
}

fn role_list(value: &Value) -> Result<Vec<String>, AuthError> {
    let Value::Array(items) = value else {
        return Err(AuthError::InvalidRolesClaim);
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(AuthError::InvalidRolesClaim)
        })
        .collect()
}
