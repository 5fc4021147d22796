// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated user representation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::directory::User;

/// Claims extracted from a verified platform token.
///
/// Built by [`TokenValidator`](super::TokenValidator) only after every
/// required claim is present with the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject, used as the local username
    pub subject: String,
    /// Email address (`null` in the token becomes `None`)
    pub email: Option<String>,
    /// Full display name (`null` in the token becomes `None`)
    pub full_name: Option<String>,
    /// Role names granted by the platform
    pub roles: Vec<String>,
    /// Expiration (Unix timestamp)
    pub expires_at: i64,
    /// Not-before (Unix timestamp)
    pub not_before: i64,
}

impl TokenClaims {
    /// Full name, falling back to the email when the name is empty.
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.email.clone().unwrap_or_default(),
        }
    }

    /// Claimed role names with duplicates collapsed.
    pub fn role_names(&self) -> BTreeSet<String> {
        self.roles.iter().cloned().collect()
    }
}

/// Principal attached to a request once the gate lets it through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Local username (token subject)
    pub username: String,
    /// Email address
    pub email: String,
    /// Assigned role names
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.role_names().into_iter().collect(),
        }
    }
}
