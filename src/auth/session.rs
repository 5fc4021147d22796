// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie-backed login sessions.
//!
//! Once the gate has provisioned a user it records a session here and hands
//! the browser a cookie. Later requests carrying a live session skip token
//! validation. A session ends when the token it was created from would have
//! expired.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::claims::AuthenticatedUser;
use super::error::SessionLoginError;
use crate::directory::User;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "fabric_session";

#[derive(Debug, Clone)]
struct SessionEntry {
    user: AuthenticatedUser,
    expires_at: i64,
}

/// A freshly recorded login.
#[derive(Debug, Clone)]
pub struct SessionLogin {
    pub id: Uuid,
    pub user: AuthenticatedUser,
    secure: bool,
}

impl SessionLogin {
    /// `Set-Cookie` value for this session.
    pub fn cookie(&self) -> HeaderValue {
        let mut value = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.id
        );
        if self.secure {
            value.push_str("; Secure");
        }
        // A hyphenated UUID and fixed ASCII attributes are always valid.
        HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

/// In-process session registry.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    secure_cookies: bool,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark issued cookies `Secure`. Set when serving over TLS.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Principal of the live session named by the request cookie, if any.
    pub async fn current(&self, headers: &HeaderMap) -> Option<AuthenticatedUser> {
        let id = session_id(headers)?;
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id)?;
        if entry.expires_at < Utc::now().timestamp() {
            return None;
        }
        Some(entry.user.clone())
    }

    /// Record a login for `user`, valid until `expires_at` (Unix seconds).
    ///
    /// Inactive users are refused.
    pub async fn login(
        &self,
        user: &User,
        expires_at: i64,
    ) -> Result<SessionLogin, SessionLoginError> {
        if !user.active {
            return Err(SessionLoginError {
                username: user.username.clone(),
                reason: "user is not active",
            });
        }

        let login = SessionLogin {
            id: Uuid::new_v4(),
            user: AuthenticatedUser::from_user(user),
            secure: self.secure_cookies,
        };

        let now = Utc::now().timestamp();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.expires_at >= now);
        sessions.insert(
            login.id,
            SessionEntry {
                user: login.user.clone(),
                expires_at,
            },
        );

        Ok(login)
    }

    /// Number of sessions currently on record.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn in_an_hour() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn login_then_lookup_by_cookie() {
        let store = SessionStore::new();
        let user = User::new("alice", "Alice", "alice@example.com");
        let login = store.login(&user, in_an_hour()).await.unwrap();

        let cookie = format!("theme=dark; {SESSION_COOKIE}={}", login.id);
        let current = store.current(&headers_with_cookie(&cookie)).await.unwrap();
        assert_eq!(current.username, "alice");
    }

    #[tokio::test]
    async fn unknown_or_missing_cookie_is_anonymous() {
        let store = SessionStore::new();
        assert!(store.current(&HeaderMap::new()).await.is_none());

        let cookie = format!("{SESSION_COOKIE}={}", Uuid::new_v4());
        assert!(store.current(&headers_with_cookie(&cookie)).await.is_none());
        assert!(store
            .current(&headers_with_cookie(&format!("{SESSION_COOKIE}=garbage")))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn expired_session_is_anonymous_and_pruned() {
        let store = SessionStore::new();
        let user = User::new("alice", "Alice", "alice@example.com");
        let old = store.login(&user, Utc::now().timestamp() - 1).await.unwrap();

        let cookie = format!("{SESSION_COOKIE}={}", old.id);
        assert!(store.current(&headers_with_cookie(&cookie)).await.is_none());

        store.login(&user, in_an_hour()).await.unwrap();
        assert_eq!(store.active_sessions().await, 1);
    }

    #[tokio::test]
    async fn inactive_user_is_refused() {
        let store = SessionStore::new();
        let mut user = User::new("alice", "Alice", "alice@example.com");
        user.active = false;

        let err = store.login(&user, in_an_hour()).await.unwrap_err();
        assert_eq!(err.username, "alice");
    }

    fn login_cookie(secure: bool) -> String {
        let login = SessionLogin {
            id: Uuid::nil(),
            user: AuthenticatedUser {
                username: "alice".to_string(),
                email: String::new(),
                roles: Vec::new(),
            },
            secure,
        };
        login.cookie().to_str().unwrap().to_string()
    }

    #[test]
    fn cookie_sets_http_only() {
        let cookie = login_cookie(false);
        assert!(cookie.starts_with("fabric_session=00000000-0000-0000-0000-000000000000"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn secure_store_issues_secure_cookies() {
        assert!(login_cookie(true).ends_with("; Secure"));

        let user = User::new("alice", "Alice", "alice@example.com");
        let store = SessionStore::new().with_secure_cookies(true);
        let login = store.login(&user, in_an_hour()).await.unwrap();
        assert!(login.cookie().to_str().unwrap().contains("; Secure"));

        let plain = SessionStore::new().login(&user, in_an_hour()).await.unwrap();
        assert!(!plain.cookie().to_str().unwrap().contains("Secure"));
    }
}
