// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Parsing goes
//! through a lookup closure so tests never touch the process environment.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SIGNING_CERT` | Path to the PEM public key that signs tokens | Required |
//! | `JWT_AUDIENCE` | Expected `aud` claim | Required |
//! | `JWT_ROLES_TO_MANAGE` | Comma-separated roles the gate may remove | All roles |
//! | `JWT_VALIDITY_LEEWAY` | Clock skew tolerance in seconds | `60` |
//! | `HEALTH_PATH` | Path exempt from authentication | `/health` |
//! | `STATIC_PATH_PREFIX` | Prefix exempt from key reload checks | `/static/` |
//! | `STATIC_DIR` | Directory served under the static prefix | None |
//! | `DATA_DIR` | Root directory for the user store | In-memory store |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files for HTTPS | Plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::auth::{RoleManagementScope, DEFAULT_LEEWAY_SECS};
use crate::logging::LogFormat;

pub const JWT_SIGNING_CERT_ENV: &str = "JWT_SIGNING_CERT";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const JWT_ROLES_TO_MANAGE_ENV: &str = "JWT_ROLES_TO_MANAGE";
pub const JWT_VALIDITY_LEEWAY_ENV: &str = "JWT_VALIDITY_LEEWAY";
pub const HEALTH_PATH_ENV: &str = "HEALTH_PATH";
pub const STATIC_PATH_PREFIX_ENV: &str = "STATIC_PATH_PREFIX";
pub const STATIC_DIR_ENV: &str = "STATIC_DIR";

/// Environment variable name for the user store directory.
///
/// When unset the gate keeps users in memory and they are lost on restart.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Settings for the authentication gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    pub signing_cert_path: PathBuf,
    pub allowed_audience: String,
    pub roles_to_manage: RoleManagementScope,
    pub validity_leeway_secs: u64,
    pub health_path: String,
    pub static_path_prefix: String,
}

impl SecurityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signing_cert_path = required(&lookup, JWT_SIGNING_CERT_ENV)?.into();
        let allowed_audience = required(&lookup, JWT_AUDIENCE_ENV)?;

        let roles_to_manage = RoleManagementScope::from_names(lookup(JWT_ROLES_TO_MANAGE_ENV).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        }));

        let validity_leeway_secs = match non_empty(&lookup, JWT_VALIDITY_LEEWAY_ENV) {
            None => DEFAULT_LEEWAY_SECS,
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: JWT_VALIDITY_LEEWAY_ENV,
                value: raw,
            })?,
        };

        Ok(Self {
            signing_cert_path,
            allowed_audience,
            roles_to_manage,
            validity_leeway_secs,
            health_path: url_path(&lookup, HEALTH_PATH_ENV, "/health")?,
            static_path_prefix: url_path(&lookup, STATIC_PATH_PREFIX_ENV, "/static/")?,
        })
    }
}

/// Settings for the HTTP listener and storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match non_empty(&lookup, HOST_ENV) {
            None => IpAddr::from([0, 0, 0, 0]),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: HOST_ENV,
                value: raw,
            })?,
        };
        let port = match non_empty(&lookup, PORT_ENV) {
            None => 8080,
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                value: raw,
            })?,
        };

        let tls = match (
            non_empty(&lookup, TLS_CERT_PATH_ENV),
            non_empty(&lookup, TLS_KEY_PATH_ENV),
        ) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(Self {
            host,
            port,
            data_dir: non_empty(&lookup, DATA_DIR_ENV).map(PathBuf::from),
            static_dir: non_empty(&lookup, STATIC_DIR_ENV).map(PathBuf::from),
            tls,
            log_format: LogFormat::parse(lookup(LOG_FORMAT_ENV).as_deref()),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name).ok_or(ConfigError::Missing(name))
}

/// A router path: must start with `/`.
fn url_path<F>(lookup: &F, name: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, name) {
        None => Ok(default.to_string()),
        Some(raw) if raw.trim().starts_with('/') => Ok(raw.trim().to_string()),
        Some(raw) => Err(ConfigError::Invalid { var: name, value: raw }),
    }
}
