// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fabric Gate - JWT Authentication Gate
//!
//! Sits in front of a platform-hosted web application, validates bearer
//! tokens signed by the identity platform and provisions local users and
//! roles from their claims. Also ships the pod cleanup utility.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Signing key loading, token validation, the gate middleware
//! - `directory` - User, role and permission records and repository traits
//! - `storage` - JSON-file persistence for the directory
//! - `cleanup` - Terminated pod cleanup

pub mod api;
pub mod auth;
pub mod cleanup;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod state;
pub mod storage;
