// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # File Storage Module
//!
//! Persists the user directory as JSON under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   directory.json   # users, roles, installed permission views, grants
//! ```
//!
//! Writes go to a temp file and are renamed into place, so a crash never
//! leaves a half-written directory behind.

pub mod directory;
pub mod fs;
pub mod paths;

pub use directory::FileDirectory;
pub use fs::{JsonStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
