// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::AuthGate;

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    /// Served under the gate's static prefix when set.
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(gate: Arc<AuthGate>) -> Self {
        Self {
            gate,
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }
}
