// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the storage layout.

use std::path::{Path, PathBuf};

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all stored data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the directory snapshot file.
    pub fn directory_file(&self) -> PathBuf {
        self.root.join("directory.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_file_lives_under_root() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(paths.root(), Path::new("/tmp/test-data"));
        assert_eq!(
            paths.directory_file(),
            PathBuf::from("/tmp/test-data/directory.json")
        );
    }
}
