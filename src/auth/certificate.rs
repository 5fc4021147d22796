// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key loading with hot reload.
//!
//! The identity platform rotates its signing key by rewriting a PEM file on
//! disk. The loader keeps the parsed key together with the file's
//! modification time (nanoseconds since the epoch) and only re-reads the file
//! when that time strictly increases.
//!
//! ## Concurrency
//!
//! The current key is an immutable `Arc<SigningCertificate>` behind a lock.
//! A reload builds the new key completely before swapping the pointer, so
//! readers see either the old key or the new one, never a partial update.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey};

use super::error::KeyLoadError;

const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];
const EC_ALGORITHMS: &[Algorithm] = &[Algorithm::ES256, Algorithm::ES384];
const ED_ALGORITHMS: &[Algorithm] = &[Algorithm::EdDSA];

/// Parsed public key plus the modification time of the file it came from.
#[derive(Clone)]
pub struct SigningCertificate {
    key: DecodingKey,
    algorithms: &'static [Algorithm],
    modified_ns: u128,
}

impl SigningCertificate {
    /// Parse a PEM public key. The key type decides the accepted algorithms.
    pub fn from_pem(pem: &[u8], modified_ns: u128) -> Option<Self> {
        let (key, algorithms) = if let Ok(key) = DecodingKey::from_rsa_pem(pem) {
            (key, RSA_ALGORITHMS)
        } else if let Ok(key) = DecodingKey::from_ec_pem(pem) {
            (key, EC_ALGORITHMS)
        } else if let Ok(key) = DecodingKey::from_ed_pem(pem) {
            (key, ED_ALGORITHMS)
        } else {
            return None;
        };

        Some(Self {
            key,
            algorithms,
            modified_ns,
        })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    /// Signature algorithms a token may declare for this key.
    pub fn algorithms(&self) -> &'static [Algorithm] {
        self.algorithms
    }

    pub fn modified_ns(&self) -> u128 {
        self.modified_ns
    }
}

impl std::fmt::Debug for SigningCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCertificate")
            .field("algorithms", &self.algorithms)
            .field("modified_ns", &self.modified_ns)
            .finish_non_exhaustive()
    }
}

/// Raw key bytes and the modification time observed on the same handle.
pub struct KeyMaterial {
    pub pem: Vec<u8>,
    pub modified_ns: u128,
}

/// Where the signing key comes from.
pub trait KeySource: Send + Sync {
    /// Location used in logs and errors.
    fn path(&self) -> &Path;

    /// Current modification time, without reading the contents.
    fn modified_ns(&self) -> io::Result<u128>;

    /// Read the key bytes.
    fn read(&self) -> io::Result<KeyMaterial>;
}

/// Signing key stored in a local PEM file.
#[derive(Debug, Clone)]
pub struct FileKeySource {
    path: PathBuf,
}

impl FileKeySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeySource for FileKeySource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn modified_ns(&self) -> io::Result<u128> {
        Ok(to_nanos(std::fs::metadata(&self.path)?.modified()?))
    }

    fn read(&self) -> io::Result<KeyMaterial> {
        let mut file = File::open(&self.path)?;
        let mut pem = Vec::new();
        file.read_to_end(&mut pem)?;
        // Stat the open handle so the recorded time matches the bytes we read,
        // even if the file is replaced right after.
        let modified_ns = to_nanos(file.metadata()?.modified()?);
        Ok(KeyMaterial { pem, modified_ns })
    }
}

fn to_nanos(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

/// Holds the current signing key and reloads it when the source changes.
pub struct CertificateLoader<S = FileKeySource> {
    source: S,
    current: RwLock<Arc<SigningCertificate>>,
}

impl CertificateLoader<FileKeySource> {
    /// Load the key from a PEM file. Failure here is fatal for startup.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, KeyLoadError> {
        Self::load(FileKeySource::new(path))
    }
}

impl<S: KeySource> CertificateLoader<S> {
    /// Perform the initial load from `source`.
    pub fn load(source: S) -> Result<Self, KeyLoadError> {
        let certificate = read_certificate(&source)?;
        tracing::info!(
            path = %source.path().display(),
            "Loaded JWT signing key"
        );
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(certificate)),
        })
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    /// The key currently in effect, without checking the source.
    pub fn cached(&self) -> Arc<SigningCertificate> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The key currently in effect, reloading first if the source is newer.
    ///
    /// On a failed reload the previous key stays in effect and the error is
    /// returned.
    pub fn current_key(&self) -> Result<Arc<SigningCertificate>, KeyLoadError> {
        let cached = self.cached();
        let modified_ns = self.source.modified_ns().map_err(|source| KeyLoadError::Io {
            path: self.source.path().to_path_buf(),
            source,
        })?;

        if modified_ns <= cached.modified_ns() {
            return Ok(cached);
        }

        tracing::info!(
            path = %self.source.path().display(),
            "Signing key changed on disk, reloading"
        );
        let fresh = Arc::new(read_certificate(&self.source)?);

        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // Another request may have swapped in an even newer key meanwhile.
        if fresh.modified_ns() > slot.modified_ns() {
            *slot = fresh;
        }
        Ok(Arc::clone(&slot))
    }
}

fn read_certificate<S: KeySource>(source: &S) -> Result<SigningCertificate, KeyLoadError> {
    let material = source.read().map_err(|e| KeyLoadError::Io {
        path: source.path().to_path_buf(),
        source: e,
    })?;

    SigningCertificate::from_pem(&material.pem, material.modified_ns).ok_or_else(|| {
        KeyLoadError::Unparsable {
            path: source.path().to_path_buf(),
        }
    })
}
