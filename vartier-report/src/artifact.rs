//! Write-once report artifact storage.
//!
//! Artifacts are immutable once written: the store either creates the
//! file fresh or reports what is already there, fingerprinted by SHA-256
//! so callers can tell a benign replay from a real collision. A sidecar
//! `<file>.meta.json` persists the fingerprint so replays of large
//! artifacts do not re-hash the file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use vartier_core::errors::StoreError;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Result of a write-once attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOnceOutcome {
    Written,
    AlreadyExists { existing_sha256: String },
}

/// Durable, write-once artifact storage keyed by relative path. The file
/// name convention is the caller's business; the store only guarantees
/// that a path is written at most once.
pub trait ArtifactStore: Send + Sync {
    fn write_once(&self, relpath: &str, bytes: &[u8]) -> Result<WriteOnceOutcome, StoreError>;

    fn exists(&self, relpath: &str) -> Result<bool, StoreError>;

    fn read(&self, relpath: &str) -> Result<Vec<u8>, StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactSidecar {
    sha256: String,
    size: u64,
    created_at: String,
}

/// Filesystem-backed artifact store rooted at a directory.
///
/// Concurrent writers to the same root serialize on an advisory lock
/// file, so the create-new check and the content write are one critical
/// section even across processes sharing the root.
#[derive(Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Resolve a relative path under the root, rejecting anything that
    /// would escape it.
    fn resolve(&self, relpath: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(relpath);
        if relpath.is_empty()
            || !rel.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StoreError::Corrupt(format!(
                "artifact path {relpath:?} escapes the store root"
            )));
        }
        Ok(self.root.join(rel))
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    fn existing_sha256(path: &Path) -> Result<String, StoreError> {
        let sidecar = Self::sidecar_path(path);
        if let Ok(bytes) = fs::read(&sidecar) {
            if let Ok(meta) = serde_json::from_slice::<ArtifactSidecar>(&bytes) {
                return Ok(meta.sha256);
            }
            log::warn!("unreadable artifact sidecar {}, re-hashing", sidecar.display());
        }
        Ok(sha256_hex(&fs::read(path)?))
    }

    fn lock_file(&self) -> Result<File, StoreError> {
        let lock_path = self.root.join(".write.lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write_once(&self, relpath: &str, bytes: &[u8]) -> Result<WriteOnceOutcome, StoreError> {
        let path = self.resolve(relpath)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Advisory lock released on drop at the end of the call.
        let _lock = self.lock_file()?;

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                file.sync_all()?;

                let sidecar = ArtifactSidecar {
                    sha256: sha256_hex(bytes),
                    size: bytes.len() as u64,
                    created_at: Utc::now().to_rfc3339(),
                };
                fs::write(
                    Self::sidecar_path(&path),
                    serde_json::to_vec_pretty(&sidecar)
                        .map_err(|e| StoreError::Corrupt(e.to_string()))?,
                )?;
                Ok(WriteOnceOutcome::Written)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Ok(WriteOnceOutcome::AlreadyExists {
                    existing_sha256: Self::existing_sha256(&path)?,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, relpath: &str) -> Result<bool, StoreError> {
        Ok(self.resolve(relpath)?.exists())
    }

    fn read(&self, relpath: &str) -> Result<Vec<u8>, StoreError> {
        Ok(fs::read(self.resolve(relpath)?)?)
    }
}

/// In-memory artifact store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn write_once(&self, relpath: &str, bytes: &[u8]) -> Result<WriteOnceOutcome, StoreError> {
        let mut files = self.lock();
        if let Some(existing) = files.get(relpath) {
            return Ok(WriteOnceOutcome::AlreadyExists {
                existing_sha256: sha256_hex(existing),
            });
        }
        files.insert(relpath.to_string(), bytes.to_vec());
        Ok(WriteOnceOutcome::Written)
    }

    fn exists(&self, relpath: &str) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(relpath))
    }

    fn read(&self, relpath: &str) -> Result<Vec<u8>, StoreError> {
        self.lock()
            .get(relpath)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(relpath.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn first_write_wins_and_replay_reports_existing_content() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path()).unwrap();

        let body = b"<html>report</html>".as_slice();
        assert_eq!(
            store.write_once("case1.html", body).unwrap(),
            WriteOnceOutcome::Written
        );
        assert!(store.exists("case1.html").unwrap());
        assert_eq!(store.read("case1.html").unwrap(), body);

        // Replay with the same bytes: the existing fingerprint matches.
        match store.write_once("case1.html", body).unwrap() {
            WriteOnceOutcome::AlreadyExists { existing_sha256 } => {
                assert_eq!(existing_sha256, sha256_hex(body));
            }
            other => panic!("expected AlreadyExists, got {other:?}"),
        }

        // A different body surfaces a different fingerprint; classifying
        // that as an error is the pipeline's call.
        match store.write_once("case1.html", b"tampered").unwrap() {
            WriteOnceOutcome::AlreadyExists { existing_sha256 } => {
                assert_ne!(existing_sha256, sha256_hex(b"tampered"));
            }
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[test]
    fn nested_paths_are_created_and_escapes_rejected() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path()).unwrap();

        store
            .write_once("2026/aug/case2.html", b"body")
            .unwrap();
        assert!(store.exists("2026/aug/case2.html").unwrap());

        assert!(matches!(
            store.write_once("../escape.html", b"x"),
            Err(StoreError::Corrupt(_))
        ));
        assert!(matches!(
            store.write_once("", b"x"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn fingerprint_survives_a_lost_sidecar() {
        let dir = tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path()).unwrap();
        let body = b"persistent".as_slice();
        store.write_once("case3.html", body).unwrap();

        fs::remove_file(dir.path().join("case3.html.meta.json")).unwrap();
        match store.write_once("case3.html", body).unwrap() {
            WriteOnceOutcome::AlreadyExists { existing_sha256 } => {
                assert_eq!(existing_sha256, sha256_hex(body));
            }
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[test]
    fn memory_store_mirrors_the_contract() {
        let store = MemoryArtifactStore::new();
        assert_eq!(
            store.write_once("a.html", b"one").unwrap(),
            WriteOnceOutcome::Written
        );
        assert!(matches!(
            store.write_once("a.html", b"two").unwrap(),
            WriteOnceOutcome::AlreadyExists { .. }
        ));
        assert!(matches!(store.read("b.html"), Err(StoreError::NotFound(_))));
    }
}
