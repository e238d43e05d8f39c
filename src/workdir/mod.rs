//! Working-area management.
//!
//! Every pipeline run gets a private scratch directory under a configurable
//! root (the system temp directory by default), named by the record's source
//! key.  Chunk files and the assembled output live there until the run ends.
//!
//! Teardown is **key-addressed**: [`WorkDirManager::release`] recomputes the
//! path from the key instead of requiring the [`WorkingArea`] handle back.
//! Acquisition runs concurrently with synthesis, so the handle may never
//! reach the caller when the other branch fails; the orchestrator can still
//! release by key on every exit path.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tokio::fs;

// ---------------------------------------------------------------------------
// WorkDirError
// ---------------------------------------------------------------------------

/// Errors from working-area setup and teardown.
#[derive(Debug, Error)]
pub enum WorkDirError {
    /// Could not create (or clear a stale copy of) the working area.
    #[error("failed to prepare working area {}: {source}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Could not remove the working area during cleanup.
    #[error("failed to remove working area {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// WorkingArea
// ---------------------------------------------------------------------------

/// A freshly created scratch directory for one pipeline run.
#[derive(Debug, Clone)]
pub struct WorkingArea {
    path: PathBuf,
    key: String,
    created_at: SystemTime,
}

impl WorkingArea {
    /// Absolute path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The source key this area belongs to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// When this area was created.  Useful for spotting stale directories
    /// left behind by an interrupted process.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Path of a file inside the area.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

// ---------------------------------------------------------------------------
// WorkDirManager
// ---------------------------------------------------------------------------

/// Creates and removes per-run working areas under a fixed root.
#[derive(Debug, Clone)]
pub struct WorkDirManager {
    root: PathBuf,
}

impl WorkDirManager {
    /// Manager rooted at the system temp directory.
    pub fn new() -> Self {
        Self {
            root: std::env::temp_dir(),
        }
    }

    /// Manager rooted at an explicit directory (configuration and tests).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root under which all working areas are created.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic directory path for `key`.  Pure; touches no IO.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Create a fresh working area for `key`.
    ///
    /// Any stale directory left behind by an earlier run of the same key is
    /// removed first, so the area is always empty on return.
    pub async fn acquire(&self, key: &str) -> Result<WorkingArea, WorkDirError> {
        let path = self.path_for(key);

        match fs::remove_dir_all(&path).await {
            Ok(()) => log::debug!("workdir: cleared stale area {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(WorkDirError::Setup { path, source }),
        }

        fs::create_dir_all(&path)
            .await
            .map_err(|source| WorkDirError::Setup {
                path: path.clone(),
                source,
            })?;

        log::debug!("workdir: acquired {}", path.display());
        Ok(WorkingArea {
            path,
            key: key.to_string(),
            created_at: SystemTime::now(),
        })
    }

    /// Remove the working area for `key`.
    ///
    /// Idempotent: an already-absent directory is a success, so release can
    /// run unconditionally on every pipeline exit path.
    pub async fn release(&self, key: &str) -> Result<(), WorkDirError> {
        let path = self.path_for(key);

        match fs::remove_dir_all(&path).await {
            Ok(()) => {
                log::debug!("workdir: released {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WorkDirError::Cleanup { path, source }),
        }
    }
}

impl Default for WorkDirManager {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // --- path_for ---

    #[test]
    fn path_for_joins_key_under_root() {
        let mgr = WorkDirManager::with_root("/some/root");
        assert_eq!(mgr.path_for("abc123"), PathBuf::from("/some/root/abc123"));
    }

    #[test]
    fn path_for_is_deterministic() {
        let mgr = WorkDirManager::new();
        assert_eq!(mgr.path_for("k"), mgr.path_for("k"));
    }

    #[test]
    fn default_root_is_system_temp() {
        let mgr = WorkDirManager::new();
        assert_eq!(mgr.root(), std::env::temp_dir().as_path());
    }

    // --- acquire ---

    #[tokio::test]
    async fn acquire_creates_the_directory() {
        let root = tempdir().expect("temp dir");
        let mgr = WorkDirManager::with_root(root.path());

        let area = mgr.acquire("key1").await.expect("acquire");
        assert!(area.path().is_dir());
        assert_eq!(area.key(), "key1");
        assert_eq!(area.path(), mgr.path_for("key1"));
    }

    #[tokio::test]
    async fn acquire_clears_stale_contents() {
        let root = tempdir().expect("temp dir");
        let mgr = WorkDirManager::with_root(root.path());

        let area = mgr.acquire("key1").await.expect("first acquire");
        std::fs::write(area.file("leftover.mp3"), b"stale").expect("write");

        let area = mgr.acquire("key1").await.expect("second acquire");
        assert!(area.path().is_dir());
        assert!(!area.file("leftover.mp3").exists());
    }

    #[tokio::test]
    async fn working_area_file_joins_names() {
        let root = tempdir().expect("temp dir");
        let mgr = WorkDirManager::with_root(root.path());

        let area = mgr.acquire("key1").await.expect("acquire");
        assert_eq!(area.file("audio.mp3"), area.path().join("audio.mp3"));
    }

    #[tokio::test]
    async fn acquire_stamps_the_creation_time() {
        let root = tempdir().expect("temp dir");
        let mgr = WorkDirManager::with_root(root.path());

        let before = SystemTime::now();
        let area = mgr.acquire("key1").await.expect("acquire");
        assert!(area.created_at() >= before);
        assert!(area.created_at() <= SystemTime::now());
    }

    // --- release ---

    #[tokio::test]
    async fn release_removes_the_directory() {
        let root = tempdir().expect("temp dir");
        let mgr = WorkDirManager::with_root(root.path());

        let area = mgr.acquire("key1").await.expect("acquire");
        std::fs::write(area.file("0.mp3"), b"data").expect("write");

        mgr.release("key1").await.expect("release");
        assert!(!mgr.path_for("key1").exists());
    }

    #[tokio::test]
    async fn release_of_missing_area_is_ok() {
        let root = tempdir().expect("temp dir");
        let mgr = WorkDirManager::with_root(root.path());

        mgr.release("never-acquired").await.expect("release");
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let root = tempdir().expect("temp dir");
        let mgr = WorkDirManager::with_root(root.path());

        mgr.acquire("key1").await.expect("acquire");
        mgr.release("key1").await.expect("first release");
        mgr.release("key1").await.expect("second release");
    }
}
