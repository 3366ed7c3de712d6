//! SID persistence
//!
//! The durable session id survives process restarts so repeat runs can skip
//! the whole login handshake. Storage sits behind [`SidStore`] so tests can
//! swap in an in-memory implementation; production uses [`FileSidStore`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Storage backend for the durable session id.
#[async_trait]
pub trait SidStore: Send + Sync {
    /// Fetch the previously stored SID, `None` when nothing is stored.
    async fn load(&self) -> Result<Option<String>>;

    /// Persist a freshly issued SID, replacing any previous one.
    async fn store(&self, sid: &str) -> Result<()>;
}

/// File-backed [`SidStore`].
///
/// The SID is written as the file's raw contents with owner-only
/// permissions; it is a session credential, not cache data.
#[derive(Debug, Clone)]
pub struct FileSidStore {
    path: PathBuf,
}

impl FileSidStore {
    /// Store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Platform default location, `<cache dir>/cbn-agent/sid`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|dir| dir.join("cbn-agent").join("sid"))
            .ok_or_else(|| Error::config("no cache directory available for the SID file"))
    }

    /// Path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SidStore for FileSidStore {
    async fn load(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            // Trimming tolerates a trailing newline from hand editing.
            Ok(raw) => match raw.trim() {
                "" => Ok(None),
                sid => Ok(Some(sid.to_string())),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::persistence(format!(
                "cannot read SID file {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn store(&self, sid: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::persistence(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&self.path, sid).await.map_err(|e| {
            Error::persistence(format!("cannot write SID file {}: {e}", self.path.display()))
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms)
                .await
                .map_err(|e| {
                    Error::persistence(format!(
                        "cannot restrict SID file {}: {e}",
                        self.path.display()
                    ))
                })?;
        }
        tracing::debug!(path = %self.path.display(), "SID persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileSidStore::new(dir.path().join("sid"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileSidStore::new(dir.path().join("sid"));

        store.store("998877").await.unwrap();

        assert_eq!(store.load().await.unwrap().as_deref(), Some("998877"));
    }

    #[tokio::test]
    async fn test_store_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let store = FileSidStore::new(dir.path().join("nested").join("deeper").join("sid"));

        store.store("998877").await.unwrap();

        assert_eq!(store.load().await.unwrap().as_deref(), Some("998877"));
    }

    #[tokio::test]
    async fn test_store_overwrites_previous_sid() {
        let dir = tempdir().unwrap();
        let store = FileSidStore::new(dir.path().join("sid"));

        store.store("111111").await.unwrap();
        store.store("222222").await.unwrap();

        assert_eq!(store.load().await.unwrap().as_deref(), Some("222222"));
    }

    #[tokio::test]
    async fn test_load_trims_hand_edited_whitespace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sid");
        tokio::fs::write(&path, "998877\n").await.unwrap();

        let store = FileSidStore::new(&path);
        assert_eq!(store.load().await.unwrap().as_deref(), Some("998877"));
    }

    #[tokio::test]
    async fn test_load_whitespace_only_file_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sid");
        tokio::fs::write(&path, "\n").await.unwrap();

        let store = FileSidStore::new(&path);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_store_restricts_permissions_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileSidStore::new(dir.path().join("sid"));

        store.store("998877").await.unwrap();

        let mode = tokio::fs::metadata(store.path())
            .await
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_store_surfaces_write_failure() {
        let dir = tempdir().unwrap();
        // The target path is an existing directory, so the write must fail.
        let store = FileSidStore::new(dir.path());

        let err = store.store("998877").await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn test_default_path_lives_under_cache_dir() {
        if let Ok(path) = FileSidStore::default_path() {
            assert!(path.ends_with("cbn-agent/sid"));
        }
    }
}
