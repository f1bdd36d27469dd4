//! File-backed session store.
//!
//! Holds the token/profile bundle the login endpoints return, as one JSON
//! file. Writes go through a temp file in the same directory and an atomic
//! rename, so a crash mid-save never leaves a half-written session behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use caseta_core::SessionData;
use tracing::{debug, info};

use crate::StoreError;

/// Persistent store for the authenticated session.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform data directory, e.g.
    /// `~/.local/share/caseta/session.json` on Linux.
    pub fn at_default_path() -> Result<Self, StoreError> {
        let dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(dir.join("caseta").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a full session, replacing any existing one.
    pub fn save(&self, session: &SessionData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_vec_pretty(session)?;

        let dir = self.path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        tmp.write_all(&json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e.error,
        })?;

        info!(path = %self.path.display(), user = %session.username, "session saved");
        Ok(())
    }

    /// Load the stored session, or `None` when nobody is logged in.
    pub fn load(&self) -> Result<Option<SessionData>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no session file");
                return Ok(None);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let session: SessionData = serde_json::from_slice(&bytes)?;
        Ok(Some(session))
    }

    /// Forget the stored session. Clearing an absent session is fine.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionData {
        SessionData {
            token: "abc.def.ghi".into(),
            id: "9".into(),
            username: "ana".into(),
            role: "resident".into(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&sample()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn load_without_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        store.save(&sample()).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn save_replaces_existing_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&sample()).unwrap();
        let mut other = sample();
        other.username = "pedro".into();
        other.role = "guard".into();
        store.save(&other).unwrap();
        assert_eq!(store.load().unwrap().unwrap().username, "pedro");
    }

    #[test]
    fn clear_removes_session_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&sample()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"not json").unwrap();
        let store = SessionStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }
}
