use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Credentials and identity returned by a successful login.
/// `user_id` is kept as a string even though the backend sends an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    pub created_at: String,
}

impl Session {
    pub fn new(token: String, user_id: i64, user_name: String) -> Self {
        Session {
            token,
            user_id: user_id.to_string(),
            user_name,
            created_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// On-disk session state at `<home>/session.json`. Constructed explicitly
/// from a directory so tests can point it at a scratch location; there is
/// no process-global session.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn open(dir: &Path) -> Self {
        SessionStore {
            path: dir.join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current session, or None when nobody is logged in.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session: {}", self.path.display()))?;
        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt session file: {}", self.path.display()))?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session: {}", self.path.display()))?;
        debug!("Saved session for {}", session.user_name);
        Ok(())
    }

    /// Remove the stored session. Idempotent: returns false when there was
    /// nothing to clear.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove session: {}", self.path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path());

        assert_eq!(store.load().unwrap(), None);

        let session = Session::new("tok123".to_string(), 7, "ada".to_string());
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        assert!(store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path());
        assert!(!store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn user_id_is_stored_as_string() {
        let session = Session::new("t".to_string(), 42, "ada".to_string());
        assert_eq!(session.user_id, "42");
    }
}
