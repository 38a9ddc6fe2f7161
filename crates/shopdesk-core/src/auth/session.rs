use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::gate::SessionQuery;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// On-disk form of the session. Only the bearer token is kept.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedToken {
    token: String,
}

/// Mirrors the session token to a file so consecutive commands share it.
#[derive(Debug)]
struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(SESSION_FILE),
        }
    }

    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        let persisted: PersistedToken =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(persisted.token).filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&PersistedToken {
            token: token.to_string(),
        })?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Holds the current bearer token.
///
/// Clones share the same token. Every `set` and `clear` is broadcast to
/// receivers obtained from [`SessionStore::subscribe`], which is how the
/// top-level auth indicator learns that the token changed underneath it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    token: Arc<watch::Sender<Option<String>>>,
    file: Option<Arc<SessionFile>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::ephemeral()
    }
}

impl SessionStore {
    /// In-memory store that lives as long as the process.
    pub fn ephemeral() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            token: Arc::new(tx),
            file: None,
        }
    }

    /// Store backed by `session.json` in `cache_dir`.
    ///
    /// An unreadable session file is treated as no session.
    pub fn persistent(cache_dir: &Path) -> Self {
        let file = SessionFile::new(cache_dir);
        let initial = match file.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, path = ?file.path, "Ignoring unreadable session file");
                None
            }
        };
        debug!(has_token = initial.is_some(), "Session loaded");

        let (tx, _) = watch::channel(initial);
        Self {
            token: Arc::new(tx),
            file: Some(Arc::new(file)),
        }
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    /// Replace the stored token.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        if let Some(ref file) = self.file {
            if let Err(e) = file.save(&token) {
                warn!(error = %e, "Failed to persist session token");
            }
        }
        self.token.send_replace(Some(token));
    }

    /// Remove the stored token. Clearing an empty store is a no-op.
    pub fn clear(&self) {
        if let Some(ref file) = self.file {
            if let Err(e) = file.remove() {
                warn!(error = %e, "Failed to remove session file");
            }
        }
        self.token.send_if_modified(|current| current.take().is_some());
    }

    pub fn is_persistent(&self) -> bool {
        self.file.is_some()
    }

    /// Receiver that is notified whenever the token is set or cleared.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }
}

impl SessionQuery for SessionStore {
    fn has_token(&self) -> bool {
        self.token.borrow().is_some()
    }
}
