use super::SessionSource;
use crate::types::{AppError, AuthResponse, Result, User};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Signed-in user and the tokens the backend issued for them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Self {
            access_token: auth.tokens.access_token,
            refresh_token: auth.tokens.refresh_token,
            user: auth.user,
        }
    }
}

/// Session persisted as JSON on disk.
///
/// The in-memory copy is authoritative for the running process; the file
/// carries the session across invocations.
pub struct SessionStore {
    path: PathBuf,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open the store at `path`, loading a previously saved session if present.
    ///
    /// An unreadable or corrupt session file is treated as signed out.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let current = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(path = %path.display(), "Ignoring unreadable session file: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            path,
            current: RwLock::new(current),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Persist a new session, replacing any previous one.
    pub fn save(&self, session: Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(&session)?;
        fs::write(&self.path, raw)?;
        info!(user = %session.user.email, "Session saved");
        *self.current.write() = Some(session);
        Ok(())
    }

    /// Forget the session in memory and on disk.
    pub fn clear(&self) -> Result<()> {
        *self.current.write() = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::from(e)),
        }
    }
}

#[async_trait]
impl SessionSource for SessionStore {
    async fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.access_token.clone())
    }
}

/// Fixed token source, for scripts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(pub Option<String>);

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl SessionSource for StaticSession {
    async fn access_token(&self) -> Option<String> {
        self.0.clone()
    }
}
