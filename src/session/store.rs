//! Token store
//!
//! Holds the current session as an immutable snapshot that is swapped on
//! every write. Only login, logout and the session guard write to it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{Session, SessionOrigin};

/// Errors from durable session storage
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable backing for the token store
pub trait SessionPersistence: Send + Sync {
    fn load(&self) -> Result<Option<Session>, StoreError>;
    fn save(&self, session: &Session) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Session persisted as a JSON file
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session held only for the life of the process
#[derive(Default)]
pub struct MemorySessionStore {
    saved: Mutex<Option<Session>>,
}

impl SessionPersistence for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Snapshot of the authentication state for diagnostics
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthSnapshot {
    pub has_token: bool,
    pub token_preview: Option<String>,
    pub user_email: Option<String>,
    pub is_admin: bool,
    pub origin: SessionOrigin,
    pub onboarding_seen: bool,
}

/// Shared holder of the current session
pub struct TokenStore {
    current: RwLock<Arc<Session>>,
    persistence: Arc<dyn SessionPersistence>,
    onboarding_seen: AtomicBool,
}

impl TokenStore {
    /// Create a store, restoring any previously persisted session
    pub fn new(persistence: Arc<dyn SessionPersistence>) -> Self {
        let restored = match persistence.load() {
            Ok(Some(session)) => {
                debug!(email = ?session.user_email, "Restored persisted session");
                session
            }
            Ok(None) => Session::anonymous(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session file");
                Session::anonymous()
            }
        };

        Self {
            current: RwLock::new(Arc::new(restored)),
            persistence,
            onboarding_seen: AtomicBool::new(false),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::default()))
    }

    /// Current session snapshot
    pub fn snapshot(&self) -> Arc<Session> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.snapshot().token.clone().filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        let session = self.snapshot();
        session.is_authenticated() && session.is_admin
    }

    /// Replace the session. The in-memory snapshot is updated even when
    /// persisting fails.
    pub fn set_session(&self, session: Session) -> Result<(), StoreError> {
        let persisted = self.persistence.save(&session);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(session);
        persisted
    }

    /// Drop the session and its persisted copy
    pub fn clear_session(&self) -> Result<(), StoreError> {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) =
            Arc::new(Session::anonymous());
        self.persistence.clear()
    }

    /// Mark onboarding as shown. Returns true the first time only.
    pub fn mark_onboarding_seen(&self) -> bool {
        !self.onboarding_seen.swap(true, Ordering::SeqCst)
    }

    pub fn onboarding_seen(&self) -> bool {
        self.onboarding_seen.load(Ordering::SeqCst)
    }

    pub fn debug_auth(&self) -> AuthSnapshot {
        let session = self.snapshot();
        AuthSnapshot {
            has_token: session.is_authenticated(),
            token_preview: session
                .token
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| format!("{}...", t.chars().take(20).collect::<String>())),
            user_email: session.user_email.clone(),
            is_admin: session.is_admin,
            origin: session.origin,
            onboarding_seen: self.onboarding_seen(),
        }
    }
}
