use std::fmt;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use tracing::{debug, warn};

use super::{MemoryTokenStore, TokenStore};

/// Credential lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

struct SessionInner {
    token: RwLock<Option<String>>,
    store: Box<dyn TokenStore>,
}

/// Shared handle over the bearer token.
///
/// Clone is cheap; every clone sees the same token. The composition root
/// creates one `Session` and hands it to both the API client and the live
/// channel.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Start an anonymous session backed by `store`, ignoring anything it holds.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self::from_parts(None, Box::new(store))
    }

    /// Start a session from whatever token `store` persisted in a previous run.
    pub fn restore(store: impl TokenStore + 'static) -> Self {
        let token = match store.load() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to load persisted session, starting anonymous");
                None
            }
        };
        debug!(restored = token.is_some(), "Session restored");
        Self::from_parts(token, Box::new(store))
    }

    /// Session whose token is never written to disk.
    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::new())
    }

    fn from_parts(token: Option<String>, store: Box<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(token),
                store,
            }),
        }
    }

    /// The held token, or the empty string when anonymous.
    pub fn token(&self) -> String {
        self.read().clone().unwrap_or_default()
    }

    pub fn state(&self) -> SessionState {
        if self.read().as_deref().is_some_and(|t| !t.is_empty()) {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Replace the held token and persist it.
    ///
    /// The in-memory token is updated even when persisting fails. The write
    /// lock is held until the store returns, so concurrent transitions reach
    /// memory and storage in the same order.
    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        let mut held = self.write();
        let result = self.inner.store.save(&token);
        *held = Some(token);
        result
    }

    /// Drop the held token and remove it from storage.
    ///
    /// The in-memory token is dropped even when the store fails.
    pub fn clear(&self) -> Result<()> {
        let mut held = self.write();
        let result = self.inner.store.clear();
        *held = None;
        result
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<String>> {
        self.inner.token.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        self.inner.token.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself
        f.debug_struct("Session")
            .field("state", &self.state())
            .finish()
    }
}
