//! Session credential boundary.
//!
//! The engine only reads the bearer token and, on the forced-logout path,
//! clears it. Login itself happens elsewhere. Invalidation is announced on
//! a process-wide [`SessionSignals`] channel so whoever owns navigation can
//! leave the catalog view.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;

/// Credential storage used by transports and the catalog route guard.
pub trait SessionStore: Send + Sync {
    /// Current bearer token, if any.
    fn token(&self) -> Option<String>;

    /// Store a token. `remember` selects persistent over per-session storage.
    fn set_token(&self, token: &str, remember: bool);

    /// Remove the token from every slot.
    fn clear_token(&self);

    /// Whether a token is present.
    fn has_token(&self) -> bool {
        self.token().is_some()
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }

    fn set_token(&self, token: &str, remember: bool) {
        (**self).set_token(token, remember)
    }

    fn clear_token(&self) {
        (**self).clear_token()
    }
}

#[derive(Debug, Default)]
struct Slots {
    session: Option<String>,
    persistent: Option<String>,
}

/// In-memory session store with a per-session and a persistent slot.
///
/// Reads prefer the per-session slot. Storing into one slot empties the
/// other. Clone-friendly via Arc.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    slots: Arc<RwLock<Slots>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token` in the per-session slot.
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set_token(token, false);
        store
    }
}

impl SessionStore for InMemorySessionStore {
    fn token(&self) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .session
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| slots.persistent.clone().filter(|t| !t.is_empty()))
    }

    fn set_token(&self, token: &str, remember: bool) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if remember {
            slots.persistent = Some(token.to_string());
            slots.session = None;
        } else {
            slots.session = Some(token.to_string());
            slots.persistent = None;
        }
    }

    fn clear_token(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.session = None;
        slots.persistent = None;
    }
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// The server rejected the credential and the token was cleared.
    Invalidated,
    /// The catalog must be left for the login screen.
    LoginRequired,
}

/// Broadcast channel for [`SessionSignal`]s. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct SessionSignals {
    tx: broadcast::Sender<SessionSignal>,
}

impl Default for SessionSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSignals {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.tx.subscribe()
    }

    /// Announce a signal. Having no subscribers is not an error.
    pub fn notify(&self, signal: SessionSignal) {
        let delivered = self.tx.send(signal).unwrap_or(0);
        tracing::debug!(?signal, delivered, "session signal");
    }
}
