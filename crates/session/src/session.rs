//! Server-side session-backed validation-result repository.
//!
//! Alternative to the cookie backend for hosts with sticky sessions or a
//! shared session store. No integrity hash is needed: the visitor never
//! sees the stored record, only a session identifier.

use crate::repository::{policy_expiration, renewal_applies, store_key, ValidateResultRepository};
use crate::state::PersistedState;
use std::collections::HashMap;
use time::OffsetDateTime;
use turnstile_core::{Channel, ValidationResult};

/// Key-value session state for the current visitor.
///
/// Hosts adapt their session middleware to this; the in-memory
/// implementation backs tests and non-HTTP embeddings.
pub trait SessionStore {
    /// The stored record under a key, if any.
    fn get(&self, key: &str) -> Option<PersistedState>;

    /// Store a record under a key, replacing any previous one.
    fn insert(&mut self, key: &str, state: PersistedState);

    /// Remove the record under a key.
    fn remove(&mut self, key: &str);
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: HashMap<String, PersistedState>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<PersistedState> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: &str, state: PersistedState) {
        self.entries.insert(key.to_string(), state);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Repository storing validation results in the visitor's server session.
pub struct SessionValidateResultRepository<S> {
    store: S,
    settings: turnstile_core::SecuritySettings,
}

impl<S: SessionStore> SessionValidateResultRepository<S> {
    /// Create a repository over the current visitor's session.
    pub fn new(store: S, settings: turnstile_core::SecuritySettings) -> Self {
        Self { store, settings }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: SessionStore> ValidateResultRepository for SessionValidateResultRepository<S> {
    fn get(&mut self, channel: &Channel) -> Option<ValidationResult> {
        let key = store_key(channel);
        let mut state = self.store.get(&key)?;

        let now = OffsetDateTime::now_utc();
        if state.is_expired(now) {
            tracing::debug!(%channel, "stored validation expired");
            self.store.remove(&key);
            return None;
        }

        let Some(token) = state.to_token(channel) else {
            tracing::warn!(%channel, "stored validation is corrupt, dropping it");
            self.store.remove(&key);
            return None;
        };

        if renewal_applies(&self.settings, token.redirect_type()) {
            state.expiration = Some(now + self.settings.cookie_expiration());
            self.store.insert(&key, state);
        }

        Some(ValidationResult::AcceptedConfirmed {
            token,
            is_initial_validation: false,
        })
    }

    fn set(
        &mut self,
        channel: &Channel,
        result: &ValidationResult,
        expiration: Option<OffsetDateTime>,
    ) {
        let ValidationResult::AcceptedConfirmed { token, .. } = result else {
            return;
        };

        let expiration = expiration.unwrap_or_else(|| {
            policy_expiration(
                &self.settings,
                token.redirect_type(),
                OffsetDateTime::now_utc(),
            )
        });
        self.store
            .insert(&store_key(channel), PersistedState::from_token(token, expiration));
    }

    fn cancel(&mut self, channel: &Channel, _result: &ValidationResult) {
        self.store.remove(&store_key(channel));
    }
}
