//! Who is signed in, and who wants to know when that changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use serde::{Deserialize, Serialize};

/// Backend user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity used by the offline backend.
    pub fn local() -> Self {
        Self("local".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn(UserId),
    SignedOut,
}

pub type IdentityCallback = Arc<dyn Fn(&IdentityEvent) + Send + Sync>;

/// Source of the current identity.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;

    /// Register a callback for sign-in / sign-out. The callback stays
    /// attached until the returned subscription is dropped.
    fn on_identity_change(&self, callback: IdentityCallback) -> Subscription;
}

type Subscribers = Mutex<HashMap<u64, IdentityCallback>>;

/// Detaches its callback when dropped.
#[must_use = "dropping a Subscription detaches the callback"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Subscribers>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subs) = self.subscribers.upgrade() {
            subs.lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&self.id);
        }
    }
}

/// In-process identity holder with change notification.
///
/// Backends that own an auth session embed one of these and call
/// [`IdentityHub::set`] whenever the session changes.
pub struct IdentityHub {
    current: RwLock<Option<UserId>>,
    subscribers: Arc<Subscribers>,
    next_id: AtomicU64,
}

impl IdentityHub {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// A hub that starts signed in, for the single-user offline backend.
    pub fn signed_in(user: UserId) -> Self {
        let hub = Self::new();
        *hub.current.write().unwrap_or_else(|e| e.into_inner()) = Some(user);
        hub
    }

    /// Replace the current identity, notifying subscribers if it changed.
    pub fn set(&self, user: Option<UserId>) {
        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            if *current == user {
                return;
            }
            *current = user.clone();
        }

        let event = match user {
            Some(id) => IdentityEvent::SignedIn(id),
            None => IdentityEvent::SignedOut,
        };
        tracing::info!(?event, "identity changed");

        // Snapshot so callbacks may subscribe or unsubscribe.
        let callbacks: Vec<IdentityCallback> = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for cb in callbacks {
            cb(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for IdentityHub {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for IdentityHub {
    fn current_user_id(&self) -> Option<UserId> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn on_identity_change(&self, callback: IdentityCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, callback);
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }
}

/// Thin wrapper around the OS keyring for the persisted auth session.
pub mod keyring_store {
    use crate::error::IdentityError;

    const SERVICE: &str = "anchor";

    pub fn get(key: &str) -> Result<Option<String>, IdentityError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), IdentityError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), IdentityError> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
