//! Process-wide session store with change notifications.
//!
//! There is exactly one [`SessionStore`] per running dashboard. The auth
//! service writes to it; the backend client reads the current token from it;
//! the session guard subscribes to it.
//!
//! # Delivery guarantees
//!
//! - Every published [`AuthEvent`] is queued, in order, for every live
//!   subscription. Rapid sign-in/sign-out churn is not coalesced.
//! - Dropping a [`SessionSubscription`] (or calling
//!   [`SessionSubscription::unsubscribe`]) removes it from the store. No event
//!   published afterwards reaches it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::Session;

/// A change to the authentication state.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// Credentials were exchanged for a new session.
    SignedIn(Session),
    /// The access token was renewed; same user.
    TokenRefreshed(Session),
    /// The session ended (explicit sign-out, or refresh failed).
    SignedOut,
}

impl AuthEvent {
    /// The session in effect after this event.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(s) | Self::TokenRefreshed(s) => Some(s),
            Self::SignedOut => None,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::SignedOut => "signed_out",
        }
    }
}

/// Read access to the current session plus change notifications.
///
/// Implemented by [`SessionStore`] (plain read) and by
/// [`Auth`](crate::services::auth::Auth) (refreshes expired tokens first).
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// The current session, if any.
    async fn get_session(&self) -> Option<Session>;

    /// Register for session-change notifications.
    fn on_session_change(&self) -> SessionSubscription;
}

/// Observable holder of the current session.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    current: Option<Session>,
    subscribers: HashMap<u64, mpsc::UnboundedSender<AuthEvent>>,
    next_id: u64,
}

impl StoreInner {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore {
    /// Create an empty store (no session, no subscribers).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner.lock().current.clone()
    }

    /// Apply an event and fan it out to every subscriber.
    pub fn publish(&self, event: AuthEvent) {
        let mut state = self.inner.lock();
        state.current = event.session().cloned();
        state
            .subscribers
            .retain(|_, tx| tx.send(event.clone()).is_ok());
        tracing::debug!(
            event = event.kind(),
            subscribers = state.subscribers.len(),
            "session event published"
        );
    }

    /// Register a new subscription.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, tx);

        SessionSubscription {
            id,
            rx,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("SessionStore")
            .field("signed_in", &state.current.is_some())
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

#[async_trait]
impl SessionSource for SessionStore {
    async fn get_session(&self) -> Option<Session> {
        self.current()
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.subscribe()
    }
}

/// Handle to a registered session-change subscription.
///
/// Unregisters itself on drop.
#[derive(Debug)]
pub struct SessionSubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<AuthEvent>,
    store: Weak<StoreInner>,
}

impl SessionSubscription {
    /// Wait for the next event. Returns `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        self.rx.recv().await
    }

    /// Explicitly release the subscription.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.lock().subscribers.remove(&self.id);
        }
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use secrecy::SecretString;

    use vendor_dash_core::UserId;

    use super::*;

    fn session(user: &str) -> Session {
        Session {
            access_token: SecretString::from("at"),
            refresh_token: SecretString::from("rt"),
            user_id: UserId::new(user),
            email: None,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_publish_updates_current_and_notifies() {
        let store = SessionStore::new();
        let mut sub = store.subscribe();

        store.publish(AuthEvent::SignedIn(session("u1")));

        let event = sub.recv().await;
        assert!(matches!(event, Some(AuthEvent::SignedIn(s)) if s.user_id.as_str() == "u1"));
        assert_eq!(store.current().map(|s| s.user_id), Some(UserId::new("u1")));
    }

    #[tokio::test]
    async fn test_churn_is_delivered_in_order() {
        let store = SessionStore::new();
        let mut sub = store.subscribe();

        store.publish(AuthEvent::SignedIn(session("u1")));
        store.publish(AuthEvent::SignedOut);
        store.publish(AuthEvent::SignedIn(session("u1")));

        let kinds = [
            sub.recv().await.map(|e| e.kind()),
            sub.recv().await.map(|e| e.kind()),
            sub.recv().await.map(|e| e.kind()),
        ];
        assert_eq!(
            kinds,
            [Some("signed_in"), Some("signed_out"), Some("signed_in")]
        );
        assert!(store.current().is_some());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = SessionStore::new();
        let first = store.subscribe();
        let second = store.subscribe();
        assert_eq!(store.subscriber_count(), 2);

        first.unsubscribe();
        assert_eq!(store.subscriber_count(), 1);
        drop(second);
        assert_eq!(store.subscriber_count(), 0);

        // Publishing with no subscribers still updates the current session.
        store.publish(AuthEvent::SignedIn(session("u2")));
        assert!(store.current().is_some());
    }

    #[tokio::test]
    async fn test_subscription_outliving_store_ends() {
        let store = SessionStore::new();
        let mut sub = store.subscribe();
        drop(store);
        assert!(sub.recv().await.is_none());
    }
}
