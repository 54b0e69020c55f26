//! Session state cell and observer subscriptions.

use recipebox_core::session::{AuthGrant, Credential, IdentityChange, SessionState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

type Callback = Box<dyn Fn(&SessionState) + Send + Sync>;

/// A registered observer.
///
/// `delivered` holds the version of the last snapshot handed to the callback;
/// an older snapshot arriving late from a slower publisher is dropped, so the
/// callback never goes back in time.
struct Observer {
    callback: Callback,
    delivered: Mutex<u64>,
    active: AtomicBool,
}

impl Observer {
    fn deliver(&self, version: u64, state: &SessionState) {
        let mut delivered = lock(&self.delivered);
        if !self.active.load(Ordering::Acquire) || version <= *delivered {
            return;
        }
        *delivered = version;
        (self.callback)(state);
    }
}

struct Inner {
    state: SessionState,
    /// Credential behind the current state; `None` unless `Active`.
    credential: Option<Credential>,
    version: u64,
    observers: Vec<(u64, Arc<Observer>)>,
    next_observer_id: u64,
}

/// The single-writer session cell.
///
/// Only `SessionManager` writes to it. The lock is never held while callbacks
/// run or across an `.await`.
pub(crate) struct SessionCell {
    inner: Mutex<Inner>,
    watch_tx: watch::Sender<SessionState>,
}

impl SessionCell {
    pub(crate) fn new() -> Self {
        let (watch_tx, _) = watch::channel(SessionState::Loading);
        Self {
            inner: Mutex::new(Inner {
                state: SessionState::Loading,
                credential: None,
                // Version 1 is the initial `Loading` snapshot.
                version: 1,
                observers: Vec::new(),
                next_observer_id: 0,
            }),
            watch_tx,
        }
    }

    pub(crate) fn current(&self) -> SessionState {
        lock(&self.inner).state.clone()
    }

    pub(crate) fn credential(&self) -> Option<Credential> {
        lock(&self.inner).credential.clone()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<SessionState> {
        self.watch_tx.subscribe()
    }

    /// Publishes the identity of a fresh grant.
    pub(crate) fn apply_grant(&self, grant: &AuthGrant) -> SessionState {
        let state = SessionState::from_identity(Some(&grant.identity));
        self.publish(state.clone(), Some(grant.credential.clone()));
        state
    }

    pub(crate) fn sign_out(&self) {
        self.publish(SessionState::SignedOut, None);
    }

    /// Applies a backend-originated change if it concerns the credential
    /// currently held. Returns whether it was applied.
    pub(crate) fn apply_change(&self, change: IdentityChange) -> bool {
        let delivery = {
            let mut inner = lock(&self.inner);
            if inner.credential.as_ref() != Some(&change.credential) {
                return false;
            }
            let credential = change.identity.as_ref().map(|_| change.credential.clone());
            let state = SessionState::from_identity(change.identity.as_ref());
            self.replace(&mut inner, state, credential)
        };
        if let Some((version, state, observers)) = delivery {
            notify(&observers, version, &state);
        }
        true
    }

    fn publish(&self, state: SessionState, credential: Option<Credential>) {
        let delivery = {
            let mut inner = lock(&self.inner);
            self.replace(&mut inner, state, credential)
        };
        if let Some((version, state, observers)) = delivery {
            notify(&observers, version, &state);
        }
    }

    /// Swaps the snapshot under the lock. Returns what has to be delivered,
    /// or `None` when the snapshot did not change.
    fn replace(
        &self,
        inner: &mut Inner,
        state: SessionState,
        credential: Option<Credential>,
    ) -> Option<(u64, SessionState, Vec<Arc<Observer>>)> {
        inner.credential = credential;
        if inner.state == state {
            return None;
        }
        inner.state = state.clone();
        inner.version += 1;
        self.watch_tx.send_replace(state.clone());

        tracing::debug!(version = inner.version, "Session state changed");
        let observers = inner.observers.iter().map(|(_, o)| o.clone()).collect();
        Some((inner.version, state, observers))
    }

    /// Registers `callback` and immediately replays the current snapshot to it.
    pub(crate) fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let observer = Arc::new(Observer {
            callback: Box::new(callback),
            delivered: Mutex::new(0),
            active: AtomicBool::new(true),
        });

        let (id, version, state) = {
            let mut inner = lock(&self.inner);
            let id = inner.next_observer_id;
            inner.next_observer_id += 1;
            inner.observers.push((id, observer.clone()));
            (id, inner.version, inner.state.clone())
        };
        observer.deliver(version, &state);

        Subscription {
            cell: Arc::downgrade(self),
            id,
            observer: Some(observer),
        }
    }

    fn remove(&self, id: u64) {
        lock(&self.inner).observers.retain(|(observer_id, _)| *observer_id != id);
    }

    #[cfg(test)]
    fn observer_count(&self) -> usize {
        lock(&self.inner).observers.len()
    }
}

fn notify(observers: &[Arc<Observer>], version: u64, state: &SessionState) {
    for observer in observers {
        observer.deliver(version, state);
    }
}

/// A poisoned lock only means an observer callback panicked; the guarded data
/// is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Handle returned by [`SessionManager::subscribe`](super::SessionManager::subscribe).
///
/// Delivery stops when the handle is dropped or [`unsubscribe`](Self::unsubscribe)d.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cell: Weak<SessionCell>,
    id: u64,
    observer: Option<Arc<Observer>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.active.store(false, Ordering::Release);
            if let Some(cell) = self.cell.upgrade() {
                cell.remove(self.id);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebox_core::session::Identity;

    fn grant(id: &str, token: &str) -> AuthGrant {
        AuthGrant {
            identity: Identity::with_email(id, format!("{}@example.com", id)),
            credential: Credential::new(token),
        }
    }

    fn recorder(cell: &Arc<SessionCell>) -> (Subscription, Arc<Mutex<Vec<SessionState>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = cell.subscribe(move |state| sink.lock().unwrap().push(state.clone()));
        (subscription, seen)
    }

    #[test]
    fn test_subscribe_replays_current_state() {
        let cell = Arc::new(SessionCell::new());
        cell.apply_grant(&grant("u-1", "t-1"));

        let (_subscription, seen) = recorder(&cell);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].session().unwrap().identity_id, "u-1");
    }

    #[test]
    fn test_changes_arrive_in_order_without_duplicates() {
        let cell = Arc::new(SessionCell::new());
        let (_subscription, seen) = recorder(&cell);

        let first = grant("u-1", "t-1");
        cell.apply_grant(&first);
        cell.apply_grant(&first);
        cell.sign_out();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].is_loading());
        assert!(seen[1].session().is_some());
        assert_eq!(seen[2], SessionState::SignedOut);
    }

    #[test]
    fn test_dropped_subscription_receives_nothing() {
        let cell = Arc::new(SessionCell::new());
        let (subscription, seen) = recorder(&cell);
        drop(subscription);

        cell.apply_grant(&grant("u-1", "t-1"));

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(cell.observer_count(), 0);
    }

    #[test]
    fn test_change_for_other_credential_is_ignored() {
        let cell = Arc::new(SessionCell::new());
        cell.apply_grant(&grant("u-2", "t-new"));

        let applied = cell.apply_change(IdentityChange {
            credential: Credential::new("t-old"),
            identity: None,
        });

        assert!(!applied);
        assert_eq!(cell.current().session().unwrap().identity_id, "u-2");
    }

    #[test]
    fn test_revocation_signs_out() {
        let cell = Arc::new(SessionCell::new());
        cell.apply_grant(&grant("u-1", "t-1"));

        assert!(cell.apply_change(IdentityChange {
            credential: Credential::new("t-1"),
            identity: None,
        }));

        assert_eq!(cell.current(), SessionState::SignedOut);
        assert_eq!(cell.credential(), None);
    }

    #[test]
    fn test_watch_mirrors_state() {
        let cell = Arc::new(SessionCell::new());
        let rx = cell.watch();
        cell.sign_out();
        assert_eq!(*rx.borrow(), SessionState::SignedOut);
    }

    #[test]
    fn test_callback_may_read_current_state() {
        let cell = Arc::new(SessionCell::new());
        let reader = cell.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = cell.subscribe(move |_| sink.lock().unwrap().push(reader.current()));

        cell.sign_out();

        assert_eq!(seen.lock().unwrap().last(), Some(&SessionState::SignedOut));
    }
}
