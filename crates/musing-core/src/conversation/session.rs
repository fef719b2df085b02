//! Per-user session state

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::Phase;
use crate::model::UserId;

/// Transient state for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub phase: Phase,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Idle,
            last_seen: now,
        }
    }

    /// Record activity. An abandoned flow older than `idle_timeout` is reset
    /// first; returns true when that happened.
    pub fn touch(&mut self, now: DateTime<Utc>, idle_timeout: Option<Duration>) -> bool {
        let expired = match idle_timeout {
            Some(timeout) => !self.phase.is_idle() && now - self.last_seen > timeout,
            None => false,
        };
        if expired {
            self.phase = Phase::Idle;
        }
        self.last_seen = now;
        expired
    }
}

/// Sessions keyed by user.
///
/// Each user gets one lock; holding it for a whole event serializes that
/// user's events without blocking anyone else.
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, Arc<Mutex<Session>>>>,
    idle_timeout: Option<Duration>,
}

impl SessionStore {
    /// `idle_timeout` of `None` keeps abandoned flows parked forever
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Session handle for `user`, created on first use
    pub async fn session(&self, user: UserId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&user) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(user)
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(Utc::now())))),
        )
    }

    /// Lock the live session for `user`.
    ///
    /// A handle evicted while waiting for its lock is dropped and the lookup
    /// repeats, so the returned guard always belongs to the registered session.
    pub async fn lock(&self, user: UserId) -> OwnedMutexGuard<Session> {
        loop {
            let handle = self.session(user).await;
            let guard = Arc::clone(&handle).lock_owned().await;
            let live = self
                .sessions
                .read()
                .await
                .get(&user)
                .is_some_and(|current| Arc::ptr_eq(current, &handle));
            if live {
                return guard;
            }
            tracing::debug!(user = %user, "Session evicted while waiting, retrying");
        }
    }

    /// Current phase for `user` (idle when unknown)
    pub async fn phase(&self, user: UserId) -> Phase {
        let session = self.sessions.read().await.get(&user).cloned();
        match session {
            Some(session) => session.lock().await.phase,
            None => Phase::Idle,
        }
    }

    /// Number of tracked users
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions inactive for longer than the idle timeout.
    ///
    /// Sessions currently handling an event are skipped.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let Some(timeout) = self.idle_timeout else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => now - guard.last_seen <= timeout,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle sessions");
        }
        evicted
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Some(Duration::minutes(60)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ThoughtId;

    #[test]
    fn test_touch_resets_abandoned_flow() {
        let start = Utc::now();
        let mut session = Session::new(start);
        session.phase = Phase::AwaitingEditText {
            thought_id: ThoughtId(1),
        };

        let timeout = Some(Duration::minutes(30));
        assert!(!session.touch(start + Duration::minutes(10), timeout));
        assert!(!session.phase.is_idle());

        assert!(session.touch(start + Duration::minutes(50), timeout));
        assert!(session.phase.is_idle());
    }

    #[test]
    fn test_touch_without_timeout_never_resets() {
        let start = Utc::now();
        let mut session = Session::new(start);
        session.phase = Phase::AwaitingThoughtText;
        assert!(!session.touch(start + Duration::days(30), None));
        assert_eq!(session.phase, Phase::AwaitingThoughtText);
    }

    #[tokio::test]
    async fn test_session_created_once_per_user() {
        let store = SessionStore::default();
        let a = store.session(UserId(1)).await;
        let b = store.session(UserId(1)).await;
        assert!(Arc::ptr_eq(&a, &b));

        store.session(UserId(2)).await;
        assert_eq!(store.len().await, 2);
        assert_eq!(store.phase(UserId(3)).await, Phase::Idle);
    }

    #[tokio::test]
    async fn test_evict_idle_skips_busy_sessions() {
        let store = SessionStore::new(Some(Duration::minutes(5)));
        let later = Utc::now() + Duration::minutes(30);

        let busy = store.session(UserId(1)).await;
        store.session(UserId(2)).await;

        let _guard = busy.lock().await;
        assert_eq!(store.evict_idle(later).await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_lock_skips_evicted_handle() {
        let store = SessionStore::new(Some(Duration::minutes(5)));
        let stale = store.session(UserId(1)).await;
        stale.lock().await.last_seen = Utc::now() - Duration::minutes(30);
        assert_eq!(store.evict_idle(Utc::now()).await, 1);

        let mut guard = store.lock(UserId(1)).await;
        guard.phase = Phase::AwaitingThoughtText;
        drop(guard);

        assert_eq!(store.phase(UserId(1)).await, Phase::AwaitingThoughtText);
        assert!(!Arc::ptr_eq(&stale, &store.session(UserId(1)).await));
        assert!(stale.lock().await.phase.is_idle());
    }

    #[tokio::test]
    async fn test_lock_waits_out_concurrent_eviction() {
        let store = Arc::new(SessionStore::new(Some(Duration::minutes(5))));
        let handle = store.session(UserId(1)).await;
        let mut held = Arc::clone(&handle).lock_owned().await;
        held.last_seen = Utc::now() - Duration::minutes(30);

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut guard = store.lock(UserId(1)).await;
                guard.phase = Phase::AwaitingThoughtText;
            })
        };
        tokio::task::yield_now().await;

        // Evict while the waiter is parked on the old handle's lock
        {
            let mut sessions = store.sessions.write().await;
            sessions.remove(&UserId(1));
        }
        drop(held);
        waiter.await.unwrap();

        assert_eq!(store.phase(UserId(1)).await, Phase::AwaitingThoughtText);
        assert!(handle.lock().await.phase.is_idle());
    }

    #[tokio::test]
    async fn test_no_eviction_without_timeout() {
        let store = SessionStore::new(None);
        store.session(UserId(1)).await;
        assert_eq!(store.evict_idle(Utc::now() + Duration::days(1)).await, 0);
        assert!(!store.is_empty().await);
    }
}
