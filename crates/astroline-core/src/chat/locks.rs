//! Per-session mutation locks.
//!
//! `SessionLocks` maps a session ID to an async mutex. A turn holds the
//! guard from session load through its final write, so two turns on the same
//! session never interleave their messages. Entries are removed when the last
//! holder (or waiter) lets go, so the map only holds sessions in use.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = DashMap<Uuid, Arc<Mutex<()>>>;

/// Concurrent registry of per-session locks. Cheap to clone.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<LockMap>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`.
    pub async fn acquire(&self, session_id: Uuid) -> SessionGuard {
        // Declared before the wait so it also runs when the wait is cancelled.
        let cleanup = EntryCleanup {
            session_id,
            map: Arc::clone(&self.inner),
        };
        // Clone the Arc out so the map shard is released before awaiting.
        let mutex = Arc::clone(self.inner.entry(session_id).or_default().value());
        let guard = mutex.lock_owned().await;
        SessionGuard {
            _guard: guard,
            cleanup,
        }
    }

    /// Number of sessions with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exclusive access to one session. Released on drop.
pub struct SessionGuard {
    // Field order matters: the mutex is released before the entry check.
    _guard: OwnedMutexGuard<()>,
    cleanup: EntryCleanup,
}

impl SessionGuard {
    pub fn session_id(&self) -> Uuid {
        self.cleanup.session_id
    }
}

/// Drops the map entry once nothing but the map references its mutex.
struct EntryCleanup {
    session_id: Uuid,
    map: Arc<LockMap>,
}

impl Drop for EntryCleanup {
    fn drop(&mut self) {
        self.map
            .remove_if(&self.session_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
