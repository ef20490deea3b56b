//! Keyed lock registry
//!
//! Maps an arbitrary hashable key to a stable lock, reused by all concurrent
//! callers presenting the same key, while never growing unbounded as the key
//! space grows.
//!
//! # Reclamation
//!
//! The registry holds only [`Weak`] references to the underlying mutexes;
//! callers hold strong [`LockHandle`]s. When the last handle for a key is
//! dropped, the key is pushed onto a reclamation queue (best effort). The
//! queue is drained on the next [`LockRegistry::lock_handle`] call, by an
//! explicit [`LockRegistry::cleanup`], and by a background sweeper thread
//! running on a fixed interval. The sweep additionally removes any dead
//! entries whose drop raced the queue, so registry size is bounded by the
//! number of currently live keys, not the historical total.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::trace;

/// Default interval between background sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A key that can identify a lock in the registry
///
/// The nil sentinel (zero for integer keys, empty for strings) is reserved
/// and rejected by the lock layer.
pub trait LockKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Whether this key is the nil sentinel
    fn is_nil(&self) -> bool;
}

impl LockKey for u64 {
    fn is_nil(&self) -> bool {
        *self == 0
    }
}

impl LockKey for i64 {
    fn is_nil(&self) -> bool {
        *self == 0
    }
}

impl LockKey for String {
    fn is_nil(&self) -> bool {
        self.is_empty()
    }
}

/// The nil sentinel key was passed to the lock layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lock key cannot be the nil sentinel")]
pub struct InvalidKeyError;

/// Shared state between the registry, its handles, and the sweeper thread
struct RegistryInner<K: LockKey> {
    /// key -> weak reference to the key's mutex
    locks: DashMap<K, Weak<Mutex<()>>>,

    /// Keys whose last handle was dropped, pending removal from `locks`
    reclaimable: StdMutex<Vec<K>>,

    /// Set by `shutdown()`; observed by templates waiting on a lock
    shut_down: AtomicBool,
}

impl<K: LockKey> RegistryInner<K> {
    /// Drain the reclamation queue, removing entries that are still dead
    fn drain_pending(&self) -> usize {
        let pending: Vec<K> = {
            let mut queue = self
                .reclaimable
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            queue.drain(..).collect()
        };

        let mut removed = 0;
        for key in pending {
            // Re-check liveness: the key may have been re-acquired since the
            // drop that enqueued it.
            if self
                .locks
                .remove_if(&key, |_, weak| weak.strong_count() == 0)
                .is_some()
            {
                removed += 1;
            }
        }
        removed
    }

    /// Full sweep: drain the queue, then drop any remaining dead entries
    fn sweep(&self) -> usize {
        let mut removed = self.drain_pending();
        let before = self.locks.len();
        self.locks.retain(|_, weak| weak.strong_count() > 0);
        removed += before.saturating_sub(self.locks.len());
        removed
    }
}

/// Strong reference to one key's lock
///
/// Borrowed from the registry for the duration of one locked region; the
/// registry entry becomes reclaimable once every handle for the key has been
/// dropped and no execution holds or waits on the lock.
#[derive(Clone)]
pub struct LockHandle<K: LockKey> {
    raw: Arc<Mutex<()>>,
    key: K,
    registry: Weak<RegistryInner<K>>,
}

impl<K: LockKey> LockHandle<K> {
    /// Attempt to enter the exclusive region without blocking
    pub fn try_lock(&self) -> Option<MutexGuard<'_, ()>> {
        self.raw.try_lock()
    }

    /// Attempt to enter the exclusive region, waiting up to `timeout`
    pub fn try_lock_for(&self, timeout: Duration) -> Option<MutexGuard<'_, ()>> {
        self.raw.try_lock_for(timeout)
    }

    /// The key this handle locks
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: LockKey> Drop for LockHandle<K> {
    fn drop(&mut self) {
        // Last strong reference going away: flag the key for reclamation.
        // The count check can race a concurrent drop, in which case neither
        // handle enqueues the key; the periodic sweep picks those up.
        if Arc::strong_count(&self.raw) == 1 {
            if let Some(inner) = self.registry.upgrade() {
                inner
                    .reclaimable
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(self.key.clone());
            }
        }
    }
}

/// Background sweeper thread plus its stop signal
struct Sweeper {
    stop: mpsc::Sender<()>,
    thread: thread::JoinHandle<()>,
}

/// Registry of per-key locks
///
/// Process-scoped shared state, constructed once at startup and passed by
/// `Arc` to every component needing lock services. The create-or-reuse path
/// is atomic with respect to concurrent callers racing on the same key: two
/// concurrent first-time callers always receive handles to the *same*
/// underlying mutex.
pub struct LockRegistry<K: LockKey> {
    inner: Arc<RegistryInner<K>>,
    sweeper: StdMutex<Option<Sweeper>>,
}

impl<K: LockKey> LockRegistry<K> {
    /// Create a registry sweeping on the default 60 second interval
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    /// Create a registry with a custom background sweep interval
    pub fn with_sweep_interval(interval: Duration) -> Self {
        let inner = Arc::new(RegistryInner {
            locks: DashMap::new(),
            reclaimable: StdMutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        });

        let (stop, ticks) = mpsc::channel::<()>();
        let weak = Arc::downgrade(&inner);
        // The sweeper holds only a weak reference so a dropped registry does
        // not stay alive through its own maintenance thread.
        let sweeper = thread::Builder::new()
            .name("lock-registry-sweep".to_string())
            .spawn(move || {
                while let Err(RecvTimeoutError::Timeout) = ticks.recv_timeout(interval) {
                    let Some(inner) = weak.upgrade() else { break };
                    let removed = inner.sweep();
                    if removed > 0 {
                        trace!(removed, "periodic lock sweep reclaimed entries");
                    }
                }
            })
            .ok()
            .map(|thread| Sweeper { stop, thread });

        LockRegistry {
            inner,
            sweeper: StdMutex::new(sweeper),
        }
    }

    /// Get a handle to the lock for `key`, creating the lock if necessary
    ///
    /// Repeated calls with the same key return handles to the same lock for
    /// as long as any handle is alive; once all handles are dropped the key
    /// may be reclaimed and a later call creates a fresh lock.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKeyError`] if `key` is the nil sentinel.
    pub fn lock_handle(&self, key: &K) -> Result<LockHandle<K>, InvalidKeyError> {
        if key.is_nil() {
            return Err(InvalidKeyError);
        }

        // Reactive reclamation path: drop anything already known collectible
        // before (possibly) growing the map.
        self.inner.drain_pending();

        let mut slot = self.inner.locks.entry(key.clone()).or_insert_with(Weak::new);
        let raw = match slot.upgrade() {
            Some(live) => live,
            None => {
                let fresh = Arc::new(Mutex::new(()));
                *slot = Arc::downgrade(&fresh);
                fresh
            }
        };
        drop(slot);

        Ok(LockHandle {
            raw,
            key: key.clone(),
            registry: Arc::downgrade(&self.inner),
        })
    }

    /// Drain pending reclamations and sweep dead entries
    ///
    /// Returns the number of registry entries removed. Idempotent and safe
    /// to call concurrently with [`LockRegistry::lock_handle`].
    pub fn cleanup(&self) -> usize {
        self.inner.sweep()
    }

    /// Stop the background sweeper and clear the registry
    ///
    /// Templates observing the shutdown while waiting for a lock abort with
    /// an interruption error. `lock_handle` behavior after shutdown is a
    /// process-teardown path and carries no reuse guarantees.
    pub fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::SeqCst);

        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sweeper) = sweeper {
            let _ = sweeper.stop.send(());
            let _ = sweeper.thread.join();
        }

        self.inner.locks.clear();
    }

    /// Whether `shutdown()` has been called
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Number of registered keys, live or pending reclamation
    pub fn len(&self) -> usize {
        self.inner.locks.len()
    }

    /// Whether the registry currently tracks no keys
    pub fn is_empty(&self) -> bool {
        self.inner.locks.is_empty()
    }
}

impl<K: LockKey> Default for LockRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: LockKey> Drop for LockRegistry<K> {
    fn drop(&mut self) {
        if !self.is_shut_down() {
            self.shutdown();
        }
    }
}
