//! Synchronized execution template
//!
//! Runs a unit of work with the guarantee that, for a given key, at most one
//! unit of work is executing at any instant, while bounding how long a caller
//! will wait to enter that exclusive region.
//!
//! The underlying primitive is a deadline-capable acquire
//! ([`parking_lot::Mutex::try_lock_for`]), so the timeout budget is actually
//! enforced rather than documented around a blocking-forever lock.
//!
//! # Failure taxonomy
//!
//! - Acquisition-phase failures are retried up to the budget; exhaustion
//!   raises [`LockError::Timeout`].
//! - A registry shutdown observed while waiting or between retries raises
//!   [`LockError::Interrupted`] and aborts immediately.
//! - An error from the unit of work itself is wrapped as
//!   [`LockError::Execution`] and propagated immediately, never retried: the
//!   block already ran under exclusive access and a retry would re-run its
//!   side effects.

use std::error::Error as StdError;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::MutexGuard;
use thiserror::Error;
use tracing::{trace, warn};

use super::registry::{LockHandle, LockKey, LockRegistry};

/// Default cumulative acquisition timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default number of acquisition retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default pause between acquisition attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Retry/timeout budget for one `execute_with_lock` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    /// Cumulative time budget for entering the exclusive region
    pub timeout: Duration,

    /// Acquisition attempts allowed after the first one
    pub max_retries: u32,

    /// Pause between attempts (clipped to the remaining budget)
    pub retry_delay: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        LockConfig {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Failure of one `execute_with_lock` call
#[derive(Debug, Error)]
pub enum LockError<E> {
    /// The nil sentinel key was passed
    #[error("lock key cannot be the nil sentinel")]
    InvalidKey,

    /// The exclusive region could not be entered within the budget
    #[error("failed to acquire lock within {waited_ms} ms ({attempts} attempts)")]
    Timeout {
        /// Cumulative time spent waiting
        waited_ms: u64,
        /// Acquisition attempts made
        attempts: u32,
    },

    /// Registry shutdown observed while waiting for the lock
    #[error("interrupted while waiting to acquire lock")]
    Interrupted,

    /// The unit of work failed after the lock was acquired
    ///
    /// Carries the original cause; the lock layer performed no retry.
    #[error("error executing block under lock")]
    Execution {
        /// The error raised by the unit of work
        #[source]
        source: E,
    },
}

/// Internal acquisition failure, converted into [`LockError`] at the boundary
enum AcquireFailure {
    Timeout { waited_ms: u64, attempts: u32 },
    Interrupted,
}

/// Executes units of work inside per-key exclusive regions
///
/// The registry is an injected collaborator (one process-wide instance shared
/// by `Arc`), not an ambient singleton; cloning the template is cheap and
/// every clone serializes against the same locks.
#[derive(Clone)]
pub struct LockTemplate<K: LockKey> {
    registry: Arc<LockRegistry<K>>,
    config: LockConfig,
}

impl<K: LockKey> LockTemplate<K> {
    /// Create a template with the default retry/timeout budget
    pub fn new(registry: Arc<LockRegistry<K>>) -> Self {
        Self::with_config(registry, LockConfig::default())
    }

    /// Create a template with an explicit budget
    pub fn with_config(registry: Arc<LockRegistry<K>>, config: LockConfig) -> Self {
        LockTemplate { registry, config }
    }

    /// The registry this template acquires locks from
    pub fn registry(&self) -> &Arc<LockRegistry<K>> {
        &self.registry
    }

    /// The configured retry/timeout budget
    pub fn config(&self) -> LockConfig {
        self.config
    }

    /// Run `block` inside `key`'s exclusive region with the default timeout
    ///
    /// # Errors
    ///
    /// See [`LockError`]; a block error is wrapped as
    /// [`LockError::Execution`] with the cause attached.
    pub fn execute_with_lock<T, E, F>(&self, key: &K, block: F) -> Result<T, LockError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: StdError + 'static,
    {
        self.execute_with_lock_timeout(key, block, self.config.timeout)
    }

    /// Run `block` inside `key`'s exclusive region with an explicit timeout
    ///
    /// The block runs entirely inside the region or not at all; once entered
    /// it runs to completion (or failure) with no other execution holding the
    /// same key's region concurrently.
    pub fn execute_with_lock_timeout<T, E, F>(
        &self,
        key: &K,
        block: F,
        timeout: Duration,
    ) -> Result<T, LockError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: StdError + 'static,
    {
        let handle = self
            .registry
            .lock_handle(key)
            .map_err(|_| LockError::InvalidKey)?;

        let started = Instant::now();
        let guard = match self.acquire(&handle, started, timeout) {
            Ok(guard) => guard,
            Err(AcquireFailure::Timeout { waited_ms, attempts }) => {
                warn!(?key, waited_ms, attempts, "lock acquisition timed out");
                return Err(LockError::Timeout { waited_ms, attempts });
            }
            Err(AcquireFailure::Interrupted) => {
                warn!(?key, "lock acquisition interrupted by registry shutdown");
                return Err(LockError::Interrupted);
            }
        };
        trace!(
            ?key,
            waited_ms = started.elapsed().as_millis() as u64,
            "entered exclusive region"
        );

        let result = block().map_err(|source| LockError::Execution { source });
        drop(guard);
        result
    }

    /// Acquisition loop: up to `max_retries + 1` deadline-bounded attempts
    fn acquire<'h>(
        &self,
        handle: &'h LockHandle<K>,
        started: Instant,
        timeout: Duration,
    ) -> Result<MutexGuard<'h, ()>, AcquireFailure> {
        let deadline = started + timeout;
        let mut attempts = 0u32;

        loop {
            if self.registry.is_shut_down() {
                return Err(AcquireFailure::Interrupted);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(AcquireFailure::Timeout {
                    waited_ms: started.elapsed().as_millis() as u64,
                    attempts,
                });
            }

            attempts += 1;
            if let Some(guard) = handle.try_lock_for(remaining) {
                return Ok(guard);
            }

            if attempts > self.config.max_retries {
                return Err(AcquireFailure::Timeout {
                    waited_ms: started.elapsed().as_millis() as u64,
                    attempts,
                });
            }

            let pause = self
                .config
                .retry_delay
                .min(deadline.saturating_duration_since(Instant::now()));
            thread::sleep(pause);
        }
    }
}
