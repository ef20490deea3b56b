//! Keyed locking infrastructure
//!
//! This module contains the concurrency-control core of the crate:
//! - `registry` - one mutual-exclusion primitive per logical key, created
//!   lazily and reclaimed automatically once unreferenced
//! - `template` - runs a unit of work inside a key's exclusive region with
//!   a retry/timeout budget and a precise failure taxonomy
//!
//! The lock layer is generic over the key type and carries no business
//! meaning; the service uses it with `AccountId` keys to serialize all
//! mutations of one account's balance.

pub mod registry;
pub mod template;

pub use registry::{InvalidKeyError, LockHandle, LockKey, LockRegistry, DEFAULT_SWEEP_INTERVAL};
pub use template::{LockConfig, LockError, LockTemplate};
