//! Concurrency integration tests
//!
//! These tests exercise the properties the lock layer exists to provide:
//! linearizable balance sums under concurrent mutation, bounded registry
//! growth, and zero mutation on lock timeout. Store latency is injected in
//! the hot tests so that, without the lock, lost updates would be all but
//! guaranteed.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use point_ledger::core::TransactionCoordinator;
use point_ledger::lock::{LockConfig, LockRegistry, LockTemplate};
use point_ledger::store::{InMemoryAccountStore, InMemoryLedgerStore};
use point_ledger::types::{AccountId, PointError, TransactionKind};

type Coordinator = TransactionCoordinator<InMemoryAccountStore, InMemoryLedgerStore>;

fn coordinator(
    config: LockConfig,
    store_latency: Option<Duration>,
) -> (Coordinator, Arc<LockRegistry<AccountId>>) {
    let registry = Arc::new(LockRegistry::with_sweep_interval(Duration::from_secs(3600)));
    let accounts = Arc::new(match store_latency {
        Some(latency) => InMemoryAccountStore::with_latency(latency),
        None => InMemoryAccountStore::new(),
    });
    let ledger = Arc::new(match store_latency {
        Some(latency) => InMemoryLedgerStore::with_latency(latency),
        None => InMemoryLedgerStore::new(),
    });
    let template = LockTemplate::with_config(Arc::clone(&registry), config);
    (
        TransactionCoordinator::new(accounts, ledger, template),
        registry,
    )
}

/// Generous budget: the point of the hot tests is correctness of the final
/// sum, not tight latency.
fn patient_config() -> LockConfig {
    LockConfig {
        timeout: Duration::from_secs(60),
        max_retries: 3,
        retry_delay: Duration::from_millis(10),
    }
}

#[test]
fn concurrent_charges_sum_exactly() {
    const EXECUTE_COUNT: usize = 100;
    const CHARGE_AMOUNT: i64 = 10_000;
    const ACCOUNT: AccountId = 1;

    let (coordinator, _registry) = coordinator(patient_config(), None);

    let workers: Vec<_> = (0..EXECUTE_COUNT)
        .map(|_| {
            let coordinator = coordinator.clone();
            thread::spawn(move || coordinator.charge(ACCOUNT, CHARGE_AMOUNT))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap().unwrap();
    }

    let account = coordinator.balance_of(ACCOUNT);
    assert_eq!(account.balance, EXECUTE_COUNT as i64 * CHARGE_AMOUNT);

    let history = coordinator.history_of(ACCOUNT);
    assert_eq!(history.len(), EXECUTE_COUNT);
    assert!(history
        .iter()
        .all(|entry| entry.kind == TransactionKind::Charge && entry.amount == CHARGE_AMOUNT));
}

#[test]
fn concurrent_uses_drain_to_zero() {
    const EXECUTE_COUNT: usize = 100;
    const USE_AMOUNT: i64 = 1_000;
    const ACCOUNT: AccountId = 2;

    let (coordinator, _registry) = coordinator(patient_config(), None);
    coordinator
        .charge(ACCOUNT, EXECUTE_COUNT as i64 * USE_AMOUNT)
        .unwrap();

    let workers: Vec<_> = (0..EXECUTE_COUNT)
        .map(|_| {
            let coordinator = coordinator.clone();
            thread::spawn(move || coordinator.use_points(ACCOUNT, USE_AMOUNT))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap().unwrap();
    }

    assert_eq!(coordinator.balance_of(ACCOUNT).balance, 0);
    let history = coordinator.history_of(ACCOUNT);
    assert_eq!(history.len(), EXECUTE_COUNT + 1);
}

#[test]
fn slow_stores_still_sum_exactly() {
    // With a 2 ms sleep inside every store call, unsynchronized
    // read-modify-write would interleave constantly.
    const EXECUTE_COUNT: usize = 20;
    const CHARGE_AMOUNT: i64 = 10_000;
    const ACCOUNT: AccountId = 3;

    let (coordinator, _registry) =
        coordinator(patient_config(), Some(Duration::from_millis(2)));

    let workers: Vec<_> = (0..EXECUTE_COUNT)
        .map(|_| {
            let coordinator = coordinator.clone();
            thread::spawn(move || coordinator.charge(ACCOUNT, CHARGE_AMOUNT))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap().unwrap();
    }

    assert_eq!(
        coordinator.balance_of(ACCOUNT).balance,
        EXECUTE_COUNT as i64 * CHARGE_AMOUNT
    );
}

#[test]
fn mixed_charges_and_uses_settle_consistently() {
    const PAIRS: usize = 50;
    const ACCOUNT: AccountId = 4;

    let (coordinator, _registry) = coordinator(patient_config(), None);
    // Seed enough balance that every use is admissible regardless of order.
    coordinator.charge(ACCOUNT, 1_000_000).unwrap();

    let mut workers = Vec::new();
    for _ in 0..PAIRS {
        let charge = coordinator.clone();
        workers.push(thread::spawn(move || charge.charge(ACCOUNT, 10_000)));
        let spend = coordinator.clone();
        workers.push(thread::spawn(move || spend.use_points(ACCOUNT, 1_000)));
    }
    for worker in workers {
        worker.join().unwrap().unwrap();
    }

    let expected = 1_000_000 + PAIRS as i64 * 10_000 - PAIRS as i64 * 1_000;
    assert_eq!(coordinator.balance_of(ACCOUNT).balance, expected);
    assert_eq!(coordinator.history_of(ACCOUNT).len(), 2 * PAIRS + 1);
}

#[test]
fn registry_stays_bounded_after_many_keys() {
    const DISTINCT_ACCOUNTS: u64 = 64;

    let (coordinator, registry) = coordinator(patient_config(), None);
    for account in 1..=DISTINCT_ACCOUNTS {
        coordinator.charge(account, 10_000).unwrap();
    }

    // Every operation has completed, so no handle is alive; a cleanup must
    // reclaim everything rather than leaving one entry per ever-seen key.
    registry.cleanup();
    assert!(registry.is_empty());

    // Accounts themselves persist; only the locks are reclaimed.
    assert_eq!(coordinator.balance_of(1).balance, 10_000);
}

#[test]
fn distinct_accounts_do_not_contend() {
    // Each operation holds its lock for several hundred ms of store
    // latency. With a 150 ms acquisition timeout, two operations sharing one
    // lock could not both pass; on distinct accounts both must succeed.
    let (coordinator, _registry) = coordinator(
        LockConfig {
            timeout: Duration::from_millis(150),
            max_retries: 0,
            retry_delay: Duration::from_millis(10),
        },
        Some(Duration::from_millis(100)),
    );

    let first = {
        let coordinator = coordinator.clone();
        thread::spawn(move || coordinator.charge(10, 10_000))
    };
    let second = {
        let coordinator = coordinator.clone();
        thread::spawn(move || coordinator.charge(11, 10_000))
    };
    first.join().unwrap().unwrap();
    second.join().unwrap().unwrap();
}

#[test]
fn timed_out_caller_mutates_nothing() {
    const ACCOUNT: AccountId = 12;

    let (coordinator, registry) = coordinator(
        LockConfig {
            timeout: Duration::from_millis(50),
            max_retries: 0,
            retry_delay: Duration::from_millis(10),
        },
        None,
    );

    let handle = registry.lock_handle(&ACCOUNT).unwrap();
    let guard = handle.try_lock().unwrap();

    let worker = {
        let coordinator = coordinator.clone();
        thread::spawn(move || coordinator.charge(ACCOUNT, 10_000))
    };
    let result = worker.join().unwrap();
    drop(guard);

    assert!(matches!(result, Err(PointError::LockTimeout { .. })));
    assert_eq!(coordinator.balance_of(ACCOUNT).balance, 0);
    assert!(coordinator.history_of(ACCOUNT).is_empty());
}
