//! Point Ledger CLI
//!
//! Reads a CSV of balance operations, applies them concurrently through the
//! transaction coordinator, and writes the final balance snapshot to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > balances.csv
//! cargo run -- --workers 8 operations.csv > balances.csv
//! cargo run -- --timeout-ms 250 --store-latency-ms 50 operations.csv
//! ```
//!
//! Input columns: `kind,account,amount` where kind is `charge` or `use`.
//! Rejected operations (policy violations, lock timeouts) are reported on
//! stderr and do not abort the batch; the snapshot reflects only committed
//! mutations.
//!
//! # Exit Codes
//!
//! - 0: Success (possibly with rejected operations)
//! - 1: Fatal error (input unreadable, output unwritable, worker panic)

use std::collections::BTreeSet;
use std::process;
use std::sync::Arc;

use point_ledger::cli;
use point_ledger::core::TransactionCoordinator;
use point_ledger::io::{read_operations_csv, write_balances_csv, OperationRecord};
use point_ledger::lock::{LockRegistry, LockTemplate};
use point_ledger::store::{InMemoryAccountStore, InMemoryLedgerStore};
use point_ledger::types::{AccountId, BalanceAccount, PointError, TransactionKind};
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let operations = match read_operations_csv(&args.input_file) {
        Ok(operations) => operations,
        Err(error) => {
            eprintln!("Error: {error}");
            process::exit(1);
        }
    };

    let accounts = Arc::new(match args.store_latency() {
        Some(latency) => InMemoryAccountStore::with_latency(latency),
        None => InMemoryAccountStore::new(),
    });
    let ledger = Arc::new(match args.store_latency() {
        Some(latency) => InMemoryLedgerStore::with_latency(latency),
        None => InMemoryLedgerStore::new(),
    });
    let registry = Arc::new(LockRegistry::new());
    let template = LockTemplate::with_config(Arc::clone(&registry), args.to_lock_config());
    let coordinator = TransactionCoordinator::new(accounts, ledger, template);

    // Every account referenced by the input appears in the snapshot, even if
    // all of its operations were rejected.
    let touched: BTreeSet<AccountId> = operations.iter().map(|op| op.account).collect();

    let rejected = match run_batch(&coordinator, operations, args.worker_count()) {
        Ok(rejected) => rejected,
        Err(error) => {
            eprintln!("Error: {error}");
            process::exit(1);
        }
    };
    info!(
        accounts = touched.len(),
        rejected, "batch finished"
    );

    let snapshot: Vec<BalanceAccount> = touched
        .iter()
        .map(|account| coordinator.balance_of(*account))
        .collect();
    if let Err(error) = write_balances_csv(&snapshot, std::io::stdout()) {
        eprintln!("Error: {error}");
        process::exit(1);
    }

    registry.shutdown();
}

/// Apply all operations concurrently; returns the number rejected
///
/// Operations run on the blocking thread pool because the lock template
/// blocks the calling thread while waiting for an exclusive region.
fn run_batch(
    coordinator: &TransactionCoordinator<InMemoryAccountStore, InMemoryLedgerStore>,
    operations: Vec<OperationRecord>,
    workers: usize,
) -> Result<usize, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .max_blocking_threads(workers.max(1))
        .build()
        .map_err(|error| format!("failed to start runtime: {error}"))?;

    let results = runtime.block_on(async {
        let tasks: Vec<_> = operations
            .into_iter()
            .map(|operation| {
                let coordinator = coordinator.clone();
                tokio::task::spawn_blocking(move || apply(&coordinator, &operation))
            })
            .collect();
        futures::future::join_all(tasks).await
    });

    let mut rejected = 0usize;
    for joined in results {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                rejected += 1;
                eprintln!("rejected: {error}");
            }
            Err(error) => return Err(format!("worker panicked: {error}")),
        }
    }
    Ok(rejected)
}

fn apply(
    coordinator: &TransactionCoordinator<InMemoryAccountStore, InMemoryLedgerStore>,
    operation: &OperationRecord,
) -> Result<(), PointError> {
    match operation.kind {
        TransactionKind::Charge => coordinator.charge(operation.account, operation.amount)?,
        TransactionKind::Use => coordinator.use_points(operation.account, operation.amount)?,
    };
    Ok(())
}
