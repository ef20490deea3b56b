use crate::lock::LockConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Apply charge/use point operations concurrently against an in-memory ledger
#[derive(Parser, Debug)]
#[command(name = "point-ledger")]
#[command(
    about = "Apply charge/use point operations concurrently against an in-memory ledger",
    long_about = None
)]
pub struct CliArgs {
    /// Input CSV file of operations with columns: kind,account,amount
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Worker threads applying operations concurrently
    #[arg(
        long,
        value_name = "COUNT",
        help = "Worker threads applying operations (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Cumulative lock acquisition timeout per operation
    #[arg(
        long = "timeout-ms",
        value_name = "MS",
        help = "Lock acquisition timeout in milliseconds (default: 5000)"
    )]
    pub timeout_ms: Option<u64>,

    /// Lock acquisition retries after the first attempt
    #[arg(
        long = "max-retries",
        value_name = "COUNT",
        help = "Lock acquisition retries after the first attempt (default: 3)"
    )]
    pub max_retries: Option<u32>,

    /// Pause between lock acquisition attempts
    #[arg(
        long = "retry-delay-ms",
        value_name = "MS",
        help = "Delay between lock acquisition attempts in milliseconds (default: 100)"
    )]
    pub retry_delay_ms: Option<u64>,

    /// Injected per-call store latency, for contention demonstrations
    #[arg(
        long = "store-latency-ms",
        value_name = "MS",
        help = "Sleep this long in every store call to make contention visible"
    )]
    pub store_latency_ms: Option<u64>,
}

impl CliArgs {
    /// Build a `LockConfig` from the CLI overrides, falling back to defaults
    pub fn to_lock_config(&self) -> LockConfig {
        let default = LockConfig::default();
        LockConfig {
            timeout: self
                .timeout_ms
                .map_or(default.timeout, Duration::from_millis),
            max_retries: self.max_retries.unwrap_or(default.max_retries),
            retry_delay: self
                .retry_delay_ms
                .map_or(default.retry_delay, Duration::from_millis),
        }
    }

    /// Worker thread count, defaulting to the number of CPU cores
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Store latency as a `Duration`, if requested
    pub fn store_latency(&self) -> Option<Duration> {
        self.store_latency_ms.map(Duration::from_millis)
    }
}
