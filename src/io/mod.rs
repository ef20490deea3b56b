//! I/O module
//!
//! CSV interchange for batch runs: operation input (`kind,account,amount`)
//! and the final balance snapshot written on completion. All parsing is
//! strict on structure; a file that cannot be decoded fails the run before
//! any operation is applied.

use std::io::Write;
use std::path::Path;

use serde::Deserialize;

use crate::types::{AccountId, BalanceAccount, PointError, TransactionKind};

/// One requested balance mutation, as read from the input CSV
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OperationRecord {
    /// `charge` or `use`
    pub kind: TransactionKind,

    /// Target account id
    pub account: AccountId,

    /// Mutation amount (validated by policy, not by the parser)
    pub amount: i64,
}

/// Read all operation records from a CSV file
///
/// # Errors
///
/// - `FileNotFound` if the path does not exist
/// - `Io` for read failures
/// - `Parse` (with a line number where available) for malformed records
pub fn read_operations_csv(path: &Path) -> Result<Vec<OperationRecord>, PointError> {
    if !path.exists() {
        return Err(PointError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: OperationRecord = result?;
        records.push(record);
    }
    Ok(records)
}

/// Write the final balance snapshot as CSV (`account,balance,updated_at_ms`)
///
/// Callers are expected to pass accounts sorted by id for deterministic
/// output.
///
/// # Errors
///
/// Returns `Io`/`Parse` errors if the writer fails.
pub fn write_balances_csv<W: Write>(
    accounts: &[BalanceAccount],
    writer: W,
) -> Result<(), PointError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["account", "balance", "updated_at_ms"])?;
    for account in accounts {
        csv_writer.write_record([
            account.id.to_string(),
            account.balance.to_string(),
            account.updated_at_ms.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn write_fixture(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write fixture");
        file.flush().expect("flush fixture");
        file
    }

    #[test]
    fn reads_well_formed_operations() {
        let fixture = write_fixture("kind,account,amount\ncharge,1,10000\nuse,1,1000\n");
        let records = read_operations_csv(fixture.path()).unwrap();
        assert_eq!(
            records,
            vec![
                OperationRecord {
                    kind: TransactionKind::Charge,
                    account: 1,
                    amount: 10_000,
                },
                OperationRecord {
                    kind: TransactionKind::Use,
                    account: 1,
                    amount: 1_000,
                },
            ]
        );
    }

    #[test]
    fn trims_whitespace_in_fields() {
        let fixture = write_fixture("kind,account,amount\n charge , 2 , 20000 \n");
        let records = read_operations_csv(fixture.path()).unwrap();
        assert_eq!(records[0].account, 2);
        assert_eq!(records[0].amount, 20_000);
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let fixture = write_fixture("kind,account,amount\nrefund,1,10000\n");
        let result = read_operations_csv(fixture.path());
        assert!(matches!(result, Err(PointError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_reported() {
        let path = PathBuf::from("does/not/exist.csv");
        let result = read_operations_csv(&path);
        assert!(matches!(result, Err(PointError::FileNotFound { .. })));
    }

    #[test]
    fn writes_snapshot_with_header() {
        let accounts = vec![
            BalanceAccount {
                id: 1,
                balance: 1_000_000,
                updated_at_ms: 42,
            },
            BalanceAccount {
                id: 2,
                balance: 0,
                updated_at_ms: 43,
            },
        ];
        let mut output = Vec::new();
        write_balances_csv(&accounts, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "account,balance,updated_at_ms\n1,1000000,42\n2,0,43\n"
        );
    }
}
