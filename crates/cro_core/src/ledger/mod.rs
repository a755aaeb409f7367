//! Partitioned key-value ledger abstraction.
//!
//! # Responsibility
//! - Define the per-invocation read/write/query surface the record store uses.
//! - Run each invocation with transactional isolation.
//!
//! # Invariants
//! - Reads observe committed state as of invocation start; writes staged in an
//!   invocation become visible only after it commits.
//! - An invocation that returns `Err` commits nothing.
//! - Query results are produced in ascending key order within a partition.

use crate::db::DbError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod selector;
pub mod sqlite;

pub use memory::MemoryLedger;
pub use selector::{Condition, Operator, Selector};
pub use sqlite::SqliteLedger;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Lazy sequence of `(key, value)` pairs matched by a query.
pub type QueryIter<'a> = Box<dyn Iterator<Item = LedgerResult<(String, Vec<u8>)>> + 'a>;

#[derive(Debug)]
pub enum LedgerError {
    Db(DbError),
    /// Partition and key must both be non-empty.
    InvalidKey { partition: String, key: String },
    /// Write to a partition the ledger was not configured with.
    UndeclaredPartition(String),
    /// A stored value could not be evaluated while iterating a query.
    Query {
        partition: String,
        key: String,
        message: String,
    },
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey { partition, key } => {
                write!(f, "invalid ledger key `{key}` in partition `{partition}`")
            }
            Self::UndeclaredPartition(partition) => {
                write!(f, "partition `{partition}` is not declared on this ledger")
            }
            Self::Query {
                partition,
                key,
                message,
            } => write!(
                f,
                "query over `{partition}` failed at key `{key}`: {message}"
            ),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ledger view handed to one invocation.
pub trait Ledger {
    /// Reads committed state; `None` when the key is absent.
    fn get(&self, partition: &str, key: &str) -> LedgerResult<Option<Vec<u8>>>;
    /// Stages a write, applied when the invocation commits.
    fn put(&mut self, partition: &str, key: &str, value: Vec<u8>) -> LedgerResult<()>;
    /// Selects committed values in `partition` matched by `selector`.
    fn query(&self, partition: &str, selector: &Selector) -> LedgerResult<QueryIter<'_>>;
}

/// Ledger host able to run invocations atomically.
pub trait LedgerBackend {
    /// Runs `operation` against a fresh invocation view and commits its
    /// staged writes only when it returns `Ok`.
    fn invoke<T, E, F>(&mut self, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Ledger) -> Result<T, E>,
        E: From<LedgerError>;
}

/// Writes staged by one invocation, keyed by `(partition, key)`.
#[derive(Debug, Default)]
pub(crate) struct WriteSet {
    entries: BTreeMap<(String, String), Vec<u8>>,
}

impl WriteSet {
    pub(crate) fn stage(&mut self, partition: &str, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        check_key(partition, key)?;
        self.entries
            .insert((partition.to_string(), key.to_string()), value);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = ((String, String), Vec<u8>)> {
        self.entries.into_iter()
    }
}

pub(crate) fn check_key(partition: &str, key: &str) -> LedgerResult<()> {
    if partition.is_empty() || key.is_empty() {
        return Err(LedgerError::InvalidKey {
            partition: partition.to_string(),
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Lazily evaluates `selector` over raw `(key, value)` entries.
///
/// Values that are not JSON objects yield an error item instead of being
/// skipped.
pub(crate) fn select_entries<'a, I>(partition: &str, entries: I, selector: &Selector) -> QueryIter<'a>
where
    I: Iterator<Item = (String, Vec<u8>)> + 'a,
{
    let partition = partition.to_string();
    let selector = selector.clone();
    Box::new(entries.filter_map(move |(key, value)| {
        match serde_json::from_slice::<serde_json::Value>(&value) {
            Ok(document) if document.is_object() => {
                selector.matches(&document).then(|| Ok((key, value)))
            }
            Ok(_) => Some(Err(LedgerError::Query {
                partition: partition.clone(),
                key,
                message: "stored value is not a JSON object".to_string(),
            })),
            Err(err) => Some(Err(LedgerError::Query {
                partition: partition.clone(),
                key,
                message: err.to_string(),
            })),
        }
    }))
}
