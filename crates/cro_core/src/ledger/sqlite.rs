//! SQLite-backed ledger.
//!
//! # Invariants
//! - All partitions share the `ledger_entries` table keyed by
//!   `(partition, key)`.
//! - Staged writes are applied in one SQLite transaction at commit.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::ledger::selector::Selector;
use crate::ledger::{
    check_key, select_entries, Ledger, LedgerBackend, LedgerError, LedgerResult, QueryIter,
    WriteSet,
};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Ledger persisted in a SQLite database.
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Opens (or creates) a ledger file and applies schema migrations.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a private in-memory ledger.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl LedgerBackend for SqliteLedger {
    fn invoke<T, E, F>(&mut self, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Ledger) -> Result<T, E>,
        E: From<LedgerError>,
    {
        let mut view = SqliteView {
            conn: &self.conn,
            writes: WriteSet::default(),
        };
        let output = operation(&mut view)?;
        let writes = view.writes;
        if writes.is_empty() {
            return Ok(output);
        }

        let tx = self.conn.transaction().map_err(LedgerError::from)?;
        let count = writes.len();
        for ((partition, key), value) in writes.into_entries() {
            tx.execute(
                "INSERT INTO ledger_entries (partition, key, value)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (partition, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![partition, key, value],
            )
            .map_err(LedgerError::from)?;
        }
        tx.commit().map_err(LedgerError::from)?;

        debug!("event=ledger_commit module=ledger backend=sqlite writes={count}");
        Ok(output)
    }
}

struct SqliteView<'conn> {
    conn: &'conn Connection,
    writes: WriteSet,
}

impl Ledger for SqliteView<'_> {
    fn get(&self, partition: &str, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        check_key(partition, key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM ledger_entries WHERE partition = ?1 AND key = ?2;",
                params![partition, key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, partition: &str, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        self.writes.stage(partition, key, value)
    }

    /// Partition filter and key order run in SQL. The partition's rows are
    /// read eagerly; the selector is evaluated lazily over them.
    fn query(&self, partition: &str, selector: &Selector) -> LedgerResult<QueryIter<'_>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM ledger_entries
             WHERE partition = ?1
             ORDER BY key ASC;",
        )?;
        let rows = stmt
            .query_map([partition], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(select_entries(partition, rows.into_iter(), selector))
    }
}
