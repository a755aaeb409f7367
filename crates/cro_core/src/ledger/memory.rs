//! In-memory ledger for tests and local harnesses.

use crate::ledger::selector::Selector;
use crate::ledger::{
    check_key, select_entries, Ledger, LedgerBackend, LedgerError, LedgerResult, QueryIter,
    WriteSet,
};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

type Partition = BTreeMap<String, Vec<u8>>;

/// Ledger holding every partition in process memory.
///
/// When partitions are declared, writes to any other partition fail, the
/// way a ledger rejects writes to a collection it was not configured with.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    partitions: BTreeMap<String, Partition>,
    declared: Option<BTreeSet<String>>,
}

impl MemoryLedger {
    /// Ledger accepting writes to any partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger accepting writes only to the listed partitions.
    pub fn with_partitions<I, S>(partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            partitions: BTreeMap::new(),
            declared: Some(partitions.into_iter().map(Into::into).collect()),
        }
    }

    /// Committed value at `partition`/`key`.
    pub fn committed(&self, partition: &str, key: &str) -> Option<&[u8]> {
        self.partitions
            .get(partition)
            .and_then(|entries| entries.get(key))
            .map(Vec::as_slice)
    }

    /// Number of committed keys in `partition`.
    pub fn partition_len(&self, partition: &str) -> usize {
        self.partitions.get(partition).map_or(0, BTreeMap::len)
    }
}

impl LedgerBackend for MemoryLedger {
    fn invoke<T, E, F>(&mut self, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Ledger) -> Result<T, E>,
        E: From<LedgerError>,
    {
        let mut view = MemoryView {
            partitions: &self.partitions,
            declared: self.declared.as_ref(),
            writes: WriteSet::default(),
        };
        let output = operation(&mut view)?;
        let writes = view.writes;

        debug!(
            "event=ledger_commit module=ledger backend=memory writes={}",
            writes.len()
        );
        for ((partition, key), value) in writes.into_entries() {
            self.partitions
                .entry(partition)
                .or_default()
                .insert(key, value);
        }
        Ok(output)
    }
}

struct MemoryView<'a> {
    partitions: &'a BTreeMap<String, Partition>,
    declared: Option<&'a BTreeSet<String>>,
    writes: WriteSet,
}

impl Ledger for MemoryView<'_> {
    fn get(&self, partition: &str, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        check_key(partition, key)?;
        Ok(self
            .partitions
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn put(&mut self, partition: &str, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        if let Some(declared) = self.declared {
            if !declared.contains(partition) {
                return Err(LedgerError::UndeclaredPartition(partition.to_string()));
            }
        }
        self.writes.stage(partition, key, value)
    }

    fn query(&self, partition: &str, selector: &Selector) -> LedgerResult<QueryIter<'_>> {
        let entries = self
            .partitions
            .get(partition)
            .into_iter()
            .flat_map(|entries| entries.iter())
            .map(|(key, value)| (key.clone(), value.clone()));
        Ok(select_entries(partition, entries, selector))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryLedger;
    use crate::ledger::{LedgerBackend, LedgerError, Selector};

    #[test]
    fn commits_writes_on_success() {
        let mut ledger = MemoryLedger::new();
        ledger
            .invoke(|view| -> Result<(), LedgerError> {
                view.put("shared", "k1", b"{}".to_vec())?;
                assert!(view.get("shared", "k1")?.is_none(), "writes are not read back");
                Ok(())
            })
            .expect("invoke");
        assert_eq!(ledger.committed("shared", "k1"), Some(b"{}".as_slice()));
    }

    #[test]
    fn discards_all_writes_on_failure() {
        let mut ledger = MemoryLedger::with_partitions(["shared"]);
        let err = ledger
            .invoke(|view| -> Result<(), LedgerError> {
                view.put("shared", "k1", b"{}".to_vec())?;
                view.put("Org1MSPPrivateCollection", "k1", b"{}".to_vec())?;
                Ok(())
            })
            .expect_err("undeclared partition must fail");
        assert!(matches!(err, LedgerError::UndeclaredPartition(name) if name == "Org1MSPPrivateCollection"));
        assert_eq!(ledger.partition_len("shared"), 0);
    }

    #[test]
    fn rejects_empty_keys() {
        let mut ledger = MemoryLedger::new();
        let err = ledger
            .invoke(|view| view.put("shared", "", b"{}".to_vec()))
            .expect_err("empty key must fail");
        assert!(matches!(err, LedgerError::InvalidKey { .. }));
    }

    #[test]
    fn query_yields_error_item_for_non_json_values() {
        let mut ledger = MemoryLedger::new();
        ledger
            .invoke(|view| -> Result<(), LedgerError> {
                view.put("shared", "a", br#"{"n":1}"#.to_vec())?;
                view.put("shared", "b", b"garbage".to_vec())?;
                view.put("shared", "c", br#"{"n":2}"#.to_vec())
            })
            .expect("seed");

        let results = ledger
            .invoke(|view| -> Result<Vec<_>, LedgerError> {
                Ok(view.query("shared", &Selector::new())?.collect::<Vec<_>>())
            })
            .expect("query");
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(&results[1], Err(LedgerError::Query { key, .. }) if key == "b"));
        assert!(results[2].is_ok());
    }

    #[test]
    fn query_over_unknown_partition_is_empty() {
        let mut ledger = MemoryLedger::new();
        let count = ledger
            .invoke(|view| -> Result<usize, LedgerError> {
                Ok(view.query("nothing", &Selector::new())?.count())
            })
            .expect("query");
        assert_eq!(count, 0);
    }
}
