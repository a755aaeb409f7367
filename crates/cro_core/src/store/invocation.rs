//! Per-invocation context handed to the record store.

use crate::access::identity::IdentityOracle;
use crate::ledger::Ledger;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

/// Transient key carrying the creation payload.
pub const RECORD_PROPERTIES_KEY: &str = "record_properties";

/// Confidential side-channel input for one invocation.
///
/// Values are never persisted to the public transaction log, and `Debug`
/// output only lists keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TransientInput {
    entries: BTreeMap<String, Vec<u8>>,
}

impl TransientInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }
}

impl Debug for TransientInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransientInput")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Everything one store operation may touch: the ledger view, the caller's
/// identity and the confidential input.
pub struct Invocation<'a> {
    pub(crate) ledger: &'a mut dyn Ledger,
    pub(crate) identity: &'a dyn IdentityOracle,
    pub(crate) transient: &'a TransientInput,
    tx_id: Uuid,
}

impl<'a> Invocation<'a> {
    pub fn new(
        ledger: &'a mut dyn Ledger,
        identity: &'a dyn IdentityOracle,
        transient: &'a TransientInput,
    ) -> Self {
        Self {
            ledger,
            identity,
            transient,
            tx_id: Uuid::new_v4(),
        }
    }

    /// Correlation id for log lines of this invocation.
    pub fn tx_id(&self) -> Uuid {
        self.tx_id
    }
}
