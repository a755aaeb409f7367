//! Record contract: `AddRecord`, `GetRecord`, `GetRecords`, `RevokeRecord`.

use crate::access::guard::Operation;
use crate::access::identity::IdentityOracle;
use crate::config::StoreConfig;
use crate::ledger::LedgerBackend;
use crate::logging::sanitize_for_log;
use crate::model::record::MergedRecord;
use crate::store::{Invocation, RecordQuery, RecordStore, StoreError, StoreResult, TransientInput};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ContractResult<T> = Result<T, ContractError>;

/// Store error annotated with the contract operation and record id.
#[derive(Debug)]
pub struct ContractError {
    pub operation: Operation,
    pub record_id: Option<String>,
    pub source: StoreError,
}

impl ContractError {
    pub fn kind(&self) -> &StoreError {
        &self.source
    }
}

impl Display for ContractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.record_id {
            Some(id) => write!(
                f,
                "{} failed for record `{id}`: {}",
                self.operation.as_str(),
                self.source
            ),
            None => write!(f, "{} failed: {}", self.operation.as_str(), self.source),
        }
    }
}

impl Error for ContractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Contract surface over a ledger backend.
pub struct RecordContract<B: LedgerBackend> {
    backend: B,
    store: RecordStore,
}

impl<B: LedgerBackend> RecordContract<B> {
    pub fn new(backend: B, config: StoreConfig) -> Self {
        Self {
            backend,
            store: RecordStore::new(config),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates a record from the `record_properties` transient entry.
    pub fn add_record(
        &mut self,
        identity: &dyn IdentityOracle,
        transient: &TransientInput,
    ) -> ContractResult<String> {
        self.run(Operation::Create, None, identity, transient, |store, invocation| {
            store.create(invocation)
        })
    }

    /// Returns `Ok(None)` when no record exists for `record_id`.
    pub fn get_record(
        &mut self,
        identity: &dyn IdentityOracle,
        record_id: &str,
    ) -> ContractResult<Option<MergedRecord>> {
        let transient = TransientInput::new();
        self.run(
            Operation::Get,
            Some(record_id),
            identity,
            &transient,
            |store, invocation| store.get(invocation, record_id),
        )
    }

    pub fn get_records(
        &mut self,
        identity: &dyn IdentityOracle,
        iso_number: &str,
        date_from: u64,
        date_to: u64,
        limit: u64,
    ) -> ContractResult<Vec<MergedRecord>> {
        let query = RecordQuery::for_iso_number(iso_number)
            .between(date_from, date_to)
            .limit(limit);
        let transient = TransientInput::new();
        self.run(Operation::List, None, identity, &transient, |store, invocation| {
            store.list(invocation, &query)
        })
    }

    pub fn revoke_record(
        &mut self,
        identity: &dyn IdentityOracle,
        record_id: &str,
        reason: &str,
    ) -> ContractResult<()> {
        let transient = TransientInput::new();
        self.run(
            Operation::Revoke,
            Some(record_id),
            identity,
            &transient,
            |store, invocation| store.revoke(invocation, record_id, reason).map(|_| ()),
        )
    }

    fn run<T, F>(
        &mut self,
        operation: Operation,
        record_id: Option<&str>,
        identity: &dyn IdentityOracle,
        transient: &TransientInput,
        call: F,
    ) -> ContractResult<T>
    where
        F: FnOnce(&RecordStore, &mut Invocation<'_>) -> StoreResult<T>,
    {
        let started_at = Instant::now();
        let store = &self.store;
        let result = self.backend.invoke(|ledger| {
            let mut invocation = Invocation::new(ledger, identity, transient);
            info!(
                "event=contract_invoke module=service status=start op={} tx_id={}",
                operation.as_str(),
                invocation.tx_id()
            );
            call(store, &mut invocation)
        });

        match result {
            Ok(output) => {
                info!(
                    "event=contract_invoke module=service status=ok op={} duration_ms={}",
                    operation.as_str(),
                    started_at.elapsed().as_millis()
                );
                Ok(output)
            }
            Err(source) => {
                error!(
                    "event=contract_invoke module=service status=error op={} duration_ms={} error_code={} error={}",
                    operation.as_str(),
                    started_at.elapsed().as_millis(),
                    source.code(),
                    sanitize_for_log(&source.to_string())
                );
                Err(ContractError {
                    operation,
                    record_id: record_id.map(str::to_string),
                    source,
                })
            }
        }
    }
}
