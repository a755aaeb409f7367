//! Record store operations.

use crate::access::guard::{enforce, Operation};
use crate::access::identity::{client_org, submitting_principal};
use crate::access::partition::private_partition_name;
use crate::config::StoreConfig;
use crate::ledger::Selector;
use crate::logging::sanitize_for_log;
use crate::model::codec::{
    decode_input, decode_private, decode_shared, encode_private, encode_shared, CodecError,
};
use crate::model::record::{MergedRecord, PrivateDetail, SharedRecord};
use crate::store::invocation::{Invocation, RECORD_PROPERTIES_KEY};
use crate::store::{StoreError, StoreResult};
use log::{info, warn};

const FIELD_ISO_NUMBERS: &str = "isoNumbers";
const FIELD_CREATED_AT: &str = "createdAtUTC";

/// Filter and cap for fetch-many.
///
/// A zero bound means "unset"; the date filter applies only when both bounds
/// are non-zero. `limit == 0` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub iso_number: String,
    pub date_from: u64,
    pub date_to: u64,
    pub limit: u64,
}

impl RecordQuery {
    pub fn for_iso_number(iso_number: impl Into<String>) -> Self {
        Self {
            iso_number: iso_number.into(),
            ..Self::default()
        }
    }

    pub fn between(mut self, date_from: u64, date_to: u64) -> Self {
        self.date_from = date_from;
        self.date_to = date_to;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Builds the shared-partition selector for this query.
    pub fn selector(&self) -> Selector {
        let selector = Selector::new().field_in(FIELD_ISO_NUMBERS, [self.iso_number.as_str()]);
        if self.date_from != 0 && self.date_to != 0 {
            selector
                .field_gte(FIELD_CREATED_AT, self.date_from)
                .field_lte(FIELD_CREATED_AT, self.date_to)
        } else {
            selector
        }
    }
}

/// Orchestrates the shared/private record layout over one invocation.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    config: StoreConfig,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a record from the `record_properties` confidential input.
    ///
    /// Writes the shell to the shared partition, then the private detail to
    /// the caller organization's partition. Returns the new record id.
    pub fn create(&self, invocation: &mut Invocation<'_>) -> StoreResult<String> {
        let payload = invocation
            .transient
            .get(RECORD_PROPERTIES_KEY)
            .ok_or(StoreError::TransientInputMissing(RECORD_PROPERTIES_KEY))?;
        let input = decode_input(payload).map_err(|err| {
            StoreError::validation(
                RECORD_PROPERTIES_KEY,
                format!(
                    "{RECORD_PROPERTIES_KEY} is not a valid record payload ({})",
                    err.summary()
                ),
            )
        })?;
        input
            .validate()
            .map_err(|err| StoreError::validation(err.field(), err.to_string()))?;

        let record_id = input.record_id.clone();
        if invocation
            .ledger
            .get(&self.config.shared_partition, &record_id)?
            .is_some()
        {
            warn!(
                "event=record_create module=store status=duplicate tx_id={} record_id={}",
                invocation.tx_id(),
                sanitize_for_log(&record_id)
            );
            return Err(StoreError::DuplicateRecord(record_id));
        }

        let principal = submitting_principal(invocation.identity)?;
        enforce(
            &self.config.access_policy,
            Operation::Create,
            invocation.identity,
        )?;

        let (shared, detail) = input.into_parts();
        let shared_bytes = encode_shared(&shared).map_err(|err| malformed(&record_id, err))?;
        info!(
            "event=record_put module=store tx_id={} partition={} record_id={} owner={}",
            invocation.tx_id(),
            self.config.shared_partition,
            sanitize_for_log(&record_id),
            sanitize_for_log(&principal)
        );
        invocation
            .ledger
            .put(&self.config.shared_partition, &record_id, shared_bytes)?;

        let private_partition = self.caller_partition(invocation)?;
        let detail_bytes = encode_private(&detail).map_err(|err| malformed(&record_id, err))?;
        info!(
            "event=record_put module=store tx_id={} partition={} record_id={}",
            invocation.tx_id(),
            private_partition,
            sanitize_for_log(&record_id)
        );
        invocation
            .ledger
            .put(&private_partition, &record_id, detail_bytes)?;

        Ok(record_id)
    }

    /// Reads one record; `Ok(None)` when no shell exists for `record_id`.
    pub fn get(
        &self,
        invocation: &mut Invocation<'_>,
        record_id: &str,
    ) -> StoreResult<Option<MergedRecord>> {
        if record_id.is_empty() {
            return Err(StoreError::validation(
                "recordId",
                "recordId field must be a non-empty string",
            ));
        }
        enforce(&self.config.access_policy, Operation::Get, invocation.identity)?;

        let Some(bytes) = invocation
            .ledger
            .get(&self.config.shared_partition, record_id)?
        else {
            info!(
                "event=record_get module=store status=absent tx_id={} record_id={}",
                invocation.tx_id(),
                sanitize_for_log(record_id)
            );
            return Ok(None);
        };
        let shared = decode_shared(&bytes).map_err(|err| malformed(record_id, err))?;

        let private_partition = self.caller_partition(invocation)?;
        let detail = self.read_detail(invocation, &private_partition, record_id)?;
        Ok(Some(MergedRecord::merge(shared, detail)))
    }

    /// Lists records whose `isoNumbers` contain `query.iso_number`, in ledger
    /// query order, capped at `query.limit` when non-zero.
    pub fn list(
        &self,
        invocation: &mut Invocation<'_>,
        query: &RecordQuery,
    ) -> StoreResult<Vec<MergedRecord>> {
        if query.iso_number.is_empty() {
            return Err(StoreError::validation(
                "isoNumber",
                "isoNumber field must be a non-empty string",
            ));
        }
        enforce(&self.config.access_policy, Operation::List, invocation.identity)?;

        let selector = query.selector();
        info!(
            "event=record_query module=store tx_id={} partition={} selector={}",
            invocation.tx_id(),
            self.config.shared_partition,
            sanitize_for_log(&selector.to_query_string())
        );

        // Resolved on the first match; an empty result needs no caller org.
        let mut private_partition: Option<String> = None;
        let mut records = Vec::new();
        let results = invocation
            .ledger
            .query(&self.config.shared_partition, &selector)?;
        for item in results {
            let (key, bytes) = item.map_err(StoreError::QueryIteration)?;
            let shared = decode_shared(&bytes).map_err(|err| malformed(&key, err))?;
            let partition = match private_partition.take() {
                Some(partition) => partition,
                None => self.caller_partition(invocation)?,
            };
            let detail = self.read_detail(invocation, &partition, &shared.record_id)?;
            private_partition = Some(partition);
            records.push(MergedRecord::merge(shared, detail));

            if query.limit > 0 && records.len() as u64 >= query.limit {
                break;
            }
        }
        Ok(records)
    }

    /// Marks a record revoked with `reason`. Fails if it already is.
    pub fn revoke(
        &self,
        invocation: &mut Invocation<'_>,
        record_id: &str,
        reason: &str,
    ) -> StoreResult<SharedRecord> {
        if record_id.is_empty() {
            return Err(StoreError::validation(
                "recordId",
                "recordId field must be a non-empty string",
            ));
        }
        enforce(
            &self.config.access_policy,
            Operation::Revoke,
            invocation.identity,
        )?;

        let bytes = invocation
            .ledger
            .get(&self.config.shared_partition, record_id)?
            .ok_or_else(|| StoreError::RecordNotFound(record_id.to_string()))?;
        let mut shared = decode_shared(&bytes).map_err(|err| malformed(record_id, err))?;
        if !shared.revoke(reason) {
            return Err(StoreError::AlreadyRevoked(record_id.to_string()));
        }

        let updated = encode_shared(&shared).map_err(|err| malformed(record_id, err))?;
        invocation
            .ledger
            .put(&self.config.shared_partition, record_id, updated)?;
        info!(
            "event=record_revoke module=store tx_id={} record_id={} reason={}",
            invocation.tx_id(),
            sanitize_for_log(record_id),
            sanitize_for_log(reason)
        );
        Ok(shared)
    }

    fn caller_partition(&self, invocation: &Invocation<'_>) -> StoreResult<String> {
        let org = client_org(invocation.identity)?;
        Ok(private_partition_name(
            &org,
            &self.config.private_partition_suffix,
        ))
    }

    // Absent detail is normal: the caller's organization may not own it.
    fn read_detail(
        &self,
        invocation: &Invocation<'_>,
        partition: &str,
        record_id: &str,
    ) -> StoreResult<Option<PrivateDetail>> {
        match invocation.ledger.get(partition, record_id)? {
            Some(bytes) => decode_private(&bytes)
                .map(Some)
                .map_err(|err| malformed(record_id, err)),
            None => Ok(None),
        }
    }
}

fn malformed(record_id: &str, source: CodecError) -> StoreError {
    StoreError::MalformedRecord {
        record_id: record_id.to_string(),
        source,
    }
}
