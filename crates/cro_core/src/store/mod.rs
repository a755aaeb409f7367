//! Privacy-partitioned record store.
//!
//! # Responsibility
//! - Implement create, fetch-one, fetch-many and revoke over one invocation.
//! - Compose identity resolution, partition naming, the access guard and the
//!   codec around ledger reads and writes.
//!
//! # Invariants
//! - Private detail is only ever written to, and read from, the calling
//!   organization's own partition.
//! - Validation failures happen before any ledger write.
//! - No error is swallowed and nothing is retried here.

use crate::access::guard::GuardError;
use crate::access::identity::IdentityError;
use crate::ledger::LedgerError;
use crate::model::codec::CodecError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod invocation;
mod record_store;

pub use invocation::{Invocation, TransientInput, RECORD_PROPERTIES_KEY};
pub use record_store::{RecordQuery, RecordStore};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Required input missing or malformed; `field` is the serialized name.
    Validation { field: &'static str, message: String },
    DuplicateRecord(String),
    RecordNotFound(String),
    AlreadyRevoked(String),
    CrossOrgAccessDenied(GuardError),
    IdentityUnavailable(IdentityError),
    IdentityDecode(IdentityError),
    /// A stored value failed to decode, or a value failed to encode.
    MalformedRecord {
        record_id: String,
        source: CodecError,
    },
    /// The confidential input channel lacks the expected key.
    TransientInputMissing(&'static str),
    /// A ledger query failed mid-stream; partial results are discarded.
    QueryIteration(LedgerError),
    /// Ledger read/write failure, propagated unchanged.
    Ledger(LedgerError),
}

impl StoreError {
    /// Stable machine-readable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::DuplicateRecord(_) => "duplicate_record",
            Self::RecordNotFound(_) => "record_not_found",
            Self::AlreadyRevoked(_) => "already_revoked",
            Self::CrossOrgAccessDenied(_) => "cross_org_access_denied",
            Self::IdentityUnavailable(_) => "identity_unavailable",
            Self::IdentityDecode(_) => "identity_decode_error",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::TransientInputMissing(_) => "transient_input_missing",
            Self::QueryIteration(_) => "query_iteration_error",
            Self::Ledger(_) => "ledger_error",
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { message, .. } => write!(f, "{message}"),
            Self::DuplicateRecord(id) => write!(f, "this record already exists: {id}"),
            Self::RecordNotFound(id) => write!(f, "record does not exist: {id}"),
            Self::AlreadyRevoked(id) => write!(f, "record already revoked: {id}"),
            Self::CrossOrgAccessDenied(err) => write!(f, "access denied: {err}"),
            Self::IdentityUnavailable(err) | Self::IdentityDecode(err) => write!(f, "{err}"),
            Self::MalformedRecord { record_id, source } => {
                write!(f, "malformed record `{record_id}`: {source}")
            }
            Self::TransientInputMissing(key) => {
                write!(f, "`{key}` not found in the transient input")
            }
            Self::QueryIteration(err) => {
                write!(f, "error while iterating over query results: {err}")
            }
            Self::Ledger(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CrossOrgAccessDenied(err) => Some(err),
            Self::IdentityUnavailable(err) | Self::IdentityDecode(err) => Some(err),
            Self::MalformedRecord { source, .. } => Some(source),
            Self::QueryIteration(err) | Self::Ledger(err) => Some(err),
            Self::Validation { .. }
            | Self::DuplicateRecord(_)
            | Self::RecordNotFound(_)
            | Self::AlreadyRevoked(_)
            | Self::TransientInputMissing(_) => None,
        }
    }
}

impl From<LedgerError> for StoreError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<IdentityError> for StoreError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Unavailable(_) => Self::IdentityUnavailable(value),
            IdentityError::Decode(_) => Self::IdentityDecode(value),
        }
    }
}

impl From<GuardError> for StoreError {
    fn from(value: GuardError) -> Self {
        Self::CrossOrgAccessDenied(value)
    }
}
