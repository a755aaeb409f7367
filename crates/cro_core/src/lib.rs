//! Privacy-partitioned record store.
//!
//! Each record is split into a shell shared with every organization and a
//! detail blob kept in the creating organization's private partition. This
//! crate owns the record layout, its access rules and the ledger seams it is
//! tested against.

pub mod access;
pub mod config;
pub mod db;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use access::guard::{verify_same_org, AccessPolicy, GuardError, Operation};
pub use access::identity::{IdentityError, IdentityOracle, StaticIdentity};
pub use access::partition::{private_partition_name, DEFAULT_PRIVATE_PARTITION_SUFFIX};
pub use config::{ConfigError, StoreConfig, DEFAULT_SHARED_PARTITION};
pub use ledger::{
    Ledger, LedgerBackend, LedgerError, LedgerResult, MemoryLedger, Selector, SqliteLedger,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::codec::CodecError;
pub use model::record::{MergedRecord, PrivateDetail, RecordInput, SharedRecord};
pub use service::record_contract::{ContractError, ContractResult, RecordContract};
pub use store::{
    Invocation, RecordQuery, RecordStore, StoreError, StoreResult, TransientInput,
    RECORD_PROPERTIES_KEY,
};

/// Minimal health-check API for harness wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
