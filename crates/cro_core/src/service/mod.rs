//! Contract-level services.
//!
//! # Responsibility
//! - Expose the outward contract functions over a ledger backend.
//! - Run each call as one atomic invocation and attach operation context to
//!   errors.
//!
//! # Invariants
//! - Service APIs never bypass the record store.
//! - The service layer is ledger-agnostic.

pub mod record_contract;
