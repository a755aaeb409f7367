//! Caller identity, partition naming and organization access checks.
//!
//! # Responsibility
//! - Resolve who is calling and which organization hosts the executing node.
//! - Derive each organization's private partition name.
//! - Gate operations on the same-organization policy.
//!
//! # Invariants
//! - Access decisions use organization ids only; the caller principal is for
//!   audit logging.
//! - Private partition names are a pure function of the organization id.

pub mod guard;
pub mod identity;
pub mod partition;
