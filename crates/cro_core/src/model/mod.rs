//! Record data model shared by every organization.
//!
//! # Responsibility
//! - Define the shared shell, the organization-private detail and the merged
//!   read model returned to callers.
//! - Own the byte encoding of stored values.
//!
//! # Invariants
//! - Every stored value is keyed by its `recordId`.
//! - A shell and its private detail share the same `recordId`; the detail is
//!   not validated against the shell.
//! - `revoked` only ever moves from `false` to `true`.

pub mod codec;
pub mod record;
