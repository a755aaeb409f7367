//! Same-organization invocation guard and per-operation policy.

use crate::access::identity::{client_org, peer_org, IdentityError, IdentityOracle};
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Record store operation, as named on the contract surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Create,
    Get,
    List,
    Revoke,
}

impl Operation {
    /// Contract function name used in logs and error context.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "AddRecord",
            Self::Get => "GetRecord",
            Self::List => "GetRecords",
            Self::Revoke => "RevokeRecord",
        }
    }
}

/// Which operations require the caller to invoke a node of its own
/// organization.
///
/// Only creation is gated by default. Reads and revocation stay open until
/// the intended policy for them is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    pub create: bool,
    pub get: bool,
    pub list: bool,
    pub revoke: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            create: true,
            get: false,
            list: false,
            revoke: false,
        }
    }
}

impl AccessPolicy {
    /// Policy that gates every operation.
    pub fn strict() -> Self {
        Self {
            create: true,
            get: true,
            list: true,
            revoke: true,
        }
    }

    pub fn requires_same_org(&self, operation: Operation) -> bool {
        match operation {
            Operation::Create => self.create,
            Operation::Get => self.get,
            Operation::List => self.list,
            Operation::Revoke => self.revoke,
        }
    }
}

/// Same-organization check failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    Identity(IdentityError),
    OrgMismatch { client_org: String, peer_org: String },
}

impl Display for GuardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity(err) => write!(f, "cannot resolve organization: {err}"),
            Self::OrgMismatch {
                client_org,
                peer_org,
            } => write!(
                f,
                "client from org {client_org} is not authorized to read or write private data from an org {peer_org} peer"
            ),
        }
    }
}

impl Error for GuardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Identity(err) => Some(err),
            Self::OrgMismatch { .. } => None,
        }
    }
}

impl From<IdentityError> for GuardError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

/// Succeeds only when the caller's organization hosts the executing node.
pub fn verify_same_org(oracle: &dyn IdentityOracle) -> Result<(), GuardError> {
    let client = client_org(oracle)?;
    let peer = peer_org(oracle)?;
    if client != peer {
        warn!(
            "event=same_org_check module=access status=denied client_org={} peer_org={}",
            client, peer
        );
        return Err(GuardError::OrgMismatch {
            client_org: client,
            peer_org: peer,
        });
    }
    Ok(())
}

/// Applies `verify_same_org` when `policy` gates `operation`.
pub fn enforce(
    policy: &AccessPolicy,
    operation: Operation,
    oracle: &dyn IdentityOracle,
) -> Result<(), GuardError> {
    if policy.requires_same_org(operation) {
        verify_same_org(oracle)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{enforce, verify_same_org, AccessPolicy, GuardError, Operation};
    use crate::access::identity::{IdentityError, StaticIdentity};

    #[test]
    fn same_org_passes() {
        let identity = StaticIdentity::same_org("Org1MSP", "alice");
        verify_same_org(&identity).expect("same org should pass");
    }

    #[test]
    fn different_org_is_denied() {
        let identity = StaticIdentity::same_org("Org1MSP", "alice")
            .with_peer_org(Some("Org2MSP".to_string()));
        let err = verify_same_org(&identity).expect_err("cross org must fail");
        assert_eq!(
            err,
            GuardError::OrgMismatch {
                client_org: "Org1MSP".to_string(),
                peer_org: "Org2MSP".to_string(),
            }
        );
    }

    #[test]
    fn unresolvable_org_is_denied() {
        let identity = StaticIdentity::same_org("Org1MSP", "alice").with_peer_org(None);
        let err = verify_same_org(&identity).expect_err("missing peer org must fail");
        assert_eq!(
            err,
            GuardError::Identity(IdentityError::Unavailable("peer MSP id"))
        );
    }

    #[test]
    fn default_policy_gates_create_only() {
        let policy = AccessPolicy::default();
        assert!(policy.requires_same_org(Operation::Create));
        assert!(!policy.requires_same_org(Operation::Get));
        assert!(!policy.requires_same_org(Operation::List));
        assert!(!policy.requires_same_org(Operation::Revoke));

        let cross_org = StaticIdentity::same_org("Org2MSP", "bob")
            .with_peer_org(Some("Org1MSP".to_string()));
        enforce(&policy, Operation::Get, &cross_org).expect("reads are ungated by default");
        enforce(&policy, Operation::Create, &cross_org).expect_err("create is gated");
        enforce(&AccessPolicy::strict(), Operation::Revoke, &cross_org)
            .expect_err("strict policy gates revoke");
    }
}
