//! Caller identity resolution.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Authenticated identity facts supplied by the invocation host.
pub trait IdentityOracle {
    /// Membership-service id of the invoking organization.
    fn client_msp_id(&self) -> Option<String>;
    /// Base64-encoded principal of the submitting client.
    fn client_id(&self) -> Option<String>;
    /// Membership-service id of the organization hosting this node.
    fn peer_msp_id(&self) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The named identity fact is missing or blank.
    Unavailable(&'static str),
    /// The client id is not valid base64-encoded UTF-8 text.
    Decode(String),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(what) => write!(f, "identity unavailable: {what}"),
            Self::Decode(message) => write!(f, "failed to decode client id: {message}"),
        }
    }
}

impl Error for IdentityError {}

/// Returns the calling organization's id, trimmed.
pub fn client_org(oracle: &dyn IdentityOracle) -> IdentityResult<String> {
    normalize(oracle.client_msp_id(), "client MSP id")
}

/// Returns the id of the organization hosting the executing node, trimmed.
pub fn peer_org(oracle: &dyn IdentityOracle) -> IdentityResult<String> {
    normalize(oracle.peer_msp_id(), "peer MSP id")
}

/// Returns the decoded principal of the submitting client.
///
/// Only used for audit logging.
pub fn submitting_principal(oracle: &dyn IdentityOracle) -> IdentityResult<String> {
    let encoded = normalize(oracle.client_id(), "client id")?;
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|err| IdentityError::Decode(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| IdentityError::Decode(err.to_string()))
}

fn normalize(value: Option<String>, what: &'static str) -> IdentityResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(IdentityError::Unavailable(what)),
    }
}

/// Fixed identity, used by local harnesses and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    client_msp_id: Option<String>,
    client_id: Option<String>,
    peer_msp_id: Option<String>,
}

impl StaticIdentity {
    /// Caller and executing node both belong to `msp_id`.
    pub fn same_org(msp_id: impl Into<String>, principal: &str) -> Self {
        let msp_id = msp_id.into();
        Self {
            client_msp_id: Some(msp_id.clone()),
            client_id: Some(STANDARD.encode(principal.as_bytes())),
            peer_msp_id: Some(msp_id),
        }
    }

    /// Replaces the executing node's organization.
    pub fn with_peer_org(mut self, peer_msp_id: Option<String>) -> Self {
        self.peer_msp_id = peer_msp_id;
        self
    }

    /// Replaces the caller's organization.
    pub fn with_client_org(mut self, client_msp_id: Option<String>) -> Self {
        self.client_msp_id = client_msp_id;
        self
    }

    /// Stores `client_id` verbatim, without base64 encoding it first.
    pub fn with_raw_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }
}

impl IdentityOracle for StaticIdentity {
    fn client_msp_id(&self) -> Option<String> {
        self.client_msp_id.clone()
    }

    fn client_id(&self) -> Option<String> {
        self.client_id.clone()
    }

    fn peer_msp_id(&self) -> Option<String> {
        self.peer_msp_id.clone()
    }
}
