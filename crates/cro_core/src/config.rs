//! Record store configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::access::guard::AccessPolicy;
use crate::access::partition::DEFAULT_PRIVATE_PARTITION_SUFFIX;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Default name of the partition holding shared shells.
pub const DEFAULT_SHARED_PARTITION: &str = "recordCollection";

static PARTITION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid partition name regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Partition visible to every organization.
    #[serde(default = "default_shared_partition")]
    pub shared_partition: String,

    /// Appended to an organization id to name its private partition.
    #[serde(default = "default_private_partition_suffix")]
    pub private_partition_suffix: String,

    #[serde(default)]
    pub access_policy: AccessPolicy,
}

fn default_shared_partition() -> String {
    DEFAULT_SHARED_PARTITION.to_string()
}

fn default_private_partition_suffix() -> String {
    DEFAULT_PRIVATE_PARTITION_SUFFIX.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shared_partition: default_shared_partition(),
            private_partition_suffix: default_private_partition_suffix(),
            access_policy: AccessPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Default config with a different shared partition.
    pub fn with_shared_partition(shared_partition: impl Into<String>) -> Self {
        Self {
            shared_partition: shared_partition.into(),
            ..Default::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    /// Rejects partition names and suffixes outside `[A-Za-z0-9_-]+`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PARTITION_NAME_RE.is_match(&self.shared_partition) {
            return Err(ConfigError::Invalid(format!(
                "shared_partition `{}` must match [A-Za-z0-9_-]+",
                self.shared_partition
            )));
        }
        if !PARTITION_NAME_RE.is_match(&self.private_partition_suffix) {
            return Err(ConfigError::Invalid(format!(
                "private_partition_suffix `{}` must match [A-Za-z0-9_-]+",
                self.private_partition_suffix
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DEFAULT_SHARED_PARTITION};
    use crate::access::guard::AccessPolicy;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = StoreConfig::from_json_str("{}").expect("defaults");
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.shared_partition, DEFAULT_SHARED_PARTITION);
        assert_eq!(config.private_partition_suffix, "PrivateCollection");
        assert_eq!(config.access_policy, AccessPolicy::default());
    }

    #[test]
    fn partial_policy_keeps_other_defaults() {
        let config = StoreConfig::from_json_str(
            r#"{"shared_partition":"tenantA","access_policy":{"revoke":true}}"#,
        )
        .expect("partial config");
        assert_eq!(config.shared_partition, "tenantA");
        assert!(config.access_policy.create);
        assert!(config.access_policy.revoke);
        assert!(!config.access_policy.get);
    }

    #[test]
    fn rejects_invalid_partition_names() {
        let err = StoreConfig::from_json_str(r#"{"shared_partition":""}"#)
            .expect_err("empty partition must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = StoreConfig::from_json_str(r#"{"private_partition_suffix":"has space"}"#)
            .expect_err("space in suffix must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = StoreConfig::from_json_str(r#"{"shared_partition":7}"#)
            .expect_err("wrong type must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"shared_partition":"fromFile"}}"#).expect("write config");
        let config = StoreConfig::from_json_file(file.path()).expect("load config");
        assert_eq!(config.shared_partition, "fromFile");

        let err = StoreConfig::from_json_file("/definitely/missing/config.json")
            .expect_err("missing file must fail");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
