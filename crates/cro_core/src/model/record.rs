//! Record shapes for the shared and private partitions.
//!
//! # Responsibility
//! - Define the serialized field names used on the ledger.
//! - Validate creation payloads before anything is written.
//! - Split a creation payload into shell + private detail, and merge them back.
//!
//! # Invariants
//! - Field names are case-sensitive and fixed (`objectType`, `recordId`,
//!   `isoNumbers`, `createdAtUTC`, `premiseId`, `documentType`, `revoked`,
//!   `revocationReason`, `fields`).
//! - `fields` is a sorted map so encodings are deterministic.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Organization-private attributes attached to one record.
pub type PrivateFields = BTreeMap<String, String>;

/// Organization-visible part of a record, stored in the shared partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SharedRecord {
    /// Caller-supplied classification tag.
    pub object_type: String,
    /// Primary key inside the shared partition.
    pub record_id: String,
    /// Subjects linked to this record. Queried by membership.
    #[serde(deserialize_with = "null_as_default")]
    pub iso_numbers: Vec<String>,
    #[serde(rename = "createdAtUTC")]
    pub created_at_utc: u64,
    pub premise_id: String,
    pub document_type: String,
    pub revoked: bool,
    /// Empty unless `revoked` is set.
    pub revocation_reason: String,
}

impl SharedRecord {
    /// Applies the one-way revocation transition.
    ///
    /// Returns `false` and leaves the record untouched when it is already
    /// revoked.
    pub fn revoke(&mut self, reason: impl Into<String>) -> bool {
        if self.revoked {
            return false;
        }
        self.revoked = true;
        self.revocation_reason = reason.into();
        true
    }
}

/// Organization-private part of a record, stored in the owner's partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivateDetail {
    /// Back-reference to the shared shell.
    pub record_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fields: PrivateFields,
}

/// Read model returned to callers: shell attributes plus the private fields
/// visible to the calling organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergedRecord {
    pub object_type: String,
    pub record_id: String,
    pub iso_numbers: Vec<String>,
    #[serde(rename = "createdAtUTC")]
    pub created_at_utc: u64,
    pub premise_id: String,
    pub document_type: String,
    /// Empty when the caller's organization owns no detail for this record.
    pub fields: PrivateFields,
    pub revoked: bool,
    pub revocation_reason: String,
}

impl MergedRecord {
    /// Builds the read model from a shell and the caller-visible detail.
    pub fn merge(shared: SharedRecord, detail: Option<PrivateDetail>) -> Self {
        Self {
            object_type: shared.object_type,
            record_id: shared.record_id,
            iso_numbers: shared.iso_numbers,
            created_at_utc: shared.created_at_utc,
            premise_id: shared.premise_id,
            document_type: shared.document_type,
            fields: detail.map(|detail| detail.fields).unwrap_or_default(),
            revoked: shared.revoked,
            revocation_reason: shared.revocation_reason,
        }
    }
}

/// Creation payload delivered through the confidential input channel.
///
/// `revoked` and `revocationReason` are accepted for wire compatibility but
/// never honored: a new record always starts unrevoked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordInput {
    pub object_type: String,
    pub record_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub iso_numbers: Vec<String>,
    #[serde(rename = "createdAtUTC")]
    pub created_at_utc: u64,
    pub premise_id: String,
    pub document_type: String,
    pub revoked: bool,
    pub revocation_reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fields: PrivateFields,
}

impl RecordInput {
    /// Checks required fields in a fixed order and reports the first failure.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.object_type.is_empty() {
            return Err(RecordValidationError::EmptyString("objectType"));
        }
        if self.record_id.is_empty() {
            return Err(RecordValidationError::EmptyString("recordId"));
        }
        if self.iso_numbers.is_empty() {
            return Err(RecordValidationError::EmptyList("isoNumbers"));
        }
        if self.created_at_utc == 0 {
            return Err(RecordValidationError::ZeroTimestamp("createdAtUTC"));
        }
        if self.premise_id.is_empty() {
            return Err(RecordValidationError::EmptyString("premiseId"));
        }
        if self.document_type.is_empty() {
            return Err(RecordValidationError::EmptyString("documentType"));
        }
        Ok(())
    }

    /// Splits the payload into the unrevoked shell and the private detail.
    pub fn into_parts(self) -> (SharedRecord, PrivateDetail) {
        let detail = PrivateDetail {
            record_id: self.record_id.clone(),
            fields: self.fields,
        };
        let shared = SharedRecord {
            object_type: self.object_type,
            record_id: self.record_id,
            iso_numbers: self.iso_numbers,
            created_at_utc: self.created_at_utc,
            premise_id: self.premise_id,
            document_type: self.document_type,
            revoked: false,
            revocation_reason: String::new(),
        };
        (shared, detail)
    }
}

/// Required-field violation, named by its serialized field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyString(&'static str),
    EmptyList(&'static str),
    ZeroTimestamp(&'static str),
}

impl RecordValidationError {
    /// Serialized name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyString(field) | Self::EmptyList(field) | Self::ZeroTimestamp(field) => field,
        }
    }
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyString(field) => write!(f, "{field} field must be a non-empty string"),
            Self::EmptyList(field) => write!(f, "{field} field must be a non-empty array"),
            Self::ZeroTimestamp(field) => write!(f, "{field} field must be a non-zero timestamp"),
        }
    }
}

impl Error for RecordValidationError {}

// Peers written by other toolchains encode empty maps and lists as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{MergedRecord, PrivateDetail, RecordInput, RecordValidationError};

    fn valid_input() -> RecordInput {
        RecordInput {
            object_type: "tag".to_string(),
            record_id: "R1".to_string(),
            iso_numbers: vec!["A123".to_string()],
            created_at_utc: 1000,
            premise_id: "P1".to_string(),
            document_type: "activation".to_string(),
            fields: [("owner".to_string(), "Jane".to_string())].into(),
            ..RecordInput::default()
        }
    }

    #[test]
    fn validate_accepts_complete_input() {
        valid_input().validate().expect("complete input should validate");
    }

    #[test]
    fn validate_reports_first_violation_in_order() {
        let mut input = valid_input();
        input.record_id.clear();
        input.iso_numbers.clear();
        input.document_type.clear();

        let err = input.validate().expect_err("empty record id must fail");
        assert_eq!(err, RecordValidationError::EmptyString("recordId"));
    }

    #[test]
    fn validate_checks_every_required_field() {
        let cases: [(fn(&mut RecordInput), &str); 6] = [
            (|input| input.object_type.clear(), "objectType"),
            (|input| input.record_id.clear(), "recordId"),
            (|input| input.iso_numbers.clear(), "isoNumbers"),
            (|input| input.created_at_utc = 0, "createdAtUTC"),
            (|input| input.premise_id.clear(), "premiseId"),
            (|input| input.document_type.clear(), "documentType"),
        ];

        for (mutate, field) in cases {
            let mut input = valid_input();
            mutate(&mut input);
            let err = input.validate().expect_err("invalid input must fail");
            assert_eq!(err.field(), field);
        }
    }

    #[test]
    fn into_parts_always_starts_unrevoked() {
        let mut input = valid_input();
        input.revoked = true;
        input.revocation_reason = "smuggled".to_string();

        let (shared, detail) = input.into_parts();
        assert!(!shared.revoked);
        assert!(shared.revocation_reason.is_empty());
        assert_eq!(detail.record_id, "R1");
        assert_eq!(detail.fields.get("owner").map(String::as_str), Some("Jane"));
    }

    #[test]
    fn revoke_is_one_way() {
        let (mut shared, _) = valid_input().into_parts();
        assert!(shared.revoke("lost tag"));
        assert!(!shared.revoke("again"));
        assert!(shared.revoked);
        assert_eq!(shared.revocation_reason, "lost tag");
    }

    #[test]
    fn merge_without_detail_yields_empty_fields() {
        let (shared, detail) = valid_input().into_parts();
        let hidden = MergedRecord::merge(shared.clone(), None);
        assert!(hidden.fields.is_empty());
        assert_eq!(hidden.record_id, "R1");

        let visible = MergedRecord::merge(shared, Some(detail));
        assert_eq!(
            visible.fields,
            PrivateDetail {
                record_id: "R1".to_string(),
                fields: [("owner".to_string(), "Jane".to_string())].into(),
            }
            .fields
        );
    }
}
