//! Byte encoding for stored shells, private details and creation payloads.
//!
//! Values are field-keyed JSON objects. Missing fields decode to their
//! zero value; a field holding the wrong JSON type is rejected.
//!
//! Error text carries the failure category and position only. The JSON
//! parser's own message may quote the offending value, which can be private.

use crate::model::record::{PrivateDetail, RecordInput, SharedRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::error::Category;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CodecResult<T> = Result<T, CodecError>;

/// Encoding or decoding failure for one stored value.
#[derive(Debug)]
pub enum CodecError {
    Encode {
        what: &'static str,
        source: serde_json::Error,
    },
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },
}

impl CodecError {
    /// Category and position of the failure, without any input text.
    pub fn summary(&self) -> String {
        let source = match self {
            Self::Encode { source, .. } | Self::Decode { source, .. } => source,
        };
        let category = match source.classify() {
            Category::Io => "io",
            Category::Syntax => "syntax",
            Category::Data => "data",
            Category::Eof => "eof",
        };
        format!(
            "{category} error at line {} column {}",
            source.line(),
            source.column()
        )
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode { what, .. } => write!(f, "failed to encode {what}: {}", self.summary()),
            Self::Decode { what, .. } => write!(f, "failed to decode {what}: {}", self.summary()),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode { source, .. } | Self::Decode { source, .. } => Some(source),
        }
    }
}

pub fn encode_shared(record: &SharedRecord) -> CodecResult<Vec<u8>> {
    encode(record, "shared record")
}

pub fn decode_shared(bytes: &[u8]) -> CodecResult<SharedRecord> {
    decode(bytes, "shared record")
}

pub fn encode_private(detail: &PrivateDetail) -> CodecResult<Vec<u8>> {
    encode(detail, "private detail")
}

pub fn decode_private(bytes: &[u8]) -> CodecResult<PrivateDetail> {
    decode(bytes, "private detail")
}

/// Decodes the creation payload read from the confidential input channel.
pub fn decode_input(bytes: &[u8]) -> CodecResult<RecordInput> {
    decode(bytes, "record input")
}

fn encode<T: Serialize>(value: &T, what: &'static str) -> CodecResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| CodecError::Encode { what, source })
}

fn decode<T: DeserializeOwned>(bytes: &[u8], what: &'static str) -> CodecResult<T> {
    serde_json::from_slice(bytes).map_err(|source| CodecError::Decode { what, source })
}
