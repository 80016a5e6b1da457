use thiserror::Error;

use crate::schema::FieldType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Duplicate field name in schema: \"{0}\"")]
    DuplicateField(String),

    #[error("Field name must not be empty (position {0})")]
    EmptyFieldName(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("State is missing field \"{0}\"")]
    MissingField(String),

    #[error("Field \"{field}\" expected {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: String,
    },

    #[error("CBOR encode error: {0}")]
    Cbor(String),
}

/// Any reason a blob could not be turned back into state.
///
/// Always recovered by the orchestrator; callers see "no prior state".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Invalid base64: {0}")]
    Base64(String),

    #[error("CBOR decode error: {0}")]
    Cbor(String),

    #[error("Malformed envelope: {0}")]
    Malformed(String),

    #[error("Value at position {position} (\"{field}\") is not {expected}")]
    TypeMismatch {
        position: usize,
        field: String,
        expected: FieldType,
    },

    #[error("Envelope carries {found} values, schema has {expected}")]
    FieldCount { expected: usize, found: usize },
}

/// Failure of a single storage backend call.
///
/// Recovered locally: reads treat the backend as empty, writes are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded")]
    QuotaExceeded,

    #[error("Storage access denied: {0}")]
    AccessDenied(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match e.sqlite_error_code() {
            Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded,
            Some(ErrorCode::ReadOnly) | Some(ErrorCode::PermissionDenied) => {
                StorageError::AccessDenied(e.to_string())
            }
            Some(ErrorCode::CannotOpen) => StorageError::Unavailable(e.to_string()),
            _ => StorageError::Backend(e.to_string()),
        }
    }
}
