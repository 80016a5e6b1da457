//! Versioned envelope encode/decode.
//!
//! Wire format: `base64url( CBOR [version, [v0, v1, ...]] )`, unpadded.
//! `values[i]` belongs to `schema[i]`; field names never hit the wire.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ciborium::Value as Cbor;
use serde_json::{Map, Value};

use crate::error::{DecodeError, EncodeError};
use crate::schema::{FieldType, Schema};

/// Blobs longer than this are rejected before base64 decoding.
pub const MAX_BLOB_LEN: usize = 64 * 1024;

/// How `decode` treats a blob whose value count differs from the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Ignore extra trailing values; omit trailing fields the blob lacks.
    #[default]
    Lenient,
    /// Any count mismatch is a `DecodeError::FieldCount`.
    Strict,
}

/// A successfully decoded envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub version: u64,
    /// Tracked fields present in the blob, keyed by schema name.
    pub state: Map<String, Value>,
}

// ============================================================================
// Free functions
// ============================================================================

/// Encode the tracked fields of `state` into a text blob.
pub fn encode(
    state: &Map<String, Value>,
    schema: &Schema,
    version: u64,
) -> Result<String, EncodeError> {
    let mut values = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        let value = match state.get(&field.name) {
            Some(v) => v,
            None if field.ty == FieldType::NullableInt => &Value::Null,
            None => return Err(EncodeError::MissingField(field.name.clone())),
        };
        let packed = to_cbor(field.ty, value).ok_or_else(|| EncodeError::TypeMismatch {
            field: field.name.clone(),
            expected: field.ty,
            found: json_kind(value).to_string(),
        })?;
        values.push(packed);
    }

    let envelope = Cbor::Array(vec![Cbor::Integer(version.into()), Cbor::Array(values)]);
    let mut buf = Vec::new();
    ciborium::into_writer(&envelope, &mut buf).map_err(|e| EncodeError::Cbor(format!("{}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Decode a text blob back into tracked fields.
pub fn decode(blob: &str, schema: &Schema, policy: LengthPolicy) -> Result<Decoded, DecodeError> {
    if blob.len() > MAX_BLOB_LEN {
        return Err(DecodeError::Malformed(format!(
            "blob too long: {} bytes exceeds {}",
            blob.len(),
            MAX_BLOB_LEN
        )));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(blob.as_bytes())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    let mut reader: &[u8] = &bytes;
    let envelope: Cbor =
        ciborium::from_reader(&mut reader).map_err(|e| DecodeError::Cbor(format!("{}", e)))?;
    if !reader.is_empty() {
        return Err(DecodeError::Malformed(format!(
            "{} trailing bytes after envelope",
            reader.len()
        )));
    }

    let (version, values) = split_envelope(envelope)?;

    if policy == LengthPolicy::Strict && values.len() != schema.len() {
        return Err(DecodeError::FieldCount {
            expected: schema.len(),
            found: values.len(),
        });
    }

    let mut state = Map::new();
    for (position, (field, value)) in schema.fields().iter().zip(values).enumerate() {
        let json = from_cbor(field.ty, value).ok_or_else(|| DecodeError::TypeMismatch {
            position,
            field: field.name.clone(),
            expected: field.ty,
        })?;
        state.insert(field.name.clone(), json);
    }

    Ok(Decoded { version, state })
}

// ============================================================================
// Codec
// ============================================================================

/// A schema bound to a length policy, shared by the orchestrator.
#[derive(Debug, Clone)]
pub struct Codec {
    schema: Arc<Schema>,
    policy: LengthPolicy,
}

impl Codec {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
            policy: LengthPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LengthPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn policy(&self) -> LengthPolicy {
        self.policy
    }

    pub fn encode(&self, state: &Map<String, Value>, version: u64) -> Result<String, EncodeError> {
        encode(state, &self.schema, version)
    }

    pub fn decode(&self, blob: &str) -> Result<Decoded, DecodeError> {
        decode(blob, &self.schema, self.policy)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn split_envelope(envelope: Cbor) -> Result<(u64, Vec<Cbor>), DecodeError> {
    let Cbor::Array(mut parts) = envelope else {
        return Err(DecodeError::Malformed("envelope is not an array".into()));
    };
    if parts.len() != 2 {
        return Err(DecodeError::Malformed(format!(
            "envelope has {} elements, expected 2",
            parts.len()
        )));
    }
    let values = parts.pop();
    let version = parts.pop();

    let version = match version {
        Some(Cbor::Integer(i)) => u64::try_from(i)
            .map_err(|_| DecodeError::Malformed("version is not a non-negative integer".into()))?,
        _ => return Err(DecodeError::Malformed("version is not an integer".into())),
    };
    match values {
        Some(Cbor::Array(values)) => Ok((version, values)),
        _ => Err(DecodeError::Malformed("values are not an array".into())),
    }
}

fn to_cbor(ty: FieldType, value: &Value) -> Option<Cbor> {
    match (ty, value) {
        (FieldType::NullableInt, Value::Null) => Some(Cbor::Null),
        (FieldType::Int | FieldType::NullableInt, v) => v.as_i64().map(|i| Cbor::Integer(i.into())),
        (FieldType::IntList, Value::Array(items)) => items
            .iter()
            .map(|v| v.as_i64().map(|i| Cbor::Integer(i.into())))
            .collect::<Option<Vec<_>>>()
            .map(Cbor::Array),
        (FieldType::Str, Value::String(s)) => Some(Cbor::Text(s.clone())),
        _ => None,
    }
}

fn from_cbor(ty: FieldType, value: Cbor) -> Option<Value> {
    match (ty, value) {
        (FieldType::NullableInt, Cbor::Null) => Some(Value::Null),
        (FieldType::Int | FieldType::NullableInt, Cbor::Integer(i)) => {
            i64::try_from(i).ok().map(Value::from)
        }
        (FieldType::IntList, Cbor::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Cbor::Integer(i) => i64::try_from(i).ok().map(Value::from),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        (FieldType::Str, Cbor::Text(s)) => Some(Value::String(s)),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
