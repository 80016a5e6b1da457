//! Field schema: the ordered list of tracked fields.
//!
//! Position in the schema is the wire identity of a field. Names only exist
//! for the in-memory object, so a schema may grow by appending fields but
//! must never reorder or remove them.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::SchemaError;

// ============================================================================
// FieldType
// ============================================================================

/// Semantic type of a tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Signed 64-bit integer.
    Int,
    /// Signed 64-bit integer or `null`.
    NullableInt,
    /// Sequence of signed 64-bit integers.
    IntList,
    /// UTF-8 string.
    Str,
}

impl FieldType {
    /// Whether a JSON value fits this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Int => value.as_i64().is_some(),
            FieldType::NullableInt => value.is_null() || value.as_i64().is_some(),
            FieldType::IntList => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| v.as_i64().is_some())),
            FieldType::Str => value.is_string(),
        }
    }

    /// Zero value for the type.
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::Int => Value::from(0),
            FieldType::NullableInt => Value::Null,
            FieldType::IntList => Value::Array(Vec::new()),
            FieldType::Str => Value::String(String::new()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Int => "int",
            FieldType::NullableInt => "int|null",
            FieldType::IntList => "int[]",
            FieldType::Str => "string",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Schema
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

/// Ordered, append-only list of tracked fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Wire position of a named field.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Restrict a named object to the tracked fields, in schema order.
    ///
    /// Fields missing from `state` are left out rather than defaulted.
    pub fn project(&self, state: &Map<String, Value>) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|f| state.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Append a field. Order of calls is the wire order.
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(Field {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut seen = HashSet::new();
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName(i));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Schema {
            fields: self.fields,
        })
    }
}
