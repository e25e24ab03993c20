//! Table schema of the `exception_events` output
//!
//! Serializes to the BigQuery JSON schema format so the same declaration can
//! be handed to the loader and used to check records before they are written.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Record,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "STRING",
            FieldType::Integer => "INTEGER",
            FieldType::Record => "RECORD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    Required,
    Nullable,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub mode: FieldMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TableFieldSchema>,
    /// Rejects `""` for this STRING field. Not part of the exported schema.
    #[serde(skip)]
    pub non_empty: bool,
}

impl TableFieldSchema {
    pub fn new(name: &str, field_type: FieldType, mode: FieldMode) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            mode,
            fields: Vec::new(),
            non_empty: false,
        }
    }

    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    pub fn record(name: &str, mode: FieldMode, fields: Vec<TableFieldSchema>) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Record,
            mode,
            fields,
            non_empty: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {reason}")]
pub struct SchemaViolation {
    pub path: String,
    pub reason: String,
}

impl SchemaViolation {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// The declared schema of one flattened exception record
pub fn exception_events_schema() -> TableSchema {
    use FieldMode::*;
    use FieldType::*;

    TableSchema {
        fields: vec![
            TableFieldSchema::new("exceptionId", String, Required).non_empty(),
            TableFieldSchema::new("className", String, Nullable),
            TableFieldSchema::new("message", String, Nullable),
            TableFieldSchema::record(
                "stacktrace",
                Nullable,
                vec![
                    TableFieldSchema::new("stackTraceId", String, Required),
                    TableFieldSchema::record(
                        "stackFrames",
                        Repeated,
                        vec![
                            TableFieldSchema::new("stackFrameId", String, Required),
                            TableFieldSchema::new("declaringClass", String, Nullable),
                            TableFieldSchema::new("methodName", String, Nullable),
                            TableFieldSchema::new("fileName", String, Nullable),
                            TableFieldSchema::new("lineNumber", Integer, Nullable),
                            TableFieldSchema::new("fileRef", String, Nullable),
                        ],
                    ),
                ],
            ),
            TableFieldSchema::new("causes", String, Repeated),
            TableFieldSchema::new("metadata", String, Nullable),
            TableFieldSchema::new("classLevelAnnotations", String, Repeated),
        ],
    }
}

impl TableSchema {
    /// Checks that `record` can be loaded into a table with this schema
    /// without relying on explicit nulls.
    pub fn check(&self, record: &Value) -> Result<(), SchemaViolation> {
        match record {
            Value::Object(object) => check_fields(&self.fields, object, ""),
            _ => Err(SchemaViolation::new("$", "record must be a JSON object")),
        }
    }
}

fn check_fields(
    fields: &[TableFieldSchema],
    object: &Map<String, Value>,
    prefix: &str,
) -> Result<(), SchemaViolation> {
    if let Some(undeclared) = object
        .keys()
        .find(|key| !fields.iter().any(|field| &field.name == *key))
    {
        return Err(SchemaViolation::new(
            &join_path(prefix, undeclared),
            "field is not declared in the schema",
        ));
    }

    for field in fields {
        let path = join_path(prefix, &field.name);
        match (object.get(&field.name), field.mode) {
            (None, FieldMode::Required) => {
                return Err(SchemaViolation::new(&path, "required field is missing"))
            }
            (None, _) => {}
            (Some(Value::Null), _) => {
                return Err(SchemaViolation::new(&path, "explicit null is not accepted"))
            }
            (Some(Value::Array(items)), FieldMode::Repeated) => {
                for (index, item) in items.iter().enumerate() {
                    check_value(field, item, &format!("{}[{}]", path, index))?;
                }
            }
            (Some(_), FieldMode::Repeated) => {
                return Err(SchemaViolation::new(&path, "repeated field must be an array"))
            }
            (Some(value), _) => check_value(field, value, &path)?,
        }
    }

    Ok(())
}

fn check_value(field: &TableFieldSchema, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    match (field.field_type, value) {
        (_, Value::Null) => Err(SchemaViolation::new(path, "explicit null is not accepted")),
        (FieldType::String, Value::String(s)) if field.non_empty && s.is_empty() => {
            Err(SchemaViolation::new(path, "string must not be empty"))
        }
        (FieldType::String, Value::String(_)) => Ok(()),
        (FieldType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
        (FieldType::Record, Value::Object(object)) => check_fields(&field.fields, object, path),
        (field_type, _) => Err(SchemaViolation::new(
            path,
            format!("expected {} value", field_type.as_str()),
        )),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}
