//! Example vs. schema type validation
//!
//! Mismatches never stop generation; they are collected per endpoint and
//! reported once the run is over.

use indexmap::IndexMap;
use openapi_parser::{HttpMethod, Schema, SchemaType};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// An example whose runtime type contradicts the declared schema type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMismatch {
    pub method: HttpMethod,
    pub path: String,
    /// Property key, or `root` for the response body itself
    pub key: String,
    pub schema_type: String,
    pub example_type: String,
}

/// Mismatches keyed by `method-path`, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectedErrors {
    errors: IndexMap<String, Vec<TypeMismatch>>,
}

impl CollectedErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mismatch: TypeMismatch) {
        let key = format!("{}-{}", mismatch.method.as_lower(), mismatch.path);
        self.errors.entry(key).or_default().push(mismatch);
    }

    pub fn get(&self, endpoint_key: &str) -> Option<&[TypeMismatch]> {
        self.errors.get(endpoint_key).map(Vec::as_slice)
    }

    /// Total number of mismatches
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn extend(&mut self, other: CollectedErrors) {
        for mismatch in other.errors.into_values().flatten() {
            self.push(mismatch);
        }
    }

    /// All mismatches sorted by endpoint key
    pub fn sorted(&self) -> Vec<&TypeMismatch> {
        let mut keys: Vec<&String> = self.errors.keys().collect();
        keys.sort();
        keys.into_iter().flat_map(|key| self.errors[key].iter()).collect()
    }

    /// Log every mismatch, sorted by endpoint key
    pub fn report(&self) {
        if self.is_empty() {
            return;
        }

        error!("Found the following mismatched examples in the schema:");
        for mismatch in self.sorted() {
            error!(
                "Found {} in ({}) - {} with schema type {} but received example in type: {}",
                mismatch.key, mismatch.method, mismatch.path, mismatch.schema_type, mismatch.example_type
            );
        }
    }
}

/// Runtime type name of a JSON value
pub fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compare the example of `schema` with its declared type.
///
/// `example_object` is the media-type level example and takes precedence
/// over the schema's own `example`.
pub fn validate(
    schema: &Schema,
    example_object: Option<&Value>,
    key: Option<&str>,
    method: HttpMethod,
    path: &str,
    errors: &mut CollectedErrors,
) {
    let Some(schema_type) = &schema.schema_type else {
        return;
    };
    let Some(example) = example_object.or(schema.example.as_ref()) else {
        return;
    };

    let example_type = value_type(example);
    let matches = match schema_type {
        SchemaType::String => example_type == "string",
        SchemaType::Number | SchemaType::Integer => example_type == "number",
        SchemaType::Boolean => example_type == "boolean",
        SchemaType::Array => example_type == "array",
        SchemaType::Object => example_type == "object",
        SchemaType::Other(_) => true,
    };

    if !matches {
        errors.push(TypeMismatch {
            method,
            path: path.to_string(),
            key: key.unwrap_or("root").to_string(),
            schema_type: schema_type.to_string(),
            example_type: example_type.to_string(),
        });
    }
}
