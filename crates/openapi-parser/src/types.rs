//! Type definitions for parsed OpenAPI specs

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Schema;

/// HTTP methods supported by OpenAPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Lowercase form, as used for config keys and file names
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Either an inline object or a `$ref` to one in `components`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

/// A single API endpoint extracted from the spec
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEndpoint {
    /// URL path (e.g., "/v1/customers/{id}")
    pub path: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Operation ID (from spec or generated)
    pub operation_id: String,
    /// Short summary
    pub summary: String,
    /// Full description
    pub description: Option<String>,
    /// Tags for grouping
    pub tags: Vec<String>,
    /// Raw responses keyed by status code
    pub responses: IndexMap<String, RefOr<RawResponse>>,
}

/// Media-type level example after `$ref` resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedExample {
    Value(Value),
    /// The example could not be resolved (missing or circular reference)
    Unavailable,
}

impl ResolvedExample {
    pub fn value(&self) -> Option<&Value> {
        match self {
            ResolvedExample::Value(value) => Some(value),
            ResolvedExample::Unavailable => None,
        }
    }
}

/// A fully resolved response body schema
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResponseSchema {
    /// Schema with every `$ref` expanded and `allOf` flattened
    pub schema: Schema,
    /// Dot paths of nullable properties, in first-discovery order
    pub nullable_paths: Vec<String>,
    /// Example declared on the media type, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_object: Option<ResolvedExample>,
}

/// One response code with its resolved content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedResponse {
    /// HTTP status code (or "default")
    pub code: String,
    /// Resolved schema per media type
    pub content: IndexMap<String, ResolvedResponseSchema>,
}

impl ResolvedResponse {
    /// The JSON body schema: first media type containing "json", else the first one
    pub fn json(&self) -> Option<&ResolvedResponseSchema> {
        self.content
            .iter()
            .find(|(content_type, _)| content_type.contains("json"))
            .or_else(|| self.content.first())
            .map(|(_, schema)| schema)
    }
}

/// An endpoint whose responses have been resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizedEndpoint {
    pub method: HttpMethod,
    pub path: String,
    pub operation_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub responses: Vec<ResolvedResponse>,
}

// --- Raw OpenAPI 3.x structures for parsing ---

/// Raw OpenAPI document structure
#[derive(Debug, Clone, Deserialize)]
pub struct RawOpenApiSpec {
    pub openapi: String,
    pub info: RawInfo,
    #[serde(default)]
    pub paths: Option<IndexMap<String, RawPathItem>>,
    #[serde(default)]
    pub components: Option<Components>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInfo {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPathItem {
    pub get: Option<RawOperation>,
    pub put: Option<RawOperation>,
    pub post: Option<RawOperation>,
    pub delete: Option<RawOperation>,
    pub options: Option<RawOperation>,
    pub head: Option<RawOperation>,
    pub patch: Option<RawOperation>,
    pub trace: Option<RawOperation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<RawResponse>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawResponse {
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<IndexMap<String, RawMediaType>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMediaType {
    pub schema: Option<Schema>,
    pub example: Option<Value>,
    pub examples: Option<IndexMap<String, RefOr<RawExample>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExample {
    pub summary: Option<String>,
    pub value: Option<Value>,
    pub external_value: Option<String>,
}

/// The `components` sections used for reference resolution
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<RawResponse>>,
    #[serde(default)]
    pub examples: IndexMap<String, RefOr<RawExample>>,
}
