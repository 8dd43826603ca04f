//! Error types for the OpenAPI parser and schema resolver

use thiserror::Error;

/// Result type alias for parser operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parser error types
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to fetch OpenAPI spec: {0}")]
    FetchError(String),

    #[error("Invalid OpenAPI spec format: {0}")]
    InvalidFormat(String),

    #[error("No paths found in the loaded OpenAPI spec")]
    MissingPaths,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported OpenAPI version: {0} (only OpenAPI v3 is supported)")]
    UnsupportedVersion(String),
}

/// Problems found while resolving references.
///
/// None of these abort a run: the resolver logs them, substitutes a
/// placeholder and keeps going with sibling branches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    #[error("Reference not found in components/{section}: {reference}")]
    MissingReference { section: String, reference: String },

    #[error("Circular reference detected: {0}")]
    CircularReference(String),
}

impl ResolveError {
    /// Circular references only degrade output, they are not structural errors
    pub fn is_warning(&self) -> bool {
        matches!(self, ResolveError::CircularReference(_))
    }
}
