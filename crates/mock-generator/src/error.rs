//! Error types for mock-generator

use thiserror::Error;

/// Result type alias for mock generation
pub type MockResult<T> = std::result::Result<T, MockError>;

/// Mock generation error types
#[derive(Error, Debug)]
pub enum MockError {
    #[error("Invalid regex pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unsupported generator expression: {0}")]
    UnsupportedExpression(String),

    #[error("Custom producer `{producer}` failed: {reason}")]
    ProducerFailed { producer: String, reason: String },

    #[error("No multiple of {multiple_of} between {min} and {max}")]
    EmptyRange { min: f64, max: f64, multiple_of: f64 },

    #[error("String length {length} exceeds the static generation limit of {limit}")]
    LengthTooLarge { length: u64, limit: u64 },

    #[error("Cannot pick from an empty list of alternatives")]
    EmptyChoice,

    #[error("Config file not found at {0}, please run `openapi-mockgen init` to create one")]
    ConfigNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Spec error: {0}")]
    SpecError(#[from] openapi_parser::ParseError),
}
