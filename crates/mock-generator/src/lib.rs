//! # mock-generator
//!
//! Turns resolved OpenAPI response schemas into mock data for openapi-mockgen.
//!
//! - [`MockCompiler`] compiles a schema into a [`MockExpression`]
//! - [`MockEvaluator`] materializes an expression into a static JSON value
//! - [`generate_mocks`] runs both over every endpoint and collects
//!   example/schema mismatches

mod catalog;
mod compiler;
mod config;
mod error;
mod evaluator;
mod expression;
mod generate;
mod manifest;
mod validator;

pub use catalog::{
    format_capability, number_heuristic, string_heuristic, Capability, DEFAULT_MAX_NUMBER,
    DEFAULT_MIN_NUMBER, DEFAULT_MULTIPLE_OF, DEFAULT_SEED,
};
pub use compiler::MockCompiler;
pub use config::{
    Config, ConfigManager, EndpointConfig, EndpointContext, FakerMap, FakerRule, CONFIG_FILE_NAME,
    DEFAULT_ARRAY_LENGTH, DEFAULT_OUTPUT_DIR,
};
pub use error::{MockError, MockResult};
pub use evaluator::{Evaluation, FakeValueGenerator, MockEvaluator, ValueGenerator};
pub use expression::{CustomProducer, EntryKey, MockExpression, ObjectEntry};
pub use generate::{generate_mocks, generate_mocks_with, EndpointMocks, MockRun, ResponseMock};
pub use manifest::{mock_file_name, Manifest, ManifestEntry, API_DIR_NAME, MANIFEST_FILE_NAME};
pub use validator::{validate, value_type, CollectedErrors, TypeMismatch};
