//! # openapi-parser
//!
//! OpenAPI 3.x loader for openapi-mockgen.
//! Extracts endpoints, resolves `$ref`/`allOf` in response schemas and
//! computes the nullable paths the mock adapters need.

mod types;
mod schema;
mod parser;
mod operations;
mod groups;
mod resolver;
mod error;

pub use types::*;
pub use schema::{AdditionalProperties, ExclusiveBound, Schema, SchemaType};
pub use parser::{OpenApiDocument, OpenApiParser};
pub use operations::EndpointExtractor;
pub use groups::EndpointGroups;
pub use resolver::{nullable_paths, parse_component_ref, ComponentSection, Resolution, SchemaResolver};
pub use error::{ParseError, ParseResult, ResolveError};
