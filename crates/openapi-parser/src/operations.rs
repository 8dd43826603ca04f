//! Endpoint extraction from OpenAPI specs

use indexmap::IndexMap;

use crate::types::*;

/// Extracts endpoints from raw OpenAPI spec structures
pub struct EndpointExtractor;

impl EndpointExtractor {
    /// Extract every (path, method) pair of the spec, in document order
    pub fn extract(paths: &IndexMap<String, RawPathItem>) -> Vec<ApiEndpoint> {
        let mut endpoints = Vec::new();

        for (path, path_item) in paths {
            let methods = [
                (HttpMethod::Get, &path_item.get),
                (HttpMethod::Put, &path_item.put),
                (HttpMethod::Post, &path_item.post),
                (HttpMethod::Delete, &path_item.delete),
                (HttpMethod::Options, &path_item.options),
                (HttpMethod::Head, &path_item.head),
                (HttpMethod::Patch, &path_item.patch),
                (HttpMethod::Trace, &path_item.trace),
            ];

            for (method, operation) in methods {
                if let Some(op) = operation {
                    endpoints.push(Self::extract_endpoint(path, method, op));
                }
            }
        }

        endpoints
    }

    fn extract_endpoint(path: &str, method: HttpMethod, operation: &RawOperation) -> ApiEndpoint {
        // Generate operation ID if not provided
        let operation_id = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| Self::generate_operation_id(path, method));

        ApiEndpoint {
            path: path.to_string(),
            method,
            operation_id,
            summary: operation.summary.clone().unwrap_or_default(),
            description: operation.description.clone(),
            tags: operation.tags.clone(),
            responses: operation.responses.clone(),
        }
    }

    /// Generate an operation ID from path and method
    fn generate_operation_id(path: &str, method: HttpMethod) -> String {
        // Convert path to operation ID: /users/{id}/posts -> users_id_posts
        let path_part = path
            .trim_start_matches('/')
            .replace('/', "_")
            .replace('{', "")
            .replace('}', "");

        format!("{}_{}", method.as_lower(), path_part)
    }
}
