//! Main OpenAPI parser

use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{ParseError, ParseResult};
use crate::operations::EndpointExtractor;
use crate::resolver::{Resolution, SchemaResolver};
use crate::types::*;

/// A loaded OpenAPI v3 document
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    /// OpenAPI version string
    pub openapi: String,
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// All extracted endpoints
    pub endpoints: Vec<ApiEndpoint>,
    /// Components used to resolve references
    pub components: Components,
}

impl OpenApiDocument {
    /// Resolver bound to this document's components
    pub fn resolver(&self) -> SchemaResolver<'_> {
        SchemaResolver::new(&self.components)
    }

    /// Resolve the responses of the given endpoints.
    ///
    /// Resolution problems are logged and returned; they never abort the batch.
    pub fn organize(&self, endpoints: &[&ApiEndpoint]) -> Resolution<Vec<OrganizedEndpoint>> {
        let resolver = self.resolver();
        let mut errors = Vec::new();

        let value = endpoints
            .iter()
            .map(|endpoint| {
                let resolution = resolver.organize(endpoint);
                errors.extend(resolution.errors);
                resolution.value
            })
            .collect();

        Resolution { value, errors }
    }
}

/// OpenAPI 3.x parser
pub struct OpenApiParser;

impl OpenApiParser {
    /// Parse an OpenAPI spec from a string (auto-detects JSON/YAML)
    pub fn parse(content: &str) -> ParseResult<OpenApiDocument> {
        // Sanitize content to handle problematic large numbers
        let content = Self::sanitize_large_numbers(content);

        // Try JSON first, then YAML
        let raw_spec: RawOpenApiSpec = if content.trim().starts_with('{') {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        Self::convert_spec(raw_spec)
    }

    /// Parse an OpenAPI spec from JSON
    pub fn parse_json(content: &str) -> ParseResult<OpenApiDocument> {
        let content = Self::sanitize_large_numbers(content);
        let raw_spec: RawOpenApiSpec = serde_json::from_str(&content)?;
        Self::convert_spec(raw_spec)
    }

    /// Parse an OpenAPI spec from YAML
    pub fn parse_yaml(content: &str) -> ParseResult<OpenApiDocument> {
        let content = Self::sanitize_large_numbers(content);
        let raw_spec: RawOpenApiSpec = serde_yaml::from_str(&content)?;
        Self::convert_spec(raw_spec)
    }

    /// Load a spec from a local path or an http(s) URL
    pub async fn load(spec_path: &str) -> ParseResult<OpenApiDocument> {
        if spec_path.starts_with("http://") || spec_path.starts_with("https://") {
            return Self::fetch_and_parse(spec_path).await;
        }

        info!("Loading spec from: {}", spec_path);
        let content = std::fs::read_to_string(Path::new(spec_path))?;

        let is_yaml = spec_path.ends_with(".yaml") || spec_path.ends_with(".yml");
        if is_yaml {
            Self::parse_yaml(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Sanitize large numbers that may cause parsing issues
    /// Some specs use very large numbers for min/max values
    /// which can cause serde_yaml to fail with "JSON number out of range"
    fn sanitize_large_numbers(content: &str) -> String {
        // Replace any integer that's too large for safe JSON parsing (> 15 digits)
        let re_large = match Regex::new(
            r"(?m)^(\s*(?:minimum|maximum|exclusiveMinimum|exclusiveMaximum):\s*)(-?\d{16,})",
        ) {
            Ok(re) => re,
            Err(e) => {
                warn!("Skipping large number sanitizing: {}", e);
                return content.to_string();
            }
        };

        let content = re_large.replace_all(content, |caps: &regex::Captures| {
            let prefix = &caps[1];
            let num_str = &caps[2];
            if num_str.starts_with('-') {
                format!("{}-2147483648", prefix)
            } else {
                format!("{}2147483647", prefix)
            }
        });

        content.into_owned()
    }

    /// Fetch and parse an OpenAPI spec from a URL
    pub async fn fetch_and_parse(url: &str) -> ParseResult<OpenApiDocument> {
        info!("Fetching OpenAPI spec from: {}", url);

        let parsed_url = url::Url::parse(url).map_err(|e| ParseError::InvalidUrl(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ParseError::HttpError(e.to_string()))?;

        let response = client
            .get(parsed_url.clone())
            .header("Accept", "application/json, application/yaml, text/yaml")
            .send()
            .await
            .map_err(|e| ParseError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ParseError::FetchError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let content = response
            .text()
            .await
            .map_err(|e| ParseError::FetchError(e.to_string()))?;

        // Parse based on content type or file extension
        let path = parsed_url.path();
        if content_type.contains("yaml") || path.ends_with(".yaml") || path.ends_with(".yml") {
            Self::parse_yaml(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Convert a raw OpenAPI spec to our internal format
    fn convert_spec(raw: RawOpenApiSpec) -> ParseResult<OpenApiDocument> {
        // Validate OpenAPI version
        if !raw.openapi.starts_with('3') {
            return Err(ParseError::UnsupportedVersion(raw.openapi));
        }

        debug!("Parsing OpenAPI {} spec: {}", raw.openapi, raw.info.title);

        let paths = raw.paths.ok_or(ParseError::MissingPaths)?;
        let endpoints = EndpointExtractor::extract(&paths);

        debug!("Extracted {} endpoints", endpoints.len());

        Ok(OpenApiDocument {
            openapi: raw.openapi,
            title: raw.info.title,
            version: raw.info.version,
            endpoints,
            components: raw.components.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;

    const SAMPLE_SPEC: &str = r#"
openapi: "3.0.0"
info:
  title: Test API
  version: "1.0.0"
paths:
  /users:
    get:
      operationId: listUsers
      summary: List all users
      tags: [user]
      responses:
        '200':
          description: A list of users
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/User'
  /users/{id}:
    get:
      summary: Get a user by ID
      responses:
        '200':
          $ref: '#/components/responses/UserResponse'
        '404':
          description: Not found
components:
  schemas:
    User:
      type: object
      properties:
        id:
          type: integer
        manager:
          $ref: '#/components/schemas/User'
        nickname:
          type: string
          nullable: true
  responses:
    UserResponse:
      description: A user
      content:
        application/json:
          schema:
            $ref: '#/components/schemas/User'
          example:
            id: 7
"#;

    #[test]
    fn test_parse_yaml() {
        let doc = OpenApiParser::parse_yaml(SAMPLE_SPEC).unwrap();

        assert_eq!(doc.title, "Test API");
        assert_eq!(doc.version, "1.0.0");
        assert_eq!(doc.endpoints.len(), 2);
        assert_eq!(doc.endpoints[1].operation_id, "get_users_id");
        assert!(doc.components.schemas.contains_key("User"));
    }

    #[test]
    fn test_organize_resolves_responses() {
        let doc = OpenApiParser::parse(SAMPLE_SPEC).unwrap();
        let selected: Vec<&ApiEndpoint> = doc.endpoints.iter().collect();
        let organized = doc.organize(&selected);

        // each traversal of User cuts its self reference once
        assert_eq!(organized.errors.len(), 2);
        assert!(organized.errors.iter().all(|e| e.is_warning()));

        let list = organized.value[0].responses[0].json().unwrap();
        assert_eq!(list.schema.schema_type, Some(SchemaType::Array));
        assert_eq!(list.nullable_paths, vec!["nickname"]);

        let single = organized.value[1].responses[0].json().unwrap();
        let manager = &single.schema.properties.as_ref().unwrap()["manager"];
        assert!(manager.circular);
        assert!(single.example_object.is_some());
        assert!(organized.value[1].responses[1].content.is_empty());
    }

    #[test]
    fn test_rejects_swagger_2() {
        let result = OpenApiParser::parse_json(r#"{"openapi": "2.0", "info": {"title": "t", "version": "1"}, "paths": {}}"#);
        assert!(matches!(result, Err(ParseError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_missing_paths_is_fatal() {
        let result = OpenApiParser::parse_json(r#"{"openapi": "3.0.3", "info": {"title": "t", "version": "1"}}"#);
        assert!(matches!(result, Err(ParseError::MissingPaths)));
    }

    #[test]
    fn test_sanitize_large_numbers() {
        let yaml_with_large_nums = r#"
openapi: "3.0.0"
info:
  title: Test API
  version: "1.0.0"
paths: {}
components:
  schemas:
    TestSchema:
      type: object
      properties:
        seed:
          type: integer
          minimum: -9223372036854776000
          maximum: 9223372036854776000
"#;

        // This should not panic or error
        let result = OpenApiParser::parse_yaml(yaml_with_large_nums);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("openapi-parser-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("spec.yaml");
        std::fs::write(&path, SAMPLE_SPEC).unwrap();

        let doc = OpenApiParser::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(doc.endpoints.len(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
