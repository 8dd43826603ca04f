//! `$ref` resolver for OpenAPI specs
//!
//! Expands references against `components`, flattens `allOf`, cuts reference
//! cycles and computes the nullable paths of every response schema.

use indexmap::{IndexMap, IndexSet};
use tracing::{error, warn};

use crate::error::ResolveError;
use crate::schema::{AdditionalProperties, Schema};
use crate::types::*;

const COMPONENTS_PREFIX: &str = "#/components/";

/// Sections of `components` a reference can point into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentSection {
    Schemas,
    Responses,
    Examples,
}

impl ComponentSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentSection::Schemas => "schemas",
            ComponentSection::Responses => "responses",
            ComponentSection::Examples => "examples",
        }
    }
}

/// A resolved value together with the problems met while resolving it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub value: T,
    pub errors: Vec<ResolveError>,
}

/// Resolves `$ref` references in schemas, responses and examples
pub struct SchemaResolver<'a> {
    /// Components of the OpenAPI document
    components: &'a Components,
}

impl<'a> SchemaResolver<'a> {
    /// Create a new resolver over the given components
    pub fn new(components: &'a Components) -> Self {
        Self { components }
    }

    /// Resolve a schema, following `$ref` references
    pub fn resolve(&self, schema: &Schema) -> Resolution<Schema> {
        let mut errors = Vec::new();
        let value = self.resolve_schema(schema, &mut Vec::new(), &mut errors);
        Resolution { value, errors }
    }

    /// Resolve every response of an endpoint
    pub fn resolve_responses(
        &self,
        responses: &IndexMap<String, RefOr<RawResponse>>,
    ) -> Resolution<Vec<ResolvedResponse>> {
        let mut errors = Vec::new();
        let value = responses
            .iter()
            .map(|(code, response)| ResolvedResponse {
                code: code.clone(),
                content: self.resolve_response(response, &mut Vec::new(), &mut errors),
            })
            .collect();
        Resolution { value, errors }
    }

    /// Resolve an endpoint into its organized form
    pub fn organize(&self, endpoint: &ApiEndpoint) -> Resolution<OrganizedEndpoint> {
        let Resolution { value: responses, errors } = self.resolve_responses(&endpoint.responses);
        Resolution {
            value: OrganizedEndpoint {
                method: endpoint.method,
                path: endpoint.path.clone(),
                operation_id: endpoint.operation_id.clone(),
                summary: endpoint.summary.clone(),
                description: endpoint.description.clone(),
                responses,
            },
            errors,
        }
    }

    // `stack` holds the references currently being expanded on this path only,
    // so sibling branches can expand the same reference again.
    fn resolve_schema(
        &self,
        schema: &Schema,
        stack: &mut Vec<String>,
        errors: &mut Vec<ResolveError>,
    ) -> Schema {
        if let Some(reference) = &schema.reference {
            if stack.contains(reference) {
                warn!("Circular reference detected: {}", reference);
                errors.push(ResolveError::CircularReference(reference.clone()));
                return Schema::circular();
            }

            let target = match self.lookup(reference, ComponentSection::Schemas, &self.components.schemas) {
                Ok(target) => target,
                Err(e) => {
                    error!("{}", e);
                    errors.push(e);
                    return Schema::default();
                }
            };

            stack.push(reference.clone());
            let resolved = self.resolve_schema(target, stack, errors);
            stack.pop();
            return resolved;
        }

        if schema.circular {
            return schema.clone();
        }

        let mut resolved = schema.clone();

        if let Some(properties) = &schema.properties {
            resolved.properties = Some(
                properties
                    .iter()
                    .map(|(name, property)| (name.clone(), self.resolve_schema(property, stack, errors)))
                    .collect(),
            );
        }

        if let Some(items) = &schema.items {
            resolved.items = Some(Box::new(self.resolve_schema(items, stack, errors)));
        }

        if let Some(AdditionalProperties::Schema(additional)) = &schema.additional_properties {
            resolved.additional_properties = Some(AdditionalProperties::Schema(Box::new(
                self.resolve_schema(additional, stack, errors),
            )));
        }

        resolved.one_of = self.resolve_list(schema.one_of.as_deref(), stack, errors);
        resolved.any_of = self.resolve_list(schema.any_of.as_deref(), stack, errors);

        if let Some(branches) = self.resolve_list(schema.all_of.as_deref(), stack, errors) {
            resolved.all_of = Some(branches);
            resolved = resolved.flatten_all_of();
        }

        resolved
    }

    fn resolve_list(
        &self,
        schemas: Option<&[Schema]>,
        stack: &mut Vec<String>,
        errors: &mut Vec<ResolveError>,
    ) -> Option<Vec<Schema>> {
        schemas.map(|schemas| {
            schemas
                .iter()
                .map(|schema| self.resolve_schema(schema, stack, errors))
                .collect()
        })
    }

    fn resolve_response(
        &self,
        response: &RefOr<RawResponse>,
        stack: &mut Vec<String>,
        errors: &mut Vec<ResolveError>,
    ) -> IndexMap<String, ResolvedResponseSchema> {
        let response = match response {
            RefOr::Item(response) => response,
            RefOr::Ref { reference } => {
                if stack.contains(reference) {
                    warn!("Circular reference detected: {}", reference);
                    errors.push(ResolveError::CircularReference(reference.clone()));
                    return IndexMap::new();
                }

                let target = match self.lookup(reference, ComponentSection::Responses, &self.components.responses) {
                    Ok(target) => target,
                    Err(e) => {
                        error!("{}", e);
                        errors.push(e);
                        return IndexMap::new();
                    }
                };

                stack.push(reference.clone());
                let resolved = self.resolve_response(target, stack, errors);
                stack.pop();
                return resolved;
            }
        };

        let Some(content) = &response.content else {
            return IndexMap::new();
        };

        content
            .iter()
            .map(|(media_type, media)| {
                let schema = media
                    .schema
                    .as_ref()
                    .map(|schema| self.resolve_schema(schema, &mut Vec::new(), errors))
                    .unwrap_or_default();
                let nullable_paths = nullable_paths(&schema);
                let example_object = self.resolve_media_example(media, errors);

                (
                    media_type.clone(),
                    ResolvedResponseSchema {
                        schema,
                        nullable_paths,
                        example_object,
                    },
                )
            })
            .collect()
    }

    /// `examples` wins over `example`; of the named examples the first one is used
    fn resolve_media_example(
        &self,
        media: &RawMediaType,
        errors: &mut Vec<ResolveError>,
    ) -> Option<ResolvedExample> {
        if let Some((_, example)) = media.examples.as_ref().and_then(|examples| examples.first()) {
            return Some(self.resolve_example(example, &mut Vec::new(), errors));
        }

        media.example.clone().map(ResolvedExample::Value)
    }

    fn resolve_example(
        &self,
        example: &RefOr<RawExample>,
        stack: &mut Vec<String>,
        errors: &mut Vec<ResolveError>,
    ) -> ResolvedExample {
        match example {
            RefOr::Item(example) => example
                .value
                .clone()
                .or_else(|| example.external_value.clone().map(serde_json::Value::String))
                .map(ResolvedExample::Value)
                .unwrap_or(ResolvedExample::Unavailable),
            RefOr::Ref { reference } => {
                if stack.contains(reference) {
                    warn!("Circular reference detected: {}", reference);
                    errors.push(ResolveError::CircularReference(reference.clone()));
                    return ResolvedExample::Unavailable;
                }

                match self.lookup(reference, ComponentSection::Examples, &self.components.examples) {
                    Ok(target) => {
                        stack.push(reference.clone());
                        let resolved = self.resolve_example(target, stack, errors);
                        stack.pop();
                        resolved
                    }
                    Err(e) => {
                        warn!("{}", e);
                        errors.push(e);
                        ResolvedExample::Unavailable
                    }
                }
            }
        }
    }

    fn lookup<'m, T>(
        &self,
        reference: &str,
        section: ComponentSection,
        entries: &'m IndexMap<String, T>,
    ) -> Result<&'m T, ResolveError> {
        let name = parse_component_ref(reference, section)?;
        entries.get(&name).ok_or_else(|| ResolveError::MissingReference {
            section: section.as_str().to_string(),
            reference: reference.to_string(),
        })
    }
}

/// Parse refs like "#/components/schemas/User" into the component name
pub fn parse_component_ref(reference: &str, section: ComponentSection) -> Result<String, ResolveError> {
    let malformed = || ResolveError::MalformedReference(reference.to_string());

    let rest = reference.strip_prefix(COMPONENTS_PREFIX).ok_or_else(malformed)?;
    let segments: Vec<&str> = rest.split('/').collect();

    match segments.as_slice() {
        [kind, name] if *kind == section.as_str() && !name.is_empty() => {
            Ok(name.replace("~1", "/").replace("~0", "~"))
        }
        _ => Err(malformed()),
    }
}

/// Collect the dot paths of every nullable property below the root.
///
/// Composition branches share the path of their node and array items share
/// the path of their array. The result is deduplicated in discovery order.
pub fn nullable_paths(schema: &Schema) -> Vec<String> {
    let mut paths = IndexSet::new();
    collect_nullable(schema, "", &mut paths);
    paths.into_iter().collect()
}

fn collect_nullable(schema: &Schema, path: &str, paths: &mut IndexSet<String>) {
    if schema.is_terminal_marker() {
        return;
    }

    if schema.nullable && !path.is_empty() {
        paths.insert(path.to_string());
    }

    for branches in [&schema.all_of, &schema.one_of, &schema.any_of].into_iter().flatten() {
        for branch in branches {
            collect_nullable(branch, path, paths);
        }
    }

    if let Some(properties) = &schema.properties {
        for (name, property) in properties {
            let child = if path.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", path, name)
            };
            collect_nullable(property, &child, paths);
        }
    }

    if let Some(items) = &schema.items {
        collect_nullable(items, path, paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;
    use serde_json::{json, Value};

    fn components(value: Value) -> Components {
        serde_json::from_value(value).unwrap()
    }

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_simple_ref() {
        let components = components(json!({
            "schemas": {
                "User": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "email": {"type": "string"}
                    }
                }
            }
        }));

        let resolver = SchemaResolver::new(&components);
        let resolved = resolver.resolve(&schema(json!({"$ref": "#/components/schemas/User"})));

        assert!(resolved.errors.is_empty());
        assert_eq!(resolved.value.schema_type, Some(SchemaType::Object));
        assert!(resolved.value.properties.unwrap().contains_key("name"));
    }

    #[test]
    fn test_resolve_nested_ref() {
        let components = components(json!({
            "schemas": {
                "Address": {"type": "object", "properties": {"street": {"type": "string"}}},
                "User": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "address": {"$ref": "#/components/schemas/Address"}
                    }
                }
            }
        }));

        let resolver = SchemaResolver::new(&components);
        let resolved = resolver.resolve(&schema(json!({"$ref": "#/components/schemas/User"}))).value;

        let address = &resolved.properties.as_ref().unwrap()["address"];
        assert_eq!(address.schema_type, Some(SchemaType::Object));
        assert!(address.properties.as_ref().unwrap().contains_key("street"));
    }

    #[test]
    fn test_resolve_allof_is_flattened() {
        let components = components(json!({
            "schemas": {
                "Base": {"type": "object", "properties": {"id": {"type": "string"}}}
            }
        }));

        let resolver = SchemaResolver::new(&components);
        let resolved = resolver
            .resolve(&schema(json!({
                "allOf": [
                    {"$ref": "#/components/schemas/Base"},
                    {"properties": {"name": {"type": "string"}}}
                ]
            })))
            .value;

        assert!(resolved.all_of.is_none());
        let properties = resolved.properties.unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(properties["id"].schema_type, Some(SchemaType::String));
    }

    #[test]
    fn test_resolve_keeps_one_of_alternatives() {
        let components = components(json!({
            "schemas": {
                "Cat": {"type": "object", "properties": {"meow": {"type": "boolean"}}},
                "Dog": {"type": "object", "properties": {"bark": {"type": "boolean"}}}
            }
        }));

        let resolver = SchemaResolver::new(&components);
        let resolved = resolver
            .resolve(&schema(json!({
                "oneOf": [
                    {"$ref": "#/components/schemas/Cat"},
                    {"$ref": "#/components/schemas/Dog"}
                ]
            })))
            .value;

        let branches = resolved.one_of.unwrap();
        assert_eq!(branches.len(), 2);
        assert!(branches[1].properties.as_ref().unwrap().contains_key("bark"));
    }

    #[test]
    fn test_cycle_is_cut_with_marker() {
        let components = components(json!({
            "schemas": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "value": {"type": "integer"},
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
                    }
                }
            }
        }));

        let resolver = SchemaResolver::new(&components);
        let resolved = resolver.resolve(&schema(json!({"$ref": "#/components/schemas/Node"})));

        let children = &resolved.value.properties.as_ref().unwrap()["children"];
        assert!(children.items.as_ref().unwrap().circular);
        assert_eq!(
            resolved.errors,
            vec![ResolveError::CircularReference("#/components/schemas/Node".to_string())]
        );
        assert!(resolved.errors[0].is_warning());
    }

    #[test]
    fn test_sibling_branches_reuse_same_ref() {
        let components = components(json!({
            "schemas": {
                "Money": {"type": "object", "properties": {"amount": {"type": "number"}}}
            }
        }));

        let resolver = SchemaResolver::new(&components);
        let resolved = resolver.resolve(&schema(json!({
            "type": "object",
            "properties": {
                "price": {"$ref": "#/components/schemas/Money"},
                "tax": {"$ref": "#/components/schemas/Money"}
            }
        })));

        assert!(resolved.errors.is_empty());
        let properties = resolved.value.properties.unwrap();
        assert!(!properties["price"].circular);
        assert!(!properties["tax"].circular);
    }

    #[test]
    fn test_missing_ref_yields_placeholder_and_error() {
        let resolver_components = components(json!({"schemas": {}}));
        let resolver = SchemaResolver::new(&resolver_components);
        let resolved = resolver.resolve(&schema(json!({
            "type": "object",
            "properties": {
                "ghost": {"$ref": "#/components/schemas/Ghost"},
                "name": {"type": "string"}
            }
        })));

        let properties = resolved.value.properties.unwrap();
        assert_eq!(properties["ghost"], Schema::default());
        assert_eq!(properties["name"].schema_type, Some(SchemaType::String));
        assert_eq!(resolved.errors.len(), 1);
        assert!(matches!(resolved.errors[0], ResolveError::MissingReference { .. }));
    }

    #[test]
    fn test_parse_component_ref() {
        assert_eq!(
            parse_component_ref("#/components/schemas/User", ComponentSection::Schemas).unwrap(),
            "User"
        );
        assert_eq!(
            parse_component_ref("#/components/schemas/a~1b", ComponentSection::Schemas).unwrap(),
            "a/b"
        );
        assert!(parse_component_ref("#/components/examples/User", ComponentSection::Schemas).is_err());
        assert!(parse_component_ref("other.yaml#/User", ComponentSection::Schemas).is_err());
    }

    #[test]
    fn test_nullable_paths() {
        let parsed = schema(json!({
            "type": "object",
            "nullable": true,
            "properties": {
                "a": {
                    "type": "object",
                    "properties": {"b": {"type": "string", "nullable": true}}
                },
                "list": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"note": {"type": "string", "nullable": true}}
                    }
                },
                "choice": {
                    "oneOf": [
                        {"type": "string", "nullable": true},
                        {"type": "integer", "nullable": true}
                    ]
                }
            }
        }));

        assert_eq!(nullable_paths(&parsed), vec!["a.b", "list.note", "choice"]);
    }

    #[test]
    fn test_nullable_path_reported_once_for_shared_ref() {
        let components = components(json!({
            "schemas": {
                "B": {"type": "string", "nullable": true}
            }
        }));
        let resolver = SchemaResolver::new(&components);
        let resolved = resolver
            .resolve(&schema(json!({
                "type": "object",
                "properties": {
                    "a": {
                        "allOf": [
                            {"type": "object", "properties": {"b": {"$ref": "#/components/schemas/B"}}},
                            {"properties": {"b": {"$ref": "#/components/schemas/B"}}}
                        ]
                    }
                }
            })))
            .value;

        assert_eq!(nullable_paths(&resolved), vec!["a.b"]);
    }

    #[test]
    fn test_resolve_responses_with_refs_and_examples() {
        let components = components(json!({
            "schemas": {
                "User": {"type": "object", "properties": {"nickname": {"type": "string", "nullable": true}}}
            },
            "responses": {
                "UserResponse": {
                    "description": "a user",
                    "content": {
                        "application/json": {
                            "schema": {"$ref": "#/components/schemas/User"},
                            "examples": {
                                "first": {"$ref": "#/components/examples/Alice"}
                            }
                        }
                    }
                }
            },
            "examples": {
                "Alice": {"value": {"nickname": "alice"}}
            }
        }));

        let responses: IndexMap<String, RefOr<RawResponse>> = serde_json::from_value(json!({
            "200": {"$ref": "#/components/responses/UserResponse"},
            "204": {"description": "empty"},
            "404": {"$ref": "#/components/responses/Missing"}
        }))
        .unwrap();

        let resolver = SchemaResolver::new(&components);
        let resolved = resolver.resolve_responses(&responses);

        assert_eq!(resolved.value.len(), 3);
        let ok = resolved.value[0].json().unwrap();
        assert_eq!(ok.nullable_paths, vec!["nickname"]);
        assert_eq!(
            ok.example_object,
            Some(ResolvedExample::Value(json!({"nickname": "alice"})))
        );
        assert!(resolved.value[1].content.is_empty());
        assert!(resolved.value[2].content.is_empty());
        assert_eq!(resolved.errors.len(), 1);
    }

    #[test]
    fn test_circular_example_is_unavailable() {
        let components = components(json!({
            "examples": {
                "A": {"$ref": "#/components/examples/B"},
                "B": {"$ref": "#/components/examples/A"}
            }
        }));

        let resolver = SchemaResolver::new(&components);
        let mut errors = Vec::new();
        let example = RefOr::Ref {
            reference: "#/components/examples/A".to_string(),
        };

        assert_eq!(
            resolver.resolve_example(&example, &mut Vec::new(), &mut errors),
            ResolvedExample::Unavailable
        );
        assert!(errors[0].is_warning());
    }
}
