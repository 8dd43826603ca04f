//! Schema to mock expression compiler

use openapi_parser::{
    AdditionalProperties, ExclusiveBound, ResolvedExample, ResolvedResponseSchema, Schema, SchemaType,
};
use fancy_regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::catalog::{
    format_capability, number_heuristic, string_heuristic, Capability, DEFAULT_MAX_NUMBER,
    DEFAULT_MIN_NUMBER, DEFAULT_MULTIPLE_OF,
};
use crate::config::{EndpointContext, FakerRule};
use crate::expression::{MockExpression, ObjectEntry};
use crate::validator::{self, CollectedErrors};

/// Compiles resolved schemas of one endpoint into [`MockExpression`]s.
///
/// Decision order for every node, first match wins:
///
/// 1. missing, `$ref` or circular node: `null`
/// 2. faker map override for the property key (exact key before regex keys)
/// 3. examples, when enabled for the endpoint
/// 4. `enum`
/// 5. `allOf`, flattened
/// 6. `oneOf` / `anyOf`
/// 7. the declared (or inferred) `type`
pub struct MockCompiler<'a> {
    context: &'a EndpointContext,
    /// Faker map keys compiled as regexes (lookaround allowed), in declaration order
    patterns: Vec<(Regex, &'a FakerRule)>,
}

impl<'a> MockCompiler<'a> {
    pub fn new(context: &'a EndpointContext) -> Self {
        let patterns = context
            .faker_map
            .iter()
            .filter_map(|(key, rule)| match Regex::new(key) {
                Ok(pattern) => Some((pattern, rule)),
                Err(e) => {
                    warn!("Invalid regex pattern found in fakerMap: {} ({})", key, e);
                    None
                }
            })
            .collect();

        Self { context, patterns }
    }

    pub fn context(&self) -> &EndpointContext {
        self.context
    }

    /// Compile a response body; the media-type example is honored at the root
    pub fn compile_response(
        &self,
        response: Option<&ResolvedResponseSchema>,
        errors: &mut CollectedErrors,
    ) -> MockExpression {
        let Some(response) = response else {
            return MockExpression::null();
        };

        let example_object = response.example_object.as_ref().and_then(ResolvedExample::value);
        self.compile_node(Some(&response.schema), example_object, None, false, errors)
    }

    /// Compile one schema node.
    ///
    /// `inside_array` suppresses schema-level examples so that repeated
    /// items do not all carry the same literal.
    pub fn compile(
        &self,
        schema: Option<&Schema>,
        key: Option<&str>,
        inside_array: bool,
        errors: &mut CollectedErrors,
    ) -> MockExpression {
        self.compile_node(schema, None, key, inside_array, errors)
    }

    fn compile_node(
        &self,
        schema: Option<&Schema>,
        example_object: Option<&Value>,
        key: Option<&str>,
        inside_array: bool,
        errors: &mut CollectedErrors,
    ) -> MockExpression {
        let Some(schema) = schema.filter(|s| !s.is_terminal_marker()) else {
            return MockExpression::null();
        };

        if let Some(expression) = key.and_then(|key| self.faker_override(key)) {
            return expression;
        }

        if self.context.use_example {
            validator::validate(
                schema,
                example_object,
                key,
                self.context.method,
                &self.context.path,
                errors,
            );

            if let Some(example) = example_object {
                return MockExpression::Literal(example.clone());
            }
            if let Some(example) = schema.example.as_ref().filter(|_| !inside_array) {
                return MockExpression::Literal(example.clone());
            }
        }

        if let Some(values) = schema.enum_values.as_ref().filter(|v| !v.is_empty()) {
            return MockExpression::PickOne(values.iter().cloned().map(MockExpression::Literal).collect());
        }

        if schema.all_of.is_some() {
            let flattened = schema.flatten_all_of();
            return self.compile_node(Some(&flattened), example_object, key, inside_array, errors);
        }

        if let Some(branches) = schema.alternatives() {
            let choices = branches
                .iter()
                .map(|branch| self.compile_node(Some(branch), None, key, inside_array, errors))
                .collect();
            return MockExpression::PickOne(choices);
        }

        let schema_type = match &schema.schema_type {
            Some(schema_type) => schema_type.clone(),
            None => infer_type(schema),
        };

        match schema_type {
            SchemaType::String => MockExpression::Call(string_capability(schema, key)),
            SchemaType::Number | SchemaType::Integer => MockExpression::Call(number_capability(schema, key)),
            SchemaType::Boolean => MockExpression::Call(Capability::Boolean),
            SchemaType::Object => self.compile_object(schema, inside_array, errors),
            SchemaType::Array => self.compile_array(schema, key, errors),
            SchemaType::Other(_) => MockExpression::null(),
        }
    }

    fn faker_override(&self, key: &str) -> Option<MockExpression> {
        let rule = self.context.faker_map.get(key).or_else(|| {
            self.patterns
                .iter()
                .find(|(pattern, _)| pattern.is_match(key).unwrap_or(false))
                .map(|(_, rule)| *rule)
        })?;

        let expression = match rule {
            FakerRule::Literal(value) => MockExpression::Literal(value.clone()),
            FakerRule::GeneratorExpression(source) => MockExpression::Generator(source.clone()),
            FakerRule::Custom(producer) => MockExpression::Custom(producer.clone()),
        };
        Some(expression)
    }

    fn compile_object(&self, schema: &Schema, inside_array: bool, errors: &mut CollectedErrors) -> MockExpression {
        let additional = schema.additional_properties.as_ref();

        if schema.properties.is_none() && !matches!(additional, Some(AdditionalProperties::Schema(_))) {
            if let Some(example) = &schema.example {
                return MockExpression::Literal(example.clone());
            }
        }

        let mut entries: Vec<ObjectEntry> = schema
            .properties
            .iter()
            .flatten()
            .map(|(name, property)| {
                let value = self.compile_node(Some(property), None, Some(name), inside_array, errors);
                ObjectEntry::fixed(name.clone(), value)
            })
            .collect();

        match additional {
            Some(AdditionalProperties::Allowed(true)) => entries.push(ObjectEntry::generated(
                MockExpression::Call(Capability::Words),
                MockExpression::Call(Capability::Words),
            )),
            Some(AdditionalProperties::Schema(extra)) => {
                let value = self.compile_node(Some(extra), None, None, inside_array, errors);
                entries.push(ObjectEntry::generated(MockExpression::Call(Capability::Words), value));
            }
            _ => {}
        }

        MockExpression::Object(entries)
    }

    fn compile_array(&self, schema: &Schema, key: Option<&str>, errors: &mut CollectedErrors) -> MockExpression {
        if schema.items.is_none() {
            if let Some(example) = &schema.example {
                return MockExpression::Literal(example.clone());
            }
        }

        let item = self.compile_node(schema.items.as_deref(), None, key, true, errors);
        MockExpression::Repeat {
            count: self.context.array_length,
            item: Box::new(item),
        }
    }
}

/// Type of a node that declares none
fn infer_type(schema: &Schema) -> SchemaType {
    if schema.properties.is_some()
        || matches!(schema.additional_properties, Some(AdditionalProperties::Schema(_)))
    {
        SchemaType::Object
    } else if schema.items.is_some() {
        SchemaType::Array
    } else if schema.has_numeric_constraints() {
        SchemaType::Number
    } else {
        SchemaType::String
    }
}

fn string_capability(schema: &Schema, key: Option<&str>) -> Capability {
    if let Some(capability) = schema
        .format
        .as_deref()
        .and_then(|format| format_capability(format, schema.pattern.as_deref()))
    {
        return capability;
    }

    // Lookaround and backreferences are accepted here; the evaluator falls
    // back to dynamic output for patterns it cannot sample from.
    if let Some(pattern) = &schema.pattern {
        return match Regex::new(pattern) {
            Ok(_) => Capability::FromRegex {
                pattern: pattern.clone(),
            },
            Err(e) => {
                warn!("Invalid regex pattern in your openapi schema found: {} ({})", pattern, e);
                Capability::Words
            }
        };
    }

    if let Some(capability) = key.and_then(string_heuristic) {
        return capability;
    }

    match (schema.min_length, schema.max_length) {
        (Some(min), Some(max)) => Capability::Alpha {
            min_length: Some(min.min(max)),
            max_length: Some(max.max(min)),
        },
        (Some(min), None) if min > 0 => Capability::Alpha {
            min_length: Some(min),
            max_length: None,
        },
        (None, Some(max)) if max > 0 => Capability::Alpha {
            min_length: None,
            max_length: Some(max),
        },
        _ => Capability::Words,
    }
}

fn number_capability(schema: &Schema, key: Option<&str>) -> Capability {
    if let Some(capability) = key.and_then(number_heuristic) {
        return capability;
    }

    let min = schema.minimum.unwrap_or(DEFAULT_MIN_NUMBER);
    let min = match schema.exclusive_minimum {
        Some(ExclusiveBound::Value(bound)) => bound + 1.0,
        Some(ExclusiveBound::Flag(true)) => min + 1.0,
        _ => min,
    };

    let max = schema.maximum.unwrap_or(DEFAULT_MAX_NUMBER);
    let max = match schema.exclusive_maximum {
        Some(ExclusiveBound::Value(bound)) => bound - 1.0,
        Some(ExclusiveBound::Flag(true)) => max - 1.0,
        _ => max,
    };

    let multiple_of = schema
        .multiple_of
        .filter(|step| *step > 0.0)
        .unwrap_or(DEFAULT_MULTIPLE_OF);

    Capability::Number {
        min: min.min(max),
        max: max.max(min),
        multiple_of,
    }
}
