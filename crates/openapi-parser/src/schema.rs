//! JSON Schema model (OpenAPI 3.x dialect)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared `type` of a schema node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    /// Anything else (`null`, typos, vendor types)
    Other(String),
}

impl SchemaType {
    pub fn as_str(&self) -> &str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Other(other) => other,
        }
    }
}

impl From<String> for SchemaType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "string" => SchemaType::String,
            "number" => SchemaType::Number,
            "integer" => SchemaType::Integer,
            "boolean" => SchemaType::Boolean,
            "object" => SchemaType::Object,
            "array" => SchemaType::Array,
            _ => SchemaType::Other(value),
        }
    }
}

impl From<SchemaType> for String {
    fn from(value: SchemaType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `additionalProperties` is either a flag or a schema for the extra values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// Exclusive bounds are booleans in OpenAPI 3.0 and numbers in 3.1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Flag(bool),
    Value(f64),
}

/// A schema node.
///
/// A node carrying `$ref` is only a marker until the resolver replaces it.
/// `x-circular-ref` is set by the resolver where a reference cycle was cut.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "x-circular-ref", default, skip_serializing_if = "std::ops::Not::not")]
    pub circular: bool,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl Schema {
    /// Terminal marker substituted where a reference cycle was detected
    pub fn circular() -> Self {
        Self {
            circular: true,
            ..Self::default()
        }
    }

    /// Schema with only a declared type
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// True for nodes that cannot be compiled any further
    pub fn is_terminal_marker(&self) -> bool {
        self.reference.is_some() || self.circular
    }

    /// True if any numeric constraint keyword is present
    pub fn has_numeric_constraints(&self) -> bool {
        self.minimum.is_some()
            || self.maximum.is_some()
            || self.multiple_of.is_some()
            || self.exclusive_minimum.is_some()
            || self.exclusive_maximum.is_some()
    }

    /// The `oneOf` alternatives, else the `anyOf` ones. Empty lists count as absent.
    pub fn alternatives(&self) -> Option<&[Schema]> {
        self.one_of
            .as_deref()
            .filter(|branches| !branches.is_empty())
            .or_else(|| self.any_of.as_deref().filter(|branches| !branches.is_empty()))
    }

    /// Merge every `allOf` branch and then the node's own keys into one schema.
    ///
    /// Later branches win on collision and the node itself wins over all branches.
    pub fn flatten_all_of(&self) -> Schema {
        let mut own = self.clone();
        let branches = own.all_of.take().unwrap_or_default();

        let mut merged = Schema::default();
        for branch in branches {
            merged.merge(branch);
        }
        merged.merge(own);
        merged
    }

    /// Deep-merge `other` into `self`, `other` winning on collision.
    ///
    /// Properties, `items` and schema-valued `additionalProperties` merge
    /// recursively; lists (`enum`, `oneOf`, `anyOf`, `allOf`) are replaced
    /// wholesale; `nullable` and the circular marker are OR-ed.
    pub fn merge(&mut self, other: Schema) {
        let Schema {
            reference,
            circular,
            schema_type,
            properties,
            items,
            additional_properties,
            enum_values,
            all_of,
            one_of,
            any_of,
            format,
            pattern,
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
            multiple_of,
            min_length,
            max_length,
            nullable,
            example,
        } = other;

        if let Some(properties) = properties {
            let target = self.properties.get_or_insert_with(IndexMap::new);
            for (name, schema) in properties {
                match target.get_mut(&name) {
                    Some(existing) => existing.merge(schema),
                    None => {
                        target.insert(name, schema);
                    }
                }
            }
        }

        if let Some(items) = items {
            match self.items.as_mut() {
                Some(existing) => existing.merge(*items),
                None => self.items = Some(items),
            }
        }

        if let Some(additional) = additional_properties {
            match (self.additional_properties.as_mut(), additional) {
                (Some(AdditionalProperties::Schema(existing)), AdditionalProperties::Schema(schema)) => {
                    existing.merge(*schema)
                }
                (_, additional) => self.additional_properties = Some(additional),
            }
        }

        replace_if_some(&mut self.reference, reference);
        replace_if_some(&mut self.schema_type, schema_type);
        replace_if_some(&mut self.enum_values, enum_values);
        replace_if_some(&mut self.all_of, all_of);
        replace_if_some(&mut self.one_of, one_of);
        replace_if_some(&mut self.any_of, any_of);
        replace_if_some(&mut self.format, format);
        replace_if_some(&mut self.pattern, pattern);
        replace_if_some(&mut self.minimum, minimum);
        replace_if_some(&mut self.maximum, maximum);
        replace_if_some(&mut self.exclusive_minimum, exclusive_minimum);
        replace_if_some(&mut self.exclusive_maximum, exclusive_maximum);
        replace_if_some(&mut self.multiple_of, multiple_of);
        replace_if_some(&mut self.min_length, min_length);
        replace_if_some(&mut self.max_length, max_length);
        replace_if_some(&mut self.example, example);

        self.circular |= circular;
        self.nullable |= nullable;
    }
}

fn replace_if_some<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_deserialize_keywords() {
        let parsed = schema(json!({
            "type": "object",
            "properties": {
                "tags": {"type": "array", "items": {"type": "string"}},
                "extra": {"additionalProperties": {"type": "integer"}}
            },
            "additionalProperties": true,
            "exclusiveMinimum": true,
            "exclusiveMaximum": 10,
            "x-vendor": "ignored"
        }));

        assert_eq!(parsed.schema_type, Some(SchemaType::Object));
        let properties = parsed.properties.as_ref().unwrap();
        assert_eq!(properties["tags"].items.as_ref().unwrap().schema_type, Some(SchemaType::String));
        assert!(matches!(
            properties["extra"].additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));
        assert_eq!(parsed.additional_properties, Some(AdditionalProperties::Allowed(true)));
        assert_eq!(parsed.exclusive_minimum, Some(ExclusiveBound::Flag(true)));
        assert_eq!(parsed.exclusive_maximum, Some(ExclusiveBound::Value(10.0)));
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let parsed = schema(json!({"type": "null"}));
        assert_eq!(parsed.schema_type, Some(SchemaType::Other("null".to_string())));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json!({"type": "null"}));
    }

    #[test]
    fn test_flatten_all_of_later_branch_wins() {
        let parsed = schema(json!({
            "description": "ignored",
            "nullable": true,
            "allOf": [
                {"type": "object", "properties": {"id": {"type": "string"}, "name": {"type": "string"}}},
                {"properties": {"id": {"type": "integer", "minimum": 1}}, "enum": [1]},
                {"enum": [2, 3]}
            ]
        }));

        let flat = parsed.flatten_all_of();
        assert!(flat.all_of.is_none());
        assert!(flat.nullable);
        assert_eq!(flat.schema_type, Some(SchemaType::Object));
        let properties = flat.properties.unwrap();
        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(properties["id"].schema_type, Some(SchemaType::Integer));
        assert_eq!(properties["id"].minimum, Some(1.0));
        assert_eq!(flat.enum_values, Some(vec![json!(2), json!(3)]));
    }

    #[test]
    fn test_alternatives_prefers_one_of_and_skips_empty() {
        let parsed = schema(json!({
            "oneOf": [],
            "anyOf": [{"type": "string"}, {"type": "number"}]
        }));
        assert_eq!(parsed.alternatives().map(|b| b.len()), Some(2));

        let parsed = schema(json!({"anyOf": []}));
        assert!(parsed.alternatives().is_none());
    }
}
