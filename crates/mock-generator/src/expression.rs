//! Mock expression tree
//!
//! The compiler emits a [`MockExpression`]; it only becomes faker source text
//! at the output stage through [`MockExpression::to_source`].

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::catalog::Capability;

type Producer = dyn Fn() -> anyhow::Result<Value> + Send + Sync;

/// A user-registered value producer together with its source text
#[derive(Clone)]
pub struct CustomProducer {
    source: String,
    producer: Arc<Producer>,
}

impl CustomProducer {
    pub fn new<F>(source: impl Into<String>, producer: F) -> Self
    where
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            producer: Arc::new(producer),
        }
    }

    /// Source text of the producer function
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn produce(&self) -> anyhow::Result<Value> {
        (self.producer)()
    }
}

impl fmt::Debug for CustomProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomProducer").field("source", &self.source).finish()
    }
}

impl PartialEq for CustomProducer {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Key of an object entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryKey {
    Fixed(String),
    /// Key produced at evaluation time (`additionalProperties`)
    Generated(Box<MockExpression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: EntryKey,
    pub value: MockExpression,
}

impl ObjectEntry {
    pub fn fixed(key: impl Into<String>, value: MockExpression) -> Self {
        Self {
            key: EntryKey::Fixed(key.into()),
            value,
        }
    }

    pub fn generated(key: MockExpression, value: MockExpression) -> Self {
        Self {
            key: EntryKey::Generated(Box::new(key)),
            value,
        }
    }
}

/// How to synthesize one value
#[derive(Debug, Clone, PartialEq)]
pub enum MockExpression {
    Literal(Value),
    Call(Capability),
    /// Raw `faker.*` expression supplied by the user
    Generator(String),
    Custom(CustomProducer),
    Object(Vec<ObjectEntry>),
    Repeat { count: usize, item: Box<MockExpression> },
    PickOne(Vec<MockExpression>),
}

impl MockExpression {
    pub fn null() -> Self {
        MockExpression::Literal(Value::Null)
    }

    /// True if the tree contains no generator at all
    pub fn is_literal(&self) -> bool {
        match self {
            MockExpression::Literal(_) => true,
            MockExpression::Object(entries) => entries.iter().all(|entry| {
                matches!(entry.key, EntryKey::Fixed(_)) && entry.value.is_literal()
            }),
            MockExpression::Repeat { item, .. } => item.is_literal(),
            _ => false,
        }
    }

    /// True if the rendered source calls into faker
    pub fn uses_faker(&self) -> bool {
        match self {
            MockExpression::Literal(_) => false,
            MockExpression::Call(capability) => !matches!(capability, Capability::SeededId { .. }),
            MockExpression::Generator(_) | MockExpression::PickOne(_) => true,
            MockExpression::Custom(producer) => producer.source().contains("faker."),
            MockExpression::Object(entries) => entries.iter().any(|entry| {
                matches!(&entry.key, EntryKey::Generated(key) if key.uses_faker()) || entry.value.uses_faker()
            }),
            MockExpression::Repeat { item, .. } => item.uses_faker(),
        }
    }

    /// Render as faker JavaScript
    pub fn to_source(&self) -> String {
        match self {
            MockExpression::Literal(value) => value.to_string(),
            MockExpression::Call(capability) => capability.source(),
            MockExpression::Generator(source) => source.clone(),
            MockExpression::Custom(producer) => format!("({})()", producer.source()),
            MockExpression::Object(entries) => {
                let rendered: Vec<String> = entries
                    .iter()
                    .map(|entry| match &entry.key {
                        EntryKey::Fixed(key) => {
                            format!("'{}': {}", escape_key(key), entry.value.to_source())
                        }
                        EntryKey::Generated(key) => {
                            format!("[{}]: {}", key.to_source(), entry.value.to_source())
                        }
                    })
                    .collect();
                format!("{{{}}}", rendered.join(",\n"))
            }
            MockExpression::Repeat { count, item } => {
                format!("Array.from({{ length: {} }}, () => ({}))", count, item.to_source())
            }
            MockExpression::PickOne(choices) => {
                let rendered: Vec<String> = choices.iter().map(MockExpression::to_source).collect();
                format!("faker.helpers.arrayElement([{}])", rendered.join(","))
            }
        }
    }
}

impl fmt::Display for MockExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_source() {
        let expression = MockExpression::Object(vec![
            ObjectEntry::fixed("id", MockExpression::Call(Capability::Uuid)),
            ObjectEntry::fixed("it's", MockExpression::Literal(json!("x"))),
            ObjectEntry::generated(
                MockExpression::Call(Capability::Words),
                MockExpression::Call(Capability::Words),
            ),
        ]);

        assert_eq!(
            expression.to_source(),
            "{'id': faker.string.uuid(),\n'it\\'s': \"x\",\n[faker.lorem.words()]: faker.lorem.words()}"
        );
    }

    #[test]
    fn test_enum_renders_like_json_array() {
        let expression = MockExpression::PickOne(vec![
            MockExpression::Literal(json!("a")),
            MockExpression::Literal(json!(1)),
        ]);
        assert_eq!(expression.to_source(), r#"faker.helpers.arrayElement(["a",1])"#);
    }

    #[test]
    fn test_repeat_and_custom_source() {
        let expression = MockExpression::Repeat {
            count: 2,
            item: Box::new(MockExpression::Custom(CustomProducer::new("() => 42", || Ok(json!(42))))),
        };
        assert_eq!(expression.to_source(), "Array.from({ length: 2 }, () => ((() => 42)()))");
        assert!(!expression.is_literal());
    }

    #[test]
    fn test_is_literal() {
        let expression = MockExpression::Repeat {
            count: 3,
            item: Box::new(MockExpression::Object(vec![ObjectEntry::fixed("a", MockExpression::null())])),
        };
        assert!(expression.is_literal());
        assert!(!MockExpression::PickOne(vec![]).is_literal());
    }

    #[test]
    fn test_uses_faker() {
        let literal = MockExpression::Object(vec![ObjectEntry::fixed("site", MockExpression::Literal(json!("faker.com")))]);
        assert!(!literal.uses_faker());

        let id = MockExpression::Call(Capability::SeededId { min: 1, max: 10, seed: 123, key: "id".to_string() });
        assert!(!id.uses_faker());

        let nested = MockExpression::Repeat {
            count: 2,
            item: Box::new(MockExpression::Object(vec![ObjectEntry::generated(
                MockExpression::Call(Capability::Words),
                MockExpression::Literal(json!(1)),
            )])),
        };
        assert!(nested.uses_faker());
        assert!(!MockExpression::Custom(CustomProducer::new("() => 42", || Ok(json!(42)))).uses_faker());
    }
}
