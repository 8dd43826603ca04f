//! Static evaluation of mock expressions
//!
//! Materializes a [`MockExpression`] once into a JSON value. Anything the
//! evaluator cannot execute falls back to the dynamic expression.

use chrono::{Duration, SecondsFormat, Utc};
use fake::faker::address::en::{BuildingNumber, CityName, CountryName, StateName, StreetName, ZipCode};
use fake::faker::internet::en::{DomainSuffix, IPv4, IPv6, SafeEmail};
use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::distributions::{Alphanumeric, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::catalog::{Capability, DEFAULT_SEED};
use crate::error::{MockError, MockResult};
use crate::expression::{EntryKey, MockExpression};

const EXTERNAL_DEPENDENCY_HINT: &str = "An error occurred while generating the static mock data, please note that external dependencies are not supported except for faker.";

/// `Number.MAX_SAFE_INTEGER`
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Longest string materialized statically
const MAX_STATIC_LENGTH: u64 = 10_000;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces values for catalog capabilities
pub trait ValueGenerator {
    fn generate(&mut self, capability: &Capability) -> MockResult<Value>;

    /// Index in `0..len`, used to pick one alternative
    fn pick(&mut self, len: usize) -> usize;
}

/// Default generator backed by `fake` and a seeded `StdRng`
pub struct FakeValueGenerator {
    rng: StdRng,
}

impl Default for FakeValueGenerator {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl FakeValueGenerator {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn fake_string<F>(&mut self, faker: F) -> Value
    where
        F: Fake,
        String: fake::Dummy<F>,
    {
        Value::String(faker.fake_with_rng::<String, _>(&mut self.rng))
    }

    fn alphanumeric(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    fn past(&mut self) -> chrono::DateTime<Utc> {
        let seconds = self.rng.gen_range(1..=365 * 24 * 60 * 60);
        Utc::now() - Duration::seconds(seconds)
    }

    fn bounded_number(&mut self, min: f64, max: f64, multiple_of: f64) -> MockResult<Value> {
        let step = if multiple_of > 0.0 { multiple_of } else { 1.0 };
        let low = (min / step).ceil();
        let high = (max / step).floor();
        if low > high {
            return Err(MockError::EmptyRange { min, max, multiple_of });
        }

        let factor = self.rng.gen_range(low as i64..=high as i64);
        Ok(number_value(factor as f64 * step))
    }

    fn alpha(&mut self, min_length: Option<u64>, max_length: Option<u64>) -> MockResult<Value> {
        let min = min_length.unwrap_or(1);
        if min > MAX_STATIC_LENGTH {
            return Err(MockError::LengthTooLarge {
                length: min,
                limit: MAX_STATIC_LENGTH,
            });
        }
        let max = max_length
            .unwrap_or_else(|| min.saturating_add(10))
            .max(min)
            .min(MAX_STATIC_LENGTH);
        let len = self.rng.gen_range(min..=max) as usize;

        let letters = Uniform::from(0..ALPHABET.len());
        let text: String = (0..len)
            .map(|_| ALPHABET[self.rng.sample(&letters)] as char)
            .collect();
        Ok(Value::String(text))
    }

    fn from_regex(&mut self, pattern: &str) -> MockResult<Value> {
        let regex = rand_regex::Regex::compile(&ascii_classes(strip_anchors(pattern)), 10).map_err(|e| {
            MockError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        let value: String = self.rng.sample(&regex);
        Ok(Value::String(value))
    }
}

impl ValueGenerator for FakeValueGenerator {
    fn generate(&mut self, capability: &Capability) -> MockResult<Value> {
        let value = match capability {
            Capability::Date => Value::String(self.past().format("%Y-%m-%d").to_string()),
            Capability::DateTime => Value::String(self.past().to_rfc3339_opts(SecondsFormat::Millis, true)),
            Capability::Time => Value::String(Utc::now().format("%H:%M").to_string()),

            Capability::Email => self.fake_string(SafeEmail()),
            Capability::Hostname | Capability::Url => {
                let word: String = Word().fake_with_rng(&mut self.rng);
                let suffix: String = DomainSuffix().fake_with_rng(&mut self.rng);
                match capability {
                    Capability::Url => Value::String(format!("https://{}.{}/", word, suffix)),
                    _ => Value::String(format!("{}.{}", word, suffix)),
                }
            }
            Capability::Ipv4 => self.fake_string(IPv4()),
            Capability::Ipv6 => self.fake_string(IPv6()),
            Capability::Token => {
                let payload = self.alphanumeric(48);
                let signature = self.alphanumeric(43);
                Value::String(format!("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.{}", payload, signature))
            }

            Capability::City => self.fake_string(CityName()),
            Capability::Country => self.fake_string(CountryName()),
            Capability::Latitude => number_value(round_to(self.rng.gen_range(-90.0..=90.0), 4)),
            Capability::Longitude => number_value(round_to(self.rng.gen_range(-180.0..=180.0), 4)),
            Capability::State => self.fake_string(StateName()),
            Capability::Street => {
                let number: String = BuildingNumber().fake_with_rng(&mut self.rng);
                let street: String = StreetName().fake_with_rng(&mut self.rng);
                Value::String(format!("{} {}", number, street))
            }
            Capability::Zip => self.fake_string(ZipCode()),

            Capability::FullName => self.fake_string(Name()),
            Capability::Uuid => {
                let uuid = uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid();
                Value::String(uuid.to_string())
            }

            Capability::Integer => Value::from(self.rng.gen_range(0..=MAX_SAFE_INTEGER)),
            Capability::Number {
                min,
                max,
                multiple_of,
            } => self.bounded_number(*min, *max, *multiple_of)?,
            Capability::Float { fraction_digits } => {
                number_value(round_to(self.rng.gen::<f64>(), *fraction_digits))
            }
            Capability::SeededId { min, max, seed, key } => Value::from(seeded_id(*min, *max, *seed, key, 0)),

            Capability::Alpha {
                min_length,
                max_length,
            } => self.alpha(*min_length, *max_length)?,
            Capability::Words => {
                let words: Vec<String> = Words(3..4).fake_with_rng(&mut self.rng);
                Value::String(words.join(" "))
            }
            Capability::Paragraph => self.fake_string(Paragraph(3..6)),
            Capability::Sentence => self.fake_string(Sentence(3..10)),
            Capability::FromRegex { pattern } => self.from_regex(pattern)?,

            Capability::Boolean => Value::Bool(self.rng.gen()),
            Capability::Image => Value::String(format!(
                "https://loremflickr.com/640/480?lock={}",
                self.rng.gen_range(1..=1_000_000u32)
            )),
            Capability::Phone => self.fake_string(PhoneNumber()),
            Capability::Avatar => Value::String(format!(
                "https://avatars.githubusercontent.com/u/{}",
                self.rng.gen_range(1..=100_000_000u32)
            )),
        };

        Ok(value)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// JSON number, integral values without a fraction
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER as f64 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn round_to(value: f64, fraction_digits: u32) -> f64 {
    let scale = 10f64.powi(fraction_digits as i32);
    (value * scale).round() / scale
}

/// `\d`, `\w` and `\s` as ECMAScript reads them, ASCII only
fn ascii_classes(pattern: &str) -> String {
    let mut rewritten = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            rewritten.push(c);
            continue;
        }
        match chars.next() {
            Some('d') => rewritten.push_str("[0-9]"),
            Some('D') => rewritten.push_str("[^0-9]"),
            Some('w') => rewritten.push_str("[0-9A-Za-z_]"),
            Some('W') => rewritten.push_str("[^0-9A-Za-z_]"),
            Some('s') => rewritten.push_str(r"[\t\n\v\f\r ]"),
            Some('S') => rewritten.push_str(r"[^\t\n\v\f\r ]"),
            Some(other) => {
                rewritten.push('\\');
                rewritten.push(other);
            }
            None => rewritten.push('\\'),
        }
    }
    rewritten
}

/// Pseudo-unique id from the property key and its array position.
///
/// The draw is an FNV hash of `key` and `index` fed through the LCG step, so
/// the same key at the same position always yields the same id.
fn seeded_id(min: u64, max: u64, seed: u64, key: &str, index: u64) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash ^= index.wrapping_mul(0x9e3779b97f4a7c15);
    hash = hash.wrapping_mul(0x100000001b3);

    let draw = hash % 233_280;
    let state = draw.wrapping_add(seed).wrapping_mul(9301).wrapping_add(49297) % 233_280;
    let random = state as f64 / 233_280.0;
    min.saturating_add((random * max as f64).floor() as u64)
}

fn strip_anchors(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
    match pattern.strip_suffix('$') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => pattern,
    }
}

/// Outcome of a static evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Materialized value
    Static(Value),
    /// The expression could not be executed and stays dynamic
    Dynamic(MockExpression),
}

impl Evaluation {
    pub fn is_static(&self) -> bool {
        matches!(self, Evaluation::Static(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Evaluation::Static(value) => Some(value),
            Evaluation::Dynamic(_) => None,
        }
    }

    /// Source text to embed in a mock module
    pub fn to_source(&self) -> String {
        match self {
            Evaluation::Static(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Evaluation::Dynamic(expression) => expression.to_source(),
        }
    }
}

/// Executes mock expressions with a [`ValueGenerator`]
pub struct MockEvaluator<G = FakeValueGenerator> {
    generator: G,
    /// Indices of the enclosing `Repeat` items
    item_path: Vec<usize>,
}

impl Default for MockEvaluator<FakeValueGenerator> {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEvaluator<FakeValueGenerator> {
    pub fn new() -> Self {
        Self::with_generator(FakeValueGenerator::default())
    }
}

impl<G: ValueGenerator> MockEvaluator<G> {
    pub fn with_generator(generator: G) -> Self {
        Self {
            generator,
            item_path: Vec::new(),
        }
    }

    /// Evaluate once; on failure log and keep the expression
    pub fn evaluate(&mut self, expression: &MockExpression) -> Evaluation {
        match self.materialize(expression) {
            Ok(value) => Evaluation::Static(value),
            Err(e) => {
                error!("{}", e);
                warn!("{}", EXTERNAL_DEPENDENCY_HINT);
                warn!("Falling back to the dynamic mock data generation instead.");
                Evaluation::Dynamic(expression.clone())
            }
        }
    }

    /// Evaluate, propagating the first failure
    pub fn materialize(&mut self, expression: &MockExpression) -> MockResult<Value> {
        match expression {
            MockExpression::Literal(value) => Ok(value.clone()),
            MockExpression::Call(Capability::SeededId { min, max, seed, key }) => {
                Ok(Value::from(seeded_id(*min, *max, *seed, key, self.item_index())))
            }
            MockExpression::Call(capability) => self.generator.generate(capability),
            MockExpression::Generator(source) => {
                let capability = Capability::from_source(source)
                    .ok_or_else(|| MockError::UnsupportedExpression(source.clone()))?;
                self.generator.generate(&capability)
            }
            MockExpression::Custom(producer) => producer.produce().map_err(|e| MockError::ProducerFailed {
                producer: producer.source().to_string(),
                reason: e.to_string(),
            }),
            MockExpression::Object(entries) => {
                let mut object = Map::new();
                for entry in entries {
                    let key = match &entry.key {
                        EntryKey::Fixed(key) => key.clone(),
                        EntryKey::Generated(key) => match self.materialize(key)? {
                            Value::String(key) => key,
                            other => other.to_string(),
                        },
                    };
                    let value = self.materialize(&entry.value)?;
                    object.insert(key, value);
                }
                Ok(Value::Object(object))
            }
            MockExpression::Repeat { count, item } => {
                let mut items = Vec::with_capacity(*count);
                for index in 0..*count {
                    self.item_path.push(index);
                    let value = self.materialize(item);
                    self.item_path.pop();
                    items.push(value?);
                }
                Ok(Value::Array(items))
            }
            MockExpression::PickOne(choices) => {
                if choices.is_empty() {
                    return Err(MockError::EmptyChoice);
                }
                let index = self.generator.pick(choices.len());
                self.materialize(&choices[index])
            }
        }
    }
}

impl<G> MockEvaluator<G> {
    /// Position of the current item across nested arrays, 0 outside arrays
    fn item_index(&self) -> u64 {
        self.item_path
            .iter()
            .fold(0u64, |acc, index| acc.wrapping_mul(31).wrapping_add(*index as u64 + 1))
    }
}
