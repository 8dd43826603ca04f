//! Value generator catalog
//!
//! Every capability the compiler can emit, the faker source text it renders
//! to, the JSON-Schema format table and the key heuristic tables.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const DEFAULT_MIN_NUMBER: f64 = 1.0;
pub const DEFAULT_MAX_NUMBER: f64 = 1000.0;
pub const DEFAULT_MULTIPLE_OF: f64 = 1.0;
pub const DEFAULT_SEED: u64 = 123;

/// Pattern used for `format: regex` strings that carry no `pattern`
pub const DEFAULT_REGEX_PATTERN: &str = "[a-zA-Z0-9]{8}";

/// A named value-generation operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "capability", rename_all = "camelCase")]
pub enum Capability {
    // Date and time
    Date,
    DateTime,
    Time,

    // Internet
    Email,
    Hostname,
    Ipv4,
    Ipv6,
    Url,
    Token,

    // Location
    City,
    Country,
    Latitude,
    Longitude,
    State,
    Street,
    Zip,

    // Names and IDs
    FullName,
    Uuid,

    // Numbers
    Integer,
    Number { min: f64, max: f64, multiple_of: f64 },
    Float { fraction_digits: u32 },
    /// Pseudo-unique id derived from the property key, not from the rng
    SeededId { min: u64, max: u64, seed: u64, key: String },

    // Strings
    Alpha { min_length: Option<u64>, max_length: Option<u64> },
    Words,
    Paragraph,
    Sentence,
    FromRegex { pattern: String },

    // Utilities
    Boolean,
    Image,
    Phone,
    Avatar,
}

impl Capability {
    /// Integer in `[min, max]` with the default step
    pub fn number(min: f64, max: f64) -> Self {
        Capability::Number {
            min,
            max,
            multiple_of: DEFAULT_MULTIPLE_OF,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Date => "date",
            Capability::DateTime => "dateTime",
            Capability::Time => "time",
            Capability::Email => "email",
            Capability::Hostname => "hostname",
            Capability::Ipv4 => "ipv4",
            Capability::Ipv6 => "ipv6",
            Capability::Url => "url",
            Capability::Token => "token",
            Capability::City => "city",
            Capability::Country => "country",
            Capability::Latitude => "latitude",
            Capability::Longitude => "longitude",
            Capability::State => "state",
            Capability::Street => "street",
            Capability::Zip => "zip",
            Capability::FullName => "name",
            Capability::Uuid => "uuid",
            Capability::Integer => "integer",
            Capability::Number { .. } => "number",
            Capability::Float { .. } => "float",
            Capability::SeededId { .. } => "seededId",
            Capability::Alpha { .. } => "alpha",
            Capability::Words => "string",
            Capability::Paragraph => "paragraph",
            Capability::Sentence => "sentence",
            Capability::FromRegex { .. } => "fromRegExp",
            Capability::Boolean => "boolean",
            Capability::Image => "image",
            Capability::Phone => "phone",
            Capability::Avatar => "avatar",
        }
    }

    /// Faker source text for this capability
    pub fn source(&self) -> String {
        match self {
            Capability::Number {
                min,
                max,
                multiple_of,
            } => format!(
                "faker.number.int({{ min: {}, max: {}, multipleOf: {} }})",
                js_number(*min),
                js_number(*max),
                js_number(*multiple_of)
            ),
            Capability::Float { fraction_digits } => {
                format!("faker.number.float({{ fractionDigits: {} }})", fraction_digits)
            }
            Capability::SeededId { min, max, seed, .. } => format!(
                "(() => {{\n  const seed = ((Math.floor(Math.random() * 233280) + {seed}) * 9301 + 49297) % 233280;\n  const random = seed / 233280;\n  return {min} + Math.floor(random * {max});\n}})()"
            ),
            Capability::Alpha {
                min_length: Some(min),
                max_length: Some(max),
            } => format!("faker.string.alpha({{ length: {{ min: {}, max: {} }} }})", min, max),
            Capability::Alpha {
                min_length: Some(min),
                max_length: None,
            } => format!("faker.string.alpha({{ length: {{ min: {} }} }})", min),
            Capability::Alpha {
                min_length: None,
                max_length: Some(max),
            } => format!("faker.string.alpha({{ length: {{ max: {} }} }})", max),
            Capability::Alpha {
                min_length: None,
                max_length: None,
            } => "faker.string.alpha()".to_string(),
            Capability::FromRegex { pattern } => {
                format!("faker.helpers.fromRegExp(/{}/)", escape_slashes(pattern))
            }
            other => other.fixed_source().unwrap_or_default().to_string(),
        }
    }

    /// Source text of capabilities without arguments
    fn fixed_source(&self) -> Option<&'static str> {
        let source = match self {
            Capability::Date => "faker.date.past().toISOString().substring(0, 10)",
            Capability::DateTime => "faker.date.past()",
            Capability::Time => "new Date().toISOString().substring(11, 16)",
            Capability::Email => "faker.internet.email()",
            Capability::Hostname => "faker.internet.domainName()",
            Capability::Ipv4 => "faker.internet.ip()",
            Capability::Ipv6 => "faker.internet.ipv6()",
            Capability::Url => "faker.internet.url()",
            Capability::Token => "faker.internet.jwt()",
            Capability::City => "faker.location.city()",
            Capability::Country => "faker.location.country()",
            Capability::Latitude => "faker.location.latitude()",
            Capability::Longitude => "faker.location.longitude()",
            Capability::State => "faker.location.state()",
            Capability::Street => "faker.location.streetAddress()",
            Capability::Zip => "faker.location.zipCode()",
            Capability::FullName => "faker.person.fullName()",
            Capability::Uuid => "faker.string.uuid()",
            Capability::Integer => "faker.number.int()",
            Capability::Words => "faker.lorem.words()",
            Capability::Paragraph => "faker.lorem.paragraph()",
            Capability::Sentence => "faker.lorem.sentence()",
            Capability::Boolean => "faker.datatype.boolean()",
            Capability::Image => "faker.image.urlLoremFlickr()",
            Capability::Phone => "faker.phone.number()",
            Capability::Avatar => "faker.image.avatar()",
            _ => return None,
        };
        Some(source)
    }

    /// Parse faker source text back into a capability.
    ///
    /// Understands everything [`Capability::source`] renders except the seeded id.
    pub fn from_source(source: &str) -> Option<Capability> {
        let source = source.trim();

        if let Some(capability) = FIXED.iter().find(|c| c.fixed_source() == Some(source)) {
            return Some(capability.clone());
        }

        if let Some(caps) = NUMBER_SOURCE.captures(source) {
            let min = caps.name("min").and_then(|m| m.as_str().parse().ok());
            let max = caps.name("max").and_then(|m| m.as_str().parse().ok());
            let multiple_of = caps
                .name("step")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(DEFAULT_MULTIPLE_OF);
            return Some(Capability::Number {
                min: min.unwrap_or(DEFAULT_MIN_NUMBER),
                max: max.unwrap_or(DEFAULT_MAX_NUMBER),
                multiple_of,
            });
        }

        if let Some(caps) = FLOAT_SOURCE.captures(source) {
            let fraction_digits = caps.name("digits").and_then(|m| m.as_str().parse().ok())?;
            return Some(Capability::Float { fraction_digits });
        }

        if let Some(caps) = ALPHA_SOURCE.captures(source) {
            return Some(Capability::Alpha {
                min_length: caps.name("min").and_then(|m| m.as_str().parse().ok()),
                max_length: caps.name("max").and_then(|m| m.as_str().parse().ok()),
            });
        }

        if let Some(caps) = REGEX_SOURCE.captures(source) {
            return Some(Capability::FromRegex {
                pattern: caps["pattern"].replace("\\/", "/"),
            });
        }

        None
    }
}

/// Render a number the way JavaScript prints it (no trailing `.0`)
fn js_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

const FIXED: &[Capability] = &[
    Capability::Date,
    Capability::DateTime,
    Capability::Time,
    Capability::Email,
    Capability::Hostname,
    Capability::Ipv4,
    Capability::Ipv6,
    Capability::Url,
    Capability::Token,
    Capability::City,
    Capability::Country,
    Capability::Latitude,
    Capability::Longitude,
    Capability::State,
    Capability::Street,
    Capability::Zip,
    Capability::FullName,
    Capability::Uuid,
    Capability::Integer,
    Capability::Words,
    Capability::Paragraph,
    Capability::Sentence,
    Capability::Boolean,
    Capability::Image,
    Capability::Phone,
    Capability::Avatar,
];

static NUMBER_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^faker\.number\.int\(\{\s*min:\s*(?P<min>-?[\d.e+]+),\s*max:\s*(?P<max>-?[\d.e+]+)(?:,\s*multipleOf:\s*(?P<step>[\d.e+]+))?\s*\}\)$",
    )
    .expect("number source pattern is valid")
});

static FLOAT_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^faker\.number\.float\(\{\s*fractionDigits:\s*(?P<digits>\d+)\s*\}\)$")
        .expect("float source pattern is valid")
});

static ALPHA_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^faker\.string\.alpha\(\{\s*length:\s*\{\s*(?:min:\s*(?P<min>\d+))?,?\s*(?:max:\s*(?P<max>\d+))?\s*\}\s*\}\)$",
    )
    .expect("alpha source pattern is valid")
});

static REGEX_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^faker\.helpers\.fromRegExp\(/(?P<pattern>.*)/\)$").expect("fromRegExp source pattern is valid")
});

/// Capability for a JSON-Schema string `format`.
///
/// See <https://json-schema.org/understanding-json-schema/reference/type#built-in-formats>
pub fn format_capability(format: &str, pattern: Option<&str>) -> Option<Capability> {
    let capability = match format {
        "date" => Capability::Date,
        "time" => Capability::Time,
        "date-time" => Capability::DateTime,
        "email" | "idn-email" => Capability::Email,
        "hostname" | "idn-hostname" => Capability::Hostname,
        "ipv4" => Capability::Ipv4,
        "ipv6" => Capability::Ipv6,
        "uuid" => Capability::Uuid,
        "uri" | "iri" | "uri-reference" | "iri-reference" | "uri-template" => Capability::Url,
        "regex" => Capability::FromRegex {
            pattern: pattern.unwrap_or(DEFAULT_REGEX_PATTERN).to_string(),
        },
        _ => return None,
    };
    Some(capability)
}

type HeuristicTable = Vec<(Regex, Capability)>;

fn table(rules: Vec<(&str, Capability)>) -> HeuristicTable {
    rules
        .into_iter()
        .map(|(pattern, capability)| {
            (Regex::new(pattern).expect("heuristic key pattern is valid"), capability)
        })
        .collect()
}

/// Ordered string heuristics; first match wins
static STRING_HEURISTICS: LazyLock<HeuristicTable> = LazyLock::new(|| {
    table(vec![
        // General identifiers
        (r"(?:^|_)id$", Capability::Uuid),
        (r"(?:^|_)uuid(?:_|$)", Capability::Uuid),
        (r"(?:^|_)token(?:_|$)", Capability::Token),
        // Timestamps
        (r".+_at$", Capability::DateTime),
        (r"(?:^|_)timestamp(?:_|$)", Capability::DateTime),
        // Locations
        (r"(?:^|_)street(?:_|$)", Capability::Street),
        (r"(?:^|_)city(?:_|$)", Capability::City),
        (r"(?:^|_)state(?:_|$)", Capability::State),
        (r"(?:^|_)zip(?:_|$)", Capability::Zip),
        (r"(?:^|_)country(?:_|$)", Capability::Country),
        (r"^postal_code$", Capability::Zip),
        (r"(?:^|_)latitude(?:_|$)", Capability::Latitude),
        (r"(?:^|_)longitude(?:_|$)", Capability::Longitude),
        // Contact
        (r"(?:^|_)phone(?:_|$)", Capability::Phone),
        (r"(?:^|_)mobile(?:_|$)", Capability::Phone),
        // Personal info
        (r"(?:^|_)email(?:_|$)", Capability::Email),
        (r".*name$", Capability::FullName),
        // Urls and media
        (r"(?:^|_)ur[li]$", Capability::Url),
        (
            r"\b(profile|user)_(image|img|photo|picture)\b|(?:^|_)avatar(?:_|$)",
            Capability::Avatar,
        ),
        (r"(?:^|_)(photo|image|picture|img)(?:_|$)", Capability::Image),
        // Content and text
        (r"(?:^|_)title(?:_|$)", Capability::Sentence),
        (r"(?:^|_)description(?:_|$)", Capability::Paragraph),
        (r"(?:^|_)content(?:_|$)", Capability::Paragraph),
        (r"(?:^|_)text(?:_|$)", Capability::Paragraph),
        (r"(?:^|_)paragraph(?:_|$)", Capability::Paragraph),
        (r"(?:^|_)comments?(?:_|$)", Capability::Sentence),
        (r"(?:^|_)message(?:_|$)", Capability::Sentence),
        (r"(?:^|_)summary(?:_|$)", Capability::Paragraph),
    ])
});

/// Ordered number heuristics; first match wins
static NUMBER_HEURISTICS: LazyLock<HeuristicTable> = LazyLock::new(|| {
    let seeded_id = Capability::SeededId {
        min: DEFAULT_MIN_NUMBER as u64,
        max: DEFAULT_MAX_NUMBER as u64,
        seed: DEFAULT_SEED,
        key: String::new(),
    };
    let moderate_number = Capability::number(1.0, 1000.0);
    let moderate_price = Capability::number(1.0, 100_000.0);
    let moderate_rating = Capability::number(1.0, 5.0);
    let current_year = chrono::Datelike::year(&chrono::Utc::now()) as f64;

    table(vec![
        // Identifiers
        (r"^id$", seeded_id.clone()),
        (r".+_id$", seeded_id),
        // Age and time
        (r"(?:^|_)age(?:_|$)", Capability::number(20.0, 80.0)),
        (r"(?:^|_)year(?:_|$)", Capability::number(1900.0, current_year)),
        (r"(?:^|_)month(?:_|$)", Capability::number(1.0, 12.0)),
        (r"(?:^|_)day(?:_|$)", Capability::number(1.0, 31.0)),
        // Quantities
        (r"(?:^|_)counts?(?:_|$)", moderate_number.clone()),
        (r"(?:^|_)quantity(?:_|$)", moderate_number.clone()),
        (r"(?:^|_)amount(?:_|$)", moderate_number.clone()),
        (r"(?:^|_)total(?:_|$)", moderate_number.clone()),
        // Financial
        (r"(?:^|_)price(?:_|$)", moderate_price.clone()),
        (r"(?:^|_)discounts?(?:_|$)", Capability::Float { fraction_digits: 1 }),
        (r"(?:^|_)tax(?:_|$)", moderate_price.clone()),
        (r"(?:^|_)fee(?:_|$)", moderate_price),
        // Dimensions
        (r"(?:^|_)size(?:_|$)", moderate_number.clone()),
        (r"(?:^|_)length(?:_|$)", moderate_number.clone()),
        (r"(?:^|_)width(?:_|$)", moderate_number.clone()),
        (r"(?:^|_)height(?:_|$)", moderate_number.clone()),
        (r"(?:^|_)weight(?:_|$)", moderate_number),
        // Ratings
        (r"(?:^|_)ratings?(?:_|$)", moderate_rating.clone()),
        (r"(?:^|_)stars(?:_|$)", moderate_rating),
        (r"(?:^|_)scores?(?:_|$)", Capability::number(1.0, 100.0)),
    ])
});

fn lookup(table: &HeuristicTable, key: &str) -> Option<Capability> {
    table
        .iter()
        .find(|(pattern, _)| pattern.is_match(key))
        .map(|(_, capability)| capability.clone())
}

/// First string heuristic matching `key`
pub fn string_heuristic(key: &str) -> Option<Capability> {
    lookup(&STRING_HEURISTICS, key)
}

/// First number heuristic matching `key`
pub fn number_heuristic(key: &str) -> Option<Capability> {
    lookup(&NUMBER_HEURISTICS, key).map(|capability| match capability {
        Capability::SeededId { min, max, seed, .. } => Capability::SeededId {
            min,
            max,
            seed,
            key: key.to_string(),
        },
        other => other,
    })
}

/// Escape `/` for a JS regex literal, leaving already escaped ones alone
fn escape_slashes(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                escaped.push(c);
                if let Some(next) = chars.next() {
                    escaped.push(next);
                }
            }
            '/' => escaped.push_str("\\/"),
            _ => escaped.push(c),
        }
    }
    escaped
}
