//! Generator configuration
//!
//! Stored as `openapi-mockgen.config.json` (or `.yaml`) in the working
//! directory. Per-endpoint settings override the global ones.

use indexmap::IndexMap;
use openapi_parser::HttpMethod;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MockError, MockResult};
use crate::expression::CustomProducer;

pub const CONFIG_FILE_NAME: &str = "openapi-mockgen.config.json";
pub const DEFAULT_OUTPUT_DIR: &str = ".mocks";
pub const DEFAULT_ARRAY_LENGTH: usize = 5;

/// Override rule for one property key (or key regex)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum FakerRule {
    Literal(Value),
    /// `faker.*` source text
    GeneratorExpression(String),
    Custom(CustomProducer),
}

impl From<Value> for FakerRule {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) if text.starts_with("faker.") => FakerRule::GeneratorExpression(text),
            other => FakerRule::Literal(other),
        }
    }
}

impl Serialize for FakerRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FakerRule::Literal(value) => value.serialize(serializer),
            FakerRule::GeneratorExpression(text) => serializer.serialize_str(text),
            FakerRule::Custom(producer) => serializer.serialize_str(producer.source()),
        }
    }
}

/// Ordered property-key overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FakerMap(IndexMap<String, FakerRule>);

impl FakerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, rule: FakerRule) -> &mut Self {
        self.0.insert(key.into(), rule);
        self
    }

    /// Register a programmatic producer for `key`
    pub fn register(&mut self, key: impl Into<String>, producer: CustomProducer) -> &mut Self {
        self.insert(key, FakerRule::Custom(producer))
    }

    pub fn get(&self, key: &str) -> Option<&FakerRule> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FakerRule)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deep-merge `overrides` on top of `self`.
    ///
    /// Existing keys keep their position; new keys are appended. Object
    /// literals merge recursively, everything else is replaced.
    pub fn merged(&self, overrides: &FakerMap) -> FakerMap {
        let mut merged = self.clone();
        for (key, rule) in overrides.iter() {
            match (merged.0.get_mut(key), rule) {
                (Some(FakerRule::Literal(existing)), FakerRule::Literal(value)) => {
                    merge_values(existing, value)
                }
                _ => {
                    merged.0.insert(key.clone(), rule.clone());
                }
            }
        }
        merged
    }
}

fn merge_values(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Settings of a single path + method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_example: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<bool>,
    #[serde(default, skip_serializing_if = "FakerMap::is_empty")]
    pub faker_map: FakerMap,
}

/// Global configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Local path or URL of the OpenAPI document
    pub spec_path: String,
    pub output_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub array_length: usize,
    pub use_example: bool,
    /// Write generator source instead of pre-evaluated values
    pub dynamic: bool,
    pub faker_map: FakerMap,
    /// path -> method -> overrides
    pub endpoints: IndexMap<String, IndexMap<HttpMethod, EndpointConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec_path: String::new(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            base_url: None,
            array_length: DEFAULT_ARRAY_LENGTH,
            use_example: true,
            dynamic: false,
            faker_map: FakerMap::new(),
            endpoints: IndexMap::new(),
        }
    }
}

impl Config {
    pub fn endpoint(&self, path: &str, method: HttpMethod) -> Option<&EndpointConfig> {
        self.endpoints.get(path).and_then(|methods| methods.get(&method))
    }

    /// Overrides of one endpoint, created on first access
    pub fn endpoint_mut(&mut self, path: &str, method: HttpMethod) -> &mut EndpointConfig {
        self.endpoints
            .entry(path.to_string())
            .or_default()
            .entry(method)
            .or_default()
    }

    /// Effective settings for one endpoint
    pub fn context_for(&self, path: &str, method: HttpMethod) -> EndpointContext {
        let overrides = self.endpoint(path, method);

        EndpointContext {
            path: path.to_string(),
            method,
            array_length: overrides
                .and_then(|e| e.array_length)
                .unwrap_or(self.array_length),
            use_example: overrides
                .and_then(|e| e.use_example)
                .unwrap_or(self.use_example),
            dynamic: overrides.and_then(|e| e.dynamic).unwrap_or(self.dynamic),
            faker_map: match overrides {
                Some(endpoint) => self.faker_map.merged(&endpoint.faker_map),
                None => self.faker_map.clone(),
            },
        }
    }
}

/// Merged settings the compiler works with
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointContext {
    pub path: String,
    pub method: HttpMethod,
    pub array_length: usize,
    pub use_example: bool,
    pub dynamic: bool,
    pub faker_map: FakerMap,
}

impl EndpointContext {
    /// Context with default settings
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        let path = path.into();
        Config::default().context_for(&path, method)
    }

    /// `method-path` key used to collect diagnostics
    pub fn endpoint_key(&self) -> String {
        format!("{}-{}", self.method.as_lower(), self.path)
    }
}

/// Config file manager
pub struct ConfigManager {
    config_file: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Default config location inside `dir`
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    /// Load an existing config file
    pub async fn load(config_file: impl Into<PathBuf>) -> MockResult<Self> {
        let config_file = config_file.into();
        if !tokio::fs::try_exists(&config_file).await? {
            return Err(MockError::ConfigNotFound(config_file.display().to_string()));
        }

        let contents = tokio::fs::read_to_string(&config_file).await?;
        let config: Config = if is_yaml(&config_file) {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)?
        };
        debug!("Loaded config from {:?}", config_file);

        Ok(Self { config_file, config })
    }

    /// Wrap a new config without touching the file system
    pub fn create(config_file: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            config_file: config_file.into(),
            config,
        }
    }

    /// Save config to file
    pub async fn save(&self) -> MockResult<()> {
        let contents = if is_yaml(&self.config_file) {
            serde_yaml::to_string(&self.config)?
        } else {
            serde_json::to_string_pretty(&self.config)?
        };

        // Write atomically using temp file
        let temp_path = self.config_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.config_file).await?;

        debug!("Saved config to {:?}", self.config_file);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_file
    }

    pub fn get(&self) -> &Config {
        &self.config
    }

    pub fn get_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}
