//! Injector configuration.
//!
//! Settings come from code, from environment variables, or (with the
//! `config` feature) from JSON. Environment keys are `<PREFIX>_<KEY>` with
//! the default prefix `STRATUM_DI`:
//!
//! | variable                          | field                 |
//! |-----------------------------------|-----------------------|
//! | `STRATUM_DI_NAME`                 | `name`                |
//! | `STRATUM_DI_MAX_DEPTH`            | `max_depth`           |
//! | `STRATUM_DI_EVICT_ON_REREGISTER`  | `evict_on_reregister` |

use std::collections::HashMap;
use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix used by [`InjectorConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "STRATUM_DI";

/// Resolution chains deeper than this fail with `DepthExceeded`.
///
/// Resolution recurses once per level, so the limit is sized to fit a
/// default 2 MiB thread stack in debug builds.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[cfg(feature = "config")]
    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of raw configuration strings.
pub trait ConfigSource {
    /// Raw value for `key` (lowercase, without prefix).
    fn get(&self, key: &str) -> Option<String>;
}

/// Environment variable configuration source.
#[derive(Debug, Clone)]
pub struct EnvironmentConfigSource {
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl Default for EnvironmentConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.env_key(key)).ok()
    }
}

/// In-memory configuration source, handy in tests.
#[derive(Debug, Clone, Default)]
pub struct MapConfigSource {
    values: HashMap<String, String>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into().to_lowercase(), value.into());
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(&key.to_lowercase()).cloned()
    }
}

/// Per-injector settings.
///
/// Child injectors inherit their parent's settings, except the name.
///
/// # Examples
///
/// ```
/// use stratum_di::{InjectorConfig, MapConfigSource};
///
/// let config = InjectorConfig::default()
///     .with_name("app")
///     .with_max_depth(64);
/// assert_eq!(config.name.as_deref(), Some("app"));
/// assert!(config.evict_on_reregister);
///
/// let source = MapConfigSource::new().set("max_depth", "8");
/// let loaded = InjectorConfig::from_source(&source).unwrap();
/// assert_eq!(loaded.max_depth, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct InjectorConfig {
    /// Diagnostic name; the root defaults to `"root"`.
    pub name: Option<String>,
    /// Longest dependency chain a single resolution may walk. Raising it
    /// past [`DEFAULT_MAX_DEPTH`] needs a larger stack on resolving threads.
    pub max_depth: usize,
    /// Drop a cached instance when its token is registered again.
    pub evict_on_reregister: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            name: None,
            max_depth: DEFAULT_MAX_DEPTH,
            evict_on_reregister: true,
        }
    }
}

impl InjectorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_evict_on_reregister(mut self, evict: bool) -> Self {
        self.evict_on_reregister = evict;
        self
    }

    /// Loads settings from `STRATUM_DI_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_source(&EnvironmentConfigSource::with_prefix(prefix))
    }

    /// Loads settings from `source`, keeping defaults for absent keys.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(name) = source.get("name") {
            if !name.trim().is_empty() {
                config.name = Some(name);
            }
        }
        if let Some(raw) = source.get("max_depth") {
            config.max_depth = parse_depth(&raw)?;
        }
        if let Some(raw) = source.get("evict_on_reregister") {
            config.evict_on_reregister = parse_bool("evict_on_reregister", &raw)?;
        }
        Ok(config)
    }

    /// Parses a JSON object; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Settings a child injector starts from.
    pub(crate) fn for_child(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }
}

fn parse_depth(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(ConfigError::InvalidValue {
            key: "max_depth".to_string(),
            value: raw.to_string(),
            expected: "a positive integer",
        }),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            expected: "a boolean",
        }),
    }
}
