//! Console configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [service]
//! base_url = "https://crm.example.com/api"
//!
//! [forms]
//! primary_key = "_id"
//!
//! [errors]
//! 1200 = "Email already in use"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section is optional. A missing file yields the defaults.

use crm_core::{ConsoleError, ConsoleResult, DEFAULT_PRIMARY_KEY, Validatable};
use crm_form::ErrorMessages;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "crm-console.toml";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub service: ServiceConfig,
    pub forms: FormsConfig,

    /// Error code to friendly message
    pub errors: BTreeMap<String, String>,

    pub logging: LoggingConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            forms: FormsConfig::default(),
            errors: default_errors(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Where the CRM back end lives
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    /// Identifying key for schemas that do not name one
    pub primary_key: String,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_errors() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("1200".to_string(), "Email already in use".to_string()),
        ("1204".to_string(), "Password not strong enough".to_string()),
    ])
}

impl ConsoleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; a missing file gives the defaults
    pub fn load(path: impl AsRef<Path>) -> ConsoleResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConsoleError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and check a TOML document
    pub fn from_toml(content: &str) -> ConsoleResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The `[errors]` table keyed by numeric code
    pub fn error_messages(&self) -> ConsoleResult<ErrorMessages> {
        self.errors
            .iter()
            .map(|(code, message)| {
                code.trim()
                    .parse::<i64>()
                    .map(|code| (code, message.clone()))
                    .map_err(|_| {
                        ConsoleError::InvalidConfig(format!("error code '{}' is not a number", code))
                    })
            })
            .collect()
    }
}

impl Validatable for ConsoleConfig {
    fn validate(&self) -> ConsoleResult<()> {
        if self.forms.primary_key.trim().is_empty() {
            return Err(ConsoleError::InvalidConfig(
                "forms.primary_key must not be empty".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConsoleError::InvalidConfig(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }
        self.error_messages().map(|_| ())
    }
}

// ============================================================================
// Tests
// ============================================================================
