//! Configuration loading, validation, and management for the Atelier
//! assistant core.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Every numeric policy knob the packing pipeline and the
//! loop depend on is a named field here — never a magic number at a call
//! site. Validates all settings at load.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use atelier_context::{AllocationPolicy, ScanOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AssistantConfig {
    /// Context packing policy
    #[serde(default)]
    pub context: ContextConfig,

    /// Directory scan bounds
    #[serde(default)]
    pub scan: ScanConfig,

    /// Loop and model settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Model backend connection
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Total token ceiling per packed context
    #[serde(default = "default_token_ceiling")]
    pub token_ceiling: usize,

    /// Line cap applied when truncating an oversized file
    #[serde(default = "default_truncate_max_lines")]
    pub truncate_max_lines: usize,

    /// Remaining-budget floor below which the Code tier path-lists
    #[serde(default = "default_code_tier_floor")]
    pub code_tier_floor: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Stop scanning after this many files
    #[serde(default = "default_scan_max_files")]
    pub max_files: usize,

    /// Skip files larger than this many bytes
    #[serde(default = "default_scan_max_file_bytes")]
    pub max_file_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Default model
    #[serde(default = "default_model")]
    pub model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default max tokens per model response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum tool rounds per invocation
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Chat-completions base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (overridable via ATELIER_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_token_ceiling() -> usize {
    4096
}
fn default_truncate_max_lines() -> usize {
    200
}
fn default_code_tier_floor() -> usize {
    200
}
fn default_scan_max_files() -> usize {
    2000
}
fn default_scan_max_file_bytes() -> u64 {
    262_144
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_rounds() -> u32 {
    8
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            token_ceiling: default_token_ceiling(),
            truncate_max_lines: default_truncate_max_lines(),
            code_tier_floor: default_code_tier_floor(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: default_scan_max_files(),
            max_file_bytes: default_scan_max_file_bytes(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            max_rounds: default_max_rounds(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

/// Redact the API key in Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("context", &self.context)
            .field("scan", &self.scan)
            .field("agent", &self.agent)
            .field("provider", &self.provider)
            .finish()
    }
}

impl AssistantConfig {
    /// Parse a TOML document. Missing sections and fields fall back to
    /// defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, apply environment overrides, validate. A
    /// missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
            toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("ATELIER_API_KEY") {
            if !key.is_empty() {
                self.provider.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("ATELIER_BASE_URL") {
            if !url.is_empty() {
                self.provider.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("ATELIER_MODEL") {
            if !model.is_empty() {
                self.agent.model = model;
            }
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.token_ceiling == 0 {
            return Err(ConfigError::Invalid("context.token_ceiling must be > 0".into()));
        }
        if self.context.truncate_max_lines == 0 {
            return Err(ConfigError::Invalid(
                "context.truncate_max_lines must be > 0".into(),
            ));
        }
        if self.scan.max_files == 0 {
            return Err(ConfigError::Invalid("scan.max_files must be > 0".into()));
        }
        if self.agent.max_rounds == 0 {
            return Err(ConfigError::Invalid("agent.max_rounds must be >= 1".into()));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::Invalid(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        Ok(())
    }

    /// The allocation policy the packing pipeline runs with.
    pub fn allocation_policy(&self) -> AllocationPolicy {
        AllocationPolicy {
            ceiling: self.context.token_ceiling,
            truncate_max_lines: self.context.truncate_max_lines,
            code_tier_floor: self.context.code_tier_floor,
        }
    }

    /// The scan bounds the walk runs with.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_files: self.scan.max_files,
            max_file_bytes: self.scan.max_file_bytes,
        }
    }
}
