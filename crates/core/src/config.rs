use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://aihubmix.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Transport request timeout in seconds.
    pub timeout_secs: u64,
}

/// Sampling parameters sent with every completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// The full configuration record, laid out exactly like the JSON file.
///
/// Unknown keys in the file are ignored. Missing keys are filled from
/// [`default_record`] through [`deep_merge`] before deserialization, so every
/// field is always present here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "openai_config")]
    pub openai: OpenAiConfig,
    #[serde(rename = "generation_params")]
    pub generation: GenerationParams,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig {
                api_key: String::new(),
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            generation: GenerationParams {
                temperature: DEFAULT_TEMPERATURE,
                max_tokens: None,
            },
        }
    }
}

impl Configuration {
    /// Check the invariants that must hold before any remote call is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        self.validate_params()
    }

    /// Every check of [`Configuration::validate`] except the credential one.
    pub fn validate_params(&self) -> Result<(), ConfigError> {
        if self.openai.base_url.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.openai.model.trim().is_empty() {
            return Err(ConfigError::InvalidParameter(
                "openai_config.model must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.generation.temperature) {
            return Err(ConfigError::InvalidParameter(format!(
                "generation_params.temperature must be between 0 and 1, got {}",
                self.generation.temperature
            )));
        }
        if self.generation.max_tokens == Some(0) {
            return Err(ConfigError::InvalidParameter(
                "generation_params.max_tokens must be positive".to_string(),
            ));
        }
        if self.openai.timeout_secs == 0 {
            return Err(ConfigError::InvalidParameter(
                "openai_config.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// The built-in default record in its JSON form.
pub fn default_record() -> Value {
    serde_json::json!({
        "openai_config": {
            "api_key": "",
            "base_url": DEFAULT_BASE_URL,
            "model": DEFAULT_MODEL,
            "timeout_secs": DEFAULT_TIMEOUT_SECS,
        },
        "generation_params": {
            "temperature": DEFAULT_TEMPERATURE,
        },
    })
}

/// Recursively merge `user` over `base`.
///
/// Where both sides hold an object the two are merged key by key; anywhere
/// else the user value replaces the base value outright, so arrays are never
/// concatenated. Keys present only in `base` are kept unchanged.
pub fn deep_merge(base: &Value, user: &Value) -> Value {
    match (base, user) {
        (Value::Object(base_map), Value::Object(user_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, user_value) in user_map {
                let value = match base_map.get(key) {
                    Some(base_value) => deep_merge(base_value, user_value),
                    None => user_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        (_, user) => user.clone(),
    }
}

/// Parse the raw text of a configuration file and merge it over the defaults.
///
/// Validation is left to the caller: a record with an empty credential parses
/// fine here and is rejected by [`Configuration::validate`].
pub fn parse_config(text: &str) -> Result<Configuration, ConfigError> {
    let user: Value =
        serde_json::from_str(text).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;

    if !user.is_object() {
        return Err(ConfigError::InvalidJson(
            "top-level value must be an object".to_string(),
        ));
    }

    let merged = deep_merge(&default_record(), &user);
    serde_json::from_value(merged).map_err(|e| ConfigError::InvalidJson(e.to_string()))
}

/// Render a secret for display.
///
/// Keys shorter than 16 characters only show their last four.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }

    let suffix: String = chars[chars.len() - 4..].iter().collect();
    if chars.len() < 16 {
        return format!("...{suffix}");
    }

    let prefix: String = chars[..4].iter().collect();
    format!("{prefix}...{suffix}")
}
