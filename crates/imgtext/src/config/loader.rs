use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

/// Config file consulted when none is given: `~/.imgtext/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".imgtext").join("config.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();

    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.media_root.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "media_root must not be empty".to_string(),
        });
    }

    if config.ocr.languages.is_empty() {
        return Err(ConfigError::Validation {
            message: "ocr.languages must name at least one language".to_string(),
        });
    }

    if config.preprocess.max_dimension == 0 {
        return Err(ConfigError::Validation {
            message: "preprocess.max_dimension must be positive".to_string(),
        });
    }

    let enhancer = &config.enhancer;
    if !enhancer.endpoint.starts_with("http://") && !enhancer.endpoint.starts_with("https://") {
        return Err(ConfigError::Validation {
            message: format!("enhancer.endpoint is not an http(s) URL: {}", enhancer.endpoint),
        });
    }

    if enhancer.connect_timeout_secs == 0 || enhancer.request_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "enhancer timeouts must be at least one second".to_string(),
        });
    }

    if enhancer.connect_timeout_secs > enhancer.request_timeout_secs {
        return Err(ConfigError::Validation {
            message: format!(
                "enhancer.connect_timeout_secs ({}) exceeds request_timeout_secs ({})",
                enhancer.connect_timeout_secs, enhancer.request_timeout_secs
            ),
        });
    }

    Ok(())
}
