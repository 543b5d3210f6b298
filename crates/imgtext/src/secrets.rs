//! API key resolution for the remote enhancer.
//!
//! A key can come from three places, checked in this order:
//!
//! 1. **Inline value** in the config (`api_key`), for quick local runs
//! 2. **Key file** (`api_key_file`), for mounted container secrets
//! 3. **Environment variable** (`api_key_env`, default `GEMINI_API_KEY`)
//!
//! Empty strings count as "not configured" so a blank config field falls
//! through to the next source.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Environment variable consulted when the config names none.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No API key configured (set api_key, api_key_file, or api_key_env)")]
    NoSourceProvided,

    #[error("Failed to read API key from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("API key from {origin} is empty")]
    Empty { origin: String },
}

/// Where to look for the remote service API key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeySource {
    #[serde(default, rename = "api_key", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, rename = "api_key_file", skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, rename = "api_key_env", skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl ApiKeySource {
    pub fn from_env_var(name: &str) -> Self {
        Self {
            env: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Resolves the key. Without any configured source the default
    /// environment variable is tried before giving up.
    pub fn resolve(&self) -> Result<SecretString, SecretError> {
        if let Some(value) = non_empty(&self.value) {
            return Ok(SecretString::from(value.trim().to_string()));
        }

        if let Some(path) = non_empty(&self.file) {
            let expanded = expand_home(path);
            let content =
                std::fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
                    path: expanded.clone(),
                    source: e,
                })?;
            let key = content.trim();
            if key.is_empty() {
                return Err(SecretError::Empty {
                    origin: format!("file '{}'", expanded),
                });
            }
            return Ok(SecretString::from(key.to_string()));
        }

        let var_name = non_empty(&self.env).unwrap_or(DEFAULT_API_KEY_ENV);
        match std::env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim().to_string())),
            Ok(_) => Err(SecretError::Empty {
                origin: format!("environment variable '{}'", var_name),
            }),
            Err(std::env::VarError::NotPresent) if non_empty(&self.env).is_none() => {
                Err(SecretError::NoSourceProvided)
            }
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: var_name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: var_name.to_string(),
            }),
        }
    }
}

/// Expands a leading `~` to the user's home directory.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{}", home.display(), &path[1..]);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_inline_value_wins() {
        std::env::set_var("IMGTEXT_TEST_KEY_1", "from-env");
        let source = ApiKeySource {
            value: Some("inline".to_string()),
            file: None,
            env: Some("IMGTEXT_TEST_KEY_1".to_string()),
        };
        assert_eq!(source.resolve().unwrap().expose_secret(), "inline");
        std::env::remove_var("IMGTEXT_TEST_KEY_1");
    }

    #[test]
    #[serial]
    fn test_file_before_env() {
        let mut key_file = NamedTempFile::new().unwrap();
        writeln!(key_file, "  from-file  ").unwrap();
        std::env::set_var("IMGTEXT_TEST_KEY_2", "from-env");

        let source = ApiKeySource {
            value: Some(String::new()),
            file: Some(key_file.path().to_string_lossy().into_owned()),
            env: Some("IMGTEXT_TEST_KEY_2".to_string()),
        };
        assert_eq!(source.resolve().unwrap().expose_secret(), "from-file");
        std::env::remove_var("IMGTEXT_TEST_KEY_2");
    }

    #[test]
    #[serial]
    fn test_named_env_var() {
        std::env::set_var("IMGTEXT_TEST_KEY_3", "from-env\n");
        let source = ApiKeySource::from_env_var("IMGTEXT_TEST_KEY_3");
        assert_eq!(source.resolve().unwrap().expose_secret(), "from-env");
        std::env::remove_var("IMGTEXT_TEST_KEY_3");
    }

    #[test]
    #[serial]
    fn test_default_env_var_fallback() {
        std::env::set_var(DEFAULT_API_KEY_ENV, "default-key");
        let source = ApiKeySource::default();
        assert_eq!(source.resolve().unwrap().expose_secret(), "default-key");
        std::env::remove_var(DEFAULT_API_KEY_ENV);
    }

    #[test]
    #[serial]
    fn test_nothing_configured() {
        std::env::remove_var(DEFAULT_API_KEY_ENV);
        let result = ApiKeySource::default().resolve();
        assert!(matches!(result, Err(SecretError::NoSourceProvided)));
    }

    #[test]
    #[serial]
    fn test_named_env_var_missing() {
        std::env::remove_var("IMGTEXT_TEST_KEY_MISSING");
        let result = ApiKeySource::from_env_var("IMGTEXT_TEST_KEY_MISSING").resolve();
        match result {
            Err(SecretError::EnvVarNotSet { name }) => assert_eq!(name, "IMGTEXT_TEST_KEY_MISSING"),
            other => panic!("Expected EnvVarNotSet, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_file() {
        let source = ApiKeySource {
            file: Some("/nonexistent/imgtext/key".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            source.resolve(),
            Err(SecretError::FileReadError { .. })
        ));
    }

    #[test]
    fn test_blank_file_is_rejected() {
        let key_file = NamedTempFile::new().unwrap();
        let source = ApiKeySource {
            file: Some(key_file.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        assert!(matches!(source.resolve(), Err(SecretError::Empty { .. })));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/absolute/key"), "/absolute/key");
        assert_eq!(expand_home("relative/key"), "relative/key");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/key"), format!("{}/key", home.display()));
            assert_eq!(expand_home("~"), home.display().to_string());
        }
    }
}
