//! TOML-based configuration for courier.
//!
//! Supports a config file (courier.toml) with environment variable
//! expansion in string values.
//!
//! Example configuration:
//! ```toml
//! [api]
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-4o-mini"
//! api_key = "${OPENAI_API_KEY}"
//!
//! [worker]
//! path = "/opt/courier/courier-worker"
//! timeout_secs = 60
//!
//! # Optional: replace the worker's environment entirely. When present the
//! # child sees only these variables.
//! [worker.env]
//! PATH = "/usr/bin:/bin"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Upstream chat service configuration.
    pub api: ApiSettings,

    /// Worker process configuration.
    pub worker: WorkerSettings,
}

/// Upstream chat service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Chat-completions endpoint URL.
    pub endpoint: String,

    /// Model identifier sent with each request.
    pub model: String,

    /// API key (supports `${ENV_VAR}` expansion). `None` falls back to the
    /// `COURIER_API_KEY` / `OPENAI_API_KEY` environment variables.
    pub api_key: Option<String>,

    /// TCP connect timeout for the upstream call.
    pub connect_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            connect_timeout_secs: 10,
        }
    }
}

impl ApiSettings {
    /// Resolve the API key, expanding environment variables.
    ///
    /// Returns `Ok(None)` when no key is configured anywhere, which is
    /// valid for endpoints that take no credentials.
    pub fn resolved_api_key(&self) -> Result<Option<String>, SettingsError> {
        if let Some(key) = &self.api_key {
            return expand_env_vars(key).map(Some);
        }
        for var in ["COURIER_API_KEY", "OPENAI_API_KEY"] {
            if let Ok(value) = env::var(var) {
                if !value.is_empty() {
                    return Ok(Some(value));
                }
            }
        }
        Ok(None)
    }
}

/// Worker process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary (supports `${ENV_VAR}` expansion). When
    /// unset the launcher searches conventional locations.
    pub path: Option<String>,

    /// Seconds one dispatch may take before the worker is killed.
    pub timeout_secs: u64,

    /// Replacement environment for the worker. When present, the child is
    /// started with exactly these variables and nothing inherited.
    pub env: Option<BTreeMap<String, String>>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            timeout_secs: 60,
            env: None,
        }
    }
}

impl WorkerSettings {
    /// The configured worker path with environment variables expanded.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        let expanded = expand_env_vars(path).ok()?;
        Some(PathBuf::from(expanded))
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `COURIER_CONFIG`
    /// 2. `./courier.toml`
    /// 3. `~/.config/courier/config.toml`
    ///
    /// Falls back to built-in defaults when no file is found.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("COURIER_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("courier.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("courier").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Load from an explicit file when given, otherwise the default chain.
    pub fn load_from(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a variable
/// name is kept literally.
pub fn expand_env_vars(input: &str) -> Result<String, SettingsError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(idx) = rest.find('$') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + 1..];

        if let Some(braced) = rest.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => {
                    let name = &braced[..end];
                    let value = env::var(name)
                        .map_err(|_| SettingsError::MissingEnvVar(name.to_string()))?;
                    out.push_str(&value);
                    rest = &braced[end + 1..];
                }
                None => out.push('$'),
            }
        } else {
            let end = rest
                .find(|c: char| !c.is_alphanumeric() && c != '_')
                .unwrap_or(rest.len());
            if end == 0 {
                out.push('$');
            } else {
                let name = &rest[..end];
                let value =
                    env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()))?;
                out.push_str(&value);
                rest = &rest[end..];
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}
