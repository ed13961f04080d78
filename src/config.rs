use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default OpenAI-compatible API root used when `OPENAI_BASE_URL` is unset.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default chat model used for summaries.
pub const DEFAULT_SUMMARIZATION_MODEL: &str = "gpt-3.5-turbo";
/// Default listening port.
pub const DEFAULT_SERVER_PORT: u16 = 5000;
/// Default transient storage directory, relative to the working directory.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
/// Default ceiling for a single uploaded document (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the summarization server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Credential sent as a bearer token to the text-generation service.
    pub openai_api_key: String,
    /// Base URL of the OpenAI-compatible API (without the `/chat/completions` suffix).
    pub openai_base_url: String,
    /// Model identifier passed with every summarization request.
    pub summarization_model: String,
    /// Port the HTTP server listens on.
    pub server_port: u16,
    /// Directory where uploads live for the duration of a single request.
    pub upload_dir: PathBuf,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset so that an empty line in `.env` falls back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            openai_api_key: optional("OPENAI_API_KEY")
                .ok_or_else(|| ConfigError::MissingVariable("OPENAI_API_KEY".into()))?,
            openai_base_url: optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            summarization_model: optional("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.to_string()),
            server_port: optional("PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_SERVER_PORT),
            upload_dir: optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            max_upload_bytes: optional("MAX_UPLOAD_BYTES")
                .map(|value| match value.trim().parse::<usize>() {
                    Ok(0) | Err(_) => Err(ConfigError::InvalidValue("MAX_UPLOAD_BYTES".into())),
                    Ok(bytes) => Ok(bytes),
                })
                .transpose()?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }
}

/// Load configuration from the environment, reading a `.env` file first when one exists.
pub fn load_config() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    Config::from_env()
}
