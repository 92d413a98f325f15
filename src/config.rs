use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
const DEFAULT_BING_SEARCH_URL: &str = "https://api.bing.microsoft.com/v7.0/search";

/// Errors encountered while resolving configuration from file and environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Setting contained a value that could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Environment variable or file key that carried the value.
        key: String,
        /// Raw value as supplied.
        value: String,
    },
    /// Setting parsed correctly but violates a bound.
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    /// Configuration file exists but could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Configuration file is not valid TOML for the expected keys.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Runtime configuration for the analysis server.
///
/// Built once at startup and handed to each component; nothing reads settings after that.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the language-model API. Summaries always fail when absent.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
    /// Model identifier used for completions.
    pub openai_model: String,
    /// Maximum number of output tokens requested for a summary.
    pub max_tokens: u32,
    /// Credential for the web search API. Source lookup is disabled when absent.
    pub bing_api_key: Option<String>,
    /// Search endpoint URL.
    pub bing_search_url: String,
    /// Number of hits requested from the search API.
    pub search_result_count: u32,
    /// Upper bound on search attempts for a single request.
    pub search_retry_limit: u32,
    /// Linear backoff step applied between search attempts.
    pub search_retry_backoff: Duration,
    /// Timeout applied to every outbound HTTP call.
    pub request_timeout: Duration,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Raw settings as they appear in the TOML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// See [`Config::openai_api_key`].
    pub openai_api_key: Option<String>,
    /// See [`Config::openai_base_url`].
    pub openai_base_url: Option<String>,
    /// See [`Config::openai_model`].
    pub openai_model: Option<String>,
    /// See [`Config::max_tokens`].
    pub max_tokens: Option<u32>,
    /// See [`Config::bing_api_key`].
    pub bing_api_key: Option<String>,
    /// See [`Config::bing_search_url`].
    pub bing_search_url: Option<String>,
    /// See [`Config::search_result_count`].
    pub search_result_count: Option<u32>,
    /// See [`Config::search_retry_limit`].
    pub search_retry_limit: Option<u32>,
    /// Backoff step in milliseconds.
    pub search_retry_backoff_ms: Option<u64>,
    /// Outbound request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// See [`Config::server_port`].
    pub server_port: Option<u16>,
    /// See [`Config::log_level`].
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Read a TOML configuration file. A missing file yields empty settings.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Config {
    /// Load configuration from `.env`, the optional config file, and the process environment.
    ///
    /// The file path is taken from `path`, then `CONTENTLENS_CONFIG`, then `config.toml`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = config_path(path, load_env_optional);
        let file = FileConfig::read(&path)?;
        Self::from_sources(file, load_env_optional)
    }

    /// Resolve settings from file values and an environment lookup, environment taking precedence.
    pub fn from_sources<F>(file: FileConfig, source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| source(key).filter(|value| !value.trim().is_empty());
        let string = |key: &str, file_value: Option<String>| {
            lookup(key).or_else(|| file_value.filter(|value| !value.trim().is_empty()))
        };

        let max_tokens = parse_or(&lookup, "MAX_TOKENS", file.max_tokens, 150)?;
        if max_tokens == 0 {
            return Err(ConfigError::NotPositive("max_tokens"));
        }
        let search_result_count =
            parse_or(&lookup, "SEARCH_RESULT_COUNT", file.search_result_count, 5)?;
        if search_result_count == 0 {
            return Err(ConfigError::NotPositive("search_result_count"));
        }
        let timeout_secs = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            file.request_timeout_secs,
            30,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::NotPositive("request_timeout_secs"));
        }

        Ok(Self {
            openai_api_key: string("OPENAI_API_KEY", file.openai_api_key),
            openai_base_url: string("OPENAI_BASE_URL", file.openai_base_url)
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: string("OPENAI_MODEL", file.openai_model)
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            max_tokens,
            bing_api_key: string("BING_API_KEY", file.bing_api_key),
            bing_search_url: string("BING_SEARCH_URL", file.bing_search_url)
                .unwrap_or_else(|| DEFAULT_BING_SEARCH_URL.to_string()),
            search_result_count,
            search_retry_limit: parse_or(
                &lookup,
                "SEARCH_RETRY_LIMIT",
                file.search_retry_limit,
                3,
            )?,
            search_retry_backoff: Duration::from_millis(parse_or(
                &lookup,
                "SEARCH_RETRY_BACKOFF_MS",
                file.search_retry_backoff_ms,
                200,
            )?),
            request_timeout: Duration::from_secs(timeout_secs),
            server_port: lookup("SERVER_PORT")
                .map(|value| parse_value("SERVER_PORT", value))
                .transpose()?
                .or(file.server_port),
            log_level: string("LOG_LEVEL", file.log_level)
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Pick the config file: explicit path, then `CONTENTLENS_CONFIG`, then `config.toml`.
fn config_path<F>(explicit: Option<&Path>, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(Path::to_path_buf)
        .or_else(|| lookup("CONTENTLENS_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn parse_or<F, T>(lookup: &F, key: &str, file_value: Option<T>, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => parse_value(key, value),
        None => Ok(file_value.unwrap_or(default)),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
