//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Load a `.env` file into the environment, if one exists
//! 2. Build the configuration from environment variables
//! 3. If incomplete, fall back to a config file (JSON or TOML)
//!
//! ## Environment Variables
//! - `K3_HOST`: Base URL, e.g. `https://erp.example.com/K3Cloud`
//! - `K3_ACCT_ID`: Account set (data center) id
//! - `K3_USERNAME`: User name
//! - `K3_APP_ID` + `K3_APP_SECRET`: Application authorisation
//! - `K3_PASSWORD`: Password login, used when `K3_APP_ID` is unset
//! - `K3_LCID`: Language code (default 2052)
//! - `K3_TIMEOUT_MS`: Per-request timeout, 0 disables it
//! - `K3_USER_AGENT`: `useragent` field of request bodies
//! - `K3_BATCH_SIZE`, `K3_BATCH_INTERVAL_MS`: Either one enables parallel
//!   batches
//! - `K3_LOG_LEVEL`: Default tracing filter
//! - `K3_LOG_FORMAT`: `pretty` or `json`
//! - `K3_LOG_JSON`: JSON log output (true/false), wins over `K3_LOG_FORMAT`
//!
//! ## File Locations
//! The loader probes, in the current working directory:
//! `k3bridge.toml`, `k3bridge.json`, `config.toml`, `config.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use k3bridge_domain::constants::DEFAULT_USER_AGENT;
use k3bridge_domain::{
    AuthMethod, BatchingOptions, ClientConfig, K3Error, LanguageCode, LogFormat, LoggingConfig,
    Result,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["k3bridge.toml", "k3bridge.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `K3Error::Config` if neither the environment nor a config file
/// yields a valid configuration.
pub fn load() -> Result<ClientConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `K3Error::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<ClientConfig> {
    let host = env_var("K3_HOST")?;
    let account_id = env_var("K3_ACCT_ID")?;
    let username = env_var("K3_USERNAME")?;

    let auth = match std::env::var("K3_APP_ID") {
        Ok(app_id) => AuthMethod::AppSecret { app_id, app_secret: env_var("K3_APP_SECRET")? },
        Err(_) => AuthMethod::Password { password: env_var("K3_PASSWORD")? },
    };

    let locale = env_parse::<u32>("K3_LCID")?.map(LanguageCode::from).unwrap_or_default();
    let timeout_ms = env_parse::<u64>("K3_TIMEOUT_MS")?.unwrap_or(0);
    let user_agent =
        std::env::var("K3_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

    let batch_size = env_parse::<u32>("K3_BATCH_SIZE")?;
    let batch_interval_ms = env_parse::<u64>("K3_BATCH_INTERVAL_MS")?;
    let batching = (batch_size.is_some() || batch_interval_ms.is_some())
        .then_some(BatchingOptions { batch_size, batch_interval_ms });

    let mut logging = LoggingConfig::default();
    if let Ok(level) = std::env::var("K3_LOG_LEVEL") {
        logging.level = level;
    }
    if let Some(format) = env_parse::<LogFormat>("K3_LOG_FORMAT")? {
        logging.format = format;
    }
    if env_bool("K3_LOG_JSON", false) {
        logging.format = LogFormat::Json;
    }

    let config = ClientConfig {
        host,
        account_id,
        username,
        auth,
        locale,
        timeout_ms,
        user_agent,
        batching,
        logging,
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected
/// by file extension.
///
/// # Errors
/// Returns `K3Error::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(K3Error::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            K3Error::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| K3Error::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| K3Error::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| K3Error::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(K3Error::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file in the current working directory.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)).find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| K3Error::Config(format!("Missing required environment variable: {}", key)))
}

/// `Ok(None)` when unset, an error when set but unparseable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| K3Error::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
