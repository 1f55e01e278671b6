//! Configuration structures
//!
//! Loading lives in `k3bridge-infra::config`; this module only describes the
//! shape and validates it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_USER_AGENT;
use crate::errors::{K3Error, Result};
use crate::impl_wire_name_conversions;
use crate::types::{AuthMethod, BatchConfig, BatchingOptions, Credential, LanguageCode};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl_wire_name_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: LogFormat::default() }
    }
}

/// Top-level bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the K/3 Cloud site.
    pub host: String,
    /// Data-center (account set) id.
    pub account_id: String,
    /// Login user name.
    pub username: String,
    /// Login method and its secrets.
    pub auth: AuthMethod,
    /// Locale for login and for collapsing localized values.
    #[serde(default)]
    pub locale: LanguageCode,
    /// Per-request timeout in milliseconds; 0 disables it.
    #[serde(default)]
    pub timeout_ms: u64,
    /// `useragent` field of request bodies.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Present means parallel batches.
    #[serde(default)]
    pub batching: Option<BatchingOptions>,
    /// Tracing settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl ClientConfig {
    /// Check required fields.
    ///
    /// # Errors
    /// Returns `K3Error::Config` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("host", self.host.as_str()),
            ("account_id", self.account_id.as_str()),
            ("username", self.username.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(K3Error::Config(format!("missing required field: {name}")));
            }
        }
        if !(self.host.starts_with("http://") || self.host.starts_with("https://")) {
            return Err(K3Error::Config(format!("host must be an http(s) URL: {}", self.host)));
        }
        match &self.auth {
            AuthMethod::AppSecret { app_id, app_secret }
                if app_id.is_empty() || app_secret.is_empty() =>
            {
                Err(K3Error::Config("app_id and app_secret are required".into()))
            }
            AuthMethod::Password { password } if password.is_empty() => {
                Err(K3Error::Config("password is required".into()))
            }
            _ => Ok(()),
        }
    }

    /// `timeout_ms` as a duration; `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Batch mode derived from `batching`.
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::from_options(self.batching.as_ref())
    }

    /// Initial credential record, without a session token.
    pub fn credential(&self) -> Credential {
        Credential {
            host: self.host.clone(),
            account_id: self.account_id.clone(),
            username: self.username.clone(),
            auth: self.auth.clone(),
            locale: self.locale,
            session_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClientConfig {
        serde_json::from_value(serde_json::json!({
            "host": "https://erp.example.com/K3Cloud",
            "account_id": "acct",
            "username": "bot",
            "auth": {"kind": "app_secret", "app_id": "id_1", "app_secret": "s"}
        }))
        .unwrap()
    }

    #[test]
    fn defaults_are_applied() {
        let config = sample();
        assert_eq!(config.locale, LanguageCode::SIMPLIFIED_CHINESE);
        assert_eq!(config.user_agent, "k3bridge");
        assert_eq!(config.timeout(), None);
        assert!(!config.batch_config().enabled);
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut config = sample();
        config.account_id = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, K3Error::Config(msg) if msg.contains("account_id")));
    }

    #[test]
    fn validate_rejects_non_http_host() {
        let mut config = sample();
        config.host = "erp.example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_secret() {
        let mut config = sample();
        config.auth = AuthMethod::AppSecret { app_id: "id".into(), app_secret: String::new() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn credential_copies_identity_fields() {
        let cred = sample().credential();
        assert_eq!(cred.account_id, "acct");
        assert_eq!(cred.session_token, None);
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
    }
}
