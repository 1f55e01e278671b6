//! Tracing subscriber setup

use k3bridge_domain::{K3Error, LogFormat, LoggingConfig, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `config.level` when set. Returns `Ok(false)` if a
/// subscriber was already installed.
///
/// # Errors
/// `K3Error::Config` when `config.level` is not a valid filter directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            K3Error::Config(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let installed = match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).try_init()
        }
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_current_span(true)
            .try_init(),
    };

    Ok(installed.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_not_an_error() {
        let config = LoggingConfig::default();
        init_tracing(&config).expect("valid level");
        assert!(!init_tracing(&config).expect("valid level"));
    }
}
