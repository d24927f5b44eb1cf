//! Layered configuration loading
//!
//! Sources, lowest precedence first:
//! 1. `AppConfig::from_env()` (built-in defaults plus the flat legacy variables)
//! 2. `config/config.<environment>.toml`, if present
//! 3. `PN__`-prefixed variables with `__` nesting, e.g. `PN__OTP__CODE_LENGTH=8`

use std::path::Path;

use config::{Config, File, FileFormat};
use pn_shared::config::AppConfig;

use crate::InfrastructureError;

/// Directory searched for per-environment config files
pub const CONFIG_DIR: &str = "config";

/// Prefix for structured environment overrides
pub const ENV_PREFIX: &str = "PN";

/// Load configuration from the default `config/` directory
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Load configuration, looking for the environment's TOML file under `dir`
pub fn load_config_from(dir: &Path) -> Result<AppConfig, InfrastructureError> {
    let base = AppConfig::from_env();
    let file = dir.join(base.environment.config_file());

    tracing::debug!(
        environment = %base.environment,
        file = %file.display(),
        "Loading configuration"
    );

    let settings = Config::builder()
        .add_source(Config::try_from(&base)?)
        .add_source(File::new(&file.to_string_lossy(), FileFormat::Toml).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), InfrastructureError> {
    if config.otp.code_length == 0 {
        return Err(InfrastructureError::Config(
            "otp.code_length must be at least 1".to_string(),
        ));
    }
    if config.otp.default_expiry_minutes < 1 {
        return Err(InfrastructureError::Config(
            "otp.default_expiry_minutes must be at least 1".to_string(),
        ));
    }
    if config.otp.default_max_attempts < 1 {
        return Err(InfrastructureError::Config(
            "otp.default_max_attempts must be at least 1".to_string(),
        ));
    }
    if config.dispatch.delivery_timeout_ms == 0 {
        return Err(InfrastructureError::Config(
            "dispatch.delivery_timeout_ms must be positive".to_string(),
        ));
    }
    Ok(())
}
