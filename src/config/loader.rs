//! Configuration loader for YAML files
//!
//! This module handles loading and validating configuration from YAML files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

use crate::error::AppError;

use super::constants::{base_url_override, timeout_override};
use super::types::AppConfig;

/// Load configuration from a YAML file
///
/// This function:
/// 1. Checks if the file exists
/// 2. Parses the YAML content
/// 3. Applies `MI_SALUD_BASE_URL` / `MI_SALUD_TIMEOUT_SECS` overrides
/// 4. Validates the configuration rules
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use mi_salud::config::load_config;
///
/// let config = load_config(Path::new("config.yaml"))?;
/// ```
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut config: AppConfig = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::Config(format!(
            "YAML parse error in '{}': {}",
            path.display(),
            e
        ))
    })?;

    apply_env_overrides(&mut config);
    config.validate()?;

    info!(
        path = %path.display(),
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
///
/// Environment overrides are not applied.
pub fn load_config_from_str(yaml_content: &str) -> Result<AppConfig, AppError> {
    let config: AppConfig = serde_yaml::from_str(yaml_content).map_err(|e| {
        AppError::Config(format!("YAML parse error: {}", e))
    })?;

    config.validate()?;

    Ok(config)
}

/// Replace file values with environment overrides, when set
pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(base_url) = base_url_override() {
        config.api.base_url = base_url;
    }
    if let Some(timeout) = timeout_override() {
        config.api.timeout_secs = timeout;
    }
}

// ============================================================================
// Tests
// ============================================================================
