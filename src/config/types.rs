//! Configuration types for client settings
//!
//! This module defines the configuration structs loaded from YAML.

use std::collections::HashMap;
use std::path::PathBuf;

use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::{Endpoint, UserIdPlacement};
use crate::error::AppError;

use super::constants::{
    DEFAULT_BASE_URL, DEFAULT_SESSION_HEADER, DEFAULT_STORE_PATH, DEFAULT_TIMEOUT_SECS,
};

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_session_header() -> String {
    DEFAULT_SESSION_HEADER.to_string()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme, host and port of the backend (e.g. "https://example.org:10206")
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Header name carrying the session token
    #[serde(default = "default_session_header")]
    pub session_header: String,
    /// Per-endpoint overrides of where the user id goes
    #[serde(default)]
    pub user_id_placement: HashMap<Endpoint, UserIdPlacement>,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: base_url must be an absolute http(s) URL
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "api.timeout_secs must be > 0".to_string(),
            ));
        }

        if self.session_header.trim().is_empty() {
            return Err(AppError::Config(
                "api.session_header cannot be empty".to_string(),
            ));
        }

        if let Err(e) = HeaderName::from_bytes(self.session_header.as_bytes()) {
            return Err(AppError::Config(format!(
                "api.session_header '{}' is not a valid header name: {}",
                self.session_header, e
            )));
        }

        // Rule: overrides only apply to endpoints that carry a user id
        for endpoint in self.user_id_placement.keys() {
            if endpoint.default_placement().is_none() {
                return Err(AppError::Config(format!(
                    "api.user_id_placement: {} does not carry a user id",
                    endpoint.name()
                )));
            }
        }

        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_header: default_session_header(),
            user_id_placement: HashMap::new(),
        }
    }
}

/// Local session persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding the session keys
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

/// Root application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        self.api.validate()?;

        if self.store.path.as_os_str().is_empty() {
            return Err(AppError::Config(
                "store.path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
