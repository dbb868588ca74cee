//! Configuration module for client settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `ApiConfig`, `StoreConfig`)
//! - YAML loading with environment overrides (`load_config`)
//! - Logging setup (`init_logging`)
//! - Application constants

pub mod constants;
pub mod logging;
mod loader;
mod types;

// Re-export types
pub use types::{ApiConfig, AppConfig, StoreConfig};

// Re-export loader functions
pub use loader::{apply_env_overrides, load_config, load_config_from_str};

pub use logging::init_logging;
